//! Site locales, locale path routing and the user-facing messages emitted by
//! the search and lead flows.

use crate::{TravelError, TripType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Locale served under the first path segment (`/fr/...`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Fr,
    En,
    He,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::Fr, Locale::En, Locale::He];

    pub fn code(self) -> &'static str {
        match self {
            Locale::Fr => "fr",
            Locale::En => "en",
            Locale::He => "he",
        }
    }

    /// Resolve a path segment, falling back to French for anything unknown
    pub fn from_segment(segment: &str) -> Self {
        segment.parse().unwrap_or_default()
    }

    /// Hebrew pages render right-to-left
    pub fn is_rtl(self) -> bool {
        matches!(self, Locale::He)
    }

    pub fn messages(self) -> &'static Messages {
        match self {
            Locale::Fr => &FR,
            Locale::En => &EN,
            Locale::He => &HE,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = TravelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Locale::ALL
            .into_iter()
            .find(|l| l.code() == lower)
            .ok_or_else(|| TravelError::InvalidLocale(s.to_string()))
    }
}

/// Redirect target for a request path that lacks a locale prefix.
///
/// `/` goes to `/fr`; any path whose first segment is not a locale is
/// prefixed with `/fr`. `/admin`, `/_next` and `/favicon.ico` pass through.
pub fn locale_redirect(path: &str) -> Option<String> {
    if path.is_empty() || path == "/" {
        return Some(format!("/{}", Locale::default()));
    }
    if path.starts_with("/admin") || path.starts_with("/_next") || path == "/favicon.ico" {
        return None;
    }

    let segment = path.split('/').nth(1).unwrap_or("");
    if Locale::ALL.iter().any(|l| l.code() == segment) {
        return None;
    }

    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    Some(format!("/{}{}", Locale::default(), path))
}

/// Static message table for one locale
#[derive(Debug)]
pub struct Messages {
    pub unsupported_route: &'static str,
    pub missing_depart_date: &'static str,
    pub missing_return_date: &'static str,
    invalid_date: &'static str,
    invalid_trip: &'static str,
    no_offers: &'static str,
    error_label: &'static str,
    pub round_trip: &'static str,
    pub one_way: &'static str,
    pub lead_sent: &'static str,
    pub lead_failed: &'static str,
    packages_found: &'static str,
}

impl Messages {
    pub fn trip_label(&self, trip: TripType) -> &'static str {
        match trip {
            TripType::RoundTrip => self.round_trip,
            TripType::OneWay => self.one_way,
        }
    }

    pub fn invalid_date(&self, raw: &str) -> String {
        self.invalid_date.replace("{value}", raw)
    }

    pub fn invalid_trip(&self, raw: &str) -> String {
        self.invalid_trip.replace("{value}", raw)
    }

    /// "No offers found for PARIS_TLV (RT) at these dates."
    pub fn no_offers(&self, route: &str, trip: TripType) -> String {
        self.no_offers
            .replace("{label}", &format!("{} ({})", route, trip.code()))
    }

    /// Backend failure text, shown verbatim behind a label
    pub fn backend_error(&self, message: &str) -> String {
        format!("{}{}", self.error_label, message)
    }

    pub fn packages_found(&self, count: usize) -> String {
        format!("{} {}", count, self.packages_found)
    }
}

static FR: Messages = Messages {
    unsupported_route: "Route non supportée. Utilise Paris ↔ Tel Aviv ou Paris ↔ Eilat.",
    missing_depart_date: "Choisis une date de départ.",
    missing_return_date: "Choisis une date de retour (ou passe en Aller simple).",
    invalid_date: "Date invalide : {value} (format AAAA-MM-JJ).",
    invalid_trip: "Type de voyage inconnu : {value}.",
    no_offers: "Aucune offre trouvée pour {label} à cette date.",
    error_label: "Erreur : ",
    round_trip: "Aller-retour",
    one_way: "Aller simple",
    lead_sent: "Demande envoyée ✅",
    lead_failed: "Erreur, réessaie.",
    packages_found: "packages trouvés",
};

static EN: Messages = Messages {
    unsupported_route: "Unsupported route. Use Paris ↔ Tel Aviv or Paris ↔ Eilat.",
    missing_depart_date: "Choose a departure date.",
    missing_return_date: "Choose a return date (or switch to One way).",
    invalid_date: "Invalid date: {value} (expected YYYY-MM-DD).",
    invalid_trip: "Unknown trip type: {value}.",
    no_offers: "No offers found for {label} at these dates.",
    error_label: "Error: ",
    round_trip: "Round trip",
    one_way: "One way",
    lead_sent: "Request sent ✅",
    lead_failed: "Error, please try again.",
    packages_found: "packages found",
};

static HE: Messages = Messages {
    unsupported_route: "מסלול לא נתמך. השתמשו בפריז ↔ תל אביב או פריז ↔ אילת.",
    missing_depart_date: "בחרו תאריך יציאה.",
    missing_return_date: "בחרו תאריך חזרה (או עברו לכיוון אחד).",
    invalid_date: "תאריך לא תקין: {value} (YYYY-MM-DD).",
    invalid_trip: "סוג טיסה לא מוכר: {value}.",
    no_offers: "לא נמצאו הצעות עבור {label} בתאריכים אלה.",
    error_label: "שגיאה: ",
    round_trip: "הלוך ושוב",
    one_way: "כיוון אחד",
    lead_sent: "הבקשה נשלחה ✅",
    lead_failed: "שגיאה, נסו שוב.",
    packages_found: "חבילות נמצאו",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_from_segment_falls_back_to_french() {
        assert_eq!(Locale::from_segment("en"), Locale::En);
        assert_eq!(Locale::from_segment("HE"), Locale::He);
        assert_eq!(Locale::from_segment("de"), Locale::Fr);
        assert_eq!(Locale::from_segment(""), Locale::Fr);
    }

    #[test]
    fn test_locale_redirects() {
        assert_eq!(locale_redirect("/"), Some("/fr".to_string()));
        assert_eq!(locale_redirect("/promo"), Some("/fr/promo".to_string()));
        assert_eq!(
            locale_redirect("/flights/tlv"),
            Some("/fr/flights/tlv".to_string())
        );
        assert_eq!(locale_redirect("/en/promo"), None);
        assert_eq!(locale_redirect("/he"), None);
        assert_eq!(locale_redirect("/admin"), None);
        assert_eq!(locale_redirect("/favicon.ico"), None);
    }

    #[test]
    fn test_no_offers_message() {
        assert_eq!(
            Locale::En.messages().no_offers("PARIS_TLV", TripType::RoundTrip),
            "No offers found for PARIS_TLV (RT) at these dates."
        );
        assert_eq!(
            Locale::Fr.messages().no_offers("TLV_PARIS", TripType::OneWay),
            "Aucune offre trouvée pour TLV_PARIS (OW) à cette date."
        );
    }

    #[test]
    fn test_rtl() {
        assert!(Locale::He.is_rtl());
        assert!(!Locale::Fr.is_rtl());
    }
}
