//! Agency contact details and the outbound WhatsApp / mail / phone links

use crate::models::{FlightOffer, PackageOffer};
use crate::presenter::{format_date, format_price};
use serde::{Deserialize, Serialize};

/// Contact channels shown in the header, footer and offer cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    pub site_name: String,
    /// WhatsApp number in E.164 form, e.g. `+33611090731`
    pub whatsapp_e164: String,
    pub phone_fr: String,
    pub phone_il1: String,
    pub phone_il2: String,
    pub email_israel: String,
    pub email_world: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            site_name: "Aviel Travel".to_string(),
            whatsapp_e164: "+33611090731".to_string(),
            phone_fr: "+33185431375".to_string(),
            phone_il1: "+972557726027".to_string(),
            phone_il2: "+972559661683".to_string(),
            email_israel: "resa.isradmc@gmail.com".to_string(),
            email_world: "jordan.nesstravel@gmail.com".to_string(),
        }
    }
}

/// Prefilled links for confirming a specific offer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inquiry {
    pub message: String,
    pub whatsapp: String,
    pub mailto: String,
    pub phone: String,
}

impl ContactConfig {
    /// `https://wa.me/<digits>?text=<message>`
    pub fn whatsapp_link(&self, message: &str) -> String {
        let digits: String = self
            .whatsapp_e164
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        format!("https://wa.me/{}?text={}", digits, encode_component(message))
    }

    pub fn phone_link(&self) -> String {
        tel_link(&self.phone_fr)
    }

    /// Generic greeting used by the header and footer WhatsApp buttons
    pub fn greeting(&self) -> String {
        format!("Bonjour {}", self.site_name)
    }

    /// WhatsApp, mail and phone links confirming an Eilat package
    pub fn package_inquiry(&self, package: &PackageOffer) -> Inquiry {
        let depart = format_date(package.depart_date);
        let nights = package
            .nights
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        let hotel = package.hotel_name.as_deref().unwrap_or("-");
        let board = package.board.as_deref().unwrap_or("");

        let message = format!(
            "Bonjour {}, je souhaite confirmer un package Eilat: départ {}, {} nuits, hôtel {} ({}) — {}.",
            self.site_name,
            depart,
            nights,
            hotel,
            board,
            format_price(package.price_eur.as_ref()),
        );
        let subject = format!("Demande - Package Eilat - {depart} - {nights}N");
        let body = format!("{message}\n\nPassagers: ...\nNom: ...\nTéléphone: ...");

        Inquiry {
            whatsapp: self.whatsapp_link(&message),
            mailto: mailto_link(&self.email_israel, &subject, &body),
            phone: self.phone_link(),
            message,
        }
    }

    /// WhatsApp text for a promo flight card
    pub fn promo_flight_message(&self, offer: &FlightOffer) -> String {
        let trip = offer.trip.map(|t| t.code()).unwrap_or("");
        let mut message = format!(
            "Bonjour {}, PROMO: {} {} {}",
            self.site_name,
            offer.route.as_deref().unwrap_or(""),
            trip,
            format_date(offer.depart_date),
        );
        if let Some(ret) = offer.return_date {
            message.push(' ');
            message.push_str(&ret.to_string());
        }
        message
    }
}

/// `mailto:<to>?subject=..&body=..`
pub fn mailto_link(to: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        to,
        encode_component(subject),
        encode_component(body)
    )
}

pub fn tel_link(phone: &str) -> String {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    format!("tel:{compact}")
}

/// Percent-encode a URI component; spaces become `%20`, never `+`
pub fn encode_component(value: &str) -> String {
    // byte_serialize escapes a literal '+' as %2B, so every '+' left is a space
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriceValue, RowId};
    use chrono::NaiveDate;

    #[test]
    fn test_whatsapp_link_strips_plus_and_encodes() {
        let contact = ContactConfig::default();
        assert_eq!(
            contact.whatsapp_link("Bonjour Aviel Travel"),
            "https://wa.me/33611090731?text=Bonjour%20Aviel%20Travel"
        );
        assert_eq!(
            contact.whatsapp_link("1+1 & co"),
            "https://wa.me/33611090731?text=1%2B1%20%26%20co"
        );
    }

    #[test]
    fn test_mailto_link() {
        assert_eq!(
            mailto_link("a@b.fr", "Demande - Eilat", "Nom: ...\nTel"),
            "mailto:a@b.fr?subject=Demande%20-%20Eilat&body=Nom%3A%20...%0ATel"
        );
    }

    #[test]
    fn test_tel_link() {
        assert_eq!(tel_link("+972 55 772 6027"), "tel:+972557726027");
    }

    #[test]
    fn test_package_inquiry() {
        let contact = ContactConfig::default();
        let package = PackageOffer {
            id: RowId::Int(4),
            created_at: None,
            hotel_name: Some("Isrotel Royal Beach".to_string()),
            nights: Some(4),
            board: Some("HB".to_string()),
            category: None,
            depart_date: NaiveDate::from_ymd_opt(2026, 4, 2),
            price_eur: Some(PriceValue::Number(890.0)),
            priority: None,
            active: Some(true),
            notes: Default::default(),
        };

        let inquiry = contact.package_inquiry(&package);
        assert_eq!(
            inquiry.message,
            "Bonjour Aviel Travel, je souhaite confirmer un package Eilat: départ 2026-04-02, 4 nuits, hôtel Isrotel Royal Beach (HB) — 890€."
        );
        assert!(inquiry
            .mailto
            .starts_with("mailto:resa.isradmc@gmail.com?subject=Demande%20-%20Package%20Eilat%20-%202026-04-02%20-%204N&body="));
        assert!(inquiry.whatsapp.starts_with("https://wa.me/33611090731?text=Bonjour"));
        assert_eq!(inquiry.phone, "tel:+33185431375");
    }
}
