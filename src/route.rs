//! Route keys and the city aliases visitors type into the search form

use serde::{Serialize, Serializer};
use std::fmt;

/// Cities the agency sells flights between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum City {
    Paris,
    TelAviv,
    Eilat,
}

/// Ordered (origin, destination) pairs present in the offers table
const SUPPORTED_ROUTES: [(City, City); 4] = [
    (City::Paris, City::TelAviv),
    (City::TelAviv, City::Paris),
    (City::Paris, City::Eilat),
    (City::Eilat, City::Paris),
];

impl City {
    /// Code used inside route keys
    pub fn code(self) -> &'static str {
        match self {
            City::Paris => "PARIS",
            City::TelAviv => "TLV",
            City::Eilat => "EILAT",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            City::Paris => "Paris",
            City::TelAviv => "Tel Aviv",
            City::Eilat => "Eilat",
        }
    }

    /// Match free text or a city code, ignoring case and surrounding or
    /// repeated whitespace
    pub fn from_input(raw: &str) -> Option<Self> {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        match normalized.as_str() {
            "paris" => Some(City::Paris),
            "tel aviv" | "tel-aviv" | "telaviv" | "tlv" => Some(City::TelAviv),
            "eilat" | "etm" => Some(City::Eilat),
            _ => None,
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        [City::Paris, City::TelAviv, City::Eilat]
            .into_iter()
            .find(|c| c.code() == code)
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Canonical `<FROM>_<TO>` key of a supported route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    from: City,
    to: City,
}

impl RouteKey {
    /// Build a key for a supported pair, `None` otherwise
    pub fn new(from: City, to: City) -> Option<Self> {
        SUPPORTED_ROUTES
            .contains(&(from, to))
            .then_some(Self { from, to })
    }

    /// Resolve raw origin/destination input into a key
    pub fn resolve(from: &str, to: &str) -> Option<Self> {
        Self::new(City::from_input(from)?, City::from_input(to)?)
    }

    /// Parse a stored key such as `PARIS_TLV`
    pub fn parse(key: &str) -> Option<Self> {
        let (from, to) = key.trim().split_once('_')?;
        Self::new(City::from_code(&from.to_uppercase())?, City::from_code(&to.to_uppercase())?)
    }

    pub fn origin(&self) -> City {
        self.from
    }

    pub fn destination(&self) -> City {
        self.to
    }

    /// "Paris → Tel Aviv"
    pub fn display_label(&self) -> String {
        format!("{} → {}", self.from, self.to)
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.from.code(), self.to.code())
    }
}

impl Serialize for RouteKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Origin and destination prefilled from the `/flights/<slug>` path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePreset {
    pub from: City,
    pub to: City,
}

impl RoutePreset {
    /// `tlv` flies to Tel Aviv, `paris` flies home, `eilat` flies to Eilat;
    /// unknown slugs default to Paris → Tel Aviv
    pub fn from_slug(slug: &str) -> Self {
        match slug.trim().to_lowercase().as_str() {
            "paris" => Self {
                from: City::TelAviv,
                to: City::Paris,
            },
            "eilat" => Self {
                from: City::Paris,
                to: City::Eilat,
            },
            _ => Self {
                from: City::Paris,
                to: City::TelAviv,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_case_and_whitespace_insensitive() {
        let variants = [
            ("paris", "Tel Aviv"),
            ("  PARIS ", "tel   aviv"),
            ("Paris", "TLV"),
            ("pArIs", " tel-aviv\t"),
        ];
        for (from, to) in variants {
            let key = RouteKey::resolve(from, to).unwrap();
            assert_eq!(key.to_string(), "PARIS_TLV", "input {from:?} / {to:?}");
        }
    }

    #[test]
    fn test_every_supported_pair_resolves_from_display_names() {
        for (from, to) in SUPPORTED_ROUTES {
            let upper = RouteKey::resolve(&from.display_name().to_uppercase(), to.display_name())
                .unwrap();
            let padded = RouteKey::resolve(
                &format!("  {}  ", from.display_name().to_lowercase()),
                &format!("\t{}", to.display_name()),
            )
            .unwrap();
            assert_eq!(upper, padded);
            assert_eq!(upper.to_string(), format!("{}_{}", from.code(), to.code()));
        }
    }

    #[test]
    fn test_unsupported_pairs() {
        assert!(RouteKey::resolve("Tel Aviv", "Eilat").is_none());
        assert!(RouteKey::resolve("Paris", "Paris").is_none());
        assert!(RouteKey::resolve("London", "Tel Aviv").is_none());
        assert!(RouteKey::resolve("", "Tel Aviv").is_none());
    }

    #[test]
    fn test_parse_stored_key() {
        let key = RouteKey::parse("TLV_PARIS").unwrap();
        assert_eq!(key.origin(), City::TelAviv);
        assert_eq!(key.destination(), City::Paris);
        assert!(RouteKey::parse("TLV_EILAT").is_none());
        assert!(RouteKey::parse("PARISTLV").is_none());
    }

    #[test]
    fn test_slug_presets() {
        assert_eq!(RoutePreset::from_slug("tlv").to, City::TelAviv);
        assert_eq!(RoutePreset::from_slug("PARIS").from, City::TelAviv);
        assert_eq!(RoutePreset::from_slug("eilat").to, City::Eilat);
        let fallback = RoutePreset::from_slug("unknown");
        assert_eq!((fallback.from, fallback.to), (City::Paris, City::TelAviv));
    }
}
