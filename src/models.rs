//! Row shapes of the backend collections.
//!
//! Rows are loosely typed at the source: most columns are nullable and two
//! values are stored under duplicate column names. Flight offers carry the
//! airline as both `airline` and the misspelled `ailine`, and the price as
//! both `price_eur` and `price` (number or numeric string). The accessors on
//! [`FlightOffer`] read both and prefer `airline` / `price_eur`. The
//! duplicates are a data-quality issue to fix in the table, not something to
//! spread further.

use crate::contact::ContactConfig;
use crate::i18n::Locale;
use crate::route::RouteKey;
use crate::{Category, TripType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Column reader for enum-like and nullable columns: `null` or an
/// unrecognized value reads as `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    lenient(deserializer).map(Option::unwrap_or_default)
}

/// Primary key; flight rows use integers, other tables may use uuids
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(id) => write!(f, "{id}"),
            RowId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RowId {
    fn from(id: i64) -> Self {
        RowId::Int(id)
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        match id.trim().parse::<i64>() {
            Ok(n) => RowId::Int(n),
            Err(_) => RowId::Text(id.trim().to_string()),
        }
    }
}

/// Price column value, numeric or stored as text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Number(f64),
    Text(String),
}

impl PriceValue {
    /// Numeric amount when the value is a number or numeric text
    pub fn amount(&self) -> Option<f64> {
        match self {
            PriceValue::Number(n) => Some(*n),
            PriceValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, PriceValue::Text(s) if s.trim().is_empty())
    }
}

/// Per-language free-text notes (`notes_fr`, `notes_en`, `notes_he`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notes {
    #[serde(default)]
    pub notes_fr: Option<String>,
    #[serde(default)]
    pub notes_en: Option<String>,
    #[serde(default)]
    pub notes_he: Option<String>,
}

impl Notes {
    pub fn for_locale(&self, locale: Locale) -> Option<&str> {
        pick(locale, &self.notes_fr, &self.notes_en, &self.notes_he)
    }
}

fn pick<'a>(
    locale: Locale,
    fr: &'a Option<String>,
    en: &'a Option<String>,
    he: &'a Option<String>,
) -> Option<&'a str> {
    let value = match locale {
        Locale::Fr => fr,
        Locale::En => en,
        Locale::He => he,
    };
    non_blank(value)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// A row of the flight offers table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    pub id: RowId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<Category>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub trip: Option<TripType>,
    #[serde(default)]
    pub depart_date: Option<NaiveDate>,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    #[serde(default)]
    pub airline: Option<String>,
    #[serde(default)]
    pub ailine: Option<String>,
    #[serde(default)]
    pub cabin_bag: Option<String>,
    #[serde(default)]
    pub checked_bag: Option<String>,
    #[serde(default)]
    pub depart_time: Option<String>,
    #[serde(default)]
    pub arrive_time: Option<String>,
    #[serde(default)]
    pub return_depart_time: Option<String>,
    #[serde(default)]
    pub return_arrive_time: Option<String>,
    #[serde(default)]
    pub price_eur: Option<PriceValue>,
    #[serde(default)]
    pub price: Option<PriceValue>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(flatten)]
    pub notes: Notes,
}

impl FlightOffer {
    /// Airline name: `airline` when populated, otherwise `ailine`
    pub fn airline_name(&self) -> Option<&str> {
        non_blank(&self.airline).or_else(|| non_blank(&self.ailine))
    }

    /// Price: `price_eur` when populated, otherwise `price`
    pub fn price_value(&self) -> Option<&PriceValue> {
        [&self.price_eur, &self.price]
            .into_iter()
            .flatten()
            .find(|p| !p.is_blank())
    }

    pub fn route_key(&self) -> Option<RouteKey> {
        self.route.as_deref().and_then(RouteKey::parse)
    }
}

/// Problem with the date pair of a flight offer, if any.
///
/// Advisory only: rows are not rejected for it.
pub fn return_date_issue(
    trip: Option<TripType>,
    depart: Option<NaiveDate>,
    ret: Option<NaiveDate>,
) -> Option<&'static str> {
    match (trip, depart, ret) {
        (Some(TripType::OneWay), _, Some(_)) => Some("one-way offer carries a return date"),
        (Some(TripType::RoundTrip), Some(d), Some(r)) if r <= d => {
            Some("return date is not after the departure date")
        }
        _ => None,
    }
}

/// A row of the flight+hotel packages table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageOffer {
    pub id: RowId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hotel_name: Option<String>,
    #[serde(default)]
    pub nights: Option<u32>,
    /// Board code such as BB, HB, FB or AI
    #[serde(default)]
    pub board: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<Category>,
    #[serde(default)]
    pub depart_date: Option<NaiveDate>,
    #[serde(default)]
    pub price_eur: Option<PriceValue>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(flatten)]
    pub notes: Notes,
}

/// Kind of contact request captured by a form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadKind {
    HotelQuote,
    CarQuote,
    /// Any type written by another form
    #[default]
    #[serde(other)]
    Other,
}

impl fmt::Display for LeadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LeadKind::HotelQuote => "HOTEL_QUOTE",
            LeadKind::CarQuote => "CAR_QUOTE",
            LeadKind::Other => "OTHER",
        })
    }
}

/// A captured contact-form submission. Write-once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default)]
    pub id: Option<RowId>,
    #[serde(rename = "type", default, deserialize_with = "lenient_or_default")]
    pub kind: LeadKind,
    /// French when missing or unknown
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub lang: Locale,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// What a banner click leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BannerTarget {
    Page,
    Whatsapp,
    Filter,
}

impl std::str::FromStr for BannerTarget {
    type Err = crate::TravelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PAGE" => Ok(BannerTarget::Page),
            "WHATSAPP" => Ok(BannerTarget::Whatsapp),
            "FILTER" => Ok(BannerTarget::Filter),
            _ => Err(crate::TravelError::InvalidValue {
                field: "target_type",
                value: s.to_string(),
            }),
        }
    }
}

/// Admin-managed promotional tile on the home page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub id: RowId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub active: bool,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub sort_order: i32,
    #[serde(default)]
    pub title_fr: Option<String>,
    #[serde(default)]
    pub title_en: Option<String>,
    #[serde(default)]
    pub title_he: Option<String>,
    #[serde(default)]
    pub subtitle_fr: Option<String>,
    #[serde(default)]
    pub subtitle_en: Option<String>,
    #[serde(default)]
    pub subtitle_he: Option<String>,
    #[serde(default)]
    pub cta_fr: Option<String>,
    #[serde(default)]
    pub cta_en: Option<String>,
    #[serde(default)]
    pub cta_he: Option<String>,
    /// Unset targets behave as PAGE
    #[serde(default, deserialize_with = "lenient")]
    pub target_type: Option<BannerTarget>,
    #[serde(default)]
    pub target_value: Option<String>,
    #[serde(default)]
    pub image_path_desktop: Option<String>,
}

impl Banner {
    pub fn title(&self, locale: Locale) -> Option<&str> {
        pick(locale, &self.title_fr, &self.title_en, &self.title_he)
    }

    pub fn subtitle(&self, locale: Locale) -> Option<&str> {
        pick(locale, &self.subtitle_fr, &self.subtitle_en, &self.subtitle_he)
    }

    pub fn cta(&self, locale: Locale) -> Option<&str> {
        pick(locale, &self.cta_fr, &self.cta_en, &self.cta_he)
    }

    /// Link the banner points to.
    ///
    /// PAGE targets are site paths, WHATSAPP targets are prefilled message
    /// texts, FILTER targets are package category filters.
    pub fn href(&self, locale: Locale, contact: &ContactConfig) -> String {
        let value = non_blank(&self.target_value);
        match self.target_type.unwrap_or(BannerTarget::Page) {
            BannerTarget::Page => value.map_or_else(|| format!("/{locale}"), str::to_string),
            BannerTarget::Whatsapp => {
                let greeting = format!("Bonjour {}", contact.site_name);
                contact.whatsapp_link(value.unwrap_or(&greeting))
            }
            BannerTarget::Filter => match value {
                Some(category) => format!("/{locale}/packages/eilat?cat={}", category.to_uppercase()),
                None => format!("/{locale}/packages/eilat"),
            },
        }
    }
}

/// Insert payload for a flight offer, prefilled like the admin form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewFlightOffer {
    pub route: String,
    pub trip: TripType,
    pub category: Category,
    pub depart_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub price_eur: f64,
    pub priority: i32,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cabin_bag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_bag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depart_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrive_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_depart_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_arrive_time: Option<String>,
    #[serde(flatten)]
    pub notes: Notes,
}

impl Default for NewFlightOffer {
    fn default() -> Self {
        Self {
            route: "PARIS_TLV".to_string(),
            trip: TripType::RoundTrip,
            category: Category::General,
            depart_date: None,
            return_date: None,
            price_eur: 0.0,
            priority: 0,
            active: true,
            title: None,
            airline: None,
            cabin_bag: None,
            checked_bag: None,
            depart_time: None,
            arrive_time: None,
            return_depart_time: None,
            return_arrive_time: None,
            notes: Notes::default(),
        }
    }
}

/// Insert payload for a package offer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPackageOffer {
    pub depart_date: Option<NaiveDate>,
    pub nights: u32,
    pub hotel_name: String,
    pub board: String,
    pub price_eur: f64,
    pub category: Category,
    pub active: bool,
    pub priority: i32,
    #[serde(flatten)]
    pub notes: Notes,
}

impl Default for NewPackageOffer {
    fn default() -> Self {
        Self {
            depart_date: None,
            nights: 4,
            hotel_name: String::new(),
            board: "BB".to_string(),
            price_eur: 0.0,
            category: Category::General,
            active: true,
            priority: 0,
            notes: Notes::default(),
        }
    }
}

/// Insert payload for a banner; the image path is set after upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBanner {
    pub active: bool,
    pub sort_order: i32,
    pub title_fr: String,
    pub title_en: String,
    pub title_he: String,
    pub subtitle_fr: String,
    pub subtitle_en: String,
    pub subtitle_he: String,
    pub cta_fr: String,
    pub cta_en: String,
    pub cta_he: String,
    pub target_type: BannerTarget,
    pub target_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path_desktop: Option<String>,
}

impl Default for NewBanner {
    fn default() -> Self {
        Self {
            active: true,
            sort_order: 0,
            title_fr: String::new(),
            title_en: String::new(),
            title_he: String::new(),
            subtitle_fr: String::new(),
            subtitle_en: String::new(),
            subtitle_he: String::new(),
            cta_fr: "Voir".to_string(),
            cta_en: "View".to_string(),
            cta_he: "צפייה".to_string(),
            target_type: BannerTarget::Page,
            target_value: "/fr/promo".to_string(),
            image_path_desktop: None,
        }
    }
}
