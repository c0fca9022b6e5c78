//! # Aviel Travel
//!
//! Offer search and lead capture for the Aviel Travel booking site.
//! Flight and package offers live in a hosted PostgREST backend; this crate
//! resolves visitor searches into backend queries, renders the returned rows
//! into display models, and wraps the admin and lead-capture writes.

pub mod admin;
pub mod client;
pub mod config;
pub mod contact;
pub mod i18n;
pub mod leads;
pub mod models;
pub mod presenter;
pub mod query;
pub mod route;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, instrument, warn};

// Re-export main types for convenience
pub use client::{BackendClient, Session};
pub use config::{BackendConfig, Config, ConfigError};
pub use contact::ContactConfig;
pub use i18n::Locale;
pub use models::{Banner, FlightOffer, Lead, LeadKind, PackageOffer, PriceValue, RowId};
pub use presenter::{FlightOfferView, PackageView, SearchOutcome};
pub use query::{FlightSearch, PackageQuery, SearchError, SearchParams, TableQuery};
pub use route::{City, RouteKey, RoutePreset};

/// Error types for the travel library
#[derive(Error, Debug)]
pub enum TravelError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("JSON decoding failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Invalid header value: {0}")]
    HeaderError(#[from] reqwest::header::InvalidHeaderValue),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Invalid trip type: {0}")]
    InvalidTripType(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    #[error("Invalid date format: {0}")]
    DateParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Admin session required for {0}")]
    Unauthenticated(&'static str),
}

/// Trip type as stored in the `trip` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TripType {
    #[serde(rename = "RT", alias = "round-trip", alias = "aller-retour")]
    RoundTrip,
    #[serde(rename = "OW", alias = "one-way", alias = "aller-simple")]
    OneWay,
}

impl TripType {
    /// Storage code: `RT` or `OW`
    pub fn code(self) -> &'static str {
        match self {
            TripType::RoundTrip => "RT",
            TripType::OneWay => "OW",
        }
    }

    pub fn is_round_trip(self) -> bool {
        matches!(self, TripType::RoundTrip)
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TripType {
    type Err = TravelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rt" | "round-trip" | "roundtrip" | "aller-retour" => Ok(TripType::RoundTrip),
            "ow" | "one-way" | "oneway" | "aller-simple" => Ok(TripType::OneWay),
            _ => Err(TravelError::InvalidTripType(s.to_string())),
        }
    }
}

/// Promotional season an offer is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Promo,
    Pessah,
    Sukkot,
    Summer,
    Winter,
    General,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Promo,
        Category::Pessah,
        Category::Sukkot,
        Category::Summer,
        Category::Winter,
        Category::General,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Category::Promo => "PROMO",
            Category::Pessah => "PESSAH",
            Category::Sukkot => "SUKKOT",
            Category::Summer => "SUMMER",
            Category::Winter => "WINTER",
            Category::General => "GENERAL",
        }
    }

    /// Parse a category filter where `ALL` (or an empty value) means no filter
    pub fn parse_filter(s: &str) -> Result<Option<Self>, TravelError> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Category {
    type Err = TravelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Category::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or_else(|| TravelError::InvalidCategory(s.to_string()))
    }
}

/// Run a flight search end to end: resolve, fetch, render.
///
/// Resolver rejections and backend failures never escape as errors here;
/// they come back as [`SearchOutcome::Failed`] carrying the localized text
/// the page shows inline.
#[instrument(level = "info", skip(client, params), fields(from = %params.from, to = %params.to))]
pub async fn search_flight_offers(
    client: &BackendClient,
    params: &SearchParams,
    locale: Locale,
) -> SearchOutcome {
    let search = match query::resolve(params) {
        Ok(search) => search,
        Err(e) => {
            warn!(error = %e, "Search rejected before querying");
            return SearchOutcome::Failed {
                message: e.user_message(locale),
            };
        }
    };

    match client.fetch_flight_offers(&search).await {
        Ok(offers) => {
            info!(rows = offers.len(), route = %search.route, "Flight offers fetched");
            presenter::present_search(&search, offers, locale)
        }
        Err(e) => SearchOutcome::Failed {
            message: locale.messages().backend_error(&presenter::backend_message(&e)),
        },
    }
}

/// List package offers for the packages page
pub async fn search_packages(
    client: &BackendClient,
    query: &PackageQuery,
    locale: Locale,
) -> Result<Vec<PackageView>, TravelError> {
    let packages = client.fetch_packages(query).await?;
    info!(rows = packages.len(), "Package offers fetched");
    Ok(presenter::present_packages(packages, locale))
}
