//! Search resolution and backend query construction.
//!
//! [`resolve`] turns raw search input into a validated [`FlightSearch`] or a
//! [`SearchError`] before anything touches the network. [`TableQuery`] is the
//! small equality-filter / order / limit subset of the PostgREST query
//! language the site needs.

use crate::i18n::Locale;
use crate::route::{RouteKey, RoutePreset};
use crate::{Category, TravelError, TripType};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a search is rejected before querying
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("unsupported route: {from} -> {to}")]
    UnsupportedRoute { from: String, to: String },

    #[error("invalid trip type: {0}")]
    InvalidTripType(String),

    #[error("missing departure date")]
    MissingDepartDate,

    #[error("missing return date for a round trip")]
    MissingReturnDate,

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

impl SearchError {
    /// Inline message shown next to the search form
    pub fn user_message(&self, locale: Locale) -> String {
        let messages = locale.messages();
        match self {
            SearchError::UnsupportedRoute { .. } => messages.unsupported_route.to_string(),
            SearchError::InvalidTripType(raw) => messages.invalid_trip(raw),
            SearchError::MissingDepartDate => messages.missing_depart_date.to_string(),
            SearchError::MissingReturnDate => messages.missing_return_date.to_string(),
            SearchError::InvalidDate(raw) => messages.invalid_date(raw),
        }
    }
}

/// A single `column=eq.value` restriction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    fn to_param(&self) -> (String, String) {
        (self.column.clone(), format!("eq.{}", self.value))
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
    pub nulls_last: bool,
}

impl Order {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            descending: false,
            nulls_last: false,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            descending: true,
            nulls_last: false,
        }
    }

    /// Postgres puts nulls first on descending sorts unless told otherwise
    pub fn desc_nulls_last(column: &str) -> Self {
        Self {
            nulls_last: true,
            ..Self::desc(column)
        }
    }

    fn to_param(&self) -> String {
        let mut out = format!(
            "{}.{}",
            self.column,
            if self.descending { "desc" } else { "asc" }
        );
        if self.nulls_last {
            out.push_str(".nullslast");
        }
        out
    }
}

/// Select over one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    table: String,
    select: String,
    filters: Vec<Filter>,
    order: Vec<Order>,
    limit: Option<usize>,
}

impl TableQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            select: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Offer listing order: priority high to low (unset last), then cheapest
    pub fn offer_order(self) -> Self {
        self.order(Order::desc_nulls_last("priority"))
            .order(Order::asc("price_eur"))
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Value of the equality filter on `column`, if any
    pub fn filter_value(&self, column: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|f| f.column == column)
            .map(|f| f.value.as_str())
    }

    /// PostgREST query parameters
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.select.clone())];
        pairs.extend(self.filters.iter().map(Filter::to_param));
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(Order::to_param)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("order".to_string(), order));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// Raw flight search input, as typed in the form or carried in the URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub from: String,
    pub to: String,
    /// `RT` / `OW`; blank means round trip
    #[serde(default)]
    pub trip: String,
    #[serde(default)]
    pub depart: Option<String>,
    #[serde(default, rename = "return")]
    pub return_date: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl SearchParams {
    pub fn new(from: &str, to: &str, trip: TripType) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            trip: trip.code().to_string(),
            ..Self::default()
        }
    }

    /// Empty round-trip search prefilled from a `/flights/<slug>` path
    pub fn for_slug(slug: &str) -> Self {
        let preset = RoutePreset::from_slug(slug);
        Self::new(
            preset.from.display_name(),
            preset.to.display_name(),
            TripType::RoundTrip,
        )
    }

    /// Parse `from`, `to`, `trip`, `depart`, `return` and `cat` from a
    /// query string; missing cities come from the slug preset. An unknown
    /// category is an error, `cat=ALL` means no filter.
    pub fn from_query(slug: &str, query: &str) -> Result<Self, TravelError> {
        let mut params = Self::for_slug(slug);
        let query = query.trim_start_matches('?');

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "from" => params.from = value,
                "to" => params.to = value,
                "trip" => params.trip = value,
                "depart" => params.depart = Some(value),
                "return" => params.return_date = Some(value),
                "cat" | "category" => params.category = Category::parse_filter(&value)?,
                _ => {}
            }
        }
        Ok(params)
    }

    /// Whether the URL carried enough to run the search on page load
    pub fn has_search_input(query: &str) -> bool {
        url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .any(|(k, _)| matches!(k.as_ref(), "from" | "to" | "trip" | "depart"))
    }

    /// Fill missing dates with today + 14 days and, for round trips,
    /// today + 21 days
    pub fn with_default_dates(mut self, today: NaiveDate) -> Self {
        if is_blank(&self.depart) {
            self.depart = Some((today + Duration::days(14)).to_string());
        }
        if self.trip_type() != Some(TripType::OneWay) && is_blank(&self.return_date) {
            self.return_date = Some((today + Duration::days(21)).to_string());
        }
        self
    }

    /// Change trip type; one-way searches drop their return date
    pub fn set_trip(&mut self, trip: TripType) {
        self.trip = trip.code().to_string();
        if trip == TripType::OneWay {
            self.return_date = None;
        }
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
    }

    fn trip_type(&self) -> Option<TripType> {
        if self.trip.trim().is_empty() {
            Some(TripType::RoundTrip)
        } else {
            self.trip.parse().ok()
        }
    }

    /// Shareable query string; `return` is only kept for round trips
    pub fn to_query_string(&self) -> String {
        let mut qs = url::form_urlencoded::Serializer::new(String::new());
        qs.append_pair("from", &self.from);
        qs.append_pair("to", &self.to);
        let trip = self.trip_type().unwrap_or(TripType::RoundTrip);
        qs.append_pair("trip", trip.code());
        if let Some(depart) = non_blank(&self.depart) {
            qs.append_pair("depart", depart);
        }
        if trip == TripType::RoundTrip {
            if let Some(ret) = non_blank(&self.return_date) {
                qs.append_pair("return", ret);
            }
        }
        qs.finish()
    }

    /// `/<lang>/flights/<slug>?<query>`
    pub fn page_path(&self, locale: Locale, slug: &str) -> String {
        format!("/{}/flights/{}?{}", locale, slug, self.to_query_string())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    non_blank(value).is_none()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(raw: &str) -> Result<NaiveDate, SearchError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| SearchError::InvalidDate(raw.to_string()))
}

/// A validated flight search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightSearch {
    pub route: RouteKey,
    pub trip: TripType,
    pub depart_date: NaiveDate,
    /// Always `None` for one-way searches
    pub return_date: Option<NaiveDate>,
    pub category: Option<Category>,
}

impl FlightSearch {
    /// Equality filters in query order
    pub fn filters(&self) -> Vec<Filter> {
        let mut filters = vec![Filter::eq("active", true)];
        if let Some(category) = self.category {
            filters.push(Filter::eq("category", category));
        }
        filters.push(Filter::eq("route", self.route));
        filters.push(Filter::eq("trip", self.trip));
        filters.push(Filter::eq("depart_date", self.depart_date));
        if let (TripType::RoundTrip, Some(ret)) = (self.trip, self.return_date) {
            filters.push(Filter::eq("return_date", ret));
        }
        filters
    }

    pub fn to_query(&self, table: &str) -> TableQuery {
        self.filters()
            .into_iter()
            .fold(TableQuery::new(table), TableQuery::filter)
            .offer_order()
    }
}

/// Validate raw input into a [`FlightSearch`].
///
/// Checks run in order: route, trip type, departure date, return date.
/// The return date is ignored entirely for one-way trips.
pub fn resolve(params: &SearchParams) -> Result<FlightSearch, SearchError> {
    let route = RouteKey::resolve(&params.from, &params.to).ok_or_else(|| {
        SearchError::UnsupportedRoute {
            from: params.from.trim().to_string(),
            to: params.to.trim().to_string(),
        }
    })?;

    let trip = params
        .trip_type()
        .ok_or_else(|| SearchError::InvalidTripType(params.trip.clone()))?;

    let depart_date = non_blank(&params.depart)
        .ok_or(SearchError::MissingDepartDate)
        .and_then(parse_date)?;

    let return_date = match trip {
        TripType::OneWay => None,
        TripType::RoundTrip => Some(
            non_blank(&params.return_date)
                .ok_or(SearchError::MissingReturnDate)
                .and_then(parse_date)?,
        ),
    };

    Ok(FlightSearch {
        route,
        trip,
        depart_date,
        return_date,
        category: params.category,
    })
}

/// Filters for the packages page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageQuery {
    pub category: Option<Category>,
    pub depart_date: Option<NaiveDate>,
    pub nights: Option<u32>,
}

impl PackageQuery {
    /// Parse `cat`, `depart` and `nights`; `cat=ALL` means every category
    pub fn from_query(query: &str) -> Result<Self, TravelError> {
        let mut out = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "cat" => out.category = Category::parse_filter(value)?,
                "depart" => {
                    out.depart_date = Some(
                        parse_date(value).map_err(|_| TravelError::DateParseError(value.to_string()))?,
                    );
                }
                "nights" => {
                    out.nights = Some(value.parse().map_err(|_| TravelError::InvalidValue {
                        field: "nights",
                        value: value.to_string(),
                    })?);
                }
                _ => {}
            }
        }
        Ok(out)
    }

    pub fn to_query(&self, table: &str) -> TableQuery {
        let mut query = TableQuery::new(table).eq("active", true);
        if let Some(category) = self.category {
            query = query.eq("category", category);
        }
        if let Some(depart) = self.depart_date {
            query = query.eq("depart_date", depart);
        }
        if let Some(nights) = self.nights {
            query = query.eq("nights", nights);
        }
        query.offer_order()
    }
}

/// Active PROMO rows of an offers table, in listing order
pub fn promo_query(table: &str) -> TableQuery {
    TableQuery::new(table)
        .eq("active", true)
        .eq("category", Category::Promo)
        .offer_order()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn params(from: &str, to: &str, trip: &str, depart: Option<&str>, ret: Option<&str>) -> SearchParams {
        SearchParams {
            from: from.to_string(),
            to: to.to_string(),
            trip: trip.to_string(),
            depart: depart.map(str::to_string),
            return_date: ret.map(str::to_string),
            category: None,
        }
    }

    #[test]
    fn test_resolve_round_trip_example() {
        let search = resolve(&params("paris", "Tel Aviv", "RT", Some("2026-03-31"), Some("2026-04-12"))).unwrap();
        let query = search.to_query("offers_flights");

        assert_eq!(query.filter_value("active"), Some("true"));
        assert_eq!(query.filter_value("route"), Some("PARIS_TLV"));
        assert_eq!(query.filter_value("trip"), Some("RT"));
        assert_eq!(query.filter_value("depart_date"), Some("2026-03-31"));
        assert_eq!(query.filter_value("return_date"), Some("2026-04-12"));
        assert_eq!(query.filter_value("category"), None);
    }

    #[test]
    fn test_one_way_never_filters_on_return_date() {
        let search = resolve(&params("Tel Aviv", "Paris", "OW", Some("2026-05-01"), Some("2026-05-09"))).unwrap();
        assert_eq!(search.return_date, None);
        assert!(search.filters().iter().all(|f| f.column != "return_date"));
        assert_eq!(search.route.to_string(), "TLV_PARIS");
    }

    #[test]
    fn test_round_trip_without_return_is_rejected() {
        let err = resolve(&params("Paris", "TLV", "RT", Some("2026-03-31"), None)).unwrap_err();
        assert_eq!(err, SearchError::MissingReturnDate);

        let err = resolve(&params("Paris", "TLV", "RT", Some("2026-03-31"), Some("  "))).unwrap_err();
        assert_eq!(err, SearchError::MissingReturnDate);
    }

    #[test]
    fn test_missing_depart_is_rejected() {
        let err = resolve(&params("Paris", "TLV", "OW", None, None)).unwrap_err();
        assert_eq!(err, SearchError::MissingDepartDate);
    }

    #[test]
    fn test_unsupported_route_is_checked_first() {
        let err = resolve(&params("London", "TLV", "RT", None, None)).unwrap_err();
        assert!(matches!(err, SearchError::UnsupportedRoute { .. }));
        assert_eq!(
            err.user_message(Locale::En),
            "Unsupported route. Use Paris ↔ Tel Aviv or Paris ↔ Eilat."
        );
    }

    #[test]
    fn test_invalid_inputs() {
        let err = resolve(&params("Paris", "TLV", "OW", Some("31/03/2026"), None)).unwrap_err();
        assert_eq!(err, SearchError::InvalidDate("31/03/2026".to_string()));

        let err = resolve(&params("Paris", "TLV", "MC", Some("2026-03-31"), None)).unwrap_err();
        assert_eq!(err, SearchError::InvalidTripType("MC".to_string()));
    }

    #[test]
    fn test_blank_trip_defaults_to_round_trip() {
        let search = resolve(&params("Paris", "Eilat", "", Some("2026-07-01"), Some("2026-07-08"))).unwrap();
        assert_eq!(search.trip, TripType::RoundTrip);
        assert_eq!(search.route.to_string(), "PARIS_EILAT");
    }

    #[test]
    fn test_query_pairs_order_and_nulls() {
        let mut p = params("Paris", "TLV", "RT", Some("2026-03-31"), Some("2026-04-12"));
        p.category = Some(Category::Promo);
        let pairs = resolve(&p).unwrap().to_query("offers_flights").to_query_pairs();

        assert_eq!(pairs[0], ("select".to_string(), "*".to_string()));
        assert!(pairs.contains(&("category".to_string(), "eq.PROMO".to_string())));
        assert!(pairs.contains(&("route".to_string(), "eq.PARIS_TLV".to_string())));
        assert_eq!(
            pairs.last().unwrap(),
            &("order".to_string(), "priority.desc.nullslast,price_eur.asc".to_string())
        );
    }

    #[test]
    fn test_from_query_uses_slug_presets() {
        let p = SearchParams::from_query("paris", "?trip=OW&depart=2026-03-31").unwrap();
        assert_eq!(p.from, "Tel Aviv");
        assert_eq!(p.to, "Paris");
        assert_eq!(p.trip, "OW");
        assert_eq!(p.depart.as_deref(), Some("2026-03-31"));

        let p = SearchParams::from_query("tlv", "from=PARIS&to=TLV&trip=RT&depart=2026-03-31&return=2026-04-12")
            .unwrap();
        assert_eq!(resolve(&p).unwrap().return_date, Some(date("2026-04-12")));
    }

    #[test]
    fn test_from_query_category() {
        let p = SearchParams::from_query("tlv", "cat=pessah&depart=2026-03-31").unwrap();
        assert_eq!(p.category, Some(Category::Pessah));

        let p = SearchParams::from_query("tlv", "cat=ALL").unwrap();
        assert_eq!(p.category, None);

        let err = SearchParams::from_query("tlv", "cat=PESAH&depart=2026-03-31").unwrap_err();
        assert!(matches!(err, TravelError::InvalidCategory(ref raw) if raw == "PESAH"));
    }

    #[test]
    fn test_has_search_input() {
        assert!(SearchParams::has_search_input("?depart=2026-03-31"));
        assert!(!SearchParams::has_search_input(""));
        assert!(!SearchParams::has_search_input("utm_source=mail"));
    }

    #[test]
    fn test_query_string_round_trip_and_one_way() {
        let mut p = params("Paris", "Tel Aviv", "RT", Some("2026-03-31"), Some("2026-04-12"));
        assert_eq!(
            p.to_query_string(),
            "from=Paris&to=Tel+Aviv&trip=RT&depart=2026-03-31&return=2026-04-12"
        );

        p.set_trip(TripType::OneWay);
        assert_eq!(p.return_date, None);
        assert_eq!(p.to_query_string(), "from=Paris&to=Tel+Aviv&trip=OW&depart=2026-03-31");
        assert_eq!(
            p.page_path(Locale::En, "tlv"),
            "/en/flights/tlv?from=Paris&to=Tel+Aviv&trip=OW&depart=2026-03-31"
        );
    }

    #[test]
    fn test_default_dates() {
        let today = date("2026-10-16");
        let p = SearchParams::for_slug("tlv").with_default_dates(today);
        assert_eq!(p.depart.as_deref(), Some("2026-10-30"));
        assert_eq!(p.return_date.as_deref(), Some("2026-11-06"));

        let mut ow = SearchParams::for_slug("tlv");
        ow.set_trip(TripType::OneWay);
        let ow = ow.with_default_dates(today);
        assert_eq!(ow.return_date, None);
    }

    #[test]
    fn test_swap() {
        let mut p = SearchParams::for_slug("tlv");
        p.swap();
        assert_eq!((p.from.as_str(), p.to.as_str()), ("Tel Aviv", "Paris"));
    }

    #[test]
    fn test_package_query() {
        let q = PackageQuery::from_query("cat=ALL&depart=2026-04-02&nights=4").unwrap();
        assert_eq!(q.category, None);
        let tq = q.to_query("offers_packages");
        assert_eq!(tq.filter_value("nights"), Some("4"));
        assert_eq!(tq.filter_value("depart_date"), Some("2026-04-02"));
        assert_eq!(tq.filter_value("category"), None);

        let q = PackageQuery::from_query("cat=sukkot&nights=").unwrap();
        assert_eq!(q.category, Some(Category::Sukkot));
        assert_eq!(q.nights, None);

        assert!(PackageQuery::from_query("nights=four").is_err());
    }

    #[test]
    fn test_promo_query() {
        let q = promo_query("offers_packages");
        assert_eq!(q.table(), "offers_packages");
        assert_eq!(q.filter_value("category"), Some("PROMO"));
        assert_eq!(q.filter_value("active"), Some("true"));
    }
}
