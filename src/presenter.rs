//! Display models for offer rows.
//!
//! Nothing here mutates its input or talks to the network; the functions map
//! fetched rows into the strings the pages print.

use crate::i18n::Locale;
use crate::models::{FlightOffer, PackageOffer, PriceValue, RowId};
use crate::query::FlightSearch;
use crate::{Category, TravelError, TripType};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::cmp::Ordering;

/// Shown where a price is missing
pub const PRICE_PLACEHOLDER: &str = "—";
/// Shown where a date, time or text field is missing
pub const FIELD_PLACEHOLDER: &str = "-";

const TIME_FORMATS: [&str; 4] = ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M", "%Hh%M"];

/// `10:30:00` → `10:30`; `-` when absent
pub fn format_time(value: Option<&str>) -> String {
    let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return FIELD_PLACEHOLDER.to_string();
    };

    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| raw.chars().take(5).collect())
}

/// `389` → `389€`; `—` when absent
pub fn format_price(value: Option<&PriceValue>) -> String {
    match value {
        None => PRICE_PLACEHOLDER.to_string(),
        Some(p) if p.is_blank() => PRICE_PLACEHOLDER.to_string(),
        Some(p) => match p.amount() {
            Some(amount) => format!("{amount}€"),
            None => match p {
                PriceValue::Text(raw) => format!("{}€", raw.trim()),
                PriceValue::Number(n) => format!("{n}€"),
            },
        },
    }
}

pub fn format_date(value: Option<NaiveDate>) -> String {
    value.map_or_else(|| FIELD_PLACEHOLDER.to_string(), |d| d.to_string())
}

fn text_or_placeholder(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(FIELD_PLACEHOLDER)
        .to_string()
}

/// Listing order: priority descending with unset priorities last, then
/// price ascending with unset prices last
fn listing_order(
    a_priority: Option<i32>,
    a_price: Option<f64>,
    b_priority: Option<i32>,
    b_price: Option<f64>,
) -> Ordering {
    let by_priority = match (a_priority, b_priority) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_priority.then_with(|| match (a_price, b_price) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    })
}

pub fn compare_flight_offers(a: &FlightOffer, b: &FlightOffer) -> Ordering {
    listing_order(
        a.priority,
        a.price_value().and_then(PriceValue::amount),
        b.priority,
        b.price_value().and_then(PriceValue::amount),
    )
}

pub fn compare_packages(a: &PackageOffer, b: &PackageOffer) -> Ordering {
    listing_order(
        a.priority,
        a.price_eur.as_ref().and_then(PriceValue::amount),
        b.priority,
        b.price_eur.as_ref().and_then(PriceValue::amount),
    )
}

/// One leg of a flight card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegView {
    pub date: String,
    pub departure: String,
    pub arrival: String,
}

/// Display-ready flight offer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightOfferView {
    pub id: RowId,
    pub title: String,
    pub route: Option<String>,
    pub trip: Option<TripType>,
    pub airline: String,
    pub cabin_bag: String,
    pub checked_bag: String,
    pub outbound: LegView,
    /// Present for round trips only
    pub inbound: Option<LegView>,
    pub price: String,
    pub notes: Option<String>,
}

/// Render one flight row. `search` supplies the route and trip when the row
/// leaves them empty.
pub fn present_flight(
    offer: &FlightOffer,
    search: Option<&FlightSearch>,
    locale: Locale,
) -> FlightOfferView {
    let trip = offer.trip.or(search.map(|s| s.trip));
    let route = offer.route_key().or(search.map(|s| s.route));

    let title = match offer.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => title.to_string(),
        None => {
            let label = route.map_or_else(|| "Offre".to_string(), |r| r.display_label());
            match trip {
                Some(trip) => format!("{} ({})", label, locale.messages().trip_label(trip)),
                None => label,
            }
        }
    };

    let inbound = trip.filter(|t| t.is_round_trip()).map(|_| LegView {
        date: format_date(offer.return_date),
        departure: format_time(offer.return_depart_time.as_deref()),
        arrival: format_time(offer.return_arrive_time.as_deref()),
    });

    FlightOfferView {
        id: offer.id.clone(),
        title,
        route: offer.route.clone().or_else(|| route.map(|r| r.to_string())),
        trip,
        airline: text_or_placeholder(offer.airline_name()),
        cabin_bag: text_or_placeholder(offer.cabin_bag.as_deref()),
        checked_bag: text_or_placeholder(offer.checked_bag.as_deref()),
        outbound: LegView {
            date: format_date(offer.depart_date),
            departure: format_time(offer.depart_time.as_deref()),
            arrival: format_time(offer.arrive_time.as_deref()),
        },
        inbound,
        price: format_price(offer.price_value()),
        notes: offer.notes.for_locale(locale).map(str::to_string),
    }
}

/// Result of one search cycle, as the page shows it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// No search has run yet; render nothing
    NotSearched,
    Offers { offers: Vec<FlightOfferView> },
    /// Informational, not an error
    Empty { message: String },
    Failed { message: String },
}

impl SearchOutcome {
    pub fn offers(&self) -> &[FlightOfferView] {
        match self {
            SearchOutcome::Offers { offers } => offers,
            _ => &[],
        }
    }

    /// Inline message under the search form, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            SearchOutcome::Empty { message } | SearchOutcome::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Render fetched rows. `searched` is the search that produced them; with
/// no search (no departure date yet) an empty list renders nothing.
pub fn present_results(
    mut offers: Vec<FlightOffer>,
    searched: Option<&FlightSearch>,
    locale: Locale,
) -> SearchOutcome {
    if offers.is_empty() {
        return match searched {
            Some(search) => SearchOutcome::Empty {
                message: locale
                    .messages()
                    .no_offers(&search.route.to_string(), search.trip),
            },
            None => SearchOutcome::NotSearched,
        };
    }

    offers.sort_by(compare_flight_offers);
    SearchOutcome::Offers {
        offers: offers
            .iter()
            .map(|o| present_flight(o, searched, locale))
            .collect(),
    }
}

pub fn present_search(search: &FlightSearch, offers: Vec<FlightOffer>, locale: Locale) -> SearchOutcome {
    present_results(offers, Some(search), locale)
}

/// Verbatim backend text for the labeled error line
pub fn backend_message(error: &TravelError) -> String {
    match error {
        TravelError::Backend { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Display-ready package offer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageView {
    pub id: RowId,
    pub category: Option<Category>,
    pub hotel: String,
    /// "4N · HB · 2026-04-02"
    pub summary: String,
    pub price: String,
    pub notes: Option<String>,
}

pub fn present_package(package: &PackageOffer, locale: Locale) -> PackageView {
    let nights = package
        .nights
        .map_or_else(|| FIELD_PLACEHOLDER.to_string(), |n| format!("{n}N"));
    let board = package.board.as_deref().unwrap_or("");

    PackageView {
        id: package.id.clone(),
        category: package.category,
        hotel: text_or_placeholder(package.hotel_name.as_deref()),
        summary: format!("{} · {} · {}", nights, board, format_date(package.depart_date)),
        price: format_price(package.price_eur.as_ref()),
        notes: package.notes.for_locale(locale).map(str::to_string),
    }
}

pub fn present_packages(mut packages: Vec<PackageOffer>, locale: Locale) -> Vec<PackageView> {
    packages.sort_by(compare_packages);
    packages.iter().map(|p| present_package(p, locale)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{resolve, SearchParams};
    use serde_json::json;

    fn offer(value: serde_json::Value) -> FlightOffer {
        serde_json::from_value(value).unwrap()
    }

    fn round_trip_search() -> FlightSearch {
        let mut params = SearchParams::new("Paris", "Tel Aviv", TripType::RoundTrip);
        params.depart = Some("2026-03-31".to_string());
        params.return_date = Some("2026-04-12".to_string());
        resolve(&params).unwrap()
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(Some("10:30:00")), "10:30");
        assert_eq!(format_time(Some("07:05")), "07:05");
        assert_eq!(format_time(Some("9h45")), "09:45");
        assert_eq!(format_time(Some("23:59:59.123")), "23:59");
        assert_eq!(format_time(Some("")), "-");
        assert_eq!(format_time(None), "-");
        assert_eq!(format_time(Some("morning")), "morni");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Some(&PriceValue::Number(389.0))), "389€");
        assert_eq!(format_price(Some(&PriceValue::Number(99.5))), "99.5€");
        assert_eq!(format_price(Some(&PriceValue::Text(" 245 ".into()))), "245€");
        assert_eq!(format_price(Some(&PriceValue::Text("sur demande".into()))), "sur demande€");
        assert_eq!(format_price(Some(&PriceValue::Text("".into()))), "—");
        assert_eq!(format_price(None), "—");
    }

    #[test]
    fn test_null_priority_sorts_after_set_priority_regardless_of_price() {
        let rows = vec![
            offer(json!({ "id": 1, "priority": null, "price_eur": 50 })),
            offer(json!({ "id": 2, "priority": 5, "price_eur": 100 })),
        ];
        let outcome = present_search(&round_trip_search(), rows, Locale::Fr);
        let ids: Vec<_> = outcome.offers().iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, vec![RowId::Int(2), RowId::Int(1)]);
    }

    #[test]
    fn test_equal_priority_sorts_by_price() {
        let mut rows = vec![
            offer(json!({ "id": 1, "priority": 1, "price_eur": 300 })),
            offer(json!({ "id": 2, "priority": 1, "price": "120" })),
            offer(json!({ "id": 3, "priority": 1 })),
            offer(json!({ "id": 4, "priority": 9, "price_eur": 900 })),
        ];
        rows.sort_by(compare_flight_offers);
        let ids: Vec<_> = rows.iter().map(|o| o.id.to_string()).collect();
        assert_eq!(ids, vec!["4", "2", "1", "3"]);
    }

    #[test]
    fn test_airline_fallback_is_displayed() {
        let view = present_flight(
            &offer(json!({ "id": 1, "airline": "", "ailine": "ElAl" })),
            None,
            Locale::En,
        );
        assert_eq!(view.airline, "ElAl");

        let view = present_flight(&offer(json!({ "id": 1 })), None, Locale::En);
        assert_eq!(view.airline, "-");
        assert_eq!(view.price, "—");
    }

    #[test]
    fn test_round_trip_view() {
        let search = round_trip_search();
        let view = present_flight(
            &offer(json!({
                "id": 10,
                "trip": "RT",
                "route": "PARIS_TLV",
                "depart_date": "2026-03-31",
                "return_date": "2026-04-12",
                "depart_time": "10:30:00",
                "arrive_time": "15:45:00",
                "return_depart_time": "17:00",
                "price_eur": 389
            })),
            Some(&search),
            Locale::Fr,
        );
        assert_eq!(view.title, "Paris → Tel Aviv (Aller-retour)");
        assert_eq!(view.outbound.departure, "10:30");
        assert_eq!(view.outbound.arrival, "15:45");
        let inbound = view.inbound.unwrap();
        assert_eq!(inbound.date, "2026-04-12");
        assert_eq!(inbound.departure, "17:00");
        assert_eq!(inbound.arrival, "-");
        assert_eq!(view.price, "389€");
    }

    #[test]
    fn test_one_way_view_has_no_return_leg() {
        let view = present_flight(
            &offer(json!({ "id": 3, "trip": "OW", "route": "TLV_PARIS", "title": "Retour promo" })),
            None,
            Locale::En,
        );
        assert_eq!(view.title, "Retour promo");
        assert!(view.inbound.is_none());
    }

    #[test]
    fn test_empty_result_with_search_shows_message() {
        let outcome = present_search(&round_trip_search(), Vec::new(), Locale::En);
        assert_eq!(
            outcome,
            SearchOutcome::Empty {
                message: "No offers found for PARIS_TLV (RT) at these dates.".to_string()
            }
        );
    }

    #[test]
    fn test_empty_result_without_search_renders_nothing() {
        let outcome = present_results(Vec::new(), None, Locale::En);
        assert_eq!(outcome, SearchOutcome::NotSearched);
        assert!(outcome.message().is_none());
    }

    #[test]
    fn test_presenting_does_not_mutate_input() {
        let row = offer(json!({ "id": 1, "ailine": "ElAl", "depart_time": "10:30:00" }));
        let before = row.clone();
        let _ = present_flight(&row, None, Locale::Fr);
        assert_eq!(row, before);
    }

    #[test]
    fn test_backend_message_is_verbatim() {
        let err = TravelError::Backend {
            status: 400,
            message: "column offers_flight.ailine does not exist".to_string(),
        };
        assert_eq!(backend_message(&err), "column offers_flight.ailine does not exist");
        assert_eq!(
            Locale::Fr.messages().backend_error(&backend_message(&err)),
            "Erreur : column offers_flight.ailine does not exist"
        );
    }

    #[test]
    fn test_packages_are_sorted_and_localized() {
        let rows: Vec<PackageOffer> = serde_json::from_value(json!([
            { "id": 1, "hotel_name": "Dan Eilat", "nights": 4, "board": "BB", "price_eur": 700, "priority": 1, "depart_date": "2026-04-02" },
            { "id": 2, "hotel_name": "Herods", "nights": 7, "board": "HB", "price_eur": 1200, "priority": 3, "notes_he": "כולל העברות" }
        ]))
        .unwrap();

        let views = present_packages(rows, Locale::He);
        assert_eq!(views[0].hotel, "Herods");
        assert_eq!(views[0].notes.as_deref(), Some("כולל העברות"));
        assert_eq!(views[0].summary, "7N · HB · -");
        assert_eq!(views[1].summary, "4N · BB · 2026-04-02");
        assert_eq!(views[1].price, "700€");
    }
}
