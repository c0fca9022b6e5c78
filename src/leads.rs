//! Quote request forms and their capture as leads

use crate::client::BackendClient;
use crate::i18n::Locale;
use crate::models::LeadKind;
use crate::TravelError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{error, info, instrument};

/// A contact form whose fields become a lead payload
pub trait LeadForm: Serialize {
    const KIND: LeadKind;

    /// Reject the submission before anything is sent
    fn validate(&self) -> Result<(), TravelError>;
}

fn require(field: &'static str, value: &str) -> Result<(), TravelError> {
    if value.trim().is_empty() {
        return Err(TravelError::MissingField(field));
    }
    Ok(())
}

/// Hotel quote request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelQuoteForm {
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkin: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<NaiveDate>,
    pub adults: u32,
    pub children: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl HotelQuoteForm {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            checkin: None,
            checkout: None,
            adults: 2,
            children: 0,
            budget: None,
            notes: None,
        }
    }
}

impl LeadForm for HotelQuoteForm {
    const KIND: LeadKind = LeadKind::HotelQuote;

    fn validate(&self) -> Result<(), TravelError> {
        require("destination", &self.destination)?;
        if self.adults == 0 {
            return Err(TravelError::InvalidValue {
                field: "adults",
                value: self.adults.to_string(),
            });
        }
        Ok(())
    }
}

/// Car rental quote request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarQuoteForm {
    pub country: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropoff: Option<NaiveDateTime>,
    /// Car category as typed, e.g. "SUV"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CarQuoteForm {
    pub fn new(country: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            city: city.into(),
            pickup: None,
            dropoff: None,
            category: None,
            notes: None,
        }
    }
}

impl LeadForm for CarQuoteForm {
    const KIND: LeadKind = LeadKind::CarQuote;

    fn validate(&self) -> Result<(), TravelError> {
        require("country", &self.country)?;
        require("city", &self.city)
    }
}

/// Parse a `datetime-local` value (`2026-04-02T10:00`, seconds optional)
pub fn parse_local_datetime(raw: &str) -> Result<NaiveDateTime, TravelError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| TravelError::DateParseError(raw.to_string()))
}

/// Insert body for the leads collection
#[derive(Debug, Serialize)]
struct NewLead<'a, P: Serialize> {
    #[serde(rename = "type")]
    kind: LeadKind,
    lang: Locale,
    payload: &'a P,
}

/// Validate and store a form as a lead
#[instrument(level = "info", skip(client, form), fields(kind = %F::KIND))]
pub async fn submit_lead<F: LeadForm>(
    client: &BackendClient,
    form: &F,
    locale: Locale,
) -> Result<(), TravelError> {
    form.validate()?;

    let lead = NewLead {
        kind: F::KIND,
        lang: locale,
        payload: form,
    };
    match client.insert_minimal(&client.tables().leads_table, &lead).await {
        Ok(()) => {
            info!("Lead captured");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Lead capture failed");
            Err(e)
        }
    }
}

/// Confirmation line shown under the form after submitting
pub fn submission_message(result: &Result<(), TravelError>, locale: Locale) -> &'static str {
    let messages = locale.messages();
    match result {
        Ok(()) => messages.lead_sent,
        Err(_) => messages.lead_failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hotel_form_defaults_and_payload() {
        let mut form = HotelQuoteForm::new("Eilat");
        form.checkin = NaiveDate::from_ymd_opt(2026, 4, 2);
        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(
            value,
            json!({ "destination": "Eilat", "checkin": "2026-04-02", "adults": 2, "children": 0 })
        );
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_hotel_form_requires_destination() {
        let form = HotelQuoteForm::new("  ");
        assert!(matches!(form.validate(), Err(TravelError::MissingField("destination"))));

        let mut form = HotelQuoteForm::new("Tel Aviv");
        form.adults = 0;
        assert!(matches!(form.validate(), Err(TravelError::InvalidValue { field: "adults", .. })));
    }

    #[test]
    fn test_car_form_requires_country_and_city() {
        assert!(matches!(
            CarQuoteForm::new("", "Eilat").validate(),
            Err(TravelError::MissingField("country"))
        ));
        assert!(matches!(
            CarQuoteForm::new("Israel", "").validate(),
            Err(TravelError::MissingField("city"))
        ));
        assert!(CarQuoteForm::new("Israel", "Eilat").validate().is_ok());
    }

    #[test]
    fn test_lead_body_shape() {
        let mut form = CarQuoteForm::new("Israel", "Eilat");
        form.pickup = Some(parse_local_datetime("2026-04-02T10:00").unwrap());
        let lead = NewLead {
            kind: CarQuoteForm::KIND,
            lang: Locale::He,
            payload: &form,
        };
        let value = serde_json::to_value(&lead).unwrap();
        assert_eq!(value["type"], "CAR_QUOTE");
        assert_eq!(value["lang"], "he");
        assert_eq!(value["payload"]["pickup"], "2026-04-02T10:00:00");
        assert!(value["payload"].get("dropoff").is_none());
    }

    #[test]
    fn test_parse_local_datetime_rejects_garbage() {
        assert!(parse_local_datetime("tomorrow").is_err());
        assert!(parse_local_datetime("2026-04-02T10:00:30").is_ok());
    }

    #[test]
    fn test_invalid_form_is_rejected_before_sending() {
        // Unroutable backend: any request would fail with an HTTP error
        let client = BackendClient::with_client(
            reqwest::Client::new(),
            url::Url::parse("http://127.0.0.1:9").unwrap(),
            secrecy::SecretString::from("anon".to_string()),
            crate::config::BackendConfig::default(),
        );
        let form = HotelQuoteForm::new("");
        let result = tokio_test::block_on(submit_lead(&client, &form, Locale::Fr));
        assert!(matches!(result, Err(TravelError::MissingField("destination"))));
    }

    #[test]
    fn test_submission_message() {
        assert_eq!(submission_message(&Ok(()), Locale::Fr), "Demande envoyée ✅");
        let failed = Err(TravelError::MissingField("city"));
        assert_eq!(submission_message(&failed, Locale::En), "Error, please try again.");
    }
}
