//! Admin data operations: offer, banner and lead management.
//!
//! Every operation goes through a signed-in [`BackendClient`]. Writes are
//! independent single requests; nothing here is transactional.

use crate::client::BackendClient;
use crate::models::{
    return_date_issue, Banner, FlightOffer, Lead, NewBanner, NewFlightOffer, NewPackageOffer,
    PackageOffer, RowId,
};
use crate::query::{Order, TableQuery};
use crate::TravelError;
use chrono::Utc;
use std::path::Path;
use tracing::{info, instrument, warn};

pub const OFFER_LIST_LIMIT: usize = 50;
pub const BANNER_LIST_LIMIT: usize = 50;
pub const LEAD_LIST_LIMIT: usize = 100;

/// Image attached to a new banner
#[derive(Debug, Clone)]
pub struct BannerImage {
    /// Name of the file as picked by the admin; only its extension is kept
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl BannerImage {
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or("png")
            .to_lowercase()
    }

    pub fn content_type(&self) -> &'static str {
        match self.extension().as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            "gif" => "image/gif",
            "svg" => "image/svg+xml",
            "avif" => "image/avif",
            _ => "application/octet-stream",
        }
    }

    /// Storage object name: `banner_<millis>.<ext>`
    pub fn object_name(&self, millis: i64) -> String {
        format!("banner_{}.{}", millis, self.extension())
    }
}

/// Admin operations bound to a signed-in client
pub struct Admin<'a> {
    client: &'a BackendClient,
}

impl<'a> Admin<'a> {
    pub fn new(client: &'a BackendClient) -> Result<Self, TravelError> {
        if !client.has_session() {
            return Err(TravelError::Unauthenticated("admin operations"));
        }
        Ok(Self { client })
    }

    /// Latest 50 flight offers, newest first
    #[instrument(level = "info", skip(self))]
    pub async fn list_flights(&self) -> Result<Vec<FlightOffer>, TravelError> {
        let query = TableQuery::new(&self.client.tables().flights_table)
            .order(Order::desc("created_at"))
            .limit(OFFER_LIST_LIMIT);
        self.client.select(&query).await
    }

    /// Latest 50 package offers, newest first
    #[instrument(level = "info", skip(self))]
    pub async fn list_packages(&self) -> Result<Vec<PackageOffer>, TravelError> {
        let query = TableQuery::new(&self.client.tables().packages_table)
            .order(Order::desc("created_at"))
            .limit(OFFER_LIST_LIMIT);
        self.client.select(&query).await
    }

    /// Banners in display order
    #[instrument(level = "info", skip(self))]
    pub async fn list_banners(&self) -> Result<Vec<Banner>, TravelError> {
        let query = TableQuery::new(&self.client.tables().banners_table)
            .order(Order::asc("sort_order"))
            .limit(BANNER_LIST_LIMIT);
        self.client.select(&query).await
    }

    /// Latest 100 leads, newest first
    #[instrument(level = "info", skip(self))]
    pub async fn list_leads(&self) -> Result<Vec<Lead>, TravelError> {
        let query = TableQuery::new(&self.client.tables().leads_table)
            .order(Order::desc("created_at"))
            .limit(LEAD_LIST_LIMIT);
        self.client.select(&query).await
    }

    /// Insert a flight offer. Inconsistent date pairs are logged, not refused.
    #[instrument(level = "info", skip(self, offer), fields(route = %offer.route, trip = %offer.trip))]
    pub async fn add_flight(&self, offer: &NewFlightOffer) -> Result<FlightOffer, TravelError> {
        if let Some(issue) = return_date_issue(Some(offer.trip), offer.depart_date, offer.return_date) {
            warn!(issue, "Flight offer has inconsistent dates");
        }
        let row: FlightOffer = self
            .client
            .insert(&self.client.tables().flights_table, offer)
            .await?;
        info!(id = %row.id, "Flight offer added");
        Ok(row)
    }

    #[instrument(level = "info", skip(self, package), fields(hotel = %package.hotel_name))]
    pub async fn add_package(&self, package: &NewPackageOffer) -> Result<PackageOffer, TravelError> {
        let row: PackageOffer = self
            .client
            .insert(&self.client.tables().packages_table, package)
            .await?;
        info!(id = %row.id, "Package offer added");
        Ok(row)
    }

    /// Upload the image, then insert the banner pointing at it. A failed
    /// upload inserts nothing.
    #[instrument(level = "info", skip(self, banner, image), fields(file = %image.file_name))]
    pub async fn add_banner(&self, banner: NewBanner, image: BannerImage) -> Result<Banner, TravelError> {
        let path = image.object_name(Utc::now().timestamp_millis());
        let content_type = image.content_type();
        self.client
            .upload_object(&self.client.tables().banner_bucket, &path, image.bytes, content_type)
            .await?;
        info!(path = %path, "Banner image uploaded");

        let banner = NewBanner {
            image_path_desktop: Some(path),
            ..banner
        };
        self.client
            .insert(&self.client.tables().banners_table, &banner)
            .await
    }

    pub async fn delete_flight(&self, id: &RowId) -> Result<(), TravelError> {
        self.client.delete(&self.client.tables().flights_table, id).await
    }

    pub async fn delete_package(&self, id: &RowId) -> Result<(), TravelError> {
        self.client.delete(&self.client.tables().packages_table, id).await
    }

    pub async fn delete_banner(&self, id: &RowId) -> Result<(), TravelError> {
        self.client.delete(&self.client.tables().banners_table, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use secrecy::SecretString;
    use url::Url;

    fn image(name: &str) -> BannerImage {
        BannerImage {
            file_name: name.to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[test]
    fn test_object_name_keeps_extension() {
        assert_eq!(image("pessah.JPG").object_name(1_760_000_000_000), "banner_1760000000000.jpg");
        assert_eq!(image("hero.webp").content_type(), "image/webp");
    }

    #[test]
    fn test_object_name_defaults_to_png() {
        assert_eq!(image("hero").object_name(42), "banner_42.png");
        assert_eq!(image("hero.").extension(), "png");
        assert_eq!(image("hero").content_type(), "image/png");
    }

    #[test]
    fn test_admin_requires_session() {
        let client = BackendClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://demo.supabase.co").unwrap(),
            SecretString::from("anon".to_string()),
            BackendConfig::default(),
        );
        assert!(matches!(
            Admin::new(&client),
            Err(TravelError::Unauthenticated(_))
        ));

        let client = client.with_session(crate::client::Session::new("jwt"));
        assert!(Admin::new(&client).is_ok());
    }
}
