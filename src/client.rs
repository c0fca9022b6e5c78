//! HTTP client for the hosted backend (PostgREST rows, password auth and
//! object storage)

use crate::config::BackendConfig;
use crate::models::{FlightOffer, PackageOffer, RowId};
use crate::query::{promo_query, FlightSearch, PackageQuery, TableQuery};
use crate::TravelError;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};
use url::Url;

/// Signed-in admin session. Row writes made with it pass the backend's
/// row-level policies.
#[derive(Debug)]
pub struct Session {
    access_token: SecretString,
    pub email: Option<String>,
    pub expires_in: Option<u64>,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            email: None,
            expires_in: None,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    user: Option<TokenUser>,
}

#[derive(Deserialize)]
struct TokenUser {
    #[serde(default)]
    email: Option<String>,
}

/// Error body shapes: PostgREST uses `message`, the auth server `msg` or
/// `error_description`
#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

/// Backend client. Pass it explicitly to whatever needs the store.
pub struct BackendClient {
    http: Client,
    base_url: Url,
    anon_key: SecretString,
    session: Option<Session>,
    tables: BackendConfig,
}

impl BackendClient {
    /// Create a client from configuration
    pub fn new(config: &BackendConfig) -> Result<Self, TravelError> {
        debug!(url = %config.url, "Creating backend client");
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("aviel-travel/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = Url::parse(&config.url)?;

        Ok(Self::with_client(
            http,
            base_url,
            SecretString::from(config.anon_key.clone()),
            config.clone(),
        ))
    }

    /// Create a client around a pre-built `reqwest::Client`
    pub fn with_client(http: Client, mut base_url: Url, anon_key: SecretString, tables: BackendConfig) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http,
            base_url,
            anon_key,
            session: None,
            tables,
        }
    }

    /// Attach an admin session to subsequent requests
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn tables(&self) -> &BackendConfig {
        &self.tables
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TravelError> {
        Ok(self.base_url.join(path)?)
    }

    fn rest_url(&self, table: &str) -> Result<Url, TravelError> {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    /// Request with `apikey` and bearer headers. The bearer is the session
    /// token when signed in, the anon key otherwise.
    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, TravelError> {
        let mut apikey = HeaderValue::from_str(self.anon_key.expose_secret())?;
        apikey.set_sensitive(true);

        let token = match &self.session {
            Some(session) => session.access_token.expose_secret(),
            None => self.anon_key.expose_secret(),
        };
        let mut bearer = HeaderValue::from_str(&format!("Bearer {token}"))?;
        bearer.set_sensitive(true);

        Ok(self
            .http
            .request(method, url)
            .header("apikey", apikey)
            .header(AUTHORIZATION, bearer))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, TravelError> {
        let start_time = Instant::now();
        let response = request.send().await?;
        let status = response.status();

        info!(
            status = %status,
            duration_ms = start_time.elapsed().as_millis(),
            "Backend request completed"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    body.trim().to_string()
                }
            });

        error!(status = %status, message = %message, "Backend request failed");
        Err(TravelError::Backend {
            status: status.as_u16(),
            message,
        })
    }

    /// Body decode failures surface as [`TravelError::JsonError`]
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TravelError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, body_len = body.len(), "Backend response did not decode");
            TravelError::JsonError(e)
        })
    }

    /// Fetch rows matching `query`
    #[instrument(level = "debug", skip(self, query), fields(table = query.table()))]
    pub async fn select<T: DeserializeOwned>(&self, query: &TableQuery) -> Result<Vec<T>, TravelError> {
        let mut url = self.rest_url(query.table())?;
        url.query_pairs_mut().extend_pairs(query.to_query_pairs());
        debug!(url = %url, "Selecting rows");

        let response = self.send(self.request(Method::GET, url)?).await?;
        let rows: Vec<T> = Self::decode(response).await?;
        debug!(rows = rows.len(), "Rows decoded");
        Ok(rows)
    }

    /// Insert one row and return it as stored
    #[instrument(level = "info", skip(self, row))]
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
    ) -> Result<T, TravelError> {
        let request = self
            .request(Method::POST, self.rest_url(table)?)?
            .header("Prefer", "return=representation")
            .json(row);

        let mut rows: Vec<T> = Self::decode(self.send(request).await?).await?;
        if rows.is_empty() {
            return Err(TravelError::Backend {
                status: 200,
                message: format!("insert into {table} returned no row"),
            });
        }
        Ok(rows.swap_remove(0))
    }

    /// Insert one row without reading it back; for collections the caller
    /// may write but not read
    #[instrument(level = "info", skip(self, row))]
    pub async fn insert_minimal<B: Serialize + ?Sized>(&self, table: &str, row: &B) -> Result<(), TravelError> {
        let request = self
            .request(Method::POST, self.rest_url(table)?)?
            .header("Prefer", "return=minimal")
            .json(row);
        self.send(request).await?;
        Ok(())
    }

    /// Delete the row with the given id
    #[instrument(level = "info", skip(self, id), fields(id = %id))]
    pub async fn delete(&self, table: &str, id: &RowId) -> Result<(), TravelError> {
        let mut url = self.rest_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        self.send(self.request(Method::DELETE, url)?).await?;
        Ok(())
    }

    /// Password sign-in against the auth endpoint
    #[instrument(level = "info", skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session, TravelError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let body = serde_json::json!({
            "email": email,
            "password": password.expose_secret(),
        });
        let response = self.send(self.request(Method::POST, url)?.json(&body)).await?;
        let token: TokenResponse = Self::decode(response).await?;

        info!("Admin signed in");
        Ok(Session {
            access_token: SecretString::from(token.access_token),
            email: token.user.and_then(|u| u.email),
            expires_in: token.expires_in,
        })
    }

    /// Upload (or overwrite) an object in a storage bucket
    #[instrument(level = "info", skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), TravelError> {
        let url = self.endpoint(&format!("storage/v1/object/{bucket}/{path}"))?;
        let request = self
            .request(Method::POST, url)?
            .header("x-upsert", "true")
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        self.send(request).await?;
        Ok(())
    }

    /// Public URL of an object in a public bucket
    pub fn public_object_url(&self, bucket: &str, path: &str) -> Result<Url, TravelError> {
        self.endpoint(&format!("storage/v1/object/public/{bucket}/{path}"))
    }

    /// Public URL of a banner image
    pub fn banner_image_url(&self, path: &str) -> Result<Url, TravelError> {
        self.public_object_url(&self.tables.banner_bucket, path)
    }

    /// Rows for a resolved flight search, in listing order
    #[instrument(level = "info", skip(self, search), fields(route = %search.route, trip = %search.trip))]
    pub async fn fetch_flight_offers(&self, search: &FlightSearch) -> Result<Vec<FlightOffer>, TravelError> {
        let mut offers: Vec<FlightOffer> = self.select(&search.to_query(&self.tables.flights_table)).await?;
        offers.sort_by(crate::presenter::compare_flight_offers);
        Ok(offers)
    }

    #[instrument(level = "info", skip(self, query))]
    pub async fn fetch_packages(&self, query: &PackageQuery) -> Result<Vec<PackageOffer>, TravelError> {
        let mut packages: Vec<PackageOffer> = self.select(&query.to_query(&self.tables.packages_table)).await?;
        packages.sort_by(crate::presenter::compare_packages);
        Ok(packages)
    }

    /// Active PROMO flights and packages
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_promos(&self) -> Result<(Vec<FlightOffer>, Vec<PackageOffer>), TravelError> {
        let flights_query = promo_query(&self.tables.flights_table);
        let packages_query = promo_query(&self.tables.packages_table);
        let (mut flights, mut packages) = tokio::try_join!(
            self.select::<FlightOffer>(&flights_query),
            self.select::<PackageOffer>(&packages_query),
        )?;
        flights.sort_by(crate::presenter::compare_flight_offers);
        packages.sort_by(crate::presenter::compare_packages);
        info!(flights = flights.len(), packages = packages.len(), "Promos fetched");
        Ok((flights, packages))
    }
}
