// src/mcp_server.rs

use anyhow::Result;
use aviel_travel::{
    search_flight_offers as search_flight_offers_internal, BackendClient, Category, Config, ContactConfig, Locale,
    PackageQuery, SearchParams,
};
use chrono::NaiveDate;
use rmcp::{
    model::{ServerCapabilities, ServerInfo},
    schemars, tool,
    transport::stdio,
    ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Offer search MCP server
#[derive(Clone)]
pub struct TravelServer {
    client: Arc<BackendClient>,
    contact: ContactConfig,
}

impl TravelServer {
    pub fn new(client: BackendClient, contact: ContactConfig) -> Self {
        Self {
            client: Arc::new(client),
            contact,
        }
    }

    /// Initialize logging to file; stdout carries the protocol
    fn init_logging() -> Result<()> {
        let log_dir = PathBuf::from("logs");
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = tracing_appender::rolling::daily(&log_dir, "aviel-travel-mcp.log");

        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("info").add_directive("aviel_travel=debug".parse()?),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .init();

        info!("Logging initialized - logs will be written to logs/aviel-travel-mcp.log.*");
        Ok(())
    }
}

fn locale_or_default(lang: Option<&str>) -> Locale {
    lang.map(Locale::from_segment).unwrap_or_default()
}

fn error_json(message: impl std::fmt::Display) -> String {
    serde_json::json!({ "error": message.to_string() }).to_string()
}

/// Flight search parameters
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct FlightSearchToolParams {
    #[schemars(description = "Origin city or code: Paris, Tel Aviv (TLV) or Eilat (ETM)")]
    pub from: String,
    #[schemars(description = "Destination city or code: Paris, Tel Aviv (TLV) or Eilat (ETM)")]
    pub to: String,
    #[schemars(description = "Trip type: RT (round trip, default) or OW (one way)")]
    pub trip: Option<String>,
    #[schemars(description = "Departure date in YYYY-MM-DD format")]
    pub depart: Option<String>,
    #[schemars(description = "Return date in YYYY-MM-DD format, required for round trips")]
    pub return_date: Option<String>,
    #[schemars(description = "Category filter: PROMO, PESSAH, SUKKOT, SUMMER, WINTER, GENERAL or ALL")]
    pub category: Option<String>,
    #[schemars(description = "Language of messages: fr (default), en or he")]
    pub lang: Option<String>,
}

/// Package search parameters
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct PackageSearchParams {
    #[schemars(description = "Category filter: PROMO, PESSAH, SUKKOT, SUMMER, WINTER, GENERAL or ALL")]
    pub category: Option<String>,
    #[schemars(description = "Departure date in YYYY-MM-DD format")]
    pub depart: Option<String>,
    #[schemars(description = "Number of nights")]
    pub nights: Option<u32>,
    #[schemars(description = "Language of notes: fr (default), en or he")]
    pub lang: Option<String>,
}

/// Contact link parameters
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct ContactLinkParams {
    #[schemars(description = "Prefilled WhatsApp message; defaults to a greeting")]
    pub message: Option<String>,
    #[schemars(description = "Mail subject for the mailto links")]
    pub subject: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PackageResult {
    #[serde(flatten)]
    pub view: aviel_travel::PackageView,
    pub whatsapp: String,
    pub mailto: String,
}

#[tool(tool_box)]
impl TravelServer {
    #[tool(description = "Search flight offers between Paris and Tel Aviv or Eilat for given dates. Returns offers sorted by priority then price, or a message when nothing matches.")]
    async fn search_flight_offers(&self, #[tool(aggr)] params: FlightSearchToolParams) -> String {
        info!(
            from = params.from,
            to = params.to,
            trip = params.trip.as_deref().unwrap_or("RT"),
            depart = params.depart.as_deref(),
            return_date = params.return_date.as_deref(),
            "Flight offer search request received"
        );

        let category = match params.category.as_deref().map(Category::parse_filter).transpose() {
            Ok(category) => category.flatten(),
            Err(e) => {
                warn!(error = %e, "Invalid category");
                return error_json(e);
            }
        };

        let search = SearchParams {
            from: params.from,
            to: params.to,
            trip: params.trip.unwrap_or_default(),
            depart: params.depart,
            return_date: params.return_date,
            category,
        };
        let outcome = search_flight_offers_internal(&self.client, &search, locale_or_default(params.lang.as_deref())).await;
        debug!(offers = outcome.offers().len(), "Flight offer search finished");

        serde_json::to_string_pretty(&outcome).unwrap_or_else(|e| error_json(e))
    }

    #[tool(description = "List flight+hotel package offers, optionally filtered by category, departure date and nights. Each result carries WhatsApp and mail links to confirm it.")]
    async fn search_packages(&self, #[tool(aggr)] params: PackageSearchParams) -> String {
        info!(
            category = params.category.as_deref(),
            depart = params.depart.as_deref(),
            nights = params.nights,
            "Package search request received"
        );

        let category = match params.category.as_deref().map(Category::parse_filter).transpose() {
            Ok(category) => category.flatten(),
            Err(e) => return error_json(e),
        };
        let depart_date = match params.depart.as_deref().map(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")).transpose() {
            Ok(date) => date,
            Err(_) => return error_json(format!("Invalid date format: {}", params.depart.unwrap_or_default())),
        };
        let query = PackageQuery {
            category,
            depart_date,
            nights: params.nights,
        };
        let locale = locale_or_default(params.lang.as_deref());

        match self.client.fetch_packages(&query).await {
            Ok(packages) => {
                info!(packages_found = packages.len(), "Package search completed successfully");
                let results: Vec<PackageResult> = packages
                    .iter()
                    .map(|p| {
                        let inquiry = self.contact.package_inquiry(p);
                        PackageResult {
                            view: aviel_travel::presenter::present_package(p, locale),
                            whatsapp: inquiry.whatsapp,
                            mailto: inquiry.mailto,
                        }
                    })
                    .collect();
                serde_json::to_string_pretty(&results).unwrap_or_else(|e| error_json(e))
            }
            Err(e) => {
                error!("Package search failed: {}", e);
                error_json(locale.messages().backend_error(&aviel_travel::presenter::backend_message(&e)))
            }
        }
    }

    #[tool(description = "Build the agency contact links: WhatsApp deep link with a prefilled message, phone link and mail links.")]
    async fn contact_link(&self, #[tool(aggr)] params: ContactLinkParams) -> String {
        let message = params.message.unwrap_or_else(|| self.contact.greeting());
        let subject = params.subject.unwrap_or_default();
        info!(message_length = message.len(), "Contact link request received");

        serde_json::json!({
            "whatsapp": self.contact.whatsapp_link(&message),
            "phone": self.contact.phone_link(),
            "mailto_israel": aviel_travel::contact::mailto_link(&self.contact.email_israel, &subject, &message),
            "mailto_world": aviel_travel::contact::mailto_link(&self.contact.email_world, &subject, &message),
        })
        .to_string()
    }
}

#[tool(tool_box)]
impl ServerHandler for TravelServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Aviel Travel offer server. Searches flight offers (Paris ⇄ Tel Aviv, Paris ⇄ Eilat) and Eilat packages, and builds WhatsApp / mail contact links. Returns JSON.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = TravelServer::init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!("Starting Aviel Travel MCP server");

    let config_path = std::env::var_os("AVIEL_CONFIG").map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    config.backend.validate()?;
    let client = BackendClient::new(&config.backend)?;

    let server = TravelServer::new(client, config.contact);
    let transport = stdio();

    let service = server.serve(transport).await?;
    info!("MCP service started, waiting for requests");

    service.waiting().await?;

    info!("MCP service shutting down");
    Ok(())
}
