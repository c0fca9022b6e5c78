//! CLI interface for aviel-travel

use aviel_travel::admin::{Admin, BannerImage};
use aviel_travel::i18n::locale_redirect;
use aviel_travel::leads::{parse_local_datetime, submission_message, submit_lead, CarQuoteForm, HotelQuoteForm};
use aviel_travel::models::{BannerTarget, NewBanner, NewFlightOffer, NewPackageOffer, Notes};
use aviel_travel::presenter::{present_flight, present_package};
use aviel_travel::{
    search_flight_offers, search_packages, BackendClient, Banner, Category, Config, ContactConfig, Locale,
    PackageQuery, RouteKey, RowId, SearchOutcome, SearchParams, TravelError, TripType,
};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aviel-travel")]
#[command(about = "Offer search, quotes and admin tooling for Aviel Travel")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ./aviel.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Page language (fr, en, he)
    #[arg(long, global = true, default_value = "fr")]
    pub lang: Locale,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search flight offers
    Search {
        /// Route preset used for missing cities (tlv, paris, eilat)
        #[arg(long, default_value = "tlv")]
        slug: String,
        /// Page query string, e.g. "from=Paris&to=TLV&trip=OW&depart=2026-03-31"
        #[arg(short, long)]
        query: Option<String>,
        /// Origin city or code
        #[arg(short, long)]
        from: Option<String>,
        /// Destination city or code
        #[arg(short, long)]
        to: Option<String>,
        /// Trip type (RT, OW); round trip unless the query says otherwise
        #[arg(long)]
        trip: Option<String>,
        /// Swap origin and destination
        #[arg(long)]
        swap: bool,
        /// Departure date (YYYY-MM-DD)
        #[arg(short, long)]
        depart: Option<String>,
        /// Return date for round trips (YYYY-MM-DD)
        #[arg(short, long = "return")]
        return_date: Option<String>,
        /// Category filter (PROMO, PESSAH, ..., ALL)
        #[arg(long)]
        category: Option<String>,
        /// Fill missing dates with today + 14 / + 21 days
        #[arg(long)]
        default_dates: bool,
        /// Output file for JSON results
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List package offers
    Packages {
        /// Category filter (ALL for every category)
        #[arg(long, default_value = "ALL")]
        cat: String,
        /// Departure date (YYYY-MM-DD)
        #[arg(long)]
        depart: Option<NaiveDate>,
        #[arg(long)]
        nights: Option<u32>,
    },
    /// List active promotions
    Promo,
    /// Send a quote request
    Quote {
        #[command(subcommand)]
        kind: QuoteCommand,
    },
    /// Print the contact links
    Links {
        /// WhatsApp message (defaults to the site greeting)
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Show where a request path is redirected for its locale
    Redirect { path: String },
    /// Manage offers, banners and leads
    Admin {
        #[arg(long, env = "AVIEL_ADMIN_EMAIL")]
        email: String,
        #[arg(long, env = "AVIEL_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        #[command(subcommand)]
        action: AdminCommand,
    },
}

#[derive(Subcommand)]
pub enum QuoteCommand {
    /// Hotel quote
    Hotel {
        #[arg(long)]
        destination: String,
        #[arg(long)]
        checkin: Option<NaiveDate>,
        #[arg(long)]
        checkout: Option<NaiveDate>,
        #[arg(long, default_value = "2")]
        adults: u32,
        #[arg(long, default_value = "0")]
        children: u32,
        #[arg(long)]
        budget: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Car rental quote
    Car {
        #[arg(long)]
        country: String,
        #[arg(long)]
        city: String,
        /// Pickup time (YYYY-MM-DDTHH:MM)
        #[arg(long)]
        pickup: Option<String>,
        /// Dropoff time (YYYY-MM-DDTHH:MM)
        #[arg(long)]
        dropoff: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Collection {
    Flights,
    Packages,
    Banners,
    Leads,
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// List the latest rows of a collection
    List { collection: Collection },
    /// Add a flight offer
    AddFlight {
        #[arg(long, default_value = "PARIS_TLV")]
        route: String,
        #[arg(long, default_value = "RT")]
        trip: TripType,
        #[arg(long, default_value = "GENERAL")]
        category: Category,
        #[arg(long)]
        depart: Option<NaiveDate>,
        #[arg(long = "return")]
        return_date: Option<NaiveDate>,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "0")]
        priority: i32,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        airline: Option<String>,
        #[arg(long)]
        cabin_bag: Option<String>,
        #[arg(long)]
        checked_bag: Option<String>,
        #[arg(long)]
        depart_time: Option<String>,
        #[arg(long)]
        arrive_time: Option<String>,
        #[arg(long)]
        return_depart_time: Option<String>,
        #[arg(long)]
        return_arrive_time: Option<String>,
        /// Store the offer as inactive
        #[arg(long)]
        inactive: bool,
    },
    /// Add a package offer
    AddPackage {
        #[arg(long)]
        hotel: String,
        #[arg(long, default_value = "4")]
        nights: u32,
        #[arg(long, default_value = "BB")]
        board: String,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "GENERAL")]
        category: Category,
        #[arg(long)]
        depart: Option<NaiveDate>,
        #[arg(long, default_value = "0")]
        priority: i32,
        #[arg(long)]
        notes_fr: Option<String>,
        #[arg(long)]
        notes_en: Option<String>,
        #[arg(long)]
        notes_he: Option<String>,
    },
    /// Upload an image and add a home banner for it
    AddBanner {
        image: PathBuf,
        #[arg(long, default_value = "")]
        title_fr: String,
        #[arg(long, default_value = "")]
        title_en: String,
        #[arg(long, default_value = "")]
        title_he: String,
        #[arg(long, default_value = "PAGE")]
        target_type: BannerTarget,
        #[arg(long, default_value = "/fr/promo")]
        target_value: String,
        #[arg(long, default_value = "0")]
        sort_order: i32,
    },
    /// Delete a row by id
    Delete { collection: Collection, id: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_outcome(outcome: &SearchOutcome) {
    match outcome {
        SearchOutcome::NotSearched => {}
        SearchOutcome::Offers { offers } => {
            for offer in offers {
                println!("{}  [{}]  {}", offer.title, offer.airline, offer.price);
                println!(
                    "  {}  {} → {}",
                    offer.outbound.date, offer.outbound.departure, offer.outbound.arrival
                );
                if let Some(inbound) = &offer.inbound {
                    println!("  {}  {} → {}", inbound.date, inbound.departure, inbound.arrival);
                }
                println!("  bags: {} / {}", offer.cabin_bag, offer.checked_bag);
                if let Some(notes) = &offer.notes {
                    println!("  {notes}");
                }
            }
        }
        SearchOutcome::Empty { message } => println!("{message}"),
        SearchOutcome::Failed { message } => eprintln!("{message}"),
    }
}

fn print_banners(
    client: &BackendClient,
    banners: &[Banner],
    locale: Locale,
    contact: &ContactConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    for banner in banners {
        let state = if banner.active { "active" } else { "hidden" };
        println!(
            "#{} [{}] {}  {}",
            banner.id,
            state,
            banner.sort_order,
            banner.title(locale).unwrap_or("-")
        );
        if let Some(subtitle) = banner.subtitle(locale) {
            println!("  {subtitle}");
        }
        println!("  {} -> {}", banner.cta(locale).unwrap_or("-"), banner.href(locale, contact));
        if let Some(path) = &banner.image_path_desktop {
            println!("  {}", client.banner_image_url(path)?);
        }
    }
    Ok(())
}

async fn run_admin(
    client: BackendClient,
    email: &str,
    password: String,
    action: AdminCommand,
    locale: Locale,
    json: bool,
    contact: &ContactConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = client.sign_in(email, &SecretString::from(password)).await?;
    let client = client.with_session(session);
    let admin = Admin::new(&client)?;

    match action {
        AdminCommand::List { collection } => match collection {
            Collection::Flights => print_json(&admin.list_flights().await?)?,
            Collection::Packages => print_json(&admin.list_packages().await?)?,
            Collection::Banners => {
                let banners = admin.list_banners().await?;
                if json {
                    print_json(&banners)?;
                } else {
                    print_banners(&client, &banners, locale, contact)?;
                }
            }
            Collection::Leads => print_json(&admin.list_leads().await?)?,
        },
        AdminCommand::AddFlight {
            route,
            trip,
            category,
            depart,
            return_date,
            price,
            priority,
            title,
            airline,
            cabin_bag,
            checked_bag,
            depart_time,
            arrive_time,
            return_depart_time,
            return_arrive_time,
            inactive,
        } => {
            let route = RouteKey::parse(&route).ok_or(TravelError::InvalidValue {
                field: "route",
                value: route,
            })?;
            let offer = NewFlightOffer {
                route: route.to_string(),
                trip,
                category,
                depart_date: depart,
                return_date: if trip.is_round_trip() { return_date } else { None },
                price_eur: price,
                priority,
                active: !inactive,
                title,
                airline,
                cabin_bag,
                checked_bag,
                depart_time,
                arrive_time,
                return_depart_time,
                return_arrive_time,
                ..NewFlightOffer::default()
            };
            print_json(&admin.add_flight(&offer).await?)?;
        }
        AdminCommand::AddPackage {
            hotel,
            nights,
            board,
            price,
            category,
            depart,
            priority,
            notes_fr,
            notes_en,
            notes_he,
        } => {
            let package = NewPackageOffer {
                depart_date: depart,
                nights,
                hotel_name: hotel,
                board,
                price_eur: price,
                category,
                priority,
                notes: Notes {
                    notes_fr,
                    notes_en,
                    notes_he,
                },
                ..NewPackageOffer::default()
            };
            print_json(&admin.add_package(&package).await?)?;
        }
        AdminCommand::AddBanner {
            image,
            title_fr,
            title_en,
            title_he,
            target_type,
            target_value,
            sort_order,
        } => {
            let file_name = image
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            let bytes = fs::read(&image)?;
            let banner = NewBanner {
                title_fr,
                title_en,
                title_he,
                target_type,
                target_value,
                sort_order,
                ..NewBanner::default()
            };
            let row = admin.add_banner(banner, BannerImage { file_name, bytes }).await?;
            if let Some(path) = &row.image_path_desktop {
                println!("Image: {}", client.banner_image_url(path)?);
            }
            print_json(&row)?;
        }
        AdminCommand::Delete { collection, id } => {
            let id = RowId::from(id.as_str());
            match collection {
                Collection::Flights => admin.delete_flight(&id).await?,
                Collection::Packages => admin.delete_package(&id).await?,
                Collection::Banners => admin.delete_banner(&id).await?,
                Collection::Leads => return Err("leads are write-once and cannot be deleted".into()),
            }
            println!("Deleted {id}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let locale = cli.lang;
    let config = Config::load(cli.config.as_deref())?;

    // Commands that never reach the backend
    match &cli.command {
        Commands::Links { message } => {
            let contact = &config.contact;
            let message = message.clone().unwrap_or_else(|| contact.greeting());
            println!("WhatsApp: {}", contact.whatsapp_link(&message));
            println!("Phone:    {}", contact.phone_link());
            println!("Israel:   {}", aviel_travel::contact::mailto_link(&contact.email_israel, "", ""));
            println!("World:    {}", aviel_travel::contact::mailto_link(&contact.email_world, "", ""));
            return Ok(());
        }
        Commands::Redirect { path } => {
            let served = match locale_redirect(path) {
                Some(target) => {
                    println!("{path} -> {target}");
                    target
                }
                None => {
                    println!("{path} (served as is)");
                    path.clone()
                }
            };
            let page_locale = Locale::from_segment(served.split('/').nth(1).unwrap_or_default());
            println!("lang={} dir={}", page_locale, if page_locale.is_rtl() { "rtl" } else { "ltr" });
            return Ok(());
        }
        _ => {}
    }

    config.backend.validate()?;
    let client = BackendClient::new(&config.backend)?;

    match cli.command {
        Commands::Search {
            slug,
            query,
            from,
            to,
            trip,
            swap,
            depart,
            return_date,
            category,
            default_dates,
            output,
        } => {
            let mut params = match query.as_deref() {
                Some(query) => SearchParams::from_query(&slug, query)?,
                None => SearchParams::for_slug(&slug),
            };
            if let Some(from) = from {
                params.from = from;
            }
            if let Some(to) = to {
                params.to = to;
            }
            if let Some(trip) = trip {
                params.trip = trip;
            }
            if depart.is_some() {
                params.depart = depart;
            }
            if return_date.is_some() {
                params.return_date = return_date;
            }
            if let Some(category) = category.as_deref() {
                params.category = Category::parse_filter(category)?;
            }
            if swap {
                params.swap();
            }
            // A page opened without search input shows the default dates
            let bare_query = query.as_deref().is_some_and(|q| !SearchParams::has_search_input(q));
            if default_dates || bare_query {
                params = params.with_default_dates(Local::now().date_naive());
            }

            let outcome = search_flight_offers(&client, &params, locale).await;

            if let Some(output_file) = output {
                fs::write(&output_file, serde_json::to_string_pretty(&outcome)?)?;
                println!("Results saved to {output_file}");
            } else if cli.json {
                print_json(&outcome)?;
            } else {
                print_outcome(&outcome);
                println!("\n{}", params.page_path(locale, &slug));
            }

            if matches!(outcome, SearchOutcome::Failed { .. }) {
                std::process::exit(1);
            }
        }
        Commands::Packages { cat, depart, nights } => {
            let query = PackageQuery {
                category: Category::parse_filter(&cat)?,
                depart_date: depart,
                nights,
            };
            if cli.json {
                print_json(&search_packages(&client, &query, locale).await?)?;
                return Ok(());
            }

            let packages = client.fetch_packages(&query).await?;
            println!("{}", locale.messages().packages_found(packages.len()));
            for package in &packages {
                let view = present_package(package, locale);
                let inquiry = config.contact.package_inquiry(package);
                println!("{}  {}  {}", view.hotel, view.summary, view.price);
                if let Some(notes) = &view.notes {
                    println!("  {notes}");
                }
                println!("  {}", inquiry.whatsapp);
                println!("  {}", inquiry.mailto);
            }
        }
        Commands::Promo => {
            let (flights, packages) = client.fetch_promos().await?;
            let flight_views: Vec<_> = flights.iter().map(|f| present_flight(f, None, locale)).collect();
            if cli.json {
                let packages: Vec<_> = packages.iter().map(|p| present_package(p, locale)).collect();
                print_json(&serde_json::json!({ "flights": flight_views, "packages": packages }))?;
                return Ok(());
            }

            for (offer, view) in flights.iter().zip(&flight_views) {
                println!("{}  {}", view.title, view.price);
                println!("  {}", config.contact.whatsapp_link(&config.contact.promo_flight_message(offer)));
            }
            for package in &packages {
                let view = present_package(package, locale);
                println!("{}  {}  {}", view.hotel, view.summary, view.price);
                println!("  {}", config.contact.package_inquiry(package).whatsapp);
            }
        }
        Commands::Quote { kind } => {
            let result = match kind {
                QuoteCommand::Hotel {
                    destination,
                    checkin,
                    checkout,
                    adults,
                    children,
                    budget,
                    notes,
                } => {
                    let form = HotelQuoteForm {
                        checkin,
                        checkout,
                        adults,
                        children,
                        budget,
                        notes,
                        ..HotelQuoteForm::new(destination)
                    };
                    submit_lead(&client, &form, locale).await
                }
                QuoteCommand::Car {
                    country,
                    city,
                    pickup,
                    dropoff,
                    category,
                    notes,
                } => {
                    let form = CarQuoteForm {
                        pickup: pickup.as_deref().map(parse_local_datetime).transpose()?,
                        dropoff: dropoff.as_deref().map(parse_local_datetime).transpose()?,
                        category,
                        notes,
                        ..CarQuoteForm::new(country, city)
                    };
                    submit_lead(&client, &form, locale).await
                }
            };

            println!("{}", submission_message(&result, locale));
            if let Err(e) = result {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Commands::Admin { email, password, action } => {
            run_admin(client, &email, password, action, locale, cli.json, &config.contact).await?;
        }
        Commands::Links { .. } | Commands::Redirect { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "aviel-travel",
            "search",
            "--from",
            "paris",
            "--to",
            "Tel Aviv",
            "--depart",
            "2026-03-31",
            "--return",
            "2026-04-12",
        ]);

        assert!(cli.is_ok());

        if let Ok(Cli {
            command: Commands::Search { from, to, trip, return_date, .. },
            lang,
            ..
        }) = cli
        {
            assert_eq!(from.as_deref(), Some("paris"));
            assert_eq!(to.as_deref(), Some("Tel Aviv"));
            assert_eq!(trip, None);
            assert_eq!(return_date.as_deref(), Some("2026-04-12"));
            assert_eq!(lang, Locale::Fr);
        }
    }

    #[test]
    fn test_admin_add_flight_parsing() {
        let cli = Cli::try_parse_from([
            "aviel-travel",
            "--lang",
            "he",
            "admin",
            "--email",
            "admin@example.com",
            "--password",
            "secret",
            "add-flight",
            "--trip",
            "OW",
            "--price",
            "129",
        ])
        .unwrap();

        assert_eq!(cli.lang, Locale::He);
        match cli.command {
            Commands::Admin {
                action: AdminCommand::AddFlight { route, trip, category, price, .. },
                ..
            } => {
                assert_eq!(route, "PARIS_TLV");
                assert_eq!(trip, TripType::OneWay);
                assert_eq!(category, Category::General);
                assert_eq!(price, 129.0);
            }
            _ => panic!("expected admin add-flight"),
        }
    }

    #[test]
    fn test_search_query_and_swap_parsing() {
        let cli = Cli::try_parse_from([
            "aviel-travel",
            "search",
            "--slug",
            "eilat",
            "--query",
            "trip=OW&depart=2026-05-01&cat=SUMMER",
            "--swap",
        ])
        .unwrap();

        match cli.command {
            Commands::Search { slug, query, swap, trip, .. } => {
                assert!(swap);
                assert_eq!(trip, None);
                let mut params = SearchParams::from_query(&slug, query.as_deref().unwrap()).unwrap();
                params.swap();
                assert_eq!(params.from, "Eilat");
                assert_eq!(params.to, "Paris");
                assert_eq!(params.category, Some(Category::Summer));
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_invalid_locale_is_rejected() {
        assert!(Cli::try_parse_from(["aviel-travel", "--lang", "de", "promo"]).is_err());
    }
}
