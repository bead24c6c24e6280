mod config;

use anyhow::{Context as AnyhowContext, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use config::Config;
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wardrobe_client::models::{
    EventPatch, ItemBookingPatch, ItemPatch, NewEvent, NewItem, NewItemBooking, NewUser,
};
use wardrobe_client::{
    page_count, ApiClient, ApiError, BookingsService, ErrorKey, EventsService, FileTokenStore,
    ItemsService, ListQuery, LoginOutcome, Session,
};

#[derive(Parser)]
#[command(name = "wardrobe")]
#[command(version, about = "Wardrobe inventory administration CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Wardrobe API server URL (overrides the current context)
    #[arg(long)]
    server_url: Option<String>,

    /// Emit raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session tokens
    Login {
        username: String,

        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Log out and discard the stored tokens
    Logout,
    /// Show the currently logged-in user
    Whoami,
    /// Create a new account
    Register {
        username: String,

        #[arg(short, long)]
        email: String,

        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,
    },
    /// Context management
    Context {
        #[command(subcommand)]
        command: ContextCommand,
    },
    /// Inventory items
    Items {
        #[command(subcommand)]
        command: ItemsCommand,
    },
    /// Events
    Events {
        #[command(subcommand)]
        command: EventsCommand,
    },
    /// Item bookings
    Bookings {
        #[command(subcommand)]
        command: BookingsCommand,
    },
}

#[derive(Subcommand)]
enum ContextCommand {
    /// Add a named server context
    Add {
        name: String,
        server_url: String,

        /// Also switch to the new context
        #[arg(long)]
        use_context: bool,
    },
    /// List contexts
    List,
    /// Switch to a context
    Use { name: String },
    /// Delete a context
    Delete { name: String },
}

#[derive(Subcommand)]
enum ItemsCommand {
    /// List items (paginated, filterable)
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Category code filter (see 'wardrobe items categories')
        #[arg(short, long)]
        category: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        location: Option<String>,
    },
    /// Show one item
    Get { id: i64 },
    /// Create an item
    Create {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value_t = 1)]
        quantity: u32,

        #[arg(long, default_value = "")]
        category: String,

        #[arg(long, default_value = "")]
        color: String,

        #[arg(long, default_value = "")]
        location: String,
    },
    /// Update an item (only the given fields change)
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        quantity: Option<u32>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        checked_out: Option<bool>,

        #[arg(long)]
        in_repair: Option<bool>,
    },
    /// Delete an item
    Delete { id: i64 },
    /// List the server's category choices
    Categories,
}

#[derive(Subcommand)]
enum EventsCommand {
    /// List events (paginated, filterable)
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        location: Option<String>,

        /// Events starting on or after this date (YYYY-MM-DD, UTC)
        #[arg(long)]
        after: Option<String>,

        /// Events starting on or before this date (YYYY-MM-DD, UTC)
        #[arg(long)]
        before: Option<String>,
    },
    /// Show one event
    Get { id: i64 },
    /// Create an event
    Create {
        #[arg(long)]
        name: String,

        /// Start (RFC 3339, or "YYYY-MM-DD HH:MM" in UTC)
        #[arg(long)]
        start: String,

        /// End (RFC 3339, or "YYYY-MM-DD HH:MM" in UTC)
        #[arg(long)]
        end: String,

        #[arg(long, default_value = "")]
        location: String,

        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Update an event (only the given fields change)
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an event
    Delete { id: i64 },
    /// List current and future events
    Upcoming,
}

#[derive(Subcommand)]
enum BookingsCommand {
    /// List bookings for an item or an event
    List {
        #[arg(long, conflicts_with = "event")]
        item: Option<i64>,

        #[arg(long)]
        event: Option<i64>,
    },
    /// Show one booking
    Get { id: i64 },
    /// Book an item for an event
    Create {
        #[arg(long)]
        item: i64,

        #[arg(long)]
        event: i64,

        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change a booking's quantity
    Update {
        id: i64,

        #[arg(long)]
        quantity: u32,
    },
    /// Delete a booking
    Delete { id: i64 },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,wardrobe_client=info,wardrobectl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    let base_url = config.resolve_server_url(cli.server_url);

    if let Commands::Context { command } = &cli.command {
        return handle_context(&mut config, command);
    }

    let tokens = Arc::new(FileTokenStore::new().context("Could not locate credential store")?);
    let api = Arc::new(ApiClient::new(&base_url, tokens).context("Could not build HTTP client")?);

    match cli.command {
        Commands::Login { username, password } => {
            let password = resolve_password(password, "Password: ")?;
            let mut session = Session::new(api);
            match session.login(&username, &password).await {
                LoginOutcome::LoggedIn => {
                    println!("Logged in as {}.", username);
                }
                LoginOutcome::Denied(message) => {
                    anyhow::bail!(message);
                }
            }
        }
        Commands::Logout => {
            let mut session = Session::new(api);
            session.logout().await;
            println!("Logged out.");
        }
        Commands::Whoami => {
            let mut session = Session::new(api);
            session.init().await;
            match session.user() {
                Some(user) if cli.json => {
                    println!("{}", serde_json::to_string_pretty(user)?);
                }
                Some(user) => {
                    println!("{:<12} {}", "Username:", user.username);
                    println!("{:<12} {}", "Email:", user.email);
                    if !user.first_name.is_empty() || !user.last_name.is_empty() {
                        println!("{:<12} {} {}", "Name:", user.first_name, user.last_name);
                    }
                    if !user.groups.is_empty() {
                        println!("{:<12} {}", "Groups:", user.groups.join(", "));
                    }
                }
                None => {
                    println!("Not logged in.");
                }
            }
        }
        Commands::Register {
            username,
            email,
            password,
            first_name,
            last_name,
        } => {
            let password = resolve_password(password, "Password: ")?;
            let session = Session::new(api);
            let new_user = NewUser {
                username,
                password,
                email,
                first_name,
                last_name,
            };
            let response = session
                .register(&new_user)
                .await
                .map_err(|err| report(err, ErrorKey::Generic))?;
            println!("{}", response.detail);
        }
        Commands::Context { .. } => unreachable!("handled before client construction"),
        Commands::Items { command } => handle_items(api, command, cli.json).await?,
        Commands::Events { command } => handle_events(api, command, cli.json).await?,
        Commands::Bookings { command } => handle_bookings(api, command, cli.json).await?,
    }

    Ok(())
}

fn handle_context(config: &mut Config, command: &ContextCommand) -> Result<()> {
    match command {
        ContextCommand::Add {
            name,
            server_url,
            use_context,
        } => {
            config.add_context(name, server_url.clone(), *use_context);
            config.save()?;
            println!("Context '{}' added.", name);
        }
        ContextCommand::List => {
            println!("  {:<15} {:<40}", "NAME", "SERVER URL");
            for (name, ctx) in &config.contexts {
                let current_mark = if config.is_current(name) { "*" } else { " " };
                println!("{} {:<15} {:<40}", current_mark, name, ctx.server_url);
            }
        }
        ContextCommand::Use { name } => {
            if !config.use_context(name) {
                anyhow::bail!("Context '{}' not found.", name);
            }
            config.save()?;
            println!("Switched to context '{}'.", name);
        }
        ContextCommand::Delete { name } => {
            if !config.delete_context(name) {
                anyhow::bail!("Context '{}' not found.", name);
            }
            config.save()?;
            println!("Context '{}' deleted.", name);
        }
    }
    Ok(())
}

async fn handle_items(api: Arc<ApiClient>, command: ItemsCommand, json: bool) -> Result<()> {
    let items = ItemsService::new(api);
    match command {
        ItemsCommand::List {
            page,
            search,
            category,
            color,
            location,
        } => {
            let query = build_query(
                page,
                search,
                &[
                    ("category", category),
                    ("color", color),
                    ("location", location),
                ],
            );
            let result = items
                .list(&query)
                .await
                .map_err(|err| report(err, ErrorKey::LoadItemsFailed))?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "count": result.count,
                        "results": result.results,
                    }))?
                );
                return Ok(());
            }
            if result.results.is_empty() {
                println!("No items found.");
                return Ok(());
            }
            println!(
                "{:<6} {:<30} {:<10} {:<8} {:<15}",
                "ID", "NAME", "CATEGORY", "QTY", "LOCATION"
            );
            for item in &result.results {
                println!(
                    "{:<6} {:<30} {:<10} {:<8} {:<15}",
                    item.id, item.name, item.category, item.quantity, item.location
                );
            }
            println!(
                "\nPage {} of {} ({} items)",
                query.page(),
                page_count(result.count),
                result.count
            );
        }
        ItemsCommand::Get { id } => {
            let item = items
                .get(id)
                .await
                .map_err(|err| report(err, ErrorKey::LoadItemFailed))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&item)?);
                return Ok(());
            }
            println!("{:<14} {}", "ID:", item.id);
            println!("{:<14} {}", "Name:", item.name);
            println!("{:<14} {}", "Description:", item.description);
            println!("{:<14} {}", "Quantity:", item.quantity);
            println!(
                "{:<14} {}",
                "Category:",
                item.category_long.as_deref().unwrap_or(&item.category)
            );
            println!("{:<14} {}", "Color:", item.color);
            println!("{:<14} {}", "Location:", item.location);
            println!("{:<14} {}", "Checked out:", item.checked_out);
            println!("{:<14} {}", "In repair:", item.in_repair);
        }
        ItemsCommand::Create {
            name,
            description,
            quantity,
            category,
            color,
            location,
        } => {
            let item = items
                .create(&NewItem {
                    name,
                    description,
                    quantity,
                    category,
                    color,
                    location,
                    checked_out: false,
                    in_repair: false,
                })
                .await
                .map_err(|err| report(err, ErrorKey::CreateItemFailed))?;
            println!("Item {} created: {}", item.id, item.name);
        }
        ItemsCommand::Update {
            id,
            name,
            description,
            quantity,
            category,
            color,
            location,
            checked_out,
            in_repair,
        } => {
            let item = items
                .update(
                    id,
                    &ItemPatch {
                        name,
                        description,
                        quantity,
                        category,
                        color,
                        location,
                        checked_out,
                        in_repair,
                    },
                )
                .await
                .map_err(|err| report(err, ErrorKey::UpdateItemFailed))?;
            println!("Item {} updated: {}", item.id, item.name);
        }
        ItemsCommand::Delete { id } => {
            items
                .delete(id)
                .await
                .map_err(|err| report(err, ErrorKey::DeleteItemFailed))?;
            println!("Item {} deleted.", id);
        }
        ItemsCommand::Categories => {
            let categories = items
                .categories()
                .await
                .map_err(|err| report(err, ErrorKey::LoadCategoriesFailed))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&categories)?);
                return Ok(());
            }
            println!("{:<8} {:<30}", "CODE", "LABEL");
            for category in &categories {
                println!("{:<8} {:<30}", category.value, category.label);
            }
        }
    }
    Ok(())
}

async fn handle_events(api: Arc<ApiClient>, command: EventsCommand, json: bool) -> Result<()> {
    let events = EventsService::new(api);
    match command {
        EventsCommand::List {
            page,
            search,
            location,
            after,
            before,
        } => {
            let query = build_query(
                page,
                search,
                &[
                    ("location", location),
                    ("start_datetime_after", after),
                    ("start_datetime_before", before),
                ],
            );
            let result = events
                .list(&query)
                .await
                .map_err(|err| report(err, ErrorKey::LoadEventsFailed))?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "count": result.count,
                        "results": result.results,
                    }))?
                );
                return Ok(());
            }
            if result.results.is_empty() {
                println!("No events found.");
                return Ok(());
            }
            print_events_table(&result.results);
            println!(
                "\nPage {} of {} ({} events)",
                query.page(),
                page_count(result.count),
                result.count
            );
        }
        EventsCommand::Get { id } => {
            let event = events
                .get(id)
                .await
                .map_err(|err| report(err, ErrorKey::LoadEventFailed))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&event)?);
                return Ok(());
            }
            println!("{:<10} {}", "ID:", event.id);
            println!("{:<10} {}", "Name:", event.name);
            println!("{:<10} {}", "Start:", event.start_datetime);
            println!("{:<10} {}", "End:", event.end_datetime);
            println!("{:<10} {}", "Location:", event.location);
            println!("{:<10} {}", "Notes:", event.notes);
        }
        EventsCommand::Create {
            name,
            start,
            end,
            location,
            notes,
        } => {
            let event = events
                .create(&NewEvent {
                    name,
                    start_datetime: parse_datetime(&start)?,
                    end_datetime: parse_datetime(&end)?,
                    location,
                    notes,
                })
                .await
                .map_err(|err| report(err, ErrorKey::CreateEventFailed))?;
            println!("Event {} created: {}", event.id, event.name);
        }
        EventsCommand::Update {
            id,
            name,
            start,
            end,
            location,
            notes,
        } => {
            let start_datetime = start.as_deref().map(parse_datetime).transpose()?;
            let end_datetime = end.as_deref().map(parse_datetime).transpose()?;
            let event = events
                .update(
                    id,
                    &EventPatch {
                        name,
                        start_datetime,
                        end_datetime,
                        location,
                        notes,
                    },
                )
                .await
                .map_err(|err| report(err, ErrorKey::UpdateEventFailed))?;
            println!("Event {} updated: {}", event.id, event.name);
        }
        EventsCommand::Delete { id } => {
            events
                .delete(id)
                .await
                .map_err(|err| report(err, ErrorKey::DeleteEventFailed))?;
            println!("Event {} deleted.", id);
        }
        EventsCommand::Upcoming => {
            let upcoming = events
                .current_future()
                .await
                .map_err(|err| report(err, ErrorKey::LoadEventsFailed))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&upcoming)?);
                return Ok(());
            }
            if upcoming.is_empty() {
                println!("No current or future events.");
                return Ok(());
            }
            print_events_table(&upcoming);
        }
    }
    Ok(())
}

async fn handle_bookings(api: Arc<ApiClient>, command: BookingsCommand, json: bool) -> Result<()> {
    let bookings = BookingsService::new(api);
    match command {
        BookingsCommand::List { item, event } => {
            let results = match (item, event) {
                (Some(item_id), None) => bookings.list_by_item(item_id).await,
                (None, Some(event_id)) => bookings.list_by_event(event_id).await,
                _ => anyhow::bail!("Specify exactly one of --item or --event."),
            }
            .map_err(|err| report(err, ErrorKey::LoadBookingsFailed))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
                return Ok(());
            }
            if results.is_empty() {
                println!("No bookings found.");
                return Ok(());
            }
            println!(
                "{:<6} {:<25} {:<25} {:<8} {:<22}",
                "ID", "ITEM", "EVENT", "QTY", "EVENT START"
            );
            for booking in &results {
                let start = booking
                    .event_start_datetime
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_default();
                println!(
                    "{:<6} {:<25} {:<25} {:<8} {:<22}",
                    booking.id, booking.item_name, booking.event_name, booking.quantity, start
                );
            }
        }
        BookingsCommand::Get { id } => {
            let booking = bookings
                .get(id)
                .await
                .map_err(|err| report(err, ErrorKey::LoadBookingFailed))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&booking)?);
                return Ok(());
            }
            println!("{:<10} {}", "ID:", booking.id);
            println!("{:<10} {} (#{})", "Item:", booking.item_name, booking.item);
            println!("{:<10} {} (#{})", "Event:", booking.event_name, booking.event);
            println!("{:<10} {}", "Quantity:", booking.quantity);
        }
        BookingsCommand::Create {
            item,
            event,
            quantity,
        } => {
            validate_quantity(quantity)?;
            let booking = bookings
                .create(&NewItemBooking {
                    item,
                    event,
                    quantity,
                })
                .await
                .map_err(|err| report(err, ErrorKey::CreateBookingFailed))?;
            println!(
                "Booking {} created: {} x{} for {}",
                booking.id, booking.item_name, booking.quantity, booking.event_name
            );
        }
        BookingsCommand::Update { id, quantity } => {
            validate_quantity(quantity)?;
            let booking = bookings
                .update(id, &ItemBookingPatch { quantity })
                .await
                .map_err(|err| report(err, ErrorKey::UpdateBookingFailed))?;
            println!("Booking {} updated: quantity {}", booking.id, booking.quantity);
        }
        BookingsCommand::Delete { id } => {
            bookings
                .delete(id)
                .await
                .map_err(|err| report(err, ErrorKey::DeleteBookingFailed))?;
            println!("Booking {} deleted.", id);
        }
    }
    Ok(())
}

fn print_events_table(events: &[wardrobe_client::models::Event]) {
    println!(
        "{:<6} {:<30} {:<22} {:<22} {:<15}",
        "ID", "NAME", "START", "END", "LOCATION"
    );
    for event in events {
        println!(
            "{:<6} {:<30} {:<22} {:<22} {:<15}",
            event.id,
            event.name,
            event.start_datetime.format("%Y-%m-%d %H:%M"),
            event.end_datetime.format("%Y-%m-%d %H:%M"),
            event.location
        );
    }
}

/// Compose list-query state from CLI flags. Filters land first so the
/// page resets they trigger are overridden by the explicit page choice.
fn build_query(page: u32, search: Option<String>, filters: &[(&str, Option<String>)]) -> ListQuery {
    let mut query = ListQuery::new();
    if let Some(search) = search {
        query.set_search(search);
    }
    for (name, value) in filters {
        if let Some(value) = value {
            query.set_filter(*name, value.clone());
        }
    }
    query.set_page(page);
    query
}

/// Reject a zero quantity before it round-trips to the server.
fn validate_quantity(quantity: u32) -> Result<()> {
    if quantity < 1 {
        anyhow::bail!("Quantity must be at least 1.");
    }
    Ok(())
}

/// Accept RFC 3339 or a bare "YYYY-MM-DD HH:MM" interpreted as UTC.
fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
        .with_context(|| format!("Could not parse datetime '{}'", value))?;
    Ok(Utc.from_utc_datetime(&naive))
}

fn resolve_password(password: Option<String>, prompt: &str) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end().to_string())
}

/// Map an API failure to consistent user-facing output.
///
/// Validation failures render inline per-field messages (first message per
/// field) instead of the generic panel; everything else gets the keyed
/// message plus a fallback target.
fn report(err: ApiError, key: ErrorKey) -> anyhow::Error {
    match err {
        ApiError::Validation(fields) => {
            for (field, messages) in fields.fields() {
                if let Some(first) = messages.first() {
                    eprintln!("{}: {}", field, first);
                }
            }
            anyhow::anyhow!("Validation failed")
        }
        ApiError::Unauthorized => {
            anyhow::anyhow!("Not logged in or session expired. Run 'wardrobe login <username>'.")
        }
        err => {
            tracing::error!(error = %err, "request failed");
            anyhow::anyhow!("{}\nTry: {}", key.message(), key.back_target())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_accepts_rfc3339() {
        let parsed = parse_datetime("2026-06-01T18:00:00Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-06-01T18:00:00+00:00");
    }

    #[test]
    fn test_parse_datetime_accepts_bare_format() {
        let parsed = parse_datetime("2026-06-01 18:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-06-01T18:00:00+00:00");
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert!(parse_datetime("soon").is_err());
    }

    #[test]
    fn test_zero_quantity_rejected_before_sending() {
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(1).is_ok());
    }

    #[test]
    fn test_build_query_keeps_explicit_page() {
        let query = build_query(
            3,
            Some("boa".to_string()),
            &[("category", Some("ACC".to_string())), ("color", None)],
        );
        assert_eq!(query.page(), 3);
        assert_eq!(query.search(), "boa");
        assert_eq!(query.filter("category"), Some("ACC"));
        assert_eq!(query.filter("color"), None);
    }
}
