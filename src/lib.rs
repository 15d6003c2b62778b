pub mod config;
pub mod export;
pub mod model;
pub mod search;
pub mod service;
pub mod storage;
pub mod ui;
pub mod validate;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use config::AppConfig;
use export::{ExportFormat, ExportOptions, export_report};
use model::types::{NewOffer, OrderStatus};
use service::{Assistant, OrderLookup, PickupRequest, ServiceError};
use ui::render::{self, ColorChoice};
use ui::time_parser::{future_dates, greeting, time_slots};
use validate::ValidationError;

/// Environment variable holding the tracing filter directives.
pub const LOG_ENV: &str = "CHAMPION_LOG";

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "champion",
    version,
    about = "Champion Cleaners assistant: pickups, order tracking, FAQ and offers"
)]
pub struct Cli {
    /// Path to the SQLite database (defaults to platform data dir)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file (defaults to $XDG_CONFIG_HOME/champion/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// FAQ catalog file, TOML or JSON (defaults to the built-in catalog)
    #[arg(long, global = true)]
    pub faq: Option<PathBuf>,

    /// Emit JSON instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    #[arg(long, value_enum, default_value_t = ColorChoice::Auto, global = true)]
    pub color: ColorChoice,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Schedule a pickup
    Schedule(ScheduleArgs),
    /// Track an order by ID or phone number
    Track {
        #[arg(long, conflicts_with = "phone", required_unless_present = "phone")]
        id: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Ask a question or browse the FAQ
    #[command(subcommand)]
    Faq(FaqCommand),
    /// Leave a phone number so the team can call back
    Contact {
        #[arg(long)]
        phone: String,
        /// What you need help with
        #[arg(long)]
        issue: String,
    },
    #[command(subcommand)]
    Offers(OffersCommand),
    /// Staff: list orders or change their status
    #[command(subcommand)]
    Orders(OrdersCommand),
    /// Staff: recent follow-up notifications
    Notifications {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List services and coverage areas
    Services,
    /// Show bookable pickup dates and time slots
    Slots,
    /// Staff: export orders and notifications
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,
        /// Only orders in this status
        #[arg(long, value_parser = parse_status)]
        status: Option<OrderStatus>,
        #[arg(long)]
        no_notifications: bool,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: String,
    /// YYYY-MM-DD, DD/MM/YYYY, tomorrow or +3d
    #[arg(long)]
    pub date: String,
    /// HH:MM or h:MM AM/PM
    #[arg(long)]
    pub time: String,
    #[arg(long)]
    pub service: String,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum FaqCommand {
    /// Ask a free-text question
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// List every question in the catalog
    List,
}

#[derive(Subcommand, Debug)]
pub enum OffersCommand {
    /// Offers running today
    List {
        #[arg(long)]
        audience: Option<String>,
    },
    /// Staff: add an offer
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long, conflicts_with = "amount")]
        percent: Option<f64>,
        /// Flat discount in AED
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        #[arg(long, default_value = "all")]
        audience: String,
    },
    /// Get offer announcements by email
    Subscribe { email: String },
    /// Staff: stop an offer before its end date
    Deactivate { offer_id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum OrdersCommand {
    List {
        #[arg(long, value_parser = parse_status)]
        status: Option<OrderStatus>,
    },
    /// Move an order along its timeline
    Status {
        order_id: String,
        #[arg(value_parser = parse_status)]
        status: OrderStatus,
    },
}

fn parse_status(value: &str) -> std::result::Result<OrderStatus, String> {
    OrderStatus::parse(value).ok_or_else(|| {
        let known: Vec<&str> = std::iter::once(OrderStatus::Scheduled)
            .chain(OrderStatus::TIMELINE)
            .map(OrderStatus::as_str)
            .collect();
        format!("unknown status '{value}' (expected one of: {})", known.join(", "))
    })
}

/// Installs the global subscriber. Keep the guard alive until exit when logging to a file.
pub fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating log directory {}", parent.display()))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .with(filter)
                .try_init()
                .ok();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .ok();
            Ok(None)
        }
    }
}

/// Process exit status for a failed run: 2 for rejected input, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if validation_error(err).is_some() { 2 } else { 1 }
}

/// The field errors behind `err`, if it was rejected input.
pub fn validation_error(err: &anyhow::Error) -> Option<&ValidationError> {
    match err.downcast_ref::<ServiceError>() {
        Some(ServiceError::Validation(v)) => Some(v),
        _ => err.downcast_ref::<ValidationError>(),
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;
    render::apply_color_choice(cli.color);

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::load().context("loading config")?,
    };

    let Some(command) = cli.command else {
        let hello = greeting(Local::now().time());
        print!("{}", render::header(&config.business, hello));
        println!("Run `champion --help` to see what I can do.");
        return Ok(());
    };

    // Commands that only need configuration.
    match &command {
        Commands::Services => {
            if cli.json {
                return print_json(&config.business);
            }
            print!("{}", render::services(&config.business));
            return Ok(());
        }
        Commands::Slots => {
            let dates = future_dates(Local::now().date_naive(), &config.pickup);
            let times = time_slots(&config.pickup);
            if cli.json {
                let times: Vec<String> = times.iter().map(|t| t.format("%H:%M").to_string()).collect();
                return print_json(&serde_json::json!({ "dates": dates, "times": times }));
            }
            print!("{}", render::slots(&dates, &times));
            return Ok(());
        }
        _ => {}
    }

    let db_path = match cli.db.clone().or_else(|| config.db_path.clone()) {
        Some(path) => path,
        None => default_db_path()?,
    };
    let assistant = Assistant::open(config, &db_path, cli.faq.as_deref())?;
    dispatch(&assistant, command, cli.json)
}

fn dispatch(assistant: &Assistant, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Schedule(args) => {
            let request = PickupRequest {
                full_name: args.name,
                phone_number: args.phone,
                email: args.email,
                pickup_address: args.address,
                pickup_date: args.date,
                pickup_time: args.time,
                service_type: args.service,
                notes: args.notes,
            };
            let scheduled = assistant.schedule_order(&request)?;
            if json {
                return print_json(&scheduled);
            }
            print!("{}", render::confirmation(&scheduled));
        }
        Commands::Track { id, phone } => {
            let lookup = match (id, phone) {
                (Some(id), _) => OrderLookup::Id(id),
                (None, Some(phone)) => OrderLookup::Phone(phone),
                (None, None) => anyhow::bail!("pass --id or --phone"),
            };
            let outcome = assistant.track_order(&lookup)?;
            if json {
                return print_json(&outcome);
            }
            print!("{}", render::track_outcome(&outcome));
        }
        Commands::Faq(FaqCommand::Ask { question }) => {
            let answer = assistant.answer_faq(&question.join(" "))?;
            if json {
                return print_json(&answer);
            }
            print!("{}", render::faq_answer(&answer));
        }
        Commands::Faq(FaqCommand::List) => {
            let entries = assistant.matcher().catalog().entries();
            if json {
                return print_json(&entries);
            }
            print!("{}", render::faq_list(entries));
        }
        Commands::Contact { phone, issue } => {
            let id = assistant.request_contact(&phone, &issue)?;
            if json {
                return print_json(&serde_json::json!({ "notification_id": id }));
            }
            println!("Thanks! Our team will call you back shortly.");
        }
        Commands::Offers(OffersCommand::List { audience }) => {
            let offers = assistant.list_offers(audience.as_deref())?;
            if json {
                return print_json(&offers);
            }
            print!("{}", render::offers(&offers));
        }
        Commands::Offers(OffersCommand::Add {
            name,
            description,
            percent,
            amount,
            from,
            to,
            audience,
        }) => {
            anyhow::ensure!(from <= to, "--from must not be after --to");
            let id = assistant.storage().add_offer(&NewOffer {
                name,
                description,
                discount_percent: percent,
                discount_amount: amount,
                valid_from: from.format("%Y-%m-%d").to_string(),
                valid_to: to.format("%Y-%m-%d").to_string(),
                target_audience: audience,
            })?;
            if json {
                return print_json(&serde_json::json!({ "offer_id": id }));
            }
            println!("Added offer #{id}");
        }
        Commands::Offers(OffersCommand::Subscribe { email }) => {
            let email = assistant.subscribe_offers(&email)?;
            if json {
                return print_json(&serde_json::json!({ "subscribed": email }));
            }
            println!("Thank you! {email} will receive our latest offers.");
        }
        Commands::Offers(OffersCommand::Deactivate { offer_id }) => {
            if !assistant.deactivate_offer(offer_id)? {
                anyhow::bail!("no offer with ID {offer_id}");
            }
            if json {
                return print_json(&serde_json::json!({ "offer_id": offer_id, "active": false }));
            }
            println!("Offer #{offer_id} is no longer running");
        }
        Commands::Orders(OrdersCommand::List { status }) => {
            let mut orders = assistant.list_orders()?;
            if let Some(status) = status {
                orders.retain(|o| o.status == status);
            }
            if json {
                return print_json(&orders);
            }
            print!("{}", render::orders_table(&orders));
        }
        Commands::Orders(OrdersCommand::Status { order_id, status }) => {
            if !assistant.update_order_status(&order_id, status)? {
                anyhow::bail!("no order with ID {}", order_id.trim().to_uppercase());
            }
            if json {
                return print_json(&serde_json::json!({ "order_id": order_id, "status": status }));
            }
            println!("Order {} is now {status}", order_id.trim().to_uppercase());
        }
        Commands::Notifications { limit } => {
            let items = assistant.notifications(limit)?;
            if json {
                return print_json(&items);
            }
            print!("{}", render::notifications(&items));
        }
        Commands::Export {
            format,
            status,
            no_notifications,
            output,
        } => {
            let orders = assistant.list_orders()?;
            let notifications = assistant.notifications(usize::MAX >> 1)?;
            let options = ExportOptions {
                status,
                include_notifications: !no_notifications,
                ..ExportOptions::default()
            };
            let report = export_report(&orders, &notifications, format, &options);
            match output {
                Some(path) => {
                    std::fs::write(&path, report)
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!("Wrote {} report to {}", format.name(), path.display());
                }
                None => print!("{report}"),
            }
        }
        Commands::Services | Commands::Slots => {}
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(default_data_dir()?.join("champion.db"))
}

pub fn default_data_dir() -> Result<PathBuf> {
    directories::ProjectDirs::from("com", "Champion Cleaners", "champion")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .context("could not determine a data directory; pass --db")
}
