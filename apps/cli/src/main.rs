//! Guestlist CLI - Manage event guest lists from the terminal.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use guest_roster::{GuestAttribute, StatusFilter};
use guestlist_config_and_utils::{init_logging, Config, Paths};
use tracing::debug;

use commands::Workspace;

/// Guestlist CLI - Track guests, companions and arrivals for your events.
#[derive(Parser)]
#[command(name = "guestlist")]
#[command(about = "Guest list manager for events")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Directory holding config.json and guests.json (default ~/.guestlist)
    #[arg(long, global = true, env = "GUESTLIST_HOME")]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage events
    Events {
        #[command(subcommand)]
        command: EventCommands,
    },

    /// Show an event with its guest table
    Show {
        /// Event key
        event: String,
        /// Only list guests with this status
        #[arg(long)]
        status: Option<StatusArg>,
        /// Sort parties by guest name
        #[arg(long)]
        sort: Option<SortArg>,
    },

    /// Print the column schema of an event
    Columns {
        /// Event key
        event: String,
    },

    /// Add a guest, optionally with companions
    Add {
        /// Event key
        event: String,
        /// Guest name
        name: String,
        /// Attribute values, e.g. --set phone=5551234
        #[arg(long = "set", value_parser = parse_assignment)]
        attributes: Vec<(GuestAttribute, String)>,
        /// Companion names, written together with the guest as one group
        #[arg(short, long = "companion", conflicts_with = "parent")]
        companions: Vec<String>,
        /// Add as a companion of an existing guest
        #[arg(long)]
        parent: Option<String>,
    },

    /// Import groups of guests from a JSON file
    Import {
        /// Event key
        event: String,
        /// File holding an array of groups; each group is an array of guests
        file: PathBuf,
    },

    /// Edit a guest
    Edit {
        /// Event key
        event: String,
        /// Guest key
        guest: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// Attribute values, e.g. --set table=12
        #[arg(long = "set", value_parser = parse_assignment)]
        attributes: Vec<(GuestAttribute, String)>,
        /// Attributes to clear
        #[arg(long = "clear", value_parser = parse_attribute)]
        cleared: Vec<GuestAttribute>,
    },

    /// Check a guest in
    Arrive {
        /// Event key
        event: String,
        /// Guest key
        guest: String,
        /// Undo a check-in
        #[arg(long)]
        undo: bool,
    },

    /// Remove a guest
    Remove {
        /// Event key
        event: String,
        /// Guest key
        guest: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum EventCommands {
    /// List events
    List,
    /// Create or replace an event
    Set {
        /// Event key
        key: String,
        /// Event name
        #[arg(long)]
        name: String,
        /// Event date
        #[arg(long, default_value = "")]
        date: String,
        /// Event location
        #[arg(long, default_value = "")]
        location: String,
        /// Comma-separated guest attributes shown as columns, e.g. name,phone,table
        #[arg(long)]
        options: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Arrived,
    NotArrived,
}

impl From<StatusArg> for StatusFilter {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Arrived => StatusFilter::Arrived,
            StatusArg::NotArrived => StatusFilter::NotArrived,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Asc,
    Desc,
}

fn parse_attribute(raw: &str) -> Result<GuestAttribute, String> {
    GuestAttribute::parse(raw.trim()).ok_or_else(|| {
        let known: Vec<_> = GuestAttribute::ALL.iter().map(|a| a.as_str()).collect();
        format!("unknown attribute '{raw}' (expected one of {})", known.join(", "))
    })
}

fn parse_assignment(raw: &str) -> Result<(GuestAttribute, String), String> {
    let (attribute, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ATTRIBUTE=VALUE, got '{raw}'"))?;
    Ok((parse_attribute(attribute)?, value.to_string()))
}

async fn run(cli: Cli, paths: Paths, config: Config) -> anyhow::Result<()> {
    let workspace = Workspace::open(paths, config)?;
    let format = cli.format;

    match cli.command {
        Commands::Events { command } => match command {
            EventCommands::List => commands::events_list(&workspace, &format),
            EventCommands::Set {
                key,
                name,
                date,
                location,
                options,
            } => commands::events_set(&workspace, &key, name, date, location, options, &format),
        },
        Commands::Show { event, status, sort } => {
            commands::show(
                &workspace,
                &event,
                status.map(StatusFilter::from),
                sort.map(|s| matches!(s, SortArg::Desc)),
                &format,
            )
            .await
        }
        Commands::Columns { event } => commands::columns(&workspace, &event, &format),
        Commands::Add {
            event,
            name,
            attributes,
            companions,
            parent,
        } => commands::guests_add(
            &workspace,
            &event,
            name,
            attributes,
            companions,
            parent.as_deref(),
            &format,
        ),
        Commands::Import { event, file } => {
            commands::guests_import(&workspace, &event, &file, &format)
        }
        Commands::Edit {
            event,
            guest,
            name,
            attributes,
            cleared,
        } => commands::guests_edit(&workspace, &event, &guest, name, attributes, cleared, &format),
        Commands::Arrive { event, guest, undo } => {
            commands::guests_arrive(&workspace, &event, &guest, !undo, &format)
        }
        Commands::Remove { event, guest, yes } => {
            commands::guests_remove(&workspace, &event, &guest, yes, &format)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let paths = match &cli.base_dir {
        Some(dir) => Paths::with_base_dir(dir.clone()),
        None => match Paths::new() {
            Ok(paths) => paths,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
    };

    let config = match Config::load(&paths) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));
    debug!(base_dir = %paths.base_dir().display(), "starting guestlist");

    let format = cli.format;
    if let Err(e) = run(cli, paths, config).await {
        output::print_error(&format!("{:#}", e), &format);
        std::process::exit(1);
    }
}
