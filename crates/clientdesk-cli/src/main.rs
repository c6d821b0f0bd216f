mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, migrate::MigrateSubcommand, notify::NotifySubcommand,
    quote::QuoteArgs,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "clientdesk",
    about = "Client intake, proposals and notifications for a small studio",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .clientdesk/ or .git/)
    #[arg(long, global = true, env = "CLIENTDESK_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize clientdesk in the current directory
    Init {
        /// Company name shown to clients (default: directory name)
        #[arg(long)]
        company: Option<String>,
    },

    /// Walk through the client intake questionnaire
    Intake {
        /// Submission endpoint (default: intake.submit_url from config)
        #[arg(long)]
        endpoint: Option<String>,

        /// Key under which progress is saved between runs
        #[arg(long, default_value = "terminal")]
        key: String,
    },

    /// Price a proposal from a tier, add-ons and custom items
    Quote {
        #[arg(long)]
        project_type: String,

        /// good, better or best
        #[arg(long)]
        tier: String,

        /// Add-on id (repeatable)
        #[arg(long = "addon")]
        addons: Vec<String>,

        /// Custom line item as DESC:PRICE[:QTY] (repeatable)
        #[arg(long = "item")]
        items: Vec<String>,

        #[arg(long, conflicts_with = "discount_flat")]
        discount_percent: Option<f64>,

        #[arg(long)]
        discount_flat: Option<f64>,

        /// Tax rate as a fraction (0.08 = 8%)
        #[arg(long, default_value = "0")]
        tax_rate: f64,

        /// Save the proposal for this client email
        #[arg(long)]
        save_for: Option<String>,
    },

    /// Show the pricing tiers for a project type
    Tiers { project_type: String },

    /// Manage the database schema
    Migrate {
        #[command(subcommand)]
        subcommand: MigrateSubcommand,
    },

    /// Read and post notifications
    Notify {
        #[command(subcommand)]
        subcommand: NotifySubcommand,
    },

    /// Show or validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Run the HTTP API
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,

        /// Open the health endpoint in a browser once listening
        #[arg(long)]
        open: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { company } => cmd::init::run(&root, company.as_deref()),
        Commands::Intake { endpoint, key } => cmd::intake::run(&root, endpoint.as_deref(), &key),
        Commands::Quote {
            project_type,
            tier,
            addons,
            items,
            discount_percent,
            discount_flat,
            tax_rate,
            save_for,
        } => cmd::quote::run(
            &root,
            QuoteArgs {
                project_type,
                tier,
                addons,
                items,
                discount_percent,
                discount_flat,
                tax_rate,
                save_for,
            },
            cli.json,
        ),
        Commands::Tiers { project_type } => cmd::tiers::run(&project_type, cli.json),
        Commands::Migrate { subcommand } => cmd::migrate::run(&root, subcommand, cli.json),
        Commands::Notify { subcommand } => cmd::notify::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Serve { port, open } => cmd::serve::run(&root, port, open),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
