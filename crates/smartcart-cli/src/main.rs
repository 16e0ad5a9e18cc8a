use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "smartcart", version, about = "SmartCart shopping list and pantry CLI")]
struct Cli {
    /// Never contact the categorization service; use fallback values
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shopping list management
    List {
        #[command(subcommand)]
        action: commands::list::ListAction,
    },
    /// Items on a shopping list
    Item {
        #[command(subcommand)]
        action: commands::item::ItemAction,
    },
    /// Pantry inventory
    Pantry {
        #[command(subcommand)]
        action: commands::pantry::PantryAction,
    },
    /// Items predicted to be due for repurchase
    Predict {
        /// Print JSON with the figures behind each prediction
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Credentials for the categorization service
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let ctx = commands::Context {
        offline: cli.offline,
    };
    let result = match cli.command {
        Commands::List { action } => commands::list::run(&ctx, action),
        Commands::Item { action } => commands::item::run(&ctx, action),
        Commands::Pantry { action } => commands::pantry::run(&ctx, action),
        Commands::Predict { json } => commands::predict::run(&ctx, json),
        Commands::Config { action } => commands::config::run(action),
        Commands::Auth { action } => commands::auth::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
