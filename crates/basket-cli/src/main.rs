use std::path::PathBuf;

use anyhow::{anyhow, Result};
use basket_cli::cli::{run_command, run_config, CliCommand, CliConfig, ConfigAction, Options};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "basket")]
#[command(about = "Shared household shopping list")]
struct Cli {
    /// Path to JSON config file (baseUrl, accessKey, reconnectDelayMs)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Server root, overrides the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Household access key, overrides the config file
    #[arg(long, env = "BASKET_ACCESS_KEY", global = true, hide_env_values = true)]
    access_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the list in aisle order
    List,

    /// Shopping mode: unchecked first, with progress
    Shop,

    /// Show the product catalog
    Products,

    /// Find catalog products that are not on the list yet
    Search {
        query: String,
    },

    /// Put a catalog product on the list
    Add {
        /// Product name or id
        product: String,
        #[arg(long, short)]
        quantity: Option<String>,
        #[arg(long, short)]
        note: Option<String>,
        /// Create the product if it does not exist
        #[arg(long)]
        create: bool,
    },

    /// Put a free-text entry on the list
    AddCustom {
        name: String,
        #[arg(long, short)]
        quantity: Option<String>,
        #[arg(long, short)]
        note: Option<String>,
    },

    /// Change quantity or note of an entry
    Edit {
        /// Entry name or id
        item: String,
        #[arg(long, short)]
        quantity: Option<String>,
        #[arg(long, short)]
        note: Option<String>,
    },

    /// Check or uncheck an entry
    Check {
        /// Entry name or id
        item: String,
    },

    /// Remove an entry from the list
    Remove {
        /// Entry name or id
        item: String,
    },

    /// Empty the list
    Clear {
        /// Only remove checked entries
        #[arg(long)]
        keep_unchecked: bool,
    },

    /// Manage the product catalog
    #[command(subcommand)]
    Product(ProductCommands),

    /// Add a product to the list, or remove it if already there
    Bulk {
        /// Product name or id
        product: String,
        #[arg(long, short)]
        quantity: Option<String>,
    },

    /// Keep printing the list as it changes
    Watch {
        /// Use the shopping mode view
        #[arg(long)]
        shop: bool,
    },

    /// Manage local settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ProductCommands {
    /// Add a product to the catalog
    Add { name: String },
    /// Rename a product
    Rename { product: String, name: String },
    /// Delete a product that is not on the list
    Delete { product: String },
    /// Set the full catalog order, first to last
    Reorder {
        #[arg(required = true)]
        products: Vec<String>,
    },
    /// Move one product to a 1-based position
    Move { product: String, position: usize },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Store the household access key
    SetKey { key: String },
    /// Remove the stored access key
    ForgetKey,
    /// Store the server root
    SetServer { url: String },
    /// Show effective settings
    Show,
}

#[tokio::main]
async fn main() {
    basket_core::tracing_setup::init_tracing_with_default("warn");

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => CliConfig::default_path()
            .ok_or_else(|| anyhow!("No config directory on this platform; pass --config"))?,
    };
    let options = Options {
        config_path,
        base_url: cli.base_url,
        access_key: cli.access_key,
    };

    let command = match cli.command {
        Commands::List => CliCommand::List,
        Commands::Shop => CliCommand::Shop,
        Commands::Products => CliCommand::Products,
        Commands::Search { query } => CliCommand::Search { query },
        Commands::Add {
            product,
            quantity,
            note,
            create,
        } => CliCommand::Add {
            product,
            quantity,
            note,
            create,
        },
        Commands::AddCustom {
            name,
            quantity,
            note,
        } => CliCommand::AddCustom {
            name,
            quantity,
            note,
        },
        Commands::Edit {
            item,
            quantity,
            note,
        } => CliCommand::Edit {
            item,
            quantity,
            note,
        },
        Commands::Check { item } => CliCommand::Check { item },
        Commands::Remove { item } => CliCommand::Remove { item },
        Commands::Clear { keep_unchecked } => CliCommand::Clear { keep_unchecked },
        Commands::Product(ProductCommands::Add { name }) => CliCommand::ProductAdd { name },
        Commands::Product(ProductCommands::Rename { product, name }) => {
            CliCommand::ProductRename { product, name }
        }
        Commands::Product(ProductCommands::Delete { product }) => {
            CliCommand::ProductDelete { product }
        }
        Commands::Product(ProductCommands::Reorder { products }) => {
            CliCommand::ProductReorder { products }
        }
        Commands::Product(ProductCommands::Move { product, position }) => {
            CliCommand::ProductMove { product, position }
        }
        Commands::Bulk { product, quantity } => CliCommand::Bulk { product, quantity },
        Commands::Watch { shop } => CliCommand::Watch { shopping: shop },
        Commands::Config(action) => {
            let action = match action {
                ConfigCommands::SetKey { key } => ConfigAction::SetKey { key },
                ConfigCommands::ForgetKey => ConfigAction::ForgetKey,
                ConfigCommands::SetServer { url } => ConfigAction::SetBaseUrl { url },
                ConfigCommands::Show => ConfigAction::Show,
            };
            print!("{}", run_config(action, &options)?);
            return Ok(());
        }
    };

    run_command(command, &options).await
}
