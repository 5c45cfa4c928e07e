//! GameVerse CLI - Database and catalog management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! gameverse-cli migrate
//!
//! # Insert the starter catalog into an empty database
//! gameverse-cli seed
//!
//! # Pull games from the remote catalog
//! gameverse-cli sync --query zelda
//!
//! # Inspect and edit products
//! gameverse-cli products list
//! gameverse-cli products update 7 --price 125000 --admin-password <password>
//!
//! # Create an account
//! gameverse-cli users create -u admin -e admin@example.com -p <password>
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use gameverse_core::ProductId;

mod commands;

use commands::CommandError;
use commands::products::ProductEdit;

#[derive(Parser)]
#[command(name = "gameverse-cli")]
#[command(author, version, about = "GameVerse CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed empty tables with the starter catalog
    Seed,
    /// Fetch games from the remote catalog into the local store
    Sync {
        /// Search query (defaults to `CATALOG_SYNC_QUERY`)
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Inspect and edit products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage user accounts
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List local products
    List,
    /// Edit a product as the admin account
    Update {
        /// Product ID
        id: i32,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// New price, e.g. `125000` or `99.50`
        #[arg(long)]
        price: Option<String>,

        #[arg(long)]
        image_url: Option<String>,

        /// Password of the `admin` account
        #[arg(long, env = "GAMEVERSE_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: String,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// Create a new account
    Create {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env before clap reads env-backed arguments
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Sync { query } => commands::sync::run(query).await?,
        Commands::Products { action } => match action {
            ProductsAction::List => commands::products::list().await?,
            ProductsAction::Update {
                id,
                name,
                description,
                price,
                image_url,
                admin_password,
            } => {
                let edit = ProductEdit {
                    name,
                    description,
                    price,
                    image_url,
                };
                commands::products::update(ProductId::new(id), edit, &admin_password).await?;
            }
        },
        Commands::Users { action } => match action {
            UsersAction::Create {
                username,
                email,
                password,
            } => commands::users::create(&username, &email, &password).await?,
        },
    }
    Ok(())
}
