//! Pocket Shop CLI - browse the catalog, manage accounts, and shop.
//!
//! # Usage
//!
//! ```bash
//! # List every product
//! ps-cli products list
//!
//! # Search the catalog
//! ps-cli products search --query lamp --per-page 10
//!
//! # Log in (password from --password or POCKET_SHOP_PASSWORD)
//! ps-cli auth login -e shopper@example.com
//!
//! # Interactive shopping session
//! ps-cli shop
//! ```
//!
//! # Environment Variables
//!
//! - `POCKET_SHOP_API_URL` - PocketBase base URL (required)
//! - `RUST_LOG` - Log filter (default: `pocket_shop_storefront=info,pocket_shop_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use pocket_shop_storefront::pocketbase::SearchParams;

mod commands;

use commands::CommandError;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "pocket_shop_storefront=info,pocket_shop_cli=info";

#[derive(Parser)]
#[command(name = "ps-cli")]
#[command(author, version, about = "Pocket Shop command line")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Log in or create an account
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Start an interactive shopping session
    Shop {
        /// Browse products from a bundled JSON file instead of the backend
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List every product
    List,
    /// Show one product
    Show {
        /// Product id
        id: String,
    },
    /// Search products
    Search {
        /// Text to match against name and description
        #[arg(short, long)]
        query: Option<String>,

        /// Category id to filter by
        #[arg(short, long)]
        category: Option<String>,

        /// Page number (1-based)
        #[arg(long)]
        page: Option<u32>,

        /// Results per page
        #[arg(long)]
        per_page: Option<u32>,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Log in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(long, env = "POCKET_SHOP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account, then log in
    Signup {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(long, env = "POCKET_SHOP_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env first so clap sees POCKET_SHOP_PASSWORD from it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.json);

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "Command failed");
        let _ = writeln!(std::io::stderr().lock(), "error: {}", e.user_message());
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let state = commands::load_state()?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List => commands::products::list(&state, &mut out).await?,
            ProductsAction::Show { id } => {
                commands::products::show(&state, &id.into(), &mut out).await?;
            }
            ProductsAction::Search {
                query,
                category,
                page,
                per_page,
            } => {
                let params = SearchParams {
                    query,
                    category,
                    page,
                    per_page,
                };
                commands::products::search(&state, &params, &mut out).await?;
            }
        },
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => {
                let password = SecretString::from(password);
                commands::auth::login(&state, &email, &password, &mut out).await?;
            }
            AuthAction::Signup { email, password } => {
                let password = SecretString::from(password);
                commands::auth::signup(&state, &email, &password, &mut out).await?;
            }
        },
        Commands::Shop { catalog } => {
            commands::shop::run(&state, catalog.as_deref(), &mut out).await?;
        }
    }
    Ok(())
}
