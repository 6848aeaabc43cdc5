/// MO26 portal - command line entry point
///
/// `serve` (the default) runs the HTTP API. The other subcommands are the
/// operator tools: apply migrations and manage admin accounts.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mo26_portal::{
    account::{AdminManager, BootstrapOutcome},
    admin::Role,
    config::{ServerConfig, DEFAULT_LOG_FILTER},
    db, server, AppContext,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "mo26-portal", version, about = "Mini Olympics 2026 registration portal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Create an admin user, or reset the password and role of an existing one
    CreateAdmin {
        username: String,
        password: String,
        /// super_admin, registration_admin, inventory_admin, hoc_admin or finance_admin
        #[arg(long, default_value = "super_admin")]
        role: String,
    },
    /// Create the first admin from ADMIN_USERNAME / ADMIN_PASSWORD when none exist
    BootstrapAdmin,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    init_tracing(&config);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            print_banner();
            let ctx = AppContext::new(config).await?;
            server::serve(ctx).await?;
        }
        Commands::Migrate => {
            let pool = db::create_pool(&config.database).await?;
            db::run_migrations(&pool).await?;
            println!("Migrations applied.");
        }
        Commands::CreateAdmin {
            username,
            password,
            role,
        } => {
            let role: Role = role.parse()?;
            let manager = admin_manager(config).await?;
            let admin = manager.upsert_admin(&username, &password, role).await?;
            println!("Admin {} saved with role {}.", admin.username, admin.role);
        }
        Commands::BootstrapAdmin => {
            let manager = admin_manager(config).await?;
            match manager.bootstrap_from_config().await? {
                BootstrapOutcome::Created => println!("First admin created."),
                BootstrapOutcome::AlreadyInitialized => {
                    println!("Admin users already exist; nothing to do.")
                }
            }
        }
    }

    Ok(())
}

async fn admin_manager(config: ServerConfig) -> Result<AdminManager> {
    config.validate()?;
    let pool = db::create_pool(&config.database).await?;
    Ok(AdminManager::new(pool, Arc::new(config)))
}

fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn print_banner() {
    println!(
        r#"
    __  _______  ___   _____
   /  |/  / __ \|__ \ / ___/
  / /|_/ / / / /__/ // __ \
 / /  / / /_/ // __// /_/ /
/_/  /_/\____//____/\____/

        Mini Olympics 2026 portal v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
