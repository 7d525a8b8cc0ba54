//! CLI entry and dispatch.

use anyhow::{Context, Result};
use checkin_core::logging;
use clap::Parser;

mod app;
mod commands;

use app::App;

#[derive(Parser)]
#[command(name = "checkin")]
#[command(version)]
#[command(about = "Daily check-in client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    #[command(flatten)]
    Api(ApiCommands),

    /// Discard the stored credential
    Logout,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Commands that talk to the check-in API.
#[derive(clap::Subcommand)]
enum ApiCommands {
    /// Sign in and store the session credential
    Login {
        #[arg(short, long)]
        username: String,
        /// Read from stdin when omitted
        #[arg(short, long, env = "CHECKIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create a new account (does not sign in)
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(short, long, env = "CHECKIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Check in for today
    #[command(name = "check-in")]
    CheckIn,

    /// Show whether you have checked in today
    Status,

    /// List your check-ins
    History,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init();

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
        Commands::Logout => {
            let app = App::local()?;
            commands::auth::logout(&app);
            Ok(())
        }
        Commands::Api(command) => {
            let announce = !matches!(
                command,
                ApiCommands::Login { .. } | ApiCommands::Register { .. }
            );
            let mut app = App::from_config()?;
            let result = dispatch_api(&app, command).await;
            app.handle_gateway_events(announce);
            result
        }
    }
}

async fn dispatch_api(app: &App, command: ApiCommands) -> Result<()> {
    match command {
        ApiCommands::Login { username, password } => {
            commands::auth::login(app, &username, password).await
        }
        ApiCommands::Register {
            username,
            email,
            password,
        } => commands::auth::register(app, &username, &email, password).await,
        ApiCommands::CheckIn => commands::checkins::check_in(app).await,
        ApiCommands::Status => commands::checkins::status(app).await,
        ApiCommands::History => commands::checkins::history(app).await,
    }
}
