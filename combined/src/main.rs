//! Command-line front end - drives the screens one command at a time.
//!
//! The persisted session file links successive invocations.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app_lib::config::AppConfig;
use app_lib::navigation::{HistoryNavigator, Route};
use app_lib::notify::{ConsoleNotifier, Notification, Notifier, TracingNotifier};
use app_lib::router::ViewRouter;
use app_lib::screens::{AuthMode, MainScreen};
use app_lib::View;
use auth_service_lib::SessionState;
use common::{AppError, AppResult};

#[derive(Parser)]
#[command(name = "aquarights")]
#[command(about = "Water rights tokenization client")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Send notifications to the log instead of the terminal
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show who is signed in and the linked wallet
    Status,
    /// Create an account
    SignUp {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "AQUARIGHTS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in with email and password
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long, env = "AQUARIGHTS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out of the current session
    SignOut,
    /// Manage the linked Hedera wallet
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },
    /// Mint a water-rights NFT
    Mint {
        /// Amount of water in gallons
        #[arg(long)]
        gallons: String,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum WalletAction {
    /// Create a new wallet and link it
    Create,
    /// Connect an existing wallet
    Connect,
    /// Unlink the wallet
    Disconnect,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let notifier: Arc<dyn Notifier> = if cli.quiet {
        Arc::new(TracingNotifier)
    } else {
        Arc::new(ConsoleNotifier)
    };
    let start = match cli.command {
        Commands::SignUp { .. } | Commands::SignIn { .. } => Route::Auth,
        _ => Route::Main,
    };
    let navigator = Arc::new(HistoryNavigator::new(start));

    let config = AppConfig::from_env();
    let mut router = match app_lib::launch(&config, notifier.clone(), navigator).await {
        Ok(router) => router,
        Err(e) => {
            error!("Startup failed [{}]: {}", e.code(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = execute(&mut router, notifier.as_ref(), cli.command).await;
    router.shutdown().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed [{}]: {}", e.code(), e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(router: &mut ViewRouter, notifier: &dyn Notifier, command: Commands) -> AppResult<()> {
    let view = router.resolve().await;

    match command {
        Commands::Status => match router.session_state() {
            SessionState::Authenticated(session) => {
                println!("Signed in as {}", session.email());
                let account = router.main_screen().and_then(MainScreen::account_id);
                println!("Wallet: {}", account.unwrap_or("not connected"));
            }
            _ => println!("Not signed in"),
        },
        Commands::SignUp {
            name,
            email,
            password,
        } => {
            let auth = router.auth_screen();
            auth.set_mode(AuthMode::SignUp);
            auth.submit_sign_up(&email, &password, &name).await?;
        }
        Commands::SignIn { email, password } => {
            if view == View::Main {
                info!("Replacing the current session");
            }
            router.sign_in(&email, &password).await?;
        }
        Commands::SignOut => {
            require_main(router, notifier)?;
            router.sign_out().await?;
        }
        Commands::Wallet { action } => {
            let main = require_main(router, notifier)?;
            let wallet = main.wallet_mut();
            match action {
                WalletAction::Create => {
                    let account = wallet.create_wallet().await?;
                    println!("Wallet: {}", account);
                }
                WalletAction::Connect => {
                    let account = wallet.connect_wallet().await?;
                    println!("Wallet: {}", account);
                }
                WalletAction::Disconnect => wallet.disconnect_wallet().await?,
            }
        }
        Commands::Mint { gallons } => {
            let main = require_main(router, notifier)?;
            let receipt = main.mint(&gallons).await?;
            println!("{}", receipt.summary());
        }
    }

    Ok(())
}

/// The main screen, or a notification that sign-in is needed.
fn require_main<'a>(router: &'a mut ViewRouter, notifier: &dyn Notifier) -> AppResult<&'a mut MainScreen> {
    match router.main_screen_mut() {
        Some(main) => Ok(main),
        None => {
            let err = AppError::Unauthenticated;
            notifier.notify(Notification::from_error(&err));
            Err(err)
        }
    }
}
