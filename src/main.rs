use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinError;

use apex_bot::application::errors::{BotError, ConfigError};
use apex_bot::application::messaging::CommandDispatcher;
use apex_bot::application::services::{
    render_table, BotRuntime, PanelService, ReportService, SessionService, WatchOutcome,
};
use apex_bot::domain::entities::ArticleQuery;
use apex_bot::domain::traits::{BotStatus, MessagingProvider, SystemClock};
use apex_bot::infrastructure::adapters::console::ConsoleProvider;
use apex_bot::infrastructure::apex::ApexClient;
use apex_bot::infrastructure::config::Config;
use apex_bot::infrastructure::control::{start_server, ControlState};
use apex_bot::infrastructure::panel::PanelClient;
use apex_bot::infrastructure::storage::JsonStore;

#[derive(Parser)]
#[command(name = "apex-bot")]
#[command(about = "WhatsApp command bot and operator panel for an Oracle APEX backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot and its control API
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
    /// Log in to the panel
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Drop the stored panel session
    Logout,
    /// Show the current panel session
    Session,
    /// Show the bot connection status
    Status {
        /// Keep polling until Ctrl-C
        #[arg(short, long)]
        watch: bool,
    },
    /// Send a message through the bot
    Send {
        #[arg(long)]
        phone: String,
        #[arg(short, long)]
        message: String,
    },
    /// Set a customer's discount percentage
    Discount {
        #[arg(long)]
        phone: String,
        #[arg(short, long, allow_hyphen_values = true)]
        value: String,
    },
    /// Print the sales-by-article report
    Articles {
        /// Company code (defaults to apex.company)
        #[arg(long)]
        company: Option<String>,
        /// Report date, yyyy-mm-dd
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("apex-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
        command => {
            let config = load_config(&cli.config);
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("Failed to start async runtime: {}", e);
                    std::process::exit(1);
                }
            };

            let result = rt.block_on(execute(command, config));
            // the console reader may still be blocked on stdin
            rt.shutdown_timeout(Duration::from_secs(1));

            if let Err(e) = result {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        }
    }
}

fn load_config(config_path: &str) -> Config {
    let loaded = if std::path::Path::new(config_path).exists() {
        Config::load(config_path).or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    loaded.unwrap_or_else(|e| {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    })
}

async fn execute(command: Commands, config: Config) -> Result<(), BotError> {
    match command {
        Commands::Run => run_bot(config).await,
        Commands::Articles { company, date } => print_articles(&config, company, date).await,
        command => run_panel(command, &config).await,
    }
}

async fn run_bot(config: Config) -> Result<(), BotError> {
    tracing::info!("Starting {}", config.bot.name);

    if !config.adapters.console.as_ref().is_some_and(|c| c.enabled) {
        return Err(ConfigError::MissingField("adapters.console".to_string()).into());
    }

    let apex = Arc::new(ApexClient::new(&config.apex)?);
    let dispatcher = Arc::new(CommandDispatcher::new(apex));
    let provider: Arc<dyn MessagingProvider> =
        Arc::new(ConsoleProvider::new().with_auto_pair(config.console_auto_pair()));

    let (runtime, status) = BotRuntime::new(provider.clone(), dispatcher, config.retry_policy());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let runtime_task = tokio::spawn(runtime.run(shutdown_rx.clone()));
    let state = ControlState { status, provider };
    let control = config.control.clone();
    let mut server = tokio::spawn(async move { start_server(&control, state, shutdown_rx).await });

    let early = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            }
            tracing::info!("Shutting down...");
            None
        }
        result = &mut server => Some(result),
    };

    let _ = shutdown_tx.send(true);
    if let Err(e) = runtime_task.await {
        tracing::warn!("Messaging runtime task failed: {}", e);
    }

    match early {
        Some(result) => joined(result),
        None => joined(server.await),
    }
}

fn joined(result: Result<Result<(), BotError>, JoinError>) -> Result<(), BotError> {
    result.map_err(|e| BotError::Internal(e.to_string()))?
}

async fn panel_service(config: &Config) -> Result<PanelService, BotError> {
    let store = Arc::new(JsonStore::open(config.panel.data_dir.clone()).await?);
    let session = Arc::new(SessionService::new(store, Arc::new(SystemClock)));
    let apex = Arc::new(ApexClient::new(&config.apex)?);
    let control = Arc::new(PanelClient::new(config.panel.api_url.clone())?);
    Ok(PanelService::new(session, apex.clone(), control, apex))
}

async fn run_panel(command: Commands, config: &Config) -> Result<(), BotError> {
    let panel = panel_service(config).await?;

    match command {
        Commands::Login { username, password } => {
            let info = panel.login(&username, &password).await?;
            let name = info.user.map(|u| u.to_string()).unwrap_or(username);
            println!("Bienvenido, {} (sesion valida por {}s)", name, info.remaining_secs);
        }
        Commands::Logout => {
            panel.logout().await?;
            println!("Sesion cerrada");
        }
        Commands::Session => match panel.session_info().await? {
            Some(info) => {
                let name = info.user.map(|u| u.to_string()).unwrap_or_else(|| "-".to_string());
                println!("Usuario: {}", name);
                println!("Expira en: {}s", info.remaining_secs);
            }
            None => println!("No hay sesion activa"),
        },
        Commands::Status { watch: false } => {
            print_status(&panel.status().await?);
        }
        Commands::Status { watch: true } => {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = shutdown_tx.send(true);
                }
            });

            let poll = Duration::from_secs(config.panel.poll_interval_secs);
            let expiry = Duration::from_secs(config.panel.expiry_check_secs);
            let mut last: Option<BotStatus> = None;
            let outcome = panel
                .watch_status(poll, expiry, shutdown_rx, |status| {
                    if last.as_ref() != Some(status) {
                        print_status(status);
                        last = Some(status.clone());
                    }
                })
                .await?;

            if outcome == WatchOutcome::SessionExpired {
                return Err(BotError::SessionExpired);
            }
        }
        Commands::Send { phone, message } => {
            panel.send_message(&phone, &message).await?;
            println!("Mensaje enviado a {}", phone);
        }
        Commands::Discount { phone, value } => {
            let value = panel.update_discount(&phone, &value).await?;
            println!("Descuento actualizado a {}% para {}", value, phone);
        }
        Commands::Run | Commands::Version | Commands::InitConfig | Commands::Articles { .. } => {}
    }

    Ok(())
}

fn print_status(status: &BotStatus) {
    if status.connected {
        println!("WhatsApp conectado");
        return;
    }
    match &status.qr_code {
        Some(code) => println!("Vincula el dispositivo con este codigo:\n{}", code),
        None => println!("WhatsApp desconectado, esperando codigo de vinculacion..."),
    }
}

async fn print_articles(
    config: &Config,
    company: Option<String>,
    date: Option<NaiveDate>,
) -> Result<(), BotError> {
    let apex = Arc::new(ApexClient::new(&config.apex)?);
    let reports = ReportService::new(apex);

    let mut query = ArticleQuery::new(company.unwrap_or_else(|| config.apex.company.clone()));
    if let Some(date) = date {
        query = query.with_date(date);
    }

    let report = reports.fetch(&query).await?;
    println!("{}", render_table(&report));
    Ok(())
}

fn init_config() {
    let config = Config::default();
    match serde_yaml::to_string(&config) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => {
            tracing::error!("Failed to render config: {}", e);
            std::process::exit(1);
        }
    }
}
