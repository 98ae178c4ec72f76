//! Core application

use anyhow::Result;

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::convert::{self, Direction};
use crate::core::shutdown::ShutdownService;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config)?;
        match command {
            Some(Commands::Decode { input, pretty }) => {
                convert::run(Direction::Decode, &input, pretty, &app.config.fields)
            }
            Some(Commands::Encode { input, pretty }) => {
                convert::run(Direction::Encode, &input, pretty, &app.config.fields)
            }
            Some(Commands::Start) | None => Self::start_server(app).await,
        }
    }

    fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        if config.fields.is_empty() {
            tracing::warn!("No fields configured; every rule will fail to encode");
        }
        Ok(Self {
            shutdown: ShutdownService::new(),
            config,
        })
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // Logs go to stderr so conversion output on stdout stays clean
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        banner::print_banner(&app.config);

        let server = ApiServer::new(app);
        let app = server.start().await?;
        tracing::debug!(triggered = app.shutdown.is_triggered(), "Server stopped");

        Ok(())
    }
}
