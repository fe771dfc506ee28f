use karlo_rs::logger::{self, LogLevel, LoggerConfig};
use karlo_rs::{backend, GenerationClient, KarloConfig, SessionConfig};
use std::env;
use std::io;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let level = env::var("KARLO_LOG")
        .ok()
        .and_then(|name| LogLevel::parse(&name))
        .unwrap_or(LogLevel::Info);
    logger::init_with_config(LoggerConfig::new().with_level(level))?;
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = KarloConfig::from_env()?;
    logger::log_config_info(&config);
    let credential = config.require_api_key()?.to_string();
    let session = SessionConfig::from_env()?;

    let backend = match backend::from_config(&config) {
        Ok(backend) => backend,
        Err(e) => {
            log::error!("❌ Failed to initialize backend: {}", e);
            return Err(e.into());
        }
    };

    let client = GenerationClient::new(backend);
    let report = client
        .run_session(&session, &credential, &mut io::stdout())
        .await?;

    if !report.all_succeeded() {
        log::warn!("Some operations failed, see the log above for details");
    }
    Ok(())
}
