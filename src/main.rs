use fluxstudio::{logger, server, AppState, Config};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    logger::init_with_config(logger::LoggerConfig::from_env())?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), &config);
    logger::log_config_info(&config);

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            log::error!("❌ Failed to initialize services: {}", e);
            return Err(e.into());
        }
    };

    server::run(&config, state).await?;
    log::info!("👋 Server stopped");
    Ok(())
}
