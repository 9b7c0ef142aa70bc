pub mod handlers;

use crate::{
    config::Config,
    error::{Result, StudioError},
    fal::FalImageClient,
    mirror::UploadThingMirror,
    services::{GenerationService, HistoryService},
    storage::open_history_store,
};
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub generation: GenerationService,
    pub history: HistoryService,
}

impl AppState {
    pub fn new(generation: GenerationService, history: HistoryService) -> Self {
        Self {
            generation,
            history,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        if config.fal.api_key.is_none() {
            log::warn!("FAL_KEY is not set; generation requests will fail");
        }
        let generation = GenerationService::new(Arc::new(FalImageClient::new(&config.fal)));

        let mut history = HistoryService::new(open_history_store(config)?);
        match &config.mirror {
            Some(mirror) if history.is_configured() => {
                history = history.with_mirror(Arc::new(UploadThingMirror::new(mirror)));
            }
            Some(_) => log::warn!("UPLOADTHING_SECRET ignored: no history store configured"),
            None => {}
        }
        if !history.is_configured() {
            log::warn!("No history store configured; history reads return empty results");
        }

        Ok(Self::new(generation, history))
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected JSON payload: {}", err);
        StudioError::InvalidPayload.into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected query string: {}", err);
        StudioError::InvalidPayload.into()
    }))
    .route("/api/generate", web::post().to(handlers::generate))
    .route("/api/history", web::get().to(handlers::list_history))
    .route("/api/history", web::post().to(handlers::record_history))
    .route("/api/models", web::get().to(handlers::models))
    .route("/api/styles", web::get().to(handlers::styles))
    .route("/health", web::get().to(handlers::health));
}

pub async fn run(config: &Config, state: AppState) -> std::io::Result<()> {
    let state = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::new("%r %s %Dms"))
            .configure(configure)
    })
    .bind(config.bind_address())?
    .run()
    .await
}
