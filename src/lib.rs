pub mod client;
pub mod compose;
pub mod config;
pub mod error;
pub mod fal;
pub mod logger;
pub mod mirror;
pub mod models;
pub mod server;
pub mod services;
pub mod storage;

pub use client::StudioClient;
pub use compose::{resolve_dimensions, Composer, Dimensions};
pub use config::{Config, DatabaseConfig, FalConfig, MirrorConfig};
pub use error::{Result, StudioError};
pub use fal::{FalImageClient, InferenceProvider};
pub use mirror::{ImageMirror, MirrorOutcome};
pub use models::*;
pub use server::AppState;
pub use services::{GenerationService, HistoryService};
pub use storage::HistoryStore;
