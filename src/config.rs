use std::env;

pub const DEFAULT_FAL_BASE_URL: &str = "https://fal.run";
pub const DEFAULT_UPLOADTHING_API_URL: &str = "https://api.uploadthing.com";

#[derive(Debug, Clone)]
pub struct FalConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub secret: String,
    pub api_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub history_backend: HistoryBackend,
    pub fal: FalConfig,
    pub database: Option<DatabaseConfig>,
    pub mirror: Option<MirrorConfig>,
}

impl Default for FalConfig {
    fn default() -> Self {
        FalConfig {
            api_key: None,
            base_url: DEFAULT_FAL_BASE_URL.to_string(),
        }
    }
}

impl FalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = non_empty_var("FAL_KEY");
        let base_url =
            non_empty_var("FAL_BASE_URL").unwrap_or_else(|| DEFAULT_FAL_BASE_URL.to_string());

        FalConfig { api_key, base_url }
    }

    pub fn with_credentials(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        DatabaseConfig {
            url: url.into(),
            auth_token: None,
        }
    }

    /// `None` when `DATABASE_URL` is unset, which leaves history unconfigured.
    pub fn from_env() -> Option<Self> {
        let url = non_empty_var("DATABASE_URL")?;
        let auth_token = non_empty_var("DATABASE_AUTH_TOKEN");

        Some(DatabaseConfig { url, auth_token })
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

impl MirrorConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        MirrorConfig {
            secret: secret.into(),
            api_url: DEFAULT_UPLOADTHING_API_URL.to_string(),
        }
    }

    pub fn from_env() -> Option<Self> {
        let secret = non_empty_var("UPLOADTHING_SECRET")?;
        let api_url = non_empty_var("UPLOADTHING_API_URL")
            .unwrap_or_else(|| DEFAULT_UPLOADTHING_API_URL.to_string());

        Some(MirrorConfig { secret, api_url })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

impl HistoryBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "psql" => Some(HistoryBackend::Postgres),
            "memory" | "mem" => Some(HistoryBackend::Memory),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 3000,
            history_backend: HistoryBackend::Postgres,
            fal: FalConfig::default(),
            database: None,
            mirror: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Config::default();
        let host = non_empty_var("HOST").unwrap_or(defaults.host);
        let port = env::var("PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(defaults.port);
        let history_backend = match non_empty_var("HISTORY_BACKEND") {
            Some(raw) => HistoryBackend::parse(&raw).unwrap_or_else(|| {
                log::warn!("Unknown HISTORY_BACKEND '{}', falling back to postgres", raw);
                HistoryBackend::Postgres
            }),
            None => HistoryBackend::Postgres,
        };

        Config {
            host,
            port,
            history_backend,
            fal: FalConfig::from_env(),
            database: DatabaseConfig::from_env(),
            mirror: MirrorConfig::from_env(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_fal(mut self, config: FalConfig) -> Self {
        self.fal = config;
        self
    }

    pub fn with_database(mut self, config: DatabaseConfig) -> Self {
        self.database = Some(config);
        self.history_backend = HistoryBackend::Postgres;
        self
    }

    pub fn with_memory_history(mut self) -> Self {
        self.history_backend = HistoryBackend::Memory;
        self
    }

    pub fn with_mirror(mut self, config: MirrorConfig) -> Self {
        self.mirror = Some(config);
        self
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn history_configured(&self) -> bool {
        match self.history_backend {
            HistoryBackend::Memory => true,
            HistoryBackend::Postgres => self.database.is_some(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
