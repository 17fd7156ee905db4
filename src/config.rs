use std::env;

/// Hosted pipeline execution endpoint used when `PIPELINE_URL` is not set.
pub const DEFAULT_PIPELINE_URL: &str =
    "https://api.airia.ai/v2/PipelineExecution/6dc38393-c059-43b5-827f-01e58c0052c7";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub pipeline: PipelineConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin of the marketing site, the only origin allowed by CORS.
    pub frontend_url: String,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub url: String,
    pub api_key: String,
    /// Upper bound for a single pipeline execution. A hung upstream surfaces
    /// as `AppError::UpstreamTimeout` once this elapses.
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Allowed requests per second (per IP) for the chat endpoints
    pub chat_per_second: u32,
    /// Burst size for the chat endpoints
    pub chat_burst: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                frontend_url: env::var("FRONTEND_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            },
            pipeline: PipelineConfig {
                url: env::var("PIPELINE_URL").unwrap_or_else(|_| DEFAULT_PIPELINE_URL.to_string()),
                api_key: env::var("PIPELINE_API_KEY")
                    .map_err(|_| ConfigError::MissingEnv("PIPELINE_API_KEY".to_string()))?,
                timeout_seconds: env::var("PIPELINE_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PIPELINE_TIMEOUT_SECONDS".to_string()))?,
            },
            rate_limit: RateLimitConfig {
                chat_per_second: env::var("RATE_LIMIT_CHAT_PER_SECOND")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
                chat_burst: env::var("RATE_LIMIT_CHAT_BURST")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                frontend_url: "http://localhost:3000".to_string(),
            },
            pipeline: PipelineConfig {
                url: DEFAULT_PIPELINE_URL.to_string(),
                api_key: String::new(),
                timeout_seconds: 60,
            },
            rate_limit: RateLimitConfig {
                chat_per_second: 2,
                chat_burst: 10,
            },
        }
    }
}
