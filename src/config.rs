use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    #[allow(dead_code)]
    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Uploaded drawings / scope files
    pub uploads_dir: PathBuf,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Price catalog
    pub catalog_cache_path: PathBuf,
    pub catalog_remote_url: Option<String>,
    pub catalog_fetch_timeout_seconds: u64,

    // Costing policy
    pub labor_rate: f64,

    // External extraction/review service (optional; heuristic parser when unset)
    pub ai_service_url: Option<String>,
    pub ai_service_token: String,
    pub ai_service_timeout_seconds: u64,
    pub max_review_rounds: u32,

    // Admin endpoints (purge) are refused entirely when no token is configured
    pub admin_token: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Database (file-backed SQLite, created on first run)
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://boqflow.db?mode=rwc".to_string());
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let uploads_dir =
            PathBuf::from(env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()));

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Price catalog tiers: session upload > disk cache > remote fetch
        let catalog_cache_path = PathBuf::from(
            env::var("CATALOG_CACHE_PATH").unwrap_or_else(|_| "price_list_cache.csv".to_string()),
        );
        let catalog_remote_url = env::var("CATALOG_REMOTE_URL").ok().filter(|s| !s.is_empty());
        let catalog_fetch_timeout_seconds = env::var("CATALOG_FETCH_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // Labor modeled as a fraction of material cost
        let labor_rate = env::var("LABOR_RATE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(crate::services::costing::DEFAULT_LABOR_RATE);

        // AI extraction service
        let ai_service_url = env::var("AI_SERVICE_URL").ok().filter(|s| !s.is_empty());
        let ai_service_token = env::var("AI_SERVICE_TOKEN").unwrap_or_default();
        let ai_service_timeout_seconds = env::var("AI_SERVICE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(120); // 2 minutes default for LLM calls
        let max_review_rounds = env::var("MAX_REVIEW_ROUNDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(2);

        let admin_token = env::var("ADMIN_TOKEN").ok().filter(|s| !s.is_empty());

        Ok(Settings {
            env,
            server_addr,
            database_url,
            database_max_connections,
            uploads_dir,
            cors_allow_origins,
            catalog_cache_path,
            catalog_remote_url,
            catalog_fetch_timeout_seconds,
            labor_rate,
            ai_service_url,
            ai_service_token,
            ai_service_timeout_seconds,
            max_review_rounds,
            admin_token,
        })
    }
}
