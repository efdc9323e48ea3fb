/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// Backend connection settings live in
/// [`BackendConfig`](reviewdesk_backend::BackendConfig).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`). Batch writes are
    /// exempt.
    pub request_timeout_secs: u64,
    /// Pending tasks listed per live review page (default: `20`).
    pub queue_total: u32,
    /// Tasks per history page (default: `100`).
    pub history_page_size: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `60`                       |
    /// | `QUEUE_TOTAL`          | `20`                       |
    /// | `HISTORY_PAGE_SIZE`    | `100`                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let queue_total: u32 = std::env::var("QUEUE_TOTAL")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("QUEUE_TOTAL must be a valid u32");
        assert!(queue_total > 0, "QUEUE_TOTAL must be at least 1");

        let history_page_size: u32 = std::env::var("HISTORY_PAGE_SIZE")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect("HISTORY_PAGE_SIZE must be a valid u32");
        assert!(history_page_size > 0, "HISTORY_PAGE_SIZE must be at least 1");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            queue_total,
            history_page_size,
        }
    }
}
