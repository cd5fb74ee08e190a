use std::env;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000/api/";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5173";
pub const DEFAULT_TOKEN_STORE_PATH: &str = ".portal/token";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "Rs.";

#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Backend base URL, always ending in `/`.
    pub backend_url: String,
    pub bind_addr: String,
    pub token_store_path: PathBuf,
    pub currency_symbol: String,
}

impl PortalConfig {
    pub fn from_env() -> Self {
        let backend_url = env::var("BACKEND_URL")
            .unwrap_or_else(|_| {
                warn!("BACKEND_URL not set, using default");
                DEFAULT_BACKEND_URL.to_string()
            });
        let bind_addr = env::var("PORTAL_BIND_ADDR")
            .unwrap_or_else(|_| {
                warn!("PORTAL_BIND_ADDR not set, using default");
                DEFAULT_BIND_ADDR.to_string()
            });
        let token_store_path = env::var("TOKEN_STORE_PATH")
            .unwrap_or_else(|_| {
                warn!("TOKEN_STORE_PATH not set, using default");
                DEFAULT_TOKEN_STORE_PATH.to_string()
            });
        let currency_symbol = env::var("CURRENCY_SYMBOL")
            .unwrap_or_else(|_| DEFAULT_CURRENCY_SYMBOL.to_string());

        let config = Self::new(&backend_url)
            .with_bind_addr(bind_addr)
            .with_token_store_path(token_store_path)
            .with_currency_symbol(currency_symbol);

        if !config.is_configured() {
            warn!("Portal not fully configured - backend URL is empty");
        }

        config
    }

    /// Builds a config for `backend_url` with every other field defaulted.
    pub fn new(backend_url: &str) -> Self {
        Self {
            backend_url: normalize_base_url(backend_url),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            token_store_path: PathBuf::from(DEFAULT_TOKEN_STORE_PATH),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }

    pub fn with_bind_addr(mut self, bind_addr: impl Into<String>) -> Self {
        self.bind_addr = bind_addr.into();
        self
    }

    pub fn with_token_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_store_path = path.into();
        self
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.backend_url != "/"
    }

    /// Backend URL without its trailing `api/` segment, used for media paths
    /// that already carry their own prefix (`/media/...`).
    pub fn stripped_backend_url(&self) -> &str {
        self.backend_url
            .strip_suffix("/api/")
            .unwrap_or_else(|| self.backend_url.trim_end_matches('/'))
    }

    /// Absolute URL for a media path returned by the backend. Absolute URLs
    /// are passed through untouched.
    pub fn media_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.stripped_backend_url(), path.trim_start_matches('/'))
    }

    pub fn format_amount(&self, amount: &str) -> String {
        format!("{} {}", self.currency_symbol, amount)
    }
}

fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}
