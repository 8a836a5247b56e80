use std::path::PathBuf;
use std::time::Duration;

use formkit_core::ordering::SwapMode;
use formkit_core::template::{TemplateSettings, DEFAULT_ASSETS_URL, DEFAULT_TEMPLATES_URL};

const SECS_PER_HOUR: u64 = 3600;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound for draining in-flight requests on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Lifetime of a cached site form list in hours (default: `12`).
    pub form_cache_ttl_hours: u64,
    /// Lifetime of a cached template fragment in hours (default: `1`).
    pub template_cache_ttl_hours: u64,
    /// Plugin directory containing `templates/` (default: `./plugin`).
    pub plugin_root: PathBuf,
    /// URL that `../../` in templates is rewritten to.
    pub assets_url: String,
    /// URL that `../` in templates is rewritten to.
    pub templates_url: String,
    /// How reorders write their two taxis updates (default: transactional).
    pub taxis_swap_mode: SwapMode,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                                           |
    /// |----------------------------|---------------------------------------------------|
    /// | `HOST`                     | `0.0.0.0`                                         |
    /// | `PORT`                     | `3000`                                            |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`                           |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                                              |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                                              |
    /// | `FORM_CACHE_TTL_HOURS`     | `12`                                              |
    /// | `TEMPLATE_CACHE_TTL_HOURS` | `1`                                               |
    /// | `FORM_PLUGIN_ROOT`         | `./plugin`                                        |
    /// | `FORM_ASSETS_URL`          | `{stl.siteUrl}/sitefiles/plugins/form`            |
    /// | `FORM_TEMPLATES_URL`       | `{stl.siteUrl}/sitefiles/plugins/form/templates`  |
    /// | `TAXIS_SWAP_MODE`          | `transactional`                                   |
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
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let form_cache_ttl_hours: u64 = std::env::var("FORM_CACHE_TTL_HOURS")
            .unwrap_or_else(|_| "12".into())
            .parse()
            .expect("FORM_CACHE_TTL_HOURS must be a valid u64");

        let template_cache_ttl_hours: u64 = std::env::var("TEMPLATE_CACHE_TTL_HOURS")
            .unwrap_or_else(|_| "1".into())
            .parse()
            .expect("TEMPLATE_CACHE_TTL_HOURS must be a valid u64");

        let plugin_root = PathBuf::from(
            std::env::var("FORM_PLUGIN_ROOT").unwrap_or_else(|_| "./plugin".into()),
        );

        let assets_url =
            std::env::var("FORM_ASSETS_URL").unwrap_or_else(|_| DEFAULT_ASSETS_URL.into());
        let templates_url =
            std::env::var("FORM_TEMPLATES_URL").unwrap_or_else(|_| DEFAULT_TEMPLATES_URL.into());

        let taxis_swap_mode: SwapMode = std::env::var("TAXIS_SWAP_MODE")
            .map(|raw| raw.parse().expect("TAXIS_SWAP_MODE must be 'transactional' or 'sequential'"))
            .unwrap_or_default();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            form_cache_ttl_hours,
            template_cache_ttl_hours,
            plugin_root,
            assets_url,
            templates_url,
            taxis_swap_mode,
        }
    }

    pub fn form_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.form_cache_ttl_hours * SECS_PER_HOUR)
    }

    /// Template loader settings derived from this configuration.
    pub fn template_settings(&self) -> TemplateSettings {
        TemplateSettings {
            plugin_root: self.plugin_root.clone(),
            assets_url: self.assets_url.clone(),
            templates_url: self.templates_url.clone(),
            ttl: Duration::from_secs(self.template_cache_ttl_hours * SECS_PER_HOUR),
        }
    }
}
