/// Configuration management
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `TASKNEST_PROJECT_ID`: Hosted backend project id (required)
/// - `TASKNEST_API_KEY`: Backend API key (optional)
/// - `TASKNEST_AUTH_DOMAIN`: Auth domain (default: `{project}.firebaseapp.com`)
/// - `TASKNEST_STORAGE_BUCKET`: Blob bucket (default: `{project}.appspot.com`)
/// - `TASKNEST_REQUIRE_VERIFIED_EMAIL`: Refuse unverified sign-ins (default: true)
/// - `TASKNEST_IMAGE_FETCH_TIMEOUT_SECS`: Timeout for remote image reads (default: 30)
/// - `RUST_LOG`: Log level (default: info)
///
/// # Example
///
/// ```no_run
/// use tasknest_shared::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Using bucket {}", config.backend.storage_bucket);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Hosted backend configuration
    pub backend: BackendConfig,

    /// Sync behaviour
    pub sync: SyncConfig,
}

/// Hosted backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project id of the hosted backend
    pub project_id: String,

    /// API key (public client key, not a secret)
    pub api_key: Option<String>,

    /// Authentication domain
    pub auth_domain: String,

    /// Bucket holding task images
    pub storage_bucket: String,
}

/// Sync behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Sign principals back out when their email is not verified
    pub require_verified_email: bool,

    /// Timeout for reading remote (http/https) image URIs
    pub image_fetch_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            require_verified_email: true,
            image_fetch_timeout_secs: 30,
        }
    }
}

impl SyncConfig {
    /// Image fetch timeout as a duration
    pub fn image_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.image_fetch_timeout_secs)
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `TASKNEST_PROJECT_ID` is missing
    /// - A variable has an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let project_id = env::var("TASKNEST_PROJECT_ID")
            .map_err(|_| anyhow::anyhow!("TASKNEST_PROJECT_ID environment variable is required"))?;

        if project_id.trim().is_empty() {
            anyhow::bail!("TASKNEST_PROJECT_ID must not be empty");
        }

        let api_key = env::var("TASKNEST_API_KEY").ok().filter(|key| !key.is_empty());

        let auth_domain = env::var("TASKNEST_AUTH_DOMAIN")
            .unwrap_or_else(|_| format!("{}.firebaseapp.com", project_id));

        let storage_bucket = env::var("TASKNEST_STORAGE_BUCKET")
            .unwrap_or_else(|_| format!("{}.appspot.com", project_id));

        let require_verified_email = env::var("TASKNEST_REQUIRE_VERIFIED_EMAIL")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()?;

        let image_fetch_timeout_secs = env::var("TASKNEST_IMAGE_FETCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()?;

        Ok(Self {
            backend: BackendConfig {
                project_id,
                api_key,
                auth_domain,
                storage_bucket,
            },
            sync: SyncConfig {
                require_verified_email,
                image_fetch_timeout_secs,
            },
        })
    }

    /// Fixed configuration for tests and local demos
    pub fn default_for_test() -> Self {
        Self {
            backend: BackendConfig {
                project_id: "tasknest-test".to_string(),
                api_key: None,
                auth_domain: "tasknest-test.firebaseapp.com".to_string(),
                storage_bucket: "tasknest-test.appspot.com".to_string(),
            },
            sync: SyncConfig::default(),
        }
    }
}
