//! Client configuration

use std::time::Duration;
use typed_builder::TypedBuilder;

use crate::error::{ApiError, Result};
use crate::types::RouteName;
use crate::utils::{is_absolute_url, resolve_url, url_path_part};

/// Base URL baked in at build time (`API_BASE_URL`)
pub const BUILD_BASE_URL: Option<&str> = option_env!("API_BASE_URL");

/// Path of the token reissue endpoint
pub const DEFAULT_REFRESH_PATH: &str = "/auth/reissue";

/// Per-call deadline when a request does not set one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Configuration shared by the executor and the auth coordinator
///
/// ```
/// use nailkit_http::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .base_url("https://api.nailkit.test")
///     .default_timeout(Duration::from_secs(5))
///     .build();
/// assert_eq!(config.refresh_url(), "https://api.nailkit.test/auth/reissue");
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct ClientConfig {
    /// Base URL relative endpoints are resolved against
    #[builder(setter(into))]
    pub base_url: String,

    /// Path of the reissue endpoint, relative to `base_url`
    #[builder(default = DEFAULT_REFRESH_PATH.to_string(), setter(into))]
    pub refresh_path: String,

    /// Route shown when the session cannot be recovered
    #[builder(default, setter(into))]
    pub login_route: RouteName,

    /// Deadline for requests that do not set their own
    #[builder(default = DEFAULT_TIMEOUT)]
    pub default_timeout: Duration,
}

impl ClientConfig {
    /// Configuration from the build-time `API_BASE_URL`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidConfig` if the crate was built without
    /// `API_BASE_URL` or with a value that is not an absolute URL.
    pub fn from_build_env() -> Result<Self> {
        let base_url = BUILD_BASE_URL.ok_or_else(|| {
            ApiError::invalid_config("API_BASE_URL was not set when the crate was built")
        })?;
        let config = Self::builder().base_url(base_url).build();
        config.validate()?;
        Ok(config)
    }

    /// Check that the base URL is absolute
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidConfig` describing the problem.
    pub fn validate(&self) -> Result<()> {
        if !is_absolute_url(&self.base_url) {
            return Err(ApiError::invalid_config(format!(
                "base URL must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Absolute URL for an endpoint
    #[must_use]
    pub fn resolve(&self, endpoint: &str) -> String {
        resolve_url(&self.base_url, endpoint)
    }

    /// Absolute URL of the reissue endpoint
    #[must_use]
    pub fn refresh_url(&self) -> String {
        self.resolve(&self.refresh_path)
    }

    /// Whether an endpoint or URL points at the reissue endpoint
    ///
    /// Accepts relative endpoints (as seen by request interceptors) and
    /// absolute URLs with or without a query string (as seen by response
    /// interceptors).
    #[must_use]
    pub fn is_refresh_endpoint(&self, endpoint_or_url: &str) -> bool {
        let resolved = self.resolve(url_path_part(endpoint_or_url));
        resolved.trim_end_matches('/') == self.refresh_url().trim_end_matches('/')
    }
}
