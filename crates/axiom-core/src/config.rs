use std::time::Duration;

use crate::models::{CoreError, CoreErrorKind, CoreResult};
use crate::orchestration::history::DEFAULT_HISTORY_CAPACITY;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONTEXT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub const BACKEND_URL_ENV: &str = "AXIOM_BACKEND_URL";
pub const DISPATCH_TIMEOUT_ENV: &str = "AXIOM_DISPATCH_TIMEOUT_MS";
pub const CONTEXT_TIMEOUT_ENV: &str = "AXIOM_CONTEXT_TIMEOUT_MS";
pub const HISTORY_CAPACITY_ENV: &str = "AXIOM_HISTORY_CAPACITY";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DispatcherConfig {
    pub backend_url: String,
    pub dispatch_timeout: Duration,
    pub context_fetch_timeout: Duration,
    pub history_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
            context_fetch_timeout: DEFAULT_CONTEXT_FETCH_TIMEOUT,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl DispatcherConfig {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with any `AXIOM_*` variables present in the environment.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup(BACKEND_URL_ENV) {
            config.backend_url = url;
        }
        if let Some(raw) = lookup(DISPATCH_TIMEOUT_ENV) {
            config.dispatch_timeout =
                Duration::from_millis(parse_number(DISPATCH_TIMEOUT_ENV, &raw)?);
        }
        if let Some(raw) = lookup(CONTEXT_TIMEOUT_ENV) {
            config.context_fetch_timeout =
                Duration::from_millis(parse_number(CONTEXT_TIMEOUT_ENV, &raw)?);
        }
        if let Some(raw) = lookup(HISTORY_CAPACITY_ENV) {
            config.history_capacity = usize::try_from(parse_number(HISTORY_CAPACITY_ENV, &raw)?)
                .map_err(|_| invalid_input(format!("{HISTORY_CAPACITY_ENV} is out of range")))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    pub fn context_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.context_fetch_timeout = timeout;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.backend_url.trim().is_empty() {
            return Err(invalid_input("backend url must not be empty"));
        }
        if self.dispatch_timeout.is_zero() {
            return Err(invalid_input("dispatch timeout must be greater than zero"));
        }
        if self.context_fetch_timeout.is_zero() {
            return Err(invalid_input("context fetch timeout must be greater than zero"));
        }
        if self.history_capacity == 0 {
            return Err(invalid_input("history capacity must be greater than zero"));
        }
        Ok(())
    }

    /// Absolute endpoints pass through; paths are joined onto the backend url.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }

        format!(
            "{}/{}",
            self.backend_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

fn parse_number(name: &str, raw: &str) -> CoreResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| invalid_input(format!("{name} must be a whole number: {error}")))
}

fn invalid_input(message: impl Into<String>) -> CoreError {
    CoreError::new(CoreErrorKind::InvalidInput, message)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{DEFAULT_BACKEND_URL, DispatcherConfig};
    use crate::models::CoreErrorKind;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| values.get(name).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = DispatcherConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DispatcherConfig::default());
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn environment_overrides_are_applied() {
        let config = DispatcherConfig::from_lookup(lookup(&[
            ("AXIOM_BACKEND_URL", "https://axiom.example"),
            ("AXIOM_DISPATCH_TIMEOUT_MS", "1500"),
            ("AXIOM_HISTORY_CAPACITY", "7"),
        ]))
        .unwrap();

        assert_eq!(config.backend_url, "https://axiom.example");
        assert_eq!(config.dispatch_timeout, Duration::from_millis(1500));
        assert_eq!(config.history_capacity, 7);
    }

    #[test]
    fn malformed_and_zero_values_are_rejected() {
        let error =
            DispatcherConfig::from_lookup(lookup(&[("AXIOM_DISPATCH_TIMEOUT_MS", "soon")]))
                .unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::InvalidInput);

        let error = DispatcherConfig::default()
            .dispatch_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::InvalidInput);
    }

    #[test]
    fn relative_endpoints_join_backend_url() {
        let config = DispatcherConfig::new("http://backend:8000/");
        assert_eq!(
            config.endpoint_url("/api/tasks/execute"),
            "http://backend:8000/api/tasks/execute"
        );
        assert_eq!(
            config.endpoint_url("https://other.example/run"),
            "https://other.example/run"
        );
    }
}
