use std::env;

/// Deployment flavour, read from `ENVIRONMENT`. Selects the log format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Anything other than `production`/`prod` (case-insensitive) is development.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn from_env() -> Self {
        env::var("ENVIRONMENT")
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }
}
