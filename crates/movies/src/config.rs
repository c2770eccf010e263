use std::{env, time::Duration};

/// Default table name.
pub const DEFAULT_TABLE_NAME: &str = "movies";

/// How long to poll while a table is being created or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableWaitPolicy {
    /// Number of describe calls before giving up.
    pub max_attempts: u32,
    /// Delay between describe calls.
    pub delay: Duration,
}

impl Default for TableWaitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            delay: Duration::from_secs(2),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Table to operate on (default: "movies")
    pub table_name: String,
    /// Custom endpoint URL, e.g. DynamoDB Local (default: none)
    pub endpoint_url: Option<String>,
    /// Region override; the SDK default chain decides when unset
    pub region: Option<String>,
    /// Polling budget for table creation and deletion
    pub table_wait: TableWaitPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `MOVIES_TABLE_NAME` - Table name (default: "movies")
    /// - `AWS_ENDPOINT_URL` - Custom DynamoDB endpoint (default: none)
    /// - `AWS_REGION` - Region override (default: SDK default chain)
    /// - `MOVIES_TABLE_WAIT_ATTEMPTS` - Polling attempts (default: 60)
    /// - `MOVIES_TABLE_WAIT_DELAY_SECONDS` - Delay between polls (default: 2)
    pub fn from_env() -> Self {
        let defaults = TableWaitPolicy::default();

        Self {
            table_name: env::var("MOVIES_TABLE_NAME")
                .unwrap_or_else(|_| DEFAULT_TABLE_NAME.to_string()),
            endpoint_url: env::var("AWS_ENDPOINT_URL").ok(),
            region: env::var("AWS_REGION").ok(),
            table_wait: TableWaitPolicy {
                max_attempts: env::var("MOVIES_TABLE_WAIT_ATTEMPTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.max_attempts),
                delay: env::var("MOVIES_TABLE_WAIT_DELAY_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.delay),
            },
        }
    }

    /// Sets the table name.
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match (&self.endpoint_url, &self.region) {
            (Some(url), _) => format!("Local DynamoDB ({})", url),
            (None, Some(region)) => format!("AWS DynamoDB (region: {})", region),
            (None, None) => "AWS DynamoDB (default region)".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
