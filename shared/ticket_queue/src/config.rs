//! Routing and sink configuration
//!
//! Settings come from a TOML file with the keys `region`, `queueIdentifier`,
//! `dlqIdentifier`, `routingTable` and `sinkConfig`, or from the environment
//! variables the services have always used (`SQS_P1_URL`, `SQS_DLQ_URL`,
//! `TEAMS_P1_WEBHOOK`, ...).

use std::{
    collections::BTreeMap,
    env, fmt,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use strum::IntoEnumIterator;
use thiserror::Error;
use url::Url;

use crate::{decode::LegacyPayloadFormat, routing::RoutingTable, ticket::Priority};

/// Configuration load and validation failures
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was read
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`Settings`]
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A priority has no destination queue
    #[error("routing table has no queue for priority {0}")]
    MissingRoute(Priority),

    /// The DLQ identifier is not configured
    #[error("dlqIdentifier is not configured")]
    MissingDlq,

    /// A priority has no sink configuration
    #[error("sinkConfig has no entry for priority {0}")]
    MissingSink(Priority),

    /// A queue identifier is not an absolute URL
    #[error("{name} is not a valid queue URL: {url}")]
    InvalidQueueUrl {
        /// Which setting held the URL
        name: String,
        /// Offending value
        url: String,
    },

    /// An environment variable holds an unsupported value
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

/// Delivery target for one priority
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SinkConfig {
    /// Incoming webhook (Teams / Power Automate)
    TeamsWebhook {
        /// Webhook URL
        webhook_url: String,
    },
    /// Jira Cloud issue creation
    Jira {
        /// Site domain, e.g. `example.atlassian.net`
        domain: String,
        /// Account email for basic auth
        email: String,
        /// API token for basic auth
        api_token: String,
        /// Project key issues are created in
        project_key: String,
    },
    /// Email through AWS SES
    Email {
        /// Verified sender address
        source: String,
        /// Recipient addresses
        recipients: Vec<String>,
    },
}

impl SinkConfig {
    /// Short name used in logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TeamsWebhook { .. } => "teams_webhook",
            Self::Jira { .. } => "jira",
            Self::Email { .. } => "email",
        }
    }
}

// Credentials and webhook URLs stay out of logs
impl fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TeamsWebhook { .. } => f
                .debug_struct("TeamsWebhook")
                .field("webhook_url", &"<redacted>")
                .finish(),
            Self::Jira {
                domain,
                email,
                project_key,
                ..
            } => f
                .debug_struct("Jira")
                .field("domain", domain)
                .field("email", email)
                .field("api_token", &"<redacted>")
                .field("project_key", project_key)
                .finish(),
            Self::Email { source, recipients } => f
                .debug_struct("Email")
                .field("source", source)
                .field("recipients", recipients)
                .finish(),
        }
    }
}

/// Configuration record consumed by the gateway, workers and DLQ inspector
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// AWS region, defaults to the provider chain
    #[serde(default)]
    pub region: Option<String>,
    /// Queue a worker consumes, defaults to its priority's route
    #[serde(default)]
    pub queue_identifier: Option<String>,
    /// Dead-letter queue URL
    #[serde(default)]
    pub dlq_identifier: Option<String>,
    /// Priority to queue URL
    #[serde(default)]
    pub routing_table: BTreeMap<Priority, String>,
    /// Priority to sink
    #[serde(default)]
    pub sink_config: BTreeMap<Priority, SinkConfig>,
}

impl Settings {
    /// Loads settings from `path` when given, otherwise from the environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::from_env()), Self::from_file)
    }

    /// Parses settings from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(toml::from_str(&contents)?)
    }

    /// Builds settings from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let routing_table = Priority::iter()
            .filter_map(|priority| {
                non_empty_var(&format!("SQS_{priority}_URL")).map(|url| (priority, url))
            })
            .collect();

        let mut sink_config = BTreeMap::new();

        if let Some(webhook_url) = non_empty_var("TEAMS_P1_WEBHOOK") {
            sink_config.insert(Priority::P1, SinkConfig::TeamsWebhook { webhook_url });
        }

        if let (Some(domain), Some(email), Some(api_token), Some(project_key)) = (
            non_empty_var("JIRA_DOMAIN"),
            non_empty_var("JIRA_EMAIL"),
            non_empty_var("JIRA_API_TOKEN"),
            non_empty_var("JIRA_PROJECT_KEY"),
        ) {
            sink_config.insert(
                Priority::P2,
                SinkConfig::Jira {
                    domain,
                    email,
                    api_token,
                    project_key,
                },
            );
        }

        if let (Some(source), Some(recipients)) = (
            non_empty_var("SES_EMAIL_SOURCE"),
            non_empty_var("SES_EMAIL_RECIPIENT"),
        ) {
            let recipients = recipients
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(ToString::to_string)
                .collect();
            sink_config.insert(Priority::P3, SinkConfig::Email { source, recipients });
        }

        Self {
            region: non_empty_var("AWS_REGION"),
            queue_identifier: non_empty_var("SQS_QUEUE_URL"),
            dlq_identifier: non_empty_var("SQS_DLQ_URL"),
            routing_table,
            sink_config,
        }
    }

    /// Validates the routing table and returns it
    ///
    /// Every priority needs a destination and every queue identifier must be
    /// an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on the first missing route or invalid URL
    pub fn routing_table(&self) -> Result<RoutingTable, ConfigError> {
        let table = RoutingTable::new(self.routing_table.clone());

        if let Some(priority) = table.missing_priorities().first() {
            return Err(ConfigError::MissingRoute(*priority));
        }

        for (priority, url) in table.iter() {
            validate_queue_url(&format!("routingTable.{priority}"), url)?;
        }

        if let Some(url) = &self.queue_identifier {
            validate_queue_url("queueIdentifier", url)?;
        }

        if let Some(url) = &self.dlq_identifier {
            validate_queue_url("dlqIdentifier", url)?;
        }

        Ok(table)
    }

    /// Queue the worker for `priority` consumes
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if neither `queueIdentifier` nor a route is set,
    /// or the URL is invalid
    pub fn worker_queue_url(&self, priority: Priority) -> Result<String, ConfigError> {
        let url = match &self.queue_identifier {
            Some(url) => url.clone(),
            None => self
                .routing_table
                .get(&priority)
                .filter(|url| !url.trim().is_empty())
                .ok_or(ConfigError::MissingRoute(priority))?
                .trim()
                .to_string(),
        };

        validate_queue_url("queueIdentifier", &url)?;
        Ok(url)
    }

    /// Dead-letter queue URL
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the DLQ is not configured or not a valid URL
    pub fn dlq_url(&self) -> Result<String, ConfigError> {
        let url = self.dlq_identifier.clone().ok_or(ConfigError::MissingDlq)?;
        validate_queue_url("dlqIdentifier", &url)?;
        Ok(url)
    }

    /// Sink configuration for `priority`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingSink` if none is configured
    pub fn sink_for(&self, priority: Priority) -> Result<&SinkConfig, ConfigError> {
        self.sink_config
            .get(&priority)
            .ok_or(ConfigError::MissingSink(priority))
    }
}

/// Receive batch size and long-poll wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Messages per receive call, 1 to 10
    pub max_messages: i32,
    /// Long-poll wait in seconds
    pub wait_time_seconds: i32,
}

impl PollSettings {
    /// Defaults for priority workers: one message, ten second wait
    pub const WORKER: Self = Self {
        max_messages: 1,
        wait_time_seconds: 10,
    };

    /// Defaults for the DLQ inspector: full batches, ten second wait
    pub const DLQ: Self = Self {
        max_messages: 10,
        wait_time_seconds: 10,
    };

    /// Worker poll settings from `WORKER_MAX_MESSAGES` / `WORKER_WAIT_SECONDS`
    #[must_use]
    pub fn worker_from_env() -> Self {
        Self::from_env("WORKER", Self::WORKER)
    }

    /// Inspector poll settings from `DLQ_MAX_MESSAGES` / `DLQ_WAIT_SECONDS`
    #[must_use]
    pub fn dlq_from_env() -> Self {
        Self::from_env("DLQ", Self::DLQ)
    }

    fn from_env(prefix: &str, defaults: Self) -> Self {
        Self {
            max_messages: env::var(format!("{prefix}_MAX_MESSAGES"))
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_messages),
            wait_time_seconds: env::var(format!("{prefix}_WAIT_SECONDS"))
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.wait_time_seconds),
        }
    }
}

impl LegacyPayloadFormat {
    /// Reads `LEGACY_PAYLOAD_FORMAT`, defaulting to `python-literal`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unsupported format
    pub fn from_env() -> Result<Self, ConfigError> {
        match non_empty_var("LEGACY_PAYLOAD_FORMAT") {
            None => Ok(Self::default()),
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "LEGACY_PAYLOAD_FORMAT",
                    value,
                }),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_queue_url(name: &str, url: &str) -> Result<(), ConfigError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        _ => Err(ConfigError::InvalidQueueUrl {
            name: name.to_string(),
            url: url.to_string(),
        }),
    }
}
