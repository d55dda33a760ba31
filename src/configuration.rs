use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::time::Duration;

use crate::client::ApiClient;
use crate::expectation::StatusExpectation;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub target: TargetSettings,
    pub policy: PolicySettings,
    pub report: ReportSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct TargetSettings {
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl TargetSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn client(&self) -> Result<ApiClient, reqwest::Error> {
        ApiClient::new(self.base_url.clone(), self.timeout())
    }
}

/// Acceptable outcomes for the behaviors where the mock and the intended
/// production service disagree.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct PolicySettings {
    pub reject_duplicate_emails: bool,
    pub validate_email_format: bool,
    #[serde(deserialize_with = "non_empty_statuses")]
    pub login_success_statuses: Vec<u16>,
    #[serde(deserialize_with = "non_empty_statuses")]
    pub listing_statuses: Vec<u16>,
    #[serde(deserialize_with = "non_empty_statuses")]
    pub unauthorized_statuses: Vec<u16>,
    pub require_product_billing_fields: bool,
    pub unique_emails: bool,
}

impl PolicySettings {
    /// The lenient behavior observed on the mock server.
    pub fn mock() -> Self {
        Self {
            reject_duplicate_emails: false,
            validate_email_format: false,
            login_success_statuses: vec![200, 201],
            listing_statuses: vec![200, 201],
            unauthorized_statuses: vec![200, 401],
            require_product_billing_fields: true,
            unique_emails: false,
        }
    }

    /// The behavior a production deployment is expected to show.
    pub fn production() -> Self {
        Self {
            reject_duplicate_emails: true,
            validate_email_format: true,
            login_success_statuses: vec![200],
            listing_statuses: vec![200],
            unauthorized_statuses: vec![401],
            require_product_billing_fields: true,
            unique_emails: true,
        }
    }

    pub fn login_success(&self) -> StatusExpectation {
        StatusExpectation::from_accepted(&self.login_success_statuses)
    }

    pub fn listing(&self) -> StatusExpectation {
        StatusExpectation::from_accepted(&self.listing_statuses)
    }

    pub fn unauthorized(&self) -> StatusExpectation {
        StatusExpectation::from_accepted(&self.unauthorized_statuses)
    }
}

/// An empty list would reject every response.
fn non_empty_statuses<'de, D>(deserializer: D) -> Result<Vec<u16>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let statuses = Vec::<u16>::deserialize(deserializer)?;
    if statuses.is_empty() {
        return Err(serde::de::Error::custom(
            "at least one accepted status code is required",
        ));
    }
    Ok(statuses)
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ReportSettings {
    #[serde(default)]
    pub format: ReportFormat,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment.
    // Default to `local` if unspecified.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // Add in settings from environment variables (with a prefix of APP and '__' as separator)
        // E.g. `APP_TARGET__BASE_URL=http://localhost:4006` would set `Settings.target.base_url`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

/// The possible runtime environment for our harness.
#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}
