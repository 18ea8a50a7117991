use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::Rate;
use crate::domain::SubscriberEmail;
use crate::email_client::EmailBackend;
use crate::email_client::EmailClient;
use crate::email_client::SmtpTransport;
use crate::rate::RateProvider;
use crate::rate::RateSource;
use crate::storage::CsvStorage;

/// Global configuration, loaded from `configuration/*.yaml`. See
/// `get_configuration`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub storage: StorageSettings,
    pub smtp: SmtpSettings,
    pub email: EmailSettings,
    pub http_client: HttpClientSettings,
    /// Tried in the order declared here
    pub rate_sources: Vec<RateSourceSettings>,
}

/// Server configuration
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

/// Location of the subscriber csv file
#[derive(Deserialize, Clone)]
pub struct StorageSettings {
    pub path: PathBuf,
}

impl StorageSettings {
    pub fn storage(&self) -> CsvStorage { CsvStorage::new(self.path.clone()) }
}

/// Mail server; the connection is always wrapped in TLS (smtps, usually port
/// 465)
#[derive(Deserialize, Clone)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl SmtpSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn transport(&self) -> SmtpTransport {
        SmtpTransport::new(
            self.host.clone(),
            self.port,
            self.username.clone(),
            self.password.clone(),
            self.timeout(),
        )
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailBackendKind {
    Smtp,
    /// Write messages to the log instead of sending them
    Log,
}

/// Message templates. `subject` and `body` are tera templates; the only
/// variable in scope is `rate`, already formatted with two decimals.
#[derive(Deserialize, Clone)]
pub struct EmailSettings {
    pub backend: EmailBackendKind,
    pub from: String,
    pub subject: String,
    pub body: String,
}

impl EmailSettings {
    pub fn sender(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.from.clone())
    }
}

/// Shared by all rate sources
#[derive(Deserialize, Clone)]
pub struct HttpClientSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl HttpClientSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder().timeout(self.timeout()).build()
    }
}

#[derive(Deserialize, Clone)]
pub struct RateSourceSettings {
    pub provider: RateProvider,
    pub url: String,
    /// Reported alongside the error when the source fails
    #[serde(default)]
    pub default_rate: f64,
}

impl Settings {
    /// Rate sources in configuration order, sharing one http client
    pub fn rate_sources(&self) -> Result<Vec<RateSource>, reqwest::Error> {
        let client = self.http_client.client()?;
        let sources = self
            .rate_sources
            .iter()
            .map(|s| {
                RateSource::new(
                    s.provider,
                    s.url.clone(),
                    Rate::new(s.default_rate),
                    client.clone(),
                )
            })
            .collect();
        Ok(sources)
    }

    pub fn email_client(&self) -> Result<EmailClient, String> {
        let backend = match self.email.backend {
            EmailBackendKind::Smtp => EmailBackend::Smtp(self.smtp.transport()),
            EmailBackendKind::Log => EmailBackend::Log,
        };
        Ok(EmailClient::new(
            self.email.sender()?,
            self.email.subject.clone(),
            self.email.body.clone(),
            backend,
        ))
    }
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )?;
        Ok(())
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("Invalid: {e}")),
        }
    }
}

/// Load yaml configuration files at `<project_root>/configuration`:
/// `base.yaml`, then `{APP_ENVIRONMENT}.yaml` (default `local`), then `APP_`
/// env vars, e.g. `APP_SMTP__PASSWORD=...` -> `Settings.smtp.password`.
///
/// All fields must be present, otherwise initialisation fails immediately and
/// the server does not start.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Message(format!("could not get current dir: {e}")))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or("local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            // env vars are -always- parsed as String, hence `serde-aux` for numbers
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
