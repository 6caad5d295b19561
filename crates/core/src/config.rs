use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub company: CompanyConfig,
    pub email: EmailConfig,
    pub payment: PaymentConfig,
    pub extrabat: ExtrabatConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
    /// Base URL used when building public viewer links sent to clients.
    pub public_base_url: String,
}

#[derive(Clone, Debug)]
pub struct CompanyConfig {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Transactional email over the Brevo HTTP API.
#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub enabled: bool,
    pub api_base_url: String,
    pub api_key: SecretString,
    pub sender_name: String,
    pub sender_email: String,
}

/// SystemPay hosted-page redirect parameters.
#[derive(Clone, Debug)]
pub struct PaymentConfig {
    pub enabled: bool,
    pub gateway_url: String,
    pub site_id: String,
    pub certificate: SecretString,
    pub mode: PaymentMode,
    /// ISO 4217 numeric code; 978 is EUR.
    pub currency_code: String,
    pub return_url: String,
}

#[derive(Clone, Debug)]
pub struct ExtrabatConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: SecretString,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Test,
    Production,
}

impl PaymentMode {
    pub fn as_vads_ctx_mode(&self) -> &'static str {
        match self {
            Self::Test => "TEST",
            Self::Production => "PRODUCTION",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub public_base_url: Option<String>,
    pub email_enabled: Option<bool>,
    pub email_api_key: Option<String>,
    pub payment_enabled: Option<bool>,
    pub extrabat_enabled: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://devisio.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8090,
                health_check_port: 8091,
                graceful_shutdown_secs: 15,
                public_base_url: "http://127.0.0.1:8090".to_string(),
            },
            company: CompanyConfig {
                name: "Devisio".to_string(),
                email: "contact@example.com".to_string(),
                phone: String::new(),
            },
            email: EmailConfig {
                enabled: false,
                api_base_url: "https://api.brevo.com".to_string(),
                api_key: String::new().into(),
                sender_name: "Devisio".to_string(),
                sender_email: "no-reply@example.com".to_string(),
            },
            payment: PaymentConfig {
                enabled: false,
                gateway_url: "https://paiement.systempay.fr/vads-payment/".to_string(),
                site_id: String::new(),
                certificate: String::new().into(),
                mode: PaymentMode::Test,
                currency_code: "978".to_string(),
                return_url: "http://127.0.0.1:8090/payment/result".to_string(),
            },
            extrabat: ExtrabatConfig {
                enabled: false,
                base_url: "https://api.extrabat.com".to_string(),
                api_key: String::new().into(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Self::Test),
            "production" => Ok(Self::Production),
            other => Err(ConfigError::Validation(format!(
                "unsupported payment mode `{other}` (expected test|production)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("devisio.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(public_base_url) = server.public_base_url {
                self.server.public_base_url = public_base_url;
            }
        }

        if let Some(company) = patch.company {
            if let Some(name) = company.name {
                self.company.name = name;
            }
            if let Some(email) = company.email {
                self.company.email = email;
            }
            if let Some(phone) = company.phone {
                self.company.phone = phone;
            }
        }

        if let Some(email) = patch.email {
            if let Some(enabled) = email.enabled {
                self.email.enabled = enabled;
            }
            if let Some(api_base_url) = email.api_base_url {
                self.email.api_base_url = api_base_url;
            }
            if let Some(api_key_value) = email.api_key {
                self.email.api_key = secret_value(api_key_value);
            }
            if let Some(sender_name) = email.sender_name {
                self.email.sender_name = sender_name;
            }
            if let Some(sender_email) = email.sender_email {
                self.email.sender_email = sender_email;
            }
        }

        if let Some(payment) = patch.payment {
            if let Some(enabled) = payment.enabled {
                self.payment.enabled = enabled;
            }
            if let Some(gateway_url) = payment.gateway_url {
                self.payment.gateway_url = gateway_url;
            }
            if let Some(site_id) = payment.site_id {
                self.payment.site_id = site_id;
            }
            if let Some(certificate_value) = payment.certificate {
                self.payment.certificate = secret_value(certificate_value);
            }
            if let Some(mode) = payment.mode {
                self.payment.mode = mode;
            }
            if let Some(currency_code) = payment.currency_code {
                self.payment.currency_code = currency_code;
            }
            if let Some(return_url) = payment.return_url {
                self.payment.return_url = return_url;
            }
        }

        if let Some(extrabat) = patch.extrabat {
            if let Some(enabled) = extrabat.enabled {
                self.extrabat.enabled = enabled;
            }
            if let Some(base_url) = extrabat.base_url {
                self.extrabat.base_url = base_url;
            }
            if let Some(api_key_value) = extrabat.api_key {
                self.extrabat.api_key = secret_value(api_key_value);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DEVISIO_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("DEVISIO_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("DEVISIO_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("DEVISIO_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("DEVISIO_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("DEVISIO_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("DEVISIO_SERVER_PORT") {
            self.server.port = parse_u16("DEVISIO_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("DEVISIO_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("DEVISIO_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("DEVISIO_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("DEVISIO_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("DEVISIO_SERVER_PUBLIC_BASE_URL") {
            self.server.public_base_url = value;
        }

        if let Some(value) = read_env("DEVISIO_COMPANY_NAME") {
            self.company.name = value;
        }
        if let Some(value) = read_env("DEVISIO_COMPANY_EMAIL") {
            self.company.email = value;
        }
        if let Some(value) = read_env("DEVISIO_COMPANY_PHONE") {
            self.company.phone = value;
        }

        if let Some(value) = read_env("DEVISIO_EMAIL_ENABLED") {
            self.email.enabled = parse_bool("DEVISIO_EMAIL_ENABLED", &value)?;
        }
        if let Some(value) = read_env("DEVISIO_EMAIL_API_BASE_URL") {
            self.email.api_base_url = value;
        }
        if let Some(value) = read_env("DEVISIO_EMAIL_API_KEY") {
            self.email.api_key = secret_value(value);
        }
        if let Some(value) = read_env("DEVISIO_EMAIL_SENDER_NAME") {
            self.email.sender_name = value;
        }
        if let Some(value) = read_env("DEVISIO_EMAIL_SENDER_EMAIL") {
            self.email.sender_email = value;
        }

        if let Some(value) = read_env("DEVISIO_PAYMENT_ENABLED") {
            self.payment.enabled = parse_bool("DEVISIO_PAYMENT_ENABLED", &value)?;
        }
        if let Some(value) = read_env("DEVISIO_PAYMENT_GATEWAY_URL") {
            self.payment.gateway_url = value;
        }
        if let Some(value) = read_env("DEVISIO_PAYMENT_SITE_ID") {
            self.payment.site_id = value;
        }
        if let Some(value) = read_env("DEVISIO_PAYMENT_CERTIFICATE") {
            self.payment.certificate = secret_value(value);
        }
        if let Some(value) = read_env("DEVISIO_PAYMENT_MODE") {
            self.payment.mode = value.parse()?;
        }
        if let Some(value) = read_env("DEVISIO_PAYMENT_RETURN_URL") {
            self.payment.return_url = value;
        }

        if let Some(value) = read_env("DEVISIO_EXTRABAT_ENABLED") {
            self.extrabat.enabled = parse_bool("DEVISIO_EXTRABAT_ENABLED", &value)?;
        }
        if let Some(value) = read_env("DEVISIO_EXTRABAT_BASE_URL") {
            self.extrabat.base_url = value;
        }
        if let Some(value) = read_env("DEVISIO_EXTRABAT_API_KEY") {
            self.extrabat.api_key = secret_value(value);
        }

        let log_level = read_env("DEVISIO_LOGGING_LEVEL").or_else(|| read_env("DEVISIO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("DEVISIO_LOGGING_FORMAT").or_else(|| read_env("DEVISIO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(public_base_url) = overrides.public_base_url {
            self.server.public_base_url = public_base_url;
        }
        if let Some(enabled) = overrides.email_enabled {
            self.email.enabled = enabled;
        }
        if let Some(api_key) = overrides.email_api_key {
            self.email.api_key = secret_value(api_key);
        }
        if let Some(enabled) = overrides.payment_enabled {
            self.payment.enabled = enabled;
        }
        if let Some(enabled) = overrides.extrabat_enabled {
            self.extrabat.enabled = enabled;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_company(&self.company)?;
        validate_email(&self.email)?;
        validate_payment(&self.payment)?;
        validate_extrabat(&self.extrabat)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("devisio.toml"), PathBuf::from("config/devisio.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }
    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }
    if !server.public_base_url.starts_with("http://")
        && !server.public_base_url.starts_with("https://")
    {
        return Err(ConfigError::Validation(
            "server.public_base_url must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_company(company: &CompanyConfig) -> Result<(), ConfigError> {
    if company.name.trim().is_empty() {
        return Err(ConfigError::Validation("company.name must not be empty".to_string()));
    }
    if !company.email.contains('@') {
        return Err(ConfigError::Validation(
            "company.email must be a valid email address".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &EmailConfig) -> Result<(), ConfigError> {
    if !email.enabled {
        return Ok(());
    }
    if email.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "email.api_key is required when email.enabled is true".to_string(),
        ));
    }
    if !email.api_base_url.starts_with("http://") && !email.api_base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "email.api_base_url must start with http:// or https://".to_string(),
        ));
    }
    if !email.sender_email.contains('@') {
        return Err(ConfigError::Validation(
            "email.sender_email must be a valid email address".to_string(),
        ));
    }
    Ok(())
}

fn validate_payment(payment: &PaymentConfig) -> Result<(), ConfigError> {
    if !payment.enabled {
        return Ok(());
    }
    if payment.site_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "payment.site_id is required when payment.enabled is true".to_string(),
        ));
    }
    if payment.certificate.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "payment.certificate is required when payment.enabled is true".to_string(),
        ));
    }
    if !payment.gateway_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "payment.gateway_url must start with https://".to_string(),
        ));
    }
    if payment.currency_code.len() != 3 || !payment.currency_code.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ConfigError::Validation(
            "payment.currency_code must be a 3-digit ISO 4217 numeric code".to_string(),
        ));
    }
    Ok(())
}

fn validate_extrabat(extrabat: &ExtrabatConfig) -> Result<(), ConfigError> {
    if !extrabat.enabled {
        return Ok(());
    }
    if !extrabat.base_url.starts_with("http://") && !extrabat.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "extrabat.base_url must start with http:// or https://".to_string(),
        ));
    }
    if extrabat.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "extrabat.api_key is required when extrabat.enabled is true".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    company: Option<CompanyPatch>,
    email: Option<EmailPatch>,
    payment: Option<PaymentPatch>,
    extrabat: Option<ExtrabatPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    public_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CompanyPatch {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EmailPatch {
    enabled: Option<bool>,
    api_base_url: Option<String>,
    api_key: Option<String>,
    sender_name: Option<String>,
    sender_email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentPatch {
    enabled: Option<bool>,
    gateway_url: Option<String>,
    site_id: Option<String>,
    certificate: Option<String>,
    mode: Option<PaymentMode>,
    currency_code: Option<String>,
    return_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtrabatPatch {
    enabled: Option<bool>,
    base_url: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use secrecy::ExposeSecret;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, PaymentMode};

    fn load_from_toml(contents: &str) -> Result<AppConfig, ConfigError> {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            ..LoadOptions::default()
        })
    }

    #[test]
    fn defaults_validate_with_all_integrations_disabled() {
        let config = AppConfig::load(LoadOptions::default()).expect("defaults should be valid");

        assert!(!config.email.enabled);
        assert!(!config.payment.enabled);
        assert!(!config.extrabat.enabled);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn toml_patch_overrides_defaults() {
        let config = load_from_toml(
            r#"
            [database]
            url = "sqlite://custom.db"

            [server]
            port = 9000
            public_base_url = "https://devis.example.com"

            [company]
            name = "Bruneau Protection"
            email = "contact@bruneau.example"

            [payment]
            mode = "production"
            "#,
        )
        .expect("load");

        assert_eq!(config.database.url, "sqlite://custom.db");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.public_base_url, "https://devis.example.com");
        assert_eq!(config.company.name, "Bruneau Protection");
        assert_eq!(config.payment.mode, PaymentMode::Production);
    }

    #[test]
    fn enabled_email_requires_an_api_key() {
        let error = load_from_toml(
            r#"
            [email]
            enabled = true
            sender_email = "no-reply@example.com"
            "#,
        )
        .expect_err("missing api key");

        assert!(error.to_string().contains("email.api_key"));
    }

    #[test]
    fn enabled_payment_requires_site_id_and_certificate() {
        let error = load_from_toml(
            r#"
            [payment]
            enabled = true
            "#,
        )
        .expect_err("missing credentials");

        assert!(error.to_string().contains("payment.site_id"));
    }

    #[test]
    fn programmatic_overrides_win_over_file_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"[database]\nurl = \"sqlite://from-file.db\"\n").expect("write");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                email_api_key: Some("xkeysib-test".to_string()),
                ..ConfigOverrides::default()
            },
        })
        .expect("load");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.email.api_key.expose_secret(), "xkeysib-test");
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let error = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/devisio.toml")),
            require_file: true,
            ..LoadOptions::default()
        })
        .expect_err("missing file");

        assert!(matches!(error, ConfigError::MissingConfigFile(_)));
    }

    #[test]
    fn non_sqlite_database_url_is_rejected() {
        let error = load_from_toml(
            r#"
            [database]
            url = "postgres://localhost/devisio"
            "#,
        )
        .expect_err("postgres url");

        assert!(error.to_string().contains("database.url"));
    }

    #[test]
    fn interpolation_reports_the_missing_variable() {
        let error = load_from_toml(
            r#"
            [email]
            api_key = "${DEVISIO_TEST_UNSET_VARIABLE}"
            "#,
        )
        .expect_err("unset variable");

        assert!(matches!(
            error,
            ConfigError::MissingEnvInterpolation { ref var } if var == "DEVISIO_TEST_UNSET_VARIABLE"
        ));
    }
}
