use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
    pub whatsapp: WhatsAppConfig,
    pub bling: BlingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// Shared secret compared against `hub.verify_token` during the
    /// platform's GET verification handshake.
    pub verify_token: SecretString,
}

#[derive(Clone, Debug)]
pub struct WhatsAppConfig {
    pub api_base_url: String,
    pub access_token: SecretString,
    pub phone_number_id: String,
    /// Operator contact for escalations. When unset, escalations are
    /// silently skipped.
    pub operator_phone: Option<String>,
}

#[derive(Clone, Debug)]
pub struct BlingConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub page_limit: u32,
    pub cache_window_secs: u64,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
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
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub verify_token: Option<String>,
    pub whatsapp_access_token: Option<String>,
    pub whatsapp_phone_number_id: Option<String>,
    pub operator_phone: Option<String>,
    pub bling_api_key: Option<String>,
    pub bling_base_url: Option<String>,
    pub cache_window_secs: Option<u64>,
    pub log_level: Option<String>,
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
            server: ServerConfig { bind_address: "0.0.0.0".to_string(), port: 3000 },
            webhook: WebhookConfig { verify_token: String::new().into() },
            whatsapp: WhatsAppConfig {
                api_base_url: "https://graph.facebook.com/v18.0".to_string(),
                access_token: String::new().into(),
                phone_number_id: String::new(),
                operator_phone: None,
            },
            bling: BlingConfig {
                base_url: "https://bling.com.br".to_string(),
                api_key: String::new().into(),
                page_limit: 100,
                cache_window_secs: 3600,
                timeout_secs: 10,
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

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("balcao.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(webhook) = patch.webhook {
            if let Some(verify_token_value) = webhook.verify_token {
                self.webhook.verify_token = secret_value(verify_token_value);
            }
        }

        if let Some(whatsapp) = patch.whatsapp {
            if let Some(api_base_url) = whatsapp.api_base_url {
                self.whatsapp.api_base_url = api_base_url;
            }
            if let Some(access_token_value) = whatsapp.access_token {
                self.whatsapp.access_token = secret_value(access_token_value);
            }
            if let Some(phone_number_id) = whatsapp.phone_number_id {
                self.whatsapp.phone_number_id = phone_number_id;
            }
            if let Some(operator_phone) = whatsapp.operator_phone {
                self.whatsapp.operator_phone = Some(operator_phone);
            }
        }

        if let Some(bling) = patch.bling {
            if let Some(base_url) = bling.base_url {
                self.bling.base_url = base_url;
            }
            if let Some(api_key_value) = bling.api_key {
                self.bling.api_key = secret_value(api_key_value);
            }
            if let Some(page_limit) = bling.page_limit {
                self.bling.page_limit = page_limit;
            }
            if let Some(cache_window_secs) = bling.cache_window_secs {
                self.bling.cache_window_secs = cache_window_secs;
            }
            if let Some(timeout_secs) = bling.timeout_secs {
                self.bling.timeout_secs = timeout_secs;
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
        if let Some(value) = read_env("BALCAO_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("BALCAO_SERVER_PORT") {
            self.server.port = parse_u16("BALCAO_SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("BALCAO_WEBHOOK_VERIFY_TOKEN") {
            self.webhook.verify_token = secret_value(value);
        }

        if let Some(value) = read_env("BALCAO_WHATSAPP_API_BASE_URL") {
            self.whatsapp.api_base_url = value;
        }
        if let Some(value) = read_env("BALCAO_WHATSAPP_ACCESS_TOKEN") {
            self.whatsapp.access_token = secret_value(value);
        }
        if let Some(value) = read_env("BALCAO_WHATSAPP_PHONE_NUMBER_ID") {
            self.whatsapp.phone_number_id = value;
        }
        if let Some(value) = read_env("BALCAO_WHATSAPP_OPERATOR_PHONE") {
            self.whatsapp.operator_phone = Some(value);
        }

        if let Some(value) = read_env("BALCAO_BLING_BASE_URL") {
            self.bling.base_url = value;
        }
        if let Some(value) = read_env("BALCAO_BLING_API_KEY") {
            self.bling.api_key = secret_value(value);
        }
        if let Some(value) = read_env("BALCAO_BLING_PAGE_LIMIT") {
            self.bling.page_limit = parse_u32("BALCAO_BLING_PAGE_LIMIT", &value)?;
        }
        if let Some(value) = read_env("BALCAO_BLING_CACHE_WINDOW_SECS") {
            self.bling.cache_window_secs = parse_u64("BALCAO_BLING_CACHE_WINDOW_SECS", &value)?;
        }
        if let Some(value) = read_env("BALCAO_BLING_TIMEOUT_SECS") {
            self.bling.timeout_secs = parse_u64("BALCAO_BLING_TIMEOUT_SECS", &value)?;
        }

        let log_level = read_env("BALCAO_LOGGING_LEVEL").or_else(|| read_env("BALCAO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BALCAO_LOGGING_FORMAT").or_else(|| read_env("BALCAO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(verify_token) = overrides.verify_token {
            self.webhook.verify_token = secret_value(verify_token);
        }
        if let Some(access_token) = overrides.whatsapp_access_token {
            self.whatsapp.access_token = secret_value(access_token);
        }
        if let Some(phone_number_id) = overrides.whatsapp_phone_number_id {
            self.whatsapp.phone_number_id = phone_number_id;
        }
        if let Some(operator_phone) = overrides.operator_phone {
            self.whatsapp.operator_phone = Some(operator_phone);
        }
        if let Some(api_key) = overrides.bling_api_key {
            self.bling.api_key = secret_value(api_key);
        }
        if let Some(base_url) = overrides.bling_base_url {
            self.bling.base_url = base_url;
        }
        if let Some(cache_window_secs) = overrides.cache_window_secs {
            self.bling.cache_window_secs = cache_window_secs;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_webhook(&self.webhook)?;
        validate_whatsapp(&self.whatsapp)?;
        validate_bling(&self.bling)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("balcao.toml"), PathBuf::from("config/balcao.toml")]
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

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_webhook(webhook: &WebhookConfig) -> Result<(), ConfigError> {
    if webhook.verify_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "webhook.verify_token is required. Use the same value you entered in the Meta app's webhook subscription form".to_string(),
        ));
    }

    Ok(())
}

fn validate_whatsapp(whatsapp: &WhatsAppConfig) -> Result<(), ConfigError> {
    if !whatsapp.api_base_url.starts_with("http://") && !whatsapp.api_base_url.starts_with("https://")
    {
        return Err(ConfigError::Validation(
            "whatsapp.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    if whatsapp.access_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "whatsapp.access_token is required. Get it from https://developers.facebook.com > Your App > WhatsApp > API Setup".to_string(),
        ));
    }

    if whatsapp.phone_number_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "whatsapp.phone_number_id is required. Get it from https://developers.facebook.com > Your App > WhatsApp > API Setup".to_string(),
        ));
    }

    Ok(())
}

fn validate_bling(bling: &BlingConfig) -> Result<(), ConfigError> {
    if !bling.base_url.starts_with("http://") && !bling.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "bling.base_url must start with http:// or https://".to_string(),
        ));
    }

    if bling.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "bling.api_key is required. Generate one under Bling > Preferências > API".to_string(),
        ));
    }

    if bling.page_limit == 0 || bling.page_limit > 100 {
        return Err(ConfigError::Validation(
            "bling.page_limit must be in range 1..=100".to_string(),
        ));
    }

    if bling.cache_window_secs == 0 {
        return Err(ConfigError::Validation(
            "bling.cache_window_secs must be greater than zero".to_string(),
        ));
    }

    if bling.timeout_secs == 0 || bling.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "bling.timeout_secs must be in range 1..=300".to_string(),
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

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    webhook: Option<WebhookPatch>,
    whatsapp: Option<WhatsAppPatch>,
    bling: Option<BlingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPatch {
    verify_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WhatsAppPatch {
    api_base_url: Option<String>,
    access_token: Option<String>,
    phone_number_id: Option<String>,
    operator_phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BlingPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    page_limit: Option<u32>,
    cache_window_secs: Option<u64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
