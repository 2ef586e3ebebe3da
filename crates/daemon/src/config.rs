//! Daemon configuration from `PHOTOQUEUE_*` environment variables
//!
//! Everything is parsed and validated once at startup; a bad value stops the
//! daemon with a message naming the variable.

use anyhow::{bail, Context, Result};
use photoqueue_api_rpc::RpcServerConfig;
use photoqueue_core::config::EngineConfig;
use photoqueue_core::domain::{AdmissionPolicy, OperationalStatus, Price};
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_UNIT_PRICE: Price = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub operator_tokens: Vec<String>,
    pub admin_tokens: Vec<String>,
    /// Every caller is treated as elevated
    pub disabled: bool,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub rpc: RpcServerConfig,
    pub engine: EngineConfig,
    pub unit_price: Price,
    /// Completed entries are only logged when unset
    pub ledger_path: Option<PathBuf>,
    pub auth: AuthConfig,
    pub log_format: LogFormat,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (tests pass a map instead of the process env)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut rpc = RpcServerConfig::default();
        if let Some(host) = get("PHOTOQUEUE_RPC_HOST") {
            rpc.host = host.trim().to_string();
        }
        if let Some(port) = get("PHOTOQUEUE_RPC_PORT") {
            rpc.port = parse_value("PHOTOQUEUE_RPC_PORT", &port)?;
        }

        let mut engine = EngineConfig::default();
        if let Some(raw) = get("PHOTOQUEUE_ALLOW_ADMISSION_DURING_BREAK") {
            engine.admission = AdmissionPolicy {
                allow_during_break: parse_bool("PHOTOQUEUE_ALLOW_ADMISSION_DURING_BREAK", &raw)?,
            };
        }
        if let Some(raw) = get("PHOTOQUEUE_INITIAL_STATUS") {
            engine.initial_status = raw
                .parse::<OperationalStatus>()
                .with_context(|| format!("invalid PHOTOQUEUE_INITIAL_STATUS {:?}", raw))?;
        }
        if let Some(location) = get("PHOTOQUEUE_LOCATION") {
            engine.initial_location = location.trim().to_string();
        }
        if let Some(raw) = get("PHOTOQUEUE_PRESET_LOCATIONS") {
            engine.preset_locations = split_list(&raw);
        }
        if let Some(raw) = get("PHOTOQUEUE_BROADCAST_CAPACITY") {
            engine.broadcast_capacity = parse_value("PHOTOQUEUE_BROADCAST_CAPACITY", &raw)?;
        }

        let unit_price = match get("PHOTOQUEUE_UNIT_PRICE") {
            Some(raw) => parse_value("PHOTOQUEUE_UNIT_PRICE", &raw)?,
            None => DEFAULT_UNIT_PRICE,
        };

        let auth = AuthConfig {
            operator_tokens: get("PHOTOQUEUE_OPERATOR_TOKENS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            admin_tokens: get("PHOTOQUEUE_ADMIN_TOKENS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            disabled: match get("PHOTOQUEUE_AUTH_DISABLED") {
                Some(raw) => parse_bool("PHOTOQUEUE_AUTH_DISABLED", &raw)?,
                None => false,
            },
        };

        let log_format = match get("PHOTOQUEUE_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!(
                "invalid PHOTOQUEUE_LOG_FORMAT {:?}: expected json or pretty",
                other
            ),
        };

        let config = Self {
            rpc,
            engine,
            unit_price,
            ledger_path: get("PHOTOQUEUE_LEDGER_PATH").map(PathBuf::from),
            auth,
            log_format,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine
            .validate()
            .context("invalid engine configuration")?;
        if self.unit_price == 0 {
            bail!("PHOTOQUEUE_UNIT_PRICE must be greater than 0");
        }
        if !self.auth.disabled
            && self.auth.operator_tokens.is_empty()
            && self.auth.admin_tokens.is_empty()
        {
            bail!(
                "no operator or admin tokens configured: set PHOTOQUEUE_OPERATOR_TOKENS / \
                 PHOTOQUEUE_ADMIN_TOKENS, or PHOTOQUEUE_AUTH_DISABLED=true"
            );
        }
        Ok(())
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("invalid {} {:?}", key, raw))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("invalid {} {:?}: expected true or false", key, other),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
