//! Typed runtime configuration, read from the environment once at startup.
//!
//! Every field is listed here with its default. `Settings::from_env` fails
//! fast on a missing credential or an unparsable value instead of letting a
//! bad setting surface halfway through a trading run.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    pub api_key: String,
    pub secret_key: String,
    pub base_url: String,
    pub quote_asset: String,
    pub max_symbols: usize,
    pub kline_interval: String,
    pub kline_limit: u16,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AdvisorySettings {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSettings {
    pub momentum_period: usize,
    pub fast_period: usize,
    pub slow_period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            momentum_period: 14,
            fast_period: 12,
            slow_period: 26,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: i64,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub exchange: ExchangeSettings,
    pub advisory: AdvisorySettings,
    pub signal: SignalSettings,
    pub telegram: Option<TelegramSettings>,
    pub audit_log_path: Option<PathBuf>,
    pub cycle_concurrency: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Lookup(lookup);

        let exchange = ExchangeSettings {
            api_key: vars.required("BINANCE_API_KEY")?,
            secret_key: vars.required("BINANCE_SECRET_KEY")?,
            base_url: vars.string("BINANCE_BASE_URL", "https://api.binance.com"),
            quote_asset: vars.string("QUOTE_ASSET", "USDT").to_uppercase(),
            max_symbols: vars.parsed("MAX_SYMBOLS", 5)?,
            kline_interval: vars.string("KLINE_INTERVAL", "1h"),
            kline_limit: vars.parsed("KLINE_LIMIT", 50)?,
            timeout: Duration::from_secs(vars.parsed("EXCHANGE_TIMEOUT_SECS", 30)?),
        };
        if exchange.kline_limit == 0 || exchange.kline_limit > 1000 {
            return Err(invalid("KLINE_LIMIT", exchange.kline_limit, "must be within 1..=1000"));
        }

        let advisory = AdvisorySettings {
            enabled: vars.parsed("ADVISORY_ENABLED", true)?,
            base_url: vars.string("OLLAMA_BASE_URL", "http://localhost:11434"),
            model: vars.string("OLLAMA_MODEL", "deepseek-r1:14b"),
            temperature: vars.parsed("OLLAMA_TEMPERATURE", 0.3)?,
            timeout: Duration::from_secs(vars.parsed("ADVISORY_TIMEOUT_SECS", 120)?),
        };

        let defaults = SignalSettings::default();
        let signal = SignalSettings {
            momentum_period: vars.parsed("MOMENTUM_PERIOD", defaults.momentum_period)?,
            fast_period: vars.parsed("FAST_EMA_PERIOD", defaults.fast_period)?,
            slow_period: vars.parsed("SLOW_EMA_PERIOD", defaults.slow_period)?,
            oversold: vars.parsed("OVERSOLD_LEVEL", defaults.oversold)?,
            overbought: vars.parsed("OVERBOUGHT_LEVEL", defaults.overbought)?,
        };
        if usize::from(exchange.kline_limit) < signal.momentum_period {
            return Err(invalid(
                "KLINE_LIMIT",
                exchange.kline_limit,
                "must cover MOMENTUM_PERIOD observations",
            ));
        }

        let telegram = match (vars.optional("TELEGRAM_BOT_TOKEN"), vars.optional("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramSettings {
                bot_token,
                chat_id: chat_id
                    .parse()
                    .map_err(|_| invalid("TELEGRAM_CHAT_ID", &chat_id, "must be a number"))?,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("TELEGRAM_CHAT_ID")),
            (None, Some(_)) => return Err(ConfigError::Missing("TELEGRAM_BOT_TOKEN")),
        };

        let cycle_concurrency = vars.parsed("CYCLE_CONCURRENCY", 4)?;
        if cycle_concurrency == 0 {
            return Err(invalid("CYCLE_CONCURRENCY", 0, "must be at least 1"));
        }

        Ok(Self {
            exchange,
            advisory,
            signal,
            telegram,
            audit_log_path: vars.optional("AUDIT_LOG_PATH").map(PathBuf::from),
            cycle_concurrency,
        })
    }
}

fn invalid(key: &'static str, value: impl Display, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.optional(key) {
            Some(raw) => raw.parse().map_err(|e: T::Err| invalid(key, &raw, &e.to_string())),
            None => Ok(default),
        }
    }
}
