//! Runtime configuration, held per thread.
//!
//! - `RESOLVING_FUTURE_UNHANDLED`: `log` (default) or `panic`, what to do
//!   after an unhandled rejection has been reported.
//! - `RESOLVING_FUTURE_DRAIN_LIMIT`: maximum number of tasks a single
//!   `scheduler::run_pending()` call may run. Unset means unlimited.

use std::cell::Cell;
use std::fmt;
use std::str::FromStr;

use crate::Error;

const UNHANDLED_ENV: &str = "RESOLVING_FUTURE_UNHANDLED";
const DRAIN_LIMIT_ENV: &str = "RESOLVING_FUTURE_DRAIN_LIMIT";

thread_local! {
    static ACTIVE: Cell<Config> = Cell::new(Config::default());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnhandledPolicy {
    /// Report through the diagnostic hook and carry on.
    #[default]
    Log,
    /// Report, then panic from a task of its own on the scheduler queue.
    Panic,
}

impl fmt::Display for UnhandledPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log => write!(f, "log"),
            Self::Panic => write!(f, "panic"),
        }
    }
}

impl FromStr for UnhandledPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "panic" => Ok(Self::Panic),
            _ => Err(Error::InvalidConfig {
                key: UNHANDLED_ENV,
                value: s.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub unhandled: UnhandledPolicy,
    pub drain_limit: Option<usize>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from any key lookup; unset keys keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Config::default();
        if let Some(value) = lookup(UNHANDLED_ENV) {
            config.unhandled = value.parse()?;
        }
        if let Some(value) = lookup(DRAIN_LIMIT_ENV) {
            let limit = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or(Error::InvalidConfig {
                    key: DRAIN_LIMIT_ENV,
                    value,
                })?;
            config.drain_limit = Some(limit);
        }
        Ok(config)
    }
}

/// Makes `config` active on this thread, returning the previous one.
pub fn install(config: Config) -> Config {
    ACTIVE.with(|active| active.replace(config))
}

pub fn current() -> Config {
    ACTIVE.with(|active| active.get())
}
