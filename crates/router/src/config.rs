//! Router configuration.

use std::time::Duration;

use router_core::{Result, RouterError};
use serde::{Deserialize, Serialize};

/// Shortest allowed per-call provider timeout.
pub const MIN_PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest allowed per-call provider timeout.
pub const MAX_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for a [`SymbolRouter`](crate::SymbolRouter) and its [`Scheduler`](crate::Scheduler).
///
/// Durations are whole seconds when serialized. Missing fields take their
/// default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Bound on each provider call. Clamped into 5..=10 seconds when used.
    #[serde(with = "seconds")]
    pub provider_timeout: Duration,
    /// Period of the directory refresh and series cache clear.
    #[serde(with = "seconds")]
    pub refresh_period: Duration,
    /// Period of the trending decay tick.
    #[serde(with = "seconds")]
    pub decay_period: Duration,
    /// Multiplier applied to every trending weight on each tick.
    pub decay_factor: f64,
    /// Weights below this after decay are pruned.
    pub prune_floor: f64,
    /// Idle time after which a computed reply expires.
    #[serde(with = "seconds")]
    pub reply_ttl: Duration,
    /// Absolute lifetime of a computed reply.
    #[serde(with = "seconds")]
    pub reply_max_age: Duration,
    /// Maximum number of computed replies kept.
    pub reply_capacity: u64,
    /// Calendar days covered by the chart series.
    pub chart_days: u32,
    /// Number of tracker tags shown in the trending reply.
    pub trending_count: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(8),
            refresh_period: Duration::from_secs(24 * 60 * 60),
            decay_period: Duration::from_secs(60 * 60),
            decay_factor: 0.5,
            prune_floor: 0.01,
            reply_ttl: Duration::from_secs(10 * 60),
            reply_max_age: Duration::from_secs(30 * 60),
            reply_capacity: 1024,
            chart_days: 30,
            trending_count: 5,
        }
    }
}

impl RouterConfig {
    /// Defaults overlaid with `ROUTER_*` environment variables.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `ROUTER_PROVIDER_TIMEOUT_SECS` | `provider_timeout` |
    /// | `ROUTER_REFRESH_PERIOD_SECS` | `refresh_period` |
    /// | `ROUTER_DECAY_PERIOD_SECS` | `decay_period` |
    /// | `ROUTER_DECAY_FACTOR` | `decay_factor` |
    /// | `ROUTER_PRUNE_FLOOR` | `prune_floor` |
    /// | `ROUTER_REPLY_TTL_SECS` | `reply_ttl` |
    /// | `ROUTER_REPLY_MAX_AGE_SECS` | `reply_max_age` |
    /// | `ROUTER_REPLY_CAPACITY` | `reply_capacity` |
    /// | `ROUTER_CHART_DAYS` | `chart_days` |
    /// | `ROUTER_TRENDING_COUNT` | `trending_count` |
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidParameter`] if a variable does not parse
    /// or the resulting configuration fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        let secs = |key: &str, target: &mut Duration| -> Result<()> {
            if let Some(raw) = lookup(key) {
                *target = Duration::from_secs(parse(key, &raw)?);
            }
            Ok(())
        };
        secs("ROUTER_PROVIDER_TIMEOUT_SECS", &mut config.provider_timeout)?;
        secs("ROUTER_REFRESH_PERIOD_SECS", &mut config.refresh_period)?;
        secs("ROUTER_DECAY_PERIOD_SECS", &mut config.decay_period)?;
        secs("ROUTER_REPLY_TTL_SECS", &mut config.reply_ttl)?;
        secs("ROUTER_REPLY_MAX_AGE_SECS", &mut config.reply_max_age)?;

        if let Some(raw) = lookup("ROUTER_DECAY_FACTOR") {
            config.decay_factor = parse("ROUTER_DECAY_FACTOR", &raw)?;
        }
        if let Some(raw) = lookup("ROUTER_PRUNE_FLOOR") {
            config.prune_floor = parse("ROUTER_PRUNE_FLOOR", &raw)?;
        }
        if let Some(raw) = lookup("ROUTER_REPLY_CAPACITY") {
            config.reply_capacity = parse("ROUTER_REPLY_CAPACITY", &raw)?;
        }
        if let Some(raw) = lookup("ROUTER_CHART_DAYS") {
            config.chart_days = parse("ROUTER_CHART_DAYS", &raw)?;
        }
        if let Some(raw) = lookup("ROUTER_TRENDING_COUNT") {
            config.trending_count = parse("ROUTER_TRENDING_COUNT", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(RouterError::InvalidParameter(msg.to_string()));

        if !(self.decay_factor > 0.0 && self.decay_factor < 1.0) {
            return invalid("decay_factor must be strictly between 0 and 1");
        }
        if !(self.prune_floor.is_finite() && self.prune_floor >= 0.0) {
            return invalid("prune_floor must be a non-negative number");
        }
        if self.refresh_period.is_zero() || self.decay_period.is_zero() {
            return invalid("scheduled periods must be non-zero");
        }
        if self.reply_ttl.is_zero() {
            return invalid("reply_ttl must be non-zero");
        }
        if self.reply_capacity == 0 {
            return invalid("reply_capacity must be positive");
        }
        if self.chart_days == 0 {
            return invalid("chart_days must be positive");
        }
        Ok(())
    }

    /// The provider timeout clamped into the supported range.
    #[must_use]
    pub fn effective_provider_timeout(&self) -> Duration {
        self.provider_timeout
            .clamp(MIN_PROVIDER_TIMEOUT, MAX_PROVIDER_TIMEOUT)
    }
}

fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| RouterError::InvalidParameter(format!("{key}={raw:?} is not valid")))
}

/// Serde adapter for durations stored as whole seconds.
mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_secs())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = RouterConfig::default();
        config.validate().unwrap();
        assert_eq!(config.effective_provider_timeout(), Duration::from_secs(8));
    }

    #[test]
    fn test_timeout_is_clamped() {
        let mut config = RouterConfig {
            provider_timeout: Duration::from_secs(60),
            ..Default::default()
        };
        assert_eq!(config.effective_provider_timeout(), MAX_PROVIDER_TIMEOUT);

        config.provider_timeout = Duration::from_millis(10);
        assert_eq!(config.effective_provider_timeout(), MIN_PROVIDER_TIMEOUT);
    }

    #[test]
    fn test_deserialize_seconds_with_defaults() {
        let config: RouterConfig =
            serde_json::from_str(r#"{"decay_period": 120, "trending_count": 3}"#).unwrap();
        assert_eq!(config.decay_period, Duration::from_secs(120));
        assert_eq!(config.trending_count, 3);
        assert_eq!(config.chart_days, 30);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["refresh_period"], 86_400);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("ROUTER_DECAY_FACTOR", "0.25"),
            ("ROUTER_REFRESH_PERIOD_SECS", " 3600 "),
        ]
        .into_iter()
        .collect();

        let config = RouterConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.decay_factor, 0.25);
        assert_eq!(config.refresh_period, Duration::from_secs(3600));
        assert_eq!(config.prune_floor, 0.01);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let garbage = RouterConfig::from_lookup(|k| {
            (k == "ROUTER_CHART_DAYS").then(|| "thirty".to_string())
        });
        assert!(matches!(garbage, Err(RouterError::InvalidParameter(_))));

        let out_of_range = RouterConfig::from_lookup(|k| {
            (k == "ROUTER_DECAY_FACTOR").then(|| "1.5".to_string())
        });
        assert!(matches!(out_of_range, Err(RouterError::InvalidParameter(_))));
    }
}
