//! Runtime configuration: clap arguments (each with an environment fallback)
//! resolved into a validated [`DashboardConfig`].

use anyhow::ensure;
use clap::Args;
use log::info;
use quake_data::RangeKind;
use quake_feed::query::DEFAULT_FEED_URL;
use std::time::Duration;

/// A range the dashboard charts, and the magnitude floor used to query it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSpec {
    pub kind: RangeKind,
    pub min_magnitude: Option<f64>,
}

impl RangeSpec {
    pub fn with_default_magnitude(kind: RangeKind) -> Self {
        RangeSpec {
            kind,
            min_magnitude: kind.default_min_magnitude(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub feed_url: String,
    pub fetch_timeout: Duration,
    pub probe_timeout: Duration,
    pub cache_ttl: Duration,
    pub retry_attempts: u32,
    /// Attempt `k` waits `k * retry_backoff` before the next one.
    pub retry_backoff: Duration,
    pub top_n: usize,
    pub ranges: Vec<RangeSpec>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            feed_url: DEFAULT_FEED_URL.to_string(),
            fetch_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(3),
            cache_ttl: Duration::from_secs(300),
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(500),
            top_n: 5,
            ranges: vec![
                RangeSpec::with_default_magnitude(RangeKind::Last30Days),
                RangeSpec::with_default_magnitude(RangeKind::Last5Years),
            ],
        }
    }
}

impl DashboardConfig {
    pub fn validate(self) -> anyhow::Result<Self> {
        info!("--- Dashboard configuration ---");
        info!("Feed URL: {}", self.feed_url);
        info!(
            "Ranges: {}",
            self.ranges
                .iter()
                .map(|r| r.kind.code())
                .collect::<Vec<_>>()
                .join(",")
        );
        info!(
            "Timeouts: fetch {:?}, probe {:?}; cache TTL {:?}",
            self.fetch_timeout, self.probe_timeout, self.cache_ttl
        );

        ensure!(!self.feed_url.trim().is_empty(), "feed URL must not be empty");
        ensure!(!self.fetch_timeout.is_zero(), "fetch timeout must be positive");
        ensure!(!self.probe_timeout.is_zero(), "probe timeout must be positive");
        ensure!(self.retry_attempts > 0, "at least one fetch attempt is required");
        ensure!(self.top_n > 0, "top-N must be at least 1");
        ensure!(!self.ranges.is_empty(), "at least one range is required");
        Ok(self)
    }
}

/// Feed and pipeline options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct FeedArgs {
    /// FDSN event query endpoint
    #[arg(long, env = "QUAKE_FEED_URL", default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,

    /// Per-request timeout for feed queries, in seconds
    #[arg(long, env = "QUAKE_FETCH_TIMEOUT_SECS", default_value_t = 10)]
    pub fetch_timeout_secs: u64,

    /// Timeout for the health probe, in seconds
    #[arg(long, env = "QUAKE_PROBE_TIMEOUT_SECS", default_value_t = 3)]
    pub probe_timeout_secs: u64,

    /// How long a complete dashboard view is reused, in seconds
    #[arg(long, env = "QUAKE_CACHE_TTL_SECS", default_value_t = 300)]
    pub cache_ttl_secs: u64,

    /// Attempts per feed query (1 disables retries)
    #[arg(long, env = "QUAKE_RETRY_ATTEMPTS", default_value_t = 3)]
    pub retry_attempts: u32,

    /// Linear backoff step between attempts, in milliseconds
    #[arg(long, env = "QUAKE_RETRY_BACKOFF_MS", default_value_t = 500)]
    pub retry_backoff_ms: u64,

    /// Size of the magnitude leaderboard
    #[arg(long, env = "QUAKE_TOP_N", default_value_t = 5)]
    pub top_n: usize,

    /// Ranges to chart: any of 24h, 7d, 30d, 5y
    #[arg(long, env = "QUAKE_RANGES", value_delimiter = ',', default_value = "30d,5y")]
    pub ranges: Vec<RangeKind>,

    /// Override the per-range magnitude floor for every range
    #[arg(long, env = "QUAKE_MIN_MAGNITUDE")]
    pub min_magnitude: Option<f64>,
}

impl FeedArgs {
    pub fn into_config(self) -> anyhow::Result<DashboardConfig> {
        let mut ranges: Vec<RangeSpec> = Vec::with_capacity(self.ranges.len());
        for kind in self.ranges {
            if ranges.iter().any(|r| r.kind == kind) {
                continue;
            }
            ranges.push(RangeSpec {
                kind,
                min_magnitude: self.min_magnitude.or(kind.default_min_magnitude()),
            });
        }
        DashboardConfig {
            feed_url: self.feed_url,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            retry_attempts: self.retry_attempts,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            top_n: self.top_n,
            ranges,
        }
        .validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        feed: FeedArgs,
    }

    #[test]
    fn test_defaults_match_default_config() {
        let cli = TestCli::try_parse_from(["test"]).unwrap();
        assert_eq!(cli.feed.into_config().unwrap(), DashboardConfig::default());
    }

    #[test]
    fn test_ranges_are_parsed_and_deduplicated() {
        let cli = TestCli::try_parse_from([
            "test",
            "--ranges",
            "24h,30d,24h",
            "--min-magnitude",
            "4",
        ])
        .unwrap();
        let config = cli.feed.into_config().unwrap();
        assert_eq!(
            config.ranges,
            vec![
                RangeSpec {
                    kind: RangeKind::Last24Hours,
                    min_magnitude: Some(4.0)
                },
                RangeSpec {
                    kind: RangeKind::Last30Days,
                    min_magnitude: Some(4.0)
                },
            ]
        );
    }

    #[test]
    fn test_unknown_range_is_rejected() {
        assert!(TestCli::try_parse_from(["test", "--ranges", "1w"]).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = DashboardConfig {
            retry_attempts: 0,
            ..DashboardConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DashboardConfig {
            top_n: 0,
            ..DashboardConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DashboardConfig {
            ranges: Vec::new(),
            ..DashboardConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
