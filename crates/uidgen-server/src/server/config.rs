use anyhow::bail;
use clap::{Parser, ValueEnum};
use core::time::Duration;
use uidgen::{Clock, ClockKind, IssuerPool, Layout};

/// Runtime configuration for the `uidgen-server` binary.
///
/// All values are parsed from CLI arguments or environment variables. The
/// defaults mirror a single-node deployment listening on port 1323 with the
/// millisecond clock.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "uidgen-server",
    version,
    about = "An HTTP service issuing time-ordered 64-bit IDs"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:1323"))]
    pub server_addr: String,

    /// Node id embedded in every ID (0..=7).
    ///
    /// Node ids are not negotiated: every process sharing an ID namespace
    /// must be started with a distinct value.
    ///
    /// Environment variable: `NODE_ID`
    #[arg(long, visible_alias = "worker-id", env = "NODE_ID", default_value_t = 1)]
    pub node_id: u64,

    /// Time source used for the timestamp field: `epoch` or `julian`.
    ///
    /// Environment variable: `TIME_PROVIDER`
    #[arg(
        long,
        visible_alias = "time-provider",
        env = "TIME_PROVIDER",
        default_value_t = ClockKind::Epoch
    )]
    pub clock: ClockKind,

    /// Offset subtracted from the clock reading.
    ///
    /// Defaults to 1420070400000 (2015-01-01, in milliseconds) for `epoch`
    /// and 2000100000 (2020-01-01 in `YY DDD SSSSS` form) for `julian`.
    ///
    /// Environment variable: `CLOCK_OFFSET`
    #[arg(long, env = "CLOCK_OFFSET", allow_negative_numbers = true)]
    pub offset: Option<i64>,

    /// Number of issuers in the pool, i.e. the maximum number of requests
    /// generating IDs at the same time (1..=31).
    ///
    /// Environment variable: `NUM_ISSUERS`
    #[arg(long, env = "NUM_ISSUERS", default_value_t = 31)]
    pub num_issuers: usize,

    /// Maximum number of IDs a single request may ask for.
    ///
    /// Environment variable: `MAX_IDS_PER_REQUEST`
    #[arg(long, env = "MAX_IDS_PER_REQUEST", default_value_t = 100_000)]
    pub max_ids_per_request: i64,

    /// How long a request waits for a free issuer before failing with 503.
    /// Zero waits forever.
    ///
    /// Environment variable: `ACQUIRE_TIMEOUT_MS`
    #[arg(long, env = "ACQUIRE_TIMEOUT_MS", default_value_t = 5_000)]
    pub acquire_timeout_ms: u64,

    /// Log output format.
    ///
    /// Environment variable: `LOG_FORMAT`
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-readable output.
    Pretty,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub node_id: u64,
    pub clock_kind: ClockKind,
    pub offset: i64,
    pub num_issuers: usize,
    pub max_ids_per_request: i64,
    pub acquire_timeout: Option<Duration>,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub const fn clock(&self) -> Clock {
        Clock::new(self.clock_kind, self.offset)
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let max_node_id = Layout::DEFAULT.max_node_id();
        let max_issuers = IssuerPool::<Clock>::max_size();

        if args.node_id > max_node_id {
            bail!(
                "NODE_ID ({}) exceeds the node id field (max = {})",
                args.node_id,
                max_node_id
            );
        }

        if args.num_issuers == 0 {
            bail!("NUM_ISSUERS must be greater than 0");
        }

        if args.num_issuers > max_issuers {
            bail!(
                "NUM_ISSUERS ({}) exceeds available issuer id space (max = {})",
                args.num_issuers,
                max_issuers
            );
        }

        if args.max_ids_per_request < 1 {
            bail!("MAX_IDS_PER_REQUEST must be at least 1");
        }

        let acquire_timeout =
            (args.acquire_timeout_ms > 0).then(|| Duration::from_millis(args.acquire_timeout_ms));

        Ok(Self {
            server_addr: args.server_addr,
            node_id: args.node_id,
            clock_kind: args.clock,
            offset: args.offset.unwrap_or(args.clock.default_offset()),
            num_issuers: args.num_issuers,
            max_ids_per_request: args.max_ids_per_request,
            acquire_timeout,
            log_format: args.log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        let args = CliArgs::try_parse_from(std::iter::once("uidgen-server").chain(args.iter().copied()))?;
        ServerConfig::try_from(args)
    }

    #[test]
    fn defaults_match_a_single_epoch_node() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:1323");
        assert_eq!(config.node_id, 1);
        assert_eq!(config.clock_kind, ClockKind::Epoch);
        assert_eq!(config.offset, 1_420_070_400_000);
        assert_eq!(config.num_issuers, 31);
        assert_eq!(config.acquire_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn julian_gets_its_own_default_offset() {
        let config = parse(&["--clock", "julian"]).unwrap();
        assert_eq!(config.clock_kind, ClockKind::Julian);
        assert_eq!(config.offset, 2_000_100_000);

        let config = parse(&["--time-provider", "julian", "--offset", "0"]).unwrap();
        assert_eq!(config.offset, 0);
    }

    #[test]
    fn alias_flag_names_are_accepted() {
        let config = parse(&["--worker-id", "6", "--time-provider", "julian"]).unwrap();
        assert_eq!(config.node_id, 6);
        assert_eq!(config.clock_kind, ClockKind::Julian);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(parse(&["--node-id", "8"]).is_err());
        assert!(parse(&["--num-issuers", "0"]).is_err());
        assert!(parse(&["--num-issuers", "32"]).is_err());
        assert!(parse(&["--max-ids-per-request", "0"]).is_err());
        assert!(parse(&["--clock", "lunar"]).is_err());
    }

    #[test]
    fn zero_timeout_waits_forever() {
        let config = parse(&["--acquire-timeout-ms", "0"]).unwrap();
        assert_eq!(config.acquire_timeout, None);
    }
}
