//! Server configuration.
//!
//! コマンドライン引数（`TSUDOI_*` 環境変数でも指定可）を [`ServerConfig`] に変換する。

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{
    infrastructure::{broker::DEFAULT_BROKER_CAPACITY, message_pusher::DispatcherConfig},
    ui::{ChatConfig, HistoryConfig},
};

#[derive(Parser, Debug, Clone)]
#[command(name = "tsudoi-server")]
#[command(about = "Event catalog and real-time event chat server", long_about = None)]
pub struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TSUDOI_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "TSUDOI_PORT", default_value = "8080")]
    pub port: u16,

    /// HS256 secret used to verify bearer tokens
    #[arg(long, env = "TSUDOI_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Lifetime in seconds of the tokens issued by `POST /login`
    #[arg(long, env = "TSUDOI_TOKEN_TTL_SECS", default_value = "3600")]
    pub token_ttl_secs: u64,

    /// Number of recent messages replayed when joining a chat
    #[arg(long, env = "TSUDOI_REPLAY_LIMIT", default_value = "50")]
    pub replay_limit: usize,

    /// Seconds to wait for the history query before giving up on replay
    #[arg(long, env = "TSUDOI_REPLAY_TIMEOUT_SECS", default_value = "5")]
    pub replay_timeout_secs: u64,

    /// Frames buffered per connection before live messages are dropped
    #[arg(long, env = "TSUDOI_OUTBOUND_QUEUE_CAPACITY", default_value = "64")]
    pub outbound_queue_capacity: usize,

    /// Broker subscribe attempts before the server gives up
    #[arg(long, env = "TSUDOI_SUBSCRIBE_MAX_ATTEMPTS", default_value = "5")]
    pub subscribe_max_attempts: u32,

    /// Initial subscribe retry backoff in milliseconds (doubles per failure)
    #[arg(long, env = "TSUDOI_SUBSCRIBE_BACKOFF_MS", default_value = "500")]
    pub subscribe_backoff_ms: u64,

    /// Append-only JSON lines message log (in-memory when omitted)
    #[arg(long, env = "TSUDOI_MESSAGE_LOG")]
    pub message_log: Option<PathBuf>,

    /// Read cache TTL in seconds (entries never expire when omitted)
    #[arg(long, env = "TSUDOI_CACHE_TTL_SECS")]
    pub cache_ttl_secs: Option<u64>,

    /// Capacity of the in-process broker channel
    #[arg(long, env = "TSUDOI_BROKER_CAPACITY", default_value_t = DEFAULT_BROKER_CAPACITY)]
    pub broker_capacity: usize,

    /// Redis URL for cross-process fan-out (in-process broker when omitted)
    #[cfg(feature = "redis")]
    #[arg(long, env = "TSUDOI_REDIS_URL")]
    pub redis_url: Option<String>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "TSUDOI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Print a bearer token for the given user id and exit (development only)
    #[arg(long, value_name = "USER_ID")]
    pub print_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerConfig {
    InProcess {
        capacity: usize,
    },
    #[cfg(feature = "redis")]
    Redis {
        url: String,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub history: HistoryConfig,
    pub chat: ChatConfig,
    pub dispatcher: DispatcherConfig,
    pub message_log: Option<PathBuf>,
    pub cache_ttl: Option<Duration>,
    pub broker: BrokerConfig,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        #[cfg(feature = "redis")]
        let broker = match args.redis_url {
            Some(url) => BrokerConfig::Redis { url },
            None => BrokerConfig::InProcess {
                capacity: args.broker_capacity,
            },
        };
        #[cfg(not(feature = "redis"))]
        let broker = BrokerConfig::InProcess {
            capacity: args.broker_capacity,
        };

        Self {
            host: args.host,
            port: args.port,
            jwt_secret: args.jwt_secret,
            token_ttl: Duration::from_secs(args.token_ttl_secs),
            history: HistoryConfig {
                limit: args.replay_limit,
                timeout: Duration::from_secs(args.replay_timeout_secs),
            },
            chat: ChatConfig {
                outbound_queue_capacity: args.outbound_queue_capacity,
                ..ChatConfig::default()
            },
            dispatcher: DispatcherConfig {
                max_subscribe_attempts: args.subscribe_max_attempts,
                initial_backoff: Duration::from_millis(args.subscribe_backoff_ms),
                ..DispatcherConfig::default()
            },
            message_log: args.message_log,
            cache_ttl: args.cache_ttl_secs.map(Duration::from_secs),
            broker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // テスト項目: 必須の secret 以外は既定値が使われる
        // given (前提条件):
        let args = Args::try_parse_from(["tsudoi-server", "--jwt-secret", "s3cret"]).unwrap();

        // when (操作):
        let config = ServerConfig::from(args);

        // then (期待する結果):
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.token_ttl, Duration::from_secs(3600));
        assert_eq!(config.history, HistoryConfig::default());
        assert_eq!(config.chat.outbound_queue_capacity, 64);
        assert_eq!(config.dispatcher, DispatcherConfig::default());
        assert_eq!(config.message_log, None);
        assert_eq!(config.cache_ttl, None);
        assert_eq!(
            config.broker,
            BrokerConfig::InProcess {
                capacity: DEFAULT_BROKER_CAPACITY
            }
        );
    }

    #[test]
    fn test_overrides() {
        // テスト項目: 引数で各設定を上書きできる
        let args = Args::try_parse_from([
            "tsudoi-server",
            "--jwt-secret",
            "s3cret",
            "-p",
            "9000",
            "--replay-limit",
            "10",
            "--subscribe-backoff-ms",
            "20",
            "--cache-ttl-secs",
            "30",
            "--message-log",
            "/tmp/messages.jsonl",
            "--token-ttl-secs",
            "60",
        ])
        .unwrap();

        let config = ServerConfig::from(args);

        assert_eq!(config.port, 9000);
        assert_eq!(config.token_ttl, Duration::from_secs(60));
        assert_eq!(config.history.limit, 10);
        assert_eq!(config.dispatcher.initial_backoff, Duration::from_millis(20));
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(30)));
        assert_eq!(
            config.message_log,
            Some(PathBuf::from("/tmp/messages.jsonl"))
        );
    }
}
