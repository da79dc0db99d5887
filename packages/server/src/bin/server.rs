//! Event catalog and real-time event chat server.
//!
//! Run with:
//! ```not_rust
//! TSUDOI_JWT_SECRET=dev cargo run --bin tsudoi-server
//! TSUDOI_JWT_SECRET=dev cargo run --bin tsudoi-server -- --host 0.0.0.0 --port 3000
//! TSUDOI_JWT_SECRET=dev cargo run --bin tsudoi-server -- --print-token alice
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use tsudoi_server::{
    config::{Args, BrokerConfig, ServerConfig},
    domain::{Broker, MessageStore, UserId},
    infrastructure::{
        auth::{Argon2CredentialHasher, JwtIdentityResolver},
        broker::InProcessBroker,
        cache::InMemoryResponseCache,
        repository::{
            FileMessageStore, InMemoryEventRepository, InMemoryMessageStore,
            InMemoryUserRepository,
        },
    },
    ui::{AppDependencies, AppState, Server},
};
use tsudoi_shared::{logger::setup_logger, time::SystemClock};

const DEV_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let print_token = args.print_token.clone();
    let config = ServerConfig::from(args);

    if let Err(e) = run(config, print_token).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(
    config: ServerConfig,
    print_token: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity_resolver = Arc::new(
        JwtIdentityResolver::new(config.jwt_secret.as_bytes()).with_token_ttl(config.token_ttl),
    );

    if let Some(user_id) = print_token {
        let token = identity_resolver.issue(&UserId::new(user_id)?, DEV_TOKEN_TTL)?;
        println!("{token}");
        return Ok(());
    }

    // Initialize dependencies in order:
    // 1. MessageStore / EventRepository / UserRepository
    // 2. Broker
    // 3. AppState (UseCases)
    // 4. Server

    // 1. Stores
    let message_store: Arc<dyn MessageStore> = match &config.message_log {
        Some(path) => Arc::new(FileMessageStore::open(path).await?),
        None => {
            tracing::warn!("No message log configured, chat history is kept in memory only");
            Arc::new(InMemoryMessageStore::new())
        }
    };
    let event_repository = Arc::new(InMemoryEventRepository::new());
    let user_repository = Arc::new(InMemoryUserRepository::new());

    // 2. Broker
    let broker: Arc<dyn Broker> = match &config.broker {
        BrokerConfig::InProcess { capacity } => {
            tracing::info!(capacity, "Using in-process broker");
            Arc::new(InProcessBroker::new(*capacity))
        }
        #[cfg(feature = "redis")]
        BrokerConfig::Redis { url } => {
            tracing::info!("Using redis broker");
            Arc::new(tsudoi_server::infrastructure::broker::RedisBroker::connect(url).await?)
        }
    };

    // 3. AppState
    let state = Arc::new(AppState::new(
        AppDependencies {
            message_store,
            event_repository,
            user_repository,
            broker: broker.clone(),
            identity_resolver: identity_resolver.clone(),
            token_issuer: identity_resolver,
            credential_hasher: Arc::new(Argon2CredentialHasher::default()),
            response_cache: Arc::new(InMemoryResponseCache::new(config.cache_ttl)),
            clock: Arc::new(SystemClock),
        },
        config.history,
        config.chat,
    ));

    // 4. Create and run the server
    let server = Server::new(state, broker, config.dispatcher);
    server.run(&config.host, config.port).await?;

    Ok(())
}
