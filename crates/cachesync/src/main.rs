mod apply;
mod cache;
mod config;
mod interceptor;
mod publisher;
mod storage;
mod subscriber;
mod transport;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::{signal, sync::broadcast};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cachesync_core::cache::{user_key, Cache};
use cachesync_core::event::EventSchema;
use cachesync_core::storage::UserRepository;
use cachesync_core::transport::Transport;
use cachesync_core::user::NewUser;

use crate::{
    cache::MemoryCache, config::Config, interceptor::ChangeInterceptor,
    publisher::EventPublisher, storage::InMemoryRepository, subscriber::EventSubscriber,
    transport::MemoryTransport,
};

/// cachesync - Propagate record store mutations to cache replicas
#[derive(Parser, Debug)]
#[command(name = "cachesync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Redis URL of the cache replica
    #[arg(long, global = true, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Redis URL of the fan-out transport
    #[arg(long, global = true, env = "BROKER_URL")]
    broker_url: Option<String>,

    /// Path to the SQLite record store
    #[arg(long, global = true, env = "SQLITE_PATH")]
    sqlite_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply change events to the cache until SIGINT/SIGTERM
    Consume,
    /// Declare the exchange, queue and binding, then exit
    Declare,
    /// Mutate users in the record store, publishing a change event for each
    #[command(subcommand)]
    User(UserCommand),
    /// Run store, transport, subscriber and cache in-process and print the result
    Demo,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Update a user's name and/or email
    Update {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Soft-delete a user
    Delete {
        #[arg(long)]
        id: u64,
    },
}

impl Cli {
    /// Environment configuration with command line flags on top.
    fn config(&self) -> Config {
        let mut config = Config::from_env();
        if let Some(url) = &self.redis_url {
            config.redis_url = url.clone();
            if self.broker_url.is_none() {
                config.broker_url = url.clone();
            }
        }
        if let Some(url) = &self.broker_url {
            config.broker_url = url.clone();
        }
        if let Some(path) = &self.sqlite_path {
            config.sqlite_path = path.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cachesync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cli.config();
    tracing::debug!(?config, "Configuration loaded");

    match cli.command {
        Command::Consume => consume(&config).await,
        Command::Declare => declare(&config).await,
        Command::User(command) => user(&config, command).await,
        Command::Demo => demo(&config).await,
    }
}

#[cfg(feature = "redis")]
async fn consume(config: &Config) -> Result<()> {
    let cache = Arc::new(cache::RedisCache::new(&config.redis_url).await?);
    let transport = Arc::new(transport::RedisTransport::new(&config.broker_url).await?);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let subscriber = EventSubscriber::new(transport, config.topology(), EventSchema::USER, cache);
    let mut handle = subscriber.start(shutdown_rx).await?;

    tracing::info!("Waiting for change events. To exit press CTRL+C");
    tokio::select! {
        _ = shutdown_signal() => {
            shutdown_tx.send(())?;
            handle.await?;
        }
        result = &mut handle => {
            result?;
            anyhow::bail!("consumer stopped: subscription to {} closed", config.queue_name);
        }
    }

    tracing::info!("Consumer stopped");
    Ok(())
}

#[cfg(not(feature = "redis"))]
async fn consume(_config: &Config) -> Result<()> {
    anyhow::bail!("`consume` needs the `redis` feature")
}

#[cfg(feature = "redis")]
async fn declare(config: &Config) -> Result<()> {
    let transport = Arc::new(transport::RedisTransport::new(&config.broker_url).await?);
    let publisher = EventPublisher::new(transport, config.topology(), EventSchema::USER);
    publisher.declare_topology().await?;

    let topology = publisher.topology();
    tracing::info!(
        exchange = %topology.exchange.name,
        queue = %topology.queue.name,
        "Topology declared"
    );
    Ok(())
}

#[cfg(not(feature = "redis"))]
async fn declare(_config: &Config) -> Result<()> {
    anyhow::bail!("`declare` needs the `redis` feature")
}

#[cfg(all(feature = "redis", feature = "sqlite"))]
async fn user(config: &Config, command: UserCommand) -> Result<()> {
    let store = Arc::new(storage::SqliteRepository::new(&config.sqlite_path).await?);
    let transport = Arc::new(transport::RedisTransport::new(&config.broker_url).await?);
    let publisher = Arc::new(
        EventPublisher::new(transport, config.topology(), EventSchema::USER)
            .with_timeout(config.publish_timeout()),
    );
    let repository = ChangeInterceptor::new(store, publisher);

    run_user_command(&repository, command).await
}

#[cfg(not(all(feature = "redis", feature = "sqlite")))]
async fn user(_config: &Config, _command: UserCommand) -> Result<()> {
    anyhow::bail!("`user` needs the `redis` and `sqlite` features")
}

/// Executes one user mutation and prints the stored record as JSON.
async fn run_user_command<R: UserRepository>(repository: &R, command: UserCommand) -> Result<()> {
    let user = match command {
        UserCommand::Create { name, email } => {
            repository.create_user(&NewUser::new(name, email)).await?
        }
        UserCommand::Update { id, name, email } => {
            let mut user = repository
                .get_user(id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("user {id} not found"))?;
            if let Some(name) = name {
                user = user.with_name(name);
            }
            if let Some(email) = email {
                user = user.with_email(email);
            }
            repository.update_user(&user).await?
        }
        UserCommand::Delete { id } => repository.delete_user(id).await?,
    };

    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}

/// Runs a create/update/delete sequence through in-memory backends.
async fn demo(config: &Config) -> Result<()> {
    let transport = Arc::new(MemoryTransport::new());
    let cache = Arc::new(MemoryCache::new(config.cache_max_entries));
    let topology = config.topology();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = EventSubscriber::new(
        transport.clone(),
        topology.clone(),
        EventSchema::USER,
        cache.clone(),
    )
    .start(shutdown_rx)
    .await?;

    let publisher = Arc::new(
        EventPublisher::new(transport.clone(), topology, EventSchema::USER)
            .with_timeout(config.publish_timeout()),
    );
    let repository = ChangeInterceptor::new(Arc::new(InMemoryRepository::new()), publisher);

    let alice = repository
        .create_user(&NewUser::new("Alice", "alice@example.com"))
        .await?;
    let bob = repository
        .create_user(&NewUser::new("Bob", "bob@example.com"))
        .await?;
    repository
        .update_user(&alice.clone().with_name("Alicia"))
        .await?;
    repository.delete_user(bob.id).await?;

    // Unknown actions are dropped without stopping the consumer.
    transport
        .publish(&config.exchange_name, "", br#"{"action":"archive","user":{"ID":1}}"#)
        .await?;

    shutdown_tx.send(())?;
    handle.await?;

    println!("cache entries: {}", cache.len().await);
    println!(
        "undelivered payloads: {}",
        transport.pending(&config.queue_name).await.unwrap_or_default()
    );
    for user in [&alice, &bob] {
        let key = user_key(user.id);
        match cache.get(&key).await? {
            Some(bytes) => println!("{key} => {}", String::from_utf8_lossy(&bytes)),
            None => println!("{key} => (absent)"),
        }
    }
    Ok(())
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
#[cfg_attr(not(feature = "redis"), allow(dead_code))]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
