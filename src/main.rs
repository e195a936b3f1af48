//! Guild cache maintenance tool.
//!
//! Connects to Redis and MongoDB with the bot's configuration and runs one
//! operation against the cache layer:
//!
//! - `ping` - check both stores are reachable
//! - `fetch <kind> <id>` - read through the cache and print the record
//! - `invalidate <kind> <id>` - drop a cached record and its index pointers

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use guild_cache::cache::{CachedEntity, RedisStore};
use guild_cache::{CacheContext, Config, Database, Repository, Sources};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Debug, Parser)]
#[command(name = "guild-cache", version, about = "Inspect and repair the guild cache")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check Redis and MongoDB connectivity.
    Ping,
    /// Read a record through the cache and print it as JSON.
    Fetch { kind: Kind, id: String },
    /// Drop a cached record and every index pointer derived from it.
    Invalidate { kind: Kind, id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    GuildConfig,
    ModCase,
    UserLevel,
    Ticket,
    Suggestion,
    LogChannel,
    Entity,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("guild_cache=info,mongodb=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");

    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    let store = RedisStore::connect(&config.redis_url, config.cache.op_timeout).await?;
    let context = CacheContext::new(Arc::new(store), &config.cache, Sources::mongo(&db))?;

    match cli.command {
        Command::Ping => {
            db.ping().await?;
            context.store().ping().await?;
            info!("MongoDB and {} are reachable", context.store().name());
        }
        Command::Fetch { kind, id } => match kind {
            Kind::GuildConfig => print_fetch(&context.guild_configs, &id).await?,
            Kind::ModCase => print_fetch(&context.mod_cases, &id).await?,
            Kind::UserLevel => print_fetch(&context.user_levels, &id).await?,
            Kind::Ticket => print_fetch(&context.tickets, &id).await?,
            Kind::Suggestion => print_fetch(&context.suggestions, &id).await?,
            Kind::LogChannel => print_fetch(&context.log_channels, &id).await?,
            Kind::Entity => print_fetch(&context.entities, &id).await?,
        },
        Command::Invalidate { kind, id } => {
            match kind {
                Kind::GuildConfig => context.guild_configs.cache().invalidate(&id).await?,
                Kind::ModCase => context.mod_cases.cache().invalidate(&id).await?,
                Kind::UserLevel => context.user_levels.cache().invalidate(&id).await?,
                Kind::Ticket => context.tickets.cache().invalidate(&id).await?,
                Kind::Suggestion => context.suggestions.cache().invalidate(&id).await?,
                Kind::LogChannel => context.log_channels.cache().invalidate(&id).await?,
                Kind::Entity => context.entities.cache().invalidate(&id).await?,
            }
            info!("Invalidated {:?} {}", kind, id);
        }
    }

    Ok(())
}

async fn print_fetch<E: CachedEntity>(repo: &Repository<E>, id: &str) -> Result<()> {
    match repo.get(id).await? {
        Some(entity) => println!("{}", serde_json::to_string_pretty(&entity)?),
        None => info!("No {} with id {}", E::TYPE_TAG, id),
    }
    Ok(())
}
