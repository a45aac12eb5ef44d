#![deny(unused)]
//! SportsQuery - free-text sports questions answered from public data providers.
//!
//! Resolves a question into a domain, action and slots, serves it from the
//! query cache when possible, and otherwise calls the provider behind a
//! per-provider rate limit.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use sports_query_core::config::AppConfig;
use sports_query_core::{Action, CacheStore, Domain, IntentResolver, Query, SourceClient};
use sports_query_gateway::{Dispatcher, KeywordResolver, QueryGateway, Vocabulary};
use sports_query_source::RateLimitedSourceClient;
use sports_query_store::TieredCacheStore;

#[derive(Parser)]
#[command(name = "sportsquery", about = "Answer sports questions from cached provider data", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question.
    Ask {
        /// Question text, e.g. "2023年F1车手积分榜".
        text: Vec<String>,

        /// Treat the text as a voice transcript and keep it in the history.
        #[arg(long)]
        voice: bool,
    },

    /// Show the resolved intent and provider request without calling it.
    Parse {
        text: Vec<String>,
    },

    /// List previously answered queries for an action.
    Options {
        /// motorsport, football or basketball.
        domain: Domain,
        /// e.g. standings, driver_standings, team_schedule.
        action: Action,
    },

    /// Show a cached answer by its key.
    Show {
        /// Key fingerprint as printed by `ask` or `options`.
        key: String,
    },

    /// Drop cached entries, optionally for one domain.
    Clear {
        domain: Option<Domain>,
    },

    /// Drop expired entries.
    Evict,

    /// Read questions from stdin, one per line.
    Repl {
        #[arg(long)]
        voice: bool,
    },
}

#[derive(Serialize)]
struct Plan<'a> {
    intent: &'a sports_query_core::Intent,
    request: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load().context("Failed to load configuration")?;
    sports_query_gateway::configure_tracing(config.logging.json)?;

    tracing::debug!("Starting SportsQuery v{}", env!("CARGO_PKG_VERSION"));

    let gateway = Arc::new(build_gateway(&config).await?);

    match cli.command {
        Commands::Ask { text, voice } => {
            let query = make_query(text.join(" "), voice);
            print_json(&gateway.ask(&query).await)?;
        }
        Commands::Parse { text } => {
            let (intent, request) = gateway.plan(&text.join(" "))?;
            print_json(&Plan {
                intent: &intent,
                request: request.to_string(),
            })?;
        }
        Commands::Options { domain, action } => {
            print_json(&gateway.options(domain, action).await?)?;
        }
        Commands::Show { key } => {
            print_json(&gateway.replay(&key).await)?;
        }
        Commands::Clear { domain } => {
            let removed = gateway.clear(domain).await?;
            print_json(&serde_json::json!({ "removed": removed }))?;
        }
        Commands::Evict => {
            let evicted = gateway.evict_expired().await?;
            print_json(&serde_json::json!({ "evicted": evicted }))?;
        }
        Commands::Repl { voice } => {
            let sweeper = match config.gateway.sweep_interval_secs {
                0 => None,
                secs => Some(gateway.spawn_sweeper(Duration::from_secs(secs))),
            };

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "quit" || line == "exit" {
                    break;
                }
                print_json(&gateway.ask(&make_query(line.to_string(), voice)).await)?;
            }

            if let Some(handle) = sweeper {
                handle.abort();
            }
        }
    }

    Ok(())
}

/// Wire resolver, dispatcher, provider client and cache from configuration.
async fn build_gateway(config: &AppConfig) -> anyhow::Result<QueryGateway> {
    let vocabulary = Arc::new(Vocabulary::standard());

    let resolver: Arc<dyn IntentResolver> = Arc::new(KeywordResolver::new(vocabulary.clone()));
    let dispatcher = Arc::new(Dispatcher::new(vocabulary.clone()));
    let source: Arc<dyn SourceClient> = Arc::new(RateLimitedSourceClient::from_config(config)?);

    let store = TieredCacheStore::open(&config.cache)
        .await
        .context("Failed to open query cache")?;
    tracing::info!(
        entries = store.hot().len(),
        path = ?config.cache.database_path,
        "Query cache ready"
    );
    let store: Arc<dyn CacheStore> = Arc::new(store);

    let gateway = QueryGateway::new(resolver, dispatcher, source, store, vocabulary)?
        .with_inflight_timeout(config.inflight_timeout());
    Ok(gateway)
}

fn make_query(text: String, voice: bool) -> Query {
    if voice {
        Query::voice(text)
    } else {
        Query::typed(text)
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
