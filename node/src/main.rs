// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # NOVA Storage CLI
//!
//! Entry point for the `nova-storage` binary. Parses CLI arguments,
//! initializes logging, wires an HTTP transport into the query layer and
//! prints results as JSON on stdout.
//!
//! - `query`   - values for one or more keys of a storage item
//! - `prefix`  - every entry under a storage item or partial key
//! - `keys`    - every key under a raw prefix
//! - `child`   - values from a child trie
//! - `key`     - derive storage keys offline
//! - `version` - print build version information

mod cli;
mod http;
mod logging;
mod params;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;

use nova_storage::codec::Encode;
use nova_storage::crypto::StorageHasher;
use nova_storage::query::{
    PrefixKeyEnumerator, QueryOrchestrator, RawDecoder, RegistryDecoder, ResponseDecoder,
};
use nova_storage::registry::{InMemoryTypeRegistry, ShapedValue, TypeShape};
use nova_storage::storage::{BlockHash, StorageKey, StorageKeyFactory, StoragePath};

use cli::{ChildArgs, Commands, ConnectionArgs, ItemArgs, KeysArgs, NovaStorageCli};
use http::HttpTransport;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = NovaStorageCli::parse();
    logging::init_logging(cli.connection.verbose, cli.connection.log_format);

    match cli.command {
        Commands::Query(args) => query_items(&cli.connection, args).await,
        Commands::Prefix(args) => query_prefix(&cli.connection, args).await,
        Commands::Keys(args) => list_keys(&cli.connection, args).await,
        Commands::Child(args) => query_child(&cli.connection, args).await,
        Commands::Key(args) => derive_keys(&cli.connection, args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

async fn query_items(conn: &ConnectionArgs, args: ItemArgs) -> Result<()> {
    let item = resolve_item(conn, &args)?;
    let keys = item_keys(&item.path, &args.params)?;
    let orchestrator = QueryOrchestrator::new(connect(conn)?);
    let at = block_hash(conn)?;

    tracing::info!(path = %item.path, keys = keys.len(), "querying storage item");
    match item.shape {
        Some(shape) => {
            let decoder = RegistryDecoder::new(item.path, shape);
            let responses = orchestrator
                .query_items(&keys, &decoder, at.as_ref())
                .await
                .context("storage query failed")?;
            print_json(&responses)
        }
        None => {
            let responses = orchestrator
                .query_items(&keys, &RawDecoder, at.as_ref())
                .await
                .context("storage query failed")?;
            print_json(&responses)
        }
    }
}

async fn query_prefix(conn: &ConnectionArgs, args: ItemArgs) -> Result<()> {
    let item = resolve_item(conn, &args)?;
    let leading = match args.params.as_slice() {
        [] => Vec::new(),
        [group] => params::parse_group(group)?,
        _ => return Err(anyhow!("prefix takes at most one parameter group")),
    };
    let prefix = StorageKeyFactory::new()
        .partial_key(&item.path, &as_encode(&leading))
        .context("failed to build key prefix")?;
    let orchestrator = QueryOrchestrator::new(connect(conn)?);
    let at = block_hash(conn)?;

    tracing::info!(path = %item.path, prefix = %prefix, "querying storage prefix");
    match item.shape {
        Some(shape) => {
            let decoder = RegistryDecoder::new(item.path, shape);
            let responses = orchestrator
                .query_by_prefix(&prefix, &decoder, at.as_ref())
                .await
                .context("prefix query failed")?;
            print_json(&responses)
        }
        None => {
            let responses = orchestrator
                .query_by_prefix(&prefix, &RawDecoder, at.as_ref())
                .await
                .context("prefix query failed")?;
            print_json(&responses)
        }
    }
}

async fn list_keys(conn: &ConnectionArgs, args: KeysArgs) -> Result<()> {
    let prefix = StorageKey::from_hex(&args.prefix).context("invalid hex prefix")?;
    let at = block_hash(conn)?;
    let keys = PrefixKeyEnumerator::new(connect(conn)?)
        .enumerate(&prefix, at.as_ref())
        .await
        .context("key enumeration failed")?;
    tracing::info!(prefix = %prefix, keys = keys.len(), "enumerated keys");
    print_json(&keys)
}

async fn query_child(conn: &ConnectionArgs, args: ChildArgs) -> Result<()> {
    let child_key = StorageKey::from_hex(&args.child_key).context("invalid hex child key")?;
    let keys = args
        .keys
        .iter()
        .map(|key| StorageKey::from_hex(key).with_context(|| format!("invalid hex key '{}'", key)))
        .collect::<Result<Vec<_>>>()?;
    let orchestrator = QueryOrchestrator::new(connect(conn)?);
    let at = block_hash(conn)?;

    match args.shape.as_deref().map(parse_shape).transpose()? {
        Some(shape) => {
            let decoder = RegistryDecoder::new(StoragePath::new("Child", "Storage"), shape);
            run_child(&orchestrator, &child_key, &keys, &decoder, at.as_ref()).await
        }
        None => run_child(&orchestrator, &child_key, &keys, &RawDecoder, at.as_ref()).await,
    }
}

async fn run_child<D>(
    orchestrator: &QueryOrchestrator,
    child_key: &StorageKey,
    keys: &[StorageKey],
    decoder: &D,
    at: Option<&BlockHash>,
) -> Result<()>
where
    D: ResponseDecoder,
    D::Output: Serialize,
{
    let responses = orchestrator
        .query_child_items(child_key, keys, decoder, at)
        .await
        .context("child storage query failed")?;
    print_json(&responses)
}

fn derive_keys(conn: &ConnectionArgs, args: ItemArgs) -> Result<()> {
    let item = resolve_item(conn, &args)?;
    let keys = item_keys(&item.path, &args.params)?;
    print_json(&keys)
}

fn print_version() {
    println!("nova-storage {}", env!("CARGO_PKG_VERSION"));
    println!(
        "  page size     : {}",
        nova_storage::config::DEFAULT_PAGE_SIZE
    );
    println!("  json-rpc      : {}", nova_storage::config::JSONRPC_VERSION);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A storage path with its hashers and, when known, its value shape.
struct ResolvedItem {
    path: StoragePath,
    shape: Option<TypeShape>,
}

/// Combines the registry entry for `args.path` with command-line overrides.
fn resolve_item(conn: &ConnectionArgs, args: &ItemArgs) -> Result<ResolvedItem> {
    let mut path: StoragePath = args
        .path
        .parse()
        .with_context(|| format!("invalid storage path '{}'", args.path))?;
    let mut shape = None;

    if let Some(registry) = load_registry(conn.registry.as_deref())? {
        if let Some(entry) = registry.entry(&path.name()) {
            path = entry.path.clone();
            shape = Some(entry.shape.clone());
        } else {
            tracing::warn!(path = %path, "storage item not in registry");
        }
    }

    if !args.hashers.is_empty() {
        let hashers = args
            .hashers
            .iter()
            .map(|name| {
                StorageHasher::from_name(name).ok_or_else(|| anyhow!("unknown hasher '{}'", name))
            })
            .collect::<Result<Vec<_>>>()?;
        path = path.with_hashers(hashers);
    }

    if let Some(text) = &args.shape {
        shape = Some(parse_shape(text)?);
    }

    Ok(ResolvedItem { path, shape })
}

/// One key per parameter group; no groups means the plain value key.
///
/// Groups that fail to encode are reported and skipped.
fn item_keys(path: &StoragePath, groups: &[String]) -> Result<Vec<StorageKey>> {
    let parsed: Vec<Vec<ShapedValue>> = if groups.is_empty() {
        vec![Vec::new()]
    } else {
        groups
            .iter()
            .map(|group| params::parse_group(group))
            .collect::<Result<_>>()?
    };
    let refs: Vec<Vec<&dyn Encode>> = parsed.iter().map(|group| as_encode(group)).collect();

    let mut keys = Vec::with_capacity(refs.len());
    for (index, result) in StorageKeyFactory::new()
        .nmap_keys(path, &refs)
        .into_iter()
        .enumerate()
    {
        match result {
            Ok(key) => keys.push(key),
            Err(err) => tracing::warn!(group = index, error = %err, "skipping parameter group"),
        }
    }

    if keys.is_empty() {
        return Err(anyhow!("no storage key could be built for {}", path));
    }
    Ok(keys)
}

fn as_encode(values: &[ShapedValue]) -> Vec<&dyn Encode> {
    values.iter().map(|value| value as &dyn Encode).collect()
}

fn parse_shape(text: &str) -> Result<TypeShape> {
    text.parse()
        .map_err(|e| anyhow!("invalid shape '{}': {}", text, e))
}

fn load_registry(path: Option<&Path>) -> Result<Option<InMemoryTypeRegistry>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let document = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read registry file {}", path.display()))?;
    let registry = InMemoryTypeRegistry::from_json(&document)
        .with_context(|| format!("failed to parse registry file {}", path.display()))?;
    tracing::debug!(path = %path.display(), items = registry.len(), "registry loaded");
    Ok(Some(registry))
}

fn connect(conn: &ConnectionArgs) -> Result<Arc<HttpTransport>> {
    let transport = HttpTransport::new(&conn.rpc_url, Duration::from_millis(conn.timeout_ms))
        .with_context(|| format!("failed to set up transport for {}", conn.rpc_url))?;
    Ok(Arc::new(transport))
}

fn block_hash(conn: &ConnectionArgs) -> Result<Option<BlockHash>> {
    conn.at
        .as_deref()
        .map(|text| {
            text.parse::<BlockHash>()
                .with_context(|| format!("invalid block hash '{}'", text))
        })
        .transpose()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", text);
    Ok(())
}
