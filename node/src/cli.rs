//! # CLI Interface
//!
//! Defines the command-line argument structure for `nova-storage` using
//! `clap` derive. Connection settings are global and can come from the
//! environment; each subcommand maps to one storage operation.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use nova_storage::config::DEFAULT_REQUEST_TIMEOUT_MS;

use crate::logging::LogFormat;

/// Query the storage of a NOVA node over JSON-RPC.
///
/// Keys are derived locally from a storage path and typed parameters,
/// fetched in pages of up to 1000, and decoded with the shapes from a
/// registry file when one is given.
#[derive(Parser, Debug)]
#[command(
    name = "nova-storage",
    about = "Typed storage queries against a NOVA node",
    version,
    propagate_version = true
)]
pub struct NovaStorageCli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Settings shared by every subcommand.
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// JSON-RPC endpoint of the node.
    #[arg(
        long,
        global = true,
        env = "NOVA_RPC_URL",
        default_value = "http://127.0.0.1:9741"
    )]
    pub rpc_url: String,

    /// Per-request timeout in milliseconds.
    #[arg(
        long,
        global = true,
        env = "NOVA_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_MS
    )]
    pub timeout_ms: u64,

    /// Log output format on stderr.
    #[arg(
        long,
        global = true,
        env = "NOVA_LOG_FORMAT",
        value_enum,
        default_value = "pretty",
        ignore_case = true
    )]
    pub log_format: LogFormat,

    /// Raise log verbosity (`-v` info, `-vv` debug, `-vvv` trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// JSON type registry mapping `Module.Item` to hashers and a value shape.
    #[arg(long, global = true, env = "NOVA_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Block hash to pin the query to. Defaults to the node's best block.
    #[arg(long, global = true)]
    pub at: Option<String>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and decode values for one or more keys of a storage item.
    Query(ItemArgs),
    /// Fetch and decode every entry under a storage item (or a partial key).
    Prefix(ItemArgs),
    /// List every key under a raw hex prefix.
    Keys(KeysArgs),
    /// Fetch values from a child trie.
    Child(ChildArgs),
    /// Print the storage keys for an item without contacting the node.
    Key(ItemArgs),
    /// Print version information and exit.
    Version,
}

/// A storage item plus its key parameters.
#[derive(Parser, Debug)]
pub struct ItemArgs {
    /// Storage path, e.g. `System.Account`.
    pub path: String,

    /// Key parameter groups. Each argument is one comma-separated group of
    /// `type:value` parameters (`u32:7`, `str:alice`, `hex:0x0102`,
    /// `bytes:0x0102`, `bool:true`) and yields one key. Write a comma inside
    /// a `str:` value as `\,`.
    pub params: Vec<String>,

    /// Key hashers, one per parameter, when the item is not in the registry.
    #[arg(long = "hasher", value_name = "HASHER")]
    pub hashers: Vec<String>,

    /// Value shape override, e.g. `{nonce: u32, free: u128}`.
    #[arg(long)]
    pub shape: Option<String>,
}

/// Arguments for the `keys` subcommand.
#[derive(Parser, Debug)]
pub struct KeysArgs {
    /// Hex-encoded key prefix.
    pub prefix: String,
}

/// Arguments for the `child` subcommand.
#[derive(Parser, Debug)]
pub struct ChildArgs {
    /// Hex-encoded child trie key.
    pub child_key: String,

    /// Hex-encoded keys inside the child trie.
    #[arg(required = true)]
    pub keys: Vec<String>,

    /// Value shape. Values are printed as raw hex without one.
    #[arg(long)]
    pub shape: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        NovaStorageCli::command().debug_assert();
    }

    #[test]
    fn parses_item_query() {
        let cli = NovaStorageCli::try_parse_from([
            "nova-storage",
            "query",
            "System.Account",
            "hex:0x01",
            "u32:1,u32:2",
            "--hasher",
            "blake3_128_concat",
            "--rpc-url",
            "http://node:9741",
        ])
        .unwrap();

        assert_eq!(cli.connection.rpc_url, "http://node:9741");
        assert_eq!(cli.connection.timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
        assert_eq!(cli.connection.log_format, LogFormat::Pretty);
        assert_eq!(cli.connection.verbose, 0);
        match cli.command {
            Commands::Query(args) => {
                assert_eq!(args.path, "System.Account");
                assert_eq!(args.params, vec!["hex:0x01", "u32:1,u32:2"]);
                assert_eq!(args.hashers, vec!["blake3_128_concat"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn logging_flags() {
        let cli = NovaStorageCli::try_parse_from([
            "nova-storage",
            "-vv",
            "--log-format",
            "JSON",
            "keys",
            "0x26aa",
        ])
        .unwrap();
        assert_eq!(cli.connection.verbose, 2);
        assert_eq!(cli.connection.log_format, LogFormat::Json);
    }
}
