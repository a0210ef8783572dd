//! KeyTrie CLI
//!
//! Command-line interface for inspecting and editing a KeyTrie database.
//! Every command runs in its own transaction; mutating commands commit.

use clap::{Parser, Subcommand};
use keytrie::{Config, Engine, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// KeyTrie CLI
#[derive(Parser, Debug)]
#[command(name = "keytrie-cli")]
#[command(about = "CLI for the KeyTrie id allocator and key index")]
#[command(version)]
struct Args {
    /// Database file
    #[arg(short, long, default_value = "./keytrie_data/keytrie.redb")]
    db: String,

    /// Max key segment size in bytes (fixed when the database is created)
    #[arg(short, long, default_value = "128")]
    segment_size: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Allocate ids
    Alloc {
        /// Number of contiguous ids requested
        #[arg(short, long, default_value = "1")]
        len: u64,
    },

    /// Free previously allocated ids
    Free {
        /// First id of the range
        id: u64,

        /// Number of ids in the range
        #[arg(short, long, default_value = "1")]
        len: u64,
    },

    /// List free extents
    Extents,

    /// Store a value under a key
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Get the value stored under a key
    Get {
        /// The key to get
        key: String,
    },

    /// Check whether a key is stored
    Exists {
        /// The key to check
        key: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Store data under an id
    DataSet {
        /// The id to store under
        id: u64,

        /// The data to store
        value: String,
    },

    /// Get the data stored under an id
    DataGet {
        /// The id to read
        id: u64,
    },

    /// Print table statistics
    Stats,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,keytrie=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config = Config::builder()
        .db_path(&args.db)
        .max_segment_size(args.segment_size)
        .build();

    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&engine, args.command) {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

fn run(engine: &Engine, command: Commands) -> Result<()> {
    match command {
        Commands::Alloc { len } => {
            let txn = engine.begin_write()?;
            let granted = engine.allocator().allocate(&txn, len)?;
            txn.commit()?;
            match granted {
                Some(extent) => println!("{} {}", extent.start, extent.length),
                None => println!("(exhausted)"),
            }
        }
        Commands::Free { id, len } => {
            let txn = engine.begin_write()?;
            engine.allocator().free(&txn, id, len)?;
            txn.commit()?;
            println!("OK");
        }
        Commands::Extents => {
            let txn = engine.begin_read()?;
            for extent in engine.allocator().free_extents(&txn)? {
                println!("{} {}", extent.start, extent.length);
            }
        }
        Commands::Set { key, value } => {
            let txn = engine.begin_write()?;
            engine.index().set(&txn, key.as_bytes(), value.as_bytes())?;
            txn.commit()?;
            println!("OK");
        }
        Commands::Get { key } => {
            let txn = engine.begin_read()?;
            match engine.index().get(&txn, key.as_bytes())? {
                Some(value) => println!("{}", String::from_utf8_lossy(&value)),
                None => println!("(nil)"),
            }
        }
        Commands::Exists { key } => {
            let txn = engine.begin_read()?;
            println!("{}", engine.index().exists(&txn, key.as_bytes())?);
        }
        Commands::Del { key } => {
            let txn = engine.begin_write()?;
            let existed = engine.index().delete(&txn, key.as_bytes())?;
            txn.commit()?;
            println!("{}", if existed { "1" } else { "0" });
        }
        Commands::DataSet { id, value } => {
            let txn = engine.begin_write()?;
            engine.data().set(&txn, id, value.as_bytes())?;
            txn.commit()?;
            println!("OK");
        }
        Commands::DataGet { id } => {
            let txn = engine.begin_read()?;
            match engine.data().get(&txn, id)? {
                Some(value) => println!("{}", String::from_utf8_lossy(&value)),
                None => println!("(nil)"),
            }
        }
        Commands::Stats => {
            let txn = engine.begin_read()?;
            let stats = engine.stats(&txn)?;
            println!("free_extents: {}", stats.free_extents);
            println!("free_ids:     {}", stats.free_ids);
            println!("index_nodes:  {}", stats.index_nodes);
            println!("payloads:     {}", stats.payloads);
        }
    }
    Ok(())
}
