//! Undis CLI Client
//!
//! Command-line interface for interacting with Undis.

use clap::{Args as ClapArgs, Parser, Subcommand};
use undis::config::DEFAULT_PROMPT;
use undis::network::Client;
use undis::protocol::StorageOp;

/// Undis CLI
#[derive(Parser, Debug)]
#[command(name = "undis-cli")]
#[command(about = "CLI for the Undis key-value cache")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Prompt the server sends before each command
    #[arg(long, default_value = DEFAULT_PROMPT)]
    prompt: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get values by key
    Get {
        /// Keys to fetch
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Store a value unconditionally
    Set(StoreArgs),

    /// Store a value only if the key is absent
    Add(StoreArgs),

    /// Store a value only if the key is present
    Replace(StoreArgs),

    /// Append to an existing value
    Append(StoreArgs),

    /// Prepend to an existing value
    Prepend(StoreArgs),

    /// Delete a key
    Delete {
        /// The key to delete
        key: String,
    },
}

#[derive(ClapArgs, Debug)]
struct StoreArgs {
    /// The key to store under
    key: String,

    /// The value to store
    value: String,

    /// Opaque client flags
    #[arg(long, default_value = "0")]
    flags: u32,

    /// Expiration: 0 = never, up to 30 days = relative seconds, otherwise unix time
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    exptime: i64,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = execute(&args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn execute(args: &Args) -> undis::Result<()> {
    let mut client = Client::connect(&args.server, &args.prompt)?;

    match &args.command {
        Commands::Get { keys } => {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            for value in client.get(&keys)? {
                println!(
                    "{} (flags={}): {}",
                    value.key,
                    value.flags,
                    String::from_utf8_lossy(&value.data)
                );
            }
        }
        Commands::Set(store) => run_store(&mut client, StorageOp::Set, store)?,
        Commands::Add(store) => run_store(&mut client, StorageOp::Add, store)?,
        Commands::Replace(store) => run_store(&mut client, StorageOp::Replace, store)?,
        Commands::Append(store) => run_store(&mut client, StorageOp::Append, store)?,
        Commands::Prepend(store) => run_store(&mut client, StorageOp::Prepend, store)?,
        Commands::Delete { key } => {
            let deleted = client.delete(key)?;
            println!("{}", if deleted { "DELETED" } else { "NOT_FOUND" });
        }
    }

    client.quit()
}

fn run_store(client: &mut Client, op: StorageOp, args: &StoreArgs) -> undis::Result<()> {
    let stored = client.store(op, &args.key, args.flags, args.exptime, args.value.as_bytes())?;
    println!("{}", if stored { "STORED" } else { "NOT_STORED" });
    Ok(())
}
