use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Management CLI for the Wallet Proxy Router", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:4000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health
    Health,
    /// List every wallet with a proxy entry
    Wallets,
    /// Resolve proxies for the given addresses
    Lookup { addresses: Vec<String> },
    /// Show the wallets an owner controls
    Owner { owner: String },
    /// Replace an owner's wallet list
    SetOwner { owner: String, wallets: Vec<String> },
    /// Assign a proxy to a wallet the owner controls
    SetProxy {
        owner: String,
        wallet: String,
        #[arg(long, default_value = "http")]
        protocol: String,
        #[arg(long)]
        host: String,
        #[arg(long)]
        port: u16,
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Remove a wallet's proxy entry
    RemoveProxy { owner: String, wallet: String },
    /// Replace an owner's roster and proxies from a JSON file of
    /// `[{"address": .., "proxy": {..}}]` items
    Sync {
        owner: String,
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)),
        Commands::Wallets => client.get(format!("{}/wallets", base)),
        Commands::Lookup { addresses } => client
            .post(format!("{}/wallets/lookup", base))
            .json(&json!({ "addresses": addresses })),
        Commands::Owner { owner } => client.get(format!("{}/owners/{}/wallets", base, owner)),
        Commands::SetOwner { owner, wallets } => client
            .put(format!("{}/owners/{}/wallets", base, owner))
            .json(&json!({ "wallets": wallets })),
        Commands::SetProxy {
            owner,
            wallet,
            protocol,
            host,
            port,
            username,
            password,
        } => client
            .put(format!("{}/owners/{}/wallets/{}/proxy", base, owner, wallet))
            .json(&json!({
                "proxy": {
                    "protocol": protocol,
                    "host": host,
                    "port": port,
                    "username": username,
                    "password": password,
                }
            })),
        Commands::RemoveProxy { owner, wallet } => {
            client.delete(format!("{}/owners/{}/wallets/{}/proxy", base, owner, wallet))
        }
        Commands::Sync { owner, file } => client
            .post(format!("{}/owners/{}/sync", base, owner))
            .json(&json!({ "items": read_sync_items(&file)? })),
    };

    print_response(request.send().await?).await
}

/// Load the batch-sync items file; it must hold a JSON array.
fn read_sync_items(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let items: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    if !items.is_array() {
        return Err(format!("{}: expected a JSON array of items", path.display()).into());
    }
    Ok(items)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: router returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
