// Publisher account provisioning helper
//
// Design Decision: Accounts are provisioned out of band; this tool only produces hashes.
//
// Usage:
//   hash-password LY001=secret sa=other > users.json          (CREDENTIALS_FILE)
//   hash-password --records LY001=secret                      (KV values for user:<name>)

use anyhow::{bail, Context, Result};
use clap::Parser;
use newsdesk_control_plane::auth::password::hash_password;
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "hash-password")]
#[command(about = "Hash publisher passwords with Argon2id")]
#[command(version)]
struct Cli {
    /// Emit `{"password_hash": ...}` records instead of bare hashes
    #[arg(long)]
    records: bool,

    /// Accounts as `username=password`
    #[arg(required = true, value_name = "USERNAME=PASSWORD")]
    accounts: Vec<String>,
}

fn parse_account(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((username, password)) if !username.is_empty() && !password.is_empty() => {
            Ok((username, password))
        }
        _ => bail!("Expected USERNAME=PASSWORD, got {:?}", raw),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut users = Map::new();
    for raw in &cli.accounts {
        let (username, password) = parse_account(raw)?;
        let hash = hash_password(password)
            .with_context(|| format!("Failed to hash password for {}", username))?;
        let value = if cli.records {
            json!({ "password_hash": hash })
        } else {
            Value::String(hash)
        };
        users.insert(username.to_string(), value);
    }

    let output = serde_json::to_string_pretty(&Value::Object(users))?;
    println!("{}", output);
    Ok(())
}
