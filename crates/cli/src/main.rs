//! PhotoQueue CLI - Operator command line for the PhotoQueue daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9630";

#[derive(Parser)]
#[command(name = "photoqueue")]
#[command(about = "PhotoQueue station CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "PHOTOQUEUE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Operator or admin token
    #[arg(long, env = "PHOTOQUEUE_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Admit a customer to the back of the queue
    Admit {
        /// Customer name
        name: String,

        /// Number of photos
        #[arg(short = 'n', long)]
        photos: u32,

        /// Group or party label
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Start serving a waiting entry
    Begin { id: String },

    /// Finish the in-service entry
    Complete {
        id: String,

        /// cash, electronic (or qris)
        #[arg(short, long)]
        payment: String,
    },

    /// Cancel a waiting or in-service entry
    Cancel { id: String },

    /// Set an entry's status directly (admin)
    Force {
        id: String,

        /// waiting, inService, done or cancelled
        target: String,

        /// Required when the target is done
        #[arg(short, long)]
        payment: Option<String>,
    },

    /// Remove every entry (admin)
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Show the current queue
    Queue {
        /// Include done and cancelled entries
        #[arg(short, long)]
        all: bool,
    },

    /// Show counts and revenue (admin)
    Stats,

    /// Change the operational status: open, break or closed
    SetStatus { status: String },

    /// Change the current location and/or the preset list
    SetLocation {
        location: Option<String>,

        /// Comma separated preset names
        #[arg(long, value_delimiter = ',')]
        presets: Option<Vec<String>>,
    },

    /// Change the price per photo for future admissions (admin)
    SetPrice { price: u64 },

    /// Redraw the queue whenever it changes
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    id: String,
    name: String,
    group: Option<String>,
    photo_count: u32,
    total_price: u64,
    status: String,
    payment_method: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    revision: u64,
    entries: Vec<Entry>,
    status: String,
    location: String,
    preset_locations: Vec<String>,
    unit_price: u64,
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "#")]
    position: String,
    id: String,
    name: String,
    group: String,
    photos: u32,
    total: u64,
    status: String,
    payment: String,
}

impl EntryRow {
    fn new(position: Option<usize>, entry: Entry) -> Self {
        Self {
            position: position.map(|p| p.to_string()).unwrap_or_default(),
            id: entry.id,
            name: entry.name,
            group: entry.group.unwrap_or_default(),
            photos: entry.photo_count,
            total: entry.total_price,
            status: entry.status,
            payment: entry.payment_method.unwrap_or_default(),
        }
    }
}

struct RpcClient {
    url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl RpcClient {
    async fn call(&self, method: &str, mut params: Value) -> Result<Value> {
        if let (Some(token), Some(fields)) = (&self.token, params.as_object_mut()) {
            fields.insert("token".to_string(), json!(token));
        }

        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        let response: JsonRpcResponse = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .context("Failed to connect to daemon")?
            .json()
            .await
            .context("Failed to parse response")?;

        if let Some(error) = response.error {
            anyhow::bail!("RPC error ({}): {}", error.code, error.message);
        }

        response
            .result
            .ok_or_else(|| anyhow::anyhow!("No result in response"))
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let result = self.call("queue.snapshot.v1", json!({})).await?;
        serde_json::from_value(result).context("Unexpected snapshot shape")
    }
}

fn print_entry(headline: &str, result: Value) -> Result<()> {
    let entry: Entry = serde_json::from_value(result)?;
    println!("{}", headline.green().bold());
    println!();
    println!("{}", Table::new(vec![EntryRow::new(None, entry)]));
    Ok(())
}

fn print_snapshot(snapshot: Snapshot, all: bool) {
    let status = match snapshot.status.as_str() {
        "open" => snapshot.status.green(),
        "break" => snapshot.status.yellow(),
        _ => snapshot.status.red(),
    };
    println!(
        "{} {}   {} {}   {} {}   {} {}",
        "Status:".bold(),
        status,
        "Location:".bold(),
        if snapshot.location.is_empty() {
            "-"
        } else {
            snapshot.location.as_str()
        },
        "Price/photo:".bold(),
        snapshot.unit_price,
        "Revision:".bold(),
        snapshot.revision
    );
    if !snapshot.preset_locations.is_empty() {
        println!("{} {}", "Presets:".bold(), snapshot.preset_locations.join(", "));
    }
    println!();

    let mut position = 0;
    let rows: Vec<EntryRow> = snapshot
        .entries
        .into_iter()
        .filter_map(|entry| {
            let active = entry.status == "waiting" || entry.status == "inService";
            if active {
                position += 1;
                Some(EntryRow::new(Some(position), entry))
            } else if all {
                Some(EntryRow::new(None, entry))
            } else {
                None
            }
        })
        .collect();

    if rows.is_empty() {
        println!("{}", "Queue is empty".yellow());
    } else {
        println!("{}", Table::new(rows));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let rpc = RpcClient {
        url: cli.rpc_url.clone(),
        token: cli.token.clone(),
        http: reqwest::Client::new(),
    };

    match cli.command {
        Commands::Admit {
            name,
            photos,
            group,
        } => {
            let params = json!({
                "name": name,
                "group": group,
                "photoCount": photos,
            });
            let result = rpc.call("queue.admit.v1", params).await?;
            print_entry("✓ Entry admitted", result)?;
        }

        Commands::Begin { id } => {
            let result = rpc
                .call("queue.begin_service.v1", json!({ "id": id }))
                .await?;
            print_entry("✓ Entry in service", result)?;
        }

        Commands::Complete { id, payment } => {
            let params = json!({ "id": id, "paymentMethod": payment });
            let result = rpc.call("queue.complete.v1", params).await?;
            print_entry("✓ Entry done", result)?;
        }

        Commands::Cancel { id } => {
            let result = rpc.call("queue.cancel.v1", json!({ "id": id })).await?;
            print_entry("✓ Entry cancelled", result)?;
        }

        Commands::Force {
            id,
            target,
            payment,
        } => {
            let params = json!({
                "id": id,
                "target": target,
                "paymentMethod": payment,
            });
            let result = rpc.call("admin.force.v1", params).await?;
            print_entry("✓ Entry status forced", result)?;
        }

        Commands::Reset { yes } => {
            if !yes {
                println!(
                    "{}",
                    "Reset removes every entry and cannot be undone. Re-run with --yes.".yellow()
                );
                return Ok(());
            }
            let result = rpc.call("admin.reset.v1", json!({})).await?;
            println!(
                "{}",
                format!("✓ Queue reset, {} entries removed", result["removed"])
                    .green()
                    .bold()
            );
        }

        Commands::Queue { all } => {
            let snapshot = rpc.snapshot().await?;
            print_snapshot(snapshot, all);
        }

        Commands::Stats => {
            println!("{}", "Station Statistics".cyan().bold());
            println!();

            match rpc.call("admin.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "Waiting:".bold(), stats["waiting"]);
                    println!("  {} {}", "In service:".bold(), stats["inService"]);
                    println!("  {} {}", "Done:".bold(), stats["done"]);
                    println!("  {} {}", "Cancelled:".bold(), stats["cancelled"]);
                    println!();
                    println!("  {} {}", "Revenue:".bold(), stats["totalRevenue"]);
                    println!("  {} {}", "  Cash:".bold(), stats["cashRevenue"]);
                    println!("  {} {}", "  Electronic:".bold(), stats["electronicRevenue"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::SetStatus { status } => {
            let result = rpc
                .call("status.set.v1", json!({ "status": status }))
                .await?;
            println!(
                "{}",
                format!("✓ Status is now {}", result["status"]).green().bold()
            );
        }

        Commands::SetLocation { location, presets } => {
            let params = json!({ "location": location, "presets": presets });
            let result = rpc.call("location.set.v1", params).await?;
            println!(
                "{}",
                format!("✓ Location is now {}", result["location"])
                    .green()
                    .bold()
            );
            println!("  {} {}", "Presets:".bold(), result["presetLocations"]);
        }

        Commands::SetPrice { price } => {
            let result = rpc
                .call("pricing.set.v1", json!({ "unitPrice": price }))
                .await?;
            println!(
                "{}",
                format!("✓ Price per photo is now {}", result["unitPrice"])
                    .green()
                    .bold()
            );
        }

        Commands::Watch { interval_ms } => {
            let mut last_revision = None;
            loop {
                match rpc.snapshot().await {
                    Ok(snapshot) => {
                        if last_revision != Some(snapshot.revision) {
                            last_revision = Some(snapshot.revision);
                            // Clear screen and home the cursor
                            print!("\x1B[2J\x1B[H");
                            print_snapshot(snapshot, false);
                        }
                    }
                    Err(e) => println!("  {} {}", "✗".red(), e),
                }
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            }
        }
    }

    Ok(())
}
