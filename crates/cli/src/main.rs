//! Playlist Export CLI - request exports and inspect the export queue

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
const ADMIN_KEY_HEADER: &str = "x-admin-key";

#[derive(Parser)]
#[command(name = "playlist-export")]
#[command(about = "Playlist export pipeline CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// HTTP API base URL
    #[arg(long, env = "PLAYLIST_EXPORT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Access token of the requesting user
    #[arg(long, env = "PLAYLIST_EXPORT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Operator key for the admin endpoints
    #[arg(long, env = "EXPORT_ADMIN_KEY", hide_env_values = true)]
    admin_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue an export of a playlist you own
    Export {
        /// Playlist ID
        playlist_id: String,

        /// Where to mail the export
        #[arg(short, long)]
        to: String,
    },

    /// Show export queue depth
    Queue,

    /// List dead-lettered export jobs
    DeadLetters {
        /// Maximum entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: i64,
    },

    /// Put a dead-lettered job back on the queue
    Requeue {
        /// Message ID
        message_id: String,
    },

    /// Check that the API is up
    Health,
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
    message: String,
}

#[derive(Deserialize)]
struct DataBody<T> {
    data: T,
}

#[derive(Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct QueueDepthRow {
    queue: String,
    ready: i64,
    in_flight: i64,
    dead_lettered: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeadLetters {
    dead_letters: Vec<DeadLetterRow>,
}

#[derive(Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct DeadLetterRow {
    id: String,
    attempts: i32,
    reason: String,
    failed_at: i64,
}

struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send and decode; `{status, message}` failure bodies become errors
    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await.context("Failed to connect to API")?;
        let status = response.status();
        let body = response.text().await.context("Failed to read response")?;

        if !status.is_success() {
            let message = serde_json::from_str::<StatusBody>(&body)
                .map(|b| format!("{} ({})", b.message, b.status))
                .unwrap_or(body);
            anyhow::bail!("API error ({}): {}", status.as_u16(), message);
        }

        serde_json::from_str(&body).context("Failed to parse response")
    }

    fn admin(&self, request: reqwest::RequestBuilder, admin_key: Option<&str>) -> Result<reqwest::RequestBuilder> {
        let key = admin_key.context("Admin key required (--admin-key or EXPORT_ADMIN_KEY)")?;
        Ok(request.header(ADMIN_KEY_HEADER, key))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.api_url);
    let admin_key = cli.admin_key.as_deref();

    match cli.command {
        Commands::Export { playlist_id, to } => {
            let token = cli
                .token
                .as_deref()
                .context("Access token required (--token or PLAYLIST_EXPORT_TOKEN)")?;

            let request = api
                .client
                .post(api.url(&format!("/playlists/{}/exports", playlist_id)))
                .bearer_auth(token)
                .json(&json!({ "targetEmail": to }));
            let body: StatusBody = api.send(request).await?;

            println!("{}", format!("✓ {}", body.message).green().bold());
            println!("  {} {}", "Playlist:".bold(), playlist_id);
            println!("  {} {}", "Recipient:".bold(), to);
        }

        Commands::Queue => {
            let request = api.admin(api.client.get(api.url("/exports/queue")), admin_key)?;
            let body: DataBody<QueueDepthRow> = api.send(request).await?;

            println!("{}", "Export Queue".cyan().bold());
            println!();
            println!("{}", Table::new(vec![body.data]));
        }

        Commands::DeadLetters { limit } => {
            let request = api.admin(
                api.client
                    .get(api.url("/exports/dead-letters"))
                    .query(&[("limit", limit)]),
                admin_key,
            )?;
            let body: DataBody<DeadLetters> = api.send(request).await?;

            if body.data.dead_letters.is_empty() {
                println!("{}", "No dead-lettered exports".green());
            } else {
                println!(
                    "{}",
                    format!("{} dead-lettered export(s)", body.data.dead_letters.len())
                        .yellow()
                        .bold()
                );
                println!();
                println!("{}", Table::new(body.data.dead_letters));
            }
        }

        Commands::Requeue { message_id } => {
            let request = api.admin(
                api.client.post(api.url(&format!(
                    "/exports/dead-letters/{}/requeue",
                    message_id
                ))),
                admin_key,
            )?;
            let _: StatusBody = api.send(request).await?;

            println!("{}", format!("✓ {} requeued", message_id).green().bold());
        }

        Commands::Health => match api
            .send::<serde_json::Value>(api.client.get(api.url("/health")))
            .await
        {
            Ok(health) => {
                println!("  {} {}", "API URL:".bold(), cli.api_url);
                println!("  {} {}", "Status:".bold(), "ONLINE".green());
                println!("  {} {}", "Version:".bold(), health["version"]);
            }
            Err(e) => {
                println!("  {} {}", "Status:".bold(), "ERROR".red());
                println!("  {} {}", "Error:".bold(), e);
            }
        },
    }

    Ok(())
}
