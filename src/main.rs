use std::path::PathBuf;

use anyhow::{bail, Context};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, Subcommand};
use poa_core::{assemble_proof_with, digest_bytes, digest_string, FingerprintScheme};
use poa_host::generator::local::MAX_SCALE;
use poa_host::generator::LocalGenerator;
use poa_host::service::now_millis;
use poa_host::telemetry::init_tracing;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about = "Proof of Art command line", long_about = None)]
struct Cli {
    /// Turn debugging information on
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the offline artwork for a prompt
    Render {
        #[arg(short, long)]
        prompt: String,

        #[arg(short, long, value_name = "FILE", default_value = "./output.png")]
        output: PathBuf,

        /// Upscale factor for the 64x64 canvas
        #[arg(short, long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..=MAX_SCALE as i64))]
        scale: u32,
    },
    /// Print the proof record for a prompt and an existing artwork file
    Proof {
        #[arg(short, long)]
        prompt: String,

        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        #[arg(short, long)]
        creator: String,

        /// Milliseconds since the epoch, defaults to now
        #[arg(short, long)]
        timestamp: Option<u64>,

        #[arg(long, default_value = "concatenated")]
        scheme: FingerprintScheme,
    },
    /// Ask a running server whether a hash or artwork file is registered
    Verify {
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,

        #[arg(long, conflicts_with = "file")]
        hash: Option<String>,

        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.debug {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    init_tracing(filter);

    match cli.command {
        Command::Render {
            prompt,
            output,
            scale,
        } => {
            let image = LocalGenerator::new(scale).render(&prompt)?;
            image
                .save(&output)
                .with_context(|| format!("writing {}", output.display()))?;

            tracing::info!("Prompt hash: {}", digest_string(&prompt));
            println!("Saved {}", output.display());
        }
        Command::Proof {
            prompt,
            file,
            creator,
            timestamp,
            scheme,
        } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let timestamp = match timestamp {
                Some(ts) => ts,
                None => now_millis()?,
            };

            tracing::debug!("Output hash: {}", digest_bytes(&bytes));
            let proof = assemble_proof_with(scheme, &prompt, &bytes, &creator, timestamp);
            println!("{}", serde_json::to_string_pretty(&proof)?);
        }
        Command::Verify { server, hash, file } => {
            let body = match (hash, file) {
                (Some(hash), _) => json!({ "combinedHash": hash }),
                (None, Some(file)) => {
                    let bytes = tokio::fs::read(&file)
                        .await
                        .with_context(|| format!("reading {}", file.display()))?;
                    json!({ "file": STANDARD.encode(bytes) })
                }
                (None, None) => bail!("either --hash or --file is required"),
            };

            let url = format!("{}/api/verify", server.trim_end_matches('/'));
            let response = reqwest::Client::new()
                .post(&url)
                .json(&body)
                .send()
                .await
                .with_context(|| format!("calling {}", url))?;

            let status = response.status();
            let value: serde_json::Value = response.json().await?;
            if !status.is_success() {
                bail!("server answered {}: {}", status, value);
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}
