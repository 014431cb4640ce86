use std::io::Write;
use std::net::SocketAddrV4;

use clap::Parser;
use ring_protocol::{TelemetryRecord, TokenKind};
use ring_transport::{TelemetryListener, DEFAULT_TELEMETRY_GROUP};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "ring-monitor", about = "Print token activity published by ring peers")]
struct Cli {
    /// Multicast group and port to listen on.
    #[arg(long, default_value_t = DEFAULT_TELEMETRY_GROUP)]
    group: SocketAddrV4,

    /// One JSON object per line instead of text.
    #[arg(long)]
    json: bool,

    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long)]
    debug: bool,
}

/// One observed record, as emitted with `--json`.
#[derive(Serialize)]
struct EventToken<'a> {
    event: &'static str,
    timestamp: String,
    source: String,
    #[serde(flatten)]
    record: &'a TelemetryRecord,
    kind_name: Option<String>,
}

/// Emit a JSONL event to stdout (flushed immediately for piped output).
fn emit<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        let _ = writeln!(lock, "{json}");
        let _ = lock.flush();
    }
}

fn now_local() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let listener = TelemetryListener::bind(cli.group)?;
    eprintln!("ring-monitor v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Listening on {}", listener.group());
    eprintln!();

    loop {
        tokio::select! {
            result = listener.recv() => {
                let (from, line) = result?;
                let record = match line.parse::<TelemetryRecord>() {
                    Ok(record) => record,
                    Err(e) => {
                        tracing::warn!(%from, "skipping record: {e}");
                        continue;
                    }
                };
                if cli.json {
                    emit(&EventToken {
                        event: "token",
                        timestamp: now_local(),
                        source: from.to_string(),
                        record: &record,
                        kind_name: TokenKind::from_u8(record.kind).map(|k| k.to_string()),
                    });
                } else {
                    println!(
                        "{} Client: {} Type: {} UUID: {}",
                        now_local(),
                        record.name,
                        record.kind,
                        record.id
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nCtrl+C received, shutting down...");
                break;
            }
        }
    }
    Ok(())
}
