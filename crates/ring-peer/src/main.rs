mod console;

use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use ring_protocol::{PeerName, ProtocolEvent, ProtocolRuntime, RuntimeChannels, RuntimeConfig};
use ring_transport::{RingNode, RingNodeConfig};

#[derive(Parser)]
#[command(name = "ring-peer", about = "Token ring peer: forwards the token and sends console messages")]
struct Cli {
    /// Name other peers address messages to (at most 10 bytes).
    name: String,

    /// Own address, advertised to joining peers.
    ip: Ipv4Addr,

    /// Listen port.
    port: u16,

    /// Successor address (static ring) or ring member to join through.
    #[arg(requires = "next_port")]
    next_ip: Option<Ipv4Addr>,

    /// Successor port.
    #[arg(requires = "next_ip")]
    next_port: Option<u16>,

    /// Static ring: fixed successor, no join handshake, no telemetry.
    #[arg(long = "static")]
    static_ring: bool,

    /// Static ring: this peer injects the first token.
    #[arg(long, requires = "static_ring")]
    token: bool,

    /// Delay before every token send, in ms.
    #[arg(long, default_value = "1000")]
    pacing_ms: u64,

    /// How long to wait for a join answer, in seconds.
    #[arg(long, default_value = "10")]
    join_timeout_secs: u64,

    /// Do not publish telemetry records.
    #[arg(long)]
    no_telemetry: bool,

    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let name = PeerName::new(cli.name.as_str()).context("invalid peer name")?;
    let next = cli
        .next_ip
        .zip(cli.next_port)
        .map(|(ip, port)| SocketAddrV4::new(ip, port));
    if cli.static_ring && next.is_none() {
        bail!("a static ring peer needs <next-ip> <next-port>");
    }

    let mut node_config =
        RingNodeConfig::new().listen(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, cli.port));
    if cli.static_ring || cli.no_telemetry {
        node_config = node_config.without_telemetry();
    }
    let node = RingNode::bind(node_config).await?;
    let advertised = SocketAddrV4::new(cli.ip, node.local_addr().port());

    eprintln!("ring-peer v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Peer {name} listening on {}", node.local_addr());
    eprintln!();

    let config = RuntimeConfig {
        name: name.clone(),
        advertised,
        dynamic_join: !cli.static_ring,
        successor: next,
        starts_with_token: cli.token,
        pacing: Duration::from_millis(cli.pacing_ms),
        join_timeout: Duration::from_secs(cli.join_timeout_secs),
        ..RuntimeConfig::default()
    };

    let RuntimeChannels {
        handle,
        mut messages,
        mut events,
        mut task,
    } = ProtocolRuntime::spawn(node, config);
    let console = console::spawn(handle.clone(), name);

    let outcome = loop {
        tokio::select! {
            Some(msg) = messages.recv() => {
                println!("{} > {}", msg.from, msg.body);
            }
            Some(event) = events.recv() => report(&event),
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nCtrl+C received, shutting down...");
                handle.shutdown().await;
                break (&mut task).await;
            }
            result = &mut task => break result,
        }
    };
    console.abort();

    match outcome {
        Ok(result) => result.context("ring listener failed"),
        Err(e) => Err(e).context("ring listener panicked"),
    }
}

/// Surface protocol events the user should see; the rest is already logged.
fn report(event: &ProtocolEvent) {
    match event {
        ProtocolEvent::DeliveryFailed { to, body } => {
            eprintln!("! \"{body}\" could not be delivered to {to}");
        }
        ProtocolEvent::Joined { successor, .. } => {
            eprintln!("Joined ring, forwarding to {successor}");
        }
        ProtocolEvent::RingFormed { successor, .. } => {
            eprintln!("Ring formed, forwarding to {successor}");
        }
        ProtocolEvent::JoinFailed { contact } => {
            eprintln!("! No answer from {contact}, not part of any ring");
        }
        other => tracing::debug!(?other, "protocol event"),
    }
}
