/// E2E integration tests: real UDP sockets on localhost, full runtimes.
///
/// Static ring:  alice → bob → carol → alice, alice holds the first token.
/// Dynamic ring: alice boots alone, bob and carol join through alice.
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use ring_protocol::{
    JoinState, MessageText, PeerName, ProtocolEvent, ProtocolRuntime, RingMessage,
    RuntimeChannels, RuntimeConfig,
};
use ring_transport::{RingNode, RingNodeConfig};
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(10);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .try_init();
}

async fn bind_node() -> RingNode {
    let config = RingNodeConfig::new()
        .listen(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))
        .without_telemetry();
    RingNode::bind(config).await.unwrap()
}

fn config(name: &str, node: &RingNode) -> RuntimeConfig {
    RuntimeConfig {
        name: PeerName::new(name).unwrap(),
        advertised: node.local_addr(),
        pacing: Duration::from_millis(10),
        join_timeout: Duration::from_secs(5),
        join_check_interval: Duration::from_millis(50),
        ..RuntimeConfig::default()
    }
}

fn message(from: &str, to: &str, body: &str) -> RingMessage {
    RingMessage {
        from: PeerName::new(from).unwrap(),
        to: PeerName::new(to).unwrap(),
        body: MessageText::new(body).unwrap(),
    }
}

/// Wait for the first event matching `pred`, skipping others.
async fn wait_for_event(
    events: &mut mpsc::Receiver<ProtocolEvent>,
    pred: impl Fn(&ProtocolEvent) -> bool,
) -> ProtocolEvent {
    timeout(WAIT, async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

async fn spawn_static_ring() -> (RuntimeChannels, RuntimeChannels, RuntimeChannels) {
    let alice_node = bind_node().await;
    let bob_node = bind_node().await;
    let carol_node = bind_node().await;

    let alice_cfg = RuntimeConfig {
        dynamic_join: false,
        successor: Some(bob_node.local_addr()),
        starts_with_token: true,
        ..config("alice", &alice_node)
    };
    let bob_cfg = RuntimeConfig {
        dynamic_join: false,
        successor: Some(carol_node.local_addr()),
        ..config("bob", &bob_node)
    };
    let carol_cfg = RuntimeConfig {
        dynamic_join: false,
        successor: Some(alice_node.local_addr()),
        ..config("carol", &carol_node)
    };

    // Downstream peers first so the first token is not sent into the void.
    let carol = ProtocolRuntime::spawn(carol_node, carol_cfg);
    let bob = ProtocolRuntime::spawn(bob_node, bob_cfg);
    let alice = ProtocolRuntime::spawn(alice_node, alice_cfg);
    (alice, bob, carol)
}

#[tokio::test]
async fn static_ring_delivers_message() {
    init_tracing();
    let (alice, _bob, mut carol) = spawn_static_ring().await;

    alice
        .handle
        .enqueue(message("alice", "carol", "hello carol"))
        .await
        .unwrap();

    let delivered = timeout(WAIT, carol.messages.recv())
        .await
        .expect("timed out")
        .expect("channel closed");
    assert_eq!(delivered.from.as_str(), "alice");
    assert_eq!(delivered.body.as_str(), "hello carol");
    assert_eq!(delivered.token_id, 0);
}

#[tokio::test]
async fn static_ring_reports_unknown_recipient() {
    init_tracing();
    let (mut alice, _bob, _carol) = spawn_static_ring().await;

    alice
        .handle
        .enqueue(message("alice", "nobody", "anyone there?"))
        .await
        .unwrap();

    let event = wait_for_event(&mut alice.events, |e| {
        matches!(e, ProtocolEvent::DeliveryFailed { .. })
    })
    .await;
    match event {
        ProtocolEvent::DeliveryFailed { to, body } => {
            assert_eq!(to.as_str(), "nobody");
            assert_eq!(body.as_str(), "anyone there?");
        }
        other => panic!("unexpected event {other:?}"),
    }

    // The ring keeps working after the failure.
    let status = alice.handle.status().await.unwrap();
    assert_eq!(status.queued, 0);
}

#[tokio::test]
async fn dynamic_ring_forms_and_delivers() {
    init_tracing();

    let alice_node = bind_node().await;
    let alice_addr = alice_node.local_addr();
    let alice_cfg = config("alice", &alice_node);
    let mut alice = ProtocolRuntime::spawn(alice_node, alice_cfg);

    // bob joins the ring-of-one
    let bob_node = bind_node().await;
    let bob_cfg = RuntimeConfig {
        successor: Some(alice_addr),
        ..config("bob", &bob_node)
    };
    let bob_addr = bob_node.local_addr();
    let mut bob = ProtocolRuntime::spawn(bob_node, bob_cfg);

    let formed = wait_for_event(&mut alice.events, |e| {
        matches!(e, ProtocolEvent::RingFormed { .. })
    })
    .await;
    let epoch = match formed {
        ProtocolEvent::RingFormed { successor, epoch } => {
            assert_eq!(successor, bob_addr);
            epoch
        }
        other => panic!("unexpected event {other:?}"),
    };
    let joined = wait_for_event(&mut bob.events, |e| matches!(e, ProtocolEvent::Joined { .. })).await;
    assert_eq!(
        joined,
        ProtocolEvent::Joined {
            successor: alice_addr,
            epoch: Some(epoch),
        }
    );

    // carol joins through alice and lands between alice and bob
    let carol_node = bind_node().await;
    let carol_addr = carol_node.local_addr();
    let carol_cfg = RuntimeConfig {
        successor: Some(alice_addr),
        ..config("carol", &carol_node)
    };
    let mut carol = ProtocolRuntime::spawn(carol_node, carol_cfg);

    let joined = wait_for_event(&mut carol.events, |e| matches!(e, ProtocolEvent::Joined { .. })).await;
    assert_eq!(
        joined,
        ProtocolEvent::Joined {
            successor: bob_addr,
            epoch: Some(epoch),
        }
    );

    let status = alice.handle.status().await.unwrap();
    assert_eq!(status.successor, Some(carol_addr));
    assert_eq!(status.accepted_id, Some(epoch));
    let status = carol.handle.status().await.unwrap();
    assert_eq!(status.join, JoinState::Joined);

    bob.handle
        .enqueue(message("bob", "carol", "welcome"))
        .await
        .unwrap();
    let delivered = timeout(WAIT, carol.messages.recv())
        .await
        .expect("timed out")
        .expect("channel closed");
    assert_eq!(delivered.from.as_str(), "bob");
    assert_eq!(delivered.body.as_str(), "welcome");
    assert_eq!(delivered.token_id, epoch);
}

#[tokio::test]
async fn join_without_answer_fails_visibly() {
    init_tracing();

    // Bound but never read: requests vanish.
    let silent = std::net::UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let contact = match silent.local_addr().unwrap() {
        std::net::SocketAddr::V4(addr) => addr,
        other => panic!("unexpected address {other}"),
    };

    let node = bind_node().await;
    let cfg = RuntimeConfig {
        successor: Some(contact),
        join_timeout: Duration::from_millis(200),
        ..config("dave", &node)
    };
    let mut dave = ProtocolRuntime::spawn(node, cfg);

    let event = wait_for_event(&mut dave.events, |e| {
        matches!(e, ProtocolEvent::JoinFailed { .. })
    })
    .await;
    assert_eq!(event, ProtocolEvent::JoinFailed { contact });
    assert_eq!(
        dave.handle.status().await.unwrap().join,
        JoinState::Failed { contact }
    );
}

#[tokio::test]
async fn shutdown_ends_listener_cleanly() {
    init_tracing();
    let node = bind_node().await;
    let cfg = config("erin", &node);
    let channels = ProtocolRuntime::spawn(node, cfg);

    channels.handle.shutdown().await;
    let result = timeout(WAIT, channels.task)
        .await
        .expect("timed out")
        .expect("task panicked");
    assert!(result.is_ok());

    // Commands after shutdown are refused.
    assert!(channels.handle.status().await.is_err());
}
