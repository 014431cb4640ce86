use ring_protocol::{parse_console_line, PeerName, RuntimeHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

/// Read `<client name> < <message>` lines from stdin and queue them.
///
/// Ends on EOF; the ring listener keeps running.
pub fn spawn(handle: RuntimeHandle, local: PeerName) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Enter message in format: <client name> < <message>");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    tracing::debug!("console closed");
                    return;
                }
                Err(e) => {
                    tracing::warn!("console read failed: {e}");
                    return;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_console_line(&line, &local) {
                Ok(message) => {
                    if handle.enqueue(message).await.is_err() {
                        return;
                    }
                }
                Err(e) => tracing::warn!("{e}"),
            }
        }
    })
}
