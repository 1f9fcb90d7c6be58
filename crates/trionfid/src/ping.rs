//! UDP ping responder
//!
//! Pure echo: whatever datagram arrives goes straight back. Clients use the
//! round trip for latency measurement; no game state is involved.

use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub fn spawn_ping_responder(
    socket: UdpSocket,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Ok(addr) = socket.local_addr() {
            info!(%addr, "ping responder ready");
        }

        let mut buf = [0u8; 1024];
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("ping responder stopping");
                    break;
                }
                received = socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => {
                        if let Err(e) = socket.send_to(&buf[..len], peer).await {
                            warn!(%peer, error = %e, "ping echo failed");
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "ping receive failed");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn echoes_datagrams_back() {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let (shutdown_tx, _) = broadcast::channel(1);
        let handle = spawn_ping_responder(socket, shutdown_tx.subscribe());

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"ping 42", addr).await.unwrap();

        let mut buf = [0u8; 64];
        let (len, from) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
            .await
            .expect("echo should arrive")
            .unwrap();
        assert_eq!(&buf[..len], b"ping 42");
        assert_eq!(from, addr);

        let _ = shutdown_tx.send(());
        let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;
    }
}
