//! Per-connection session handling
//!
//! The socket is split: a writer task owns the write half and drains an
//! unbounded channel, so command replies and asynchronously-routed duel
//! results serialize through one place. The reader loop parses one command
//! per line. Every outbound frame is the message followed by a line
//! containing exactly `END`.

use crate::handler::{self, CommandOutcome};
use crate::server::GameContext;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

/// Generate a connection's player id: peer address plus a random suffix, so
/// reconnects get fresh identities and ids stay unique across processes.
fn player_id_for(peer: SocketAddr) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", peer, &suffix[..6])
}

/// Drive one client connection until it quits, disconnects, or the server
/// shuts down.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    context: Arc<GameContext>,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let player_id = player_id_for(peer);
    let (read_half, write_half) = stream.into_split();

    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(write_frames(write_half, rx));

    context.connections.register(&player_id, tx.clone());
    let _ = tx.send(format!("Bem-vindo! playerId={}", player_id));

    let mut lines = BufReader::new(read_half).lines();
    let result = loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!(player_id = %player_id, "session closing on shutdown");
                break Ok(());
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    debug!(player_id = %player_id, command = %line, "command received");
                    match handler::handle_command(&context, &player_id, line).await {
                        CommandOutcome::Reply(text) => {
                            if tx.send(text).is_err() {
                                break Ok(());
                            }
                        }
                        CommandOutcome::Quit(text) => {
                            let _ = tx.send(text);
                            break Ok(());
                        }
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e.into()),
            }
        }
    };

    // An enqueued duel ticket is NOT retracted here; a result arriving after
    // this point is dropped by the router.
    context.connections.unregister(&player_id);
    drop(tx);
    let _ = writer.await;

    info!(player_id = %player_id, "disconnected");
    result
}

async fn write_frames(mut write_half: OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(text) = rx.recv().await {
        let mut frame = String::with_capacity(text.len() + 5);
        frame.push_str(&text);
        if !frame.ends_with('\n') {
            frame.push('\n');
        }
        frame.push_str("END\n");

        if write_half.write_all(frame.as_bytes()).await.is_err() {
            break;
        }
        if write_half.flush().await.is_err() {
            break;
        }
    }
}
