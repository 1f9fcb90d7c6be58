//! End-to-end game sessions over a real socket, standalone mode.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use trionfid::{Cli, GameServer, ShutdownHandle};

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    async fn send(&mut self, command: &str) {
        self.writer
            .write_all(format!("{}\n", command).as_bytes())
            .await
            .expect("send command");
    }

    /// Read one END-terminated frame. None on EOF.
    async fn read_frame(&mut self) -> Option<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            let n = tokio::time::timeout(Duration::from_secs(5), self.reader.read_line(&mut line))
                .await
                .expect("frame should arrive in time")
                .expect("read line");
            if n == 0 {
                return if lines.is_empty() { None } else { Some(lines) };
            }
            let line = line.trim_end().to_string();
            if line == "END" {
                return Some(lines);
            }
            lines.push(line);
        }
    }

    /// Read frames until one whose first line starts with `prefix`.
    async fn read_frame_with_prefix(&mut self, prefix: &str) -> Vec<String> {
        loop {
            let frame = self.read_frame().await.expect("connection closed early");
            if frame.first().is_some_and(|l| l.starts_with(prefix)) {
                return frame;
            }
        }
    }
}

async fn start_standalone_server() -> (SocketAddr, ShutdownHandle) {
    let cli = Cli::parse_from([
        "trionfid",
        "--bind",
        "127.0.0.1:0",
        "--ping-bind",
        "127.0.0.1:0",
        "--duel-workers",
        "1",
    ]);
    let server = GameServer::new(&cli).await.expect("server setup");
    let addr = server.local_addr().expect("bound address");
    let shutdown = server.shutdown_handle();
    tokio::spawn(server.start());
    (addr, shutdown)
}

#[tokio::test]
async fn full_session_listar_pegar_mao_sair() {
    let (addr, shutdown) = start_standalone_server().await;
    let mut client = TestClient::connect(addr).await;

    let greeting = client.read_frame().await.expect("greeting");
    assert!(greeting[0].starts_with("Bem-vindo! playerId="));

    client.send("listar").await;
    let listing = client.read_frame().await.expect("listing");
    assert_eq!(listing[0], "Cartas raras disponíveis:");
    assert!(listing.iter().any(|l| l.contains("Dragão Lendário")));
    assert!(listing.iter().any(|l| l == "Cartas comuns (exemplo):"));

    client.send("pegar").await;
    let pack = client.read_frame().await.expect("pack");
    assert_eq!(pack[0], "CARTAS_RECEBIDAS:");
    assert_eq!(pack.len(), 4);

    client.send("mao").await;
    let hand = client.read_frame().await.expect("hand");
    assert_eq!(hand[0], "Sua mão:");
    assert_eq!(hand.len(), 4);
    assert!(hand[1].starts_with("1. ["));

    client.send("sair").await;
    let farewell = client.read_frame().await.expect("farewell");
    assert_eq!(farewell[0], "Até mais.");

    // The server closes the connection after the farewell.
    assert!(client.read_frame().await.is_none());

    shutdown.shutdown();
}

#[tokio::test]
async fn unknown_command_gets_help() {
    let (addr, shutdown) = start_standalone_server().await;
    let mut client = TestClient::connect(addr).await;
    client.read_frame().await.expect("greeting");

    client.send("frobnicate").await;
    let help = client.read_frame().await.expect("help");
    assert_eq!(help[0], "Comandos: listar, pegar, mao, duelo, sair");

    shutdown.shutdown();
}

#[tokio::test]
async fn two_players_duel_and_both_receive_the_result() {
    let (addr, shutdown) = start_standalone_server().await;

    let mut alice = TestClient::connect(addr).await;
    let mut bruno = TestClient::connect(addr).await;
    alice.read_frame().await.expect("greeting");
    bruno.read_frame().await.expect("greeting");

    // Both need at least two cards to duel; one pack is three.
    alice.send("pegar").await;
    alice.read_frame().await.expect("pack");
    bruno.send("pegar").await;
    bruno.read_frame().await.expect("pack");

    alice.send("duelo").await;
    let ack = alice.read_frame().await.expect("ack");
    assert_eq!(ack[0], "Você entrou na fila de duelo (distribuída).");
    bruno.send("duelo").await;

    // Result delivery is asynchronous; skip past the enqueue ack.
    let result_a = alice.read_frame_with_prefix("Resultado do duelo: ").await;
    let result_b = bruno.read_frame_with_prefix("Resultado do duelo: ").await;
    assert_eq!(result_a, result_b);

    shutdown.shutdown();
}

#[tokio::test]
async fn empty_hand_notice() {
    let (addr, shutdown) = start_standalone_server().await;
    let mut client = TestClient::connect(addr).await;
    client.read_frame().await.expect("greeting");

    client.send("mao").await;
    let hand = client.read_frame().await.expect("empty hand");
    assert_eq!(hand, vec!["Sua mão está vazia.".to_string()]);

    shutdown.shutdown();
}
