use std::sync::mpsc::Sender;

use tilerush_lib::net::{
    connection::{self, ConnectionRx},
    Message,
};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

pub type NetCommandReceiver = mpsc::Receiver<NetCommand>;
pub type NetCommandSender = mpsc::Sender<NetCommand>;

#[derive(Clone, Debug)]
pub enum NetCommand {
    Disconnect,
    Send(Message),
}

/// The client's network task: owns the relay connection, writes commands
/// from the game loop, and forwards inbound frames back to it.
#[tokio::main]
pub async fn run(
    mut receiver: NetCommandReceiver,
    logic_sender: Sender<Message>,
    error_sender: Sender<anyhow::Error>,
) {
    let addr = load_server_address();
    tracing::info!("Connecting to relay at '{addr}'");

    let sock = match TcpStream::connect(&addr).await {
        Ok(sock) => sock,
        Err(e) => {
            tracing::error!("Could not reach the relay: {e}");
            let _ = error_sender.send(e.into());
            return;
        }
    };
    let (mut conn_tx, conn_rx) = connection::from_socket(sock);

    let recv_task = tokio::spawn(recv_task(conn_rx, error_sender.clone(), logic_sender));

    while let Some(command) = receiver.recv().await {
        let msg = match command {
            NetCommand::Disconnect => break,
            NetCommand::Send(m) => m,
        };
        tracing::debug!("Sending message {msg:?}");
        if let Err(e) = conn_tx.write_frame(&msg).await {
            tracing::error!("Error sending message to relay, disconnecting: {e}");
            let _ = error_sender.send(e.into());
            break;
        }
    }
    recv_task.abort();
    tracing::info!("Disconnected from relay");
}

async fn recv_task(
    mut conn_rx: ConnectionRx<OwnedReadHalf>,
    error_sender: Sender<anyhow::Error>,
    logic_sender: Sender<Message>,
) {
    loop {
        let incoming = match conn_rx.read_frame().await {
            Ok(Some(m)) => m,
            Ok(None) => {
                tracing::info!("Relay closed the connection");
                break;
            }
            Err(e) => {
                tracing::error!("Error reading message from relay: {e}");
                let _ = error_sender.send(e.into());
                break;
            }
        };

        tracing::debug!("Received message {incoming:?}");
        if let Message::Error { error } = &incoming {
            // Best-effort protocol: log and carry on
            tracing::error!("Error from relay: {error}");
            continue;
        }
        if logic_sender.send(incoming).is_err() {
            // Game loop is gone; nothing left to do
            break;
        }
    }
}

/// The relay address comes from a `serveraddress` file next to the
/// executable, defaulting to a local relay.
fn load_server_address() -> String {
    if let Ok(mut exe_path) = std::env::current_exe() {
        exe_path.pop();
        exe_path.push("serveraddress");
        if let Ok(addr) = std::fs::read_to_string(exe_path) {
            return addr.trim().to_string();
        }
    }

    "127.0.0.1:42810".into()
}
