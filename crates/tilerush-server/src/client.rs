use tilerush_lib::net::connection::{self, ConnectionRx};
use tilerush_lib::net::{Message, ProtocolError};
use tilerush_lib::PlayerId;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::select;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::state::{RelayEvent, ServerState};

/// Take a socket for a newly connected peer and begin serving it.
pub async fn handle_new_connection(state: ServerState, socket: TcpStream) {
    let (mut conn_tx, conn_rx) = connection::from_socket(socket);
    let (id, players, events_rx) = state.join();
    tracing::info!("New connection for player id {id} opened");

    if let Err(error) = conn_tx.write_frame(&Message::Welcome { id, players }).await {
        tracing::error!(%error, "Failed to welcome player {id}");
        state.leave(id);
        return;
    }

    let (local_tx, local_rx) = mpsc::channel(64);
    let send_task = tokio::spawn(send_task(conn_tx, events_rx, local_rx, id));

    let client = ConnectedClient {
        state,
        id,
        conn_rx,
        local_tx,
        send_task,
    };
    client.run().await;
}

/// Forward relay events and locally generated frames down the socket.
/// Events the client itself originated are filtered here so a peer
/// never hears its own position echoes.
async fn send_task(
    mut conn_tx: connection::ConnectionTx<OwnedWriteHalf>,
    mut events_rx: broadcast::Receiver<RelayEvent>,
    mut local_rx: mpsc::Receiver<Message>,
    id: PlayerId,
) {
    loop {
        let message = select! {
            Ok(event) = events_rx.recv() => match event {
                RelayEvent::ToOthers { from, .. } if from == id => continue,
                RelayEvent::ToOthers { message, .. } => message,
                RelayEvent::ToAll { message } => message,
            },
            Some(m) = local_rx.recv() => m,
            else => return,
        };

        if conn_tx.write_frame(&message).await.is_err() {
            return;
        }
    }
}

struct ConnectedClient {
    state: ServerState,
    id: PlayerId,
    conn_rx: ConnectionRx<OwnedReadHalf>,
    local_tx: mpsc::Sender<Message>,
    send_task: JoinHandle<()>,
}

impl ConnectedClient {
    /// Takes ownership of self to guarantee the client is dropped, and
    /// with it the roster entry, when its message loop ends.
    #[instrument(skip_all, fields(player_id = %self.id))]
    async fn run(mut self) {
        loop {
            let incoming = match self.conn_rx.read_frame().await {
                Ok(Some(m)) => m,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Error reading message, closing connection\n{e:?}");
                    break;
                }
            };

            tracing::debug!("Received message: {incoming:?}");
            if let Err(error) = self.process(incoming) {
                tracing::error!("Encountered error processing message: {error:?}");
                let _ = self.local_tx.send(Message::Error { error }).await;
            }
        }
        tracing::info!("Player disconnected");
    }

    fn process(&mut self, msg: Message) -> Result<(), ProtocolError> {
        match msg {
            Message::UpdatePosition { position, facing } => {
                self.state.update_position(self.id, position, facing)
            }
            Message::UpdateUsername { username } => self.state.update_username(self.id, username),
            _ => Err(ProtocolError::InvalidMessage),
        }
    }
}

impl Drop for ConnectedClient {
    fn drop(&mut self) {
        self.send_task.abort();
        self.state.leave(self.id);
    }
}
