mod autopilot;
mod cards;
mod minigame;
mod phase;
mod player;
mod rank;
mod session;

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use tilerush_lib::net::Message;

use crate::net::{NetCommand, NetCommandSender};
use autopilot::Autopilot;
use session::GameSession;

const FRAME: Duration = Duration::from_millis(33);

/// The client game loop: a fixed-rate tick that feeds network messages
/// into the session, lets the autopilot act, and flushes outbound
/// messages. Returns when the race is decided or the network dies.
pub fn run(
    username: String,
    seed: Option<u64>,
    network_sender: NetCommandSender,
    logic_receiver: Receiver<Message>,
    error_receiver: Receiver<anyhow::Error>,
) {
    let mut session: Option<GameSession> = None;
    let mut pilot = Autopilot::new(seed);

    loop {
        let frame_start = Instant::now();

        match error_receiver.try_recv() {
            Ok(error) => {
                tracing::error!("Network failure: {error:?}");
                break;
            }
            Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        for msg in logic_receiver.try_iter() {
            match msg {
                Message::Welcome { id, players } => {
                    tracing::info!("Connected as {id}");
                    let now = Instant::now();
                    let mut new_session = GameSession::new(id, username.clone(), now, seed);
                    for (peer_id, record) in players {
                        new_session.handle_message(
                            Message::PlayerConnected {
                                id: peer_id,
                                player: record,
                            },
                            now,
                        );
                    }
                    session = Some(new_session);
                }
                m => {
                    if let Some(s) = session.as_mut() {
                        s.handle_message(m, Instant::now());
                    }
                }
            }
        }

        if let Some(s) = session.as_mut() {
            let now = Instant::now();
            pilot.drive(s, now);
            for msg in s.tick(now) {
                if network_sender.try_send(NetCommand::Send(msg)).is_err() {
                    tracing::warn!("Network queue full, dropping outbound message");
                }
            }
            if s.is_over() || s.idle_finished() {
                tracing::info!(
                    round = s.round(),
                    players = s.remote_count() + 1,
                    "Session complete"
                );
                for standing in s.standings() {
                    let marker = if standing.is_local { " (you)" } else { "" };
                    tracing::info!("final: #{} {}{marker}", standing.rank, standing.username);
                }
                break;
            }
        }

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            spin_sleep::sleep(FRAME - elapsed);
        }
    }
}
