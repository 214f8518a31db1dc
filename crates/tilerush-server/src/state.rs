use rand::{thread_rng, Rng};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

use tilerush_lib::grid::{Direction, GridPos};
use tilerush_lib::net::{Message, ProtocolError};
use tilerush_lib::player::{PlayerRecord, USERNAME_HARD_CAP};
use tilerush_lib::PlayerId;

/// How a relayed message fans out to the connected peers.
#[derive(Clone, Debug)]
pub enum RelayEvent {
    /// Delivered to everyone except `from`.
    ToOthers { from: PlayerId, message: Message },
    /// Delivered to everyone, the originator included.
    ToAll { message: Message },
}

/// The whole of the server's knowledge: who is connected and where they
/// claim to be. Gameplay never reaches this struct; every mutation is a
/// roster edit followed by a rebroadcast.
#[derive(Clone, Debug)]
pub struct ServerState {
    players: Arc<Mutex<HashMap<PlayerId, PlayerRecord>>>,
    events: broadcast::Sender<RelayEvent>,
}

impl Default for ServerState {
    fn default() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            players: Arc::default(),
            events,
        }
    }
}

impl ServerState {
    /// Register a new connection: assign an id, insert a placeholder
    /// record, and tell the other peers. Returns the id, the roster
    /// snapshot for the `Welcome` frame, and the event subscription.
    ///
    /// The subscription is taken before the join broadcast so the new
    /// peer never misses events that race with its own welcome.
    pub fn join(
        &self,
    ) -> (
        PlayerId,
        Vec<(PlayerId, PlayerRecord)>,
        broadcast::Receiver<RelayEvent>,
    ) {
        let id = self.gen_player_id();
        let record = PlayerRecord {
            username: format!("guest-{:04X}", id.0 & 0xFFFF),
            ..PlayerRecord::default()
        };

        let receiver = self.events.subscribe();
        let roster = {
            let mut players = self.players();
            players.insert(id, record.clone());
            snapshot(&players)
        };

        let _ = self.events.send(RelayEvent::ToOthers {
            from: id,
            message: Message::PlayerConnected { id, player: record },
        });

        (id, roster, receiver)
    }

    /// Evict a player and notify the remaining peers. Evicting an
    /// unknown id is a no-op; disconnect races make that normal.
    pub fn leave(&self, id: PlayerId) {
        if self.players().remove(&id).is_none() {
            return;
        }
        tracing::info!(player_id = %id, "Player left the roster");
        let _ = self.events.send(RelayEvent::ToOthers {
            from: id,
            message: Message::PlayerDisconnected { id },
        });
    }

    /// Overwrite a player's claimed position and relay it verbatim to
    /// the other peers. No movement validation happens here.
    pub fn update_position(
        &self,
        id: PlayerId,
        position: GridPos,
        facing: Direction,
    ) -> Result<(), ProtocolError> {
        {
            let mut players = self.players();
            let record = players.get_mut(&id).ok_or(ProtocolError::UnknownPlayer(id))?;
            record.position = position;
            record.facing = facing;
        }

        let _ = self.events.send(RelayEvent::ToOthers {
            from: id,
            message: Message::PlayerPosition {
                id,
                position,
                facing,
            },
        });
        Ok(())
    }

    /// Rename a player and broadcast the full roster to everyone,
    /// the sender included. Names are not validated, only capped.
    pub fn update_username(&self, id: PlayerId, username: String) -> Result<(), ProtocolError> {
        let username: String = username.chars().take(USERNAME_HARD_CAP).collect();

        let roster = {
            let mut players = self.players();
            let record = players.get_mut(&id).ok_or(ProtocolError::UnknownPlayer(id))?;
            record.username = username;
            snapshot(&players)
        };

        let _ = self.events.send(RelayEvent::ToAll {
            message: Message::UsernameRoster { players: roster },
        });
        Ok(())
    }

    pub fn player_count(&self) -> usize {
        self.players().len()
    }

    fn players(&self) -> MutexGuard<HashMap<PlayerId, PlayerRecord>> {
        self.players.lock().unwrap()
    }

    fn gen_player_id(&self) -> PlayerId {
        let mut player_id;
        loop {
            player_id = thread_rng().gen::<u32>().into();
            if !self.players().contains_key(&player_id) {
                break;
            };
        }
        player_id
    }
}

fn snapshot(players: &HashMap<PlayerId, PlayerRecord>) -> Vec<(PlayerId, PlayerRecord)> {
    players.iter().map(|(&id, p)| (id, p.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recv(rx: &mut broadcast::Receiver<RelayEvent>) -> RelayEvent {
        rx.try_recv().expect("expected a broadcast event")
    }

    #[test]
    fn join_returns_roster_including_self() {
        let state = ServerState::default();
        let (id_a, roster_a, _rx_a) = state.join();
        assert_eq!(roster_a.len(), 1);
        assert_eq!(roster_a[0].0, id_a);

        let (id_b, roster_b, _rx_b) = state.join();
        assert_ne!(id_a, id_b);
        assert_eq!(roster_b.len(), 2);
        assert_eq!(state.player_count(), 2);
    }

    #[test]
    fn join_is_announced_to_earlier_peers() {
        let state = ServerState::default();
        let (id_a, _, mut rx_a) = state.join();
        // Subscription happens before the join broadcast, so a receiver
        // sees its own announcement first; the send task filters those.
        let _ = rx_a.try_recv();
        let (id_b, _, _rx_b) = state.join();

        match recv(&mut rx_a) {
            RelayEvent::ToOthers {
                from,
                message: Message::PlayerConnected { id, .. },
            } => {
                assert_eq!(from, id_b);
                assert_eq!(id, id_b);
                assert_ne!(id, id_a);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn position_updates_are_relayed_to_others() {
        let state = ServerState::default();
        let (id_a, _, _rx_a) = state.join();
        let (_, _, mut rx_b) = state.join();
        let _ = rx_b.try_recv(); // b's own join announcement
        assert!(rx_b.try_recv().is_err());

        let pos = GridPos::new(3, 9);
        state
            .update_position(id_a, pos, Direction::Left)
            .expect("known player");

        match recv(&mut rx_b) {
            RelayEvent::ToOthers {
                from,
                message:
                    Message::PlayerPosition {
                        id,
                        position,
                        facing,
                    },
            } => {
                assert_eq!(from, id_a);
                assert_eq!(id, id_a);
                assert_eq!(position, pos);
                assert_eq!(facing, Direction::Left);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unknown_players_are_rejected_not_panicked() {
        let state = ServerState::default();
        assert_eq!(
            state.update_position(PlayerId(99), GridPos::default(), Direction::Forward),
            Err(ProtocolError::UnknownPlayer(PlayerId(99)))
        );
        assert_eq!(
            state.update_username(PlayerId(99), "ghost".into()),
            Err(ProtocolError::UnknownPlayer(PlayerId(99)))
        );
        // leaving twice must be harmless
        state.leave(PlayerId(99));
    }

    #[test]
    fn rename_broadcasts_full_roster_to_everyone() {
        let state = ServerState::default();
        let (id_a, _, mut rx_a) = state.join();
        let (_, _, _rx_b) = state.join();
        let _ = rx_a.try_recv(); // a's own join announcement
        let _ = rx_a.try_recv(); // b's join announcement

        state.update_username(id_a, "speedy".into()).unwrap();

        match recv(&mut rx_a) {
            RelayEvent::ToAll {
                message: Message::UsernameRoster { players },
            } => {
                assert_eq!(players.len(), 2);
                let me = players.iter().find(|(id, _)| *id == id_a).unwrap();
                assert_eq!(me.1.username, "speedy");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn rename_is_capped_not_validated() {
        let state = ServerState::default();
        let (id, _, _rx) = state.join();
        let absurd = "x".repeat(USERNAME_HARD_CAP * 3);
        state.update_username(id, absurd).unwrap();

        let roster = {
            let players = state.players();
            snapshot(&players)
        };
        assert_eq!(roster[0].1.username.chars().count(), USERNAME_HARD_CAP);
    }

    #[test]
    fn leave_evicts_and_announces() {
        let state = ServerState::default();
        let (id_a, _, _rx_a) = state.join();
        let (_, _, mut rx_b) = state.join();
        let _ = rx_b.try_recv(); // b's own join announcement

        state.leave(id_a);
        assert_eq!(state.player_count(), 1);

        match recv(&mut rx_b) {
            RelayEvent::ToOthers {
                message: Message::PlayerDisconnected { id },
                ..
            } => assert_eq!(id, id_a),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
