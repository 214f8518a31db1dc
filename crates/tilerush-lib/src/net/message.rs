use serde::{Deserialize, Serialize};

use crate::grid::{Direction, GridPos};
use crate::player::PlayerRecord;
use crate::PlayerId;

use super::ProtocolError;

/// Everything that travels between a client and the relay.
///
/// The relay holds no game state beyond the roster; it assigns ids,
/// rebroadcasts position/username updates, and notifies peers of
/// connects and disconnects. Gameplay messages do not exist on the wire.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub enum Message {
    Error {
        error: ProtocolError,
    },
    /// First frame after connecting: the peer's own id plus the full
    /// roster (including the peer itself). Sent to the new peer only.
    Welcome {
        id: PlayerId,
        players: Vec<(PlayerId, PlayerRecord)>,
    },
    /// Broadcast to every *other* peer when someone joins.
    PlayerConnected {
        id: PlayerId,
        player: PlayerRecord,
    },
    /// Broadcast when a peer's connection goes away.
    PlayerDisconnected {
        id: PlayerId,
    },
    /// Client to server, fire-and-forget, sent whenever the local
    /// position changes. Unthrottled.
    UpdatePosition {
        position: GridPos,
        facing: Direction,
    },
    /// Server to the other peers: the relayed form of `UpdatePosition`.
    PlayerPosition {
        id: PlayerId,
        position: GridPos,
        facing: Direction,
    },
    /// Client to server: rename the local player.
    UpdateUsername {
        username: String,
    },
    /// Server to all peers (sender included): full roster after a rename.
    UsernameRoster {
        players: Vec<(PlayerId, PlayerRecord)>,
    },
}
