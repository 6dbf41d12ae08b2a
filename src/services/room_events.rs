//! Fan-out helpers relaying room and gameplay events to connected sockets.
//!
//! Multicast groups are derived from room membership: a broadcast resolves
//! each seated player id against the live connection registry, so only the
//! players currently in a room receive that room's events.

use axum::extract::ws::Message;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use crate::{
    dao::models::Room,
    dto::{room::RoomSnapshot, ws::ServerMessage},
    state::SharedState,
};

/// Serialize a payload and push it onto the provided writer channel.
///
/// Returns `false` when the writer is gone and the connection should be
/// dropped. A serialization failure is permanent, so it is logged and
/// reported as delivered rather than retried.
pub fn push_message<T>(tx: &mpsc::UnboundedSender<Message>, value: &T) -> bool
where
    T: ?Sized + Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize outbound message `{value:?}`");
            return true;
        }
    };

    tx.send(Message::Text(payload.into())).is_ok()
}

/// Send a message to a single player's socket, evicting dead connections.
pub fn send_to_player(state: &SharedState, player_id: &str, message: &ServerMessage) {
    let Some(tx) = state
        .connections()
        .get(player_id)
        .map(|connection| connection.tx.clone())
    else {
        return;
    };

    if !push_message(&tx, message) {
        warn!(player_id, "writer closed, removing connection");
        state.connections().remove(player_id);
    }
}

/// Send a message to every player currently seated in the room.
pub fn broadcast_to_room(state: &SharedState, room: &Room, message: &ServerMessage) {
    for player in &room.players {
        send_to_player(state, &player.id, message);
    }
}

/// Send a message to every seated player except one, typically the sender.
pub fn broadcast_to_room_except(
    state: &SharedState,
    room: &Room,
    excluded_player_id: &str,
    message: &ServerMessage,
) {
    for player in &room.players {
        if player.id != excluded_player_id {
            send_to_player(state, &player.id, message);
        }
    }
}

/// Broadcast the full room snapshot after a membership or state change.
pub fn broadcast_room_update(state: &SharedState, room: &Room) {
    let snapshot: RoomSnapshot = room.clone().into();
    broadcast_to_room(state, room, &ServerMessage::RoomUpdate(snapshot));
}
