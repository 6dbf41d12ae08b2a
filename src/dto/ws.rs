use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::AttributeEvaluation;
use crate::dto::room::RoomSnapshot;

/// Messages accepted from game WebSocket clients.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Owner asks the server to start the game for a room.
    #[serde(rename_all = "camelCase")]
    GameStart {
        /// Join code of the room to start.
        room_code: String,
    },
    /// A player submits a character guess for their current round.
    #[serde(rename_all = "camelCase")]
    SubmitGuess {
        /// Join code of the room being played.
        room_code: String,
        /// Guessed character id; required, optional only to report a
        /// targeted error instead of a parse failure.
        character_id: Option<Uuid>,
        /// Guessed character name as typed.
        character_name: Option<String>,
    },
    /// Connection liveness probe.
    Ping,
    /// Free-form message echoed back to the sender.
    Message {
        /// Arbitrary payload to echo.
        #[serde(default)]
        data: serde_json::Value,
    },
    /// Any unrecognized message type.
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse a client frame from its JSON text.
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Guess feedback returned to the guessing player.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuessResultMessage {
    /// Whether the guess hit the round's secret character.
    pub is_correct: bool,
    /// 1-based round the guess was evaluated against.
    pub current_round: u32,
    /// Name of the guessed character.
    pub character_name: String,
    /// Portrait of the guessed character, when cached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_image: Option<String>,
    /// Per-attribute feedback keyed by attribute code.
    pub attribute_evaluation: IndexMap<String, AttributeEvaluation>,
    /// Submission timestamp (RFC 3339).
    pub timestamp: String,
}

/// Final per-player tally broadcast when a game ends.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerScore {
    /// Player id.
    pub player_id: String,
    /// Display name.
    pub name: String,
    /// Number of rounds the player solved.
    pub solved_rounds: u32,
}

/// Messages pushed to game WebSocket clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Greeting carrying the connection's assigned player id.
    #[serde(rename = "welcome", rename_all = "camelCase")]
    Welcome {
        /// Human-readable greeting.
        message: String,
        /// Assigned connection/player id.
        socket_id: String,
        /// Connection timestamp (RFC 3339).
        timestamp: String,
    },
    /// Full room snapshot, sent after any membership or state change.
    #[serde(rename = "room:update")]
    RoomUpdate(RoomSnapshot),
    /// Guess feedback for the submitting player.
    #[serde(rename = "guess-result")]
    GuessResult(GuessResultMessage),
    /// Notice to the other room members that a peer guessed, without
    /// revealing whether the guess was correct.
    #[serde(rename = "player-guessed", rename_all = "camelCase")]
    PlayerGuessed {
        /// Guessing player's id.
        player_id: String,
        /// Name the player guessed.
        character_name: String,
        /// Round the guess belonged to.
        current_round: u32,
        /// Submission timestamp (RFC 3339).
        timestamp: String,
    },
    /// The submitting player advanced to the next round.
    #[serde(rename = "round-advanced", rename_all = "camelCase")]
    RoundAdvanced {
        /// Round the player is now attempting.
        new_round: u32,
        /// Advancement timestamp (RFC 3339).
        timestamp: String,
    },
    /// Every player finished the final round; the room is done.
    #[serde(rename = "game-ended", rename_all = "camelCase")]
    GameEnded {
        /// Final solved-round tallies.
        scores: Vec<PlayerScore>,
        /// Completion timestamp (RFC 3339).
        timestamp: String,
    },
    /// Room lookup or game-start failure.
    #[serde(rename = "error")]
    Error {
        /// Human-readable description.
        message: String,
    },
    /// Guess rejection (missing fields or submission failure).
    #[serde(rename = "guess-error")]
    GuessError {
        /// Human-readable description.
        message: String,
    },
    /// Liveness probe answer.
    #[serde(rename = "pong")]
    Pong {
        /// Response timestamp (RFC 3339).
        timestamp: String,
    },
    /// Echo of a free-form client message.
    #[serde(rename = "message", rename_all = "camelCase")]
    Echo {
        /// Marks the payload as an echo.
        echo: bool,
        /// The payload originally sent.
        original_message: serde_json::Value,
        /// Echo timestamp (RFC 3339).
        timestamp: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_game_start_frames() {
        let message = ClientMessage::from_json_str(r#"{"type":"game-start","roomCode":"AB12CD"}"#)
            .expect("valid frame");
        match message {
            ClientMessage::GameStart { room_code } => assert_eq!(room_code, "AB12CD"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn parses_submit_guess_with_missing_fields() {
        let message = ClientMessage::from_json_str(r#"{"type":"submit-guess","roomCode":"AB12CD"}"#)
            .expect("valid frame");
        match message {
            ClientMessage::SubmitGuess {
                room_code,
                character_id,
                character_name,
            } => {
                assert_eq!(room_code, "AB12CD");
                assert!(character_id.is_none());
                assert!(character_name.is_none());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_types_fall_through() {
        let message =
            ClientMessage::from_json_str(r#"{"type":"dance"}"#).expect("unknown tolerated");
        assert!(matches!(message, ClientMessage::Unknown));
    }

    #[test]
    fn room_update_serializes_with_event_tag() {
        use crate::dao::models::Room;
        use uuid::Uuid;

        let room = Room::new("XY34ZT".into(), Uuid::new_v4(), 3, 60, "p1".into());
        let payload = serde_json::to_value(ServerMessage::RoomUpdate(room.into()))
            .expect("serializable");
        assert_eq!(payload["type"], "room:update");
        assert_eq!(payload["code"], "XY34ZT");
        assert_eq!(payload["state"], "lobby");
    }
}
