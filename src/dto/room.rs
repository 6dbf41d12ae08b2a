use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{Player, Room, RoomState},
    dto::format_system_time,
};

/// Payload used to open a brand-new room; the creator is seated immediately.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    /// Catalog anime the room draws characters from.
    pub anime_id: Uuid,
    /// Number of rounds to play.
    #[validate(range(min = 1, max = 20, message = "Rounds must be between 1 and 20"))]
    pub rounds: u32,
    /// Per-round countdown in seconds.
    #[validate(range(
        min = 1,
        max = 300,
        message = "Round timer must be between 1 and 300 seconds"
    ))]
    pub round_timer: u32,
    /// Creating player, auto-joined on success.
    #[validate(nested)]
    pub player: PlayerInput,
}

/// Incoming player identity for join operations.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct PlayerInput {
    /// Connection-assigned player id.
    #[validate(length(min = 1, message = "Player id must not be empty"))]
    pub id: String,
    /// Display name shown to the room.
    #[validate(length(min = 1, max = 50, message = "Player name must not be empty"))]
    pub name: String,
}

impl From<PlayerInput> for Player {
    fn from(value: PlayerInput) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

/// Body of the join-room endpoint.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRoomRequest {
    /// Player joining the room.
    #[validate(nested)]
    pub player: PlayerInput,
}

/// Body of the leave-room endpoint.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoomRequest {
    /// Player leaving the room.
    #[validate(length(min = 1, message = "Player id must not be empty"))]
    pub player_id: String,
}

/// Public projection of a seated player.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSnapshot {
    /// Player id.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl From<Player> for PlayerSnapshot {
    fn from(value: Player) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

/// Full room snapshot returned by REST calls and broadcast on `room:update`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    /// Join code.
    pub code: String,
    /// Catalog anime the room plays.
    pub anime_id: Uuid,
    /// Configured round count.
    pub rounds: u32,
    /// Per-round countdown in seconds.
    pub round_timer: u32,
    /// Lifecycle state.
    pub state: RoomState,
    /// Player id of the owner.
    pub owner: String,
    /// Seated players in join order.
    pub players: Vec<PlayerSnapshot>,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last mutation timestamp (RFC 3339).
    pub updated_at: String,
}

impl From<Room> for RoomSnapshot {
    fn from(room: Room) -> Self {
        Self {
            code: room.code,
            anime_id: room.anime_id,
            rounds: room.rounds,
            round_timer: room.round_timer_secs,
            state: room.state,
            owner: room.owner,
            players: room.players.into_iter().map(Into::into).collect(),
            created_at: format_system_time(room.created_at),
            updated_at: format_system_time(room.updated_at),
        }
    }
}
