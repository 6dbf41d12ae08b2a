//! Room lifecycle manager: creation, membership, state transitions, deletion.
//!
//! Every mutation is a read-modify-write against the shared session store
//! with no in-process locking; concurrent writers race last-writer-wins.
//! Each successful write refreshes the room's time-to-live and broadcasts
//! the updated snapshot to the room's members.

use rand::Rng;
use tracing::info;

use crate::{
    dao::models::{Player, Room, RoomState},
    error::ServiceError,
    services::room_events,
    state::SharedState,
};

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Validated parameters for opening a new room.
#[derive(Debug, Clone)]
pub struct CreateRoomParams {
    /// Catalog anime the room draws characters from.
    pub anime_id: uuid::Uuid,
    /// Number of rounds to play (1 to 20).
    pub rounds: u32,
    /// Per-round countdown in seconds (1 to 300).
    pub round_timer_secs: u32,
    /// Player id of the creator, who owns the room.
    pub owner_id: String,
}

fn generate_room_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let index = rng.random_range(0..ROOM_CODE_ALPHABET.len());
            ROOM_CODE_ALPHABET[index] as char
        })
        .collect()
}

/// Create a new lobby room under a freshly generated unique code.
///
/// Code generation retries a bounded number of times when the candidate code
/// already denotes a live room; running out of attempts is an internal
/// failure, not a client error.
pub async fn create_room(
    state: &SharedState,
    params: CreateRoomParams,
) -> Result<Room, ServiceError> {
    if params.rounds < 1 || params.rounds > 20 {
        return Err(ServiceError::InvalidInput(
            "Rounds must be between 1 and 20".into(),
        ));
    }

    if params.round_timer_secs < 1 || params.round_timer_secs > 300 {
        return Err(ServiceError::InvalidInput(
            "Round timer must be between 1 and 300 seconds".into(),
        ));
    }

    let store = state.require_session_store().await?;
    let config = state.config();

    let mut code = None;
    for _ in 0..config.room_code_attempts() {
        let candidate = generate_room_code(config.room_code_length());
        if !store.room_exists(candidate.clone()).await? {
            code = Some(candidate);
            break;
        }
    }

    let Some(code) = code else {
        return Err(ServiceError::Exhausted(
            "failed to generate a unique room code".into(),
        ));
    };

    let room = Room::new(
        code,
        params.anime_id,
        params.rounds,
        params.round_timer_secs,
        params.owner_id,
    );
    store.save_room(room.clone(), config.room_ttl()).await?;

    info!(code = %room.code, anime_id = %room.anime_id, "room created");
    Ok(room)
}

/// Look up a room by its canonical (uppercase) code.
pub async fn get_room(state: &SharedState, code: &str) -> Result<Option<Room>, ServiceError> {
    let store = state.require_session_store().await?;
    Ok(store.find_room(code.to_string()).await?)
}

/// Seat a player in a lobby room, assigning ownership to the first joiner.
pub async fn add_player(
    state: &SharedState,
    code: &str,
    player: Player,
) -> Result<Room, ServiceError> {
    let store = state.require_session_store().await?;
    let Some(mut room) = store.find_room(code.to_string()).await? else {
        return Err(ServiceError::NotFound("Room not found".into()));
    };

    let max_players = state.config().max_players();
    if room.players.len() >= max_players {
        return Err(ServiceError::Conflict(format!(
            "Room is full. Maximum {max_players} players allowed."
        )));
    }

    if room.has_player(&player.id) {
        return Err(ServiceError::Conflict(
            "Player is already in the room.".into(),
        ));
    }

    if !room.state.is_joinable() {
        return Err(ServiceError::Conflict(
            "Cannot join room. Room is not in lobby state.".into(),
        ));
    }

    if room.players.is_empty() {
        room.owner = player.id.clone();
    }

    room.players.push(player);
    room.touch();

    store
        .save_room(room.clone(), state.config().room_ttl())
        .await?;
    room_events::broadcast_room_update(state, &room);

    Ok(room)
}

/// Unseat a player from a room.
pub async fn remove_player(
    state: &SharedState,
    code: &str,
    player_id: &str,
) -> Result<Room, ServiceError> {
    let store = state.require_session_store().await?;
    let Some(mut room) = store.find_room(code.to_string()).await? else {
        return Err(ServiceError::NotFound("Room not found".into()));
    };

    let Some(position) = room
        .players
        .iter()
        .position(|player| player.id == player_id)
    else {
        return Err(ServiceError::Conflict("Player not found in room.".into()));
    };

    room.players.remove(position);
    room.touch();

    store
        .save_room(room.clone(), state.config().room_ttl())
        .await?;
    room_events::broadcast_room_update(state, &room);

    Ok(room)
}

/// Remove a player from every live room containing them.
///
/// Used on disconnect, when the server no longer knows which room the
/// connection was playing in.
pub async fn remove_player_from_all_rooms(
    state: &SharedState,
    player_id: &str,
) -> Result<(), ServiceError> {
    let store = state.require_session_store().await?;

    for mut room in store.list_rooms().await? {
        if !room.has_player(player_id) {
            continue;
        }

        room.players.retain(|player| player.id != player_id);
        room.touch();
        store
            .save_room(room.clone(), state.config().room_ttl())
            .await?;
        room_events::broadcast_room_update(state, &room);
        info!(code = %room.code, player_id, "removed disconnected player from room");
    }

    Ok(())
}

/// Move a room to a new lifecycle state, unconditionally.
pub async fn update_room_state(
    state: &SharedState,
    code: &str,
    new_state: RoomState,
) -> Result<Room, ServiceError> {
    let store = state.require_session_store().await?;
    let Some(mut room) = store.find_room(code.to_string()).await? else {
        return Err(ServiceError::NotFound("Room not found".into()));
    };

    room.state = new_state;
    room.touch();

    store
        .save_room(room.clone(), state.config().room_ttl())
        .await?;
    room_events::broadcast_room_update(state, &room);

    Ok(room)
}

/// Delete a room and everything keyed to it; returns whether it existed.
pub async fn delete_room(state: &SharedState, code: &str) -> Result<bool, ServiceError> {
    let store = state.require_session_store().await?;
    let existed = store.delete_room(code.to_string()).await?;
    if existed {
        info!(code, "room deleted");
    }
    Ok(existed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{sample_params, test_state};

    #[tokio::test]
    async fn created_codes_are_six_uppercase_alphanumerics() {
        let (state, _, _) = test_state().await;
        let room = create_room(&state, sample_params()).await.unwrap();

        assert_eq!(room.code.len(), 6);
        assert!(
            room.code
                .bytes()
                .all(|byte| ROOM_CODE_ALPHABET.contains(&byte))
        );
        assert_eq!(room.state, RoomState::Lobby);
        assert!(room.players.is_empty());
    }

    #[tokio::test]
    async fn back_to_back_rooms_get_distinct_codes() {
        let (state, _, _) = test_state().await;
        let mut codes = std::collections::HashSet::new();

        for _ in 0..10 {
            let room = create_room(&state, sample_params()).await.unwrap();
            assert!(codes.insert(room.code), "duplicate room code generated");
        }
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_settings() {
        let (state, _, _) = test_state().await;

        let mut params = sample_params();
        params.rounds = 0;
        assert!(matches!(
            create_room(&state, params).await,
            Err(ServiceError::InvalidInput(_))
        ));

        let mut params = sample_params();
        params.rounds = 21;
        assert!(matches!(
            create_room(&state, params).await,
            Err(ServiceError::InvalidInput(_))
        ));

        let mut params = sample_params();
        params.round_timer_secs = 0;
        assert!(matches!(
            create_room(&state, params).await,
            Err(ServiceError::InvalidInput(_))
        ));

        let mut params = sample_params();
        params.round_timer_secs = 301;
        assert!(matches!(
            create_room(&state, params).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn first_joiner_becomes_owner() {
        let (state, _, _) = test_state().await;
        let room = create_room(&state, sample_params()).await.unwrap();

        let joined = add_player(
            &state,
            &room.code,
            Player {
                id: "p1".into(),
                name: "Ichigo".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(joined.owner, "p1");
        assert_eq!(joined.players.len(), 1);
    }

    #[tokio::test]
    async fn fifth_join_is_rejected_as_full() {
        let (state, _, _) = test_state().await;
        let room = create_room(&state, sample_params()).await.unwrap();

        for n in 1..=4 {
            add_player(
                &state,
                &room.code,
                Player {
                    id: format!("p{n}"),
                    name: format!("Player {n}"),
                },
            )
            .await
            .unwrap();
        }

        let err = add_player(
            &state,
            &room.code,
            Player {
                id: "p5".into(),
                name: "Latecomer".into(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(message) if message.contains("full")));
    }

    #[tokio::test]
    async fn duplicate_player_id_is_rejected() {
        let (state, _, _) = test_state().await;
        let room = create_room(&state, sample_params()).await.unwrap();

        let player = Player {
            id: "p1".into(),
            name: "Ichigo".into(),
        };
        add_player(&state, &room.code, player.clone()).await.unwrap();
        let err = add_player(&state, &room.code, player).await.unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(message) if message.contains("already")));
    }

    #[tokio::test]
    async fn joining_a_non_lobby_room_is_rejected() {
        let (state, _, _) = test_state().await;
        let room = create_room(&state, sample_params()).await.unwrap();
        update_room_state(&state, &room.code, RoomState::InProgress)
            .await
            .unwrap();

        let err = add_player(
            &state,
            &room.code,
            Player {
                id: "p1".into(),
                name: "Ichigo".into(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(message) if message.contains("lobby")));
    }

    #[tokio::test]
    async fn joining_a_missing_room_is_not_found() {
        let (state, _, _) = test_state().await;

        let err = add_player(
            &state,
            "ZZZZZZ",
            Player {
                id: "p1".into(),
                name: "Ichigo".into(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn leaving_removes_only_the_named_player() {
        let (state, _, _) = test_state().await;
        let room = create_room(&state, sample_params()).await.unwrap();
        for n in 1..=2 {
            add_player(
                &state,
                &room.code,
                Player {
                    id: format!("p{n}"),
                    name: format!("Player {n}"),
                },
            )
            .await
            .unwrap();
        }

        let updated = remove_player(&state, &room.code, "p1").await.unwrap();
        assert_eq!(updated.players.len(), 1);
        assert_eq!(updated.players[0].id, "p2");

        let err = remove_player(&state, &room.code, "p1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn disconnect_cleanup_sweeps_every_room() {
        let (state, _, _) = test_state().await;
        let first = create_room(&state, sample_params()).await.unwrap();
        let second = create_room(&state, sample_params()).await.unwrap();

        for code in [&first.code, &second.code] {
            add_player(
                &state,
                code,
                Player {
                    id: "ghost".into(),
                    name: "Ghost".into(),
                },
            )
            .await
            .unwrap();
        }

        remove_player_from_all_rooms(&state, "ghost").await.unwrap();

        for code in [&first.code, &second.code] {
            let room = get_room(&state, code).await.unwrap().unwrap();
            assert!(!room.has_player("ghost"));
        }
    }

    #[tokio::test]
    async fn deleting_a_room_cascades_to_round_state() {
        use crate::dao::models::{RoundRecord, SecretCharacter};
        use std::time::Duration;

        let (state, session, _) = test_state().await;
        let room = create_room(&state, sample_params()).await.unwrap();
        let code = room.code.clone();

        let store = state.session_store().await.unwrap();
        store
            .save_secret_sequence(
                code.clone(),
                vec![SecretCharacter {
                    id: uuid::Uuid::new_v4(),
                    name: "Saitama".into(),
                }],
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        store
            .save_round_cursor(code.clone(), "p1".into(), 1, Duration::from_secs(60))
            .await
            .unwrap();
        store
            .save_round_record(
                RoundRecord::new(code.clone(), "p1".into(), 1),
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        assert!(session.room_scoped_key_count(&code) > 0);

        assert!(delete_room(&state, &code).await.unwrap());
        assert_eq!(session.room_scoped_key_count(&code), 0);
        assert!(get_room(&state, &code).await.unwrap().is_none());

        // A second delete reports the room as already gone.
        assert!(!delete_room(&state, &code).await.unwrap());
    }
}
