//! Round/guess engine: secret selection, per-player cursors, guess scoring.

use std::time::SystemTime;

use indexmap::IndexMap;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{
        AttributeEvaluation, Guess, Room, RoomState, RoundRecord, SecretCharacter,
    },
    dto::ws::PlayerScore,
    error::ServiceError,
    services::{character_cache, evaluation, room_service},
    state::SharedState,
};

/// Feedback handed back to the player who submitted a guess.
#[derive(Debug, Clone)]
pub struct GuessOutcome {
    /// Whether the guessed id equals the current round's secret id.
    pub is_correct: bool,
    /// 1-based round the guess was scored against.
    pub current_round: u32,
    /// Name the player guessed with.
    pub character_name: String,
    /// Portrait of the guessed character, when cached.
    pub character_image: Option<String>,
    /// Attribute-level feedback; empty when the cache missed either side.
    pub evaluation: IndexMap<String, AttributeEvaluation>,
}

/// Start the game for a room: pick the answer key, reset every player's
/// cursor to round one, and move the room to in-progress.
pub async fn start_game(state: &SharedState, code: &str) -> Result<Room, ServiceError> {
    let session = state.require_session_store().await?;
    let Some(room) = session.find_room(code.to_string()).await? else {
        return Err(ServiceError::NotFound("Room not found".into()));
    };

    // First game start per anime pays the full catalog fetch; evaluation
    // afterwards only touches the cache.
    character_cache::cache_characters_for_anime(state, room.anime_id).await?;

    let catalog = state.require_catalog_store().await?;
    let sampled = catalog.sample_characters(room.anime_id, room.rounds).await?;
    if (sampled.len() as u32) < room.rounds {
        return Err(ServiceError::Conflict(format!(
            "Not enough characters available to play {} rounds.",
            room.rounds
        )));
    }

    let secrets: Vec<SecretCharacter> = sampled
        .into_iter()
        .map(|character| SecretCharacter {
            id: character.id,
            name: character.name,
        })
        .collect();

    let ttl = state.config().room_ttl();
    session
        .save_secret_sequence(code.to_string(), secrets, ttl)
        .await?;

    for player in &room.players {
        session
            .save_round_cursor(code.to_string(), player.id.clone(), 1, ttl)
            .await?;
        session
            .save_round_record(RoundRecord::new(code.to_string(), player.id.clone(), 1), ttl)
            .await?;
    }

    info!(code, players = room.players.len(), "game started");
    room_service::update_room_state(state, code, RoomState::InProgress).await
}

/// The round a player is currently attempting, defaulting to the first.
pub async fn current_round(
    state: &SharedState,
    code: &str,
    player_id: &str,
) -> Result<u32, ServiceError> {
    let session = state.require_session_store().await?;
    Ok(session
        .find_round_cursor(code.to_string(), player_id.to_string())
        .await?
        .unwrap_or(1))
}

/// Score a guess against the player's current round and record it.
///
/// The guess is appended to the round record whether or not it is correct;
/// a cache miss on either character degrades the attribute feedback to an
/// empty map instead of failing the guess.
pub async fn submit_guess(
    state: &SharedState,
    code: &str,
    player_id: &str,
    character_id: Uuid,
    character_name: &str,
) -> Result<GuessOutcome, ServiceError> {
    let session = state.require_session_store().await?;
    let Some(room) = session.find_room(code.to_string()).await? else {
        return Err(ServiceError::NotFound("Room not found".into()));
    };

    if room.state != RoomState::InProgress {
        return Err(ServiceError::Conflict("Game is not in progress.".into()));
    }

    let round = session
        .find_round_cursor(code.to_string(), player_id.to_string())
        .await?
        .unwrap_or(1);
    if round > room.rounds {
        return Err(ServiceError::Conflict(
            "All rounds have been completed.".into(),
        ));
    }

    let secrets = session
        .find_secret_sequence(code.to_string())
        .await?
        .ok_or_else(|| ServiceError::NotFound("Secret characters not found for room.".into()))?;
    let secret = secrets.get((round - 1) as usize).ok_or_else(|| {
        ServiceError::NotFound("Secret character not found for the current round.".into())
    })?;

    let is_correct = character_id == secret.id;

    let guessed_cache = session.find_cached_character(character_id).await?;
    let secret_cache = session.find_cached_character(secret.id).await?;
    let evaluation = match (&guessed_cache, &secret_cache) {
        (Some(guessed), Some(secret)) => {
            let catalog = state.require_catalog_store().await?;
            let definitions = catalog.find_attributes_by_anime(room.anime_id).await?;
            evaluation::evaluate_attributes(&definitions, &guessed.attributes, &secret.attributes)
        }
        _ => IndexMap::new(),
    };

    let mut record = session
        .find_round_record(code.to_string(), player_id.to_string(), round)
        .await?
        .unwrap_or_else(|| RoundRecord::new(code.to_string(), player_id.to_string(), round));

    record.guesses.push(Guess {
        character_id,
        character_name: character_name.to_string(),
        is_correct,
        evaluation: evaluation.clone(),
        guessed_at: SystemTime::now(),
    });
    if is_correct {
        record.solved = true;
    }

    session
        .save_round_record(record, state.config().room_ttl())
        .await?;

    Ok(GuessOutcome {
        is_correct,
        current_round: round,
        character_name: character_name.to_string(),
        character_image: guessed_cache.and_then(|cached| cached.image_url),
        evaluation,
    })
}

/// Advance a player to the next round, creating its empty record.
///
/// Past the configured round count the cursor stays where it is and no
/// record is created; the returned number then equals the current round.
pub async fn advance_round(
    state: &SharedState,
    code: &str,
    player_id: &str,
) -> Result<u32, ServiceError> {
    let session = state.require_session_store().await?;
    let Some(room) = session.find_room(code.to_string()).await? else {
        return Err(ServiceError::NotFound("Room not found".into()));
    };

    let current = session
        .find_round_cursor(code.to_string(), player_id.to_string())
        .await?
        .unwrap_or(1);
    let next = current + 1;
    if next > room.rounds {
        return Ok(current);
    }

    let ttl = state.config().room_ttl();
    session
        .save_round_cursor(code.to_string(), player_id.to_string(), next, ttl)
        .await?;
    session
        .save_round_record(
            RoundRecord::new(code.to_string(), player_id.to_string(), next),
            ttl,
        )
        .await?;

    Ok(next)
}

/// Whether every seated player has solved the final round.
pub async fn all_players_finished(
    state: &SharedState,
    room: &Room,
) -> Result<bool, ServiceError> {
    let session = state.require_session_store().await?;

    for player in &room.players {
        let cursor = session
            .find_round_cursor(room.code.clone(), player.id.clone())
            .await?
            .unwrap_or(1);
        if cursor < room.rounds {
            return Ok(false);
        }

        let solved = session
            .find_round_record(room.code.clone(), player.id.clone(), room.rounds)
            .await?
            .map(|record| record.solved)
            .unwrap_or(false);
        if !solved {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Final tally of solved rounds per seated player.
pub async fn player_scores(
    state: &SharedState,
    room: &Room,
) -> Result<Vec<PlayerScore>, ServiceError> {
    let session = state.require_session_store().await?;
    let mut scores = Vec::with_capacity(room.players.len());

    for player in &room.players {
        let mut solved_rounds = 0;
        for round in 1..=room.rounds {
            let solved = session
                .find_round_record(room.code.clone(), player.id.clone(), round)
                .await?
                .map(|record| record.solved)
                .unwrap_or(false);
            if solved {
                solved_rounds += 1;
            }
        }

        scores.push(PlayerScore {
            player_id: player.id.clone(),
            name: player.name.clone(),
            solved_rounds,
        });
    }

    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::models::{AttributeMatchType, AttributeType, AttributeValue, Player},
        services::{
            room_service::{add_player, create_room},
            testing::{
                anime_fixture, attribute_fixture, character_fixture, sample_params, test_state,
            },
        },
        state::SharedState,
    };
    use indexmap::IndexMap;
    use std::time::Duration;

    /// Seed an anime with attribute definitions and `count` characters, and
    /// return the character ids in creation order.
    async fn seed_catalog(state: &SharedState, anime_id: Uuid, count: usize) -> Vec<Uuid> {
        let catalog = state.catalog_store().await.unwrap();
        catalog.save_anime(anime_fixture(anime_id)).await.unwrap();

        catalog
            .save_attribute(attribute_fixture(
                anime_id,
                "hair",
                AttributeType::Text,
                Some(AttributeMatchType::ExactMatch),
            ))
            .await
            .unwrap();
        catalog
            .save_attribute(attribute_fixture(
                anime_id,
                "height",
                AttributeType::Number,
                Some(AttributeMatchType::RangeMatch),
            ))
            .await
            .unwrap();

        let mut ids = Vec::new();
        for n in 0..count {
            let mut attributes = IndexMap::new();
            attributes.insert(
                "hair".to_string(),
                AttributeValue::Text(format!("color-{n}")),
            );
            attributes.insert(
                "height".to_string(),
                AttributeValue::Number(160.0 + n as f64),
            );
            let character = character_fixture(anime_id, &format!("Character {n}"), attributes);
            ids.push(character.id);
            catalog.save_character(character).await.unwrap();
        }
        ids
    }

    /// Create a room with two players on a seeded anime and start the game.
    async fn started_room(state: &SharedState) -> (Room, Vec<Uuid>) {
        let mut params = sample_params();
        let anime_id = Uuid::new_v4();
        params.anime_id = anime_id;
        let ids = seed_catalog(state, anime_id, 6).await;

        let room = create_room(state, params).await.unwrap();
        for id in ["p1", "p2"] {
            add_player(
                state,
                &room.code,
                Player {
                    id: id.into(),
                    name: id.to_uppercase(),
                },
            )
            .await
            .unwrap();
        }

        let room = start_game(state, &room.code).await.unwrap();
        (room, ids)
    }

    async fn secret_for_round(state: &SharedState, code: &str, round: u32) -> SecretCharacter {
        let session = state.session_store().await.unwrap();
        let secrets = session
            .find_secret_sequence(code.to_string())
            .await
            .unwrap()
            .unwrap();
        secrets[(round - 1) as usize].clone()
    }

    #[tokio::test]
    async fn start_game_initializes_every_player() {
        let (state, _, _) = test_state().await;
        let (room, _) = started_room(&state).await;

        assert_eq!(room.state, RoomState::InProgress);

        let session = state.session_store().await.unwrap();
        let secrets = session
            .find_secret_sequence(room.code.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(secrets.len() as u32, room.rounds);

        for player in ["p1", "p2"] {
            assert_eq!(current_round(&state, &room.code, player).await.unwrap(), 1);
            let record = session
                .find_round_record(room.code.clone(), player.to_string(), 1)
                .await
                .unwrap()
                .unwrap();
            assert!(record.guesses.is_empty());
            assert!(!record.solved);
        }
    }

    #[tokio::test]
    async fn start_game_requires_enough_characters() {
        let (state, _, _) = test_state().await;
        let mut params = sample_params();
        let anime_id = Uuid::new_v4();
        params.anime_id = anime_id;
        params.rounds = 5;
        seed_catalog(&state, anime_id, 2).await;

        let room = create_room(&state, params).await.unwrap();
        let err = start_game(&state, &room.code).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(message) if message.contains("characters")));
    }

    #[tokio::test]
    async fn correct_guess_solves_the_round_and_is_recorded() {
        let (state, _, _) = test_state().await;
        let (room, _) = started_room(&state).await;
        let secret = secret_for_round(&state, &room.code, 1).await;

        let outcome = submit_guess(&state, &room.code, "p1", secret.id, &secret.name)
            .await
            .unwrap();
        assert!(outcome.is_correct);
        assert_eq!(outcome.current_round, 1);
        assert!(!outcome.evaluation.is_empty());

        let session = state.session_store().await.unwrap();
        let record = session
            .find_round_record(room.code.clone(), "p1".to_string(), 1)
            .await
            .unwrap()
            .unwrap();
        assert!(record.solved);
        assert_eq!(record.guesses.len(), 1);
        assert!(record.guesses[0].is_correct);
    }

    #[tokio::test]
    async fn wrong_guess_is_still_appended() {
        let (state, _, _) = test_state().await;
        let (room, ids) = started_room(&state).await;
        let secret = secret_for_round(&state, &room.code, 1).await;
        let wrong_id = *ids.iter().find(|id| **id != secret.id).unwrap();

        let outcome = submit_guess(&state, &room.code, "p1", wrong_id, "Wrong Pick")
            .await
            .unwrap();
        assert!(!outcome.is_correct);

        let session = state.session_store().await.unwrap();
        let record = session
            .find_round_record(room.code.clone(), "p1".to_string(), 1)
            .await
            .unwrap()
            .unwrap();
        assert!(!record.solved);
        assert_eq!(record.guesses.len(), 1);
        assert!(!record.guesses[0].is_correct);
    }

    #[tokio::test]
    async fn cache_miss_degrades_evaluation_to_empty() {
        let (state, _, _) = test_state().await;
        let (room, _) = started_room(&state).await;
        let secret = secret_for_round(&state, &room.code, 1).await;

        // Drop the cache so neither side of the comparison is available.
        character_cache::clear_cache(&state, room.anime_id)
            .await
            .unwrap();

        let outcome = submit_guess(&state, &room.code, "p1", secret.id, &secret.name)
            .await
            .unwrap();
        assert!(outcome.is_correct);
        assert!(outcome.evaluation.is_empty());
    }

    #[tokio::test]
    async fn guessing_outside_a_running_game_is_rejected() {
        let (state, _, _) = test_state().await;
        let mut params = sample_params();
        let anime_id = Uuid::new_v4();
        params.anime_id = anime_id;
        seed_catalog(&state, anime_id, 4).await;
        let room = create_room(&state, params).await.unwrap();

        let err = submit_guess(&state, &room.code, "p1", Uuid::new_v4(), "Anyone")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(message) if message.contains("progress")));
    }

    #[tokio::test]
    async fn exhausted_cursor_rejects_further_guesses() {
        let (state, _, _) = test_state().await;
        let (room, _) = started_room(&state).await;

        let session = state.session_store().await.unwrap();
        session
            .save_round_cursor(
                room.code.clone(),
                "p1".to_string(),
                room.rounds + 1,
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        let err = submit_guess(&state, &room.code, "p1", Uuid::new_v4(), "Anyone")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(message) if message.contains("rounds")));
    }

    #[tokio::test]
    async fn advance_round_moves_the_cursor_and_creates_a_record() {
        let (state, _, _) = test_state().await;
        let (room, _) = started_room(&state).await;

        let next = advance_round(&state, &room.code, "p1").await.unwrap();
        assert_eq!(next, 2);
        assert_eq!(current_round(&state, &room.code, "p1").await.unwrap(), 2);

        let session = state.session_store().await.unwrap();
        let record = session
            .find_round_record(room.code.clone(), "p1".to_string(), 2)
            .await
            .unwrap()
            .unwrap();
        assert!(record.guesses.is_empty());

        // The other player's cursor is untouched.
        assert_eq!(current_round(&state, &room.code, "p2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn advance_round_clamps_at_the_final_round() {
        let (state, _, _) = test_state().await;
        let (room, _) = started_room(&state).await;

        let session = state.session_store().await.unwrap();
        session
            .save_round_cursor(
                room.code.clone(),
                "p1".to_string(),
                room.rounds,
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        let unchanged = advance_round(&state, &room.code, "p1").await.unwrap();
        assert_eq!(unchanged, room.rounds);

        let record = session
            .find_round_record(room.code.clone(), "p1".to_string(), room.rounds + 1)
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn game_finishes_once_every_player_solves_the_final_round() {
        let (state, _, _) = test_state().await;
        let (room, _) = started_room(&state).await;

        assert!(!all_players_finished(&state, &room).await.unwrap());

        for player in ["p1", "p2"] {
            for round in 1..=room.rounds {
                let secret = secret_for_round(&state, &room.code, round).await;
                let outcome = submit_guess(&state, &room.code, player, secret.id, &secret.name)
                    .await
                    .unwrap();
                assert!(outcome.is_correct);
                advance_round(&state, &room.code, player).await.unwrap();
            }
        }

        assert!(all_players_finished(&state, &room).await.unwrap());

        let scores = player_scores(&state, &room).await.unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores.iter().all(|score| score.solved_rounds == room.rounds));
    }
}
