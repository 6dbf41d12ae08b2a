//! WebSocket gateway: connection lifecycle and inbound event dispatch.
//!
//! The connection's transport identifier is the player identity; there is no
//! separate authentication step and a reconnect yields a fresh identity.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::RoomState,
    dto::{
        now_timestamp,
        validation::normalize_room_code,
        ws::{ClientMessage, GuessResultMessage, ServerMessage},
    },
    error::ServiceError,
    services::{room_events, room_service, round_service},
    state::{ClientConnection, SharedState},
};

const WELCOME_TEXT: &str = "Connected to AniGuess server";

/// Handle the full lifecycle of one client WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we
    // await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let player_id = Uuid::new_v4().to_string();
    state.connections().insert(
        player_id.clone(),
        ClientConnection {
            id: player_id.clone(),
            tx: outbound_tx.clone(),
        },
    );
    info!(id = %player_id, "client connected");

    room_events::push_message(
        &outbound_tx,
        &ServerMessage::Welcome {
            message: WELCOME_TEXT.into(),
            socket_id: player_id.clone(),
            timestamp: now_timestamp(),
        },
    );

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                handle_frame(&state, &player_id, &outbound_tx, &text).await;
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(id = %player_id, "client closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(id = %player_id, error = %err, "websocket error");
                break;
            }
        }
    }

    state.connections().remove(&player_id);
    info!(id = %player_id, "client disconnected");

    // Best-effort cleanup; a failure here only delays the room TTL reaper.
    if let Err(err) = room_service::remove_player_from_all_rooms(&state, &player_id).await {
        warn!(id = %player_id, error = %err, "failed to remove player from rooms on disconnect");
    }

    finalize(writer_task, outbound_tx).await;
}

async fn handle_frame(
    state: &SharedState,
    player_id: &str,
    outbound_tx: &mpsc::UnboundedSender<Message>,
    text: &str,
) {
    match ClientMessage::from_json_str(text) {
        Ok(ClientMessage::GameStart { room_code }) => {
            handle_game_start(state, outbound_tx, &room_code).await;
        }
        Ok(ClientMessage::SubmitGuess {
            room_code,
            character_id,
            character_name,
        }) => {
            let (Some(character_id), Some(character_name)) = (character_id, character_name)
            else {
                room_events::push_message(
                    outbound_tx,
                    &ServerMessage::GuessError {
                        message: "roomCode, characterId and characterName are required".into(),
                    },
                );
                return;
            };
            handle_submit_guess(
                state,
                player_id,
                outbound_tx,
                &room_code,
                character_id,
                &character_name,
            )
            .await;
        }
        Ok(ClientMessage::Ping) => {
            room_events::push_message(
                outbound_tx,
                &ServerMessage::Pong {
                    timestamp: now_timestamp(),
                },
            );
        }
        Ok(ClientMessage::Message { data }) => {
            room_events::push_message(
                outbound_tx,
                &ServerMessage::Echo {
                    echo: true,
                    original_message: data,
                    timestamp: now_timestamp(),
                },
            );
        }
        Ok(ClientMessage::Unknown) => {
            warn!(id = %player_id, "ignoring unknown message type");
        }
        Err(err) => {
            warn!(id = %player_id, error = %err, "failed to parse client message");
        }
    }
}

async fn handle_game_start(
    state: &SharedState,
    outbound_tx: &mpsc::UnboundedSender<Message>,
    room_code: &str,
) {
    let code = normalize_room_code(room_code);
    // Success already broadcasts the room snapshot via the state update.
    if let Err(err) = round_service::start_game(state, &code).await {
        warn!(code = %code, error = %err, "game start failed");
        room_events::push_message(
            outbound_tx,
            &ServerMessage::Error {
                message: err.client_message("Failed to start game"),
            },
        );
    }
}

async fn handle_submit_guess(
    state: &SharedState,
    player_id: &str,
    outbound_tx: &mpsc::UnboundedSender<Message>,
    room_code: &str,
    character_id: Uuid,
    character_name: &str,
) {
    let code = normalize_room_code(room_code);

    let outcome =
        match round_service::submit_guess(state, &code, player_id, character_id, character_name)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(code = %code, id = %player_id, error = %err, "guess rejected");
                room_events::push_message(
                    outbound_tx,
                    &ServerMessage::GuessError {
                        message: err.client_message("Failed to submit guess"),
                    },
                );
                return;
            }
        };

    let timestamp = now_timestamp();
    room_events::push_message(
        outbound_tx,
        &ServerMessage::GuessResult(GuessResultMessage {
            is_correct: outcome.is_correct,
            current_round: outcome.current_round,
            character_name: outcome.character_name.clone(),
            character_image: outcome.character_image.clone(),
            attribute_evaluation: outcome.evaluation.clone(),
            timestamp: timestamp.clone(),
        }),
    );

    let room = match room_service::get_room(state, &code).await {
        Ok(Some(room)) => room,
        Ok(None) => return,
        Err(err) => {
            warn!(code = %code, error = %err, "room lookup failed after guess");
            return;
        }
    };

    // Peers learn that a guess happened, not whether it was right.
    room_events::broadcast_to_room_except(
        state,
        &room,
        player_id,
        &ServerMessage::PlayerGuessed {
            player_id: player_id.to_string(),
            character_name: outcome.character_name.clone(),
            current_round: outcome.current_round,
            timestamp: timestamp.clone(),
        },
    );

    if !outcome.is_correct {
        return;
    }

    match round_service::advance_round(state, &code, player_id).await {
        Ok(new_round) if new_round != outcome.current_round => {
            room_events::push_message(
                outbound_tx,
                &ServerMessage::RoundAdvanced {
                    new_round,
                    timestamp,
                },
            );
        }
        Ok(_) => {
            // Final round solved; the game ends once every player is done.
            if let Err(err) = finish_game_if_complete(state, &room.code).await {
                warn!(code = %room.code, error = %err, "failed to finalize game");
            }
        }
        Err(err) => {
            warn!(code = %code, id = %player_id, error = %err, "round advancement failed");
        }
    }
}

/// Transition the room to finished and broadcast the final scores once every
/// seated player has solved the last round.
async fn finish_game_if_complete(state: &SharedState, code: &str) -> Result<(), ServiceError> {
    let Some(room) = room_service::get_room(state, code).await? else {
        return Ok(());
    };

    if !round_service::all_players_finished(state, &room).await? {
        return Ok(());
    }

    let finished = room_service::update_room_state(state, code, RoomState::Finished).await?;
    let scores = round_service::player_scores(state, &finished).await?;
    room_events::broadcast_to_room(
        state,
        &finished,
        &ServerMessage::GameEnded {
            scores,
            timestamp: now_timestamp(),
        },
    );
    info!(code, "game ended");

    Ok(())
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
