use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::{
        common::ApiResponse,
        room::{CreateRoomRequest, JoinRoomRequest, LeaveRoomRequest, RoomSnapshot},
        validation::normalize_room_code,
    },
    error::AppError,
    services::{room_service, room_service::CreateRoomParams},
    state::SharedState,
};

/// Routes managing room lifecycle over HTTP.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{code}", get(get_room))
        .route("/rooms/{code}/join", post(join_room))
        .route("/rooms/{code}/leave", post(leave_room))
}

#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created with the creator seated", body = RoomSnapshot),
        (status = 400, description = "Validation failure")
    )
)]
/// Create a room and seat the creating player in it.
pub async fn create_room(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RoomSnapshot>>), AppError> {
    payload.validate()?;

    let room = room_service::create_room(
        &state,
        CreateRoomParams {
            anime_id: payload.anime_id,
            rounds: payload.rounds,
            round_timer_secs: payload.round_timer,
            owner_id: payload.player.id.clone(),
        },
    )
    .await?;

    let joined = room_service::add_player(&state, &room.code, payload.player.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(RoomSnapshot::from(joined))),
    ))
}

#[utoipa::path(
    get,
    path = "/rooms/{code}",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code, case-insensitive")),
    responses(
        (status = 200, description = "Room found", body = RoomSnapshot),
        (status = 404, description = "Room missing or expired")
    )
)]
/// Fetch a room by its join code.
pub async fn get_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<RoomSnapshot>>, AppError> {
    let code = normalize_room_code(&code);
    let Some(room) = room_service::get_room(&state, &code).await? else {
        return Err(AppError::NotFound("Room not found".into()));
    };

    Ok(Json(ApiResponse::ok(RoomSnapshot::from(room))))
}

#[utoipa::path(
    post,
    path = "/rooms/{code}/join",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code, case-insensitive")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Player seated", body = RoomSnapshot),
        (status = 400, description = "Room full, duplicate player, or not joinable"),
        (status = 404, description = "Room missing or expired")
    )
)]
/// Seat a player in an existing lobby room.
pub async fn join_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<Json<ApiResponse<RoomSnapshot>>, AppError> {
    payload.validate()?;

    let code = normalize_room_code(&code);
    let room = room_service::add_player(&state, &code, payload.player.into()).await?;

    Ok(Json(ApiResponse::ok(RoomSnapshot::from(room))))
}

#[utoipa::path(
    post,
    path = "/rooms/{code}/leave",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code, case-insensitive")),
    request_body = LeaveRoomRequest,
    responses(
        (status = 200, description = "Player removed", body = RoomSnapshot),
        (status = 400, description = "Player not seated in the room"),
        (status = 404, description = "Room missing or expired")
    )
)]
/// Unseat a player from a room.
pub async fn leave_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<LeaveRoomRequest>,
) -> Result<Json<ApiResponse<RoomSnapshot>>, AppError> {
    payload.validate()?;

    let code = normalize_room_code(&code);
    let room = room_service::remove_player(&state, &code, &payload.player_id).await?;

    Ok(Json(ApiResponse::ok(RoomSnapshot::from(room))))
}
