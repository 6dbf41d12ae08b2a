use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        catalog::{CharacterDto, CreateCharacterRequest, UpdateCharacterRequest},
        common::{ApiResponse, PageQuery, PaginatedResponse},
    },
    error::AppError,
    services::catalog_service,
    state::SharedState,
};

/// Routes for the character catalog.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/characters", get(list_characters).post(create_character))
        .route(
            "/characters/{id}",
            get(get_character)
                .put(update_character)
                .delete(delete_character),
        )
}

#[utoipa::path(
    get,
    path = "/characters",
    tag = "catalog",
    params(PageQuery),
    responses((status = 200, description = "Paginated character listing", body = [CharacterDto]))
)]
/// Page through the character catalog.
pub async fn list_characters(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<CharacterDto>>, AppError> {
    let (page, per_page) = (query.page(), query.per_page());
    let listing = catalog_service::list_characters(&state, page, per_page).await?;

    Ok(Json(PaginatedResponse {
        success: true,
        result: listing.items.into_iter().map(Into::into).collect(),
        page,
        per_page,
        total: listing.total,
    }))
}

#[utoipa::path(
    get,
    path = "/characters/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Character id")),
    responses(
        (status = 200, description = "Character found", body = CharacterDto),
        (status = 404, description = "Character missing")
    )
)]
/// Fetch one character by id.
pub async fn get_character(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CharacterDto>>, AppError> {
    let character = catalog_service::get_character(&state, id).await?;
    Ok(Json(ApiResponse::ok(character.into())))
}

#[utoipa::path(
    post,
    path = "/characters",
    tag = "catalog",
    request_body = CreateCharacterRequest,
    responses(
        (status = 201, description = "Character created", body = CharacterDto),
        (status = 400, description = "Unknown attribute code or mismatched value type")
    )
)]
/// Create a character with type-checked attribute values.
pub async fn create_character(
    State(state): State<SharedState>,
    Json(payload): Json<CreateCharacterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CharacterDto>>), AppError> {
    payload.validate()?;
    let character = catalog_service::create_character(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(character.into()))))
}

#[utoipa::path(
    put,
    path = "/characters/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Character id")),
    request_body = UpdateCharacterRequest,
    responses(
        (status = 200, description = "Character updated", body = CharacterDto),
        (status = 404, description = "Character missing")
    )
)]
/// Apply a partial update to a character.
pub async fn update_character(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCharacterRequest>,
) -> Result<Json<ApiResponse<CharacterDto>>, AppError> {
    payload.validate()?;
    let character = catalog_service::update_character(&state, id, payload).await?;
    Ok(Json(ApiResponse::ok(character.into())))
}

#[utoipa::path(
    delete,
    path = "/characters/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Character id")),
    responses(
        (status = 200, description = "Character deleted"),
        (status = 404, description = "Character missing")
    )
)]
/// Delete a character.
pub async fn delete_character(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    catalog_service::delete_character(&state, id).await?;
    Ok(Json(ApiResponse::ok(true)))
}
