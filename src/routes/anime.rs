use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::CharacterNameEntry,
    dto::{
        catalog::{AnimeDto, AttributeDto, CreateAnimeRequest, UpdateAnimeRequest},
        common::{ApiResponse, PageQuery, PaginatedResponse},
    },
    error::AppError,
    services::catalog_service,
    state::SharedState,
};

/// Routes for the anime catalog plus its per-anime lookups.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/anime", get(list_anime).post(create_anime))
        .route(
            "/anime/{id}",
            get(get_anime).put(update_anime).delete(delete_anime),
        )
        .route("/anime/{id}/characters", get(character_names))
        .route("/anime/{id}/attributes", get(anime_attributes))
}

#[utoipa::path(
    get,
    path = "/anime",
    tag = "catalog",
    params(PageQuery),
    responses((status = 200, description = "Paginated anime listing", body = [AnimeDto]))
)]
/// Page through the anime catalog.
pub async fn list_anime(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<AnimeDto>>, AppError> {
    let (page, per_page) = (query.page(), query.per_page());
    let listing = catalog_service::list_anime(&state, page, per_page).await?;

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
    path = "/anime/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Anime id")),
    responses(
        (status = 200, description = "Anime found", body = AnimeDto),
        (status = 404, description = "Anime missing")
    )
)]
/// Fetch one anime by id.
pub async fn get_anime(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AnimeDto>>, AppError> {
    let anime = catalog_service::get_anime(&state, id).await?;
    Ok(Json(ApiResponse::ok(anime.into())))
}

#[utoipa::path(
    post,
    path = "/anime",
    tag = "catalog",
    request_body = CreateAnimeRequest,
    responses((status = 201, description = "Anime created", body = AnimeDto))
)]
/// Create a new anime entry.
pub async fn create_anime(
    State(state): State<SharedState>,
    Json(payload): Json<CreateAnimeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AnimeDto>>), AppError> {
    payload.validate()?;
    let anime = catalog_service::create_anime(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(anime.into()))))
}

#[utoipa::path(
    put,
    path = "/anime/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Anime id")),
    request_body = UpdateAnimeRequest,
    responses(
        (status = 200, description = "Anime updated", body = AnimeDto),
        (status = 404, description = "Anime missing")
    )
)]
/// Apply a partial update to an anime entry.
pub async fn update_anime(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAnimeRequest>,
) -> Result<Json<ApiResponse<AnimeDto>>, AppError> {
    payload.validate()?;
    let anime = catalog_service::update_anime(&state, id, payload).await?;
    Ok(Json(ApiResponse::ok(anime.into())))
}

#[utoipa::path(
    delete,
    path = "/anime/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Anime id")),
    responses(
        (status = 200, description = "Anime deleted"),
        (status = 404, description = "Anime missing")
    )
)]
/// Delete an anime entry.
pub async fn delete_anime(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    catalog_service::delete_anime(&state, id).await?;
    Ok(Json(ApiResponse::ok(true)))
}

#[utoipa::path(
    get,
    path = "/anime/{id}/characters",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Anime id")),
    responses((status = 200, description = "Autocomplete names for the anime", body = [CharacterNameEntry]))
)]
/// Autocomplete character names for an anime, priming the cache on first use.
pub async fn character_names(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<CharacterNameEntry>>>, AppError> {
    let names = catalog_service::get_character_names(&state, id).await?;
    Ok(Json(ApiResponse::ok(names)))
}

#[utoipa::path(
    get,
    path = "/anime/{id}/attributes",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Anime id")),
    responses((status = 200, description = "Attribute definitions for the anime", body = [AttributeDto]))
)]
/// Attribute definitions of an anime, used by clients to label feedback.
pub async fn anime_attributes(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<AttributeDto>>>, AppError> {
    let attributes = catalog_service::get_attributes_for_anime(&state, id).await?;
    Ok(Json(ApiResponse::ok(
        attributes.into_iter().map(Into::into).collect(),
    )))
}
