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
        catalog::{AttributeDto, CreateAttributeRequest, UpdateAttributeRequest},
        common::{ApiResponse, PageQuery, PaginatedResponse},
    },
    error::AppError,
    services::catalog_service,
    state::SharedState,
};

/// Routes for attribute definitions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/attributes", get(list_attributes).post(create_attribute))
        .route(
            "/attributes/{id}",
            get(get_attribute)
                .put(update_attribute)
                .delete(delete_attribute),
        )
}

#[utoipa::path(
    get,
    path = "/attributes",
    tag = "catalog",
    params(PageQuery),
    responses((status = 200, description = "Paginated attribute listing", body = [AttributeDto]))
)]
/// Page through all attribute definitions.
pub async fn list_attributes(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<AttributeDto>>, AppError> {
    let (page, per_page) = (query.page(), query.per_page());
    let listing = catalog_service::list_attributes(&state, page, per_page).await?;

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
    path = "/attributes/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Attribute id")),
    responses(
        (status = 200, description = "Attribute found", body = AttributeDto),
        (status = 404, description = "Attribute missing")
    )
)]
/// Fetch one attribute definition by id.
pub async fn get_attribute(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AttributeDto>>, AppError> {
    let attribute = catalog_service::get_attribute(&state, id).await?;
    Ok(Json(ApiResponse::ok(attribute.into())))
}

#[utoipa::path(
    post,
    path = "/attributes",
    tag = "catalog",
    request_body = CreateAttributeRequest,
    responses(
        (status = 201, description = "Attribute created", body = AttributeDto),
        (status = 400, description = "Duplicate code within the anime")
    )
)]
/// Create an attribute definition.
pub async fn create_attribute(
    State(state): State<SharedState>,
    Json(payload): Json<CreateAttributeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AttributeDto>>), AppError> {
    payload.validate()?;
    let attribute = catalog_service::create_attribute(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(attribute.into()))))
}

#[utoipa::path(
    put,
    path = "/attributes/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Attribute id")),
    request_body = UpdateAttributeRequest,
    responses(
        (status = 200, description = "Attribute updated", body = AttributeDto),
        (status = 404, description = "Attribute missing")
    )
)]
/// Apply a partial update to an attribute definition.
pub async fn update_attribute(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAttributeRequest>,
) -> Result<Json<ApiResponse<AttributeDto>>, AppError> {
    payload.validate()?;
    let attribute = catalog_service::update_attribute(&state, id, payload).await?;
    Ok(Json(ApiResponse::ok(attribute.into())))
}

#[utoipa::path(
    delete,
    path = "/attributes/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Attribute id")),
    responses(
        (status = 200, description = "Attribute deleted"),
        (status = 404, description = "Attribute missing")
    )
)]
/// Delete an attribute definition.
pub async fn delete_attribute(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    catalog_service::delete_attribute(&state, id).await?;
    Ok(Json(ApiResponse::ok(true)))
}
