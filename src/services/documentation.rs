use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the AniGuess backend.
#[openapi(
    paths(
        crate::routes::health::health,
        crate::routes::health::ping,
        crate::routes::rooms::create_room,
        crate::routes::rooms::get_room,
        crate::routes::rooms::join_room,
        crate::routes::rooms::leave_room,
        crate::routes::anime::list_anime,
        crate::routes::anime::get_anime,
        crate::routes::anime::create_anime,
        crate::routes::anime::update_anime,
        crate::routes::anime::delete_anime,
        crate::routes::anime::character_names,
        crate::routes::anime::anime_attributes,
        crate::routes::characters::list_characters,
        crate::routes::characters::get_character,
        crate::routes::characters::create_character,
        crate::routes::characters::update_character,
        crate::routes::characters::delete_character,
        crate::routes::attributes::list_attributes,
        crate::routes::attributes::get_attribute,
        crate::routes::attributes::create_attribute,
        crate::routes::attributes::update_attribute,
        crate::routes::attributes::delete_attribute,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::PingResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::LeaveRoomRequest,
            crate::dto::room::RoomSnapshot,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
            crate::dto::ws::GuessResultMessage,
            crate::dao::models::RoomState,
            crate::dao::models::EvaluationStatus,
        )
    ),
    tags(
        (name = "health", description = "Health and liveness endpoints"),
        (name = "rooms", description = "Room lifecycle operations"),
        (name = "catalog", description = "Anime, character, and attribute CRUD"),
    )
)]
pub struct ApiDoc;
