use axum::Router;

use crate::state::SharedState;

pub mod anime;
pub mod attributes;
pub mod characters;
pub mod docs;
pub mod health;
pub mod rooms;
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(rooms::router())
        .merge(anime::router())
        .merge(characters::router())
        .merge(attributes::router())
        .merge(websocket::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
