/// Catalog CRUD for anime, characters, and attribute definitions.
pub mod catalog_service;
/// Character cache materialization for fast guess evaluation.
pub mod character_cache;
/// OpenAPI documentation aggregation.
pub mod documentation;
/// Attribute evaluation scoring for guesses.
pub mod evaluation;
/// Health check service.
pub mod health_service;
/// WebSocket fan-out helpers scoped to room membership.
pub mod room_events;
/// Room lifecycle management.
pub mod room_service;
/// Round progression and guess handling.
pub mod round_service;
/// Storage connection supervision with degraded-mode fallback.
pub mod storage_supervisor;
/// WebSocket connection and message handling.
pub mod websocket_service;

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures wiring the in-memory stores into a real [`AppState`].

    use std::sync::Arc;
    use std::time::SystemTime;

    use indexmap::IndexMap;
    use uuid::Uuid;

    use crate::{
        config::AppConfig,
        dao::{
            memory::{MemoryCatalogStore, MemorySessionStore},
            models::{
                AnimeEntity, AnimeStatus, AttributeEntity, AttributeMatchType, AttributeType,
                AttributeValue, CharacterEntity,
            },
        },
        services::room_service::CreateRoomParams,
        state::{AppState, Backends, SharedState},
    };

    pub async fn test_state() -> (SharedState, MemorySessionStore, MemoryCatalogStore) {
        let state = AppState::new(AppConfig::default());
        let session = MemorySessionStore::default();
        let catalog = MemoryCatalogStore::default();
        state
            .install_backends(Backends::new(
                Arc::new(session.clone()),
                Arc::new(catalog.clone()),
            ))
            .await;
        (state, session, catalog)
    }

    pub fn sample_params() -> CreateRoomParams {
        CreateRoomParams {
            anime_id: Uuid::new_v4(),
            rounds: 3,
            round_timer_secs: 60,
            owner_id: "creator".into(),
        }
    }

    pub fn anime_fixture(id: Uuid) -> AnimeEntity {
        let now = SystemTime::now();
        AnimeEntity {
            id,
            title: "One Punch Man".into(),
            image_url: None,
            status: AnimeStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn attribute_fixture(
        anime_id: Uuid,
        code: &str,
        kind: AttributeType,
        match_type: Option<AttributeMatchType>,
    ) -> AttributeEntity {
        let now = SystemTime::now();
        AttributeEntity {
            id: Uuid::new_v4(),
            name: code.to_string(),
            code: code.to_string(),
            kind,
            match_type,
            anime_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn character_fixture(
        anime_id: Uuid,
        name: &str,
        attributes: IndexMap<String, AttributeValue>,
    ) -> CharacterEntity {
        let now = SystemTime::now();
        CharacterEntity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            image_url: None,
            attributes,
            anime_id,
            created_at: now,
            updated_at: now,
        }
    }
}
