//! Materializes catalog characters into fast-lookup cache entries.
//!
//! Guess evaluation runs many times per second across concurrent rooms;
//! resolving attribute data through the session store keeps the relational
//! catalog out of the hot path. The first game start per anime pays the full
//! fetch cost, after that the index existence check short-circuits.

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{CachedCharacter, CharacterNameEntry},
    error::ServiceError,
    state::SharedState,
};

/// Populate the cache for an anime unless its name index already exists.
///
/// When the anime has no characters nothing is written, including the index,
/// so the next call retries the fetch instead of caching emptiness.
pub async fn cache_characters_for_anime(
    state: &SharedState,
    anime_id: Uuid,
) -> Result<(), ServiceError> {
    let session = state.require_session_store().await?;

    if session.character_index_exists(anime_id).await? {
        return Ok(());
    }

    let catalog = state.require_catalog_store().await?;
    let characters = catalog.find_characters_by_anime(anime_id).await?;
    if characters.is_empty() {
        return Ok(());
    }

    let ttl = state.config().character_cache_ttl();
    let mut entries = Vec::with_capacity(characters.len());

    for character in &characters {
        session
            .save_cached_character(CachedCharacter::from(character), ttl)
            .await?;
        entries.push(CharacterNameEntry {
            id: character.id,
            name: character.name.clone(),
        });
    }

    let cached = entries.len();
    session.save_character_index(anime_id, entries, ttl).await?;
    info!(%anime_id, cached, "character cache populated");

    Ok(())
}

/// Fetch one flattened character hash.
pub async fn get_cached_character(
    state: &SharedState,
    id: Uuid,
) -> Result<Option<CachedCharacter>, ServiceError> {
    let session = state.require_session_store().await?;
    Ok(session.find_cached_character(id).await?)
}

/// Fetch the autocomplete name index for an anime, empty when uncached.
pub async fn get_cached_character_names(
    state: &SharedState,
    anime_id: Uuid,
) -> Result<Vec<CharacterNameEntry>, ServiceError> {
    let session = state.require_session_store().await?;
    Ok(session
        .find_character_index(anime_id)
        .await?
        .unwrap_or_default())
}

/// Drop an anime's cached characters and name index after catalog changes.
pub async fn clear_cache(state: &SharedState, anime_id: Uuid) -> Result<(), ServiceError> {
    let session = state.require_session_store().await?;
    session.clear_character_cache(anime_id).await?;
    info!(%anime_id, "character cache cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::models::AttributeValue,
        services::testing::{anime_fixture, character_fixture, test_state},
    };
    use indexmap::IndexMap;

    #[tokio::test]
    async fn second_build_is_a_no_op() {
        let (state, session, _) = test_state().await;
        let anime_id = Uuid::new_v4();
        let catalog = state.catalog_store().await.unwrap();
        catalog.save_anime(anime_fixture(anime_id)).await.unwrap();

        for name in ["Saitama", "Genos"] {
            let mut attributes = IndexMap::new();
            attributes.insert("hair".to_string(), AttributeValue::Text("none".into()));
            catalog
                .save_character(character_fixture(anime_id, name, attributes))
                .await
                .unwrap();
        }

        cache_characters_for_anime(&state, anime_id).await.unwrap();
        let writes_after_first = session.cache_write_count();
        assert_eq!(writes_after_first, 2);

        cache_characters_for_anime(&state, anime_id).await.unwrap();
        assert_eq!(session.cache_write_count(), writes_after_first);
    }

    #[tokio::test]
    async fn empty_anime_leaves_no_index_so_the_fetch_retries() {
        let (state, session, _) = test_state().await;
        let anime_id = Uuid::new_v4();

        cache_characters_for_anime(&state, anime_id).await.unwrap();
        assert_eq!(session.cache_write_count(), 0);
        assert!(
            get_cached_character_names(&state, anime_id)
                .await
                .unwrap()
                .is_empty()
        );

        // Once characters exist, the next call performs the real build.
        let catalog = state.catalog_store().await.unwrap();
        catalog
            .save_character(character_fixture(anime_id, "Saitama", IndexMap::new()))
            .await
            .unwrap();
        cache_characters_for_anime(&state, anime_id).await.unwrap();

        let names = get_cached_character_names(&state, anime_id).await.unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].name, "Saitama");
    }

    #[tokio::test]
    async fn cached_entries_carry_flattened_attributes() {
        let (state, _, _) = test_state().await;
        let anime_id = Uuid::new_v4();
        let catalog = state.catalog_store().await.unwrap();

        let mut attributes = IndexMap::new();
        attributes.insert("height".to_string(), AttributeValue::Number(175.0));
        attributes.insert(
            "genres".to_string(),
            AttributeValue::List(vec!["Action".into(), "Comedy".into()]),
        );
        let character = character_fixture(anime_id, "Saitama", attributes);
        let character_id = character.id;
        catalog.save_character(character).await.unwrap();

        cache_characters_for_anime(&state, anime_id).await.unwrap();

        let cached = get_cached_character(&state, character_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cached.attributes["height"], "175");
        assert_eq!(cached.attributes["genres"], r#"["Action","Comedy"]"#);
    }

    #[tokio::test]
    async fn clearing_removes_entries_and_index() {
        let (state, _, _) = test_state().await;
        let anime_id = Uuid::new_v4();
        let catalog = state.catalog_store().await.unwrap();

        let character = character_fixture(anime_id, "Saitama", IndexMap::new());
        let character_id = character.id;
        catalog.save_character(character).await.unwrap();
        cache_characters_for_anime(&state, anime_id).await.unwrap();

        clear_cache(&state, anime_id).await.unwrap();

        assert!(
            get_cached_character(&state, character_id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            get_cached_character_names(&state, anime_id)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
