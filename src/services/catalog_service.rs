//! Catalog CRUD over anime, characters, and attribute definitions.
//!
//! Attribute values are validated against their declared types at this
//! write boundary, so gameplay code downstream never has to type-probe.
//! Character and attribute writes invalidate the anime's character cache.

use std::time::SystemTime;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::{
        catalog_store::CatalogPage,
        models::{
            AnimeEntity, AnimeStatus, AttributeEntity, AttributeValue, CharacterEntity,
            CharacterNameEntry,
        },
    },
    dto::catalog::{
        CreateAnimeRequest, CreateAttributeRequest, CreateCharacterRequest, UpdateAnimeRequest,
        UpdateAttributeRequest, UpdateCharacterRequest,
    },
    error::ServiceError,
    services::character_cache,
    state::SharedState,
};

/// Page through the anime catalog.
pub async fn list_anime(
    state: &SharedState,
    page: u64,
    per_page: u64,
) -> Result<CatalogPage<AnimeEntity>, ServiceError> {
    let catalog = state.require_catalog_store().await?;
    Ok(catalog.list_anime(page, per_page).await?)
}

/// Fetch one anime by id.
pub async fn get_anime(state: &SharedState, id: Uuid) -> Result<AnimeEntity, ServiceError> {
    let catalog = state.require_catalog_store().await?;
    catalog
        .find_anime(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Anime not found".into()))
}

/// Create a new anime entry.
pub async fn create_anime(
    state: &SharedState,
    request: CreateAnimeRequest,
) -> Result<AnimeEntity, ServiceError> {
    let catalog = state.require_catalog_store().await?;
    let now = SystemTime::now();
    let anime = AnimeEntity {
        id: Uuid::new_v4(),
        title: request.title,
        image_url: request.image_url,
        status: request.status.unwrap_or(AnimeStatus::Active),
        created_at: now,
        updated_at: now,
    };
    catalog.save_anime(anime.clone()).await?;
    Ok(anime)
}

/// Apply a partial update to an anime entry.
pub async fn update_anime(
    state: &SharedState,
    id: Uuid,
    request: UpdateAnimeRequest,
) -> Result<AnimeEntity, ServiceError> {
    let catalog = state.require_catalog_store().await?;
    let mut anime = catalog
        .find_anime(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Anime not found".into()))?;

    if let Some(title) = request.title {
        anime.title = title;
    }
    if let Some(image_url) = request.image_url {
        anime.image_url = Some(image_url);
    }
    if let Some(status) = request.status {
        anime.status = status;
    }
    anime.updated_at = SystemTime::now();

    catalog.save_anime(anime.clone()).await?;
    Ok(anime)
}

/// Delete an anime entry.
pub async fn delete_anime(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let catalog = state.require_catalog_store().await?;
    if !catalog.delete_anime(id).await? {
        return Err(ServiceError::NotFound("Anime not found".into()));
    }
    character_cache::clear_cache(state, id).await
}

/// Page through the character catalog.
pub async fn list_characters(
    state: &SharedState,
    page: u64,
    per_page: u64,
) -> Result<CatalogPage<CharacterEntity>, ServiceError> {
    let catalog = state.require_catalog_store().await?;
    Ok(catalog.list_characters(page, per_page).await?)
}

/// Fetch one character by id.
pub async fn get_character(
    state: &SharedState,
    id: Uuid,
) -> Result<CharacterEntity, ServiceError> {
    let catalog = state.require_catalog_store().await?;
    catalog
        .find_character(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Character not found".into()))
}

/// Create a character under an existing anime.
pub async fn create_character(
    state: &SharedState,
    request: CreateCharacterRequest,
) -> Result<CharacterEntity, ServiceError> {
    let catalog = state.require_catalog_store().await?;
    if catalog.find_anime(request.anime_id).await?.is_none() {
        return Err(ServiceError::NotFound("Anime not found".into()));
    }

    let definitions = catalog.find_attributes_by_anime(request.anime_id).await?;
    validate_attribute_values(&definitions, &request.attributes)?;

    let now = SystemTime::now();
    let character = CharacterEntity {
        id: Uuid::new_v4(),
        name: request.name,
        image_url: request.image_url,
        attributes: request.attributes,
        anime_id: request.anime_id,
        created_at: now,
        updated_at: now,
    };
    catalog.save_character(character.clone()).await?;
    character_cache::clear_cache(state, character.anime_id).await?;
    Ok(character)
}

/// Apply a partial update to a character.
pub async fn update_character(
    state: &SharedState,
    id: Uuid,
    request: UpdateCharacterRequest,
) -> Result<CharacterEntity, ServiceError> {
    let catalog = state.require_catalog_store().await?;
    let mut character = catalog
        .find_character(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Character not found".into()))?;

    if let Some(attributes) = &request.attributes {
        let definitions = catalog.find_attributes_by_anime(character.anime_id).await?;
        validate_attribute_values(&definitions, attributes)?;
    }

    if let Some(name) = request.name {
        character.name = name;
    }
    if let Some(image_url) = request.image_url {
        character.image_url = Some(image_url);
    }
    if let Some(attributes) = request.attributes {
        character.attributes = attributes;
    }
    character.updated_at = SystemTime::now();

    catalog.save_character(character.clone()).await?;
    character_cache::clear_cache(state, character.anime_id).await?;
    Ok(character)
}

/// Delete a character.
pub async fn delete_character(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let catalog = state.require_catalog_store().await?;
    let character = catalog
        .find_character(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Character not found".into()))?;

    catalog.delete_character(id).await?;
    character_cache::clear_cache(state, character.anime_id).await
}

/// Autocomplete names for an anime, priming the cache on first use.
pub async fn get_character_names(
    state: &SharedState,
    anime_id: Uuid,
) -> Result<Vec<CharacterNameEntry>, ServiceError> {
    character_cache::cache_characters_for_anime(state, anime_id).await?;
    character_cache::get_cached_character_names(state, anime_id).await
}

/// Attribute definitions for an anime, in creation order.
pub async fn get_attributes_for_anime(
    state: &SharedState,
    anime_id: Uuid,
) -> Result<Vec<AttributeEntity>, ServiceError> {
    let catalog = state.require_catalog_store().await?;
    Ok(catalog.find_attributes_by_anime(anime_id).await?)
}

/// Page through all attribute definitions.
pub async fn list_attributes(
    state: &SharedState,
    page: u64,
    per_page: u64,
) -> Result<CatalogPage<AttributeEntity>, ServiceError> {
    let catalog = state.require_catalog_store().await?;
    Ok(catalog.list_attributes(page, per_page).await?)
}

/// Fetch one attribute definition by id.
pub async fn get_attribute(
    state: &SharedState,
    id: Uuid,
) -> Result<AttributeEntity, ServiceError> {
    let catalog = state.require_catalog_store().await?;
    catalog
        .find_attribute(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Attribute not found".into()))
}

/// Create an attribute definition under an existing anime.
pub async fn create_attribute(
    state: &SharedState,
    request: CreateAttributeRequest,
) -> Result<AttributeEntity, ServiceError> {
    let catalog = state.require_catalog_store().await?;
    if catalog.find_anime(request.anime_id).await?.is_none() {
        return Err(ServiceError::NotFound("Anime not found".into()));
    }

    let existing = catalog.find_attributes_by_anime(request.anime_id).await?;
    if existing
        .iter()
        .any(|attribute| attribute.code == request.code)
    {
        return Err(ServiceError::Conflict(
            "Attribute code already exists for this anime.".into(),
        ));
    }

    let now = SystemTime::now();
    let attribute = AttributeEntity {
        id: Uuid::new_v4(),
        name: request.name,
        code: request.code,
        kind: request.kind,
        match_type: request.match_type,
        anime_id: request.anime_id,
        created_at: now,
        updated_at: now,
    };
    catalog.save_attribute(attribute.clone()).await?;
    character_cache::clear_cache(state, attribute.anime_id).await?;
    Ok(attribute)
}

/// Apply a partial update to an attribute definition.
pub async fn update_attribute(
    state: &SharedState,
    id: Uuid,
    request: UpdateAttributeRequest,
) -> Result<AttributeEntity, ServiceError> {
    let catalog = state.require_catalog_store().await?;
    let mut attribute = catalog
        .find_attribute(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Attribute not found".into()))?;

    if let Some(name) = request.name {
        attribute.name = name;
    }
    if let Some(match_type) = request.match_type {
        attribute.match_type = Some(match_type);
    }
    attribute.updated_at = SystemTime::now();

    catalog.save_attribute(attribute.clone()).await?;
    character_cache::clear_cache(state, attribute.anime_id).await?;
    Ok(attribute)
}

/// Delete an attribute definition.
pub async fn delete_attribute(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let catalog = state.require_catalog_store().await?;
    let attribute = catalog
        .find_attribute(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Attribute not found".into()))?;

    catalog.delete_attribute(id).await?;
    character_cache::clear_cache(state, attribute.anime_id).await
}

/// Reject attribute maps referencing unknown codes or mismatched value types.
fn validate_attribute_values(
    definitions: &[AttributeEntity],
    values: &IndexMap<String, AttributeValue>,
) -> Result<(), ServiceError> {
    for (code, value) in values {
        let Some(definition) = definitions.iter().find(|def| def.code == *code) else {
            return Err(ServiceError::InvalidInput(format!(
                "Unknown attribute code `{code}`."
            )));
        };

        if !value.matches_kind(definition.kind) {
            return Err(ServiceError::InvalidInput(format!(
                "Value for attribute `{code}` does not match its declared type."
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::models::{AttributeMatchType, AttributeType},
        services::testing::{anime_fixture, test_state},
    };

    async fn seeded_anime(state: &SharedState) -> Uuid {
        let anime_id = Uuid::new_v4();
        let catalog = state.catalog_store().await.unwrap();
        catalog.save_anime(anime_fixture(anime_id)).await.unwrap();
        anime_id
    }

    fn height_attribute(anime_id: Uuid) -> CreateAttributeRequest {
        CreateAttributeRequest {
            name: "Height".into(),
            code: "height".into(),
            kind: AttributeType::Number,
            match_type: Some(AttributeMatchType::RangeMatch),
            anime_id,
        }
    }

    #[tokio::test]
    async fn character_attributes_must_match_their_declared_type() {
        let (state, _, _) = test_state().await;
        let anime_id = seeded_anime(&state).await;
        create_attribute(&state, height_attribute(anime_id))
            .await
            .unwrap();

        let mut attributes = IndexMap::new();
        attributes.insert("height".to_string(), AttributeValue::Text("tall".into()));
        let err = create_character(
            &state,
            CreateCharacterRequest {
                name: "Saitama".into(),
                image_url: None,
                anime_id,
                attributes,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidInput(message) if message.contains("height")));
    }

    #[tokio::test]
    async fn unknown_attribute_codes_are_rejected() {
        let (state, _, _) = test_state().await;
        let anime_id = seeded_anime(&state).await;

        let mut attributes = IndexMap::new();
        attributes.insert("shoe_size".to_string(), AttributeValue::Number(43.0));
        let err = create_character(
            &state,
            CreateCharacterRequest {
                name: "Saitama".into(),
                image_url: None,
                anime_id,
                attributes,
            },
        )
        .await
        .unwrap_err();

        assert!(
            matches!(err, ServiceError::InvalidInput(message) if message.contains("shoe_size"))
        );
    }

    #[tokio::test]
    async fn duplicate_attribute_codes_conflict() {
        let (state, _, _) = test_state().await;
        let anime_id = seeded_anime(&state).await;

        create_attribute(&state, height_attribute(anime_id))
            .await
            .unwrap();
        let err = create_attribute(&state, height_attribute(anime_id))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn character_writes_invalidate_the_cache() {
        let (state, _, _) = test_state().await;
        let anime_id = seeded_anime(&state).await;

        create_character(
            &state,
            CreateCharacterRequest {
                name: "Saitama".into(),
                image_url: None,
                anime_id,
                attributes: IndexMap::new(),
            },
        )
        .await
        .unwrap();

        // Prime the cache, then write again and observe the index vanish.
        let names = get_character_names(&state, anime_id).await.unwrap();
        assert_eq!(names.len(), 1);

        create_character(
            &state,
            CreateCharacterRequest {
                name: "Genos".into(),
                image_url: None,
                anime_id,
                attributes: IndexMap::new(),
            },
        )
        .await
        .unwrap();

        let store = state.session_store().await.unwrap();
        assert!(!store.character_index_exists(anime_id).await.unwrap());

        // The next autocomplete request rebuilds the index with both names.
        let names = get_character_names(&state, anime_id).await.unwrap();
        assert_eq!(names.len(), 2);
    }

    #[tokio::test]
    async fn missing_catalog_rows_surface_as_not_found() {
        let (state, _, _) = test_state().await;

        assert!(matches!(
            get_anime(&state, Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            get_character(&state, Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            get_attribute(&state, Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
