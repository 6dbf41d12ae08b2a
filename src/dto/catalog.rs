use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{
        AnimeEntity, AnimeStatus, AttributeEntity, AttributeMatchType, AttributeType,
        AttributeValue, CharacterEntity,
    },
    dto::format_system_time,
};

/// Public projection of a catalog anime.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnimeDto {
    /// Primary key.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Optional cover image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Visibility status.
    pub status: AnimeStatus,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

impl From<AnimeEntity> for AnimeDto {
    fn from(value: AnimeEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            image_url: value.image_url,
            status: value.status,
            created_at: format_system_time(value.created_at),
            updated_at: format_system_time(value.updated_at),
        }
    }
}

/// Payload creating a catalog anime.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnimeRequest {
    /// Display title.
    #[validate(length(min = 1, max = 255, message = "Title must not be empty"))]
    pub title: String,
    /// Optional cover image URL.
    #[validate(length(max = 500))]
    pub image_url: Option<String>,
    /// Visibility status; defaults to active.
    pub status: Option<AnimeStatus>,
}

/// Partial update for a catalog anime; absent fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnimeRequest {
    /// New display title.
    #[validate(length(min = 1, max = 255, message = "Title must not be empty"))]
    pub title: Option<String>,
    /// New cover image URL.
    #[validate(length(max = 500))]
    pub image_url: Option<String>,
    /// New visibility status.
    pub status: Option<AnimeStatus>,
}

/// Public projection of a catalog character.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDto {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional portrait image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Attribute values keyed by attribute code.
    pub attributes: IndexMap<String, AttributeValue>,
    /// Owning anime.
    pub anime_id: Uuid,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

impl From<CharacterEntity> for CharacterDto {
    fn from(value: CharacterEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            image_url: value.image_url,
            attributes: value.attributes,
            anime_id: value.anime_id,
            created_at: format_system_time(value.created_at),
            updated_at: format_system_time(value.updated_at),
        }
    }
}

/// Payload creating a catalog character.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCharacterRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255, message = "Character name must not be empty"))]
    pub name: String,
    /// Optional portrait image URL.
    #[validate(length(max = 500))]
    pub image_url: Option<String>,
    /// Owning anime.
    pub anime_id: Uuid,
    /// Attribute values keyed by attribute code; validated against the
    /// anime's attribute definitions.
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeValue>,
}

/// Partial update for a catalog character; absent fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCharacterRequest {
    /// New display name.
    #[validate(length(min = 1, max = 255, message = "Character name must not be empty"))]
    pub name: Option<String>,
    /// New portrait image URL.
    #[validate(length(max = 500))]
    pub image_url: Option<String>,
    /// Replacement attribute map.
    pub attributes: Option<IndexMap<String, AttributeValue>>,
}

/// Public projection of an attribute definition.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDto {
    /// Primary key.
    pub id: Uuid,
    /// Human-readable label.
    pub name: String,
    /// Stable code keying character attribute maps.
    pub code: String,
    /// Declared value type.
    #[serde(rename = "type")]
    pub kind: AttributeType,
    /// Scoring policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_type: Option<AttributeMatchType>,
    /// Owning anime.
    pub anime_id: Uuid,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

impl From<AttributeEntity> for AttributeDto {
    fn from(value: AttributeEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            code: value.code,
            kind: value.kind,
            match_type: value.match_type,
            anime_id: value.anime_id,
            created_at: format_system_time(value.created_at),
            updated_at: format_system_time(value.updated_at),
        }
    }
}

/// Payload creating an attribute definition.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttributeRequest {
    /// Human-readable label.
    #[validate(length(min = 1, max = 255, message = "Attribute name must not be empty"))]
    pub name: String,
    /// Stable code, unique within the anime.
    #[validate(length(min = 1, max = 100, message = "Attribute code must not be empty"))]
    pub code: String,
    /// Declared value type.
    #[serde(rename = "type")]
    pub kind: AttributeType,
    /// Scoring policy; absent means exact matching.
    pub match_type: Option<AttributeMatchType>,
    /// Owning anime.
    pub anime_id: Uuid,
}

/// Partial update for an attribute definition. The code and value type are
/// immutable once characters may reference them.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttributeRequest {
    /// New human-readable label.
    #[validate(length(min = 1, max = 255, message = "Attribute name must not be empty"))]
    pub name: Option<String>,
    /// New scoring policy.
    pub match_type: Option<AttributeMatchType>,
}
