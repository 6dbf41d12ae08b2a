use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{AnimeEntity, AttributeEntity, CharacterEntity};
use crate::dao::storage::StorageResult;

/// One page of a catalog listing plus the unpaginated total.
#[derive(Debug, Clone)]
pub struct CatalogPage<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total number of matching items across all pages.
    pub total: u64,
}

/// Abstraction over the durable catalog of anime, characters, and attributes.
///
/// Writes are upserts keyed by entity id; the service layer performs
/// read-modify-write for partial updates.
pub trait CatalogStore: Send + Sync {
    /// Page through all anime, newest first.
    fn list_anime(
        &self,
        page: u64,
        per_page: u64,
    ) -> BoxFuture<'static, StorageResult<CatalogPage<AnimeEntity>>>;
    /// Load an anime by id.
    fn find_anime(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AnimeEntity>>>;
    /// Insert or replace an anime.
    fn save_anime(&self, anime: AnimeEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete an anime; returns whether it existed.
    fn delete_anime(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Page through all characters, newest first.
    fn list_characters(
        &self,
        page: u64,
        per_page: u64,
    ) -> BoxFuture<'static, StorageResult<CatalogPage<CharacterEntity>>>;
    /// Load a character by id.
    fn find_character(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<CharacterEntity>>>;
    /// All characters belonging to one anime.
    fn find_characters_by_anime(
        &self,
        anime_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<CharacterEntity>>>;
    /// Random distinct sample of up to `count` characters from one anime.
    fn sample_characters(
        &self,
        anime_id: Uuid,
        count: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<CharacterEntity>>>;
    /// Insert or replace a character.
    fn save_character(&self, character: CharacterEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a character; returns whether it existed.
    fn delete_character(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Page through all attribute definitions, newest first.
    fn list_attributes(
        &self,
        page: u64,
        per_page: u64,
    ) -> BoxFuture<'static, StorageResult<CatalogPage<AttributeEntity>>>;
    /// Load an attribute definition by id.
    fn find_attribute(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AttributeEntity>>>;
    /// All attribute definitions belonging to one anime, in creation order.
    fn find_attributes_by_anime(
        &self,
        anime_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AttributeEntity>>>;
    /// Insert or replace an attribute definition.
    fn save_attribute(&self, attribute: AttributeEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete an attribute definition; returns whether it existed.
    fn delete_attribute(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
}
