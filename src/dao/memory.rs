//! In-memory implementations of the storage traits for service-level tests.
//!
//! TTLs are accepted and ignored; expiry behavior belongs to the real store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::dao::{
    catalog_store::{CatalogPage, CatalogStore},
    models::{
        AnimeEntity, AttributeEntity, CachedCharacter, CharacterEntity, CharacterNameEntry, Room,
        RoundRecord, SecretCharacter,
    },
    session_store::SessionStore,
    storage::StorageResult,
};

fn ready<T: Send + 'static>(value: T) -> BoxFuture<'static, StorageResult<T>> {
    Box::pin(async move { Ok(value) })
}

/// Mutex-guarded session state standing in for the shared volatile store.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<Mutex<SessionData>>,
}

#[derive(Default)]
struct SessionData {
    rooms: HashMap<String, Room>,
    secrets: HashMap<String, Vec<SecretCharacter>>,
    cursors: HashMap<(String, String), u32>,
    records: HashMap<(String, String, u32), RoundRecord>,
    characters: HashMap<Uuid, CachedCharacter>,
    indexes: HashMap<Uuid, Vec<CharacterNameEntry>>,
    cache_writes: usize,
}

impl MemorySessionStore {
    /// Number of cursor and record entries still keyed to the given room.
    pub fn room_scoped_key_count(&self, code: &str) -> usize {
        let data = self.inner.lock().unwrap();
        let cursors = data.cursors.keys().filter(|(room, _)| room == code).count();
        let records = data
            .records
            .keys()
            .filter(|(room, _, _)| room == code)
            .count();
        let secrets = usize::from(data.secrets.contains_key(code));
        cursors + records + secrets
    }

    /// How many cached-character writes have been issued, for idempotence checks.
    pub fn cache_write_count(&self) -> usize {
        self.inner.lock().unwrap().cache_writes
    }
}

impl SessionStore for MemorySessionStore {
    fn save_room(&self, room: Room, _ttl: Duration) -> BoxFuture<'static, StorageResult<()>> {
        let mut data = self.inner.lock().unwrap();
        data.rooms.insert(room.code.clone(), room);
        ready(())
    }

    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<Room>>> {
        let data = self.inner.lock().unwrap();
        ready(data.rooms.get(&code).cloned())
    }

    fn room_exists(&self, code: String) -> BoxFuture<'static, StorageResult<bool>> {
        let data = self.inner.lock().unwrap();
        ready(data.rooms.contains_key(&code))
    }

    fn list_rooms(&self) -> BoxFuture<'static, StorageResult<Vec<Room>>> {
        let data = self.inner.lock().unwrap();
        ready(data.rooms.values().cloned().collect())
    }

    fn delete_room(&self, code: String) -> BoxFuture<'static, StorageResult<bool>> {
        let mut data = self.inner.lock().unwrap();
        let existed = data.rooms.remove(&code).is_some();
        data.secrets.remove(&code);
        data.cursors.retain(|(room, _), _| room != &code);
        data.records.retain(|(room, _, _), _| room != &code);
        ready(existed)
    }

    fn save_secret_sequence(
        &self,
        code: String,
        secrets: Vec<SecretCharacter>,
        _ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let mut data = self.inner.lock().unwrap();
        data.secrets.insert(code, secrets);
        ready(())
    }

    fn find_secret_sequence(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<Vec<SecretCharacter>>>> {
        let data = self.inner.lock().unwrap();
        ready(data.secrets.get(&code).cloned())
    }

    fn save_round_cursor(
        &self,
        code: String,
        player_id: String,
        round: u32,
        _ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let mut data = self.inner.lock().unwrap();
        data.cursors.insert((code, player_id), round);
        ready(())
    }

    fn find_round_cursor(
        &self,
        code: String,
        player_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<u32>>> {
        let data = self.inner.lock().unwrap();
        ready(data.cursors.get(&(code, player_id)).copied())
    }

    fn save_round_record(
        &self,
        record: RoundRecord,
        _ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let mut data = self.inner.lock().unwrap();
        let key = (
            record.room_code.clone(),
            record.player_id.clone(),
            record.round,
        );
        data.records.insert(key, record);
        ready(())
    }

    fn find_round_record(
        &self,
        code: String,
        player_id: String,
        round: u32,
    ) -> BoxFuture<'static, StorageResult<Option<RoundRecord>>> {
        let data = self.inner.lock().unwrap();
        ready(data.records.get(&(code, player_id, round)).cloned())
    }

    fn save_cached_character(
        &self,
        character: CachedCharacter,
        _ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let mut data = self.inner.lock().unwrap();
        data.cache_writes += 1;
        data.characters.insert(character.id, character);
        ready(())
    }

    fn find_cached_character(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<CachedCharacter>>> {
        let data = self.inner.lock().unwrap();
        ready(data.characters.get(&id).cloned())
    }

    fn save_character_index(
        &self,
        anime_id: Uuid,
        entries: Vec<CharacterNameEntry>,
        _ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let mut data = self.inner.lock().unwrap();
        data.indexes.insert(anime_id, entries);
        ready(())
    }

    fn find_character_index(
        &self,
        anime_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<Vec<CharacterNameEntry>>>> {
        let data = self.inner.lock().unwrap();
        ready(data.indexes.get(&anime_id).cloned())
    }

    fn character_index_exists(&self, anime_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let data = self.inner.lock().unwrap();
        ready(data.indexes.contains_key(&anime_id))
    }

    fn clear_character_cache(&self, anime_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let mut data = self.inner.lock().unwrap();
        data.characters
            .retain(|_, character| character.anime_id != anime_id);
        data.indexes.remove(&anime_id);
        ready(())
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        ready(())
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        ready(())
    }
}

/// Mutex-guarded catalog state standing in for the durable store.
#[derive(Clone, Default)]
pub struct MemoryCatalogStore {
    inner: Arc<Mutex<CatalogData>>,
}

#[derive(Default)]
struct CatalogData {
    anime: HashMap<Uuid, AnimeEntity>,
    characters: HashMap<Uuid, CharacterEntity>,
    attributes: HashMap<Uuid, AttributeEntity>,
}

fn page_of<T: Clone>(mut items: Vec<T>, page: u64, per_page: u64) -> CatalogPage<T>
where
    T: Send,
{
    let total = items.len() as u64;
    let start = (page.saturating_sub(1) * per_page) as usize;
    let items = if start >= items.len() {
        Vec::new()
    } else {
        items.drain(start..).take(per_page as usize).collect()
    };
    CatalogPage { items, total }
}

impl CatalogStore for MemoryCatalogStore {
    fn list_anime(
        &self,
        page: u64,
        per_page: u64,
    ) -> BoxFuture<'static, StorageResult<CatalogPage<AnimeEntity>>> {
        let data = self.inner.lock().unwrap();
        let mut items: Vec<_> = data.anime.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        ready(page_of(items, page, per_page))
    }

    fn find_anime(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AnimeEntity>>> {
        let data = self.inner.lock().unwrap();
        ready(data.anime.get(&id).cloned())
    }

    fn save_anime(&self, anime: AnimeEntity) -> BoxFuture<'static, StorageResult<()>> {
        let mut data = self.inner.lock().unwrap();
        data.anime.insert(anime.id, anime);
        ready(())
    }

    fn delete_anime(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let mut data = self.inner.lock().unwrap();
        ready(data.anime.remove(&id).is_some())
    }

    fn list_characters(
        &self,
        page: u64,
        per_page: u64,
    ) -> BoxFuture<'static, StorageResult<CatalogPage<CharacterEntity>>> {
        let data = self.inner.lock().unwrap();
        let mut items: Vec<_> = data.characters.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        ready(page_of(items, page, per_page))
    }

    fn find_character(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<CharacterEntity>>> {
        let data = self.inner.lock().unwrap();
        ready(data.characters.get(&id).cloned())
    }

    fn find_characters_by_anime(
        &self,
        anime_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<CharacterEntity>>> {
        let data = self.inner.lock().unwrap();
        let mut items: Vec<_> = data
            .characters
            .values()
            .filter(|character| character.anime_id == anime_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        ready(items)
    }

    fn sample_characters(
        &self,
        anime_id: Uuid,
        count: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<CharacterEntity>>> {
        let data = self.inner.lock().unwrap();
        let mut items: Vec<_> = data
            .characters
            .values()
            .filter(|character| character.anime_id == anime_id)
            .cloned()
            .collect();
        items.shuffle(&mut rand::rng());
        items.truncate(count as usize);
        ready(items)
    }

    fn save_character(&self, character: CharacterEntity) -> BoxFuture<'static, StorageResult<()>> {
        let mut data = self.inner.lock().unwrap();
        data.characters.insert(character.id, character);
        ready(())
    }

    fn delete_character(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let mut data = self.inner.lock().unwrap();
        ready(data.characters.remove(&id).is_some())
    }

    fn list_attributes(
        &self,
        page: u64,
        per_page: u64,
    ) -> BoxFuture<'static, StorageResult<CatalogPage<AttributeEntity>>> {
        let data = self.inner.lock().unwrap();
        let mut items: Vec<_> = data.attributes.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        ready(page_of(items, page, per_page))
    }

    fn find_attribute(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AttributeEntity>>> {
        let data = self.inner.lock().unwrap();
        ready(data.attributes.get(&id).cloned())
    }

    fn find_attributes_by_anime(
        &self,
        anime_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AttributeEntity>>> {
        let data = self.inner.lock().unwrap();
        let mut items: Vec<_> = data
            .attributes
            .values()
            .filter(|attribute| attribute.anime_id == anime_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        ready(items)
    }

    fn save_attribute(&self, attribute: AttributeEntity) -> BoxFuture<'static, StorageResult<()>> {
        let mut data = self.inner.lock().unwrap();
        data.attributes.insert(attribute.id, attribute);
        ready(())
    }

    fn delete_attribute(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let mut data = self.inner.lock().unwrap();
        ready(data.attributes.remove(&id).is_some())
    }
}
