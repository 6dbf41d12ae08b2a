use std::time::Duration;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{CachedCharacter, CharacterNameEntry, Room, RoundRecord, SecretCharacter};
use crate::dao::storage::StorageResult;

/// Abstraction over the volatile store holding all room and gameplay state.
///
/// Every write carries a time-to-live; expiry is enforced entirely by the
/// backing store, never by an in-process sweep. Because the state lives
/// outside process memory, any server instance can serve any room.
pub trait SessionStore: Send + Sync {
    /// Persist a room under its code, refreshing the time-to-live.
    fn save_room(&self, room: Room, ttl: Duration) -> BoxFuture<'static, StorageResult<()>>;
    /// Load a room by code. Structurally incomplete data is discarded, not repaired.
    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<Room>>>;
    /// Cheap existence probe used during code generation.
    fn room_exists(&self, code: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Every live room, used for disconnect cleanup scans.
    fn list_rooms(&self) -> BoxFuture<'static, StorageResult<Vec<Room>>>;
    /// Delete a room together with its secrets, cursors, and round records.
    /// Returns whether the room existed.
    fn delete_room(&self, code: String) -> BoxFuture<'static, StorageResult<bool>>;

    /// Persist the hidden answer key for a room. Write-once per game.
    fn save_secret_sequence(
        &self,
        code: String,
        secrets: Vec<SecretCharacter>,
        ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Load a room's answer key.
    fn find_secret_sequence(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<Vec<SecretCharacter>>>>;

    /// Store the round a player is currently attempting.
    fn save_round_cursor(
        &self,
        code: String,
        player_id: String,
        round: u32,
        ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Load a player's round cursor.
    fn find_round_cursor(
        &self,
        code: String,
        player_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<u32>>>;

    /// Upsert one player's guess record for one round.
    fn save_round_record(
        &self,
        record: RoundRecord,
        ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Load one player's guess record for one round.
    fn find_round_record(
        &self,
        code: String,
        player_id: String,
        round: u32,
    ) -> BoxFuture<'static, StorageResult<Option<RoundRecord>>>;

    /// Upsert a flattened character hash.
    fn save_cached_character(
        &self,
        character: CachedCharacter,
        ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Load a flattened character hash by character id.
    fn find_cached_character(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<CachedCharacter>>>;

    /// Write the autocomplete name index for an anime.
    fn save_character_index(
        &self,
        anime_id: Uuid,
        entries: Vec<CharacterNameEntry>,
        ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Load the autocomplete name index for an anime.
    fn find_character_index(
        &self,
        anime_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<Vec<CharacterNameEntry>>>>;
    /// Existence probe for the name index, keying the cache-build idempotency check.
    fn character_index_exists(&self, anime_id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Drop every cached character of an anime along with its name index.
    fn clear_character_cache(&self, anime_id: Uuid) -> BoxFuture<'static, StorageResult<()>>;

    /// Ping the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
