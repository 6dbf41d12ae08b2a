use std::time::Duration;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::bson::{self, Document, doc};
use tracing::warn;
use uuid::Uuid;

use super::{
    error::{MongoDaoError, MongoResult},
    models::{
        CachedCharacterDocument, CharacterIndexDocument, RoomDocument, RoundCursorDocument,
        RoundRecordDocument, SecretSequenceDocument, expiry_from_now, uuid_as_binary,
    },
    store::{
        CHARACTER_CACHE_COLLECTION, CHARACTER_INDEX_COLLECTION, CURSOR_COLLECTION, MongoBackend,
        RECORD_COLLECTION, ROOM_COLLECTION, SECRET_COLLECTION,
    },
};
use crate::dao::{
    models::{CachedCharacter, CharacterNameEntry, Room, RoundRecord, SecretCharacter},
    session_store::SessionStore,
    storage::StorageResult,
};

impl MongoBackend {
    /// Decode a raw room document, discarding structurally incomplete data.
    ///
    /// A room that cannot be decoded is treated as absent rather than
    /// repaired; the TTL index disposes of the stale document eventually.
    fn decode_room(document: Document) -> Option<Room> {
        match bson::deserialize_from_document::<RoomDocument>(document) {
            Ok(decoded) => Some(decoded.into()),
            Err(err) => {
                warn!(error = %err, "discarding structurally invalid room document");
                None
            }
        }
    }

    async fn load_room(&self, code: &str) -> MongoResult<Option<Room>> {
        let collection = self.collection::<Document>(ROOM_COLLECTION).await;
        let document = collection
            .find_one(doc! {"_id": code})
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: ROOM_COLLECTION,
                source,
            })?;

        Ok(document.and_then(Self::decode_room))
    }
}

impl SessionStore for MongoBackend {
    fn save_room(&self, room: Room, ttl: Duration) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let code = room.code.clone();
            let document: RoomDocument = (room, expiry_from_now(ttl)).into();
            let collection = store.collection::<RoomDocument>(ROOM_COLLECTION).await;
            collection
                .replace_one(doc! {"_id": &code}, &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::Write {
                    collection: ROOM_COLLECTION,
                    source,
                })?;
            Ok(())
        })
    }

    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<Room>>> {
        let store = self.clone();
        Box::pin(async move { store.load_room(&code).await.map_err(Into::into) })
    }

    fn room_exists(&self, code: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store.collection::<Document>(ROOM_COLLECTION).await;
            let found = collection
                .find_one(doc! {"_id": &code})
                .projection(doc! {"_id": 1})
                .await
                .map_err(|source| MongoDaoError::Read {
                    collection: ROOM_COLLECTION,
                    source,
                })?;
            Ok(found.is_some())
        })
    }

    fn list_rooms(&self) -> BoxFuture<'static, StorageResult<Vec<Room>>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store.collection::<Document>(ROOM_COLLECTION).await;
            let documents: Vec<Document> = collection
                .find(doc! {})
                .await
                .map_err(|source| MongoDaoError::Read {
                    collection: ROOM_COLLECTION,
                    source,
                })?
                .try_collect()
                .await
                .map_err(|source| MongoDaoError::Read {
                    collection: ROOM_COLLECTION,
                    source,
                })?;

            Ok(documents
                .into_iter()
                .filter_map(MongoBackend::decode_room)
                .collect())
        })
    }

    fn delete_room(&self, code: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let database = store.database().await;
            let scoped = doc! {"room_code": &code};

            // Dependent state goes first so a partial failure cannot leave a
            // room pointing at missing records; the TTL index mops up any
            // orphans if the process dies mid-delete.
            for name in [RECORD_COLLECTION, CURSOR_COLLECTION] {
                database
                    .collection::<Document>(name)
                    .delete_many(scoped.clone())
                    .await
                    .map_err(|source| MongoDaoError::Delete {
                        collection: name,
                        source,
                    })?;
            }

            database
                .collection::<Document>(SECRET_COLLECTION)
                .delete_one(doc! {"_id": &code})
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: SECRET_COLLECTION,
                    source,
                })?;

            let result = database
                .collection::<Document>(ROOM_COLLECTION)
                .delete_one(doc! {"_id": &code})
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: ROOM_COLLECTION,
                    source,
                })?;

            Ok(result.deleted_count > 0)
        })
    }

    fn save_secret_sequence(
        &self,
        code: String,
        secrets: Vec<SecretCharacter>,
        ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let document = SecretSequenceDocument {
                room_code: code.clone(),
                characters: secrets,
                expire_at: expiry_from_now(ttl),
            };
            let collection = store
                .collection::<SecretSequenceDocument>(SECRET_COLLECTION)
                .await;
            collection
                .replace_one(doc! {"_id": &code}, &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::Write {
                    collection: SECRET_COLLECTION,
                    source,
                })?;
            Ok(())
        })
    }

    fn find_secret_sequence(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<Vec<SecretCharacter>>>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store
                .collection::<SecretSequenceDocument>(SECRET_COLLECTION)
                .await;
            let document = collection
                .find_one(doc! {"_id": &code})
                .await
                .map_err(|source| MongoDaoError::Read {
                    collection: SECRET_COLLECTION,
                    source,
                })?;
            Ok(document.map(|doc| doc.characters))
        })
    }

    fn save_round_cursor(
        &self,
        code: String,
        player_id: String,
        round: u32,
        ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let document = RoundCursorDocument {
                room_code: code.clone(),
                player_id: player_id.clone(),
                round,
                expire_at: expiry_from_now(ttl),
            };
            let collection = store
                .collection::<RoundCursorDocument>(CURSOR_COLLECTION)
                .await;
            collection
                .replace_one(doc! {"room_code": &code, "player_id": &player_id}, &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::Write {
                    collection: CURSOR_COLLECTION,
                    source,
                })?;
            Ok(())
        })
    }

    fn find_round_cursor(
        &self,
        code: String,
        player_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<u32>>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store
                .collection::<RoundCursorDocument>(CURSOR_COLLECTION)
                .await;
            let document = collection
                .find_one(doc! {"room_code": &code, "player_id": &player_id})
                .await
                .map_err(|source| MongoDaoError::Read {
                    collection: CURSOR_COLLECTION,
                    source,
                })?;
            Ok(document.map(|doc| doc.round))
        })
    }

    fn save_round_record(
        &self,
        record: RoundRecord,
        ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let document: RoundRecordDocument = (record, expiry_from_now(ttl)).into();
            let collection = store
                .collection::<RoundRecordDocument>(RECORD_COLLECTION)
                .await;
            collection
                .replace_one(
                    doc! {
                        "room_code": &document.room_code,
                        "player_id": &document.player_id,
                        "round": document.round,
                    },
                    &document,
                )
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::Write {
                    collection: RECORD_COLLECTION,
                    source,
                })?;
            Ok(())
        })
    }

    fn find_round_record(
        &self,
        code: String,
        player_id: String,
        round: u32,
    ) -> BoxFuture<'static, StorageResult<Option<RoundRecord>>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store
                .collection::<RoundRecordDocument>(RECORD_COLLECTION)
                .await;
            let document = collection
                .find_one(doc! {"room_code": &code, "player_id": &player_id, "round": round})
                .await
                .map_err(|source| MongoDaoError::Read {
                    collection: RECORD_COLLECTION,
                    source,
                })?;
            Ok(document.map(Into::into))
        })
    }

    fn save_cached_character(
        &self,
        character: CachedCharacter,
        ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let id = character.id;
        Box::pin(async move {
            let document: CachedCharacterDocument = (character, expiry_from_now(ttl)).into();
            let collection = store
                .collection::<CachedCharacterDocument>(CHARACTER_CACHE_COLLECTION)
                .await;
            collection
                .replace_one(doc! {"_id": uuid_as_binary(id)}, &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::Write {
                    collection: CHARACTER_CACHE_COLLECTION,
                    source,
                })?;
            Ok(())
        })
    }

    fn find_cached_character(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<CachedCharacter>>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store
                .collection::<CachedCharacterDocument>(CHARACTER_CACHE_COLLECTION)
                .await;
            let document = collection
                .find_one(doc! {"_id": uuid_as_binary(id)})
                .await
                .map_err(|source| MongoDaoError::Read {
                    collection: CHARACTER_CACHE_COLLECTION,
                    source,
                })?;
            Ok(document.map(Into::into))
        })
    }

    fn save_character_index(
        &self,
        anime_id: Uuid,
        entries: Vec<CharacterNameEntry>,
        ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let document = CharacterIndexDocument {
                anime_id,
                entries,
                expire_at: expiry_from_now(ttl),
            };
            let collection = store
                .collection::<CharacterIndexDocument>(CHARACTER_INDEX_COLLECTION)
                .await;
            collection
                .replace_one(doc! {"_id": uuid_as_binary(anime_id)}, &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::Write {
                    collection: CHARACTER_INDEX_COLLECTION,
                    source,
                })?;
            Ok(())
        })
    }

    fn find_character_index(
        &self,
        anime_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<Vec<CharacterNameEntry>>>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store
                .collection::<CharacterIndexDocument>(CHARACTER_INDEX_COLLECTION)
                .await;
            let document = collection
                .find_one(doc! {"_id": uuid_as_binary(anime_id)})
                .await
                .map_err(|source| MongoDaoError::Read {
                    collection: CHARACTER_INDEX_COLLECTION,
                    source,
                })?;
            Ok(document.map(|doc| doc.entries))
        })
    }

    fn character_index_exists(&self, anime_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store
                .collection::<Document>(CHARACTER_INDEX_COLLECTION)
                .await;
            let found = collection
                .find_one(doc! {"_id": uuid_as_binary(anime_id)})
                .projection(doc! {"_id": 1})
                .await
                .map_err(|source| MongoDaoError::Read {
                    collection: CHARACTER_INDEX_COLLECTION,
                    source,
                })?;
            Ok(found.is_some())
        })
    }

    fn clear_character_cache(&self, anime_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let database = store.database().await;
            database
                .collection::<Document>(CHARACTER_CACHE_COLLECTION)
                .delete_many(doc! {"anime_id": uuid_as_binary(anime_id)})
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: CHARACTER_CACHE_COLLECTION,
                    source,
                })?;
            database
                .collection::<Document>(CHARACTER_INDEX_COLLECTION)
                .delete_one(doc! {"_id": uuid_as_binary(anime_id)})
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: CHARACTER_INDEX_COLLECTION,
                    source,
                })?;
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.reconnect().await.map_err(Into::into) })
    }
}
