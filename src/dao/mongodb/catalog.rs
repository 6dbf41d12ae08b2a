use futures::{TryStreamExt, future::BoxFuture};
use mongodb::bson::{self, Document, doc};
use tracing::warn;
use uuid::Uuid;

use super::{
    error::{MongoDaoError, MongoResult},
    models::{AnimeDocument, AttributeDocument, CharacterDocument, doc_id, uuid_as_binary},
    store::{ANIME_COLLECTION, ATTRIBUTE_COLLECTION, CHARACTER_COLLECTION, MongoBackend},
};
use crate::dao::{
    catalog_store::{CatalogPage, CatalogStore},
    models::{AnimeEntity, AttributeEntity, CharacterEntity},
    storage::StorageResult,
};

impl MongoBackend {
    /// Shared pagination query: newest first, `page` is 1-based.
    async fn page_query<D>(
        &self,
        name: &'static str,
        page: u64,
        per_page: u64,
    ) -> MongoResult<(Vec<D>, u64)>
    where
        D: serde::de::DeserializeOwned + Send + Sync,
    {
        let collection = self.collection::<D>(name).await;
        let skip = page.saturating_sub(1) * per_page;

        let items: Vec<D> = collection
            .find(doc! {})
            .sort(doc! {"created_at": -1})
            .skip(skip)
            .limit(per_page as i64)
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: name,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: name,
                source,
            })?;

        let total = collection
            .count_documents(doc! {})
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: name,
                source,
            })?;

        Ok((items, total))
    }

    async fn find_by_anime<D>(&self, name: &'static str, anime_id: Uuid) -> MongoResult<Vec<D>>
    where
        D: serde::de::DeserializeOwned + Send + Sync,
    {
        let collection = self.collection::<D>(name).await;
        collection
            .find(doc! {"anime_id": uuid_as_binary(anime_id)})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: name,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: name,
                source,
            })
    }
}

impl CatalogStore for MongoBackend {
    fn list_anime(
        &self,
        page: u64,
        per_page: u64,
    ) -> BoxFuture<'static, StorageResult<CatalogPage<AnimeEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let (documents, total) = store
                .page_query::<AnimeDocument>(ANIME_COLLECTION, page, per_page)
                .await?;
            Ok(CatalogPage {
                items: documents.into_iter().map(Into::into).collect(),
                total,
            })
        })
    }

    fn find_anime(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AnimeEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store.collection::<AnimeDocument>(ANIME_COLLECTION).await;
            let document =
                collection
                    .find_one(doc_id(id))
                    .await
                    .map_err(|source| MongoDaoError::Read {
                        collection: ANIME_COLLECTION,
                        source,
                    })?;
            Ok(document.map(Into::into))
        })
    }

    fn save_anime(&self, anime: AnimeEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = anime.id;
            let document: AnimeDocument = anime.into();
            let collection = store.collection::<AnimeDocument>(ANIME_COLLECTION).await;
            collection
                .replace_one(doc_id(id), &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::Write {
                    collection: ANIME_COLLECTION,
                    source,
                })?;
            Ok(())
        })
    }

    fn delete_anime(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store.collection::<Document>(ANIME_COLLECTION).await;
            let result =
                collection
                    .delete_one(doc_id(id))
                    .await
                    .map_err(|source| MongoDaoError::Delete {
                        collection: ANIME_COLLECTION,
                        source,
                    })?;
            Ok(result.deleted_count > 0)
        })
    }

    fn list_characters(
        &self,
        page: u64,
        per_page: u64,
    ) -> BoxFuture<'static, StorageResult<CatalogPage<CharacterEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let (documents, total) = store
                .page_query::<CharacterDocument>(CHARACTER_COLLECTION, page, per_page)
                .await?;
            Ok(CatalogPage {
                items: documents.into_iter().map(Into::into).collect(),
                total,
            })
        })
    }

    fn find_character(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<CharacterEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store
                .collection::<CharacterDocument>(CHARACTER_COLLECTION)
                .await;
            let document =
                collection
                    .find_one(doc_id(id))
                    .await
                    .map_err(|source| MongoDaoError::Read {
                        collection: CHARACTER_COLLECTION,
                        source,
                    })?;
            Ok(document.map(Into::into))
        })
    }

    fn find_characters_by_anime(
        &self,
        anime_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<CharacterEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let documents = store
                .find_by_anime::<CharacterDocument>(CHARACTER_COLLECTION, anime_id)
                .await?;
            Ok(documents.into_iter().map(Into::into).collect())
        })
    }

    fn sample_characters(
        &self,
        anime_id: Uuid,
        count: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<CharacterEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store.collection::<Document>(CHARACTER_COLLECTION).await;
            // $sample draws distinct documents, which is exactly the
            // "roundCount distinct secrets" selection rule.
            let pipeline = vec![
                doc! {"$match": {"anime_id": uuid_as_binary(anime_id)}},
                doc! {"$sample": {"size": count as i64}},
            ];

            let documents: Vec<Document> = collection
                .aggregate(pipeline)
                .await
                .map_err(|source| MongoDaoError::Read {
                    collection: CHARACTER_COLLECTION,
                    source,
                })?
                .try_collect()
                .await
                .map_err(|source| MongoDaoError::Read {
                    collection: CHARACTER_COLLECTION,
                    source,
                })?;

            Ok(documents
                .into_iter()
                .filter_map(|document| {
                    match bson::deserialize_from_document::<CharacterDocument>(document) {
                        Ok(decoded) => Some(decoded.into()),
                        Err(err) => {
                            warn!(error = %err, "skipping undecodable character document in sample");
                            None
                        }
                    }
                })
                .collect())
        })
    }

    fn save_character(&self, character: CharacterEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = character.id;
            let document: CharacterDocument = character.into();
            let collection = store
                .collection::<CharacterDocument>(CHARACTER_COLLECTION)
                .await;
            collection
                .replace_one(doc_id(id), &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::Write {
                    collection: CHARACTER_COLLECTION,
                    source,
                })?;
            Ok(())
        })
    }

    fn delete_character(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store.collection::<Document>(CHARACTER_COLLECTION).await;
            let result =
                collection
                    .delete_one(doc_id(id))
                    .await
                    .map_err(|source| MongoDaoError::Delete {
                        collection: CHARACTER_COLLECTION,
                        source,
                    })?;
            Ok(result.deleted_count > 0)
        })
    }

    fn list_attributes(
        &self,
        page: u64,
        per_page: u64,
    ) -> BoxFuture<'static, StorageResult<CatalogPage<AttributeEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let (documents, total) = store
                .page_query::<AttributeDocument>(ATTRIBUTE_COLLECTION, page, per_page)
                .await?;
            Ok(CatalogPage {
                items: documents.into_iter().map(Into::into).collect(),
                total,
            })
        })
    }

    fn find_attribute(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AttributeEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store
                .collection::<AttributeDocument>(ATTRIBUTE_COLLECTION)
                .await;
            let document =
                collection
                    .find_one(doc_id(id))
                    .await
                    .map_err(|source| MongoDaoError::Read {
                        collection: ATTRIBUTE_COLLECTION,
                        source,
                    })?;
            Ok(document.map(Into::into))
        })
    }

    fn find_attributes_by_anime(
        &self,
        anime_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AttributeEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let documents = store
                .find_by_anime::<AttributeDocument>(ATTRIBUTE_COLLECTION, anime_id)
                .await?;
            Ok(documents.into_iter().map(Into::into).collect())
        })
    }

    fn save_attribute(&self, attribute: AttributeEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = attribute.id;
            let document: AttributeDocument = attribute.into();
            let collection = store
                .collection::<AttributeDocument>(ATTRIBUTE_COLLECTION)
                .await;
            collection
                .replace_one(doc_id(id), &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::Write {
                    collection: ATTRIBUTE_COLLECTION,
                    source,
                })?;
            Ok(())
        })
    }

    fn delete_attribute(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store.collection::<Document>(ATTRIBUTE_COLLECTION).await;
            let result =
                collection
                    .delete_one(doc_id(id))
                    .await
                    .map_err(|source| MongoDaoError::Delete {
                        collection: ATTRIBUTE_COLLECTION,
                        source,
                    })?;
            Ok(result.deleted_count > 0)
        })
    }
}
