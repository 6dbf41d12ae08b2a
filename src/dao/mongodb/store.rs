use std::{sync::Arc, time::Duration};

use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
};

pub const ROOM_COLLECTION: &str = "rooms";
pub const SECRET_COLLECTION: &str = "room_secrets";
pub const CURSOR_COLLECTION: &str = "round_cursors";
pub const RECORD_COLLECTION: &str = "round_records";
pub const CHARACTER_CACHE_COLLECTION: &str = "character_cache";
pub const CHARACTER_INDEX_COLLECTION: &str = "character_indexes";
pub const ANIME_COLLECTION: &str = "anime";
pub const CHARACTER_COLLECTION: &str = "characters";
pub const ATTRIBUTE_COLLECTION: &str = "attributes";

/// Session collections whose documents expire via the TTL index on `expire_at`.
const TTL_COLLECTIONS: [&str; 6] = [
    ROOM_COLLECTION,
    SECRET_COLLECTION,
    CURSOR_COLLECTION,
    RECORD_COLLECTION,
    CHARACTER_CACHE_COLLECTION,
    CHARACTER_INDEX_COLLECTION,
];

/// MongoDB backend serving both the session store and the catalog store.
#[derive(Clone)]
pub struct MongoBackend {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoBackend {
    /// Establish a connection to MongoDB and ensure all indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let backend = Self { inner };
        backend.ensure_indexes().await?;
        Ok(backend)
    }

    /// Create the TTL, uniqueness, and lookup indexes the stores rely on.
    ///
    /// The TTL indexes are what give session documents Redis-style key
    /// expiry: the server reaps any document whose `expire_at` has passed.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        for name in TTL_COLLECTIONS {
            let collection = database.collection::<Document>(name);
            let index = IndexModel::builder()
                .keys(doc! {"expire_at": 1})
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{name}_ttl_idx")))
                        .expire_after(Some(Duration::ZERO))
                        .build(),
                )
                .build();
            create_index(&collection, index, name, "expire_at").await?;
        }

        let cursors = database.collection::<Document>(CURSOR_COLLECTION);
        let cursor_index = IndexModel::builder()
            .keys(doc! {"room_code": 1, "player_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("cursor_room_player_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        create_index(&cursors, cursor_index, CURSOR_COLLECTION, "room_code,player_id").await?;

        let records = database.collection::<Document>(RECORD_COLLECTION);
        let record_index = IndexModel::builder()
            .keys(doc! {"room_code": 1, "player_id": 1, "round": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("record_room_player_round_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        create_index(
            &records,
            record_index,
            RECORD_COLLECTION,
            "room_code,player_id,round",
        )
        .await?;

        for name in [
            CHARACTER_CACHE_COLLECTION,
            CHARACTER_COLLECTION,
            ATTRIBUTE_COLLECTION,
        ] {
            let collection = database.collection::<Document>(name);
            let index = IndexModel::builder()
                .keys(doc! {"anime_id": 1})
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{name}_anime_idx")))
                        .build(),
                )
                .build();
            create_index(&collection, index, name, "anime_id").await?;
        }

        // Attribute codes key character attribute maps, so they must be
        // unique within an anime.
        let attributes = database.collection::<Document>(ATTRIBUTE_COLLECTION);
        let code_index = IndexModel::builder()
            .keys(doc! {"anime_id": 1, "code": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("attribute_code_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        create_index(&attributes, code_index, ATTRIBUTE_COLLECTION, "anime_id,code").await?;

        Ok(())
    }

    pub(super) async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    pub(super) async fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<T>(name)
    }

    pub(super) async fn ping(&self) -> MongoResult<()> {
        self.inner.ping().await
    }

    pub(super) async fn reconnect(&self) -> MongoResult<()> {
        self.inner.reconnect().await
    }
}

async fn create_index(
    collection: &Collection<Document>,
    index: IndexModel,
    name: &str,
    keys: &'static str,
) -> MongoResult<()> {
    collection
        .create_index(index)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection: name.to_owned(),
            index: keys,
            source,
        })?;
    Ok(())
}
