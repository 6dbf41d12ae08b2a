use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    AnimeEntity, AnimeStatus, AttributeEntity, AttributeEvaluation, AttributeMatchType,
    AttributeType, AttributeValue, CachedCharacter, CharacterEntity, CharacterNameEntry, Guess,
    Player, Room, RoomState, RoundRecord, SecretCharacter,
};

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}

/// Expiry stamp for a document written now with the given time-to-live.
pub fn expiry_from_now(ttl: Duration) -> DateTime {
    DateTime::from_system_time(SystemTime::now() + ttl)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDocument {
    id: String,
    name: String,
}

impl From<Player> for PlayerDocument {
    fn from(value: Player) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

impl From<PlayerDocument> for Player {
    fn from(value: PlayerDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

/// Room stored under its join code, reaped by the TTL index on `expire_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDocument {
    #[serde(rename = "_id")]
    code: String,
    anime_id: Uuid,
    rounds: u32,
    round_timer_secs: u32,
    state: RoomState,
    owner: String,
    players: Vec<PlayerDocument>,
    created_at: DateTime,
    updated_at: DateTime,
    pub expire_at: DateTime,
}

impl From<(Room, DateTime)> for RoomDocument {
    fn from((room, expire_at): (Room, DateTime)) -> Self {
        Self {
            code: room.code,
            anime_id: room.anime_id,
            rounds: room.rounds,
            round_timer_secs: room.round_timer_secs,
            state: room.state,
            owner: room.owner,
            players: room.players.into_iter().map(Into::into).collect(),
            created_at: DateTime::from_system_time(room.created_at),
            updated_at: DateTime::from_system_time(room.updated_at),
            expire_at,
        }
    }
}

impl From<RoomDocument> for Room {
    fn from(value: RoomDocument) -> Self {
        Self {
            code: value.code,
            anime_id: value.anime_id,
            rounds: value.rounds,
            round_timer_secs: value.round_timer_secs,
            state: value.state,
            owner: value.owner,
            players: value.players.into_iter().map(Into::into).collect(),
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

/// A room's hidden answer key, one character per round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretSequenceDocument {
    #[serde(rename = "_id")]
    pub room_code: String,
    pub characters: Vec<SecretCharacter>,
    pub expire_at: DateTime,
}

/// The round a player is currently attempting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundCursorDocument {
    pub room_code: String,
    pub player_id: String,
    pub round: u32,
    pub expire_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessDocument {
    character_id: Uuid,
    character_name: String,
    is_correct: bool,
    evaluation: IndexMap<String, AttributeEvaluation>,
    guessed_at: DateTime,
}

impl From<Guess> for GuessDocument {
    fn from(value: Guess) -> Self {
        Self {
            character_id: value.character_id,
            character_name: value.character_name,
            is_correct: value.is_correct,
            evaluation: value.evaluation,
            guessed_at: DateTime::from_system_time(value.guessed_at),
        }
    }
}

impl From<GuessDocument> for Guess {
    fn from(value: GuessDocument) -> Self {
        Self {
            character_id: value.character_id,
            character_name: value.character_name,
            is_correct: value.is_correct,
            evaluation: value.evaluation,
            guessed_at: value.guessed_at.to_system_time(),
        }
    }
}

/// One player's guesses for one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecordDocument {
    pub room_code: String,
    pub player_id: String,
    pub round: u32,
    guesses: Vec<GuessDocument>,
    solved: bool,
    pub expire_at: DateTime,
}

impl From<(RoundRecord, DateTime)> for RoundRecordDocument {
    fn from((record, expire_at): (RoundRecord, DateTime)) -> Self {
        Self {
            room_code: record.room_code,
            player_id: record.player_id,
            round: record.round,
            guesses: record.guesses.into_iter().map(Into::into).collect(),
            solved: record.solved,
            expire_at,
        }
    }
}

impl From<RoundRecordDocument> for RoundRecord {
    fn from(value: RoundRecordDocument) -> Self {
        Self {
            room_code: value.room_code,
            player_id: value.player_id,
            round: value.round,
            guesses: value.guesses.into_iter().map(Into::into).collect(),
            solved: value.solved,
        }
    }
}

/// Flattened character hash consumed during guess evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedCharacterDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    image_url: Option<String>,
    pub anime_id: Uuid,
    attributes: IndexMap<String, String>,
    pub expire_at: DateTime,
}

impl From<(CachedCharacter, DateTime)> for CachedCharacterDocument {
    fn from((character, expire_at): (CachedCharacter, DateTime)) -> Self {
        Self {
            id: character.id,
            name: character.name,
            image_url: character.image_url,
            anime_id: character.anime_id,
            attributes: character.attributes,
            expire_at,
        }
    }
}

impl From<CachedCharacterDocument> for CachedCharacter {
    fn from(value: CachedCharacterDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            image_url: value.image_url,
            anime_id: value.anime_id,
            attributes: value.attributes,
        }
    }
}

/// Per-anime autocomplete index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterIndexDocument {
    #[serde(rename = "_id")]
    pub anime_id: Uuid,
    pub entries: Vec<CharacterNameEntry>,
    pub expire_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    title: String,
    image_url: Option<String>,
    status: AnimeStatus,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<AnimeEntity> for AnimeDocument {
    fn from(value: AnimeEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            image_url: value.image_url,
            status: value.status,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<AnimeDocument> for AnimeEntity {
    fn from(value: AnimeDocument) -> Self {
        Self {
            id: value.id,
            title: value.title,
            image_url: value.image_url,
            status: value.status,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    image_url: Option<String>,
    attributes: IndexMap<String, AttributeValue>,
    pub anime_id: Uuid,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<CharacterEntity> for CharacterDocument {
    fn from(value: CharacterEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            image_url: value.image_url,
            attributes: value.attributes,
            anime_id: value.anime_id,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<CharacterDocument> for CharacterEntity {
    fn from(value: CharacterDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            image_url: value.image_url,
            attributes: value.attributes,
            anime_id: value.anime_id,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    code: String,
    kind: AttributeType,
    match_type: Option<AttributeMatchType>,
    pub anime_id: Uuid,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<AttributeEntity> for AttributeDocument {
    fn from(value: AttributeEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            code: value.code,
            kind: value.kind,
            match_type: value.match_type,
            anime_id: value.anime_id,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<AttributeDocument> for AttributeEntity {
    fn from(value: AttributeDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            code: value.code,
            kind: value.kind,
            match_type: value.match_type,
            anime_id: value.anime_id,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}
