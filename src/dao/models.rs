use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle state of a game room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    /// Players can join; the game has not started yet.
    Lobby,
    /// A game is running; the roster is frozen.
    InProgress,
    /// All rounds have been played out.
    Finished,
}

impl RoomState {
    /// Joining is only permitted while the room sits in the lobby.
    pub fn is_joinable(self) -> bool {
        matches!(self, RoomState::Lobby)
    }
}

/// A player currently seated in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Connection identifier doubling as the player id.
    pub id: String,
    /// Display name chosen by the player.
    pub name: String,
}

/// A single game session identified by its short join code.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    /// Six uppercase alphanumeric characters typed by joining players.
    pub code: String,
    /// Catalog anime this room draws its characters from.
    pub anime_id: Uuid,
    /// Configured number of rounds (1 to 20).
    pub rounds: u32,
    /// Per-round time limit in seconds (1 to 300).
    pub round_timer_secs: u32,
    /// Current lifecycle state.
    pub state: RoomState,
    /// Player id of the room owner.
    pub owner: String,
    /// Ordered roster of seated players.
    pub players: Vec<Player>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last mutation timestamp.
    pub updated_at: SystemTime,
}

impl Room {
    /// Build a fresh lobby room owned by `owner_id` with an empty roster.
    pub fn new(
        code: String,
        anime_id: Uuid,
        rounds: u32,
        round_timer_secs: u32,
        owner_id: String,
    ) -> Self {
        let now = SystemTime::now();
        Self {
            code,
            anime_id,
            rounds,
            round_timer_secs,
            state: RoomState::Lobby,
            owner: owner_id,
            players: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the given player id is already seated.
    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|player| player.id == player_id)
    }

    /// Refresh the mutation timestamp.
    pub fn touch(&mut self) {
        self.updated_at = SystemTime::now();
    }
}

/// One entry of a room's hidden answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretCharacter {
    /// Catalog id of the secret character.
    pub id: Uuid,
    /// Display name, used for reveal messages.
    pub name: String,
}

/// Outcome of comparing one guessed attribute value against the secret's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStatus {
    /// Values match exactly (or as sets, for list attributes).
    Correct,
    /// List values overlap without being identical.
    Partial,
    /// Values do not match at all.
    Incorrect,
    /// Guessed numeric value is greater than the secret's.
    Higher,
    /// Guessed numeric value is less than the secret's.
    Lower,
}

/// Per-attribute feedback attached to a guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttributeEvaluation {
    /// How the guessed value compares to the secret value.
    pub status: EvaluationStatus,
    /// The guessed value, echoed back for display.
    pub value: String,
}

/// A single guess recorded inside a round.
#[derive(Debug, Clone, PartialEq)]
pub struct Guess {
    /// Catalog id of the guessed character.
    pub character_id: Uuid,
    /// Name the player guessed with.
    pub character_name: String,
    /// Whether the guess hit the round's secret character.
    pub is_correct: bool,
    /// Attribute-level feedback keyed by attribute code; empty when the
    /// cache could not supply both sides.
    pub evaluation: IndexMap<String, AttributeEvaluation>,
    /// When the guess was submitted.
    pub guessed_at: SystemTime,
}

/// Per-player record of one round's guesses.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundRecord {
    /// Room this record belongs to.
    pub room_code: String,
    /// Player attempting the round.
    pub player_id: String,
    /// 1-based round number.
    pub round: u32,
    /// Guesses in submission order.
    pub guesses: Vec<Guess>,
    /// Set once a correct guess lands; immutable after the round is passed.
    pub solved: bool,
}

impl RoundRecord {
    /// Empty record created when a round starts for a player.
    pub fn new(room_code: String, player_id: String, round: u32) -> Self {
        Self {
            room_code,
            player_id,
            round,
            guesses: Vec::new(),
            solved: false,
        }
    }
}

/// Catalog anime visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnimeStatus {
    /// Selectable for new rooms.
    Active,
    /// Hidden from selection.
    Inactive,
}

/// Catalog anime entry owning characters and attribute definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimeEntity {
    /// Primary key.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Optional cover image.
    pub image_url: Option<String>,
    /// Visibility status.
    pub status: AnimeStatus,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last update timestamp.
    pub updated_at: SystemTime,
}

/// Declared value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    /// Free-form text.
    Text,
    /// Numeric value.
    Number,
    /// Calendar date carried as text.
    Date,
    /// True/false flag.
    Boolean,
}

/// Policy governing how a guessed attribute value is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttributeMatchType {
    /// Verbatim equality.
    ExactMatch,
    /// Set comparison over list values.
    PartialMatch,
    /// Numeric ordering with higher/lower feedback.
    RangeMatch,
}

/// Attribute definition belonging to exactly one anime.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeEntity {
    /// Primary key.
    pub id: Uuid,
    /// Human-readable label.
    pub name: String,
    /// Stable code used as the key in character attribute maps; unique per anime.
    pub code: String,
    /// Declared value type.
    pub kind: AttributeType,
    /// Scoring policy; absent means exact-match semantics.
    pub match_type: Option<AttributeMatchType>,
    /// Owning anime.
    pub anime_id: Uuid,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last update timestamp.
    pub updated_at: SystemTime,
}

/// Tagged attribute value validated against the declared [`AttributeType`]
/// when catalog data is written, so gameplay code never type-probes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Boolean flag.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text or date value.
    Text(String),
    /// List of strings, scored with partial-match semantics.
    List(Vec<String>),
}

impl AttributeValue {
    /// Whether this value is acceptable for an attribute of the given kind.
    pub fn matches_kind(&self, kind: AttributeType) -> bool {
        match kind {
            AttributeType::Boolean => matches!(self, AttributeValue::Bool(_)),
            AttributeType::Number => matches!(self, AttributeValue::Number(_)),
            // Dates travel as text; lists are allowed wherever text is so
            // partial-match attributes can hold multiple entries.
            AttributeType::Text | AttributeType::Date => {
                matches!(self, AttributeValue::Text(_) | AttributeValue::List(_))
            }
        }
    }

    /// Flatten the value into the string form stored in the character cache.
    pub fn to_cache_string(&self) -> String {
        match self {
            AttributeValue::Bool(flag) => flag.to_string(),
            AttributeValue::Number(number) => {
                if number.fract() == 0.0 && number.is_finite() {
                    format!("{}", *number as i64)
                } else {
                    number.to_string()
                }
            }
            AttributeValue::Text(text) => text.clone(),
            AttributeValue::List(values) => {
                serde_json::to_string(values).unwrap_or_else(|_| String::new())
            }
        }
    }
}

/// Catalog character belonging to exactly one anime.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterEntity {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional portrait image.
    pub image_url: Option<String>,
    /// Attribute values keyed by attribute code, in definition order.
    pub attributes: IndexMap<String, AttributeValue>,
    /// Owning anime.
    pub anime_id: Uuid,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last update timestamp.
    pub updated_at: SystemTime,
}

/// Flattened character data kept in the session store for O(1) guess evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedCharacter {
    /// Catalog character id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional portrait image.
    pub image_url: Option<String>,
    /// Owning anime.
    pub anime_id: Uuid,
    /// Stringified attribute values keyed by attribute code.
    pub attributes: IndexMap<String, String>,
}

impl From<&CharacterEntity> for CachedCharacter {
    fn from(character: &CharacterEntity) -> Self {
        Self {
            id: character.id,
            name: character.name.clone(),
            image_url: character.image_url.clone(),
            anime_id: character.anime_id,
            attributes: character
                .attributes
                .iter()
                .map(|(code, value)| (code.clone(), value.to_cache_string()))
                .collect(),
        }
    }
}

/// Autocomplete index row for one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CharacterNameEntry {
    /// Catalog character id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lobby_is_the_only_joinable_state() {
        assert!(RoomState::Lobby.is_joinable());
        assert!(!RoomState::InProgress.is_joinable());
        assert!(!RoomState::Finished.is_joinable());
    }

    #[test]
    fn new_room_starts_empty_in_lobby() {
        let room = Room::new("ABC123".into(), Uuid::new_v4(), 5, 60, "owner-1".into());
        assert_eq!(room.state, RoomState::Lobby);
        assert!(room.players.is_empty());
        assert_eq!(room.owner, "owner-1");
        assert_eq!(room.created_at, room.updated_at);
    }

    #[test]
    fn attribute_values_validate_against_declared_kinds() {
        assert!(AttributeValue::Bool(true).matches_kind(AttributeType::Boolean));
        assert!(AttributeValue::Number(180.0).matches_kind(AttributeType::Number));
        assert!(AttributeValue::Text("Saitama".into()).matches_kind(AttributeType::Text));
        assert!(AttributeValue::Text("1999-12-03".into()).matches_kind(AttributeType::Date));
        assert!(
            AttributeValue::List(vec!["Action".into(), "Comedy".into()])
                .matches_kind(AttributeType::Text)
        );

        assert!(!AttributeValue::Text("tall".into()).matches_kind(AttributeType::Number));
        assert!(!AttributeValue::Number(1.0).matches_kind(AttributeType::Boolean));
    }

    #[test]
    fn cache_strings_flatten_each_variant() {
        assert_eq!(AttributeValue::Bool(false).to_cache_string(), "false");
        assert_eq!(AttributeValue::Number(180.0).to_cache_string(), "180");
        assert_eq!(AttributeValue::Number(62.5).to_cache_string(), "62.5");
        assert_eq!(
            AttributeValue::Text("Saitama".into()).to_cache_string(),
            "Saitama"
        );
        assert_eq!(
            AttributeValue::List(vec!["Action".into(), "Comedy".into()]).to_cache_string(),
            r#"["Action","Comedy"]"#
        );
    }
}
