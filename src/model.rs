use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Nutritional targets (or actual values) of a single serving
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Default for Macros {
    fn default() -> Self {
        Self {
            calories: 500.0,
            protein: 40.0,
            carbs: 50.0,
            fat: 15.0,
        }
    }
}

/// Which tier produced a recipe instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    #[default]
    Generated,
    Community,
    Saved,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Provenance::Generated => "generated",
            Provenance::Community => "community",
            Provenance::Saved => "saved",
        };
        f.write_str(tag)
    }
}

/// A recipe as stored in the document database and shown to the user.
///
/// Field names on the wire match the documents written by the web client,
/// so records created by either side can be read by the other.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub macros: Macros,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default, rename = "image_url")]
    pub image_url: String,
    #[serde(default, rename = "youtube_url", skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub dislikes: u64,
    #[serde(default)]
    pub liked_by: BTreeSet<String>,
    #[serde(default)]
    pub disliked_by: BTreeSet<String>,
    #[serde(default, rename = "source")]
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Recipe {
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Returns the recipe id, assigning a fresh one if it has none yet
    pub fn ensure_id(&mut self) -> &str {
        self.id.get_or_insert_with(new_recipe_id)
    }
}

/// Generate a recipe id of the form `<unix millis>_<9 base36 chars>`
pub fn new_recipe_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// A single comment on a community recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "userId")]
    pub author: String,
    pub text: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            author: author.into(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// RFC 3339 timestamps with exactly three fractional digits
///
/// Stored documents are ordered by these strings, so every value must have
/// the same width.
pub(crate) mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| {
                    DateTime::parse_from_rfc3339(&raw)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(serde::de::Error::custom)
                })
                .transpose()
        }
    }
}

/// Everything the generation tier needs besides the ingredient list
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationTargets {
    pub macros: Macros,
    pub meal_type: String,
    pub cuisine: String,
    pub dietary: String,
    pub exclude: String,
}

impl Default for GenerationTargets {
    fn default() -> Self {
        Self {
            macros: Macros::default(),
            meal_type: "any".to_string(),
            cuisine: "any".to_string(),
            dietary: String::new(),
            exclude: String::new(),
        }
    }
}
