//! Shared data structures for the portfolio
//!
//! These structs represent the data model that flows between
//! the table-store export, the local snapshot and the gallery session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Categories shown when the settings table doesn't define any
pub const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("portraits", "Portraits"),
    ("fashion", "Fashion"),
    ("lifestyle", "Lifestyle"),
    ("nature", "Nature"),
];

/// Filter id that matches every photo
pub const ALL_CATEGORY: &str = "all";

/// Photo identifier. The store hands out numeric ids, settings maps key them
/// as strings; both forms are accepted and carried as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PhotoId(pub String);

impl PhotoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for PhotoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Float(f64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Self(n.to_string()),
            RawId::Float(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        })
    }
}

/// A single photo record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    /// Image URL or path
    pub src: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub likes: i64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub views: i64,
    /// Upload timestamp as sent by the store (RFC 3339)
    #[serde(default)]
    pub created_at: Option<String>,
    /// Film stock id, from the `photo_films` setting
    #[serde(default)]
    pub film: String,
    /// Year label, from the `photo_years` setting
    #[serde(default)]
    pub year: String,
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}

impl Photo {
    /// Parsed upload time, if the timestamp is valid RFC 3339
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// A gallery filter category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// A film stock a photo may be tagged with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Film {
    pub id: String,
    pub name: String,
}

/// Photographer profile from the settings table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photographer {
    pub about: String,
    pub email: String,
    pub instagram: String,
    pub background_color: String,
}

/// One row of the settings table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingRow {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Raw export of the two store tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioRows {
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub settings: Vec<SettingRow>,
}

/// Everything the gallery renders from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioData {
    pub photographer: Photographer,
    pub categories: Vec<Category>,
    pub films: Vec<Film>,
    pub photo_films: HashMap<String, String>,
    pub photo_years: HashMap<String, String>,
    pub photos: Vec<Photo>,
}

impl Default for PortfolioData {
    fn default() -> Self {
        Self {
            photographer: Photographer::default(),
            categories: default_categories(),
            films: Vec::new(),
            photo_films: HashMap::new(),
            photo_years: HashMap::new(),
            photos: Vec::new(),
        }
    }
}

pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(id, name)| Category {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect()
}

/// Text of a truthy JSON scalar: non-empty strings and non-zero numbers.
fn truthy_text(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        serde_json::Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Parse a JSON array of `{id, name}` entries as found in the categories and
/// films settings.
///
/// Entries without a truthy id and name are dropped one by one; the rest of
/// the list survives. `None` only when the text isn't a JSON array.
fn parse_named_list(raw: &str) -> Option<Vec<(String, String)>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw).ok()?;
    Some(
        values
            .iter()
            .filter_map(|entry| {
                let id = truthy_text(entry.get("id"))?;
                let name = truthy_text(entry.get("name"))?;
                Some((id, name))
            })
            .collect(),
    )
}

/// Parse a JSON object keyed by photo id. Values may be strings or numbers.
fn parse_id_map(raw: &str) -> Option<HashMap<String, String>> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    Some(
        object
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                Some((key.clone(), text))
            })
            .collect(),
    )
}

impl PortfolioData {
    /// Build the portfolio from the store rows.
    ///
    /// Malformed JSON settings fall back (defaults for categories, empty for
    /// films and per-photo maps) with a warning; they never fail the load.
    pub fn from_rows(rows: PortfolioRows) -> Self {
        let settings: HashMap<String, String> = rows
            .settings
            .into_iter()
            .map(|row| (row.key, row.value.unwrap_or_default()))
            .collect();
        let setting = |key: &str| settings.get(key).filter(|v| !v.is_empty());

        let mut categories = default_categories();
        if let Some(raw) = setting("categories") {
            match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
                Ok(list) if list.is_empty() => {}
                Ok(_) => {
                    categories = parse_named_list(raw)
                        .unwrap_or_default()
                        .into_iter()
                        .map(|(id, name)| Category { id, name })
                        .collect();
                }
                Err(_) => tracing::warn!("Invalid categories setting JSON, using defaults"),
            }
        }

        let mut films = Vec::new();
        if let Some(raw) = setting("films") {
            match parse_named_list(raw) {
                Some(list) => {
                    films = list
                        .into_iter()
                        .map(|(id, name)| Film { id, name })
                        .collect();
                }
                None => tracing::warn!("Invalid films setting JSON, using empty list"),
            }
        }

        let photo_films = setting("photo_films")
            .map(|raw| {
                parse_id_map(raw).unwrap_or_else(|| {
                    tracing::warn!("Invalid photo_films setting JSON, using empty map");
                    HashMap::new()
                })
            })
            .unwrap_or_default();

        let photo_years = setting("photo_years")
            .map(|raw| {
                parse_id_map(raw).unwrap_or_else(|| {
                    tracing::warn!("Invalid photo_years setting JSON, using empty map");
                    HashMap::new()
                })
            })
            .unwrap_or_default();

        let get = |key: &str| settings.get(key).cloned().unwrap_or_default();
        let photographer = Photographer {
            about: get("about"),
            email: get("email"),
            instagram: get("instagram"),
            background_color: get("background_color"),
        };

        let mut photos: Vec<Photo> = rows
            .photos
            .into_iter()
            .map(|mut photo| {
                photo.film = photo_films.get(photo.id.as_str()).cloned().unwrap_or_default();
                photo.year = photo_years.get(photo.id.as_str()).cloned().unwrap_or_default();
                photo
            })
            .collect();
        // Newest first; unparseable timestamps sink to the end (stable sort)
        photos.sort_by(|a, b| b.created_at_utc().cmp(&a.created_at_utc()));

        Self {
            photographer,
            categories,
            films,
            photo_films,
            photo_years,
            photos,
        }
    }

    /// Photos in a category, or all of them for [`ALL_CATEGORY`].
    pub fn filter(&self, category: &str) -> Vec<Photo> {
        if category == ALL_CATEGORY {
            return self.photos.clone();
        }
        self.photos
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect()
    }

    pub fn photo(&self, id: &PhotoId) -> Option<&Photo> {
        self.photos.iter().find(|p| &p.id == id)
    }

    /// Display name of a photo's film: the film's name if known, else its id.
    pub fn film_label(&self, photo: &Photo) -> Option<String> {
        if photo.film.is_empty() {
            return None;
        }
        let label = self
            .films
            .iter()
            .find(|f| f.id == photo.film)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| photo.film.clone());
        Some(label)
    }

    pub fn year_label(&self, photo: &Photo) -> Option<String> {
        (!photo.year.is_empty()).then(|| photo.year.clone())
    }
}
