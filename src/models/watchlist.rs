use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::media::{MediaDetails, MediaId, MediaType};
use crate::store::{WatchlistError, WatchlistResult};

/// A saved media reference
///
/// Display fields are denormalized copies captured when the entry was added.
/// Entries are never edited in place; removing and re-adding is the only update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub id: MediaId,
    #[serde(default, alias = "media_type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "poster_path", skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, alias = "added_at", skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl WatchlistEntry {
    /// Creates a bare entry with no cached display fields
    pub fn new(id: MediaId, media_type: Option<MediaType>) -> Self {
        Self {
            id,
            media_type,
            title: None,
            poster_path: None,
            rating: None,
            added_at: None,
        }
    }

    /// Captures the fields worth storing from a gateway media object
    pub fn from_media(media: &MediaDetails) -> Self {
        Self {
            id: media.id,
            media_type: media.media_type,
            title: Some(media.title.clone()).filter(|t| !t.is_empty()),
            poster_path: media.poster_path.clone().filter(|p| !p.trim().is_empty()),
            rating: Some(media.vote_average),
            added_at: None,
        }
    }

    /// True when every cached display field is present
    pub fn has_display_fields(&self) -> bool {
        self.title.is_some() && self.poster_path.is_some() && self.rating.is_some()
    }
}

/// Compact `{type, id}` pair kept in a local storage slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalEntry {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub id: MediaId,
}

impl From<LocalEntry> for WatchlistEntry {
    fn from(local: LocalEntry) -> Self {
        WatchlistEntry::new(local.id, Some(local.media_type))
    }
}

/// Unvalidated add request as it arrives from a client
///
/// Every field is optional here so that a missing id is reported as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntryRequest {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, alias = "media_type", alias = "type")]
    pub media_type: Option<String>,
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    #[serde(default, alias = "poster_path")]
    pub poster_path: Option<String>,
    #[serde(default, alias = "vote_average")]
    pub rating: Option<f64>,
}

impl NewEntryRequest {
    /// Validates the request and normalizes it into a storable entry
    pub fn into_entry(self) -> WatchlistResult<WatchlistEntry> {
        let id = parse_required_id(self.id.as_ref())?;

        let media_type = match self.media_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<MediaType>().map_err(WatchlistError::Validation)?),
        };

        Ok(WatchlistEntry {
            id,
            media_type,
            title: self.title.filter(|t| !t.trim().is_empty()),
            poster_path: self.poster_path.filter(|p| !p.trim().is_empty()),
            rating: self.rating,
            added_at: None,
        })
    }
}

/// Coerces a required raw id, distinguishing "missing" from "not numeric"
pub fn parse_required_id(raw: Option<&Value>) -> WatchlistResult<MediaId> {
    match raw {
        None | Some(Value::Null) => Err(WatchlistError::Validation(
            "Missing required field: id".to_string(),
        )),
        Some(Value::String(s)) if s.trim().is_empty() => Err(WatchlistError::Validation(
            "Missing required field: id".to_string(),
        )),
        Some(value) => MediaId::from_json(value)
            .ok_or_else(|| WatchlistError::Validation(format!("Invalid id: {}", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> NewEntryRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_into_entry_missing_id_is_validation_error() {
        let err = request(json!({"title": "Fight Club"})).into_entry().unwrap_err();
        assert!(matches!(err, WatchlistError::Validation(_)));
    }

    #[test]
    fn test_into_entry_null_or_blank_id_is_validation_error() {
        assert!(request(json!({"id": null})).into_entry().is_err());
        assert!(request(json!({"id": "  "})).into_entry().is_err());
    }

    #[test]
    fn test_into_entry_non_numeric_id_is_validation_error() {
        let err = request(json!({"id": "abc"})).into_entry().unwrap_err();
        assert!(matches!(err, WatchlistError::Validation(msg) if msg.contains("abc")));
    }

    #[test]
    fn test_into_entry_coerces_string_id() {
        let entry = request(json!({"id": "550", "mediaType": "movie"}))
            .into_entry()
            .unwrap();
        assert_eq!(entry.id, MediaId(550));
        assert_eq!(entry.media_type, Some(MediaType::Movie));
    }

    #[test]
    fn test_into_entry_accepts_tmdb_field_names() {
        let entry = request(json!({
            "id": 1399,
            "media_type": "tv",
            "name": "Game of Thrones",
            "poster_path": "/u3bZgnGQ9T01sWNhyveQz0wH0Hl.jpg",
            "vote_average": 8.5
        }))
        .into_entry()
        .unwrap();

        assert_eq!(entry.media_type, Some(MediaType::Tv));
        assert_eq!(entry.title.as_deref(), Some("Game of Thrones"));
        assert_eq!(entry.rating, Some(8.5));
        assert!(entry.has_display_fields());
    }

    #[test]
    fn test_into_entry_unknown_media_type_is_validation_error() {
        let err = request(json!({"id": 1, "mediaType": "person"}))
            .into_entry()
            .unwrap_err();
        assert!(matches!(err, WatchlistError::Validation(_)));
    }

    #[test]
    fn test_from_media_drops_empty_poster() {
        let media = MediaDetails {
            id: MediaId(550),
            media_type: Some(MediaType::Movie),
            title: "Fight Club".to_string(),
            poster_path: Some(String::new()),
            vote_average: 8.4,
            overview: String::new(),
            genres: vec![],
            release_date: None,
        };

        let entry = WatchlistEntry::from_media(&media);
        assert_eq!(entry.title.as_deref(), Some("Fight Club"));
        assert_eq!(entry.poster_path, None);
        assert_eq!(entry.rating, Some(8.4));
    }

    #[test]
    fn test_entry_serializes_camel_case_and_skips_empty_fields() {
        let entry = WatchlistEntry::new(MediaId(550), Some(MediaType::Movie));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, json!({"id": 550, "mediaType": "movie"}));
    }

    #[test]
    fn test_local_entry_layout() {
        let local = LocalEntry {
            media_type: MediaType::Tv,
            id: MediaId(1399),
        };
        let json = serde_json::to_string(&local).unwrap();
        assert_eq!(json, r#"{"type":"tv","id":1399}"#);
    }
}
