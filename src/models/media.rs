use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{fmt::Display, str::FromStr};

/// Base URL for poster images served by TMDb
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Identifier of a media item in the metadata gateway's namespace
///
/// The same number can refer to a movie and to a TV show, so an id is only
/// unambiguous together with its [`MediaType`].
///
/// Deserializes from either a JSON number or a base-10 numeric string so that
/// `42` and `"42"` always compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MediaId(pub u64);

impl MediaId {
    /// Parses a raw textual id, ignoring surrounding whitespace
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u64>().ok().map(MediaId)
    }

    /// Coerces a raw JSON value (number or numeric string) into a media id
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                        .map(|f| f as u64)
                })
                .map(MediaId),
            Value::String(s) => Self::parse(s),
            _ => None,
        }
    }
}

impl Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for MediaId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        MediaId::from_json(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid media id: {}", value)))
    }
}

/// Kind of media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Path segment used by the metadata gateway
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            other => Err(format!("unknown media type '{}', expected 'movie' or 'tv'", other)),
        }
    }
}

/// Genre tag attached to a media item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// Media metadata as returned by the metadata gateway
///
/// Movies carry `title`/`release_date`, TV shows `name`/`first_air_date`;
/// both shapes collapse into the same fields here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDetails {
    pub id: MediaId,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default, alias = "first_air_date")]
    pub release_date: Option<String>,
}

impl MediaDetails {
    /// Full poster URL at the given TMDb size (e.g. `w500`), if the item has a poster
    pub fn poster_url(&self, size: &str) -> Option<String> {
        poster_url(self.poster_path.as_deref(), size)
    }
}

/// Builds a poster URL, treating a missing or blank path as "no poster"
pub fn poster_url(poster_path: Option<&str>, size: &str) -> Option<String> {
    poster_path
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("{}/{}{}", IMAGE_BASE_URL, size, p))
}

/// Time window for trending listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingWindow {
    Day,
    #[default]
    Week,
}

impl TrendingWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendingWindow::Day => "day",
            TrendingWindow::Week => "week",
        }
    }
}
