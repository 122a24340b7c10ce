use futures::future::join_all;
use serde::Serialize;

use crate::{
    models::{poster_url, Genre, MediaType, WatchlistEntry},
    services::tmdb::MediaMetadataGateway,
};

/// Poster size used in watchlist views
const POSTER_SIZE: &str = "w500";

/// Watchlist entry merged with freshly fetched metadata, ready for rendering
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HydratedEntry {
    #[serde(flatten)]
    pub entry: WatchlistEntry,
    pub poster_url: Option<String>,
    pub overview: Option<String>,
    pub genres: Vec<Genre>,
    pub release_date: Option<String>,
    /// False when the gateway lookup failed and only stored fields are shown
    pub metadata_available: bool,
}

impl HydratedEntry {
    fn stored_only(entry: WatchlistEntry) -> Self {
        Self {
            poster_url: poster_url(entry.poster_path.as_deref(), POSTER_SIZE),
            entry,
            overview: None,
            genres: Vec::new(),
            release_date: None,
            metadata_available: false,
        }
    }
}

/// Fetches metadata for every entry concurrently and merges it in
///
/// Stored display fields win over fetched ones. Entries without a media type
/// are looked up as movies. A failed lookup degrades that one entry to its
/// stored fields; the listing keeps the store's order.
pub async fn hydrate(
    gateway: &dyn MediaMetadataGateway,
    entries: Vec<WatchlistEntry>,
) -> Vec<HydratedEntry> {
    let lookups = entries.into_iter().map(|entry| async move {
        let media_type = entry.media_type.unwrap_or(MediaType::Movie);

        match gateway.details(media_type, entry.id).await {
            Ok(details) => {
                let mut entry = entry;
                entry.media_type.get_or_insert(media_type);
                if entry.title.is_none() && !details.title.is_empty() {
                    entry.title = Some(details.title.clone());
                }
                if entry.poster_path.is_none() {
                    entry.poster_path = details.poster_path.clone();
                }
                entry.rating.get_or_insert(details.vote_average);

                HydratedEntry {
                    poster_url: poster_url(entry.poster_path.as_deref(), POSTER_SIZE),
                    entry,
                    overview: Some(details.overview).filter(|o| !o.is_empty()),
                    genres: details.genres,
                    release_date: details.release_date,
                    metadata_available: true,
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    id = %entry.id,
                    media_type = %media_type,
                    "Metadata lookup failed for watchlist entry"
                );
                HydratedEntry::stored_only(entry)
            }
        }
    });

    join_all(lookups).await
}

/// Fills the display fields a new entry will cache from the gateway
///
/// Fields sent by the client are kept. Entries without a media type, or
/// whose lookup fails, are stored as sent.
pub async fn complete_display_fields(
    gateway: &dyn MediaMetadataGateway,
    entry: WatchlistEntry,
) -> WatchlistEntry {
    let Some(media_type) = entry.media_type else {
        return entry;
    };
    if entry.has_display_fields() {
        return entry;
    }

    match gateway.details(media_type, entry.id).await {
        Ok(details) => {
            let fetched = WatchlistEntry::from_media(&details);
            WatchlistEntry {
                title: entry.title.or(fetched.title),
                poster_path: entry.poster_path.or(fetched.poster_path),
                rating: entry.rating.or(fetched.rating),
                ..entry
            }
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                id = %entry.id,
                media_type = %media_type,
                "Could not fetch display fields for new watchlist entry"
            );
            entry
        }
    }
}
