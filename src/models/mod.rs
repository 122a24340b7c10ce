pub mod media;
pub mod watchlist;

pub use media::{poster_url, Genre, MediaDetails, MediaId, MediaType, TrendingWindow};
pub use watchlist::{parse_required_id, LocalEntry, NewEntryRequest, WatchlistEntry};
