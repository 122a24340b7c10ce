pub mod gemini;
pub mod tmdb;
pub mod watchlist;

pub use gemini::{GeminiClient, Recommender};
pub use tmdb::{MediaMetadataGateway, TmdbGateway};
