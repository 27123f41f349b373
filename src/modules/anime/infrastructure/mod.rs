pub mod models;
pub mod persistence;

pub use persistence::{AnimeRepositoryImpl, InMemoryAnimeRepository};
