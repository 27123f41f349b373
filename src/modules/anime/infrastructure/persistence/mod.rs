pub mod anime_repository_impl;
pub mod in_memory_repository;

pub use anime_repository_impl::AnimeRepositoryImpl;
pub use in_memory_repository::InMemoryAnimeRepository;
