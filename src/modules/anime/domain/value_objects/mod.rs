pub mod anime_status;

pub use anime_status::AnimeStatus;
