pub mod description_cleaner;
pub mod normalizer;
pub mod poster_resolver;
pub mod slug;

pub use description_cleaner::clean_description;
pub use normalizer::RecordNormalizer;
