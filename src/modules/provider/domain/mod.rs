pub mod entities;
pub mod ports;
pub mod source_error;

pub use entities::{RawAnime, RawImage, RawNamed};
pub use ports::{CatalogSource, PageFilter, PosterSource, SortOrder};
pub use source_error::{SourceError, SourceResult};
