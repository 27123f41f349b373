pub mod domain;
pub mod infrastructure;

pub use domain::{
    CatalogSource, PageFilter, PosterSource, RawAnime, RawImage, RawNamed, SortOrder, SourceError,
    SourceResult,
};
pub use infrastructure::{AniListAdapter, ClientSettings, RateLimitClient, RetryPolicy, ShikimoriAdapter};
