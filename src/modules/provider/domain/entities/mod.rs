pub mod raw_anime;

pub use raw_anime::{RawAnime, RawImage, RawNamed};
