pub mod anilist;
pub mod shikimori;

pub use anilist::AniListAdapter;
pub use shikimori::ShikimoriAdapter;
