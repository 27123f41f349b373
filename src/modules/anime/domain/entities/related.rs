use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::normalized_anime::AnimeTitles;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelatedKind {
    Genre,
    Studio,
}

impl fmt::Display for RelatedKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RelatedKind::Genre => write!(f, "genre"),
            RelatedKind::Studio => write!(f, "studio"),
        }
    }
}

/// Genre or studio row, resolved by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedEntity {
    pub id: Uuid,
    pub kind: RelatedKind,
    pub name: String,
    /// True when this call inserted the row.
    pub created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub anime_id: Uuid,
    pub created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistOutcome {
    pub anime_id: Uuid,
    pub created: bool,
    pub genres_linked: usize,
    pub studios_linked: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub anime: i64,
    pub genres: i64,
    pub studios: i64,
}

/// Stored record whose poster is still the missing marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingPoster {
    pub external_id: i64,
    pub titles: AnimeTitles,
}
