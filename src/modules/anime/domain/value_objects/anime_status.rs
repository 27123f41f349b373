use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    diesel_derive_enum::DbEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::AnimeStatus"]
#[serde(rename_all = "lowercase")]
pub enum AnimeStatus {
    Announced,
    Ongoing,
    Finished,
}

impl AnimeStatus {
    /// Map the catalog's status code. Unknown codes count as finished.
    pub fn from_source(code: Option<&str>) -> Self {
        match code.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("released") => AnimeStatus::Finished,
            Some("ongoing") => AnimeStatus::Ongoing,
            Some("anons") => AnimeStatus::Announced,
            _ => AnimeStatus::Finished,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimeStatus::Announced => "announced",
            AnimeStatus::Ongoing => "ongoing",
            AnimeStatus::Finished => "finished",
        }
    }
}

impl Default for AnimeStatus {
    fn default() -> Self {
        AnimeStatus::Finished
    }
}

impl fmt::Display for AnimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AnimeStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "announced" => Ok(AnimeStatus::Announced),
            "ongoing" => Ok(AnimeStatus::Ongoing),
            "finished" => Ok(AnimeStatus::Finished),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_source_status_codes() {
        assert_eq!(AnimeStatus::from_source(Some("released")), AnimeStatus::Finished);
        assert_eq!(AnimeStatus::from_source(Some("ongoing")), AnimeStatus::Ongoing);
        assert_eq!(AnimeStatus::from_source(Some("anons")), AnimeStatus::Announced);
        assert_eq!(AnimeStatus::from_source(Some("paused")), AnimeStatus::Finished);
        assert_eq!(AnimeStatus::from_source(None), AnimeStatus::Finished);
    }

    #[test]
    fn round_trips_through_display() {
        for status in [AnimeStatus::Announced, AnimeStatus::Ongoing, AnimeStatus::Finished] {
            assert_eq!(status.to_string().parse::<AnimeStatus>(), Ok(status));
        }
    }
}
