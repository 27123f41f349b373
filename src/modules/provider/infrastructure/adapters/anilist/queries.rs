//! AniList GraphQL queries

/// Title search returning only what poster lookup needs.
pub const COVER_SEARCH_QUERY: &str = r#"
query ($search: String, $perPage: Int) {
  Page(page: 1, perPage: $perPage) {
    media(search: $search, type: ANIME, sort: SEARCH_MATCH) {
      id
      title {
        romaji
        english
        native
      }
      coverImage {
        extraLarge
        large
        medium
      }
    }
  }
}
"#;
