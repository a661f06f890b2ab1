//! API-specific types for the TMDB search endpoints

use serde::Deserialize;

/// Response of `GET /search/{tv|movie}`
#[derive(Debug, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbSearchResult>,
}

/// One search hit
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResult {
    /// Numeric TMDB id
    pub id: u64,
    /// Poster path fragment, e.g. `/abc.jpg`
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Display name; `name` for tv results, `title` for movies
    #[serde(default, alias = "title")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_tv_and_movie_results() {
        let tv: TmdbSearchResponse = serde_json::from_str(
            r#"{"page":1,"results":[{"id":119051,"name":"Wednesday","poster_path":"/w.jpg"}],"total_results":1}"#,
        )
        .unwrap();
        assert_eq!(tv.results[0].id, 119051);
        assert_eq!(tv.results[0].name.as_deref(), Some("Wednesday"));

        let movie: TmdbSearchResponse = serde_json::from_str(
            r#"{"results":[{"id":27205,"title":"Inception","poster_path":null}]}"#,
        )
        .unwrap();
        assert_eq!(movie.results[0].name.as_deref(), Some("Inception"));
        assert!(movie.results[0].poster_path.is_none());
    }
}
