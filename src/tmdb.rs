use crate::error::MovieResult;
use crate::http::Transport;
use crate::models::{Genre, GenreId, GenreMap, Movie, Page};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";

#[async_trait]
pub trait MovieRepository: Send + Sync {
    /// `Ok(None)` when upstream has nothing for `id` or the fetch fails.
    async fn find_by_id(&self, id: i64) -> MovieResult<Option<Movie>>;
    async fn find_by_title(&self, title: &str) -> MovieResult<Vec<Movie>>;
    async fn search_movies(&self, keyword: &str, page: Option<Page>) -> MovieResult<Vec<Movie>>;
    async fn find_top_rated_movies(&self, page: Option<Page>) -> MovieResult<Vec<Movie>>;
    async fn find_upcoming_movies(&self, page: Option<Page>) -> MovieResult<Vec<Movie>>;
    async fn find_similar_movies(&self, id: i64, page: Option<Page>) -> MovieResult<Vec<Movie>>;
    async fn find_movies_by_genre(
        &self,
        genre_id: i64,
        page: Option<Page>,
    ) -> MovieResult<Vec<Movie>>;
    async fn find_all_genres(&self) -> MovieResult<GenreMap>;

    async fn find_movie_by_id(&self, id: i64) -> MovieResult<Option<Movie>> {
        self.find_by_id(id).await
    }

    async fn find_movies_by_title(&self, title: &str) -> MovieResult<Vec<Movie>> {
        self.find_by_title(title).await
    }
}

#[derive(Clone)]
pub struct TmdbRepository {
    transport: Arc<dyn Transport>,
    api_key: String,
    base_url: String,
}

impl TmdbRepository {
    pub fn new(transport: Arc<dyn Transport>, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            base_url: TMDB_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}/{path}?api_key={}", self.base_url, self.api_key);
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(value);
        }
        url
    }

    async fn fetch_listing(&self, url: &str) -> MovieResult<Vec<Movie>> {
        let body = self.transport.get(url).await?;
        parse_listing(&body)
    }

    async fn search(&self, term: &str, page: Option<Page>) -> MovieResult<Vec<Movie>> {
        let mut params = vec![("query", urlencoding::encode(term).into_owned())];
        params.extend(page_param(page));
        let url = self.url("search/movie", &params);
        self.fetch_listing(&url).await
    }
}

#[async_trait]
impl MovieRepository for TmdbRepository {
    async fn find_by_id(&self, id: i64) -> MovieResult<Option<Movie>> {
        let url = self.url(&format!("movie/{id}"), &[]);
        let body = match self.transport.get(&url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to fetch TMDB movie {}: {}", id, e);
                return Ok(None);
            }
        };
        if body.trim().is_empty() {
            debug!("Empty TMDB response for movie {}", id);
            return Ok(None);
        }
        let record: MovieRecord = serde_json::from_str(&body)?;
        Ok(Some(map_movie(record)))
    }

    async fn find_by_title(&self, title: &str) -> MovieResult<Vec<Movie>> {
        self.search(title, None).await
    }

    async fn search_movies(&self, keyword: &str, page: Option<Page>) -> MovieResult<Vec<Movie>> {
        self.search(keyword, page).await
    }

    async fn find_top_rated_movies(&self, page: Option<Page>) -> MovieResult<Vec<Movie>> {
        let params: Vec<_> = page_param(page).into_iter().collect();
        let url = self.url("movie/top_rated", &params);
        self.fetch_listing(&url).await
    }

    async fn find_upcoming_movies(&self, page: Option<Page>) -> MovieResult<Vec<Movie>> {
        let params: Vec<_> = page_param(page).into_iter().collect();
        let url = self.url("movie/upcoming", &params);
        self.fetch_listing(&url).await
    }

    async fn find_similar_movies(&self, id: i64, page: Option<Page>) -> MovieResult<Vec<Movie>> {
        let params: Vec<_> = page_param(page).into_iter().collect();
        let url = self.url(&format!("movie/{id}/similar"), &params);
        self.fetch_listing(&url).await
    }

    async fn find_movies_by_genre(
        &self,
        genre_id: i64,
        page: Option<Page>,
    ) -> MovieResult<Vec<Movie>> {
        let mut params = vec![("with_genres", genre_id.to_string())];
        params.extend(page_param(page));
        let url = self.url("discover/movie", &params);
        self.fetch_listing(&url).await
    }

    async fn find_all_genres(&self) -> MovieResult<GenreMap> {
        let url = self.url("genre/movie/list", &[]);
        let body = self.transport.get(&url).await?;
        if body.trim().is_empty() {
            return Ok(GenreMap::new());
        }
        let data: GenreListResponse = serde_json::from_str(&body)?;
        Ok(data.genres.into_iter().collect())
    }
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    results: Vec<MovieRecord>,
}

#[derive(Debug, Deserialize)]
struct GenreListResponse {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
struct MovieRecord {
    id: i64,
    title: Option<String>,
    original_title: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    poster_path: Option<String>,
    genres: Option<Vec<GenreField>>,
    genre_ids: Option<Vec<GenreField>>,
    original_language: Option<String>,
    backdrop_path: Option<String>,
    popularity: Option<f64>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
    adult: Option<bool>,
    video: Option<bool>,
}

/// `movie/{id}` sends genre objects, listings send bare ids.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenreField {
    Id(GenreId),
    Entry { id: i64 },
}

impl From<GenreField> for GenreId {
    fn from(field: GenreField) -> Self {
        match field {
            GenreField::Id(id) => id,
            GenreField::Entry { id } => GenreId::Number(id),
        }
    }
}

fn page_param(page: Option<Page>) -> Option<(&'static str, String)> {
    page.map(|p| ("page", p.to_string()))
}

fn parse_listing(body: &str) -> MovieResult<Vec<Movie>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let data: ListingResponse = serde_json::from_str(body)?;
    Ok(data.results.into_iter().map(map_movie).collect())
}

/// Title comes from `original_title` (falling back to `title`); genres come
/// from `genres` when present, otherwise `genre_ids`.
fn map_movie(record: MovieRecord) -> Movie {
    let title = record
        .original_title
        .or_else(|| record.title.clone())
        .unwrap_or_default();
    let genre_ids = record
        .genres
        .or(record.genre_ids)
        .unwrap_or_default()
        .into_iter()
        .map(GenreId::from)
        .collect();

    Movie {
        id: record.id,
        title,
        overview: record.overview.unwrap_or_default(),
        release_date: record.release_date.unwrap_or_default(),
        poster_path: record.poster_path,
        genre_ids,
        localized_title: record.title,
        original_language: record.original_language,
        backdrop_path: record.backdrop_path,
        popularity: record.popularity,
        vote_average: record.vote_average,
        vote_count: record.vote_count,
        adult: record.adult,
        video: record.video,
    }
}
