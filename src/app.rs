use crate::config::Config;
use crate::error::{ApiError, MovieError};
use crate::http::{ReqwestTransport, Transport};
use crate::models::{GenreMap, Movie, Page};
use crate::service::MoviesService;
use crate::tmdb::{MovieRepository, TmdbRepository};
use anyhow::Result;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, Request, State,
    },
    http::Method,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub movies: Arc<MoviesService>,
}

impl AppState {
    pub fn new(repository: Arc<dyn MovieRepository>) -> Self {
        Self {
            movies: Arc::new(MoviesService::new(repository)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListingParams {
    page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    movie: Option<String>,
    page: Option<String>,
}

pub async fn run_server(config: Config) -> Result<()> {
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(config.http_timeout)?);
    let repository: Arc<dyn MovieRepository> = Arc::new(
        TmdbRepository::new(transport, config.tmdb_api_key.clone())
            .with_base_url(config.tmdb_base_url.clone()),
    );
    info!("Proxying TMDB API at {}", config.tmdb_base_url);

    let app = build_router(AppState::new(repository));

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// `/movies/:id/similar` and `/movies/:id` are separate path shapes, so the
/// matcher never confuses them regardless of registration order.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/upcoming", get(upcoming))
        .route("/top_rated", get(top_rated))
        .route("/movies/:id/similar", get(similar_movies))
        .route("/movies/:id", get(movie_by_id))
        .route("/genres", get(genres))
        .route("/genres/:id/movies", get(movies_by_genre))
        .route("/search", get(search_movies))
        .route("/health", get(health))
        .fallback(route_not_found)
        .layer(middleware::from_fn(reject_non_get))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn reject_non_get(req: Request, next: Next) -> Response {
    if req.method() != Method::GET {
        warn!("Rejecting {} {}", req.method(), req.uri().path());
        return ApiError::method_not_allowed().into_response();
    }
    next.run(req).await
}

async fn route_not_found() -> ApiError {
    ApiError::route_not_found()
}

async fn health() -> &'static str {
    "OK"
}

async fn upcoming(
    State(state): State<AppState>,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let page = listing_page(params)?;
    state
        .movies
        .find_upcoming_movies(page)
        .await
        .map(Json)
        .map_err(|e| service_error("upcoming movies", e))
}

async fn top_rated(
    State(state): State<AppState>,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let page = listing_page(params)?;
    state
        .movies
        .find_top_rated_movies(page)
        .await
        .map(Json)
        .map_err(|e| service_error("top rated movies", e))
}

async fn similar_movies(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let id = numeric_id(id)?;
    let page = listing_page(params)?;
    state
        .movies
        .find_similar_movies(id, page)
        .await
        .map(Json)
        .map_err(|e| service_error("similar movies", e))
}

async fn movie_by_id(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Movie>, ApiError> {
    let id = numeric_id(id)?;
    state
        .movies
        .find_by_id(id)
        .await
        .map_err(|e| service_error("movie lookup", e))?
        .map(Json)
        .ok_or_else(ApiError::movie_not_found)
}

async fn genres(State(state): State<AppState>) -> Result<Json<GenreMap>, ApiError> {
    state
        .movies
        .find_all_genres()
        .await
        .map(Json)
        .map_err(|e| service_error("genre list", e))
}

async fn movies_by_genre(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let genre_id = numeric_id(id)?;
    let page = listing_page(params)?;
    state
        .movies
        .find_movies_by_genre(genre_id, page)
        .await
        .map(Json)
        .map_err(|e| service_error("genre discovery", e))
}

async fn search_movies(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let Query(params) = params.map_err(|_| ApiError::bad_request("Invalid query string"))?;
    let term = params
        .movie
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing movie query parameter"))?;
    let page = parse_page(params.page.as_deref())?;
    state
        .movies
        .search_movies(term, page)
        .await
        .map(Json)
        .map_err(|e| service_error("movie search", e))
}

fn service_error(context: &str, err: MovieError) -> ApiError {
    error!("{} failed: {}", context, err);
    err.into()
}

/// Path ids must be plain digits; anything else is treated as an unknown route.
fn numeric_id(raw: Result<Path<String>, PathRejection>) -> Result<i64, ApiError> {
    let Ok(Path(raw)) = raw else {
        return Err(ApiError::route_not_found());
    };
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::route_not_found());
    }
    raw.parse().map_err(|_| ApiError::route_not_found())
}

fn listing_page(
    params: Result<Query<ListingParams>, QueryRejection>,
) -> Result<Option<Page>, ApiError> {
    let Query(params) = params.map_err(|_| ApiError::bad_request("Invalid query string"))?;
    parse_page(params.page.as_deref())
}

fn parse_page(raw: Option<&str>) -> Result<Option<Page>, ApiError> {
    match raw.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(None),
        Some(p) => p
            .parse::<Page>()
            .map(Some)
            .map_err(|_| ApiError::bad_request("Invalid page parameter")),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn blank_page_is_absent() {
        assert_eq!(parse_page(None).unwrap(), None);
        assert_eq!(parse_page(Some("  ")).unwrap(), None);
        assert_eq!(parse_page(Some("4")).unwrap(), Page::new(4));
    }

    #[test]
    fn malformed_page_is_a_bad_request() {
        let err = parse_page(Some("two")).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Invalid page parameter");
    }

    #[test]
    fn non_numeric_ids_are_unknown_routes() {
        let err = numeric_id(Ok(Path("12a".to_string()))).unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Route not found");
        assert_eq!(numeric_id(Ok(Path("76341".to_string()))).unwrap(), 76341);
    }
}
