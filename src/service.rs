use crate::error::MovieResult;
use crate::models::{GenreMap, Movie, Page};
use crate::tmdb::MovieRepository;
use std::sync::Arc;

/// Thin façade over a [`MovieRepository`]; every call is forwarded unchanged.
#[derive(Clone)]
pub struct MoviesService {
    repository: Arc<dyn MovieRepository>,
}

impl MoviesService {
    pub fn new(repository: Arc<dyn MovieRepository>) -> Self {
        Self { repository }
    }

    pub async fn find_by_id(&self, id: i64) -> MovieResult<Option<Movie>> {
        self.repository.find_by_id(id).await
    }

    pub async fn find_movie_by_id(&self, id: i64) -> MovieResult<Option<Movie>> {
        self.repository.find_movie_by_id(id).await
    }

    pub async fn find_by_title(&self, title: &str) -> MovieResult<Vec<Movie>> {
        self.repository.find_by_title(title).await
    }

    pub async fn find_movies_by_title(&self, title: &str) -> MovieResult<Vec<Movie>> {
        self.repository.find_movies_by_title(title).await
    }

    pub async fn search_movies(&self, query: &str, page: Option<Page>) -> MovieResult<Vec<Movie>> {
        self.repository.search_movies(query, page).await
    }

    pub async fn find_top_rated_movies(&self, page: Option<Page>) -> MovieResult<Vec<Movie>> {
        self.repository.find_top_rated_movies(page).await
    }

    pub async fn find_upcoming_movies(&self, page: Option<Page>) -> MovieResult<Vec<Movie>> {
        self.repository.find_upcoming_movies(page).await
    }

    pub async fn find_similar_movies(
        &self,
        movie_id: i64,
        page: Option<Page>,
    ) -> MovieResult<Vec<Movie>> {
        self.repository.find_similar_movies(movie_id, page).await
    }

    pub async fn find_movies_by_genre(
        &self,
        genre_id: i64,
        page: Option<Page>,
    ) -> MovieResult<Vec<Movie>> {
        self.repository.find_movies_by_genre(genre_id, page).await
    }

    pub async fn find_all_genres(&self) -> MovieResult<GenreMap> {
        self.repository.find_all_genres().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct EchoRepository {
        calls: Mutex<Vec<String>>,
    }

    impl EchoRepository {
        fn titled(&self, call: String) -> MovieResult<Vec<Movie>> {
            self.calls.lock().unwrap().push(call.clone());
            Ok(vec![Movie::new(1, call, "", "", None, Vec::new())])
        }
    }

    #[async_trait]
    impl MovieRepository for EchoRepository {
        async fn find_by_id(&self, id: i64) -> MovieResult<Option<Movie>> {
            self.calls.lock().unwrap().push(format!("by_id {id}"));
            Ok(None)
        }
        async fn find_by_title(&self, title: &str) -> MovieResult<Vec<Movie>> {
            self.titled(format!("by_title {title}"))
        }
        async fn search_movies(&self, keyword: &str, _page: Option<Page>) -> MovieResult<Vec<Movie>> {
            self.titled(format!("search {keyword}"))
        }
        async fn find_top_rated_movies(&self, _page: Option<Page>) -> MovieResult<Vec<Movie>> {
            self.titled("top_rated".to_string())
        }
        async fn find_upcoming_movies(&self, _page: Option<Page>) -> MovieResult<Vec<Movie>> {
            self.titled("upcoming".to_string())
        }
        async fn find_similar_movies(&self, id: i64, _page: Option<Page>) -> MovieResult<Vec<Movie>> {
            self.titled(format!("similar {id}"))
        }
        async fn find_movies_by_genre(
            &self,
            genre_id: i64,
            _page: Option<Page>,
        ) -> MovieResult<Vec<Movie>> {
            self.titled(format!("genre {genre_id}"))
        }
        async fn find_all_genres(&self) -> MovieResult<GenreMap> {
            Ok(GenreMap::new())
        }
    }

    #[tokio::test]
    async fn forwards_arguments_and_results_unchanged() {
        let repo = Arc::new(EchoRepository::default());
        let service = MoviesService::new(repo.clone());

        assert_eq!(service.find_movie_by_id(42).await.unwrap(), None);
        let by_title = service.find_movies_by_title("Heat").await.unwrap();
        assert_eq!(by_title[0].title, "by_title Heat");
        let by_genre = service.find_movies_by_genre(18, None).await.unwrap();
        assert_eq!(by_genre[0].title, "genre 18");
        assert!(service.find_all_genres().await.unwrap().is_empty());

        assert_eq!(
            *repo.calls.lock().unwrap(),
            vec![
                "by_id 42".to_string(),
                "by_title Heat".to_string(),
                "genre 18".to_string(),
            ]
        );
    }
}
