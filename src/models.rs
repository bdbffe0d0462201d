use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 1-based listing page forwarded to upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page(u32);

impl Page {
    pub fn new(page: u32) -> Option<Self> {
        (page >= 1).then_some(Self(page))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for Page {
    type Err = InvalidPage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(Page::new)
            .ok_or(InvalidPage)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPage;

/// A genre reference attached to a movie. Upstream sends plain numbers on
/// listings and sometimes strings, so both are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenreId {
    Number(i64),
    Text(String),
}

/// Normalized movie record returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub release_date: String,
    pub poster_path: Option<String>,
    pub genre_ids: Vec<GenreId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localized_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adult: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<bool>,
}

impl Movie {
    pub fn new(
        id: i64,
        title: impl Into<String>,
        overview: impl Into<String>,
        release_date: impl Into<String>,
        poster_path: Option<String>,
        genre_ids: Vec<GenreId>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            overview: overview.into(),
            release_date: release_date.into(),
            poster_path,
            genre_ids,
            localized_title: None,
            original_language: None,
            backdrop_path: None,
            popularity: None,
            vote_average: None,
            vote_count: None,
            adult: None,
            video: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Genre id to name lookup. Keeps upstream order and serializes as a JSON
/// object keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreMap(Vec<Genre>);

impl GenreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries with an id already present replace the name in place.
    pub fn insert(&mut self, id: i64, name: impl Into<String>) {
        let name = name.into();
        match self.0.iter_mut().find(|g| g.id == id) {
            Some(existing) => existing.name = name,
            None => self.0.push(Genre { id, name }),
        }
    }

    pub fn get(&self, id: i64) -> Option<&str> {
        self.0.iter().find(|g| g.id == id).map(|g| g.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Genre> {
        self.0.iter()
    }
}

impl FromIterator<Genre> for GenreMap {
    fn from_iter<I: IntoIterator<Item = Genre>>(iter: I) -> Self {
        let mut map = GenreMap::new();
        for genre in iter {
            map.insert(genre.id, genre.name);
        }
        map
    }
}

impl Serialize for GenreMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|g| (g.id, &g.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn movie_serializes_camel_case_and_skips_absent_extras() {
        let movie = Movie::new(
            1,
            "Avatar",
            "O",
            "2009-12-18",
            Some("/p.jpg".to_string()),
            vec![GenreId::Number(1), GenreId::Number(2)],
        );
        let value = serde_json::to_value(&movie).expect("serialize movie");
        assert_eq!(
            value,
            json!({
                "id": 1,
                "title": "Avatar",
                "overview": "O",
                "releaseDate": "2009-12-18",
                "posterPath": "/p.jpg",
                "genreIds": [1, 2]
            })
        );
    }

    #[test]
    fn genre_map_keeps_upstream_order_in_json() {
        let map: GenreMap = vec![
            Genre { id: 28, name: "Action".to_string() },
            Genre { id: 12, name: "Adventure".to_string() },
            Genre { id: 16, name: "Animation".to_string() },
        ]
        .into_iter()
        .collect();
        let text = serde_json::to_string(&map).expect("serialize genres");
        assert_eq!(text, r#"{"28":"Action","12":"Adventure","16":"Animation"}"#);
    }

    #[test]
    fn page_accepts_positive_integers_only() {
        assert_eq!("2".parse::<Page>().map(Page::get), Ok(2));
        assert_eq!(" 7 ".parse::<Page>().map(Page::get), Ok(7));
        assert_eq!("0".parse::<Page>(), Err(InvalidPage));
        assert_eq!("-1".parse::<Page>(), Err(InvalidPage));
        assert_eq!("abc".parse::<Page>(), Err(InvalidPage));
    }

    #[test]
    fn duplicate_genre_id_replaces_name_without_moving() {
        let mut map = GenreMap::new();
        map.insert(1, "One");
        map.insert(2, "Two");
        map.insert(1, "Uno");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(1), Some("Uno"));
        assert_eq!(map.iter().next().map(|g| g.id), Some(1));
    }
}
