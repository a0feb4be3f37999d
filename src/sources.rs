use crate::api::{Film, FilmApi, SearchParams};
use crate::error::ApiError;
use crate::paging::{Delivery, ListQuery, PageSource, PageWindow};
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Server-paged `/films?skip&limit`, with the catalog size from `/films/count`.
pub struct CatalogSource {
    api: Arc<FilmApi>,
}

impl CatalogSource {
    pub fn new(api: Arc<FilmApi>) -> Self {
        Self { api }
    }
}

impl PageSource<Film> for CatalogSource {
    fn fetch(&self, window: PageWindow) -> BoxFuture<'_, Result<Vec<Film>, ApiError>> {
        Box::pin(self.api.list_films(window.offset, window.limit))
    }

    fn total(&self) -> BoxFuture<'_, Result<Option<u64>, ApiError>> {
        Box::pin(async move { self.api.count_films().await.map(Some) })
    }
}

/// `/films/top`, delivered in one piece. The total is the catalog size.
pub struct TopRatedSource {
    api: Arc<FilmApi>,
}

impl TopRatedSource {
    pub fn new(api: Arc<FilmApi>) -> Self {
        Self { api }
    }
}

impl PageSource<Film> for TopRatedSource {
    fn delivery(&self) -> Delivery {
        Delivery::Whole
    }

    fn fetch(&self, _window: PageWindow) -> BoxFuture<'_, Result<Vec<Film>, ApiError>> {
        Box::pin(self.api.top_films())
    }

    fn total(&self) -> BoxFuture<'_, Result<Option<u64>, ApiError>> {
        Box::pin(async move { self.api.count_films().await.map(Some) })
    }
}

/// All films of one genre, fetched once and handed out page by page.
pub struct GenreSource {
    api: Arc<FilmApi>,
    genre_id: i64,
    films: OnceCell<Vec<Film>>,
}

impl GenreSource {
    pub fn new(api: Arc<FilmApi>, genre_id: i64) -> Self {
        Self {
            api,
            genre_id,
            films: OnceCell::new(),
        }
    }

    pub fn genre_id(&self) -> i64 {
        self.genre_id
    }

    async fn all(&self) -> Result<&Vec<Film>, ApiError> {
        self.films
            .get_or_try_init(|| self.api.films_by_genre(self.genre_id))
            .await
    }
}

impl PageSource<Film> for GenreSource {
    fn fetch(&self, window: PageWindow) -> BoxFuture<'_, Result<Vec<Film>, ApiError>> {
        Box::pin(async move {
            let films = self.all().await?;
            let start = window.offset.min(films.len());
            let end = (window.offset + window.limit).min(films.len());
            Ok(films[start..end].to_vec())
        })
    }

    fn total(&self) -> BoxFuture<'_, Result<Option<u64>, ApiError>> {
        Box::pin(async move { Ok(Some(self.all().await?.len() as u64)) })
    }
}

/// `/films/search`, delivered in one piece.
pub struct SearchSource {
    api: Arc<FilmApi>,
    params: SearchParams,
}

impl SearchSource {
    pub fn new(api: Arc<FilmApi>, params: SearchParams) -> Self {
        Self { api, params }
    }
}

impl PageSource<Film> for SearchSource {
    fn delivery(&self) -> Delivery {
        Delivery::Whole
    }

    fn fetch(&self, _window: PageWindow) -> BoxFuture<'_, Result<Vec<Film>, ApiError>> {
        Box::pin(self.api.search_films(&self.params))
    }
}

/// Advanced search criteria. Title and rating go to the server; rating and
/// release year are also checked locally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilmFilter {
    pub title: Option<String>,
    pub genre_id: Option<i64>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
}

impl FilmFilter {
    /// Build from raw form fields. Blank fields are unset.
    pub fn parse(
        title: &str,
        min_rating: &str,
        max_rating: &str,
        min_year: &str,
        max_year: &str,
    ) -> Result<Self, ApiError> {
        let title = Some(title.trim().to_string()).filter(|t| !t.is_empty());
        let filter = Self {
            title,
            genre_id: None,
            min_rating: parse_field(min_rating, "Min rating")?,
            max_rating: parse_field(max_rating, "Max rating")?,
            min_year: parse_field(min_year, "Min year")?,
            max_year: parse_field(max_year, "Max year")?,
        };
        filter.validate()?;
        Ok(filter)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        for rating in [self.min_rating, self.max_rating].into_iter().flatten() {
            if !(0.0..=10.0).contains(&rating) {
                return Err(ApiError::Validation(format!(
                    "Ratings go from 0 to 10, got {rating}"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min_rating, self.max_rating) {
            if min > max {
                return Err(ApiError::Validation(
                    "Min rating is above max rating".to_string(),
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.min_year, self.max_year) {
            if min > max {
                return Err(ApiError::Validation("Min year is after max year".to_string()));
            }
        }
        Ok(())
    }

    pub fn params(&self) -> SearchParams {
        SearchParams {
            title: self.title.clone(),
            genre_id: self.genre_id,
            min_rating: self.min_rating,
            max_rating: self.max_rating,
        }
    }

    fn has_year_bounds(&self) -> bool {
        self.min_year.is_some() || self.max_year.is_some()
    }

    pub fn matches(&self, film: &Film) -> bool {
        if self.min_rating.is_some_and(|min| film.vote_average < min)
            || self.max_rating.is_some_and(|max| film.vote_average > max)
        {
            return false;
        }
        if !self.has_year_bounds() {
            return true;
        }
        // With a year bound set, undated films cannot qualify
        let Some(year) = film.release_year() else {
            return false;
        };
        year >= self.min_year.unwrap_or(i32::MIN) && year <= self.max_year.unwrap_or(i32::MAX)
    }

    /// Filtered query for the paged list.
    pub fn into_query(self, api: Arc<FilmApi>) -> ListQuery<Film> {
        let source = Arc::new(SearchSource::new(api, self.params()));
        ListQuery::filtered(source, move |film| self.matches(film))
    }

    /// One-line description for status bars.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(title) = &self.title {
            parts.push(format!("title ~ \"{title}\""));
        }
        match (self.min_rating, self.max_rating) {
            (None, None) => {}
            (min, max) => parts.push(format!(
                "rating {}..{}",
                min.map(|v| v.to_string()).unwrap_or_default(),
                max.map(|v| v.to_string()).unwrap_or_default()
            )),
        }
        match (self.min_year, self.max_year) {
            (None, None) => {}
            (min, max) => parts.push(format!(
                "year {}..{}",
                min.map(|v| v.to_string()).unwrap_or_default(),
                max.map(|v| v.to_string()).unwrap_or_default()
            )),
        }
        if parts.is_empty() {
            "all films".to_string()
        } else {
            parts.join(", ")
        }
    }
}

fn parse_field<N: std::str::FromStr>(raw: &str, label: &str) -> Result<Option<N>, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| ApiError::Validation(format!("{label} must be a number, got \"{raw}\"")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn film(id: i64, rating: f64, date: Option<&str>) -> Film {
        Film {
            id,
            tmdb_id: Some(id),
            title: format!("Film {id}"),
            overview: String::new(),
            poster_path: None,
            vote_average: rating,
            vote_count: 100,
            release_date: date.map(str::to_string),
            genre_ids: vec![],
            runtime: None,
        }
    }

    #[test]
    fn test_parse_blank_fields() {
        let filter = FilmFilter::parse("  ", "", " ", "", "").unwrap();
        assert_eq!(filter, FilmFilter::default());
        assert_eq!(filter.describe(), "all films");
        assert_eq!(filter.params(), SearchParams::default());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = FilmFilter::parse("", "high", "", "", "").unwrap_err();
        assert_eq!(err.user_message(), "Min rating must be a number, got \"high\"");
        assert!(FilmFilter::parse("", "11", "", "", "").is_err());
        assert!(FilmFilter::parse("", "8", "5", "", "").is_err());
        assert!(FilmFilter::parse("", "", "", "2010", "2000").is_err());
    }

    #[test]
    fn test_rating_range_is_inclusive() {
        let filter = FilmFilter::parse("", "5", "8", "", "").unwrap();
        assert!(filter.matches(&film(1, 5.0, None)));
        assert!(filter.matches(&film(2, 8.0, None)));
        assert!(!filter.matches(&film(3, 4.99, None)));
        assert!(!filter.matches(&film(4, 8.01, None)));
    }

    #[test]
    fn test_year_bounds() {
        let filter = FilmFilter::parse("", "", "", "1990", "1999").unwrap();
        assert!(filter.matches(&film(1, 7.0, Some("1999-03-30"))));
        assert!(filter.matches(&film(2, 7.0, Some("1990-01-01"))));
        assert!(!filter.matches(&film(3, 7.0, Some("2003-05-15"))));
        assert!(!filter.matches(&film(4, 7.0, None)));

        let open_ended = FilmFilter::parse("", "", "", "2000", "").unwrap();
        assert!(open_ended.matches(&film(5, 7.0, Some("2024-01-01"))));
        assert!(!open_ended.matches(&film(6, 7.0, Some("1980-01-01"))));
    }

    #[test]
    fn test_undated_films_pass_without_year_bounds() {
        let filter = FilmFilter::parse("matrix", "", "", "", "").unwrap();
        assert!(filter.matches(&film(1, 0.0, None)));
        assert_eq!(filter.params(), SearchParams::title("matrix"));
        assert_eq!(filter.describe(), "title ~ \"matrix\"");
    }

    #[test]
    fn test_describe_ranges() {
        let filter = FilmFilter::parse("", "6.5", "", "", "2001").unwrap();
        assert_eq!(filter.describe(), "rating 6.5.., year ..2001");
    }
}
