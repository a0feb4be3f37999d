use crate::config::Config;
use crate::error::ApiError;
use chrono::{Datelike, NaiveDate};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A single film as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    #[serde(rename = "_id")]
    pub id: i64,
    /// Upstream TMDb identifier, usually equal to `id`.
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    #[serde(default)]
    pub runtime: Option<u32>,
}

impl Film {
    /// Release year, if the release date can be read.
    pub fn release_year(&self) -> Option<i32> {
        let raw = self.release_date.as_deref()?.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date.year());
        }
        // Year-only or year-month dates
        let year = raw.split('-').next()?;
        if year.len() == 4 {
            year.parse().ok()
        } else {
            None
        }
    }
}

/// Genre with the number of films tagged with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreStat {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(default)]
    pub count: u64,
    #[serde(default = "unknown_genre")]
    pub name: String,
}

/// Entry of the genre collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(rename = "_id")]
    pub id: i64,
    /// Upstream TMDb identifier, stored next to `_id`.
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<i64>,
    #[serde(default = "unknown_genre")]
    pub name: String,
}

fn unknown_genre() -> String {
    "Unknown".to_string()
}

/// Body returned by create/update/delete.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MutationResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// Server-side search parameters. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    pub title: Option<String>,
    pub genre_id: Option<i64>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
}

impl SearchParams {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(title) = self.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            pairs.push(("title", title.to_string()));
        }
        if let Some(genre) = self.genre_id {
            pairs.push(("genre_id", genre.to_string()));
        }
        if let Some(min) = self.min_rating {
            pairs.push(("min_rating", min.to_string()));
        }
        if let Some(max) = self.max_rating {
            pairs.push(("max_rating", max.to_string()));
        }
        pairs
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountResponse {
    Plain(u64),
    Wrapped { total_films: u64 },
}

#[derive(Deserialize)]
struct AverageResponse {
    average_rating: f64,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

#[derive(Serialize)]
struct GenreRequest {
    genre_id: i64,
}

/// API handle wrapping a reqwest client and the server base URL.
#[derive(Debug, Clone)]
pub struct FilmApi {
    client: reqwest::Client,
    base: Url,
}

impl FilmApi {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let base = config
            .base_url()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("film-explorer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base))
    }

    pub fn with_client(client: reqwest::Client, base: Url) -> Self {
        FilmApi { client, base }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::Validation(format!("bad endpoint {path}: {e}")))
    }

    pub fn films_url(&self, skip: usize, limit: usize) -> Result<Url, ApiError> {
        let mut url = self.endpoint("films")?;
        url.query_pairs_mut()
            .append_pair("skip", &skip.to_string())
            .append_pair("limit", &limit.to_string());
        Ok(url)
    }

    pub fn search_url(&self, params: &SearchParams) -> Result<Url, ApiError> {
        let mut url = self.endpoint("films/search")?;
        let pairs = params.query_pairs();
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in &pairs {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    // ── Request helpers ──

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_detail(&body),
            });
        }
        Ok(body)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
        what: &str,
    ) -> Result<T, ApiError> {
        tracing::debug!(%method, %url, "api request");
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let text = self.send(request, what).await?;
        decode(&text)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T, ApiError> {
        self.request(Method::GET, url, None, what).await
    }

    async fn post_genre<T: DeserializeOwned>(&self, path: &str, genre_id: i64) -> Result<T, ApiError> {
        let body = serde_json::to_value(GenreRequest { genre_id })
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        self.request(Method::POST, self.endpoint(path)?, Some(&body), "Genre")
            .await
    }

    // ── Films ──

    /// `GET /films?skip=&limit=`
    pub async fn list_films(&self, skip: usize, limit: usize) -> Result<Vec<Film>, ApiError> {
        self.get(self.films_url(skip, limit)?, "Films").await
    }

    /// `GET /films/search`
    pub async fn search_films(&self, params: &SearchParams) -> Result<Vec<Film>, ApiError> {
        self.get(self.search_url(params)?, "Films").await
    }

    /// `GET /films/top`
    pub async fn top_films(&self) -> Result<Vec<Film>, ApiError> {
        self.get(self.endpoint("films/top")?, "Top films").await
    }

    /// `GET /films/count`
    pub async fn count_films(&self) -> Result<u64, ApiError> {
        let count: CountResponse = self.get(self.endpoint("films/count")?, "Film count").await?;
        Ok(match count {
            CountResponse::Plain(n) => n,
            CountResponse::Wrapped { total_films } => total_films,
        })
    }

    /// `GET /films/{id}`. A 404 becomes `Ok(None)`.
    pub async fn get_film(&self, id: i64) -> Result<Option<Film>, ApiError> {
        let url = self.endpoint(&format!("films/{id}"))?;
        optional(self.get(url, &format!("Film {id}")).await)
    }

    /// `GET /films/oldest`
    pub async fn oldest_film(&self) -> Result<Option<Film>, ApiError> {
        optional(self.get(self.endpoint("films/oldest")?, "Oldest film").await)
    }

    /// `GET /films/newest`
    pub async fn newest_film(&self) -> Result<Option<Film>, ApiError> {
        optional(self.get(self.endpoint("films/newest")?, "Newest film").await)
    }

    /// `GET /films/average-rating`
    pub async fn average_rating(&self) -> Result<Option<f64>, ApiError> {
        let avg: Option<AverageResponse> = optional(
            self.get(self.endpoint("films/average-rating")?, "Average rating")
                .await,
        )?;
        Ok(avg.map(|a| a.average_rating))
    }

    /// `POST /films/by-genre`
    pub async fn films_by_genre(&self, genre_id: i64) -> Result<Vec<Film>, ApiError> {
        self.post_genre("films/by-genre", genre_id).await
    }

    /// `POST /films/top-by-genre`
    pub async fn top_films_by_genre(&self, genre_id: i64) -> Result<Vec<Film>, ApiError> {
        self.post_genre("films/top-by-genre", genre_id).await
    }

    // ── Genres ──

    /// `GET /films/genres/stats`
    pub async fn genre_stats(&self) -> Result<Vec<GenreStat>, ApiError> {
        self.get(self.endpoint("films/genres/stats")?, "Genre stats").await
    }

    /// `GET /films/genres/top5`
    pub async fn top_genres(&self) -> Result<Vec<GenreStat>, ApiError> {
        self.get(self.endpoint("films/genres/top5")?, "Top genres").await
    }

    /// `GET /genres/`
    pub async fn list_genres(&self) -> Result<Vec<Genre>, ApiError> {
        self.get(self.endpoint("genres/")?, "Genres").await
    }

    /// `GET /genres/{id}`
    pub async fn get_genre(&self, id: i64) -> Result<Option<Genre>, ApiError> {
        optional(
            self.get(self.endpoint(&format!("genres/{id}"))?, &format!("Genre {id}"))
                .await,
        )
    }

    // ── CRUD passthrough ──

    /// `POST /films`. The server takes `_id` from the body's `id`.
    pub async fn add_film(&self, film: &serde_json::Value) -> Result<MutationResponse, ApiError> {
        if film.get("id").is_none() {
            return Err(ApiError::Validation("a new film needs an \"id\" field".to_string()));
        }
        self.request(Method::POST, self.endpoint("films")?, Some(film), "Film")
            .await
    }

    /// `PUT /films/{id}`
    pub async fn update_film(
        &self,
        id: i64,
        film: &serde_json::Value,
    ) -> Result<MutationResponse, ApiError> {
        let url = self.endpoint(&format!("films/{id}"))?;
        self.request(Method::PUT, url, Some(film), &format!("Film {id}"))
            .await
    }

    /// `DELETE /films/{id}`
    pub async fn delete_film(&self, id: i64) -> Result<MutationResponse, ApiError> {
        let url = self.endpoint(&format!("films/{id}"))?;
        self.request(Method::DELETE, url, None, &format!("Film {id}"))
            .await
    }
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

fn optional<T>(result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Pull FastAPI's `{"detail": ...}` out of an error body, falling back to the
/// raw text.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().chars().take(200).collect(),
    }
}
