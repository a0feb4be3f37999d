use crate::api::{Film, FilmApi, GenreStat};
use crate::error::ApiError;
use crate::paging::{ListQuery, PagedList};
use crate::sources::{CatalogSource, FilmFilter};
use crate::ui::truncate_str;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// One table row per film.
pub fn film_row(film: &Film) -> String {
    let year = film
        .release_year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "----".to_string());
    format!(
        "{:>8}  {:<42}  {}  {:>4.1} ({} votes)",
        film.id,
        pad(&truncate_str(&film.title, 42), 42),
        year,
        film.vote_average,
        film.vote_count
    )
}

fn pad(s: &str, width: usize) -> String {
    let used = unicode_width::UnicodeWidthStr::width(s);
    format!("{}{}", s, " ".repeat(width.saturating_sub(used)))
}

fn print_films(films: &[Film], json: bool) -> CmdResult {
    if json {
        println!("{}", serde_json::to_string_pretty(films)?);
    } else if films.is_empty() {
        println!("No films found");
    } else {
        for film in films {
            println!("{}", film_row(film));
        }
    }
    Ok(())
}

fn read_json(path: &Path) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read {}: {}", path.display(), e))?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    if !value.is_object() {
        return Err(ApiError::Validation("film JSON must be an object".to_string()).into());
    }
    Ok(value)
}

/// `list`: one page, or every page with `all`.
pub async fn list(api: Arc<FilmApi>, skip: usize, limit: usize, all: bool, json: bool) -> CmdResult {
    if !all {
        let films = api.list_films(skip, limit).await?;
        return print_films(&films, json);
    }

    let mut list = PagedList::new(limit);
    list.reset_now(ListQuery::new(Arc::new(CatalogSource::new(api))))
        .await;
    while list.error().is_none() && list.load_next_now().await.is_some() {
        tracing::debug!(loaded = list.len(), "catalog page");
    }
    if let Some(error) = list.error() {
        return Err(error.to_string().into());
    }
    print_films(list.items(), json)?;
    if !json {
        if let Some(total) = list.total_count() {
            println!("{} of {} films", list.len(), total);
        }
    }
    Ok(())
}

/// `search`: server search plus the local rating/year filter.
pub async fn search(api: Arc<FilmApi>, filter: FilmFilter, json: bool) -> CmdResult {
    filter.validate()?;
    tracing::info!(filter = %filter.describe(), "search");
    let mut list = PagedList::new(1);
    list.reset_now(filter.into_query(api)).await;
    if let Some(error) = list.error() {
        return Err(error.to_string().into());
    }
    print_films(list.items(), json)
}

pub async fn show(api: &FilmApi, id: i64, json: bool) -> CmdResult {
    let Some(film) = api.get_film(id).await? else {
        return Err(ApiError::NotFound(format!("Film {id}")).user_message().into());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&film)?);
        return Ok(());
    }

    let genres = match api.genre_stats().await {
        Ok(stats) => genre_names(&stats),
        Err(e) => {
            tracing::warn!(error = %e, "genre names unavailable");
            HashMap::new()
        }
    };
    println!("{} [{}]", film.title, film.id);
    if let Some(date) = &film.release_date {
        println!("Released:  {}", date);
    }
    println!("Rating:    {:.1} ({} votes)", film.vote_average, film.vote_count);
    if let Some(runtime) = film.runtime {
        println!("Runtime:   {} min", runtime);
    }
    if !film.genre_ids.is_empty() {
        println!("Genres:    {}", describe_genres(&film.genre_ids, &genres));
    }
    if !film.overview.is_empty() {
        println!();
        println!("{}", film.overview);
    }
    Ok(())
}

/// `top`: top-rated films with genre names, fetched together.
pub async fn top(api: &FilmApi, json: bool) -> CmdResult {
    let (films, stats) = tokio::try_join!(api.top_films(), api.genre_stats())?;
    if json {
        return print_films(&films, true);
    }
    let genres = genre_names(&stats);
    for (rank, film) in films.iter().enumerate() {
        println!("{:>2}. {}", rank + 1, film_row(film));
        if !film.genre_ids.is_empty() {
            println!("    {}", describe_genres(&film.genre_ids, &genres));
        }
    }
    Ok(())
}

/// `genres`: counts per genre, or the bare collection with `all`.
pub async fn genres(api: &FilmApi, all: bool, json: bool) -> CmdResult {
    if all {
        let genres = api.list_genres().await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&genres)?);
        } else {
            for genre in &genres {
                println!("{:>6}  {}", genre.id, genre.name);
            }
        }
        return Ok(());
    }

    let stats = api.genre_stats().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    for genre in &stats {
        println!("{:>6}  {:<24} {:>6}", genre.id, genre.name, genre.count);
    }
    Ok(())
}

/// `genre`: one genre and its best-rated films.
pub async fn genre(api: &FilmApi, id: i64, json: bool) -> CmdResult {
    let (genre, films) = tokio::try_join!(api.get_genre(id), api.top_films_by_genre(id))?;
    let Some(genre) = genre else {
        return Err(ApiError::NotFound(format!("Genre {id}")).user_message().into());
    };
    if json {
        return print_films(&films, true);
    }
    println!("{} [{}]", genre.name, genre.id);
    print_films(&films, false)
}

/// `stats`: catalog-wide figures.
pub async fn stats(api: &FilmApi) -> CmdResult {
    let (count, average, oldest, newest, top5) = tokio::try_join!(
        api.count_films(),
        api.average_rating(),
        api.oldest_film(),
        api.newest_film(),
        api.top_genres()
    )?;

    println!("Films:          {}", count);
    match average {
        Some(avg) => println!("Average rating: {:.2}", avg),
        None => println!("Average rating: n/a"),
    }
    if let Some(film) = oldest {
        println!("Oldest:         {} ({})", film.title, film.release_date.unwrap_or_default());
    }
    if let Some(film) = newest {
        println!("Newest:         {} ({})", film.title, film.release_date.unwrap_or_default());
    }
    if !top5.is_empty() {
        let names: Vec<String> = top5
            .iter()
            .map(|g| format!("{} ({})", g.name, g.count))
            .collect();
        println!("Top genres:     {}", names.join(", "));
    }
    Ok(())
}

pub async fn add(api: &FilmApi, file: &Path) -> CmdResult {
    let film = read_json(file)?;
    let response = api.add_film(&film).await?;
    tracing::info!(id = ?response.id, "film added");
    println!("{}", response.message);
    Ok(())
}

pub async fn update(api: &FilmApi, id: i64, file: &Path) -> CmdResult {
    let film = read_json(file)?;
    let response = api.update_film(id, &film).await?;
    tracing::info!(id, "film updated");
    println!("{}", response.message);
    Ok(())
}

pub async fn delete(api: &FilmApi, id: i64) -> CmdResult {
    let response = api.delete_film(id).await?;
    tracing::info!(id, "film deleted");
    println!("{}", response.message);
    Ok(())
}

pub fn genre_names(stats: &[GenreStat]) -> HashMap<i64, String> {
    stats.iter().map(|g| (g.id, g.name.clone())).collect()
}

pub fn describe_genres(ids: &[i64], names: &HashMap<i64, String>) -> String {
    ids.iter()
        .map(|id| names.get(id).cloned().unwrap_or_else(|| format!("#{id}")))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn matrix() -> Film {
        Film {
            id: 603,
            tmdb_id: Some(603),
            title: "The Matrix".to_string(),
            overview: String::new(),
            poster_path: None,
            vote_average: 8.2,
            vote_count: 25000,
            release_date: Some("1999-03-30".to_string()),
            genre_ids: vec![28, 878],
            runtime: Some(136),
        }
    }

    #[test]
    fn test_film_row() {
        let row = film_row(&matrix());
        assert!(row.starts_with("     603  The Matrix"));
        assert!(row.contains("1999"));
        assert!(row.ends_with("8.2 (25000 votes)"));
    }

    #[test]
    fn test_film_row_without_date() {
        let mut film = matrix();
        film.release_date = None;
        assert!(film_row(&film).contains("----"));
    }

    #[test]
    fn test_describe_genres_falls_back_to_id() {
        let stats = vec![GenreStat {
            id: 28,
            count: 10,
            name: "Action".to_string(),
        }];
        let names = genre_names(&stats);
        assert_eq!(describe_genres(&[28, 878], &names), "Action, #878");
    }

    #[test]
    fn test_read_json_requires_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2]").unwrap();
        assert!(read_json(file.path()).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"id": 1, "title": "New"}}"#).unwrap();
        assert_eq!(read_json(file.path()).unwrap()["title"], "New");
    }
}
