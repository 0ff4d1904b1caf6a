use std::path::Path;

use sqlx::AnyPool;
use streamstats::db::connect_pool;

pub fn sqlite_url(dir: &Path, name: &str) -> String {
    format!("sqlite://{}?mode=rwc", dir.join(name).display())
}

pub const SCHEMA: &[&str] = &[
    "CREATE TABLE details (
        title_id TEXT PRIMARY KEY NOT NULL,
        title_text TEXT,
        imdb_score REAL,
        type TEXT NOT NULL,
        release_year INTEGER,
        tv_rating TEXT,
        runtime TEXT
    )",
    "CREATE TABLE stream_history (
        title_id TEXT NOT NULL,
        streaming_service TEXT NOT NULL,
        added_date TEXT,
        current_status TEXT NOT NULL
    )",
    "CREATE TABLE genres (genre_id INTEGER PRIMARY KEY NOT NULL, genre_name TEXT)",
    "CREATE TABLE title_genre (title_id TEXT NOT NULL, genre_id INTEGER NOT NULL)",
];

/// Same tables with the looser column types a real warehouse tends to use.
pub const TYPED_SCHEMA: &[&str] = &[
    "CREATE TABLE details (
        title_id TEXT PRIMARY KEY NOT NULL,
        title_text VARCHAR(200),
        imdb_score NUMERIC(3, 1),
        type VARCHAR(20) NOT NULL,
        release_year NUMERIC,
        tv_rating VARCHAR(10),
        runtime VARCHAR(20)
    )",
    "CREATE TABLE stream_history (
        title_id TEXT NOT NULL,
        streaming_service TEXT NOT NULL,
        added_date DATE,
        current_status TEXT NOT NULL
    )",
    "CREATE TABLE genres (genre_id INTEGER PRIMARY KEY NOT NULL, genre_name TEXT)",
    "CREATE TABLE title_genre (title_id TEXT NOT NULL, genre_id INTEGER NOT NULL)",
];

pub struct Title<'a> {
    pub id: &'a str,
    pub kind: &'a str,
    pub score: Option<f64>,
    pub year: i64,
    pub rating: &'a str,
    pub runtime: &'a str,
    pub genres: &'a [i64],
}

pub struct Availability<'a> {
    pub title_id: &'a str,
    pub service: &'a str,
    pub added: Option<&'a str>,
    pub active: bool,
}

/// Create the four warehouse tables and load a small catalogue.
pub async fn seed_warehouse(url: &str, titles: &[Title<'_>], history: &[Availability<'_>]) -> AnyPool {
    seed_warehouse_with(url, SCHEMA, titles, history).await
}

pub async fn seed_warehouse_with(
    url: &str,
    schema: &[&str],
    titles: &[Title<'_>],
    history: &[Availability<'_>],
) -> AnyPool {
    let pool = connect_pool(url, 1).await.unwrap();
    for stmt in schema {
        sqlx::query(stmt).execute(&pool).await.unwrap();
    }
    for (id, name) in [(1_i64, "Drama"), (2, "Comedy"), (3, "Crime"), (4, "Documentary")] {
        sqlx::query("INSERT INTO genres(genre_id, genre_name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&pool)
            .await
            .unwrap();
    }
    for t in titles {
        sqlx::query(
            "INSERT INTO details(title_id, title_text, imdb_score, type, release_year, tv_rating, runtime) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(t.id)
        .bind(format!("Title {}", t.id))
        .bind(t.score)
        .bind(t.kind)
        .bind(t.year)
        .bind(t.rating)
        .bind(t.runtime)
        .execute(&pool)
        .await
        .unwrap();
        for g in t.genres {
            sqlx::query("INSERT INTO title_genre(title_id, genre_id) VALUES (?, ?)")
                .bind(t.id)
                .bind(*g)
                .execute(&pool)
                .await
                .unwrap();
        }
    }
    for h in history {
        sqlx::query("INSERT INTO stream_history(title_id, streaming_service, added_date, current_status) VALUES (?, ?, ?, ?)")
            .bind(h.title_id)
            .bind(h.service)
            .bind(h.added)
            .bind(if h.active { "true" } else { "false" })
            .execute(&pool)
            .await
            .unwrap();
    }
    pool
}
