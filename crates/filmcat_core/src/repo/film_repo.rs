//! SQLite film store.
//!
//! # Responsibility
//! - Implement `EntityRepository<Film>` over `films` plus `film_genres`.
//!
//! # Invariants
//! - A film row and its genre rows are written in one transaction.
//! - Update replaces the whole genre set.
//! - Read paths reject unknown genre/MPA ids instead of masking them.

use crate::db::SharedConnection;
use crate::model::film::{Film, FilmId, Genre, MpaRating};
use crate::repo::{ensure_connection_ready, not_found, EntityRepository, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::collections::{BTreeMap, BTreeSet};

const FILM_SELECT_SQL: &str = "SELECT
    film_id,
    name,
    description,
    release_date,
    duration,
    mpa_id
FROM films";

/// SQLite-backed film repository.
pub struct SqliteFilmRepository {
    conn: SharedConnection,
}

impl SqliteFilmRepository {
    /// Creates the repository from a migrated connection.
    pub fn try_new(conn: SharedConnection) -> RepoResult<Self> {
        {
            let guard = conn.lock()?;
            ensure_connection_ready(&guard)?;
        }
        Ok(Self { conn })
    }
}

impl EntityRepository<Film> for SqliteFilmRepository {
    fn add(&self, film: &Film) -> RepoResult<Film> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO films (name, description, release_date, duration, mpa_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                film.name.as_str(),
                film.description.as_str(),
                film.release_date,
                film.duration,
                film.mpa.map(MpaRating::id),
            ],
        )?;
        let id = tx.last_insert_rowid();
        write_genres(&tx, id, &film.genres)?;
        let stored = load_film(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("film {id} missing right after insert"))
        })?;
        tx.commit()?;
        Ok(stored)
    }

    fn get_by_id(&self, id: FilmId) -> RepoResult<Option<Film>> {
        let conn = self.conn.lock()?;
        load_film(&conn, id)
    }

    fn update(&self, film: &Film) -> RepoResult<Film> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE films
             SET
                name = ?1,
                description = ?2,
                release_date = ?3,
                duration = ?4,
                mpa_id = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE film_id = ?6;",
            params![
                film.name.as_str(),
                film.description.as_str(),
                film.release_date,
                film.duration,
                film.mpa.map(MpaRating::id),
                film.id,
            ],
        )?;
        if changed == 0 {
            return Err(not_found::<Film>(film.id));
        }

        tx.execute("DELETE FROM film_genres WHERE film_id = ?1;", [film.id])?;
        write_genres(&tx, film.id, &film.genres)?;
        let stored = load_film(&tx, film.id)?.ok_or_else(|| not_found::<Film>(film.id))?;
        tx.commit()?;
        Ok(stored)
    }

    fn get_all(&self) -> RepoResult<Vec<Film>> {
        let conn = self.conn.lock()?;
        let mut genres_by_film = load_all_genres(&conn)?;

        let mut stmt = conn.prepare(&format!("{FILM_SELECT_SQL} ORDER BY film_id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut films = Vec::new();
        while let Some(row) = rows.next()? {
            let mut film = parse_film_row(row)?;
            film.genres = genres_by_film.remove(&film.id).unwrap_or_default();
            films.push(film);
        }
        Ok(films)
    }
}

fn write_genres(conn: &Connection, film_id: FilmId, genres: &BTreeSet<Genre>) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO film_genres (film_id, genre_id)
         VALUES (?1, ?2);",
    )?;
    for genre in genres {
        stmt.execute(params![film_id, genre.id()])?;
    }
    Ok(())
}

fn load_film(conn: &Connection, id: FilmId) -> RepoResult<Option<Film>> {
    let mut stmt = conn.prepare(&format!("{FILM_SELECT_SQL} WHERE film_id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    let mut film = parse_film_row(row)?;
    film.genres = load_genres(conn, id)?;
    Ok(Some(film))
}

fn load_genres(conn: &Connection, film_id: FilmId) -> RepoResult<BTreeSet<Genre>> {
    let mut stmt = conn.prepare(
        "SELECT genre_id
         FROM film_genres
         WHERE film_id = ?1;",
    )?;
    let mut rows = stmt.query([film_id])?;
    let mut genres = BTreeSet::new();
    while let Some(row) = rows.next()? {
        genres.insert(parse_genre(row.get(0)?)?);
    }
    Ok(genres)
}

fn load_all_genres(conn: &Connection) -> RepoResult<BTreeMap<FilmId, BTreeSet<Genre>>> {
    let mut stmt = conn.prepare("SELECT film_id, genre_id FROM film_genres;")?;
    let mut rows = stmt.query([])?;
    let mut genres: BTreeMap<FilmId, BTreeSet<Genre>> = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let film_id: FilmId = row.get("film_id")?;
        genres
            .entry(film_id)
            .or_default()
            .insert(parse_genre(row.get("genre_id")?)?);
    }
    Ok(genres)
}

fn parse_film_row(row: &Row<'_>) -> RepoResult<Film> {
    let mpa = match row.get::<_, Option<i64>>("mpa_id")? {
        Some(value) => Some(MpaRating::from_id(value).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid mpa id `{value}` in films.mpa_id"))
        })?),
        None => None,
    };

    Ok(Film {
        id: row.get("film_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        release_date: row.get("release_date")?,
        duration: row.get("duration")?,
        mpa,
        genres: BTreeSet::new(),
    })
}

fn parse_genre(value: i64) -> RepoResult<Genre> {
    Genre::from_id(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid genre id `{value}` in film_genres.genre_id"))
    })
}
