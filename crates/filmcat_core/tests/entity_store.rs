use chrono::NaiveDate;
use filmcat_core::db::{open_db, open_db_in_memory, SharedConnection};
use filmcat_core::repo::film_repo::SqliteFilmRepository;
use filmcat_core::repo::memory::InMemoryEntityRepository;
use filmcat_core::repo::user_repo::SqliteUserRepository;
use filmcat_core::{EntityKind, EntityRepository, Film, Genre, MpaRating, RepoError, User};
use std::collections::HashSet;
use std::sync::Arc;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn user_stores() -> Vec<(&'static str, Arc<dyn EntityRepository<User>>)> {
    let shared = SharedConnection::new(open_db_in_memory().unwrap());
    let memory: Arc<dyn EntityRepository<User>> =
        Arc::new(InMemoryEntityRepository::<User>::new());
    let sqlite: Arc<dyn EntityRepository<User>> =
        Arc::new(SqliteUserRepository::try_new(shared).unwrap());
    vec![("memory", memory), ("sqlite", sqlite)]
}

fn film_stores() -> Vec<(&'static str, Arc<dyn EntityRepository<Film>>)> {
    let shared = SharedConnection::new(open_db_in_memory().unwrap());
    let memory: Arc<dyn EntityRepository<Film>> =
        Arc::new(InMemoryEntityRepository::<Film>::new());
    let sqlite: Arc<dyn EntityRepository<Film>> =
        Arc::new(SqliteFilmRepository::try_new(shared).unwrap());
    vec![("memory", memory), ("sqlite", sqlite)]
}

fn sample_user(login: &str) -> User {
    User::new(format!("{login}@example.com"), login, login, date(1988, 3, 14))
}

fn sample_film(name: &str) -> Film {
    let mut film = Film::new(name, "a story", date(1999, 3, 31), 136);
    film.mpa = Some(MpaRating::R);
    film.genres.extend([Genre::Action, Genre::Thriller]);
    film
}

#[test]
fn add_mints_distinct_handles_and_returns_stored_value() {
    for (backend, users) in user_stores() {
        let first = users.add(&sample_user("neo")).unwrap();
        let second = users.add(&sample_user("trinity")).unwrap();

        assert!(first.id > 0, "{backend}");
        assert_ne!(first.id, second.id, "{backend}");
        assert_eq!(first.login, "neo", "{backend}");
        assert_eq!(users.get_by_id(first.id).unwrap(), Some(first), "{backend}");
    }
}

#[test]
fn add_ignores_caller_supplied_handle() {
    for (backend, users) in user_stores() {
        let mut user = sample_user("morpheus");
        user.id = 77;
        let stored = users.add(&user).unwrap();
        assert_eq!(stored.id, 1, "{backend}");
        assert_eq!(users.get_by_id(77).unwrap(), None, "{backend}");
    }
}

#[test]
fn handles_are_unique_across_many_adds() {
    for (backend, films) in film_stores() {
        let ids: HashSet<i64> = (0..25)
            .map(|index| films.add(&sample_film(&format!("film {index}"))).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 25, "{backend}");
    }
}

#[test]
fn update_replaces_fields_and_rejects_unknown_handle() {
    for (backend, films) in film_stores() {
        let mut film = films.add(&sample_film("The Matrix")).unwrap();
        film.description = "Wake up".to_string();
        film.mpa = None;
        film.genres.clear();
        film.genres.insert(Genre::Drama);

        let updated = films.update(&film).unwrap();
        assert_eq!(updated, film, "{backend}");
        assert_eq!(films.get_by_id(film.id).unwrap(), Some(film.clone()), "{backend}");

        let mut ghost = film.clone();
        ghost.id = 404;
        match films.update(&ghost) {
            Err(RepoError::NotFound { kind, id }) => {
                assert_eq!(kind, EntityKind::Film, "{backend}");
                assert_eq!(id, 404, "{backend}");
            }
            other => panic!("{backend}: unexpected result {other:?}"),
        }
        assert_eq!(films.get_all().unwrap().len(), 1, "{backend}");
    }
}

#[test]
fn get_all_lists_every_entity_in_handle_order() {
    for (backend, users) in user_stores() {
        assert!(users.get_all().unwrap().is_empty(), "{backend}");
        for login in ["c", "a", "b"] {
            users.add(&sample_user(login)).unwrap();
        }

        let logins: Vec<String> = users
            .get_all()
            .unwrap()
            .into_iter()
            .map(|user| user.login)
            .collect();
        assert_eq!(logins, ["c", "a", "b"], "{backend}");
    }
}

#[test]
fn film_fields_survive_the_durable_backend() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("films.sqlite3");

    let stored = {
        let repo = SqliteFilmRepository::try_new(SharedConnection::new(open_db(&path).unwrap()))
            .unwrap();
        let mut film = sample_film("Мастер и Маргарита");
        film.description = "é".repeat(200);
        repo.add(&film).unwrap()
    };

    let reopened =
        SqliteFilmRepository::try_new(SharedConnection::new(open_db(&path).unwrap())).unwrap();
    let loaded = reopened.get_by_id(stored.id).unwrap().unwrap();
    assert_eq!(loaded, stored);
    assert_eq!(
        loaded.genres.iter().copied().collect::<Vec<_>>(),
        vec![Genre::Action, Genre::Thriller]
    );
}

#[test]
fn corrupt_persisted_rows_surface_as_invalid_data() {
    let shared = SharedConnection::new(open_db_in_memory().unwrap());
    let repo = SqliteUserRepository::try_new(shared.clone()).unwrap();
    let user = repo.add(&sample_user("glitch")).unwrap();

    shared
        .lock()
        .unwrap()
        .execute(
            "UPDATE users SET birthday = 'not-a-date' WHERE user_id = ?1;",
            [user.id],
        )
        .unwrap();

    match repo.get_by_id(user.id) {
        Err(RepoError::InvalidData(message)) => assert!(message.contains("column")),
        other => panic!("unexpected result {other:?}"),
    }
}
