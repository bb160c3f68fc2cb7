use chrono::NaiveDate;
use filmcat_core::model::film::MAX_DESCRIPTION_UNITS;
use filmcat_core::{
    Catalog, CatalogConfig, ErrorClass, Film, Genre, MpaRating, ServiceError, StorageBackend,
    User, UserValidationError,
};
use serde_json::json;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn fixed_today() -> NaiveDate {
    date(2024, 6, 1)
}

#[test]
fn blank_display_name_falls_back_to_login() {
    let catalog = Catalog::in_memory();
    let stored = catalog
        .users
        .add_user(User::new("ada@example.com", "ada", "   ", date(1815, 12, 10)))
        .unwrap();
    assert_eq!(stored.name, "ada");

    let mut renamed = stored.clone();
    renamed.name = String::new();
    renamed.login = "lovelace".to_string();
    assert_eq!(catalog.users.update_user(renamed).unwrap().name, "lovelace");
}

#[test]
fn invalid_users_are_bad_requests_and_not_stored() {
    let catalog = Catalog::in_memory();
    let users = catalog.users.clone().with_clock(fixed_today);

    let cases = [
        User::new("not-an-email", "ok", "", date(1990, 1, 1)),
        User::new("a@b.c", "  ", "", date(1990, 1, 1)),
        User::new("a@b.c", "two words", "", date(1990, 1, 1)),
        User::new("a@b.c", "future", "", date(2024, 6, 2)),
    ];
    for user in cases {
        let err = users.add_user(user).unwrap_err();
        assert_eq!(err.class(), ErrorClass::BadRequest, "{err}");
    }
    assert!(users.list_users().unwrap().is_empty());

    let born_today = users
        .add_user(User::new("a@b.c", "today", "", fixed_today()))
        .unwrap();
    assert_eq!(born_today.birthday, fixed_today());

    match users.add_user(User::new("a@b.c", "later", "", date(2030, 1, 1))) {
        Err(ServiceError::InvalidUser(UserValidationError::BirthdayInFuture { today, .. })) => {
            assert_eq!(today, fixed_today());
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn invalid_films_are_bad_requests() {
    let catalog = Catalog::in_memory();
    let valid = Film::new("Nosferatu", "", date(1922, 3, 4), 94);

    let mut long = valid.clone();
    long.description = "x".repeat(MAX_DESCRIPTION_UNITS + 1);
    let mut early = valid.clone();
    early.release_date = date(1895, 12, 27);
    let mut zero = valid.clone();
    zero.duration = 0;
    let mut unnamed = valid.clone();
    unnamed.name = " ".to_string();

    for film in [long, early, zero, unnamed] {
        let err = catalog.films.add_film(film).unwrap_err();
        assert_eq!(err.class(), ErrorClass::BadRequest, "{err}");
    }
    assert!(catalog.films.list_films().unwrap().is_empty());

    let mut boundary = valid;
    boundary.release_date = date(1895, 12, 28);
    boundary.description = "x".repeat(MAX_DESCRIPTION_UNITS);
    assert!(catalog.films.add_film(boundary).is_ok());
}

#[test]
fn updates_and_reads_of_unknown_handles_are_missing_resources() {
    let catalog = Catalog::in_memory();

    let mut ghost = User::new("g@h.st", "ghost", "", date(1990, 1, 1));
    ghost.id = 31;
    let err = catalog.users.update_user(ghost).unwrap_err();
    assert_eq!(err.class(), ErrorClass::MissingResource);

    let mut film = Film::new("Phantom", "", date(1990, 1, 1), 80);
    film.id = 13;
    assert_eq!(
        catalog.films.update_film(film).unwrap_err().class(),
        ErrorClass::MissingResource
    );
    assert_eq!(
        catalog.users.get_user(5).unwrap_err().class(),
        ErrorClass::MissingResource
    );
    assert_eq!(
        catalog.films.get_film(5).unwrap_err().to_string(),
        "film not found: 5"
    );
}

#[test]
fn wire_shape_of_entities() {
    let catalog = Catalog::in_memory();
    let user = catalog
        .users
        .add_user(User::new("k@example.com", "kubrick", "Stanley", date(1928, 7, 26)))
        .unwrap();
    assert_eq!(
        serde_json::to_value(&user).unwrap(),
        json!({
            "id": user.id,
            "email": "k@example.com",
            "login": "kubrick",
            "name": "Stanley",
            "birthday": "1928-07-26"
        })
    );

    let mut film = Film::new("2001: A Space Odyssey", "", date(1968, 4, 2), 149);
    film.mpa = Some(MpaRating::G);
    film.genres.extend([Genre::Drama, Genre::Comedy]);
    let film = catalog.films.add_film(film).unwrap();
    let value = serde_json::to_value(&film).unwrap();
    assert_eq!(value["mpa"], "G");
    assert_eq!(value["genres"], json!(["comedy", "drama"]));
    assert_eq!(value["release_date"], "1968-04-02");

    let parsed: Film = serde_json::from_value(json!({
        "name": "Solaris",
        "release_date": "1972-03-20",
        "duration": 167,
        "mpa": "PG-13"
    }))
    .unwrap();
    assert_eq!(parsed.id, 0);
    assert_eq!(parsed.mpa, Some(MpaRating::Pg13));
    assert!(parsed.genres.is_empty());
}

#[test]
fn open_respects_configured_backend() {
    let dir = tempfile::tempdir().unwrap();
    let config = CatalogConfig {
        backend: StorageBackend::Sqlite,
        db_path: dir.path().join("catalog.sqlite3"),
        ..CatalogConfig::default()
    };

    let first = Catalog::open(&config).unwrap();
    let id = first
        .users
        .add_user(User::new("p@q.r", "persisted", "", date(2001, 9, 9)))
        .unwrap()
        .id;
    drop(first);

    let reopened = Catalog::open(&config).unwrap();
    assert_eq!(reopened.users.get_user(id).unwrap().login, "persisted");

    let memory = Catalog::open(&CatalogConfig {
        backend: StorageBackend::Memory,
        ..config
    })
    .unwrap();
    assert!(memory.users.list_users().unwrap().is_empty());
}
