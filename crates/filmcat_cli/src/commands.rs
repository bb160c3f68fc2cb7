use crate::cli::*;
use filmcat_core::{
    Catalog, ErrorClass, Film, FilmId, Genre, MpaRating, ServiceError, User, UserId,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Failure of one CLI invocation after argument parsing.
#[derive(Debug)]
pub enum CliError {
    Service(ServiceError),
    InvalidArgument(String),
    UnknownLookup(String),
    Internal(String),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArgument(_) => 2,
            Self::UnknownLookup(_) => 3,
            Self::Service(err) => match err.class() {
                ErrorClass::BadRequest => 2,
                ErrorClass::MissingResource => 3,
                ErrorClass::Internal => 1,
            },
            Self::Internal(_) => 1,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Service(err) => err.code(),
            Self::InvalidArgument(_) => "invalid_argument",
            Self::UnknownLookup(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(err) => write!(f, "{err}"),
            Self::InvalidArgument(message)
            | Self::UnknownLookup(message)
            | Self::Internal(message) => write!(f, "{message}"),
        }
    }
}

impl From<ServiceError> for CliError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(format!("failed to encode output: {value}"))
    }
}

type CliResult = Result<Value, CliError>;

#[derive(Serialize)]
struct LookupEntry {
    id: i64,
    name: &'static str,
}

pub fn run_command(command: Command, catalog: &Catalog) -> CliResult {
    match command {
        Command::User(command) => run_user(command, catalog),
        Command::Friend(command) => run_friend(command, catalog),
        Command::Film(command) => run_film(command, catalog),
        Command::Genres(args) => lookup(
            "genre",
            args.id,
            Genre::ALL.iter().map(|genre| LookupEntry {
                id: genre.id(),
                name: genre.label(),
            }),
            |id| Genre::from_id(id).map(|genre| genre.label()),
        ),
        Command::Mpa(args) => lookup(
            "MPA rating",
            args.id,
            MpaRating::ALL.iter().map(|rating| LookupEntry {
                id: rating.id(),
                name: rating.label(),
            }),
            |id| MpaRating::from_id(id).map(|rating| rating.label()),
        ),
    }
}

/// Lists a lookup table, or resolves one id from it.
fn lookup(
    table: &str,
    id: Option<i64>,
    entries: impl Iterator<Item = LookupEntry>,
    resolve: impl Fn(i64) -> Option<&'static str>,
) -> CliResult {
    match id {
        None => to_value(entries.collect::<Vec<_>>()),
        Some(id) => match resolve(id) {
            Some(name) => to_value(LookupEntry { id, name }),
            None => Err(CliError::UnknownLookup(format!("{table} not found: {id}"))),
        },
    }
}

fn run_user(command: UserCommand, catalog: &Catalog) -> CliResult {
    let users = &catalog.users;
    match command {
        UserCommand::Add(fields) => to_value(users.add_user(user_from(fields))?),
        UserCommand::Update(args) => {
            let mut user = user_from(args.fields);
            user.id = args.id;
            to_value(users.update_user(user)?)
        }
        UserCommand::Get(arg) => to_value(users.get_user(arg.id)?),
        UserCommand::List => to_value(users.list_users()?),
    }
}

fn run_friend(command: FriendCommand, catalog: &Catalog) -> CliResult {
    let users = &catalog.users;
    match command {
        FriendCommand::Request(pair) => {
            let status = users.request_friendship(pair.user_id, pair.friend_id)?;
            Ok(json!({
                "user_id": pair.user_id,
                "friend_id": pair.friend_id,
                "status": status,
            }))
        }
        FriendCommand::Remove(pair) => {
            users.remove_friendship(pair.user_id, pair.friend_id)?;
            Ok(json!({
                "user_id": pair.user_id,
                "friend_id": pair.friend_id,
                "status": Value::Null,
            }))
        }
        FriendCommand::List(arg) => to_value(users.friends(arg.id)?),
        FriendCommand::Common(args) => to_value(users.common_friends(args.user_id, args.other_id)?),
    }
}

fn run_film(command: FilmCommand, catalog: &Catalog) -> CliResult {
    let films = &catalog.films;
    match command {
        FilmCommand::Add(fields) => to_value(films.add_film(film_from(fields)?)?),
        FilmCommand::Update(args) => {
            let mut film = film_from(args.fields)?;
            film.id = args.id;
            to_value(films.update_film(film)?)
        }
        FilmCommand::Get(arg) => to_value(films.get_film(arg.id)?),
        FilmCommand::List => to_value(films.list_films()?),
        FilmCommand::Like(args) => {
            films.add_like(args.film_id, args.user_id)?;
            like_summary(catalog, args.film_id)
        }
        FilmCommand::Unlike(args) => {
            films.remove_like(args.film_id, args.user_id)?;
            like_summary(catalog, args.film_id)
        }
        FilmCommand::Popular(args) if args.with_likes => {
            to_value(films.popular_ranked(args.count)?)
        }
        FilmCommand::Popular(args) => to_value(films.popular(args.count)?),
    }
}

fn like_summary(catalog: &Catalog, film_id: FilmId) -> CliResult {
    let likers: BTreeSet<UserId> = catalog.films.likers(film_id)?;
    Ok(json!({ "film_id": film_id, "likes": likers }))
}

fn user_from(fields: UserFields) -> User {
    User::new(fields.email, fields.login, fields.name, fields.birthday)
}

fn film_from(fields: FilmFields) -> Result<Film, CliError> {
    let mut film = Film::new(
        fields.name,
        fields.description,
        fields.release_date,
        fields.duration,
    );
    film.mpa = fields
        .mpa
        .map(|id| {
            MpaRating::from_id(id)
                .ok_or_else(|| CliError::InvalidArgument(format!("unknown MPA rating id {id}")))
        })
        .transpose()?;
    film.genres = fields
        .genres
        .into_iter()
        .map(|id| {
            Genre::from_id(id)
                .ok_or_else(|| CliError::InvalidArgument(format!("unknown genre id {id}")))
        })
        .collect::<Result<_, _>>()?;
    Ok(film)
}

fn to_value(value: impl Serialize) -> CliResult {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::{run_command, CliError};
    use crate::cli::Cli;
    use clap::Parser;
    use filmcat_core::Catalog;
    use serde_json::json;

    fn run(catalog: &Catalog, args: &[&str]) -> Result<serde_json::Value, CliError> {
        let cli = Cli::try_parse_from(std::iter::once("filmcat").chain(args.iter().copied()))
            .expect("arguments should parse");
        run_command(cli.command, catalog)
    }

    fn add_user(catalog: &Catalog, login: &str) -> i64 {
        let email = format!("{login}@example.com");
        let user = run(
            catalog,
            &[
                "user", "add", "--email", &email, "--login", login, "--birthday", "1990-05-01",
            ],
        )
        .expect("user should be added");
        user["id"].as_i64().expect("id is an integer")
    }

    #[test]
    fn user_add_fills_display_name_from_login() {
        let catalog = Catalog::in_memory();
        let id = add_user(&catalog, "dolores");
        let user = run(&catalog, &["user", "get", &id.to_string()]).expect("user exists");
        assert_eq!(user["name"], json!("dolores"));
        assert_eq!(user["birthday"], json!("1990-05-01"));
    }

    #[test]
    fn friend_request_reports_confirmation() {
        let catalog = Catalog::in_memory();
        let first = add_user(&catalog, "first").to_string();
        let second = add_user(&catalog, "second").to_string();

        let pending = run(&catalog, &["friend", "request", &first, &second]).expect("request");
        assert_eq!(pending["status"], json!("requested"));
        let confirmed = run(&catalog, &["friend", "request", &second, &first]).expect("request");
        assert_eq!(confirmed["status"], json!("confirmed"));
    }

    #[test]
    fn error_classes_map_to_exit_codes() {
        let catalog = Catalog::in_memory();
        let id = add_user(&catalog, "solo").to_string();

        let missing = run(&catalog, &["user", "get", "999"]).expect_err("missing user");
        assert_eq!(missing.exit_code(), 3);

        let self_request = run(&catalog, &["friend", "request", &id, &id]).expect_err("self");
        assert_eq!(self_request.exit_code(), 2);

        let bad_genre = run(
            &catalog,
            &[
                "film", "add", "--name", "Heat", "--release-date", "1995-12-15",
                "--duration", "170", "--genre", "9",
            ],
        )
        .expect_err("unknown genre");
        assert_eq!(bad_genre.exit_code(), 2);
    }

    #[test]
    fn lookup_tables_list_all_or_resolve_one_id() {
        let catalog = Catalog::in_memory();

        let genres = run(&catalog, &["genres"]).expect("genres");
        assert_eq!(genres.as_array().map(Vec::len), Some(5));
        assert_eq!(
            run(&catalog, &["genres", "2"]).expect("known genre"),
            json!({ "id": 2, "name": "Drama" })
        );
        let rating = run(&catalog, &["mpa", "3"]).expect("known rating");
        assert_eq!(rating, json!({ "id": 3, "name": "PG-13" }));

        for args in [&["genres", "42"][..], &["mpa", "0"][..]] {
            let err = run(&catalog, args).expect_err("unknown lookup id");
            assert_eq!(err.exit_code(), 3, "{args:?}");
            assert_eq!(err.code(), "not_found", "{args:?}");
        }
    }

    #[test]
    fn popular_with_likes_includes_counts() {
        let catalog = Catalog::in_memory();
        let user = add_user(&catalog, "critic").to_string();
        let film = run(
            &catalog,
            &[
                "film", "add", "--name", "Alien", "--release-date", "1979-05-25",
                "--duration", "117", "--mpa", "4", "--genre", "5",
            ],
        )
        .expect("film should be added");
        let film_id = film["id"].as_i64().expect("id").to_string();
        assert_eq!(film["mpa"], json!("R"));

        run(&catalog, &["film", "like", &film_id, &user]).expect("like");
        let popular =
            run(&catalog, &["film", "popular", "--with-likes", "-n", "5"]).expect("popular");
        assert_eq!(popular[0]["likes"], json!(1));
        assert_eq!(popular[0]["name"], json!("Alien"));
    }
}
