use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "filmcat",
    about = "Film catalog with friendships, likes and popularity ranking",
    version = filmcat_core::core_version()
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Print compact single-line JSON
    #[arg(long, global = true)]
    pub compact: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage users
    #[command(subcommand)]
    User(UserCommand),
    /// Manage friendships between users
    #[command(subcommand)]
    Friend(FriendCommand),
    /// Manage films, likes and popularity
    #[command(subcommand)]
    Film(FilmCommand),
    /// List the genre lookup table, or show one genre
    Genres(LookupArgs),
    /// List the MPA rating lookup table, or show one rating
    Mpa(LookupArgs),
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a new user
    Add(UserFields),
    /// Replace an existing user
    Update(UserUpdateArgs),
    /// Show one user
    Get(IdArg),
    /// List every user
    List,
}

#[derive(Args)]
pub struct UserFields {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub login: String,
    /// Display name; the login is used when blank
    #[arg(long, default_value = "")]
    pub name: String,
    /// Birth date as YYYY-MM-DD
    #[arg(long)]
    pub birthday: NaiveDate,
}

#[derive(Args)]
pub struct UserUpdateArgs {
    #[arg(long)]
    pub id: i64,
    #[command(flatten)]
    pub fields: UserFields,
}

#[derive(Subcommand)]
pub enum FriendCommand {
    /// Ask another user for friendship
    Request(PairArgs),
    /// Withdraw a friendship or pending request
    Remove(PairArgs),
    /// List users a user has a relationship with
    List(IdArg),
    /// List confirmed friends two users share
    Common(CommonArgs),
}

#[derive(Args)]
pub struct PairArgs {
    /// Acting user
    pub user_id: i64,
    /// Other user
    pub friend_id: i64,
}

#[derive(Args)]
pub struct CommonArgs {
    pub user_id: i64,
    pub other_id: i64,
}

#[derive(Subcommand)]
pub enum FilmCommand {
    /// Add a new film
    Add(FilmFields),
    /// Replace an existing film
    Update(FilmUpdateArgs),
    /// Show one film
    Get(IdArg),
    /// List every film
    List,
    /// Record that a user likes a film
    Like(LikeArgs),
    /// Withdraw a like
    Unlike(LikeArgs),
    /// Show the most liked films
    Popular(PopularArgs),
}

#[derive(Args)]
pub struct FilmFields {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Release date as YYYY-MM-DD
    #[arg(long)]
    pub release_date: NaiveDate,
    /// Duration in minutes
    #[arg(long, allow_negative_numbers = true)]
    pub duration: i64,
    /// MPA rating id (see `filmcat mpa`)
    #[arg(long)]
    pub mpa: Option<i64>,
    /// Genre id, repeatable (see `filmcat genres`)
    #[arg(long = "genre")]
    pub genres: Vec<i64>,
}

#[derive(Args)]
pub struct FilmUpdateArgs {
    #[arg(long)]
    pub id: i64,
    #[command(flatten)]
    pub fields: FilmFields,
}

#[derive(Args)]
pub struct LikeArgs {
    pub film_id: i64,
    pub user_id: i64,
}

#[derive(Args)]
pub struct PopularArgs {
    /// Number of films to return
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub count: Option<i64>,
    /// Include like counts in the output
    #[arg(long)]
    pub with_likes: bool,
}

#[derive(Args)]
pub struct LookupArgs {
    /// Lookup id; lists every entry when omitted
    pub id: Option<i64>,
}

#[derive(Args)]
pub struct IdArg {
    pub id: i64,
}
