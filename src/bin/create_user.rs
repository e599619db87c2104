use std::{error::Error, io, process::exit};

use clap::Parser;

use mandi_ledger::{
    PasswordHash, ValidatedPassword, create_user, initialize_db, open_connection,
};

/// A utility for adding a user to the ledger database.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Connection string for the SQLite database, e.g. `sqlite://ledger.db`.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// The unique name the user logs in with.
    #[arg(long)]
    username: String,

    /// The name shown to the user. Defaults to the username.
    #[arg(long)]
    name: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let username = args.username.trim();
    if username.is_empty() {
        print_error("Username must not be empty.");
        exit(1);
    }
    let name = display_name(args.name.as_deref(), username);

    let connection = open_connection(&args.database_url)?;
    initialize_db(&connection)?;

    println!("Creating user {username}");

    let password_hash = match get_new_password_hash() {
        Some(password_hash) => password_hash,
        None => return Ok(()),
    };

    match create_user(username, name, password_hash, &connection) {
        Ok(user) => {
            println!("Created user {} with ID {}", user.username, user.id);
            Ok(())
        }
        Err(error) => {
            print_error(error);
            exit(1);
        }
    }
}

/// The trimmed `name`, or `username` when no name or a blank one is given.
fn display_name<'a>(name: Option<&'a str>, username: &'a str) -> &'a str {
    name.map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(username)
}

fn get_new_password_hash() -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = prompt_password("Enter a password: ")?;

        if let Err(error) = ValidatedPassword::new(&first_password) {
            print_error(error);
            continue;
        }

        let second_password = prompt_password("Enter the same password again: ")?;

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::from_raw_password(&first_password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => {
                print_error(format!("Could not hash password: {error}. Try again."));
            }
        }
    }
}

/// Read a password from the terminal, returning `None` when input ends or cannot be read.
fn prompt_password(prompt: &str) -> Option<String> {
    match rpassword::prompt_password(prompt) {
        Ok(password) => Some(password),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            None
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
