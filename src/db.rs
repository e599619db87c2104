//! Opening the application database and creating its tables.

use rusqlite::Connection;

use crate::{Error, transaction::create_transaction_table, user::create_user_table};

/// Open the SQLite database named by `database_url`.
///
/// Accepts `sqlite://<path>`, `sqlite:<path>`, `sqlite::memory:` or a plain file path.
///
/// # Errors
/// Returns an [Error::Configuration] if `database_url` is empty, or an
/// [Error::SqlError] if the database cannot be opened.
pub fn open_connection(database_url: &str) -> Result<Connection, Error> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url)
        .trim();

    if path.is_empty() {
        return Err(Error::Configuration(
            "the database connection string is empty".to_owned(),
        ));
    }

    let connection = if path == ":memory:" {
        Connection::open_in_memory()?
    } else {
        Connection::open(path)?
    };

    Ok(connection)
}

/// Create the tables for the domain models and enable foreign key checks.
///
/// # Errors
/// Returns an error if a table cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    create_user_table(connection)?;
    create_transaction_table(connection)?;

    Ok(())
}
