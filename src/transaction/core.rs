//! Defines the core data models and database queries for transactions.
//!
//! Every query is scoped by the owner's [UserID]. A transaction owned by
//! someone else is reported as [Error::NotFound], the same as one that does
//! not exist.

use rusqlite::{Connection, Row, named_params};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    derivation::{DerivationInputs, DerivedFields, derive_checked},
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// An alias for the integer IDs of transactions in the database.
pub type TransactionId = i64;

/// One sale recorded in the ledger.
///
/// The derived fields are computed from the input fields when the transaction
/// is created or updated, and are stored alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the sale happened.
    pub date: Date,
    /// Who the sale was with.
    pub party: String,
    /// The price per 20 units of weight.
    pub rate: f64,
    /// The number of bags sold.
    pub bag: i64,
    /// The weight of the goods including packaging.
    pub gross_weight: f64,
    /// The weight deducted per bag for packaging.
    pub kapat_per_bag: f64,
    /// The total weight deducted for packaging.
    pub kapat: f64,
    /// The gross weight less the packaging.
    pub net_weight: f64,
    /// The value of the net weight at the rate.
    pub net_amount: f64,
    /// The commission charged on the net amount.
    pub commission: f64,
    /// The charge for bags and market handling.
    pub bardan_market: f64,
    /// The weighing charge.
    pub tolai: f64,
    /// The market fee.
    pub market_fee: f64,
    /// The net amount plus all charges.
    pub total: f64,
    /// The user that recorded the transaction.
    pub owner_id: UserID,
    /// When the transaction was first stored.
    #[serde(with = "timestamp_format")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "timestamp_format")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// The input fields of the transaction, without the owner or derived fields.
    pub fn input(&self) -> NewTransaction {
        NewTransaction {
            date: self.date,
            party: self.party.clone(),
            rate: self.rate,
            bag: self.bag,
            gross_weight: self.gross_weight,
            kapat_per_bag: self.kapat_per_bag,
        }
    }

    /// The derived fields as they were stored.
    pub fn derived(&self) -> DerivedFields {
        DerivedFields {
            kapat: self.kapat,
            net_weight: self.net_weight,
            net_amount: self.net_amount,
            commission: self.commission,
            bardan_market: self.bardan_market,
            tolai: self.tolai,
            market_fee: self.market_fee,
            total: self.total,
        }
    }
}

/// The fields a client supplies to record a transaction.
///
/// There is no owner field. The owner always comes from the
/// verified credential.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// When the sale happened.
    pub date: Date,
    /// Who the sale was with.
    pub party: String,
    /// The price per 20 units of weight.
    pub rate: f64,
    /// The number of bags sold.
    pub bag: i64,
    /// The weight of the goods including packaging.
    pub gross_weight: f64,
    /// The weight deducted per bag for packaging.
    pub kapat_per_bag: f64,
}

impl NewTransaction {
    /// The numeric fields needed to compute the derived fields.
    pub fn derivation_inputs(&self) -> DerivationInputs {
        DerivationInputs {
            rate: self.rate,
            bag: self.bag,
            gross_weight: self.gross_weight,
            kapat_per_bag: self.kapat_per_bag,
        }
    }
}

/// Optional filters for listing transactions.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct TransactionQuery {
    /// Only include transactions whose party contains this text, ignoring case.
    pub party: Option<String>,
    /// Only include transactions on this date.
    pub date: Option<Date>,
}

mod timestamp_format {
    //! Serializes a [time::OffsetDateTime] as an RFC 3339 string, e.g. "2024-01-01T09:30:00Z".
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{OffsetDateTime, format_description::well_known::Rfc3339};

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, date, party, rate, bag, gross_weight, kapat_per_bag, \
    kapat, net_weight, net_amount, commission, bardan_market, tolai, market_fee, total, \
    owner_id, created_at, updated_at";

/// Compute the derived fields for `new_transaction` and store it as owned by `owner_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if a derived field overflows,
/// - or [Error::SqlError] if there is some SQL error, e.g. `owner_id` does
///   not refer to a registered user.
pub fn create_transaction(
    owner_id: UserID,
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let derived = derive_checked(&new_transaction.derivation_inputs())?;
    let now = OffsetDateTime::now_utc();

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (date, party, rate, bag, gross_weight, kapat_per_bag,
                kapat, net_weight, net_amount, commission, bardan_market, tolai, market_fee, total,
                owner_id, created_at, updated_at)
             VALUES (:date, :party, :rate, :bag, :gross_weight, :kapat_per_bag,
                :kapat, :net_weight, :net_amount, :commission, :bardan_market, :tolai, :market_fee,
                :total, :owner_id, :now, :now)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            named_params! {
                ":date": new_transaction.date,
                ":party": new_transaction.party,
                ":rate": new_transaction.rate,
                ":bag": new_transaction.bag,
                ":gross_weight": new_transaction.gross_weight,
                ":kapat_per_bag": new_transaction.kapat_per_bag,
                ":kapat": derived.kapat,
                ":net_weight": derived.net_weight,
                ":net_amount": derived.net_amount,
                ":commission": derived.commission,
                ":bardan_market": derived.bardan_market,
                ":tolai": derived.tolai,
                ":market_fee": derived.market_fee,
                ":total": derived.total,
                ":owner_id": owner_id.as_i64(),
                ":now": now,
            },
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve the transaction `id` if it is owned by `owner_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `owner_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE id = :id AND owner_id = :owner_id"
        ))?
        .query_one(
            named_params! { ":id": id, ":owner_id": owner_id.as_i64() },
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get the transactions owned by `owner_id` that match `query`, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn list_transactions(
    owner_id: UserID,
    query: &TransactionQuery,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let party = query
        .party
        .as_deref()
        .map(str::trim)
        .filter(|party| !party.is_empty());

    let mut statement = connection.prepare(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
         WHERE owner_id = :owner_id
            AND (:party IS NULL OR instr(lower(party), lower(:party)) > 0)
            AND (:date IS NULL OR date = :date)
         ORDER BY date DESC, id DESC"
    ))?;

    statement
        .query_map(
            named_params! {
                ":owner_id": owner_id.as_i64(),
                ":party": party,
                ":date": query.date,
            },
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Update the transaction `id` owned by `owner_id`.
///
/// `merge` receives the stored input fields and returns the fields to store.
/// The derived fields are recomputed from the merged fields, and the owner is
/// always written back as `owner_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `owner_id`,
/// - the error returned by `merge`,
/// - [Error::Validation] if a derived field of the merged fields overflows,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction<F>(
    id: TransactionId,
    owner_id: UserID,
    merge: F,
    connection: &Connection,
) -> Result<Transaction, Error>
where
    F: FnOnce(&NewTransaction) -> Result<NewTransaction, Error>,
{
    let existing = get_transaction(id, owner_id, connection)?;
    let merged = merge(&existing.input())?;
    let derived = derive_checked(&merged.derivation_inputs())?;

    if existing.owner_id != owner_id {
        tracing::error!(
            "Transaction {id} is owned by {} but was fetched for {owner_id}",
            existing.owner_id
        );
        return Err(Error::NotFound);
    }

    let transaction = connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET
                date = :date, party = :party, rate = :rate, bag = :bag,
                gross_weight = :gross_weight, kapat_per_bag = :kapat_per_bag,
                kapat = :kapat, net_weight = :net_weight, net_amount = :net_amount,
                commission = :commission, bardan_market = :bardan_market, tolai = :tolai,
                market_fee = :market_fee, total = :total,
                owner_id = :owner_id, updated_at = :updated_at
             WHERE id = :id AND owner_id = :owner_id
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_one(
            named_params! {
                ":id": id,
                ":date": merged.date,
                ":party": merged.party,
                ":rate": merged.rate,
                ":bag": merged.bag,
                ":gross_weight": merged.gross_weight,
                ":kapat_per_bag": merged.kapat_per_bag,
                ":kapat": derived.kapat,
                ":net_weight": derived.net_weight,
                ":net_amount": derived.net_amount,
                ":commission": derived.commission,
                ":bardan_market": derived.bardan_market,
                ":tolai": derived.tolai,
                ":market_fee": derived.market_fee,
                ":total": derived.total,
                ":owner_id": existing.owner_id.as_i64(),
                ":updated_at": OffsetDateTime::now_utc(),
            },
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Delete the transaction `id` if it is owned by `owner_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `owner_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = :id AND owner_id = :owner_id",
        named_params! { ":id": id, ":owner_id": owner_id.as_i64() },
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                party TEXT NOT NULL,
                rate REAL NOT NULL,
                bag INTEGER NOT NULL,
                gross_weight REAL NOT NULL,
                kapat_per_bag REAL NOT NULL,
                kapat REAL NOT NULL,
                net_weight REAL NOT NULL,
                net_amount REAL NOT NULL,
                commission REAL NOT NULL,
                bardan_market REAL NOT NULL,
                tolai REAL NOT NULL,
                market_fee REAL NOT NULL,
                total REAL NOT NULL,
                owner_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(owner_id) REFERENCES user(id) ON DELETE CASCADE
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Listing is always filtered by owner and sorted by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_owner_date ON \"transaction\"(owner_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        party: row.get(2)?,
        rate: row.get(3)?,
        bag: row.get(4)?,
        gross_weight: row.get(5)?,
        kapat_per_bag: row.get(6)?,
        kapat: row.get(7)?,
        net_weight: row.get(8)?,
        net_amount: row.get(9)?,
        commission: row.get(10)?,
        bardan_market: row.get(11)?,
        tolai: row.get(12)?,
        market_fee: row.get(13)?,
        total: row.get(14)?,
        owner_id: UserID::new(row.get(15)?),
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
