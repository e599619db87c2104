//! Transaction management for the ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the owner-scoped database functions
//! - Parsing and validation of request bodies
//! - Route handlers for creating, reading, updating, deleting and previewing transactions

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;
mod payload;
mod preview_endpoint;

pub use core::{
    NewTransaction, Transaction, TransactionId, TransactionQuery, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, list_transactions,
    update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use list_endpoint::{get_transaction_endpoint, list_transactions_endpoint};
pub use payload::TransactionPayload;
pub use preview_endpoint::preview_transaction_endpoint;
