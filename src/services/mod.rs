pub mod catalog;
pub mod crud;
pub mod ledgers;
pub mod products;
pub mod proformas;
pub mod purchases;
pub mod revenue;
pub mod sales;
pub mod stock;

use sea_orm::TransactionError;

use crate::errors::ServiceError;

/// Flattens the two layers of `db.transaction` errors back into the service
/// error that aborted the transaction.
pub(crate) fn unwrap_txn_err(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}
