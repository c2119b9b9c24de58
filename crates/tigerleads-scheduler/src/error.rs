//! Pass errors.

use thiserror::Error;
use tigerleads_db::DbError;

#[derive(Debug, Error)]
pub enum PassError {
    #[error("{pass} pass failed: {source}")]
    Database {
        pass: &'static str,
        #[source]
        source: DbError,
    },
}

impl PassError {
    pub(crate) fn database(pass: &'static str) -> impl FnOnce(DbError) -> Self {
        move |source| PassError::Database { pass, source }
    }
}
