use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")
}

/// Storage failure, classified so handlers can answer with the right status.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("unique constraint violated")]
    Conflict,

    #[error("foreign key constraint violated")]
    InvalidReference,

    #[error("row not found")]
    NotFound,

    #[error(transparent)]
    Db(sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Conflict,
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepoError::InvalidReference
            }
            _ => RepoError::Db(e),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            RepoError::from(sqlx::Error::RowNotFound),
            RepoError::NotFound
        ));
    }

    #[test]
    fn other_errors_stay_opaque() {
        assert!(matches!(
            RepoError::from(sqlx::Error::PoolTimedOut),
            RepoError::Db(_)
        ));
    }
}
