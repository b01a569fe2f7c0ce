use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error as ThisError;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum StoreError {
    #[error("invalid connection target: {0}")]
    InvalidTarget(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to connect: {0}")]
    Connection(#[from] diesel::r2d2::PoolError),

    #[error("schema migration failed: {0}")]
    Migration(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("record not found")]
    NotFound,

    #[error("query failed: {0}")]
    Query(DieselError),
}

impl StoreError {
    pub fn is_referential_integrity(&self) -> bool {
        matches!(self, StoreError::ReferentialIntegrity(_))
    }
}

impl From<DieselError> for StoreError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => StoreError::NotFound,
            DieselError::DatabaseError(kind, info) => {
                let message = info.message().to_string();
                match kind {
                    DatabaseErrorKind::ForeignKeyViolation => {
                        StoreError::ReferentialIntegrity(message)
                    }
                    DatabaseErrorKind::UniqueViolation
                    | DatabaseErrorKind::NotNullViolation
                    | DatabaseErrorKind::CheckViolation => StoreError::Constraint(message),
                    // sqlite reports some constraint failures without an extended code
                    _ if message.contains("FOREIGN KEY constraint failed") => {
                        StoreError::ReferentialIntegrity(message)
                    }
                    _ if message.contains("constraint failed") => StoreError::Constraint(message),
                    _ => StoreError::Query(DieselError::DatabaseError(kind, info)),
                }
            }
            other => StoreError::Query(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_its_own_variant() {
        let err = StoreError::from(DieselError::NotFound);
        assert!(matches!(err, StoreError::NotFound));
        assert_eq!(err.to_string(), "record not found");
    }

    #[test]
    fn other_diesel_errors_stay_query_errors() {
        let err = StoreError::from(DieselError::RollbackTransaction);
        assert!(matches!(err, StoreError::Query(_)));
        assert!(!err.is_referential_integrity());
    }

    #[test]
    fn invalid_target_names_the_target() {
        let err = StoreError::InvalidTarget("postgres://db".into());
        assert_eq!(
            err.to_string(),
            "invalid connection target: postgres://db"
        );
    }
}
