use thiserror::Error;

/// Errors raised by every repository. The three violation variants carry the
/// name of the constraint that rejected the write.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("Uniqueness violation: {0}")]
    UniquenessViolation(String),
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Invalid page: offset {offset}, limit {limit}")]
    InvalidPage { offset: i64, limit: i64 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepoError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> RepoError {
        RepoError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn uniqueness(constraint: &str) -> RepoError {
        RepoError::UniquenessViolation(constraint.to_owned())
    }

    pub fn foreign_key(constraint: &str) -> RepoError {
        RepoError::ForeignKeyViolation(constraint.to_owned())
    }

    pub fn constraint(constraint: &str) -> RepoError {
        RepoError::ConstraintViolation(constraint.to_owned())
    }

    /// Name of the violated constraint, if this is a write rejection.
    pub fn constraint_name(&self) -> Option<&str> {
        match self {
            RepoError::UniquenessViolation(c)
            | RepoError::ForeignKeyViolation(c)
            | RepoError::ConstraintViolation(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_name() {
        let e = RepoError::uniqueness("unique_user_email");
        assert_eq!(e.constraint_name(), Some("unique_user_email"));
        assert_eq!(e.to_string(), "Uniqueness violation: unique_user_email");

        let e = RepoError::not_found("User", "abc");
        assert_eq!(e.constraint_name(), None);
        assert_eq!(e.to_string(), "User abc not found");

        let e = RepoError::InvalidPage {
            offset: -1,
            limit: 10,
        };
        assert_eq!(e.constraint_name(), None);
        assert_eq!(e.to_string(), "Invalid page: offset -1, limit 10");
    }
}
