use crate::constraints::AMOUNT_PRECISION;
use crate::error::RepoError;
use sqlx::error::ErrorKind;

/// SQLSTATE for `numeric_value_out_of_range`.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Classifies a database error raised by a write. Anything that is not an
/// integrity violation becomes `RepoError::Other` with `context` attached.
pub(super) fn map_write_error(e: sqlx::Error, context: String) -> RepoError {
    if let sqlx::Error::Database(db_err) = &e {
        let constraint = db_err.constraint().unwrap_or("unknown").to_owned();
        match db_err.kind() {
            ErrorKind::UniqueViolation => return RepoError::UniquenessViolation(constraint),
            ErrorKind::ForeignKeyViolation => return RepoError::ForeignKeyViolation(constraint),
            ErrorKind::CheckViolation => return RepoError::ConstraintViolation(constraint),
            _ => {}
        }
        if db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) {
            return RepoError::constraint(AMOUNT_PRECISION);
        }
    }
    RepoError::Other(anyhow::Error::new(e).context(context))
}
