//! Error types and result definitions for catalog operations.
//!
//! [`CatalogError`] carries an [`ErrorKind`] used to pick a handling strategy, a static
//! description, optional dynamic detail, an optional source and the callsite location.
//! Several errors can be aggregated into one, which the merge worker pool uses to report
//! every failed worker at once.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::Location;
use std::sync::Arc;

use catalog_postgres::db::{
    is_foreign_key_violation, is_transaction_conflict, is_unique_violation,
};

/// Convenient result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Detailed payload stored for single [`CatalogError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for catalog operations.
#[derive(Debug, Clone)]
pub struct CatalogError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(ErrorPayload),
    Many {
        errors: Vec<CatalogError>,
        location: &'static Location<'static>,
    },
}

/// Categories of errors that can occur while merging or querying the catalog.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Identity Errors
    /// A row with the same natural key was committed by a concurrent unit of work.
    ///
    /// Recoverable: the merge is re-run and the lookup then finds the row.
    UniqueViolation,
    /// The store aborted the unit of work because of a concurrent one, e.g. a deadlock.
    ///
    /// Recoverable like [`ErrorKind::UniqueViolation`].
    TransactionConflict,
    /// Every allowed re-run of a merge lost the race on a natural key.
    ConflictRetriesExhausted,
    /// An entity references a parent that does not exist.
    MissingReference,

    // Storage Errors
    StorageUnavailable,
    StorageQueryFailed,

    // Descriptor & Data Errors
    MalformedDescriptor,
    SerializationError,
    DeserializationError,

    // Configuration & Workflow Errors
    ConfigError,
    InvalidState,
    MergeWorkerPanic,

    // Unknown / Uncategorized
    Unknown,

    /// Raised by an enabled failpoint in tests.
    FailpointTriggered,
}

impl CatalogError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For aggregated errors, returns the kind of the first error or [`ErrorKind::Unknown`]
    /// if the list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error, flattening aggregates.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => errors
                .iter()
                .flat_map(|err| err.kinds())
                .collect::<Vec<_>>(),
        }
    }

    /// Returns `true` when the error is a lost race against a concurrent unit of work.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UniqueViolation | ErrorKind::TransactionConflict
        )
    }

    /// Returns the static description of the error.
    ///
    /// For aggregated errors, returns the description of the first error.
    pub fn description(&self) -> &str {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.description.as_ref(),
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.description())
                .unwrap_or("multiple errors"),
        }
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the captured backtrace for single errors.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.backtrace.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating error and returns the modified instance.
    ///
    /// Has no effect on aggregated errors, which forward their first error as the source.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        CatalogError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }
}

impl PartialEq for CatalogError {
    fn eq(&self, other: &CatalogError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (
                ErrorRepr::Many {
                    errors: errors_a, ..
                },
                ErrorRepr::Many {
                    errors: errors_b, ..
                },
            ) => {
                errors_a.len() == errors_b.len()
                    && errors_a.iter().zip(errors_b.iter()).all(|(a, b)| a == b)
            }
            _ => false,
        }
    }
}

impl Hash for CatalogError {
    /// Hashes only the kind and static description so that occurrences of the same
    /// failure group together regardless of location or detail.
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.repr).hash(state);
        match &self.repr {
            ErrorRepr::Single(payload) => {
                payload.kind.hash(state);
                payload.description.hash(state);
            }
            ErrorRepr::Many { errors, .. } => {
                errors.len().hash(state);
                for error in errors {
                    error.hash(state);
                }
            }
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                write_detail(payload.detail.as_deref(), f, 1)?;
                write_backtrace(payload.backtrace.as_ref(), f, 1)
            }
            ErrorRepr::Many { errors, location } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}:{}",
                    count,
                    if count == 1 { "" } else { "s" },
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                if errors.is_empty() {
                    return write!(f, "\n  (no inner errors provided)");
                }

                for (index, error) in errors.iter().enumerate() {
                    let rendered = format!("{error}");
                    let mut lines = rendered.lines();
                    match lines.next() {
                        Some(first_line) => write!(f, "\n  {}. {}", index + 1, first_line)?,
                        None => write!(f, "\n  {}.", index + 1)?,
                    }

                    for line in lines {
                        if line.is_empty() {
                            write!(f, "\n     ")?;
                        } else {
                            write!(f, "\n     {line}")?;
                        }
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source.as_ref() as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Writes the captured backtrace with indentation.
fn write_backtrace(
    backtrace: &Backtrace,
    f: &mut fmt::Formatter<'_>,
    indent: usize,
) -> fmt::Result {
    let indent_str = "  ".repeat(indent);

    let rendered_backtrace = format!("{backtrace}");
    if !rendered_backtrace.trim().is_empty() {
        write!(f, "\n{indent_str}Backtrace:")?;
        for line in rendered_backtrace.lines() {
            if line.trim().is_empty() {
                write!(f, "\n{indent_str}  ")?;
            } else {
                write!(f, "\n{indent_str}  {line}")?;
            }
        }
    }

    Ok(())
}

/// Writes the detail block with indentation.
fn write_detail(detail: Option<&str>, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    let Some(detail) = detail else {
        return Ok(());
    };

    let indent_str = "  ".repeat(indent);
    if detail.trim().is_empty() {
        return write!(f, "\n{indent_str}Detail: <empty>");
    }

    write!(f, "\n{indent_str}Detail:")?;
    for line in detail.lines() {
        if line.trim().is_empty() {
            write!(f, "\n{indent_str}  ")?;
        } else {
            write!(f, "\n{indent_str}  {line}")?;
        }
    }

    Ok(())
}

/// Creates a [`CatalogError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for CatalogError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> CatalogError {
        CatalogError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`CatalogError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for CatalogError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> CatalogError {
        CatalogError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Aggregates several errors into one.
///
/// A vector with exactly one error yields that error unchanged.
impl<E> From<Vec<E>> for CatalogError
where
    E: Into<CatalogError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> CatalogError {
        let location = Location::caller();

        let mut errors: Vec<CatalogError> = errors.into_iter().map(Into::into).collect();
        if errors.len() == 1 {
            if let Some(error) = errors.pop() {
                return error;
            }
        }

        CatalogError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

/// Converts [`std::io::Error`] to [`CatalogError`] with [`ErrorKind::StorageUnavailable`].
impl From<std::io::Error> for CatalogError {
    #[track_caller]
    fn from(err: std::io::Error) -> CatalogError {
        let detail = err.to_string();
        CatalogError::from_components(
            ErrorKind::StorageUnavailable,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`serde_json::Error`] to [`CatalogError`].
///
/// Maps to [`ErrorKind::DeserializationError`] for syntax, data and EOF failures and to
/// [`ErrorKind::SerializationError`] otherwise.
impl From<serde_json::Error> for CatalogError {
    #[track_caller]
    fn from(err: serde_json::Error) -> CatalogError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => {
                (ErrorKind::SerializationError, "JSON serialization failed")
            }
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        let detail = err.to_string();
        CatalogError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`sqlx::Error`] to [`CatalogError`].
///
/// Unique violations become [`ErrorKind::UniqueViolation`] and deadlocks or serialization
/// failures [`ErrorKind::TransactionConflict`], so that the merge can be re-run. Foreign key
/// violations become [`ErrorKind::MissingReference`], connection and pool
/// failures become [`ErrorKind::StorageUnavailable`] and everything else
/// [`ErrorKind::StorageQueryFailed`].
impl From<sqlx::Error> for CatalogError {
    #[track_caller]
    fn from(err: sqlx::Error) -> CatalogError {
        let (kind, description) = match &err {
            err if is_unique_violation(err) => (
                ErrorKind::UniqueViolation,
                "Natural key was inserted concurrently",
            ),
            err if is_transaction_conflict(err) => (
                ErrorKind::TransactionConflict,
                "Unit of work was aborted by a concurrent one",
            ),
            err if is_foreign_key_violation(err) => (
                ErrorKind::MissingReference,
                "Referenced catalog entity does not exist",
            ),
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::WorkerCrashed => (
                ErrorKind::StorageUnavailable,
                "Catalog storage is unavailable",
            ),
            _ => (ErrorKind::StorageQueryFailed, "Catalog query failed"),
        };

        let detail = err.to_string();
        CatalogError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_error;

    #[test]
    fn aggregated_error_reports_all_kinds() {
        let err: CatalogError = vec![
            catalog_error!(ErrorKind::MergeWorkerPanic, "Worker panicked"),
            catalog_error!(ErrorKind::StorageUnavailable, "Storage down"),
        ]
        .into();

        assert_eq!(err.kind(), ErrorKind::MergeWorkerPanic);
        assert_eq!(
            err.kinds(),
            vec![ErrorKind::MergeWorkerPanic, ErrorKind::StorageUnavailable]
        );
        assert!(err.to_string().starts_with("[Many] 2 errors aggregated"));
    }

    #[test]
    fn single_element_vector_is_unwrapped() {
        let err: CatalogError =
            vec![catalog_error!(ErrorKind::UniqueViolation, "Duplicate key")].into();

        assert!(err.is_conflict());
        assert!(err.backtrace().is_some());
    }

    #[test]
    fn detail_is_rendered() {
        let err = catalog_error!(
            ErrorKind::MalformedDescriptor,
            "Platform descriptor has no bom coordinate",
            "platform=unknown"
        );

        assert_eq!(err.detail(), Some("platform=unknown"));
        assert!(err.to_string().contains("Detail:"));
        assert!(err.to_string().contains("platform=unknown"));
    }

    #[test]
    fn pool_timeout_is_storage_unavailable() {
        let err: CatalogError = sqlx::Error::PoolTimedOut.into();

        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
        assert!(!err.is_conflict());
    }

    #[test]
    fn row_not_found_is_query_failure() {
        let err: CatalogError = sqlx::Error::RowNotFound.into();

        assert_eq!(err.kind(), ErrorKind::StorageQueryFailed);
    }

    #[derive(Debug)]
    struct PgError {
        code: &'static str,
    }

    impl fmt::Display for PgError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "database error {}", self.code)
        }
    }

    impl error::Error for PgError {}

    impl sqlx::error::DatabaseError for PgError {
        fn message(&self) -> &str {
            self.code
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            match self.code {
                "23505" => sqlx::error::ErrorKind::UniqueViolation,
                "23503" => sqlx::error::ErrorKind::ForeignKeyViolation,
                _ => sqlx::error::ErrorKind::Other,
            }
        }
    }

    fn database_error(code: &'static str) -> CatalogError {
        sqlx::Error::Database(Box::new(PgError { code })).into()
    }

    #[test]
    fn deadlock_and_serialization_failure_are_conflicts() {
        for code in ["40P01", "40001"] {
            let err = database_error(code);

            assert_eq!(err.kind(), ErrorKind::TransactionConflict);
            assert!(err.is_conflict());
        }
    }

    #[test]
    fn unique_violation_is_a_conflict() {
        let err = database_error("23505");

        assert_eq!(err.kind(), ErrorKind::UniqueViolation);
        assert!(err.is_conflict());
    }

    #[test]
    fn foreign_key_violation_is_missing_reference() {
        let err = database_error("23503");

        assert_eq!(err.kind(), ErrorKind::MissingReference);
        assert!(!err.is_conflict());
    }

    #[test]
    fn other_database_errors_are_query_failures() {
        let err = database_error("42P01");

        assert_eq!(err.kind(), ErrorKind::StorageQueryFailed);
        assert!(!err.is_conflict());
    }
}
