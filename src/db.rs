use std::fmt;

use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use diesel::result::DatabaseErrorKind::UniqueViolation;
use diesel::result::Error::{DatabaseError, NotFound};
use diesel::PgConnection;

pub type Result<T> = std::result::Result<T, Error>;
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Build a pooled connection to the underlying PostgreSQL database
pub fn pg_connection(database_url: &str) -> Result<PgPool> {
	let manager = ConnectionManager::<PgConnection>::new(database_url);
	Pool::builder()
		.build(manager)
		.map_err(|e| Error::Connection(e.to_string()))
}

/// Error that can occur when querying against the database
#[derive(Debug, PartialEq)]
pub enum Error {
	RecordAlreadyExists,
	RecordNotFound,
	Connection(String),
	/// Catch-all for the remaining diesel failures
	DatabaseError(diesel::result::Error),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::RecordAlreadyExists => write!(f, "record violates a unique constraint"),
			Error::RecordNotFound => write!(f, "record does not exist"),
			Error::Connection(e) => write!(f, "opening database connection: {}", e),
			Error::DatabaseError(e) => write!(f, "database error: {:?}", e),
		}
	}
}

impl std::error::Error for Error {}

impl From<diesel::result::Error> for Error {
	fn from(e: diesel::result::Error) -> Self {
		match e {
			DatabaseError(UniqueViolation, _) => Error::RecordAlreadyExists,
			NotFound => Error::RecordNotFound,

			_ => Error::DatabaseError(e),
		}
	}
}

impl From<PoolError> for Error {
	fn from(e: PoolError) -> Self {
		Error::Connection(e.to_string())
	}
}
