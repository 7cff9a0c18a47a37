use std::error;
use std::fmt;

use diesel::r2d2::PoolError;

use crate::db;

pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur when running agent operations
#[derive(Debug, PartialEq)]
pub struct Error {
	kind: Kind,
}

impl Error {
	pub fn new(kind: Kind) -> Error {
		Error { kind }
	}

	pub fn kind(&self) -> &Kind {
		&self.kind
	}
}

/// The kind of an error that can occur.
#[derive(Debug, PartialEq)]
pub enum Kind {
	Database(db::Error),
	/// Forward-looking query window outside the accepted 1-365 day range
	InvalidHorizon(i64),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match &self.kind {
			Kind::Database(e) => write!(f, "db error: {}", e),
			Kind::InvalidHorizon(days) => {
				write!(f, "horizon must be between 1 and 365 days, got {}", days)
			}
		}
	}
}

impl error::Error for Error {}

impl From<db::Error> for Error {
	fn from(e: db::Error) -> Self {
		Error::new(Kind::Database(e))
	}
}

impl From<PoolError> for Error {
	fn from(e: PoolError) -> Self {
		Error::new(Kind::Database(db::Error::from(e)))
	}
}

impl From<diesel::result::Error> for Error {
	fn from(e: diesel::result::Error) -> Self {
		Error::new(Kind::Database(db::Error::from(e)))
	}
}
