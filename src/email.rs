use serde::Serialize;

pub mod expiry;
pub mod overdue;
pub mod sender;
pub mod templates;
pub mod upcoming;

pub use sender::Mailer;

/// Outcome of one notification batch; a failed recipient never aborts the rest
#[derive(PartialEq, Debug, Serialize)]
pub struct SendStats {
	pub total: usize,
	pub success: usize,
	pub failed: usize,
}
