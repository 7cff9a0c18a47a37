use diesel::prelude::*;
use diesel::PgConnection;
use log::{debug, info};
use serde::Serialize;

use crate::check::{self, Check, CheckDetail, NewCheck};
use crate::contract::{self, Contract, ContractDetail};
use crate::db;
use crate::error::{Error, Kind, Result};
use crate::schema::{checks, contracts};
use crate::types::{Date, Id};

/// Source of "today" for every temporal query, swappable in tests
pub trait Calendar {
	fn current_date(&self) -> Date {
		chrono::Utc::now().date_naive()
	}
}

pub struct SystemCalendar;

impl Calendar for SystemCalendar {}

/// Aggregate result of one generation run
#[derive(PartialEq, Debug, Serialize)]
pub struct RunStats {
	pub total_contracts: usize,
	pub checks_generated: usize,
	pub checks_skipped: usize,
}

/// The storage surface the generation loop is written against
///
/// The Postgres connection implements it directly; tests substitute an
/// in-memory store. Callers of the loop cannot tell which is active.
pub trait ScheduleStore {
	fn count_for_contract(&mut self, contract_id: Id) -> db::Result<i64>;
	fn check_exists(&mut self, check_no: &str) -> db::Result<bool>;
	fn insert_check(&mut self, check: NewCheck) -> db::Result<()>;
}

impl ScheduleStore for PgConnection {
	fn count_for_contract(&mut self, contract_id: Id) -> db::Result<i64> {
		checks::table
			.filter(checks::contract_id.eq(contract_id))
			.count()
			.get_result(self)
			.map_err(Into::into)
	}

	fn check_exists(&mut self, check_no: &str) -> db::Result<bool> {
		diesel::select(diesel::dsl::exists(
			checks::table.filter(checks::check_no.eq(check_no)),
		))
		.get_result(self)
		.map_err(Into::into)
	}

	fn insert_check(&mut self, check: NewCheck) -> db::Result<()> {
		// Nested transaction = savepoint: a duplicate key raced in by a
		// concurrent run surfaces as RecordAlreadyExists without aborting
		// the rest of the batch.
		self.transaction(|conn| {
			diesel::insert_into(checks::table)
				.values(&check)
				.execute(conn)
		})
		.map(|_| ())
		.map_err(Into::into)
	}
}

/// Derive and persist the payment schedule for every contract
///
/// A contract whose persisted check count already reaches its declared
/// `num_checks` is treated as fully scheduled and every existing check is
/// counted as skipped. That also holds when `num_checks` was reduced after
/// a partial run: the contract is never topped up or trimmed.
///
/// Invoking this twice on an unchanged contract set is idempotent; the
/// second run generates nothing.
pub fn generate_schedules<S: ScheduleStore>(contracts: &[Contract], store: &mut S) -> Result<RunStats> {
	let mut stats = RunStats {
		total_contracts: contracts.len(),
		checks_generated: 0,
		checks_skipped: 0,
	};

	for contract in contracts {
		let existing = store.count_for_contract(contract.id)?;
		if existing >= i64::from(contract.num_checks) {
			stats.checks_skipped += existing as usize;
			debug!("contract {} already has {} checks, skipping", contract.id, existing);
			continue;
		}

		for new_check in contract.schedule() {
			if store.check_exists(&new_check.check_no)? {
				stats.checks_skipped += 1;
				continue;
			}

			match store.insert_check(new_check) {
				Ok(()) => stats.checks_generated += 1,
				Err(db::Error::RecordAlreadyExists) => stats.checks_skipped += 1,
				Err(e) => return Err(e.into()),
			}
		}
	}

	Ok(stats)
}

/// An overdue check annotated with how far past due it is
#[derive(Debug, Serialize)]
pub struct OverdueCheck {
	#[serde(flatten)]
	pub check: CheckDetail,
	pub days_overdue: i64,
}

/// A check due within the queried horizon
#[derive(Debug, Serialize)]
pub struct UpcomingCheck {
	#[serde(flatten)]
	pub check: CheckDetail,
	pub days_until_due: i64,
}

/// A contract whose expiry falls within the queried horizon
#[derive(Debug, Serialize)]
pub struct ExpiringContract {
	#[serde(flatten)]
	pub contract: ContractDetail,
	pub days_until_expiry: i64,
}

/// One contract with its full schedule attached
#[derive(Debug, Serialize)]
pub struct ContractSummary {
	#[serde(flatten)]
	pub contract: ContractDetail,
	pub checks: Vec<Check>,
	pub total_checks_count: usize,
}

/// Service for schedule generation and the temporal alert queries
pub struct Service<'a> {
	db: db::PgPool,
	contract_repo: &'a contract::Repo,
	check_repo: &'a check::Repo,
	calendar: &'a dyn Calendar,
}

/// Parameter object for creating a new Service
pub struct NewService<'a> {
	pub db: db::PgPool,
	pub contract_repo: &'a contract::Repo,
	pub check_repo: &'a check::Repo,
	pub calendar: &'a dyn Calendar,
}

impl<'a> Service<'a> {
	pub fn new(v: NewService<'a>) -> Self {
		Service {
			db: v.db,
			contract_repo: v.contract_repo,
			check_repo: v.check_repo,
			calendar: v.calendar,
		}
	}

	/// Run schedule generation across all persisted contracts
	///
	/// The whole run is one storage transaction: any unrecoverable failure
	/// rolls back every insert made so far and propagates.
	pub fn generate_checks(&self) -> Result<RunStats> {
		let conn = &mut self.db.get()?;
		let stats = conn.transaction::<RunStats, Error, _>(|conn| {
			let all = contracts::table
				.order(contracts::id.asc())
				.load::<Contract>(conn)?;
			generate_schedules(&all, &mut **conn)
		})?;

		info!(
			"check generation complete: {} contracts, {} generated, {} skipped",
			stats.total_contracts, stats.checks_generated, stats.checks_skipped
		);
		Ok(stats)
	}

	/// All contracts joined with tenant data
	pub fn contracts(&self) -> Result<Vec<ContractDetail>> {
		let all = self.contract_repo.list_with_tenants()?;
		info!("fetched {} contracts", all.len());
		Ok(all)
	}

	/// Every check whose due date has passed, most overdue first
	pub fn overdue_checks(&self) -> Result<Vec<OverdueCheck>> {
		let today = self.calendar.current_date();
		let rows = self.check_repo.overdue(today)?;
		info!("found {} overdue checks", rows.len());

		Ok(rows
			.into_iter()
			.map(|check| {
				let days_overdue = (today - check.check_date).num_days();
				OverdueCheck { check, days_overdue }
			})
			.collect())
	}

	/// Checks due within the next `days` days
	pub fn upcoming_checks(&self, days: i64) -> Result<Vec<UpcomingCheck>> {
		validate_horizon(days)?;
		let today = self.calendar.current_date();
		let rows = self.check_repo.upcoming(today, days)?;
		info!("found {} checks due within {} days", rows.len(), days);

		Ok(rows
			.into_iter()
			.map(|check| {
				let days_until_due = (check.check_date - today).num_days();
				UpcomingCheck { check, days_until_due }
			})
			.collect())
	}

	/// Contracts expiring within the next `days` days
	pub fn expiring_contracts(&self, days: i64) -> Result<Vec<ExpiringContract>> {
		validate_horizon(days)?;
		let today = self.calendar.current_date();
		let rows = self.contract_repo.expiring_within(today, days)?;
		info!("found {} contracts expiring within {} days", rows.len(), days);

		Ok(rows
			.into_iter()
			.map(|contract| {
				let days_until_expiry = (contract.expiry_date - today).num_days();
				ExpiringContract { contract, days_until_expiry }
			})
			.collect())
	}

	/// One contract with tenant data and its full schedule
	///
	/// Absence is a normal outcome, reported as `None`.
	pub fn contract_summary(&self, id: Id) -> Result<Option<ContractSummary>> {
		let detail = match self.contract_repo.find_with_tenant(id) {
			Ok(v) => v,
			Err(db::Error::RecordNotFound) => return Ok(None),
			Err(e) => return Err(e.into()),
		};

		let checks = self.check_repo.for_contract(id)?;
		info!("retrieved contract {} with {} checks", id, checks.len());

		Ok(Some(ContractSummary {
			contract: detail,
			total_checks_count: checks.len(),
			checks,
		}))
	}
}

/// Horizons are rejected before any storage access is attempted
fn validate_horizon(days: i64) -> Result<()> {
	if !(1..=365).contains(&days) {
		return Err(Error::new(Kind::InvalidHorizon(days)));
	}
	Ok(())
}
