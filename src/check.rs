use bigdecimal::BigDecimal;
use chrono::Duration;
use diesel::prelude::*;
use serde::Serialize;

use crate::contract::Contract;
use crate::db;
use crate::schema::{checks, contracts, tenants};
use crate::types::{Date, Id};

/// One scheduled rent payment instance derived from a contract
///
/// Checks are created only by the generation run, never edited by hand.
#[derive(Queryable, Identifiable, Associations, PartialEq, Debug, Serialize)]
#[diesel(belongs_to(Contract))]
#[diesel(table_name = checks)]
pub struct Check {
	pub id: Id,
	pub contract_id: Id,
	pub check_no: String,
	pub check_date: Date,
	pub amount: BigDecimal,
}

#[derive(Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = checks)]
pub struct NewCheck {
	pub contract_id: Id,
	pub check_no: String,
	pub check_date: Date,
	pub amount: BigDecimal,
}

/// A check joined with its contract and tenant, as the alert queries return it
#[derive(Queryable, PartialEq, Debug, Serialize)]
pub struct CheckDetail {
	pub check_id: Id,
	pub check_no: String,
	pub check_date: Date,
	pub amount: BigDecimal,
	pub contract_id: Id,
	pub property_name: String,
	pub location: String,
	pub tenant_name: String,
	pub tenant_email: String,
	pub tenant_phone: String,
	pub agent_name: String,
	pub agent_email: String,
}

pub struct Repo {
	db: db::PgPool,
}

impl Repo {
	pub fn new(db: db::PgPool) -> Self {
		Repo { db }
	}

	/// All checks for one contract, due date ascending
	pub fn for_contract(&self, contract_id: Id) -> db::Result<Vec<Check>> {
		let conn = &mut self.db.get()?;
		checks::table
			.filter(checks::contract_id.eq(contract_id))
			.order(checks::check_date.asc())
			.load::<Check>(conn)
			.map_err(Into::into)
	}

	/// Checks with a due date strictly before `today`, oldest first
	pub fn overdue(&self, today: Date) -> db::Result<Vec<CheckDetail>> {
		let conn = &mut self.db.get()?;
		checks::table
			.inner_join(contracts::table.inner_join(tenants::table))
			.filter(checks::check_date.lt(today))
			.select((
				checks::id,
				checks::check_no,
				checks::check_date,
				checks::amount,
				contracts::id,
				contracts::property_name,
				contracts::location,
				tenants::name,
				tenants::email,
				tenants::phone,
				contracts::agent_name,
				contracts::agent_email,
			))
			.order(checks::check_date.asc())
			.load::<CheckDetail>(conn)
			.map_err(Into::into)
	}

	/// Checks due inside the closed window `[today, today + horizon_days]`
	pub fn upcoming(&self, today: Date, horizon_days: i64) -> db::Result<Vec<CheckDetail>> {
		let future = today + Duration::days(horizon_days);
		let conn = &mut self.db.get()?;
		checks::table
			.inner_join(contracts::table.inner_join(tenants::table))
			.filter(checks::check_date.between(today, future))
			.select((
				checks::id,
				checks::check_no,
				checks::check_date,
				checks::amount,
				contracts::id,
				contracts::property_name,
				contracts::location,
				tenants::name,
				tenants::email,
				tenants::phone,
				contracts::agent_name,
				contracts::agent_email,
			))
			.order(checks::check_date.asc())
			.load::<CheckDetail>(conn)
			.map_err(Into::into)
	}

	pub fn count(&self) -> db::Result<i64> {
		let conn = &mut self.db.get()?;
		checks::table
			.count()
			.get_result(conn)
			.map_err(Into::into)
	}

	pub fn overdue_count(&self, today: Date) -> db::Result<i64> {
		let conn = &mut self.db.get()?;
		checks::table
			.filter(checks::check_date.lt(today))
			.count()
			.get_result(conn)
			.map_err(Into::into)
	}

	pub fn upcoming_count(&self, today: Date, horizon_days: i64) -> db::Result<i64> {
		let future = today + Duration::days(horizon_days);
		let conn = &mut self.db.get()?;
		checks::table
			.filter(checks::check_date.between(today, future))
			.count()
			.get_result(conn)
			.map_err(Into::into)
	}
}
