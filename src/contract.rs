use std::io::Write;
use std::ops::Div;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::Duration;
use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Varchar;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::check::NewCheck;
use crate::db;
use crate::schema::{contracts, tenants};
use crate::tenant::Tenant;
use crate::types::{Date, Id};

/// A tenancy agreement between a tenant and a managed property
///
/// Contracts are immutable once created: expiry is a derived temporal
/// state, never a stored flag.
#[derive(Queryable, Identifiable, Associations, PartialEq, Debug, Serialize)]
#[diesel(belongs_to(Tenant))]
#[diesel(table_name = contracts)]
pub struct Contract {
	pub id: Id,
	pub tenant_id: Id,
	pub property_name: String,
	pub location: String,
	pub start_date: Date,
	pub expiry_date: Date,
	pub annual_rent: BigDecimal,
	pub num_checks: i16,
	pub payment_method: PaymentMethod,
	pub agent_name: String,
	pub agent_email: String,
}

impl Contract {
	/// Amount of every check on the schedule: `annual_rent / num_checks`,
	/// rounded to currency scale with decimal division.
	///
	/// The rounding remainder is not redistributed across checks, so the
	/// schedule total may drift from `annual_rent` by up to
	/// `num_checks - 1` cents.
	pub fn check_amount(&self) -> BigDecimal {
		(&self.annual_rent)
			.div(BigDecimal::from(self.num_checks as i64))
			.round(2)
	}

	/// Real-valued days between consecutive checks
	pub fn interval_days(&self) -> f64 {
		let total_days = (self.expiry_date - self.start_date).num_days();
		total_days as f64 / f64::from(self.num_checks)
	}

	/// Derive the full payment schedule for this contract
	///
	/// Due dates are spread by a straight linear day-interval division,
	/// not by calendar months: check `i` falls on
	/// `start_date + floor(interval * i)` days, so the last check lands
	/// strictly before `expiry_date`.
	pub fn schedule(&self) -> Vec<NewCheck> {
		let amount = self.check_amount();
		let interval = self.interval_days();

		(0..self.num_checks)
			.map(|i| NewCheck {
				contract_id: self.id,
				check_no: check_no(self.id, i + 1),
				check_date: self.start_date + Duration::days((interval * f64::from(i)) as i64),
				amount: amount.clone(),
			})
			.collect()
	}

	pub fn is_active(&self, today: Date) -> bool {
		self.expiry_date >= today
	}
}

/// Deterministic, globally unique check identifier: contract id zero-padded
/// to three digits, position within the schedule to two.
pub fn check_no(contract_id: Id, position: i16) -> String {
	format!("CHK{:03}{:02}", contract_id, position)
}

#[derive(Insertable)]
#[diesel(table_name = contracts)]
pub struct NewContract<'a> {
	pub tenant_id: Id,
	pub property_name: &'a str,
	pub location: &'a str,
	pub start_date: Date,
	pub expiry_date: Date,
	pub annual_rent: BigDecimal,
	pub num_checks: i16,
	pub payment_method: PaymentMethod,
	pub agent_name: &'a str,
	pub agent_email: &'a str,
}

#[derive(AsExpression, FromSqlRow, Eq, PartialEq, EnumString, Display, Debug, Serialize, Deserialize)]
#[diesel(sql_type = Varchar)]
pub enum PaymentMethod {
	#[strum(serialize = "Bank Transfer")]
	#[serde(rename = "Bank Transfer")]
	BankTransfer,
	Cheque,
	Cash,
}

impl ToSql<Varchar, Pg> for PaymentMethod {
	fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
		out.write_all(self.to_string().as_bytes())?;
		Ok(IsNull::No)
	}
}

impl FromSql<Varchar, Pg> for PaymentMethod {
	fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
		let s = std::str::from_utf8(bytes.as_bytes())?;
		PaymentMethod::from_str(s)
			.map_err(|_| format!("invalid payment method: {}", s).into())
	}
}

/// A contract row joined with its tenant, the shape every read path returns
#[derive(Queryable, PartialEq, Debug, Serialize)]
pub struct ContractDetail {
	pub contract_id: Id,
	pub tenant_id: Id,
	pub property_name: String,
	pub location: String,
	pub start_date: Date,
	pub expiry_date: Date,
	pub annual_rent: BigDecimal,
	pub num_checks: i16,
	pub payment_method: PaymentMethod,
	pub agent_name: String,
	pub agent_email: String,
	pub tenant_name: String,
	pub tenant_email: String,
	pub tenant_phone: String,
}

pub struct Repo {
	db: db::PgPool,
}

impl Repo {
	pub fn new(db: db::PgPool) -> Self {
		Repo { db }
	}

	pub fn create(&self, new_contract: NewContract) -> db::Result<Contract> {
		let conn = &mut self.db.get()?;
		diesel::insert_into(contracts::table)
			.values(&new_contract)
			.get_result(conn)
			.map_err(Into::into)
	}

	/// All contracts joined with tenant data, newest start date first
	pub fn list_with_tenants(&self) -> db::Result<Vec<ContractDetail>> {
		let conn = &mut self.db.get()?;
		contracts::table
			.inner_join(tenants::table)
			.select((
				contracts::id,
				contracts::tenant_id,
				contracts::property_name,
				contracts::location,
				contracts::start_date,
				contracts::expiry_date,
				contracts::annual_rent,
				contracts::num_checks,
				contracts::payment_method,
				contracts::agent_name,
				contracts::agent_email,
				tenants::name,
				tenants::email,
				tenants::phone,
			))
			.order(contracts::start_date.desc())
			.load::<ContractDetail>(conn)
			.map_err(Into::into)
	}

	pub fn find_with_tenant(&self, id: Id) -> db::Result<ContractDetail> {
		let conn = &mut self.db.get()?;
		contracts::table
			.inner_join(tenants::table)
			.filter(contracts::id.eq(id))
			.select((
				contracts::id,
				contracts::tenant_id,
				contracts::property_name,
				contracts::location,
				contracts::start_date,
				contracts::expiry_date,
				contracts::annual_rent,
				contracts::num_checks,
				contracts::payment_method,
				contracts::agent_name,
				contracts::agent_email,
				tenants::name,
				tenants::email,
				tenants::phone,
			))
			.first::<ContractDetail>(conn)
			.map_err(Into::into)
	}

	pub fn find_by_tenant(&self, tenant_id: Id) -> db::Result<Vec<Contract>> {
		let conn = &mut self.db.get()?;
		contracts::table
			.filter(contracts::tenant_id.eq(tenant_id))
			.order(contracts::start_date.desc())
			.load::<Contract>(conn)
			.map_err(Into::into)
	}

	/// Contracts with an expiry date inside `[today, today + horizon_days]`,
	/// soonest expiry first
	pub fn expiring_within(&self, today: Date, horizon_days: i64) -> db::Result<Vec<ContractDetail>> {
		let threshold = today + Duration::days(horizon_days);
		let conn = &mut self.db.get()?;
		contracts::table
			.inner_join(tenants::table)
			.filter(contracts::expiry_date.between(today, threshold))
			.select((
				contracts::id,
				contracts::tenant_id,
				contracts::property_name,
				contracts::location,
				contracts::start_date,
				contracts::expiry_date,
				contracts::annual_rent,
				contracts::num_checks,
				contracts::payment_method,
				contracts::agent_name,
				contracts::agent_email,
				tenants::name,
				tenants::email,
				tenants::phone,
			))
			.order(contracts::expiry_date.asc())
			.load::<ContractDetail>(conn)
			.map_err(Into::into)
	}

	pub fn count(&self) -> db::Result<i64> {
		let conn = &mut self.db.get()?;
		contracts::table
			.count()
			.get_result(conn)
			.map_err(Into::into)
	}

	pub fn active_count(&self, today: Date) -> db::Result<i64> {
		let conn = &mut self.db.get()?;
		contracts::table
			.filter(contracts::expiry_date.ge(today))
			.count()
			.get_result(conn)
			.map_err(Into::into)
	}

	pub fn expired_count(&self, today: Date) -> db::Result<i64> {
		let conn = &mut self.db.get()?;
		contracts::table
			.filter(contracts::expiry_date.lt(today))
			.count()
			.get_result(conn)
			.map_err(Into::into)
	}

	pub fn expiring_count(&self, today: Date, horizon_days: i64) -> db::Result<i64> {
		let threshold = today + Duration::days(horizon_days);
		let conn = &mut self.db.get()?;
		contracts::table
			.filter(contracts::expiry_date.between(today, threshold))
			.count()
			.get_result(conn)
			.map_err(Into::into)
	}
}
