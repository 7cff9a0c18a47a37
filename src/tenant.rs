use diesel::prelude::*;
use serde::Serialize;

use crate::db;
use crate::schema::tenants;
use crate::types::Id;

#[derive(Queryable, Identifiable, PartialEq, Debug, Serialize)]
pub struct Tenant {
	pub id: Id,
	pub name: String,
	pub email: String,
	pub phone: String,
}

#[derive(Insertable)]
#[diesel(table_name = tenants)]
pub struct NewTenant<'a> {
	pub name: &'a str,
	pub email: &'a str,
	pub phone: &'a str,
}

pub struct Repo {
	db: db::PgPool,
}

impl Repo {
	pub fn new(db: db::PgPool) -> Self {
		Repo { db }
	}

	pub fn create(&self, new_tenant: NewTenant) -> db::Result<Tenant> {
		let conn = &mut self.db.get()?;
		diesel::insert_into(tenants::table)
			.values(&new_tenant)
			.get_result(conn)
			.map_err(Into::into)
	}

	pub fn find_by_id(&self, id: Id) -> db::Result<Tenant> {
		let conn = &mut self.db.get()?;
		tenants::table
			.find(id)
			.first::<Tenant>(conn)
			.map_err(Into::into)
	}

	pub fn find_by_email(&self, email: &str) -> db::Result<Tenant> {
		let conn = &mut self.db.get()?;
		tenants::table
			.filter(tenants::email.eq(email))
			.first::<Tenant>(conn)
			.map_err(Into::into)
	}

	pub fn list(&self) -> db::Result<Vec<Tenant>> {
		let conn = &mut self.db.get()?;
		tenants::table
			.order(tenants::name.asc())
			.load::<Tenant>(conn)
			.map_err(Into::into)
	}

	pub fn count(&self) -> db::Result<i64> {
		let conn = &mut self.db.get()?;
		tenants::table
			.count()
			.get_result(conn)
			.map_err(Into::into)
	}
}
