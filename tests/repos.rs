//! Repository and service tests against a live PostgreSQL database.
//!
//! These need a provisioned schema and are skipped by default:
//!
//!     DATABASE_URL=postgres://... cargo test --test repos -- --ignored --test-threads=1

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate};
use diesel::prelude::*;

use estatelink::agent::{Calendar, NewService, Service};
use estatelink::{check, contract, db, tenant};
use estatelink::{Contract, Date, NewContract, NewTenant, PaymentMethod, PgPool, Tenant};

struct FixedCalendar(Date);

impl Calendar for FixedCalendar {
	fn current_date(&self) -> Date {
		self.0
	}
}

struct Fixture {
	pool: PgPool,
}

impl Fixture {
	fn new() -> Self {
		dotenv::dotenv().ok();
		let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
		let pool = db::pg_connection(&url).expect("connecting to test database");
		let fixture = Fixture { pool };
		fixture.teardown();
		fixture
	}

	fn pool(&self) -> PgPool {
		self.pool.clone()
	}

	fn teardown(&self) {
		let conn = &mut self.pool.get().unwrap();
		for table in ["checks", "contracts", "tenants"] {
			diesel::sql_query(format!("DELETE FROM {}", table))
				.execute(conn)
				.expect("cleaning db table");
		}
	}

	fn tenant(&self, name: &str, email: &str) -> Tenant {
		tenant::Repo::new(self.pool())
			.create(NewTenant {
				name,
				email,
				phone: "+971501234567",
			})
			.unwrap()
	}

	fn contract(&self, tenant_id: i32, start: Date, expiry: Date, rent: &str, num_checks: i16) -> Contract {
		contract::Repo::new(self.pool())
			.create(NewContract {
				tenant_id,
				property_name: "Marina Heights 1204",
				location: "Dubai Marina",
				start_date: start,
				expiry_date: expiry,
				annual_rent: BigDecimal::from_str(rent).unwrap(),
				num_checks,
				payment_method: PaymentMethod::Cheque,
				agent_name: "Sara Haddad",
				agent_email: "sara@estatelink.example",
			})
			.unwrap()
	}
}

fn date(y: i32, m: u32, d: u32) -> Date {
	NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
#[ignore = "requires a PostgreSQL instance with the estatelink schema"]
fn tenant_emails_are_unique() {
	let fixture = Fixture::new();
	let repo = tenant::Repo::new(fixture.pool());

	let created = fixture.tenant("Adam Nasser", "adam@example.com");
	assert_eq!(repo.find_by_email("adam@example.com").unwrap(), created);

	let dup = repo.create(NewTenant {
		name: "Other Adam",
		email: "adam@example.com",
		phone: "+971500000000",
	});
	assert_eq!(dup.unwrap_err(), db::Error::RecordAlreadyExists);
}

#[test]
#[ignore = "requires a PostgreSQL instance with the estatelink schema"]
fn contract_detail_joins_its_tenant() {
	let fixture = Fixture::new();
	let repo = contract::Repo::new(fixture.pool());

	let t = fixture.tenant("Adam Nasser", "adam@example.com");
	let c = fixture.contract(t.id, date(2024, 1, 1), date(2024, 12, 31), "12000", 4);

	let detail = repo.find_with_tenant(c.id).unwrap();
	assert_eq!(detail.contract_id, c.id);
	assert_eq!(detail.tenant_name, "Adam Nasser");
	assert_eq!(detail.tenant_email, "adam@example.com");
	assert_eq!(detail.payment_method, PaymentMethod::Cheque);

	assert_eq!(repo.find_with_tenant(c.id + 1).unwrap_err(), db::Error::RecordNotFound);
}

#[test]
#[ignore = "requires a PostgreSQL instance with the estatelink schema"]
fn expiring_window_is_inclusive_of_both_ends() {
	let fixture = Fixture::new();
	let repo = contract::Repo::new(fixture.pool());
	let today = date(2025, 6, 1);

	let t = fixture.tenant("Adam Nasser", "adam@example.com");
	let edge = fixture.contract(t.id, date(2024, 6, 2), today, "12000", 4);
	let inside = fixture.contract(t.id, date(2024, 9, 9), today + Duration::days(100), "12000", 4);
	let _outside = fixture.contract(t.id, date(2024, 9, 10), today + Duration::days(101), "12000", 4);

	let rows = repo.expiring_within(today, 100).unwrap();
	let ids: Vec<_> = rows.iter().map(|r| r.contract_id).collect();
	assert_eq!(ids, vec![edge.id, inside.id], "soonest expiry first");
}

#[test]
#[ignore = "requires a PostgreSQL instance with the estatelink schema"]
fn overdue_and_upcoming_split_the_timeline_at_today() {
	let fixture = Fixture::new();
	let today = date(2025, 6, 1);
	let calendar = FixedCalendar(today);
	let contract_repo = contract::Repo::new(fixture.pool());
	let check_repo = check::Repo::new(fixture.pool());
	let service = Service::new(NewService {
		db: fixture.pool(),
		contract_repo: &contract_repo,
		check_repo: &check_repo,
		calendar: &calendar,
	});

	let t = fixture.tenant("Adam Nasser", "adam@example.com");
	// one check each at today-5, today-1, today, today+1 and today+31
	let c = fixture.contract(t.id, today - Duration::days(5), today + Duration::days(360), "12000", 4);
	let conn = &mut fixture.pool.get().unwrap();
	for (pos, offset) in [-5i64, -1, 0, 1, 31].iter().enumerate() {
		diesel::sql_query(format!(
			"INSERT INTO checks (contract_id, check_no, check_date, amount) VALUES ({}, '{}', '{}', 3000.00)",
			c.id,
			contract::check_no(c.id, pos as i16 + 1),
			today + Duration::days(*offset),
		))
		.execute(conn)
		.unwrap();
	}

	let overdue = service.overdue_checks().unwrap();
	let days: Vec<_> = overdue.iter().map(|o| o.days_overdue).collect();
	assert_eq!(days, vec![5, 1], "strictly-before-today checks, oldest first");

	let upcoming = service.upcoming_checks(30).unwrap();
	let days: Vec<_> = upcoming.iter().map(|u| u.days_until_due).collect();
	assert_eq!(days, vec![0, 1], "the 31-day check falls outside the horizon");
}

#[test]
#[ignore = "requires a PostgreSQL instance with the estatelink schema"]
fn generation_persists_once_and_only_once() {
	let fixture = Fixture::new();
	let calendar = FixedCalendar(date(2024, 1, 1));
	let contract_repo = contract::Repo::new(fixture.pool());
	let check_repo = check::Repo::new(fixture.pool());
	let service = Service::new(NewService {
		db: fixture.pool(),
		contract_repo: &contract_repo,
		check_repo: &check_repo,
		calendar: &calendar,
	});

	let t = fixture.tenant("Adam Nasser", "adam@example.com");
	let c = fixture.contract(t.id, date(2024, 1, 1), date(2024, 12, 31), "12000", 4);

	let first = service.generate_checks().unwrap();
	assert_eq!(first.total_contracts, 1);
	assert_eq!(first.checks_generated, 4);
	assert_eq!(first.checks_skipped, 0);

	let second = service.generate_checks().unwrap();
	assert_eq!(second.checks_generated, 0);
	assert_eq!(second.checks_skipped, 4);

	let persisted = check_repo.for_contract(c.id).unwrap();
	assert_eq!(persisted.len(), 4);
	assert_eq!(persisted[0].check_date, date(2024, 1, 1));
	assert!(persisted.iter().all(|ch| ch.amount == BigDecimal::from_str("3000.00").unwrap()));

	let summary = service.contract_summary(c.id).unwrap().unwrap();
	assert_eq!(summary.total_checks_count, 4);
	assert!(service.contract_summary(c.id + 1).unwrap().is_none());
}
