use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use estatelink::agent::{generate_schedules, ScheduleStore};
use estatelink::error::Kind;
use estatelink::{db, Contract, NewCheck, PaymentMethod};

/// In-memory stand-in for the check store, with switches to simulate the
/// failure modes a live database can produce mid-run.
#[derive(Default)]
struct MemStore {
	checks: Vec<NewCheck>,
	fail_on: Option<String>,
	duplicate_on: Option<String>,
}

impl ScheduleStore for MemStore {
	fn count_for_contract(&mut self, contract_id: i32) -> db::Result<i64> {
		Ok(self
			.checks
			.iter()
			.filter(|c| c.contract_id == contract_id)
			.count() as i64)
	}

	fn check_exists(&mut self, check_no: &str) -> db::Result<bool> {
		Ok(self.checks.iter().any(|c| c.check_no == check_no))
	}

	fn insert_check(&mut self, check: NewCheck) -> db::Result<()> {
		if self.fail_on.as_deref() == Some(check.check_no.as_str()) {
			return Err(db::Error::Connection("simulated outage".to_string()));
		}
		if self.duplicate_on.as_deref() == Some(check.check_no.as_str()) {
			return Err(db::Error::RecordAlreadyExists);
		}
		self.checks.push(check);
		Ok(())
	}
}

fn contract(id: i32, annual_rent: &str, num_checks: i16) -> Contract {
	Contract {
		id,
		tenant_id: 1,
		property_name: format!("Unit {}", id),
		location: "Downtown Dubai".to_string(),
		start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
		expiry_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
		annual_rent: BigDecimal::from_str(annual_rent).unwrap(),
		num_checks,
		payment_method: PaymentMethod::BankTransfer,
		agent_name: "Sara Haddad".to_string(),
		agent_email: "sara@estatelink.example".to_string(),
	}
}

#[test]
fn generates_a_full_schedule_for_every_contract() {
	let contracts = vec![contract(1, "12000", 4), contract(2, "54000", 6)];
	let mut store = MemStore::default();

	let stats = generate_schedules(&contracts, &mut store).unwrap();

	assert_eq!(stats.total_contracts, 2);
	assert_eq!(stats.checks_generated, 10);
	assert_eq!(stats.checks_skipped, 0);

	assert_eq!(store.count_for_contract(1).unwrap(), 4);
	assert_eq!(store.count_for_contract(2).unwrap(), 6);

	let mut nos: Vec<_> = store.checks.iter().map(|c| c.check_no.clone()).collect();
	nos.sort();
	nos.dedup();
	assert_eq!(nos.len(), 10, "check identifiers must be globally unique");

	for c in &contracts {
		let dates: Vec<_> = store
			.checks
			.iter()
			.filter(|ch| ch.contract_id == c.id)
			.map(|ch| ch.check_date)
			.collect();
		for pair in dates.windows(2) {
			assert!(pair[0] <= pair[1], "due dates must be non-decreasing");
		}
		for d in &dates {
			assert!(*d >= c.start_date && *d < c.expiry_date);
		}
	}
}

#[test]
fn rerunning_generation_is_idempotent() {
	let contracts = vec![contract(1, "12000", 4), contract(2, "54000", 6)];
	let mut store = MemStore::default();

	generate_schedules(&contracts, &mut store).unwrap();
	let snapshot = store.checks.clone();

	let second = generate_schedules(&contracts, &mut store).unwrap();

	assert_eq!(second.checks_generated, 0);
	assert_eq!(second.checks_skipped, 10);
	assert_eq!(store.checks, snapshot, "persisted rows must be unchanged");
}

#[test]
fn partially_generated_contract_is_topped_up() {
	let c = contract(5, "12000", 4);
	let mut store = MemStore::default();

	// first check already persisted by an interrupted earlier run
	store.checks.push(c.schedule().remove(0));

	let stats = generate_schedules(&[c], &mut store).unwrap();

	assert_eq!(stats.checks_generated, 3);
	assert_eq!(stats.checks_skipped, 1);
	assert_eq!(store.count_for_contract(5).unwrap(), 4);
}

#[test]
fn contract_with_reduced_num_checks_is_never_trimmed() {
	let original = contract(8, "12000", 4);
	let mut store = MemStore::default();
	generate_schedules(&[original], &mut store).unwrap();

	// num_checks shrank after full generation; the four existing checks
	// now exceed the declared target and the contract is left alone
	let shrunk = contract(8, "12000", 2);
	let stats = generate_schedules(&[shrunk], &mut store).unwrap();

	assert_eq!(stats.checks_generated, 0);
	assert_eq!(stats.checks_skipped, 4);
	assert_eq!(store.count_for_contract(8).unwrap(), 4);
}

#[test]
fn duplicate_key_from_a_concurrent_run_counts_as_a_skip() {
	let c = contract(3, "24000", 4);
	let mut store = MemStore {
		duplicate_on: Some("CHK00302".to_string()),
		..MemStore::default()
	};

	let stats = generate_schedules(&[c], &mut store).unwrap();

	assert_eq!(stats.checks_generated, 3);
	assert_eq!(stats.checks_skipped, 1);
}

#[test]
fn storage_failure_aborts_the_run() {
	let c = contract(4, "24000", 4);
	let mut store = MemStore {
		fail_on: Some("CHK00403".to_string()),
		..MemStore::default()
	};

	let err = generate_schedules(&[c], &mut store).unwrap_err();
	match err.kind() {
		Kind::Database(db::Error::Connection(_)) => {}
		other => panic!("expected a storage failure, got {:?}", other),
	}
}

#[test]
fn every_check_carries_the_same_rounded_amount() {
	let c = contract(6, "10000", 3);
	let mut store = MemStore::default();
	generate_schedules(&[c], &mut store).unwrap();

	let want = BigDecimal::from_str("3333.33").unwrap();
	assert!(store.checks.iter().all(|ch| ch.amount == want));
}
