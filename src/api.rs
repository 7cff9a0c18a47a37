use std::convert::Infallible;

use bigdecimal::{BigDecimal, Zero};
use diesel::RunQueryDsl;
use log::error;
use serde::Deserialize;
use serde_json::json;
use warp::http::StatusCode;
use warp::{reject, Filter, Rejection, Reply};

use crate::agent::{self, Calendar, SystemCalendar};
use crate::check;
use crate::contract::{self, NewContract, PaymentMethod};
use crate::db::{self, PgPool};
use crate::email::{expiry, overdue, upcoming, Mailer};
use crate::error::Kind;
use crate::tenant::{self, NewTenant};
use crate::types::{Date, Id};

const DEFAULT_UPCOMING_DAYS: i64 = 30;
const DEFAULT_EXPIRY_DAYS: i64 = 100;

/// The full JSON route tree; compose with `handle_rejection` when serving
pub fn routes(pool: PgPool, mailer: Mailer) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
	let root = warp::path::end().and(warp::get()).map(|| {
		warp::reply::json(&json!({
			"service": "EstateLink API",
			"status": "running",
			"version": "1.0.0",
		}))
	});

	let health = warp::path!("health")
		.and(warp::get())
		.and(with_pool(pool.clone()))
		.and_then(health_check);

	let list_tenants = warp::path!("api" / "v1" / "tenants")
		.and(warp::get())
		.and(with_pool(pool.clone()))
		.and_then(list_tenants);

	let create_tenant = warp::path!("api" / "v1" / "tenants")
		.and(warp::post())
		.and(json_body())
		.and(with_pool(pool.clone()))
		.and_then(create_tenant);

	let tenant_detail = warp::path!("api" / "v1" / "tenants" / Id)
		.and(warp::get())
		.and(with_pool(pool.clone()))
		.and_then(tenant_detail);

	let list_contracts = warp::path!("api" / "v1" / "contracts")
		.and(warp::get())
		.and(with_pool(pool.clone()))
		.and_then(list_contracts);

	let create_contract = warp::path!("api" / "v1" / "contracts")
		.and(warp::post())
		.and(json_body())
		.and(with_pool(pool.clone()))
		.and_then(create_contract);

	let contract_summary = warp::path!("api" / "v1" / "contracts" / Id)
		.and(warp::get())
		.and(with_pool(pool.clone()))
		.and_then(contract_summary);

	let generate_checks = warp::path!("api" / "v1" / "checks" / "generate")
		.and(warp::post())
		.and(with_pool(pool.clone()))
		.and_then(generate_checks);

	let upcoming_checks = warp::path!("api" / "v1" / "checks" / "upcoming")
		.and(warp::get())
		.and(warp::query::<HorizonQuery>())
		.and(with_pool(pool.clone()))
		.and_then(upcoming_checks);

	let overdue_checks = warp::path!("api" / "v1" / "checks" / "overdue")
		.and(warp::get())
		.and(with_pool(pool.clone()))
		.and_then(overdue_checks);

	let expiring_contracts = warp::path!("api" / "v1" / "alerts" / "expiring")
		.and(warp::get())
		.and(warp::query::<HorizonQuery>())
		.and(with_pool(pool.clone()))
		.and_then(expiring_contracts);

	let notify = warp::path!("api" / "v1" / "alerts" / "notify")
		.and(warp::post())
		.and(with_pool(pool.clone()))
		.and(with_mailer(mailer))
		.and_then(send_notifications);

	let statistics = warp::path!("api" / "v1" / "statistics")
		.and(warp::get())
		.and(with_pool(pool))
		.and_then(statistics);

	root.or(health)
		.or(list_tenants)
		.or(create_tenant)
		.or(tenant_detail)
		.or(list_contracts)
		.or(create_contract)
		.or(contract_summary)
		.or(generate_checks)
		.or(upcoming_checks)
		.or(overdue_checks)
		.or(expiring_contracts)
		.or(notify)
		.or(statistics)
}

fn with_pool(pool: PgPool) -> impl Filter<Extract = (PgPool,), Error = Infallible> + Clone {
	warp::any().map(move || pool.clone())
}

fn with_mailer(mailer: Mailer) -> impl Filter<Extract = (Mailer,), Error = Infallible> + Clone {
	warp::any().map(move || mailer.clone())
}

fn json_body<T: serde::de::DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
	warp::body::content_length_limit(16 * 1024).and(warp::body::json())
}

#[derive(Deserialize)]
struct HorizonQuery {
	days: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateTenant {
	pub name: String,
	pub email: String,
	pub phone: String,
}

#[derive(Deserialize)]
pub struct CreateContract {
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

async fn health_check(pool: PgPool) -> Result<impl Reply, Rejection> {
	let conn = &mut pool.get().map_err(|e| {
		api_error(StatusCode::SERVICE_UNAVAILABLE, format!("database unhealthy: {}", e))
	})?;
	diesel::sql_query("SELECT 1").execute(conn).map_err(|e| {
		api_error(StatusCode::SERVICE_UNAVAILABLE, format!("database unhealthy: {}", e))
	})?;

	Ok(warp::reply::json(&json!({
		"status": "healthy",
		"database": "connected",
	})))
}

async fn list_tenants(pool: PgPool) -> Result<impl Reply, Rejection> {
	let tenants = tenant::Repo::new(pool).list().map_err(reject_db)?;
	Ok(warp::reply::json(&json!({
		"count": tenants.len(),
		"tenants": tenants,
	})))
}

async fn create_tenant(payload: CreateTenant, pool: PgPool) -> Result<impl Reply, Rejection> {
	if payload.name.trim().is_empty() {
		return Err(bad_request("name must not be empty"));
	}
	if !payload.email.contains('@') {
		return Err(bad_request("email is not a valid address"));
	}
	if payload.phone.trim().is_empty() {
		return Err(bad_request("phone must not be empty"));
	}

	let repo = tenant::Repo::new(pool);
	match repo.find_by_email(&payload.email) {
		Ok(_) => return Err(conflict("email already exists")),
		Err(db::Error::RecordNotFound) => {}
		Err(e) => return Err(reject_db(e)),
	}

	let tenant = repo
		.create(NewTenant {
			name: &payload.name,
			email: &payload.email,
			phone: &payload.phone,
		})
		.map_err(reject_db)?;

	Ok(warp::reply::with_status(
		warp::reply::json(&json!({
			"message": "Tenant created successfully",
			"tenant_id": tenant.id,
		})),
		StatusCode::CREATED,
	))
}

async fn tenant_detail(id: Id, pool: PgPool) -> Result<impl Reply, Rejection> {
	let tenant = match tenant::Repo::new(pool.clone()).find_by_id(id) {
		Ok(v) => v,
		Err(db::Error::RecordNotFound) => {
			return Err(not_found(format!("Tenant {} not found", id)));
		}
		Err(e) => return Err(reject_db(e)),
	};

	let contracts = contract::Repo::new(pool).find_by_tenant(id).map_err(reject_db)?;

	Ok(warp::reply::json(&json!({
		"tenant": tenant,
		"contracts_count": contracts.len(),
		"contracts": contracts,
	})))
}

async fn list_contracts(pool: PgPool) -> Result<impl Reply, Rejection> {
	let contract_repo = contract::Repo::new(pool.clone());
	let check_repo = check::Repo::new(pool.clone());
	let service = service(&pool, &contract_repo, &check_repo);

	let contracts = service.contracts().map_err(reject_err)?;
	Ok(warp::reply::json(&contracts))
}

async fn create_contract(payload: CreateContract, pool: PgPool) -> Result<impl Reply, Rejection> {
	validate_contract(&payload)?;

	match tenant::Repo::new(pool.clone()).find_by_id(payload.tenant_id) {
		Ok(_) => {}
		Err(db::Error::RecordNotFound) => {
			return Err(not_found(format!("Tenant {} not found", payload.tenant_id)));
		}
		Err(e) => return Err(reject_db(e)),
	}

	let contract = contract::Repo::new(pool)
		.create(NewContract {
			tenant_id: payload.tenant_id,
			property_name: &payload.property_name,
			location: &payload.location,
			start_date: payload.start_date,
			expiry_date: payload.expiry_date,
			annual_rent: payload.annual_rent.clone(),
			num_checks: payload.num_checks,
			payment_method: payload.payment_method,
			agent_name: &payload.agent_name,
			agent_email: &payload.agent_email,
		})
		.map_err(reject_db)?;

	Ok(warp::reply::with_status(
		warp::reply::json(&json!({
			"message": "Contract created successfully",
			"contract_id": contract.id,
		})),
		StatusCode::CREATED,
	))
}

fn validate_contract(payload: &CreateContract) -> Result<(), Rejection> {
	if payload.property_name.trim().is_empty() {
		return Err(bad_request("property_name must not be empty"));
	}
	if payload.location.trim().is_empty() {
		return Err(bad_request("location must not be empty"));
	}
	if payload.expiry_date <= payload.start_date {
		return Err(bad_request("Expiry date must be after start date"));
	}
	if payload.annual_rent <= BigDecimal::zero() {
		return Err(bad_request("annual_rent must be positive"));
	}
	if !(1..=12).contains(&payload.num_checks) {
		return Err(bad_request("num_checks must be between 1 and 12"));
	}
	if !payload.agent_email.contains('@') {
		return Err(bad_request("agent_email is not a valid address"));
	}
	Ok(())
}

async fn contract_summary(id: Id, pool: PgPool) -> Result<impl Reply, Rejection> {
	let contract_repo = contract::Repo::new(pool.clone());
	let check_repo = check::Repo::new(pool.clone());
	let service = service(&pool, &contract_repo, &check_repo);

	match service.contract_summary(id).map_err(reject_err)? {
		Some(summary) => Ok(warp::reply::json(&summary)),
		None => Err(not_found(format!("Contract {} not found", id))),
	}
}

async fn generate_checks(pool: PgPool) -> Result<impl Reply, Rejection> {
	let contract_repo = contract::Repo::new(pool.clone());
	let check_repo = check::Repo::new(pool.clone());
	let service = service(&pool, &contract_repo, &check_repo);

	let stats = service.generate_checks().map_err(reject_err)?;
	Ok(warp::reply::json(&json!({
		"message": "Check generation completed",
		"statistics": stats,
	})))
}

async fn upcoming_checks(query: HorizonQuery, pool: PgPool) -> Result<impl Reply, Rejection> {
	let days = query.days.unwrap_or(DEFAULT_UPCOMING_DAYS);
	let contract_repo = contract::Repo::new(pool.clone());
	let check_repo = check::Repo::new(pool.clone());
	let service = service(&pool, &contract_repo, &check_repo);

	let checks = service.upcoming_checks(days).map_err(reject_err)?;
	Ok(warp::reply::json(&json!({
		"count": checks.len(),
		"days_ahead": days,
		"checks": checks,
	})))
}

async fn overdue_checks(pool: PgPool) -> Result<impl Reply, Rejection> {
	let contract_repo = contract::Repo::new(pool.clone());
	let check_repo = check::Repo::new(pool.clone());
	let service = service(&pool, &contract_repo, &check_repo);

	let checks = service.overdue_checks().map_err(reject_err)?;
	Ok(warp::reply::json(&json!({
		"count": checks.len(),
		"checks": checks,
	})))
}

async fn expiring_contracts(query: HorizonQuery, pool: PgPool) -> Result<impl Reply, Rejection> {
	let days = query.days.unwrap_or(DEFAULT_EXPIRY_DAYS);
	let contract_repo = contract::Repo::new(pool.clone());
	let check_repo = check::Repo::new(pool.clone());
	let service = service(&pool, &contract_repo, &check_repo);

	let alerts = service.expiring_contracts(days).map_err(reject_err)?;
	Ok(warp::reply::json(&json!({
		"count": alerts.len(),
		"alert_threshold_days": days,
		"expiring_contracts": alerts,
	})))
}

async fn send_notifications(pool: PgPool, mailer: Mailer) -> Result<impl Reply, Rejection> {
	let contract_repo = contract::Repo::new(pool.clone());
	let check_repo = check::Repo::new(pool.clone());
	let service = service(&pool, &contract_repo, &check_repo);

	let expiring = service
		.expiring_contracts(DEFAULT_EXPIRY_DAYS)
		.map_err(reject_err)?;
	let due_soon = service
		.upcoming_checks(DEFAULT_UPCOMING_DAYS)
		.map_err(reject_err)?;
	let past_due = service.overdue_checks().map_err(reject_err)?;

	let expiry_stats = expiry::send_batch_contract_expiry_alerts(&mailer, &expiring);
	let upcoming_stats = upcoming::send_batch_upcoming_payment_reminders(&mailer, &due_soon);
	let overdue_stats = overdue::send_batch_overdue_payment_alerts(&mailer, &past_due);

	Ok(warp::reply::json(&json!({
		"contract_expiry": expiry_stats,
		"upcoming_payments": upcoming_stats,
		"overdue_payments": overdue_stats,
	})))
}

async fn statistics(pool: PgPool) -> Result<impl Reply, Rejection> {
	let today = SystemCalendar.current_date();
	let tenant_repo = tenant::Repo::new(pool.clone());
	let contract_repo = contract::Repo::new(pool.clone());
	let check_repo = check::Repo::new(pool);

	let stats = json!({
		"total_tenants": tenant_repo.count().map_err(reject_db)?,
		"total_contracts": contract_repo.count().map_err(reject_db)?,
		"active_contracts": contract_repo.active_count(today).map_err(reject_db)?,
		"expired_contracts": contract_repo.expired_count(today).map_err(reject_db)?,
		"total_checks": check_repo.count().map_err(reject_db)?,
		"overdue_checks": check_repo.overdue_count(today).map_err(reject_db)?,
		"upcoming_checks_30days": check_repo.upcoming_count(today, DEFAULT_UPCOMING_DAYS).map_err(reject_db)?,
		"expiring_contracts_100days": contract_repo.expiring_count(today, DEFAULT_EXPIRY_DAYS).map_err(reject_db)?,
	});

	Ok(warp::reply::json(&stats))
}

fn service<'a>(
	pool: &PgPool,
	contract_repo: &'a contract::Repo,
	check_repo: &'a check::Repo,
) -> agent::Service<'a> {
	agent::Service::new(agent::NewService {
		db: pool.clone(),
		contract_repo,
		check_repo,
		calendar: &SystemCalendar,
	})
}

#[derive(Debug)]
struct ApiError {
	status: StatusCode,
	message: String,
}

impl reject::Reject for ApiError {}

fn api_error(status: StatusCode, message: impl Into<String>) -> Rejection {
	warp::reject::custom(ApiError {
		status,
		message: message.into(),
	})
}

fn bad_request(message: impl Into<String>) -> Rejection {
	api_error(StatusCode::BAD_REQUEST, message)
}

fn not_found(message: impl Into<String>) -> Rejection {
	api_error(StatusCode::NOT_FOUND, message)
}

fn conflict(message: impl Into<String>) -> Rejection {
	api_error(StatusCode::CONFLICT, message)
}

fn reject_db(e: db::Error) -> Rejection {
	match e {
		db::Error::RecordNotFound => not_found("record does not exist"),
		db::Error::RecordAlreadyExists => conflict("record violates a unique constraint"),
		other => api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
	}
}

fn reject_err(e: crate::Error) -> Rejection {
	match e.kind() {
		Kind::InvalidHorizon(_) => bad_request(e.to_string()),
		Kind::Database(db::Error::RecordNotFound) => not_found("record does not exist"),
		Kind::Database(_) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
	}
}

/// Translate rejections into the JSON error envelope with a status code
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
	let (status, message) = if err.is_not_found() {
		(StatusCode::NOT_FOUND, "resource not found".to_string())
	} else if let Some(api) = err.find::<ApiError>() {
		(api.status, api.message.clone())
	} else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
		(StatusCode::BAD_REQUEST, e.to_string())
	} else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
		(StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
	} else {
		error!("unhandled rejection: {:?}", err);
		(StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
	};

	Ok(warp::reply::with_status(
		warp::reply::json(&json!({ "error": message })),
		status,
	))
}
