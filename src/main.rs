use std::process;

use log::*;
use warp::filters::log::Info;
use warp::Filter;

use estatelink::{api, db, email::Mailer, Config};

#[tokio::main]
async fn main() {
	pretty_env_logger::init();

	let config = match Config::from_env() {
		Ok(v) => v,
		Err(e) => {
			error!("loading configuration: {}", e);
			process::exit(1);
		}
	};

	let pool = match db::pg_connection(&config.database_url) {
		Ok(v) => v,
		Err(e) => {
			error!("{}", e);
			process::exit(1);
		}
	};

	let mailer = match Mailer::new(&config.smtp) {
		Ok(v) => v,
		Err(e) => {
			error!("configuring mailer: {}", e);
			process::exit(1);
		}
	};

	let log = warp::log::custom(|info: Info| {
		info!(
			target: "estatelink::api",
			"\"{} {} {:?}\" \t{} {} {:?}",
			info.method(),
			info.path(),
			info.version(),
			info.status().canonical_reason().unwrap_or_else(|| "-"),
			info.status().as_u16(),
			info.elapsed(),
		);
	});

	let routes = api::routes(pool, mailer)
		.recover(api::handle_rejection)
		.with(log);

	info!("listening on {}", config.bind_addr);
	warp::serve(routes).run(config.bind_addr).await;
}
