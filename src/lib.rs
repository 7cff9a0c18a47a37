#[macro_use]
extern crate diesel;

pub mod agent;
pub mod api;
pub mod check;
pub mod config;
pub mod contract;
pub mod db;
pub mod email;
pub mod error;
pub mod schema;
pub mod tenant;
pub mod types;

pub use check::{Check, CheckDetail, NewCheck};
pub use config::{Config, SmtpConfig};
pub use contract::{Contract, ContractDetail, NewContract, PaymentMethod};
pub use db::{pg_connection, PgPool};
pub use error::{Error, Kind, Result};
pub use tenant::{NewTenant, Tenant};
pub use types::{Date, Id};
