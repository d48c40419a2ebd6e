#![doc = "The `todoforge` library crate."]
#![doc = ""]
#![doc = "Domain models, the credential and token core, storage backends, routing"]
#![doc = "configuration and error handling for the todoforge service. The binary"]
#![doc = "(`main.rs`) wires these together into an actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;

pub use crate::error::AppError;
