pub mod auth;
pub mod errors;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod startup;
pub mod upload;

pub use startup::run;
