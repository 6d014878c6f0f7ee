//! Service layer providing business-oriented operations on top of models.
//! - Separates business logic from data access.
//! - Reuses validation and entity definitions in `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod auth;
pub mod runtime;
#[cfg(test)]
pub mod test_support;
pub mod storage;
pub mod user_service;
pub mod service_registry;
pub mod deployments;
