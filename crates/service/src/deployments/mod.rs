//! Deployments: versioned releases of a service, each documented by uploaded files.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;

pub use service::DeploymentService;
