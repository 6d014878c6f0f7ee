pub mod errors;
pub mod db;
pub mod application;
pub mod user;
pub mod service;
pub mod deployment;
pub mod deployment_file;

#[cfg(test)]
mod tests;
