//! Migrator registering entity-specific migrations in dependency order.
//! The version uniqueness backfill runs after all tables exist; plain indexes last.
pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_users;
mod m20240301_000002_create_services;
mod m20240301_000003_create_deployments;
mod m20240301_000004_create_deployment_files;
mod m20240415_000005_unique_service_version;
mod m20240415_000006_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_users::Migration),
            Box::new(m20240301_000002_create_services::Migration),
            Box::new(m20240301_000003_create_deployments::Migration),
            Box::new(m20240301_000004_create_deployment_files::Migration),
            Box::new(m20240415_000005_unique_service_version::Migration),
            // Indexes should always be applied last
            Box::new(m20240415_000006_add_indexes::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_registered_in_name_order() {
        let names: Vec<String> = Migrator::migrations().iter().map(|m| m.name().to_string()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 6);
    }
}
