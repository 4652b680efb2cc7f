pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_billing_tables;
mod m20250614_000001_create_payment_tables;
mod m20251105_000001_add_meter_groups;
pub mod entity_iden;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_billing_tables::Migration),
            Box::new(m20250614_000001_create_payment_tables::Migration),
            Box::new(m20251105_000001_add_meter_groups::Migration),
        ]
    }
}
