pub mod helpers;
pub mod scenario_building;

pub use scenario_building::ScenarioBuilding;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr};

use migration::{Migrator, MigratorTrait};
use model::entities::{billing_period, owner};

/// In-memory database with the full schema applied.
pub async fn setup_db() -> Result<DatabaseConnection, DbErr> {
    // Connect to the SQLite database
    let db = Database::connect("sqlite::memory:").await?;

    // Enable foreign keys
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

    // Try to apply migrations first
    Migrator::up(&db, None).await.expect("Migrations failed.");
    Ok(db)
}

/// Prepared test scenario: database, the open period under billing and the
/// owners expected to receive an expense.
pub type TestScenario = (DatabaseConnection, billing_period::Model, Vec<owner::Model>);

/// Trait for building test scenarios.
#[async_trait]
pub trait TestScenarioBuilder {
    async fn get_scenario(&self) -> Result<TestScenario, DbErr>;
}
