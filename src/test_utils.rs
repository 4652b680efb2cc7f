#[cfg(test)]
pub mod test_utils {
    use std::sync::atomic::{AtomicI64, Ordering};

    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use chrono::{NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use moka::future::Cache;
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    use model::entities::billing_period::PeriodStatus;
    use model::entities::main_meter_invoice::WaterCategory;
    use model::entities::payment::PaymentStatus;
    use model::entities::property::PropertyCategory;
    use model::entities::{
        billing_period, category_factor, main_meter_invoice, meter, meter_reading, owner,
        ownership, payment, property,
    };

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .expect("Failed to enable foreign keys");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing, seeded with a small canonical building.
    ///
    /// Row ids are assigned in insertion order on the fresh database:
    ///   - period 1: 2026-02 closed, period 2: 2026-03 open
    ///   - owner 1: Ana Morales (shop C-101)
    ///   - owner 2: Boris Stanek (flat R-201, storage S-001)
    ///   - readings give the shop 30.000 m3 and the flat 12.500 m3 for 2026-03
    ///   - invoices for 2026-03: commercial 7500 over 50 m3, residential 9600
    ///     over 60 m3
    ///
    /// Generating 2026-03 therefore bills owner 1 a total of 7500 and
    /// owner 2 a total of 3589.
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;

        seed_period(&db, 2026, 2, PeriodStatus::Closed).await;
        seed_period(&db, 2026, 3, PeriodStatus::Open).await;

        seed_category_factor(&db, PropertyCategory::Commercial, Decimal::new(2500, 2)).await;
        seed_category_factor(&db, PropertyCategory::Residential, Decimal::new(1800, 2)).await;
        seed_category_factor(&db, PropertyCategory::Other, Decimal::new(500, 2)).await;

        let ana = seed_owner(&db, "Ana Morales").await;
        let boris = seed_owner(&db, "Boris Stanek").await;

        let shop = seed_property(
            &db,
            "C-101",
            PropertyCategory::Commercial,
            Decimal::new(12000, 2),
            true,
        )
        .await;
        let flat = seed_property(
            &db,
            "R-201",
            PropertyCategory::Residential,
            Decimal::new(8550, 2),
            true,
        )
        .await;
        let storage = seed_property(
            &db,
            "S-001",
            PropertyCategory::Other,
            Decimal::new(1000, 2),
            false,
        )
        .await;

        seed_ownership(&db, ana.id, shop.id, true).await;
        seed_ownership(&db, boris.id, flat.id, true).await;
        seed_ownership(&db, boris.id, storage.id, false).await;

        let shop_meter = seed_meter(&db, shop.id, "M-C101").await;
        seed_reading(&db, shop_meter.id, 1, Decimal::new(100500, 3)).await;
        seed_reading(&db, shop_meter.id, 2, Decimal::new(130500, 3)).await;

        let flat_meter = seed_meter(&db, flat.id, "M-R201").await;
        seed_reading(&db, flat_meter.id, 1, Decimal::new(80000, 3)).await;
        seed_reading(&db, flat_meter.id, 2, Decimal::new(92500, 3)).await;

        seed_invoice(&db, 2, WaterCategory::Commercial, 7500, Decimal::new(50, 0)).await;
        seed_invoice(&db, 2, WaterCategory::Residential, 9600, Decimal::new(60, 0)).await;

        let debt_cache = Cache::new(100);

        AppState { db, debt_cache }
    }

    /// Insert an active payment directly, the way bank-statement ingest would.
    pub async fn seed_payment(
        db: &DatabaseConnection,
        owner_id: i32,
        amount: i64,
        payment_date: NaiveDate,
    ) -> payment::Model {
        static RECEIPT_NUMBER: AtomicI64 = AtomicI64::new(70000);

        payment::ActiveModel {
            receipt_number: Set(RECEIPT_NUMBER.fetch_add(1, Ordering::SeqCst)),
            owner_id: Set(owner_id),
            amount: Set(amount),
            payment_date: Set(payment_date),
            period_id: Set(None),
            reference: Set(None),
            status: Set(PaymentStatus::Active),
            cancellation_reason: Set(None),
            cancelled_by: Set(None),
            cancelled_at: Set(None),
            created_by: Set("test".to_string()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test payment")
    }

    async fn seed_period(db: &DatabaseConnection, year: i32, month: i32, status: PeriodStatus) {
        billing_period::ActiveModel {
            year: Set(year),
            month: Set(month),
            status: Set(status),
            total_generated: Set(0),
            total_collected: Set(0),
            closed_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test period");
    }

    async fn seed_owner(db: &DatabaseConnection, full_name: &str) -> owner::Model {
        owner::ActiveModel {
            full_name: Set(full_name.to_string()),
            email: Set(None),
            phone: Set(None),
            active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test owner")
    }

    async fn seed_property(
        db: &DatabaseConnection,
        code: &str,
        category: PropertyCategory,
        area_m2: Decimal,
        requires_meter: bool,
    ) -> property::Model {
        property::ActiveModel {
            code: Set(code.to_string()),
            category: Set(category),
            area_m2: Set(area_m2),
            requires_meter: Set(requires_meter),
            active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test property")
    }

    async fn seed_ownership(db: &DatabaseConnection, owner_id: i32, property_id: i32, is_principal: bool) {
        ownership::ActiveModel {
            owner_id: Set(owner_id),
            property_id: Set(property_id),
            valid_from: Set(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
            valid_to: Set(None),
            is_principal: Set(is_principal),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test ownership");
    }

    async fn seed_meter(db: &DatabaseConnection, property_id: i32, serial: &str) -> meter::Model {
        meter::ActiveModel {
            serial: Set(serial.to_string()),
            property_id: Set(Some(property_id)),
            group_id: Set(None),
            active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test meter")
    }

    async fn seed_reading(db: &DatabaseConnection, meter_id: i32, period_id: i32, value: Decimal) {
        meter_reading::ActiveModel {
            meter_id: Set(meter_id),
            period_id: Set(period_id),
            value: Set(value),
            previous_value: Set(None),
            consumption: Set(None),
            submitted_by: Set(None),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test reading");
    }

    async fn seed_invoice(
        db: &DatabaseConnection,
        period_id: i32,
        category: WaterCategory,
        amount: i64,
        consumption_m3: Decimal,
    ) {
        main_meter_invoice::ActiveModel {
            period_id: Set(period_id),
            meter_label: Set("MAIN".to_string()),
            category: Set(category),
            amount: Set(amount),
            consumption_m3: Set(consumption_m3),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test invoice");
    }

    async fn seed_category_factor(db: &DatabaseConnection, category: PropertyCategory, rate: Decimal) {
        category_factor::ActiveModel {
            category: Set(category),
            rate: Set(rate),
            valid_from: Set(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
            valid_to: Set(None),
            active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test category factor");
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// This function sets up a tracing subscriber that outputs logs to STDERR,
    /// which is useful for debugging tests. The log level is determined by the
    /// RUST_LOG environment variable, defaulting to WARN if not set.
    ///
    /// # Returns
    ///
    /// A guard that will clean up the subscriber when dropped.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        // Get log level from environment variable or default to WARN
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr) // Output to stderr, which is captured by tests
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        // Initialize tracing for tests
        let _ = init_test_tracing();

        let state = setup_test_app_state().await;
        println!("Test database setup complete");
        let router = create_router(state);
        println!("Test router created");
        router
    }

    /// Create axum app for testing together with the state backing it, for
    /// tests that seed rows directly into the server's database
    pub async fn setup_test_app_with_state() -> (Router, AppState) {
        let _ = init_test_tracing();

        let state = setup_test_app_state().await;
        let router = create_router(state.clone());
        (router, state)
    }
}
