//! This file serves as the root for all SeaORM entity modules.
//! These are the persisted shapes of the billing domain: reference data
//! (owners, properties, meters), per-period inputs (readings, main-meter
//! invoices, factors) and the ledger the engine writes (consolidated
//! expenses, payments, allocations, cash transactions).

pub mod billing_period;
pub mod cash_transaction;
pub mod category_factor;
pub mod consolidated_expense;
pub mod expense_detail;
pub mod main_meter_invoice;
pub mod meter;
pub mod meter_group;
pub mod meter_group_member;
pub mod meter_reading;
pub mod owner;
pub mod ownership;
pub mod payment;
pub mod payment_allocation;
pub mod property;
pub mod water_factor;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::billing_period::Entity as BillingPeriod;
    pub use super::cash_transaction::Entity as CashTransaction;
    pub use super::category_factor::Entity as CategoryFactor;
    pub use super::consolidated_expense::Entity as ConsolidatedExpense;
    pub use super::expense_detail::Entity as ExpenseDetail;
    pub use super::main_meter_invoice::Entity as MainMeterInvoice;
    pub use super::meter::Entity as Meter;
    pub use super::meter_group::Entity as MeterGroup;
    pub use super::meter_group_member::Entity as MeterGroupMember;
    pub use super::meter_reading::Entity as MeterReading;
    pub use super::owner::Entity as Owner;
    pub use super::ownership::Entity as Ownership;
    pub use super::payment::Entity as Payment;
    pub use super::payment_allocation::Entity as PaymentAllocation;
    pub use super::property::Entity as Property;
    pub use super::water_factor::Entity as WaterFactor;
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, QueryFilter, Set, SqlErr,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        // Connect to the SQLite database
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        // Try to apply migrations first
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        // A period plus the reference data one owner needs
        let period = billing_period::ActiveModel {
            year: Set(2026),
            month: Set(3),
            status: Set(billing_period::PeriodStatus::Open),
            total_generated: Set(0),
            total_collected: Set(0),
            closed_at: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let owner = owner::ActiveModel {
            full_name: Set("Elena Vargas".to_string()),
            email: Set(Some("elena@example.com".to_string())),
            phone: Set(None),
            active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let unit = property::ActiveModel {
            code: Set("A-101".to_string()),
            category: Set(property::PropertyCategory::Residential),
            area_m2: Set(Decimal::new(8250, 2)), // 82.50
            requires_meter: Set(true),
            active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        ownership::ActiveModel {
            owner_id: Set(owner.id),
            property_id: Set(unit.id),
            valid_from: Set(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            valid_to: Set(None),
            is_principal: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let meter = meter::ActiveModel {
            serial: Set("WM-00042".to_string()),
            property_id: Set(Some(unit.id)),
            group_id: Set(None),
            active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        meter_reading::ActiveModel {
            meter_id: Set(meter.id),
            period_id: Set(period.id),
            value: Set(Decimal::new(1523_500, 3)),
            previous_value: Set(None),
            consumption: Set(None),
            submitted_by: Set(Some("lector1".to_string())),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // A consolidated expense with one detail row and a payment applied
        let expense = consolidated_expense::ActiveModel {
            period_id: Set(period.id),
            owner_id: Set(owner.id),
            primary_property_id: Set(Some(unit.id)),
            base_amount: Set(45_000),
            water_amount: Set(5_200),
            other_amount: Set(0),
            previous_debt: Set(0),
            total_amount: Set(50_200),
            paid_amount: Set(0),
            balance: Set(50_200),
            status: Set(consolidated_expense::ExpenseStatus::Pending),
            due_date: Set(NaiveDate::from_ymd_opt(2026, 3, 25).unwrap()),
            paid_at: Set(None),
            generated_by: Set("admin".to_string()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        expense_detail::ActiveModel {
            expense_id: Set(expense.id),
            property_id: Set(unit.id),
            category: Set(property::PropertyCategory::Residential),
            area_m2: Set(Decimal::new(8250, 2)),
            base_rate: Set(Decimal::new(545_4545, 4)),
            base_amount: Set(45_000),
            water_factor: Set(Some(Decimal::new(650_000000, 6))),
            consumption: Set(Some(Decimal::new(8_000, 3))),
            current_reading: Set(Some(Decimal::new(1523_500, 3))),
            previous_reading: Set(Some(Decimal::new(1515_500, 3))),
            water_amount: Set(5_200),
            note: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let payment = payment::ActiveModel {
            receipt_number: Set(1001),
            owner_id: Set(owner.id),
            amount: Set(30_000),
            payment_date: Set(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()),
            period_id: Set(Some(period.id)),
            reference: Set(None),
            status: Set(payment::PaymentStatus::Active),
            cancellation_reason: Set(None),
            cancelled_by: Set(None),
            cancelled_at: Set(None),
            created_by: Set("caja1".to_string()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        payment_allocation::ActiveModel {
            payment_id: Set(payment.id),
            expense_id: Set(expense.id),
            amount: Set(30_000),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Relations resolve back
        let details = ExpenseDetail::find()
            .filter(expense_detail::Column::ExpenseId.eq(expense.id))
            .all(&db)
            .await?;
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].water_amount, 5_200);

        let allocations = PaymentAllocation::find()
            .filter(payment_allocation::Column::PaymentId.eq(payment.id))
            .all(&db)
            .await?;
        assert_eq!(allocations.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_expense_unique_per_period_and_owner() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let period = billing_period::ActiveModel {
            year: Set(2026),
            month: Set(4),
            status: Set(billing_period::PeriodStatus::Open),
            total_generated: Set(0),
            total_collected: Set(0),
            closed_at: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let owner = owner::ActiveModel {
            full_name: Set("Marco Díaz".to_string()),
            email: Set(None),
            phone: Set(None),
            active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let make_expense = || consolidated_expense::ActiveModel {
            period_id: Set(period.id),
            owner_id: Set(owner.id),
            primary_property_id: Set(None),
            base_amount: Set(1_000),
            water_amount: Set(0),
            other_amount: Set(0),
            previous_debt: Set(0),
            total_amount: Set(1_000),
            paid_amount: Set(0),
            balance: Set(1_000),
            status: Set(consolidated_expense::ExpenseStatus::Pending),
            due_date: Set(NaiveDate::from_ymd_opt(2026, 4, 25).unwrap()),
            paid_at: Set(None),
            generated_by: Set("admin".to_string()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        make_expense().insert(&db).await?;
        let duplicate = make_expense().insert(&db).await;

        let err = duplicate.expect_err("second expense for same (period, owner) must fail");
        assert!(matches!(
            err.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_reading_unique_per_meter_and_period() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let period = billing_period::ActiveModel {
            year: Set(2026),
            month: Set(5),
            status: Set(billing_period::PeriodStatus::Open),
            total_generated: Set(0),
            total_collected: Set(0),
            closed_at: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let meter = meter::ActiveModel {
            serial: Set("WM-00007".to_string()),
            property_id: Set(None),
            group_id: Set(None),
            active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let make_reading = || meter_reading::ActiveModel {
            meter_id: Set(meter.id),
            period_id: Set(period.id),
            value: Set(Decimal::new(100_000, 3)),
            previous_value: Set(None),
            consumption: Set(None),
            submitted_by: Set(None),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        make_reading().insert(&db).await?;
        let err = make_reading()
            .insert(&db)
            .await
            .expect_err("second reading for same (meter, period) must fail");
        assert!(matches!(
            err.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));

        Ok(())
    }

    #[test]
    fn water_factor_lookup_by_category() {
        let snapshot = water_factor::Model {
            id: 1,
            period_id: 1,
            factor_commercial: Some(Decimal::new(812_345678, 6)),
            factor_residential: None,
            commercial_amount: 120_000,
            commercial_consumption: Decimal::new(147_700, 3),
            residential_amount: 0,
            residential_consumption: Decimal::ZERO,
            computed_at: Utc::now().naive_utc(),
        };

        assert!(
            snapshot
                .factor_for(property::PropertyCategory::Commercial)
                .is_some()
        );
        assert!(
            snapshot
                .factor_for(property::PropertyCategory::Residential)
                .is_none()
        );
        // Never a water factor for unmetered categories
        assert!(
            snapshot
                .factor_for(property::PropertyCategory::Other)
                .is_none()
        );
    }

    #[test]
    fn period_first_day() {
        let period = billing_period::Model {
            id: 1,
            year: 2026,
            month: 2,
            status: billing_period::PeriodStatus::Open,
            total_generated: 0,
            total_collected: 0,
            closed_at: None,
        };
        assert_eq!(
            period.first_day(),
            Some(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap())
        );

        let bad = billing_period::Model { month: 13, ..period };
        assert_eq!(bad.first_day(), None);
    }
}
