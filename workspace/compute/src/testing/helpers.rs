use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

use model::entities::billing_period::PeriodStatus;
use model::entities::consolidated_expense::ExpenseStatus;
use model::entities::main_meter_invoice::WaterCategory;
use model::entities::meter_group::ProrationMethod;
use model::entities::payment::PaymentStatus;
use model::entities::property::PropertyCategory;
use model::entities::{
    billing_period, category_factor, consolidated_expense, main_meter_invoice, meter, meter_group,
    meter_group_member, meter_reading, owner, ownership, payment, property,
};

pub type Result<T> = std::result::Result<T, DbErr>;

pub async fn new_period(
    db: &DatabaseConnection,
    year: i32,
    month: i32,
    status: PeriodStatus,
) -> Result<billing_period::Model> {
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
}

pub async fn new_owner(db: &DatabaseConnection, full_name: &str) -> Result<owner::Model> {
    owner::ActiveModel {
        full_name: Set(full_name.to_string()),
        email: Set(None),
        phone: Set(None),
        active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_property(
    db: &DatabaseConnection,
    code: &str,
    category: PropertyCategory,
    area_m2: Decimal,
    requires_meter: bool,
) -> Result<property::Model> {
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
}

pub async fn new_ownership(
    db: &DatabaseConnection,
    owner: &owner::Model,
    property: &property::Model,
    is_principal: bool,
) -> Result<ownership::Model> {
    ownership::ActiveModel {
        owner_id: Set(owner.id),
        property_id: Set(property.id),
        valid_from: Set(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
        valid_to: Set(None),
        is_principal: Set(is_principal),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_meter(
    db: &DatabaseConnection,
    property: &property::Model,
    serial: &str,
) -> Result<meter::Model> {
    meter::ActiveModel {
        serial: Set(serial.to_string()),
        property_id: Set(Some(property.id)),
        group_id: Set(None),
        active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_meter_group(
    db: &DatabaseConnection,
    name: &str,
    method: ProrationMethod,
) -> Result<meter_group::Model> {
    meter_group::ActiveModel {
        name: Set(name.to_string()),
        method: Set(method),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_group_meter(
    db: &DatabaseConnection,
    group: &meter_group::Model,
    serial: &str,
) -> Result<meter::Model> {
    meter::ActiveModel {
        serial: Set(serial.to_string()),
        property_id: Set(None),
        group_id: Set(Some(group.id)),
        active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_group_member(
    db: &DatabaseConnection,
    group: &meter_group::Model,
    property: &property::Model,
    percentage: Option<Decimal>,
) -> Result<meter_group_member::Model> {
    meter_group_member::ActiveModel {
        group_id: Set(group.id),
        property_id: Set(property.id),
        percentage: Set(percentage),
    }
    .insert(db)
    .await
}

pub async fn new_reading(
    db: &DatabaseConnection,
    meter: &meter::Model,
    period: &billing_period::Model,
    value: Decimal,
) -> Result<meter_reading::Model> {
    meter_reading::ActiveModel {
        meter_id: Set(meter.id),
        period_id: Set(period.id),
        value: Set(value),
        previous_value: Set(None),
        consumption: Set(None),
        submitted_by: Set(None),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_invoice(
    db: &DatabaseConnection,
    period: &billing_period::Model,
    category: WaterCategory,
    amount: i64,
    consumption_m3: Decimal,
) -> Result<main_meter_invoice::Model> {
    main_meter_invoice::ActiveModel {
        period_id: Set(period.id),
        meter_label: Set("MAIN".to_string()),
        category: Set(category),
        amount: Set(amount),
        consumption_m3: Set(consumption_m3),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_category_factor(
    db: &DatabaseConnection,
    category: PropertyCategory,
    rate: Decimal,
) -> Result<category_factor::Model> {
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
}

pub async fn new_payment(
    db: &DatabaseConnection,
    owner: &owner::Model,
    amount: i64,
    payment_date: NaiveDate,
) -> Result<payment::Model> {
    insert_payment(db, owner, amount, payment_date, None).await
}

pub async fn new_payment_in_period(
    db: &DatabaseConnection,
    owner: &owner::Model,
    amount: i64,
    payment_date: NaiveDate,
    period: &billing_period::Model,
) -> Result<payment::Model> {
    insert_payment(db, owner, amount, payment_date, Some(period.id)).await
}

async fn insert_payment(
    db: &DatabaseConnection,
    owner: &owner::Model,
    amount: i64,
    payment_date: NaiveDate,
    period_id: Option<i32>,
) -> Result<payment::Model> {
    static RECEIPT_NUMBER: AtomicI64 = AtomicI64::new(9000);

    payment::ActiveModel {
        receipt_number: Set(RECEIPT_NUMBER.fetch_add(1, Ordering::SeqCst)),
        owner_id: Set(owner.id),
        amount: Set(amount),
        payment_date: Set(payment_date),
        period_id: Set(period_id),
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
}

/// Inserts a bare consolidated expense, bypassing generation. The explicit
/// `created_at` drives the oldest-first allocation order in tests.
pub async fn new_expense(
    db: &DatabaseConnection,
    period: &billing_period::Model,
    owner: &owner::Model,
    total_amount: i64,
    created_at: NaiveDateTime,
) -> Result<consolidated_expense::Model> {
    consolidated_expense::ActiveModel {
        period_id: Set(period.id),
        owner_id: Set(owner.id),
        primary_property_id: Set(None),
        base_amount: Set(total_amount),
        water_amount: Set(0),
        other_amount: Set(0),
        previous_debt: Set(0),
        total_amount: Set(total_amount),
        paid_amount: Set(0),
        balance: Set(total_amount),
        status: Set(ExpenseStatus::Pending),
        due_date: Set(NaiveDate::from_ymd_opt(period.year, period.month as u32, 25).unwrap()),
        paid_at: Set(None),
        generated_by: Set("test".to_string()),
        created_at: Set(created_at),
        ..Default::default()
    }
    .insert(db)
    .await
}
