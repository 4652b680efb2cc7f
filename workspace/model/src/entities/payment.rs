use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    /// Set by reversal; a cancelled payment cannot be allocated or reversed
    /// again.
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

/// A registered payment from an owner. Created by the external registration
/// flow (which owns receipt numbering and any gateway metadata) before the
/// allocator is invoked. Amount is in whole currency units.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Monotonically increasing, globally unique receipt number.
    #[sea_orm(unique)]
    pub receipt_number: i64,
    pub owner_id: i32,
    pub amount: i64,
    pub payment_date: NaiveDate,
    /// Period the payer intended to cover, when stated on the receipt.
    /// Falls back to the payment date's calendar month for credit math.
    pub period_id: Option<i32>,
    /// Free-form reference, e.g. a bank transfer or gateway id.
    pub reference: Option<String>,
    pub status: PaymentStatus,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<String>,
    pub cancelled_at: Option<NaiveDateTime>,
    pub created_by: String,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::owner::Entity",
        from = "Column::OwnerId",
        to = "super::owner::Column::Id",
        on_delete = "Restrict"
    )]
    Owner,
    #[sea_orm(
        belongs_to = "super::billing_period::Entity",
        from = "Column::PeriodId",
        to = "super::billing_period::Column::Id",
        on_delete = "SetNull"
    )]
    BillingPeriod,
    #[sea_orm(has_many = "super::payment_allocation::Entity")]
    PaymentAllocation,
    #[sea_orm(has_many = "super::cash_transaction::Entity")]
    CashTransaction,
}

impl Related<super::owner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::billing_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillingPeriod.def()
    }
}

impl Related<super::payment_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentAllocation.def()
    }
}

impl Related<super::cash_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
