use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;

/// Payment state of a consolidated expense, derived from `balance` and
/// `paid_amount` after every allocation or reversal. `Overdue` is set by an
/// external scheduling flow and behaves like Pending/Partial for
/// allocation. `Cancelled` documents are not collectible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ExpenseStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Partial")]
    Partial,
    #[sea_orm(string_value = "Paid")]
    Paid,
    #[sea_orm(string_value = "Overdue")]
    Overdue,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

/// One billing document per owner per period, aggregating base and water
/// charges over all the owner's properties plus debt carried forward.
/// Exactly one row per (period, owner), enforced by a unique constraint.
/// All money columns are whole currency units; `balance` always equals
/// `total_amount - paid_amount`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "consolidated_expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub period_id: i32,
    pub owner_id: i32,
    /// The owner's principal property at generation time, for display.
    pub primary_property_id: Option<i32>,
    pub base_amount: i64,
    pub water_amount: i64,
    /// Extra charges outside base and water; currently always 0 from the
    /// generator, kept for the document layout.
    #[sea_orm(default_value = "0")]
    pub other_amount: i64,
    /// Unpaid balance carried from strictly earlier periods.
    pub previous_debt: i64,
    pub total_amount: i64,
    #[sea_orm(default_value = "0")]
    pub paid_amount: i64,
    pub balance: i64,
    pub status: ExpenseStatus,
    pub due_date: NaiveDate,
    pub paid_at: Option<NaiveDateTime>,
    /// Acting user who requested the generation run.
    pub generated_by: String,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::billing_period::Entity",
        from = "Column::PeriodId",
        to = "super::billing_period::Column::Id",
        on_delete = "Restrict"
    )]
    BillingPeriod,
    #[sea_orm(
        belongs_to = "super::owner::Entity",
        from = "Column::OwnerId",
        to = "super::owner::Column::Id",
        on_delete = "Restrict"
    )]
    Owner,
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PrimaryPropertyId",
        to = "super::property::Column::Id",
        on_delete = "SetNull"
    )]
    PrimaryProperty,
    #[sea_orm(has_many = "super::expense_detail::Entity")]
    ExpenseDetail,
    #[sea_orm(has_many = "super::payment_allocation::Entity")]
    PaymentAllocation,
}

impl Related<super::billing_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillingPeriod.def()
    }
}

impl Related<super::owner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::expense_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseDetail.def()
    }
}

impl Related<super::payment_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentAllocation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
