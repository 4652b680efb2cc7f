use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;

/// Direction of a cash ledger entry. Amounts are always positive; the kind
/// carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum CashTransactionKind {
    #[sea_orm(string_value = "Income")]
    Income,
    #[sea_orm(string_value = "Expense")]
    Expense,
}

/// Append-only cash ledger. Allocation writes one Income entry for the
/// amount actually applied; reversal writes one offsetting Expense entry.
/// Rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cash_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub kind: CashTransactionKind,
    pub amount: i64,
    pub date: NaiveDate,
    pub description: String,
    pub payment_id: Option<i32>,
    pub created_by: String,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payment::Entity",
        from = "Column::PaymentId",
        to = "super::payment::Column::Id",
        on_delete = "SetNull"
    )]
    Payment,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
