use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

/// The application of part of a payment to one consolidated expense.
/// The amounts of a payment's allocations never sum above the payment
/// amount; reversal deletes the rows after restoring the balances.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_allocations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub payment_id: i32,
    pub expense_id: i32,
    pub amount: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payment::Entity",
        from = "Column::PaymentId",
        to = "super::payment::Column::Id",
        on_delete = "Cascade"
    )]
    Payment,
    #[sea_orm(
        belongs_to = "super::consolidated_expense::Entity",
        from = "Column::ExpenseId",
        to = "super::consolidated_expense::Column::Id",
        on_delete = "Cascade"
    )]
    ConsolidatedExpense,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl Related<super::consolidated_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsolidatedExpense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
