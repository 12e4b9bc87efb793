//! Refund request entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "refund_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub payment_id: String,
    #[sea_orm(nullable)]
    pub booking_id: Option<String>,
    pub parent_id: String,

    pub requested_amount: i64,
    pub reason: String,

    /// PENDING | APPROVED | REJECTED
    pub status: String,

    #[sea_orm(nullable)]
    pub resolved_by: Option<String>,
    #[sea_orm(nullable)]
    pub resolved_at: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub resolution_note: Option<String>,

    pub created_at: DateTimeUtc,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payment::Entity",
        from = "Column::PaymentId",
        to = "super::payment::Column::Id"
    )]
    Payment,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
