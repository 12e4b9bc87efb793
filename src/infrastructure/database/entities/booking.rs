//! Booking entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub payment_id: String,
    pub group_key: String,
    pub parent_id: String,
    pub therapist_id: String,
    pub child_id: String,
    pub slot_id: String,

    pub session_number: i32,
    pub scheduled_at: DateTimeUtc,
    pub fee_share: i64,

    /// PENDING_CONFIRMATION | CONFIRMED | PENDING_SETTLEMENT | SETTLEMENT_COMPLETED
    /// | CANCELLED | REJECTED | NO_SHOW
    pub status: String,
    pub refund_amount: i64,

    #[sea_orm(nullable)]
    pub therapist_note: Option<String>,
    #[sea_orm(nullable)]
    pub cancelled_by: Option<String>,
    #[sea_orm(nullable)]
    pub cancelled_at: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub completed_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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
    #[sea_orm(
        belongs_to = "super::time_slot::Entity",
        from = "Column::SlotId",
        to = "super::time_slot::Column::Id"
    )]
    TimeSlot,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl Related<super::time_slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimeSlot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
