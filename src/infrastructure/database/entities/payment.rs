//! Payment entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub parent_id: String,
    pub therapist_id: String,
    pub child_id: String,

    /// CONSULTATION | THERAPY
    pub session_type: String,
    pub total_sessions: i32,

    pub original_fee: i64,
    pub discount_rate: i32,
    pub final_fee: i64,
    pub refunded_amount: i64,

    /// PENDING_PAYMENT | PAID | PARTIALLY_REFUNDED | REFUNDED | FAILED
    pub status: String,
    pub completed_sessions: i32,

    #[sea_orm(nullable)]
    pub paid_at: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub settlement_amount: Option<i64>,
    #[sea_orm(nullable)]
    pub settled_at: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub settlement_note: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::refund_request::Entity")]
    RefundRequests,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::refund_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RefundRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
