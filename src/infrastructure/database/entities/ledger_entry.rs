//! Ledger entry entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// THERAPIST_PENALTY | PARENT_COMPENSATION | REFUND_ADJUSTMENT | CARRIED_DEFICIT
    pub kind: String,
    pub therapist_id: String,
    pub parent_id: String,

    #[sea_orm(nullable)]
    pub payment_id: Option<String>,
    #[sea_orm(nullable)]
    pub booking_id: Option<String>,

    pub amount: i64,

    /// Payment whose settlement consumed this entry
    #[sea_orm(nullable)]
    pub applied_to: Option<String>,
    #[sea_orm(nullable)]
    pub applied_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
