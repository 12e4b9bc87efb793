//! Time slot entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "time_slots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub therapist_id: String,
    pub date: Date,
    /// Derived from `date`, 0 = Monday. Stored for index-backed weekday search.
    pub day_of_week: i32,
    pub start_time: Time,
    pub end_time: Time,

    pub is_available: bool,
    pub is_holiday: bool,
    pub is_buffer_blocked: bool,

    pub max_capacity: i32,
    pub current_bookings: i32,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
