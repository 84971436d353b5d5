use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "request_messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub request_id: i32,
    pub sender_id: i32,
    pub message: String,
    pub client_ref: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sourcing_request::Entity",
        from = "Column::RequestId",
        to = "super::sourcing_request::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    SourcingRequest,
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::SenderId",
        to = "super::profile::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Sender,
}

impl Related<super::sourcing_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SourcingRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
