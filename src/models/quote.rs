use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quotes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub request_id: i32,
    pub item_price: f64,
    pub shipping_cost: f64,
    pub service_fee: f64,
    pub total_amount: f64,
    pub currency: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
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
}

impl Related<super::sourcing_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SourcingRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
