use sea_orm::*;

use crate::auth::hash_password;
use crate::models::{profile, sourcing_request};

pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    // 1. Create Profiles
    let admin_password = hash_password("admin1234").unwrap();
    let agent_password = hash_password("agent1234").unwrap();
    let customer_password = hash_password("customer1234").unwrap();

    let now = chrono::Utc::now().to_rfc3339();

    let admin = profile::ActiveModel {
        email: Set("admin@partslink.test".to_owned()),
        password_hash: Set(admin_password),
        role: Set("admin".to_owned()),
        full_name: Set("Admin".to_owned()),
        suspended: Set(false),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    };

    let agent = profile::ActiveModel {
        email: Set("agent@partslink.test".to_owned()),
        password_hash: Set(agent_password),
        role: Set("agent".to_owned()),
        full_name: Set("Demo Agent".to_owned()),
        suspended: Set(false),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    };

    let customer = profile::ActiveModel {
        email: Set("customer@partslink.test".to_owned()),
        password_hash: Set(customer_password),
        role: Set("customer".to_owned()),
        full_name: Set("Demo Customer".to_owned()),
        country: Set(Some("AE".to_owned())),
        suspended: Set(false),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    };

    for user in [admin, agent, customer] {
        profile::Entity::insert(user)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(profile::Column::Email)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await?;
    }

    // 2. Create a sample sourcing request for the demo customer
    if let Some(customer) = profile::Entity::find()
        .filter(profile::Column::Email.eq("customer@partslink.test"))
        .one(db)
        .await?
    {
        let existing = sourcing_request::Entity::find()
            .filter(sourcing_request::Column::UserId.eq(customer.id))
            .count(db)
            .await?;

        if existing == 0 {
            sourcing_request::ActiveModel {
                user_id: Set(customer.id),
                part_name: Set("Front brake pads".to_owned()),
                vin: Set(Some("1HGBH41JXMN109186".to_owned())),
                vehicle_info: Set(Some("Honda Accord 2018".to_owned())),
                images: Set("[]".to_owned()),
                status: Set("pending".to_owned()),
                created_at: Set(now.clone()),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    Ok(())
}
