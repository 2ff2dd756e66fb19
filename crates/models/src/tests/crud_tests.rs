use chrono::Utc;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::booking::{self, BookingStatus, ServicePreferences};
use crate::quote::{self, QuoteStatus};
use crate::user::{self, UserRole};
use crate::{db, notification};

async fn setup_test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let db = match db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {}", e);
            return None;
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("skip: migrate up failed: {}", e);
        return None;
    }
    Some(db)
}

fn sample_booking(customer_id: Uuid) -> booking::Model {
    let now = Utc::now().into();
    booking::Model {
        id: Uuid::new_v4(),
        customer_id,
        car_id: Uuid::new_v4(),
        service_id: Some(Uuid::new_v4()),
        pack_id: None,
        scheduled_at: (Utc::now() + chrono::Duration::days(2)).into(),
        status: BookingStatus::Pending,
        customer_notes: Some("rattle at 80 km/h".into()),
        service_preferences: ServicePreferences { need_extra_filter: true, ..Default::default() },
        version: 1,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn booking_round_trip_keeps_enum_and_json_columns() -> anyhow::Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let customer = user::Model { id: Uuid::new_v4(), name: "Dana".into(), role: UserRole::Customer, created_at: Utc::now().into() };
    customer.to_active().insert(&db).await?;

    let b = sample_booking(customer.id);
    b.to_active().insert(&db).await?;

    let found = booking::Entity::find_by_id(b.id).one(&db).await?.expect("booking stored");
    assert_eq!(found.status, BookingStatus::Pending);
    assert!(found.service_preferences.need_extra_filter);
    assert_eq!(found.version, 1);

    let q = quote::Model { id: Uuid::new_v4(), booking_id: b.id, amount: 1500, status: QuoteStatus::Pending, created_at: Utc::now().into(), updated_at: Utc::now().into() };
    q.to_active().insert(&db).await?;
    let quotes = quote::Entity::find().filter(quote::Column::BookingId.eq(b.id)).all(&db).await?;
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].amount, 1500);

    // cleanup
    quote::Entity::delete_by_id(q.id).exec(&db).await?;
    booking::Entity::delete_by_id(b.id).exec(&db).await?;
    user::Entity::delete_by_id(customer.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn notification_defaults_to_unread() -> anyhow::Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let n = notification::Model {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        title: "Quote ready".into(),
        message: "A quote of 1500 is waiting for you".into(),
        read: false,
        created_at: Utc::now().into(),
    };
    n.to_active().insert(&db).await?;
    let found = notification::Entity::find_by_id(n.id).one(&db).await?.expect("notification stored");
    assert!(!found.read);

    notification::Entity::delete_by_id(n.id).exec(&db).await?;
    Ok(())
}
