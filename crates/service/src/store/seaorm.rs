use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    SqlErr, TransactionTrait,
};
use uuid::Uuid;

use models::{
    billing::{self, BillingStatus},
    booking,
    booking_change_request::{self as change_request, ChangeRequestStatus},
    booking_technician,
    notification,
    quote::{self, QuoteStatus},
    user::{self, UserRole},
};

use super::repository::{BookingFilter, Store};
use crate::errors::ServiceError;

/// Postgres-backed store. Compound writes run in one transaction and
/// conditional writes are `UPDATE ... WHERE <expected state>`.
pub struct SeaOrmStore {
    pub db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

/// Unique violations become conflicts, pool/connection trouble is transient.
pub(crate) fn map_db_err(e: DbErr) -> ServiceError {
    if let Some(SqlErr::UniqueConstraintViolation(msg)) = e.sql_err() {
        return ServiceError::Conflict(msg);
    }
    match &e {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => ServiceError::Transient(e.to_string()),
        _ => ServiceError::Db(e.to_string()),
    }
}

async fn put_booking<C: ConnectionTrait>(
    conn: &C,
    mut next: booking::Model,
    expected_version: i32,
) -> Result<booking::Model, ServiceError> {
    next.version = expected_version + 1;
    let res = booking::Entity::update_many()
        .set(next.to_active())
        .filter(booking::Column::Id.eq(next.id))
        .filter(booking::Column::Version.eq(expected_version))
        .exec(conn)
        .await
        .map_err(map_db_err)?;
    if res.rows_affected == 0 {
        return Err(ServiceError::Conflict(format!("booking {} was modified concurrently", next.id)));
    }
    Ok(next)
}

#[async_trait]
impl Store for SeaOrmStore {
    async fn user_role(&self, user_id: Uuid) -> Result<Option<UserRole>, ServiceError> {
        let u = user::Entity::find_by_id(user_id).one(&self.db).await.map_err(map_db_err)?;
        Ok(u.map(|u| u.role))
    }

    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<Uuid>, ServiceError> {
        let users = user::Entity::find()
            .filter(user::Column::Role.eq(role))
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(users.into_iter().map(|u| u.id).collect())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<booking::Model>, ServiceError> {
        booking::Entity::find_by_id(id).one(&self.db).await.map_err(map_db_err)
    }

    async fn create_booking(&self, booking: booking::Model) -> Result<booking::Model, ServiceError> {
        booking.to_active().insert(&self.db).await.map_err(map_db_err)
    }

    async fn update_booking(&self, booking: booking::Model, expected_version: i32) -> Result<booking::Model, ServiceError> {
        put_booking(&self.db, booking, expected_version).await
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<booking::Model>, ServiceError> {
        let mut q = booking::Entity::find();
        if let Some(c) = filter.customer_id {
            q = q.filter(booking::Column::CustomerId.eq(c));
        }
        if let Some(s) = filter.status {
            q = q.filter(booking::Column::Status.eq(s));
        }
        if let Some(t) = filter.technician_id {
            let ids: Vec<Uuid> = booking_technician::Entity::find()
                .filter(booking_technician::Column::TechnicianId.eq(t))
                .all(&self.db)
                .await
                .map_err(map_db_err)?
                .into_iter()
                .map(|a| a.booking_id)
                .collect();
            q = q.filter(booking::Column::Id.is_in(ids));
        }
        q.order_by_asc(booking::Column::ScheduledAt)
            .order_by_asc(booking::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn confirm_booking(
        &self,
        booking: booking::Model,
        expected_version: i32,
        technicians: Vec<booking_technician::Model>,
    ) -> Result<(booking::Model, Vec<booking_technician::Model>), ServiceError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let updated = put_booking(&txn, booking, expected_version).await?;
        if !technicians.is_empty() {
            booking_technician::Entity::insert_many(technicians.iter().map(|t| t.to_active()))
                .exec_without_returning(&txn)
                .await
                .map_err(map_db_err)?;
        }
        txn.commit().await.map_err(map_db_err)?;
        Ok((updated, technicians))
    }

    async fn list_technicians(&self, booking_id: Uuid) -> Result<Vec<booking_technician::Model>, ServiceError> {
        booking_technician::Entity::find()
            .filter(booking_technician::Column::BookingId.eq(booking_id))
            .order_by_asc(booking_technician::Column::AssignedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn get_change_request(&self, id: Uuid) -> Result<Option<change_request::Model>, ServiceError> {
        change_request::Entity::find_by_id(id).one(&self.db).await.map_err(map_db_err)
    }

    async fn create_change_request(&self, request: change_request::Model) -> Result<change_request::Model, ServiceError> {
        // uniq_change_request_pending turns a second PENDING row into a conflict
        request.to_active().insert(&self.db).await.map_err(map_db_err)
    }

    async fn resolve_change_request(
        &self,
        request: change_request::Model,
        reschedule: Option<(booking::Model, i32)>,
    ) -> Result<(change_request::Model, Option<booking::Model>), ServiceError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let res = change_request::Entity::update_many()
            .set(request.to_active())
            .filter(change_request::Column::Id.eq(request.id))
            .filter(change_request::Column::Status.eq(ChangeRequestStatus::Pending))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        if res.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!("change request {} already resolved", request.id)));
        }
        let booking = match reschedule {
            Some((b, expected)) => Some(put_booking(&txn, b, expected).await?),
            None => None,
        };
        txn.commit().await.map_err(map_db_err)?;
        Ok((request, booking))
    }

    async fn list_change_requests(&self, booking_id: Uuid) -> Result<Vec<change_request::Model>, ServiceError> {
        change_request::Entity::find()
            .filter(change_request::Column::BookingId.eq(booking_id))
            .order_by_asc(change_request::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn get_quote(&self, id: Uuid) -> Result<Option<quote::Model>, ServiceError> {
        quote::Entity::find_by_id(id).one(&self.db).await.map_err(map_db_err)
    }

    async fn create_quote(&self, quote: quote::Model) -> Result<quote::Model, ServiceError> {
        quote.to_active().insert(&self.db).await.map_err(map_db_err)
    }

    async fn update_quote(&self, quote: quote::Model, expected_status: QuoteStatus) -> Result<quote::Model, ServiceError> {
        let res = quote::Entity::update_many()
            .set(quote.to_active())
            .filter(quote::Column::Id.eq(quote.id))
            .filter(quote::Column::Status.eq(expected_status))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        if res.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!("quote {} is no longer {}", quote.id, expected_status)));
        }
        Ok(quote)
    }

    async fn approve_quote(
        &self,
        quote: quote::Model,
        billing: billing::Model,
    ) -> Result<(quote::Model, billing::Model), ServiceError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let res = quote::Entity::update_many()
            .set(quote.to_active())
            .filter(quote::Column::Id.eq(quote.id))
            .filter(quote::Column::Status.eq(QuoteStatus::Pending))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        if res.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!("quote {} already settled", quote.id)));
        }
        let billing = billing.to_active().insert(&txn).await.map_err(map_db_err)?;
        txn.commit().await.map_err(map_db_err)?;
        Ok((quote, billing))
    }

    async fn list_quotes(&self, booking_id: Uuid) -> Result<Vec<quote::Model>, ServiceError> {
        quote::Entity::find()
            .filter(quote::Column::BookingId.eq(booking_id))
            .order_by_asc(quote::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn get_billing(&self, id: Uuid) -> Result<Option<billing::Model>, ServiceError> {
        billing::Entity::find_by_id(id).one(&self.db).await.map_err(map_db_err)
    }

    async fn find_billing_by_quote(&self, quote_id: Uuid) -> Result<Option<billing::Model>, ServiceError> {
        billing::Entity::find()
            .filter(billing::Column::QuoteId.eq(quote_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn update_billing(&self, billing: billing::Model, expected_status: BillingStatus) -> Result<billing::Model, ServiceError> {
        let res = billing::Entity::update_many()
            .set(billing.to_active())
            .filter(billing::Column::Id.eq(billing.id))
            .filter(billing::Column::Status.eq(expected_status))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        if res.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!("billing {} is no longer {}", billing.id, expected_status)));
        }
        Ok(billing)
    }

    async fn list_billings(&self, booking_id: Uuid) -> Result<Vec<billing::Model>, ServiceError> {
        billing::Entity::find()
            .filter(billing::Column::BookingId.eq(booking_id))
            .order_by_asc(billing::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn create_notification(&self, notification: notification::Model) -> Result<notification::Model, ServiceError> {
        notification.to_active().insert(&self.db).await.map_err(map_db_err)
    }

    async fn get_notification(&self, id: Uuid) -> Result<Option<notification::Model>, ServiceError> {
        notification::Entity::find_by_id(id).one(&self.db).await.map_err(map_db_err)
    }

    async fn update_notification(&self, notification: notification::Model) -> Result<notification::Model, ServiceError> {
        match notification.to_active().update(&self.db).await {
            Ok(m) => Ok(m),
            Err(DbErr::RecordNotUpdated) => Err(ServiceError::not_found("notification")),
            Err(e) => Err(map_db_err(e)),
        }
    }

    async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<notification::Model>, ServiceError> {
        notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use models::booking::{BookingStatus, ServicePreferences};
    use crate::test_support::get_db;

    async fn seed_booking(store: &SeaOrmStore) -> anyhow::Result<booking::Model> {
        let now = Utc::now().fixed_offset();
        let customer = user::Model { id: Uuid::new_v4(), name: "Store Test".into(), role: UserRole::Customer, created_at: now };
        customer.to_active().insert(&store.db).await?;
        let b = booking::Model {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            car_id: Uuid::new_v4(),
            service_id: None,
            pack_id: Some(Uuid::new_v4()),
            scheduled_at: now,
            status: BookingStatus::Confirmed,
            customer_notes: None,
            service_preferences: ServicePreferences::default(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        Ok(store.create_booking(b).await?)
    }

    #[tokio::test]
    async fn stale_booking_version_conflicts() -> anyhow::Result<()> {
        let Some(db) = get_db().await else { return Ok(()) };
        let store = SeaOrmStore::new(db);
        let b = seed_booking(&store).await?;
        let updated = store.update_booking(b.clone(), 1).await?;
        assert_eq!(updated.version, 2);
        let err = store.update_booking(b, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        Ok(())
    }

    #[tokio::test]
    async fn second_pending_change_request_conflicts() -> anyhow::Result<()> {
        let Some(db) = get_db().await else { return Ok(()) };
        let store = SeaOrmStore::new(db);
        let b = seed_booking(&store).await?;
        let now = Utc::now().fixed_offset();
        let request = |id| change_request::Model {
            id,
            booking_id: b.id,
            requested_at: now,
            status: ChangeRequestStatus::Pending,
            created_at: now,
            resolved_at: None,
        };
        store.create_change_request(request(Uuid::new_v4())).await?;
        let err = store.create_change_request(request(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        Ok(())
    }

    #[tokio::test]
    async fn approve_quote_is_single_shot() -> anyhow::Result<()> {
        let Some(db) = get_db().await else { return Ok(()) };
        let store = SeaOrmStore::new(db);
        let b = seed_booking(&store).await?;
        let now = Utc::now().fixed_offset();
        let q = store
            .create_quote(quote::Model { id: Uuid::new_v4(), booking_id: b.id, amount: 1500, status: QuoteStatus::Pending, created_at: now, updated_at: now })
            .await?;
        let approved = quote::Model { status: QuoteStatus::Approved, ..q.clone() };
        let bill = |id| billing::Model {
            id,
            quote_id: q.id,
            booking_id: b.id,
            amount: 1500,
            status: BillingStatus::Unpaid,
            created_at: now,
            paid_at: None,
        };
        store.approve_quote(approved.clone(), bill(Uuid::new_v4())).await?;
        let err = store.approve_quote(approved, bill(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(store.list_billings(b.id).await?.len(), 1);
        Ok(())
    }
}
