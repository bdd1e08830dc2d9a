//! Database repository for CRUD operations.
//!
//! This is the gateway every other module talks to: table-style reads and
//! writes, head-only counts, and predicate deletes.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::feed::{tables, ChangeEvent, ChangeFeed, ChangeKind};
use crate::errors::AppError;
use crate::models::{
    ActivityLog, CategoryBucket, CreateNotificationRequest, Credential, Location, Medicine,
    NewActivity,
    NotificationType, Pharmacy, RawNotification, RevisionInfo, SaveLocationRequest,
    SaveMedicineRequest, SavePharmacyRequest, SaveUserRequest, StockItem, User, UserRole,
    UserStatus,
};
use crate::stats::stock_status;

/// Id no notification can have; `delete_notifications_except` uses it to
/// express "every row" as a predicate.
pub const SENTINEL_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl Repository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        Self { pool, feed }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = timestamp_now();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    /// Bump the revision and announce the write on the change feed.
    async fn record_write(&self, table: &'static str, kind: ChangeKind) -> Result<i64, AppError> {
        let revision_id = self.increment_revision().await?;
        self.feed.publish(ChangeEvent {
            table,
            kind,
            revision_id,
        });
        Ok(revision_id)
    }

    // ==================== LOCATION OPERATIONS ====================

    /// List locations, optionally restricted to one bucket.
    pub async fn list_locations(
        &self,
        bucket: Option<CategoryBucket>,
    ) -> Result<Vec<Location>, AppError> {
        let rows = match bucket {
            Some(bucket) => {
                sqlx::query(
                    "SELECT id, building_type, name, description, building, opening_hours, image, tags, latitude, longitude, created_at, updated_at FROM locations WHERE building_type = ? ORDER BY name"
                )
                .bind(bucket.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, building_type, name, description, building, opening_hours, image, tags, latitude, longitude, created_at, updated_at FROM locations ORDER BY building_type, name"
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(location_from_row).collect()
    }

    /// Get a location by ID.
    pub async fn get_location(&self, id: &str) -> Result<Option<Location>, AppError> {
        let row = sqlx::query(
            "SELECT id, building_type, name, description, building, opening_hours, image, tags, latitude, longitude, created_at, updated_at FROM locations WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(location_from_row).transpose()
    }

    /// Head-only count of the locations in one bucket.
    pub async fn count_locations(&self, bucket: CategoryBucket) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM locations WHERE building_type = ?")
            .bind(bucket.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("total"))
    }

    /// Create a new location.
    pub async fn create_location(
        &self,
        request: &SaveLocationRequest,
    ) -> Result<Location, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp_now();
        let tags_json = serde_json::to_string(&request.tags)?;

        sqlx::query(
            "INSERT INTO locations (id, building_type, name, description, building, opening_hours, image, tags, latitude, longitude, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(request.bucket.as_str())
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.building)
        .bind(&request.opening_hours)
        .bind(&request.image)
        .bind(&tags_json)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.record_write(tables::LOCATIONS, ChangeKind::Insert)
            .await?;

        Ok(location_from_request(id, request, now.clone(), now))
    }

    /// Replace every field of a location. Returns the saved location and the
    /// bucket it was in before, which differs when the bucket was changed.
    pub async fn replace_location(
        &self,
        id: &str,
        request: &SaveLocationRequest,
    ) -> Result<(Location, CategoryBucket), AppError> {
        let existing = self
            .get_location(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Location {} not found", id)))?;

        let now = timestamp_now();
        let tags_json = serde_json::to_string(&request.tags)?;

        sqlx::query(
            "UPDATE locations SET building_type = ?, name = ?, description = ?, building = ?, opening_hours = ?, image = ?, tags = ?, latitude = ?, longitude = ?, updated_at = ? WHERE id = ?"
        )
        .bind(request.bucket.as_str())
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.building)
        .bind(&request.opening_hours)
        .bind(&request.image)
        .bind(&tags_json)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.record_write(tables::LOCATIONS, ChangeKind::Update)
            .await?;

        let location = location_from_request(id.to_string(), request, existing.created_at, now);
        Ok((location, existing.bucket))
    }

    /// Delete a location, returning the removed row.
    pub async fn delete_location(&self, id: &str) -> Result<Location, AppError> {
        let existing = self
            .get_location(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Location {} not found", id)))?;

        sqlx::query("DELETE FROM locations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.record_write(tables::LOCATIONS, ChangeKind::Delete)
            .await?;
        Ok(existing)
    }

    // ==================== NOTIFICATION OPERATIONS ====================

    /// List every notification, newest first.
    pub async fn list_notifications(&self) -> Result<Vec<RawNotification>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, message, type, pharmacy_id, created_at FROM notifications ORDER BY created_at DESC, rowid DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(notification_from_row).collect()
    }

    /// Insert a notification stamped with `created_at`.
    pub async fn create_notification(
        &self,
        request: &CreateNotificationRequest,
        created_at: DateTime<Utc>,
    ) -> Result<RawNotification, AppError> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO notifications (id, title, message, type, pharmacy_id, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&request.title)
        .bind(&request.message)
        .bind(request.kind.as_str())
        .bind(&request.pharmacy_id)
        .bind(format_timestamp(created_at))
        .execute(&self.pool)
        .await?;

        self.record_write(tables::NOTIFICATIONS, ChangeKind::Insert)
            .await?;

        Ok(RawNotification {
            id,
            title: request.title.clone(),
            message: request.message.clone(),
            kind: request.kind,
            created_at,
            pharmacy_id: request.pharmacy_id.clone(),
        })
    }

    /// Delete exactly the given notification ids.
    pub async fn delete_notifications(&self, ids: &[String]) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM notifications WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let result = builder.build().execute(&self.pool).await?;

        self.record_write(tables::NOTIFICATIONS, ChangeKind::Delete)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete every notification whose id differs from `sentinel`.
    pub async fn delete_notifications_except(&self, sentinel: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id != ?")
            .bind(sentinel)
            .execute(&self.pool)
            .await?;

        self.record_write(tables::NOTIFICATIONS, ChangeKind::Delete)
            .await?;
        Ok(result.rows_affected())
    }

    // ==================== PHARMACY OPERATIONS ====================

    /// List all pharmacies.
    pub async fn list_pharmacies(&self) -> Result<Vec<Pharmacy>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, location, phone, email, description, image_url, open_hours, latitude, longitude, available, created_at, updated_at FROM pharmacies ORDER BY name"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(pharmacy_from_row).collect())
    }

    /// Get a pharmacy by ID.
    pub async fn get_pharmacy(&self, id: &str) -> Result<Option<Pharmacy>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, location, phone, email, description, image_url, open_hours, latitude, longitude, available, created_at, updated_at FROM pharmacies WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(pharmacy_from_row))
    }

    /// Create a new pharmacy.
    pub async fn create_pharmacy(
        &self,
        request: &SavePharmacyRequest,
    ) -> Result<Pharmacy, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp_now();

        sqlx::query(
            "INSERT INTO pharmacies (id, name, location, phone, email, description, image_url, open_hours, latitude, longitude, available, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&request.name)
        .bind(&request.location)
        .bind(&request.phone)
        .bind(&request.email)
        .bind(&request.description)
        .bind(&request.image_url)
        .bind(&request.open_hours)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(request.available as i32)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.record_write(tables::PHARMACIES, ChangeKind::Insert)
            .await?;

        Ok(pharmacy_from_request(id, request, now.clone(), now))
    }

    /// Replace every field of a pharmacy.
    pub async fn replace_pharmacy(
        &self,
        id: &str,
        request: &SavePharmacyRequest,
    ) -> Result<Pharmacy, AppError> {
        let existing = self
            .get_pharmacy(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pharmacy {} not found", id)))?;

        let now = timestamp_now();

        sqlx::query(
            "UPDATE pharmacies SET name = ?, location = ?, phone = ?, email = ?, description = ?, image_url = ?, open_hours = ?, latitude = ?, longitude = ?, available = ?, updated_at = ? WHERE id = ?"
        )
        .bind(&request.name)
        .bind(&request.location)
        .bind(&request.phone)
        .bind(&request.email)
        .bind(&request.description)
        .bind(&request.image_url)
        .bind(&request.open_hours)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(request.available as i32)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.record_write(tables::PHARMACIES, ChangeKind::Update)
            .await?;

        Ok(pharmacy_from_request(
            id.to_string(),
            request,
            existing.created_at,
            now,
        ))
    }

    /// Delete a pharmacy, returning the removed row. Its stock rows go with it.
    pub async fn delete_pharmacy(&self, id: &str) -> Result<Pharmacy, AppError> {
        let existing = self
            .get_pharmacy(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pharmacy {} not found", id)))?;

        sqlx::query("DELETE FROM pharmacies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.record_write(tables::PHARMACIES, ChangeKind::Delete)
            .await?;
        Ok(existing)
    }

    // ==================== MEDICINE OPERATIONS ====================

    /// List all medicines ordered by name.
    pub async fn list_medicines(&self) -> Result<Vec<Medicine>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, category, price, stock, created_at, updated_at FROM medicines ORDER BY name"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(medicine_from_row).collect())
    }

    /// Get a medicine by ID.
    pub async fn get_medicine(&self, id: &str) -> Result<Option<Medicine>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, category, price, stock, created_at, updated_at FROM medicines WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(medicine_from_row))
    }

    /// Create a new medicine.
    pub async fn create_medicine(
        &self,
        request: &SaveMedicineRequest,
    ) -> Result<Medicine, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp_now();

        sqlx::query(
            "INSERT INTO medicines (id, name, category, price, stock, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&request.name)
        .bind(&request.category)
        .bind(request.price)
        .bind(request.stock)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.record_write(tables::MEDICINES, ChangeKind::Insert)
            .await?;

        Ok(Medicine {
            id,
            name: request.name.clone(),
            category: request.category.clone(),
            price: request.price,
            stock: request.stock,
            status: stock_status(request.stock),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Replace a medicine. Returns the saved row and the stock it had before.
    pub async fn replace_medicine(
        &self,
        id: &str,
        request: &SaveMedicineRequest,
    ) -> Result<(Medicine, i64), AppError> {
        let existing = self
            .get_medicine(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Medicine {} not found", id)))?;

        let now = timestamp_now();

        sqlx::query(
            "UPDATE medicines SET name = ?, category = ?, price = ?, stock = ?, updated_at = ? WHERE id = ?"
        )
        .bind(&request.name)
        .bind(&request.category)
        .bind(request.price)
        .bind(request.stock)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.record_write(tables::MEDICINES, ChangeKind::Update)
            .await?;

        let medicine = Medicine {
            id: id.to_string(),
            name: request.name.clone(),
            category: request.category.clone(),
            price: request.price,
            stock: request.stock,
            status: stock_status(request.stock),
            created_at: existing.created_at,
            updated_at: now,
        };
        Ok((medicine, existing.stock))
    }

    /// Delete a medicine, returning the removed row.
    pub async fn delete_medicine(&self, id: &str) -> Result<Medicine, AppError> {
        let existing = self
            .get_medicine(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Medicine {} not found", id)))?;

        sqlx::query("DELETE FROM medicines WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.record_write(tables::MEDICINES, ChangeKind::Delete)
            .await?;
        Ok(existing)
    }

    // ==================== PHARMACY STOCK OPERATIONS ====================

    /// Every medicine a pharmacy holds, joined with the medicine details.
    pub async fn list_pharmacy_stock(&self, pharmacy_id: &str) -> Result<Vec<StockItem>, AppError> {
        let rows = sqlx::query(
            r#"SELECT s.medicine_id, m.name, m.category, m.price, s.quantity
               FROM pharmacy_stock s
               JOIN medicines m ON m.id = s.medicine_id
               WHERE s.pharmacy_id = ?
               ORDER BY m.name"#,
        )
        .bind(pharmacy_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| StockItem {
                medicine_id: row.get("medicine_id"),
                name: row.get("name"),
                category: row.get("category"),
                price: row.get("price"),
                quantity: row.get("quantity"),
            })
            .collect())
    }

    /// Insert or overwrite the quantity a pharmacy holds of a medicine.
    pub async fn set_stock(
        &self,
        pharmacy_id: &str,
        medicine_id: &str,
        quantity: i64,
    ) -> Result<(), AppError> {
        if self.get_pharmacy(pharmacy_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Pharmacy {} not found",
                pharmacy_id
            )));
        }
        if self.get_medicine(medicine_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Medicine {} not found",
                medicine_id
            )));
        }

        sqlx::query(
            r#"INSERT INTO pharmacy_stock (pharmacy_id, medicine_id, quantity) VALUES (?, ?, ?)
               ON CONFLICT(pharmacy_id, medicine_id) DO UPDATE SET quantity = excluded.quantity"#,
        )
        .bind(pharmacy_id)
        .bind(medicine_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        self.record_write(tables::PHARMACY_STOCK, ChangeKind::Update)
            .await?;
        Ok(())
    }

    /// Stop tracking a medicine at a pharmacy.
    pub async fn remove_stock(&self, pharmacy_id: &str, medicine_id: &str) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM pharmacy_stock WHERE pharmacy_id = ? AND medicine_id = ?")
                .bind(pharmacy_id)
                .bind(medicine_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Medicine {} is not stocked by pharmacy {}",
                medicine_id, pharmacy_id
            )));
        }

        self.record_write(tables::PHARMACY_STOCK, ChangeKind::Delete)
            .await?;
        Ok(())
    }

    // ==================== USER OPERATIONS ====================

    /// List all users.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(
            "SELECT id, email, full_name, role, pharmacy_id, last_sign_in_at, must_change_password, created_at FROM users ORDER BY full_name"
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, full_name, role, pharmacy_id, last_sign_in_at, must_change_password, created_at FROM users WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Create a new user, with a sign-in credential when one is given. A
    /// duplicate email is a validation failure.
    pub async fn create_user(
        &self,
        request: &SaveUserRequest,
        credential: Option<&Credential>,
    ) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp_now();
        let must_change_password = credential.is_some_and(|c| c.must_change_password);

        sqlx::query(
            "INSERT INTO users (id, email, full_name, role, pharmacy_id, password_hash, must_change_password, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&request.email)
        .bind(&request.full_name)
        .bind(request.role.as_str())
        .bind(&request.pharmacy_id)
        .bind(credential.map(|c| c.password_hash.as_str()))
        .bind(must_change_password as i32)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_email(e, &request.email))?;

        self.record_write(tables::USERS, ChangeKind::Insert).await?;

        Ok(User {
            id,
            email: request.email.clone(),
            full_name: request.full_name.clone(),
            role: request.role,
            pharmacy_id: request.pharmacy_id.clone(),
            last_sign_in_at: None,
            status: UserStatus::Inactive,
            must_change_password,
            created_at: now,
        })
    }

    /// Look up a user by email (case-insensitive) together with its stored
    /// credential. Users without a password are returned with `None`.
    pub async fn find_user_credential(
        &self,
        email: &str,
    ) -> Result<Option<(User, Option<Credential>)>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, full_name, role, pharmacy_id, last_sign_in_at, must_change_password, password_hash, created_at FROM users WHERE email = ? COLLATE NOCASE"
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user = user_from_row(&row)?;
        let password_hash: Option<String> = row.get("password_hash");
        let credential = password_hash.map(|password_hash| Credential {
            password_hash,
            must_change_password: user.must_change_password,
        });
        Ok(Some((user, credential)))
    }

    /// Replace a user's password.
    pub async fn set_password(&self, id: &str, credential: &Credential) -> Result<User, AppError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = ?, must_change_password = ? WHERE id = ?")
                .bind(&credential.password_hash)
                .bind(credential.must_change_password as i32)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        self.record_write(tables::USERS, ChangeKind::Update).await?;
        self.get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Stamp a successful sign-in, which makes the user Active.
    pub async fn record_sign_in(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_sign_in_at = ? WHERE id = ?")
            .bind(timestamp_now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.record_write(tables::USERS, ChangeKind::Update).await?;
        Ok(())
    }

    /// Replace a user's editable fields.
    pub async fn replace_user(&self, id: &str, request: &SaveUserRequest) -> Result<User, AppError> {
        let existing = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        sqlx::query("UPDATE users SET email = ?, full_name = ?, role = ?, pharmacy_id = ? WHERE id = ?")
            .bind(&request.email)
            .bind(&request.full_name)
            .bind(request.role.as_str())
            .bind(&request.pharmacy_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| duplicate_email(e, &request.email))?;

        self.record_write(tables::USERS, ChangeKind::Update).await?;

        Ok(User {
            id: id.to_string(),
            email: request.email.clone(),
            full_name: request.full_name.clone(),
            role: request.role,
            pharmacy_id: request.pharmacy_id.clone(),
            last_sign_in_at: existing.last_sign_in_at,
            status: existing.status,
            must_change_password: existing.must_change_password,
            created_at: existing.created_at,
        })
    }

    /// Delete a user, returning the removed row.
    pub async fn delete_user(&self, id: &str) -> Result<User, AppError> {
        let existing = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.record_write(tables::USERS, ChangeKind::Delete).await?;
        Ok(existing)
    }

    // ==================== ACTIVITY LOG OPERATIONS ====================

    /// Append an audit entry.
    pub async fn log_activity(&self, activity: &NewActivity) -> Result<ActivityLog, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp_now();
        let details_json = serde_json::to_string(&activity.details)?;

        sqlx::query(
            "INSERT INTO activity_logs (id, action_type, entity_type, entity_id, details, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&activity.action_type)
        .bind(&activity.entity_type)
        .bind(&activity.entity_id)
        .bind(&details_json)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.record_write(tables::ACTIVITY_LOGS, ChangeKind::Insert)
            .await?;

        Ok(ActivityLog {
            id,
            action_type: activity.action_type.clone(),
            entity_type: activity.entity_type.clone(),
            entity_id: activity.entity_id.clone(),
            details: activity.details.clone(),
            created_at: now,
        })
    }

    /// Most recent audit entries, newest first.
    pub async fn list_activity(&self, limit: i64) -> Result<Vec<ActivityLog>, AppError> {
        let rows = sqlx::query(
            "SELECT id, action_type, entity_type, entity_id, details, created_at FROM activity_logs ORDER BY created_at DESC, rowid DESC LIMIT ?"
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let details: String = row.get("details");
                Ok(ActivityLog {
                    id: row.get("id"),
                    action_type: row.get("action_type"),
                    entity_type: row.get("entity_type"),
                    entity_id: row.get("entity_id"),
                    details: parse_json_column("details", &details)?,
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

fn duplicate_email(err: sqlx::Error, email: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Validation(format!("Email {} is already in use", email))
        }
        _ => err.into(),
    }
}

// Helper functions for row conversion

fn location_from_request(
    id: String,
    request: &SaveLocationRequest,
    created_at: String,
    updated_at: String,
) -> Location {
    Location {
        id,
        bucket: request.bucket,
        name: request.name.clone(),
        description: request.description.clone(),
        building: request.building.clone(),
        opening_hours: request.opening_hours.clone(),
        image: request.image.clone(),
        tags: request.tags.clone(),
        latitude: request.latitude,
        longitude: request.longitude,
        created_at,
        updated_at,
    }
}

fn pharmacy_from_request(
    id: String,
    request: &SavePharmacyRequest,
    created_at: String,
    updated_at: String,
) -> Pharmacy {
    Pharmacy {
        id,
        name: request.name.clone(),
        location: request.location.clone(),
        phone: request.phone.clone(),
        email: request.email.clone(),
        description: request.description.clone(),
        image_url: request.image_url.clone(),
        open_hours: request.open_hours.clone(),
        latitude: request.latitude,
        longitude: request.longitude,
        available: request.available,
        created_at,
        updated_at,
    }
}

fn location_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Location, AppError> {
    let building_type: String = row.get("building_type");
    let bucket = CategoryBucket::parse(&building_type).ok_or_else(|| {
        AppError::Database(format!("Unknown building type {:?}", building_type))
    })?;
    let tags_str: String = row.get("tags");

    Ok(Location {
        id: row.get("id"),
        bucket,
        name: row.get("name"),
        description: row.get("description"),
        building: row.get("building"),
        opening_hours: row.get("opening_hours"),
        image: row.get("image"),
        tags: parse_json_column("tags", &tags_str)?,
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn notification_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<RawNotification, AppError> {
    let kind_str: String = row.get("type");
    let kind = NotificationType::parse(&kind_str)
        .ok_or_else(|| AppError::Database(format!("Unknown notification type {:?}", kind_str)))?;
    let created_at_str: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| AppError::Database(format!("Invalid notification timestamp: {}", e)))?
        .with_timezone(&Utc);

    Ok(RawNotification {
        id: row.get("id"),
        title: row.get("title"),
        message: row.get("message"),
        kind,
        created_at,
        pharmacy_id: row.get("pharmacy_id"),
    })
}

fn pharmacy_from_row(row: &sqlx::sqlite::SqliteRow) -> Pharmacy {
    let available: i32 = row.get("available");
    Pharmacy {
        id: row.get("id"),
        name: row.get("name"),
        location: row.get("location"),
        phone: row.get("phone"),
        email: row.get("email"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        open_hours: row.get("open_hours"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        available: available != 0,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn medicine_from_row(row: &sqlx::sqlite::SqliteRow) -> Medicine {
    let stock: i64 = row.get("stock");
    Medicine {
        id: row.get("id"),
        name: row.get("name"),
        category: row.get("category"),
        price: row.get("price"),
        stock,
        status: stock_status(stock),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, AppError> {
    let role_str: String = row.get("role");
    let role = UserRole::parse(&role_str)
        .ok_or_else(|| AppError::Database(format!("Unknown user role {:?}", role_str)))?;
    let last_sign_in_at: Option<String> = row.get("last_sign_in_at");
    let must_change_password: i32 = row.get("must_change_password");

    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        role,
        pharmacy_id: row.get("pharmacy_id"),
        status: UserStatus::from_last_sign_in(last_sign_in_at.as_deref()),
        last_sign_in_at,
        must_change_password: must_change_password != 0,
        created_at: row.get("created_at"),
    })
}

fn parse_json_column<T: serde::de::DeserializeOwned>(
    column: &str,
    s: &str,
) -> Result<T, AppError> {
    serde_json::from_str(s)
        .map_err(|e| AppError::Database(format!("Malformed {} column: {}", column, e)))
}
