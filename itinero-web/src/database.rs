//! SQLite-backed storage implementation
//!
//! Production implementations of the `UserStore` and `LeadStore` traits.
//! Email uniqueness is enforced by a UNIQUE constraint; the resulting
//! violation is re-classified as a domain `Conflict` and never leaked raw.

use crate::{WebError, WebResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itinero_applications::{LeadScope, LeadStore, NewLeadRecord, NewUserRecord, UserStore};
use itinero_core::{
    conflict_error, not_found_error, storage_error, ItineroResult, Lead, LeadFilter,
    LeadPriority, LeadStatus, Permission, Role, User,
};
use sqlx::{sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions, Row, SqlitePool};
use tracing::{error, info};

/// Open a SQLite pool for the given URL
///
/// File databases are created on demand (including parent directories);
/// in-memory databases are pinned to a single connection so every query
/// sees the same database.
pub async fn connect(database_url: &str) -> WebResult<SqlitePool> {
    info!("Connecting to database: {}", database_url);

    if database_url.contains(":memory:") {
        return SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .map_err(|e| WebError::Database(format!("failed to connect to database: {}", e)));
    }

    let db_path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
    if let Some(parent) = std::path::Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| WebError::Database(format!("failed to create directory: {}", e)))?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);

    SqlitePool::connect_with(options)
        .await
        .map_err(|e| WebError::Database(format!("failed to connect to database: {}", e)))
}

/// Create the schema if it does not exist yet
pub async fn create_tables(pool: &SqlitePool) -> WebResult<()> {
    let query = r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            permissions TEXT NOT NULL DEFAULT '[]',
            is_active INTEGER NOT NULL DEFAULT 1,
            created_by INTEGER,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        CREATE INDEX IF NOT EXISTS idx_users_created_by ON users(created_by);

        CREATE TABLE IF NOT EXISTS leads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT,
            phone TEXT,
            destination TEXT,
            status TEXT NOT NULL,
            priority TEXT NOT NULL,
            assigned_to INTEGER,
            created_by INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_leads_assigned_to ON leads(assigned_to);
        CREATE INDEX IF NOT EXISTS idx_leads_created_by ON leads(created_by);
        CREATE INDEX IF NOT EXISTS idx_leads_status ON leads(status);
    "#;

    sqlx::raw_sql(query).execute(pool).await.map_err(|e| {
        error!("Failed to create tables: {}", e);
        WebError::Database(format!("failed to create tables: {}", e))
    })?;

    info!("Database schema is up to date");
    Ok(())
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> ItineroResult<User> {
    let role: String = row.get("role");
    let role = role
        .parse::<Role>()
        .map_err(|e| storage_error!(format!("corrupt role in user record: {}", e), "database"))?;

    let permissions: String = row.get("permissions");
    let tags: Vec<String> = serde_json::from_str(&permissions)
        .map_err(|e| storage_error!(format!("corrupt permissions in user record: {}", e), "database"))?;
    let permissions = tags
        .iter()
        .map(|tag| tag.parse::<Permission>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| storage_error!(format!("corrupt permissions in user record: {}", e), "database"))?;

    let created_at: String = row.get("created_at");
    let created_at: DateTime<Utc> = created_at
        .parse()
        .map_err(|e| storage_error!(format!("corrupt timestamp in user record: {}", e), "database"))?;

    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        permissions,
        is_active: row.get("is_active"),
        created_by: row.get("created_by"),
        created_at,
    })
}

fn lead_from_row(row: &sqlx::sqlite::SqliteRow) -> ItineroResult<Lead> {
    let status: String = row.get("status");
    let status = status
        .parse::<LeadStatus>()
        .map_err(|e| storage_error!(format!("corrupt status in lead record: {}", e), "database"))?;

    let priority: String = row.get("priority");
    let priority = priority
        .parse::<LeadPriority>()
        .map_err(|e| storage_error!(format!("corrupt priority in lead record: {}", e), "database"))?;

    let created_at: String = row.get("created_at");
    let created_at: DateTime<Utc> = created_at
        .parse()
        .map_err(|e| storage_error!(format!("corrupt timestamp in lead record: {}", e), "database"))?;

    Ok(Lead {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        destination: row.get("destination"),
        status,
        priority,
        assigned_to: row.get("assigned_to"),
        created_by: row.get("created_by"),
        created_at,
    })
}

/// SQLite-backed user store
#[derive(Debug, Clone)]
pub struct SqlUserStore {
    pool: SqlitePool,
}

impl SqlUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqlUserStore {
    async fn insert(&self, record: NewUserRecord) -> ItineroResult<User> {
        let permissions: Vec<String> = record.permissions.iter().map(|p| p.to_string()).collect();
        let permissions_json = serde_json::to_string(&permissions)?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role, permissions, is_active, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.role.to_string())
        .bind(&permissions_json)
        .bind(record.created_by)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let duplicate_email =
                matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
            if duplicate_email {
                conflict_error!(format!("user with email '{}'", record.email), "database")
            } else {
                storage_error!("failed to insert user", "database", e)
            }
        })?;

        let id = result.last_insert_rowid();
        self.find_by_id(id)
            .await?
            .ok_or_else(|| storage_error!("inserted user vanished", "database"))
    }

    async fn find_by_id(&self, id: i64) -> ItineroResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error!("failed to query user by id", "database", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> ItineroResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error!("failed to query user by email", "database", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> ItineroResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error!("failed to update password", "database", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error!(format!("user {}", id), "database"));
        }
        Ok(())
    }

    async fn update_active(&self, id: i64, is_active: bool) -> ItineroResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error!("failed to update activation", "database", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error!(format!("user {}", id), "database"));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> ItineroResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error!("failed to delete user", "database", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error!(format!("user {}", id), "database"));
        }
        Ok(())
    }

    async fn list_created_by(&self, creator_id: i64) -> ItineroResult<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users WHERE created_by = ? ORDER BY id ASC")
            .bind(creator_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error!("failed to list users", "database", e))?;

        rows.iter().map(user_from_row).collect()
    }

    async fn list_all(&self) -> ItineroResult<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error!("failed to list users", "database", e))?;

        rows.iter().map(user_from_row).collect()
    }

    async fn count(&self) -> ItineroResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error!("failed to count users", "database", e))?;

        let count: i64 = row.get("count");
        Ok(count as u64)
    }
}

/// SQLite-backed lead store
#[derive(Debug, Clone)]
pub struct SqlLeadStore {
    pool: SqlitePool,
}

impl SqlLeadStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for SqlLeadStore {
    async fn insert(&self, record: NewLeadRecord) -> ItineroResult<Lead> {
        let result = sqlx::query(
            r#"
            INSERT INTO leads (name, email, phone, destination, status, priority, assigned_to, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.destination)
        .bind(record.status.to_string())
        .bind(record.priority.to_string())
        .bind(record.assigned_to)
        .bind(record.created_by)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error!("failed to insert lead", "database", e))?;

        let id = result.last_insert_rowid();
        self.find_by_id(id)
            .await?
            .ok_or_else(|| storage_error!("inserted lead vanished", "database"))
    }

    async fn find_by_id(&self, id: i64) -> ItineroResult<Option<Lead>> {
        let row = sqlx::query("SELECT * FROM leads WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error!("failed to query lead by id", "database", e))?;

        row.as_ref().map(lead_from_row).transpose()
    }

    async fn list(&self, scope: LeadScope, filter: &LeadFilter) -> ItineroResult<Vec<Lead>> {
        // All predicates are ANDed; bind order must track clause order
        let mut sql = String::from("SELECT * FROM leads WHERE 1 = 1");
        if matches!(scope, LeadScope::Actor(_)) {
            sql.push_str(" AND (assigned_to = ? OR created_by = ?)");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.priority.is_some() {
            sql.push_str(" AND priority = ?");
        }
        if filter.search.is_some() {
            sql.push_str(
                " AND (LOWER(name) LIKE ? OR LOWER(email) LIKE ? OR LOWER(destination) LIKE ?)",
            );
        }
        sql.push_str(" ORDER BY id ASC LIMIT ? OFFSET ?");

        let mut query = sqlx::query(&sql);
        if let LeadScope::Actor(actor_id) = scope {
            query = query.bind(actor_id).bind(actor_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status.to_string());
        }
        if let Some(priority) = filter.priority {
            query = query.bind(priority.to_string());
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search.to_lowercase());
            query = query.bind(pattern.clone()).bind(pattern.clone()).bind(pattern);
        }
        query = query
            .bind(filter.effective_limit() as i64)
            .bind(filter.effective_offset() as i64);

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error!("failed to list leads", "database", e))?;

        rows.iter().map(lead_from_row).collect()
    }

    async fn update_status(&self, id: i64, status: LeadStatus) -> ItineroResult<()> {
        let result = sqlx::query("UPDATE leads SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error!("failed to update lead status", "database", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error!(format!("lead {}", id), "database"));
        }
        Ok(())
    }

    async fn assign(&self, id: i64, assignee: Option<i64>) -> ItineroResult<()> {
        let result = sqlx::query("UPDATE leads SET assigned_to = ? WHERE id = ?")
            .bind(assignee)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error!("failed to assign lead", "database", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error!(format!("lead {}", id), "database"));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> ItineroResult<()> {
        let result = sqlx::query("DELETE FROM leads WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error!("failed to delete lead", "database", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error!(format!("lead {}", id), "database"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itinero_core::ItineroError;

    async fn test_pool() -> SqlitePool {
        let pool = connect("sqlite::memory:").await.unwrap();
        create_tables(&pool).await.unwrap();
        pool
    }

    fn user_record(email: &str, role: Role, created_by: Option<i64>) -> NewUserRecord {
        NewUserRecord {
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "opaque".to_string(),
            role,
            permissions: vec![Permission::Leads, Permission::Quotes],
            created_by,
        }
    }

    #[tokio::test]
    async fn insert_and_round_trip_user() {
        let store = SqlUserStore::new(test_pool().await);

        let user = store
            .insert(user_record("root@agency.test", Role::Super, None))
            .await
            .unwrap();
        assert_eq!(user.id, 1);
        assert!(user.is_active);
        assert_eq!(user.created_by, None);

        let loaded = store.find_by_email("root@agency.test").await.unwrap().unwrap();
        assert_eq!(loaded.id, user.id);
        assert_eq!(loaded.role, Role::Super);
        assert_eq!(
            loaded.permissions,
            vec![Permission::Leads, Permission::Quotes]
        );
    }

    #[tokio::test]
    async fn unique_email_violation_becomes_conflict() {
        let store = SqlUserStore::new(test_pool().await);

        store
            .insert(user_record("dup@agency.test", Role::Caller, Some(1)))
            .await
            .unwrap();
        let err = store
            .insert(user_record("dup@agency.test", Role::Caller, Some(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ItineroError::Conflict { .. }));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn listings_are_in_creation_order() {
        let store = SqlUserStore::new(test_pool().await);

        for n in 0..3 {
            store
                .insert(user_record(
                    &format!("u{}@agency.test", n),
                    Role::Caller,
                    Some(1),
                ))
                .await
                .unwrap();
        }

        let created = store.list_created_by(1).await.unwrap();
        let ids: Vec<i64> = created.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn missing_rows_surface_not_found() {
        let store = SqlUserStore::new(test_pool().await);
        let err = store.delete(42).await.unwrap_err();
        assert!(matches!(err, ItineroError::NotFound { .. }));
    }

    fn lead_record(name: &str, destination: Option<&str>, assigned_to: Option<i64>) -> NewLeadRecord {
        NewLeadRecord {
            name: name.to_string(),
            email: None,
            phone: None,
            destination: destination.map(|s| s.to_string()),
            status: LeadStatus::New,
            priority: LeadPriority::Medium,
            assigned_to,
            created_by: 1,
        }
    }

    #[tokio::test]
    async fn lead_filters_compose_with_scope() {
        let store = SqlLeadStore::new(test_pool().await);

        store
            .insert(lead_record("Bali honeymoon", Some("Bali"), Some(3)))
            .await
            .unwrap();
        store
            .insert(lead_record("Bali group tour", Some("Bali"), Some(4)))
            .await
            .unwrap();
        store
            .insert(lead_record("Alps ski trip", Some("Zermatt"), Some(3)))
            .await
            .unwrap();

        // scope alone
        let mine = store
            .list(LeadScope::Actor(3), &LeadFilter::default())
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);

        // scope AND case-insensitive search
        let filter = LeadFilter {
            search: Some("BALI".to_string()),
            ..Default::default()
        };
        let mine = store.list(LeadScope::Actor(3), &filter).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "Bali honeymoon");

        // admin scope sees everything matching
        let all = store.list(LeadScope::All, &filter).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn lead_status_updates_persist() {
        let store = SqlLeadStore::new(test_pool().await);
        let lead = store
            .insert(lead_record("Morocco tour", Some("Marrakesh"), None))
            .await
            .unwrap();

        store
            .update_status(lead.id, LeadStatus::Contacted)
            .await
            .unwrap();
        let loaded = store.find_by_id(lead.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, LeadStatus::Contacted);

        let filter = LeadFilter {
            status: Some(LeadStatus::Contacted),
            ..Default::default()
        };
        let contacted = store.list(LeadScope::All, &filter).await.unwrap();
        assert_eq!(contacted.len(), 1);
    }
}
