//! Storage backends for users and leads
//!
//! Trait seams for the persistence collaborator plus in-memory
//! implementations used in tests and development. The production SQLite
//! backend lives in `itinero-web`.
//!
//! Both stores return records in creation order (ascending id). The user
//! store must surface a duplicate email as `ItineroError::Conflict` so the
//! directory never leaks a raw constraint violation.

use itinero_core::{
    conflict_error, not_found_error, ItineroResult, Lead, LeadFilter, LeadPriority, LeadStatus,
    Permission, Role, User,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Fields for a user insert; id, activation flag, and timestamp are assigned
/// by the store
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub created_by: Option<i64>,
}

/// User persistence trait
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; yields `Conflict` when the email is already taken
    async fn insert(&self, record: NewUserRecord) -> ItineroResult<User>;

    async fn find_by_id(&self, id: i64) -> ItineroResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> ItineroResult<Option<User>>;

    async fn update_password(&self, id: i64, password_hash: &str) -> ItineroResult<()>;

    async fn update_active(&self, id: i64, is_active: bool) -> ItineroResult<()>;

    async fn delete(&self, id: i64) -> ItineroResult<()>;

    /// Users created by the given creator, in creation order
    async fn list_created_by(&self, creator_id: i64) -> ItineroResult<Vec<User>>;

    /// Every user, in creation order
    async fn list_all(&self) -> ItineroResult<Vec<User>>;

    async fn count(&self) -> ItineroResult<u64>;
}

/// Visibility scope for lead listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadScope {
    /// Admin tier: every lead
    All,
    /// Caller tier: leads assigned to or created by this user
    Actor(i64),
}

impl LeadScope {
    pub fn permits(&self, lead: &Lead) -> bool {
        match self {
            LeadScope::All => true,
            LeadScope::Actor(id) => lead.assigned_to == Some(*id) || lead.created_by == *id,
        }
    }
}

/// Fields for a lead insert
#[derive(Debug, Clone)]
pub struct NewLeadRecord {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub destination: Option<String>,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    pub assigned_to: Option<i64>,
    pub created_by: i64,
}

/// Lead persistence trait
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn insert(&self, record: NewLeadRecord) -> ItineroResult<Lead>;

    async fn find_by_id(&self, id: i64) -> ItineroResult<Option<Lead>>;

    /// Leads within scope matching the filter, in creation order, paginated
    async fn list(&self, scope: LeadScope, filter: &LeadFilter) -> ItineroResult<Vec<Lead>>;

    async fn update_status(&self, id: i64, status: LeadStatus) -> ItineroResult<()>;

    async fn assign(&self, id: i64, assignee: Option<i64>) -> ItineroResult<()>;

    async fn delete(&self, id: i64) -> ItineroResult<()>;
}

/// In-memory user store (tests and development)
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    inner: Arc<RwLock<MemoryUsers>>,
}

#[derive(Default)]
struct MemoryUsers {
    next_id: i64,
    users: BTreeMap<i64, User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, record: NewUserRecord) -> ItineroResult<User> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.email == record.email) {
            return Err(conflict_error!(
                format!("user with email '{}'", record.email),
                "memory-store"
            ));
        }

        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            name: record.name,
            email: record.email,
            password_hash: record.password_hash,
            role: record.role,
            permissions: record.permissions,
            is_active: true,
            created_by: record.created_by,
            created_at: chrono::Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        debug!(user_id = user.id, "Inserted user into memory store");
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> ItineroResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> ItineroResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> ItineroResult<()> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(())
            }
            None => Err(not_found_error!(format!("user {}", id), "memory-store")),
        }
    }

    async fn update_active(&self, id: i64, is_active: bool) -> ItineroResult<()> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&id) {
            Some(user) => {
                user.is_active = is_active;
                Ok(())
            }
            None => Err(not_found_error!(format!("user {}", id), "memory-store")),
        }
    }

    async fn delete(&self, id: i64) -> ItineroResult<()> {
        let mut inner = self.inner.write().await;
        match inner.users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(not_found_error!(format!("user {}", id), "memory-store")),
        }
    }

    async fn list_created_by(&self, creator_id: i64) -> ItineroResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .filter(|u| u.created_by == Some(creator_id))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> ItineroResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().cloned().collect())
    }

    async fn count(&self) -> ItineroResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.users.len() as u64)
    }
}

/// In-memory lead store (tests and development)
#[derive(Clone, Default)]
pub struct MemoryLeadStore {
    inner: Arc<RwLock<MemoryLeads>>,
}

#[derive(Default)]
struct MemoryLeads {
    next_id: i64,
    leads: BTreeMap<i64, Lead>,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn insert(&self, record: NewLeadRecord) -> ItineroResult<Lead> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let lead = Lead {
            id: inner.next_id,
            name: record.name,
            email: record.email,
            phone: record.phone,
            destination: record.destination,
            status: record.status,
            priority: record.priority,
            assigned_to: record.assigned_to,
            created_by: record.created_by,
            created_at: chrono::Utc::now(),
        };
        inner.leads.insert(lead.id, lead.clone());
        Ok(lead)
    }

    async fn find_by_id(&self, id: i64) -> ItineroResult<Option<Lead>> {
        let inner = self.inner.read().await;
        Ok(inner.leads.get(&id).cloned())
    }

    async fn list(&self, scope: LeadScope, filter: &LeadFilter) -> ItineroResult<Vec<Lead>> {
        let inner = self.inner.read().await;
        Ok(inner
            .leads
            .values()
            .filter(|lead| scope.permits(lead) && filter.matches(lead))
            .skip(filter.effective_offset() as usize)
            .take(filter.effective_limit() as usize)
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: i64, status: LeadStatus) -> ItineroResult<()> {
        let mut inner = self.inner.write().await;
        match inner.leads.get_mut(&id) {
            Some(lead) => {
                lead.status = status;
                Ok(())
            }
            None => Err(not_found_error!(format!("lead {}", id), "memory-store")),
        }
    }

    async fn assign(&self, id: i64, assignee: Option<i64>) -> ItineroResult<()> {
        let mut inner = self.inner.write().await;
        match inner.leads.get_mut(&id) {
            Some(lead) => {
                lead.assigned_to = assignee;
                Ok(())
            }
            None => Err(not_found_error!(format!("lead {}", id), "memory-store")),
        }
    }

    async fn delete(&self, id: i64) -> ItineroResult<()> {
        let mut inner = self.inner.write().await;
        match inner.leads.remove(&id) {
            Some(_) => Ok(()),
            None => Err(not_found_error!(format!("lead {}", id), "memory-store")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itinero_core::LeadPriority;

    fn user_record(email: &str) -> NewUserRecord {
        NewUserRecord {
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "opaque".to_string(),
            role: Role::Caller,
            permissions: vec![Permission::Leads],
            created_by: Some(1),
        }
    }

    #[tokio::test]
    async fn duplicate_email_yields_conflict_and_leaves_store_unchanged() {
        let store = MemoryUserStore::new();
        store.insert(user_record("dup@agency.test")).await.unwrap();

        let err = store
            .insert(user_record("dup@agency.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, itinero_core::ItineroError::Conflict { .. }));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn listings_come_back_in_creation_order() {
        let store = MemoryUserStore::new();
        for n in 0..3 {
            store
                .insert(user_record(&format!("u{}@agency.test", n)))
                .await
                .unwrap();
        }

        let users = store.list_all().await.unwrap();
        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn lead_scope_restricts_to_assigned_or_created() {
        let store = MemoryLeadStore::new();
        for (assigned_to, created_by) in [(Some(3), 2), (Some(4), 2), (None, 3)] {
            store
                .insert(NewLeadRecord {
                    name: "Lead".to_string(),
                    email: None,
                    phone: None,
                    destination: None,
                    status: LeadStatus::New,
                    priority: LeadPriority::Medium,
                    assigned_to,
                    created_by,
                })
                .await
                .unwrap();
        }

        let visible = store
            .list(LeadScope::Actor(3), &LeadFilter::default())
            .await
            .unwrap();
        let ids: Vec<i64> = visible.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let all = store
            .list(LeadScope::All, &LeadFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn lead_pagination_applies_after_filtering() {
        let store = MemoryLeadStore::new();
        for n in 0..5 {
            store
                .insert(NewLeadRecord {
                    name: format!("Lead {}", n),
                    email: None,
                    phone: None,
                    destination: None,
                    status: LeadStatus::New,
                    priority: LeadPriority::Medium,
                    assigned_to: None,
                    created_by: 1,
                })
                .await
                .unwrap();
        }

        let filter = LeadFilter {
            limit: Some(2),
            offset: Some(2),
            ..Default::default()
        };
        let page = store.list(LeadScope::All, &filter).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }
}
