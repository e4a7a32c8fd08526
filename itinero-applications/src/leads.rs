//! Lead access with per-caller isolation
//!
//! The isolation boundary is distinct from user management: a caller sees
//! only leads assigned to or created by them, while admin-tier actors see
//! everything, subject to the same filter predicate.

use crate::storage::{LeadScope, LeadStore, NewLeadRecord};
use itinero_core::{
    forbidden_error, not_found_error, validation_error, ItineroResult, Lead, LeadFilter,
    LeadPriority, LeadStatus, Role, User,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Request to create a lead
#[derive(Debug, Clone, Deserialize)]
pub struct NewLeadRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub destination: Option<String>,
    pub priority: Option<LeadPriority>,
    pub assigned_to: Option<i64>,
}

/// Lead operations over a storage backend
#[derive(Clone)]
pub struct LeadService {
    store: Arc<dyn LeadStore>,
}

impl LeadService {
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self { store }
    }

    /// Visibility scope for an actor
    pub fn scope_for(actor: &User) -> LeadScope {
        if actor.role.is_admin_tier() {
            LeadScope::All
        } else {
            LeadScope::Actor(actor.id)
        }
    }

    /// Leads visible to the actor matching the filter, in creation order
    pub async fn list(&self, actor: &User, filter: &LeadFilter) -> ItineroResult<Vec<Lead>> {
        self.store.list(Self::scope_for(actor), filter).await
    }

    /// Create a lead owned by the actor
    ///
    /// Callers always work their own leads, so a caller's lead is assigned
    /// to itself regardless of the request.
    pub async fn create(&self, actor: &User, request: NewLeadRequest) -> ItineroResult<Lead> {
        if request.name.trim().is_empty() {
            return Err(validation_error!("lead name must not be empty", "name", "leads"));
        }

        let assigned_to = if actor.role == Role::Caller {
            Some(actor.id)
        } else {
            request.assigned_to
        };

        let lead = self
            .store
            .insert(NewLeadRecord {
                name: request.name,
                email: request.email,
                phone: request.phone,
                destination: request.destination,
                status: LeadStatus::New,
                priority: request.priority.unwrap_or(LeadPriority::Medium),
                assigned_to,
                created_by: actor.id,
            })
            .await?;

        info!(actor_id = actor.id, lead_id = lead.id, "Created lead");
        Ok(lead)
    }

    /// Fetch a lead within the actor's visibility scope
    pub async fn get(&self, actor: &User, lead_id: i64) -> ItineroResult<Lead> {
        let lead = self
            .store
            .find_by_id(lead_id)
            .await?
            .ok_or_else(|| not_found_error!(format!("lead {}", lead_id), "leads"))?;

        if !Self::scope_for(actor).permits(&lead) {
            return Err(forbidden_error!("lead is outside your scope", "leads"));
        }
        Ok(lead)
    }

    /// Update the pipeline status of a visible lead
    pub async fn update_status(
        &self,
        actor: &User,
        lead_id: i64,
        status: LeadStatus,
    ) -> ItineroResult<Lead> {
        let lead = self.get(actor, lead_id).await?;
        self.store.update_status(lead.id, status).await?;
        info!(
            actor_id = actor.id,
            lead_id = lead.id,
            status = %status,
            "Updated lead status"
        );
        Ok(Lead { status, ..lead })
    }

    /// Reassign a lead; admin tier only
    pub async fn assign(
        &self,
        actor: &User,
        lead_id: i64,
        assignee: Option<i64>,
    ) -> ItineroResult<Lead> {
        if !actor.role.is_admin_tier() {
            return Err(forbidden_error!("only admin tier may assign leads", "leads"));
        }

        let lead = self
            .store
            .find_by_id(lead_id)
            .await?
            .ok_or_else(|| not_found_error!(format!("lead {}", lead_id), "leads"))?;

        self.store.assign(lead.id, assignee).await?;
        info!(
            actor_id = actor.id,
            lead_id = lead.id,
            assignee = ?assignee,
            "Reassigned lead"
        );
        Ok(Lead {
            assigned_to: assignee,
            ..lead
        })
    }

    /// Delete a lead; admin tier only
    pub async fn delete(&self, actor: &User, lead_id: i64) -> ItineroResult<()> {
        if !actor.role.is_admin_tier() {
            return Err(forbidden_error!("only admin tier may delete leads", "leads"));
        }

        self.store
            .find_by_id(lead_id)
            .await?
            .ok_or_else(|| not_found_error!(format!("lead {}", lead_id), "leads"))?;

        self.store.delete(lead_id).await?;
        info!(actor_id = actor.id, lead_id, "Deleted lead");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLeadStore;
    use itinero_core::{ItineroError, Permission};

    fn user(id: i64, role: Role) -> User {
        User {
            id,
            name: format!("user-{}", id),
            email: format!("user{}@agency.test", id),
            password_hash: "opaque".to_string(),
            role,
            permissions: vec![Permission::Leads],
            is_active: true,
            created_by: None,
            created_at: chrono::Utc::now(),
        }
    }

    fn service() -> LeadService {
        LeadService::new(Arc::new(MemoryLeadStore::new()))
    }

    fn lead_request(name: &str, destination: Option<&str>) -> NewLeadRequest {
        NewLeadRequest {
            name: name.to_string(),
            email: None,
            phone: None,
            destination: destination.map(|s| s.to_string()),
            priority: None,
            assigned_to: None,
        }
    }

    #[tokio::test]
    async fn caller_leads_are_self_assigned() {
        let service = service();
        let caller = user(3, Role::Caller);

        let lead = service
            .create(&caller, lead_request("Trip to Kyoto", Some("Kyoto")))
            .await
            .unwrap();
        assert_eq!(lead.assigned_to, Some(3));
        assert_eq!(lead.created_by, 3);
        assert_eq!(lead.status, LeadStatus::New);
    }

    #[tokio::test]
    async fn callers_see_only_their_own_leads() {
        let service = service();
        let admin = user(2, Role::Admin);
        let caller_a = user(3, Role::Caller);
        let caller_b = user(4, Role::Caller);

        service
            .create(&caller_a, lead_request("A lead", None))
            .await
            .unwrap();
        service
            .create(&caller_b, lead_request("B lead", None))
            .await
            .unwrap();
        service
            .create(&admin, lead_request("Unassigned", None))
            .await
            .unwrap();

        let visible = service
            .list(&caller_a, &LeadFilter::default())
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "A lead");

        let all = service.list(&admin, &LeadFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn isolation_holds_under_filters() {
        let service = service();
        let caller_a = user(3, Role::Caller);
        let caller_b = user(4, Role::Caller);

        service
            .create(&caller_a, lead_request("Bali honeymoon", Some("Bali")))
            .await
            .unwrap();
        service
            .create(&caller_b, lead_request("Bali group tour", Some("Bali")))
            .await
            .unwrap();

        let filter = LeadFilter {
            search: Some("bali".to_string()),
            ..Default::default()
        };
        let visible = service.list(&caller_a, &filter).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].created_by, 3);
    }

    #[tokio::test]
    async fn foreign_lead_access_is_forbidden() {
        let service = service();
        let caller_a = user(3, Role::Caller);
        let caller_b = user(4, Role::Caller);

        let lead = service
            .create(&caller_a, lead_request("Private", None))
            .await
            .unwrap();

        let err = service.get(&caller_b, lead.id).await.unwrap_err();
        assert!(matches!(err, ItineroError::Forbidden { .. }));

        let err = service
            .update_status(&caller_b, lead.id, LeadStatus::Contacted)
            .await
            .unwrap_err();
        assert!(matches!(err, ItineroError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn assignment_and_deletion_are_admin_tier_only() {
        let service = service();
        let admin = user(2, Role::Admin);
        let caller = user(3, Role::Caller);

        let lead = service
            .create(&admin, lead_request("Reassignable", None))
            .await
            .unwrap();

        let err = service
            .assign(&caller, lead.id, Some(caller.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ItineroError::Forbidden { .. }));

        let updated = service.assign(&admin, lead.id, Some(3)).await.unwrap();
        assert_eq!(updated.assigned_to, Some(3));

        let err = service.delete(&caller, lead.id).await.unwrap_err();
        assert!(matches!(err, ItineroError::Forbidden { .. }));
        service.delete(&admin, lead.id).await.unwrap();
    }
}
