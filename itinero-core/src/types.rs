//! Core data type definitions

use serde::{Deserialize, Serialize};

/// Role tier - fixed three-level hierarchy, strictly ordered
///
/// `Super` > `Admin` > `Caller`. Roles never change after creation; there is
/// no promote/demote operation anywhere in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Super,
    Admin,
    /// Sales agent working assigned leads. Accepted on the wire as either
    /// `caller` or `sales`; always rendered as `caller`.
    #[serde(alias = "sales")]
    Caller,
}

impl Role {
    /// True for the tiers that sit above plain callers
    pub fn is_admin_tier(&self) -> bool {
        matches!(self, Role::Super | Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Super => write!(f, "super"),
            Role::Admin => write!(f, "admin"),
            Role::Caller => write!(f, "caller"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "super" => Ok(Role::Super),
            "admin" => Ok(Role::Admin),
            "caller" | "sales" => Ok(Role::Caller),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Capability tag granted to a user
///
/// Closed enumeration validated at the boundary. The wire strings below are
/// a contract with external clients, which key UI behavior off them.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    All,
    SuperAdmin,
    SystemConfig,
    UserManagement,
    DataExport,
    ApiAccess,
    AuditLogs,
    Leads,
    Quotes,
    Bookings,
    Reports,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Permission::All => "all",
            Permission::SuperAdmin => "super_admin",
            Permission::SystemConfig => "system_config",
            Permission::UserManagement => "user_management",
            Permission::DataExport => "data_export",
            Permission::ApiAccess => "api_access",
            Permission::AuditLogs => "audit_logs",
            Permission::Leads => "leads",
            Permission::Quotes => "quotes",
            Permission::Bookings => "bookings",
            Permission::Reports => "reports",
        };
        write!(f, "{}", tag)
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Permission::All),
            "super_admin" => Ok(Permission::SuperAdmin),
            "system_config" => Ok(Permission::SystemConfig),
            "user_management" => Ok(Permission::UserManagement),
            "data_export" => Ok(Permission::DataExport),
            "api_access" => Ok(Permission::ApiAccess),
            "audit_logs" => Ok(Permission::AuditLogs),
            "leads" => Ok(Permission::Leads),
            "quotes" => Ok(Permission::Quotes),
            "bookings" => Ok(Permission::Bookings),
            "reports" => Ok(Permission::Reports),
            _ => Err(format!("Unknown permission: {}", s)),
        }
    }
}

/// User account record as loaded from storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Storage-assigned identifier; ascending ids are creation order
    pub id: i64,
    pub name: String,
    /// Unique across the system, enforced by the storage layer
    pub email: String,
    /// Opaque password hash, never exposed through the API
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub is_active: bool,
    /// The user that created this account. Always `None` for supers,
    /// otherwise the id of an existing super or admin.
    pub created_by: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// Convert to the public representation returned by the API
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            permissions: self.permissions.iter().map(|p| p.to_string()).collect(),
            is_active: self.is_active,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&Permission::All) || self.permissions.contains(&permission)
    }
}

/// Public user information (no credential material)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub created_by: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Lead pipeline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Quoted,
    Booked,
    Lost,
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadStatus::New => write!(f, "new"),
            LeadStatus::Contacted => write!(f, "contacted"),
            LeadStatus::Quoted => write!(f, "quoted"),
            LeadStatus::Booked => write!(f, "booked"),
            LeadStatus::Lost => write!(f, "lost"),
        }
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "quoted" => Ok(LeadStatus::Quoted),
            "booked" => Ok(LeadStatus::Booked),
            "lost" => Ok(LeadStatus::Lost),
            _ => Err(format!("Unknown lead status: {}", s)),
        }
    }
}

/// Lead priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadPriority {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for LeadPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadPriority::Low => write!(f, "low"),
            LeadPriority::Medium => write!(f, "medium"),
            LeadPriority::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for LeadPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(LeadPriority::Low),
            "medium" => Ok(LeadPriority::Medium),
            "high" => Ok(LeadPriority::High),
            _ => Err(format!("Unknown lead priority: {}", s)),
        }
    }
}

/// A sales lead record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub destination: Option<String>,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    /// Caller currently working this lead, if any
    pub assigned_to: Option<i64>,
    pub created_by: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Default page size for lead listings
pub const DEFAULT_LEAD_LIMIT: u32 = 50;
/// Hard upper bound on a single page of leads
pub const MAX_LEAD_LIMIT: u32 = 200;

/// Filter predicate for lead listings
///
/// All supplied filters are ANDed together. The free-text search matches
/// case-insensitively against name, email, and destination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl LeadFilter {
    /// Effective page size: defaults to 50, clamped to 1..=200
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_LEAD_LIMIT)
            .clamp(1, MAX_LEAD_LIMIT)
    }

    /// Effective offset: defaults to 0
    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    /// True when a lead passes the status/priority/search predicates
    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(status) = self.status {
            if lead.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if lead.priority != priority {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let haystacks = [
                Some(lead.name.as_str()),
                lead.email.as_deref(),
                lead.destination.as_deref(),
            ];
            if !haystacks
                .iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_accepts_sales_alias() {
        assert_eq!(Role::from_str("sales").unwrap(), Role::Caller);
        assert_eq!(Role::from_str("caller").unwrap(), Role::Caller);
        assert_eq!(Role::Caller.to_string(), "caller");
    }

    #[test]
    fn permission_tags_round_trip_with_contract_strings() {
        for (tag, permission) in [
            ("all", Permission::All),
            ("super_admin", Permission::SuperAdmin),
            ("system_config", Permission::SystemConfig),
            ("user_management", Permission::UserManagement),
            ("data_export", Permission::DataExport),
            ("api_access", Permission::ApiAccess),
            ("audit_logs", Permission::AuditLogs),
            ("leads", Permission::Leads),
            ("quotes", Permission::Quotes),
            ("bookings", Permission::Bookings),
            ("reports", Permission::Reports),
        ] {
            assert_eq!(permission.to_string(), tag);
            assert_eq!(Permission::from_str(tag).unwrap(), permission);
        }
    }

    #[test]
    fn lead_filter_limits_are_bounded() {
        let filter = LeadFilter::default();
        assert_eq!(filter.effective_limit(), 50);
        assert_eq!(filter.effective_offset(), 0);

        let filter = LeadFilter {
            limit: Some(10_000),
            offset: Some(20),
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), 200);
        assert_eq!(filter.effective_offset(), 20);
    }

    #[test]
    fn lead_filter_search_is_case_insensitive() {
        let lead = Lead {
            id: 1,
            name: "Marta Keller".to_string(),
            email: Some("marta@example.com".to_string()),
            phone: None,
            destination: Some("Lisbon".to_string()),
            status: LeadStatus::New,
            priority: LeadPriority::Medium,
            assigned_to: None,
            created_by: 1,
            created_at: chrono::Utc::now(),
        };

        let mut filter = LeadFilter {
            search: Some("LISBON".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&lead));

        filter.search = Some("keller".to_string());
        assert!(filter.matches(&lead));

        filter.search = Some("reykjavik".to_string());
        assert!(!filter.matches(&lead));
    }
}
