//! Access filtering
//!
//! Narrows a candidate record set to what the caller may see before any data
//! leaves the exporter. The filter fails closed: no caller, or no grant of any
//! kind, yields an empty set rather than an error.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::config::AccessConfig;
use crate::record::{ContentType, Record};

/// Permission action checked for a blanket grant
pub const CHANGE_ACTION: &str = "change";

/// Identity of the caller requesting an export
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Caller {
    pub username: String,
}

impl Caller {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Grant lookups backing the access filter
pub trait AccessGrants: Send + Sync {
    /// Whether the caller may change every record of the type
    fn has_blanket_grant(&self, caller: &Caller, content_type: &ContentType) -> bool;

    /// Ids of records the caller holds a per-object grant on.
    ///
    /// `None` means per-object grants are not supported by this collaborator.
    fn objects_granted_to(
        &self,
        _caller: &Caller,
        _content_type: &ContentType,
    ) -> Option<HashSet<String>> {
        None
    }
}

/// Applies caller grants to candidate records
pub struct AccessFilter<'a> {
    grants: Option<&'a dyn AccessGrants>,
}

impl<'a> AccessFilter<'a> {
    pub fn new(grants: &'a dyn AccessGrants) -> Self {
        Self {
            grants: Some(grants),
        }
    }

    /// A filter with no grant collaborator; admits nothing
    pub fn deny_all() -> Self {
        Self { grants: None }
    }

    /// Narrow `candidates` to the records `caller` may view
    ///
    /// # Arguments
    /// * `content_type` - Type of the candidate records
    /// * `candidates` - Records selected by the request, in source order
    /// * `caller` - Requesting identity, if any
    ///
    /// # Returns
    /// * `Vec<Record>` - Allowed records, source order preserved
    pub fn filter(
        &self,
        content_type: &ContentType,
        candidates: Vec<Record>,
        caller: Option<&Caller>,
    ) -> Vec<Record> {
        let Some(caller) = caller else {
            warn!("Export of {} without a caller; no records released", content_type);
            return Vec::new();
        };
        let Some(grants) = self.grants else {
            warn!("No access grants configured; no records released to {}", caller.username);
            return Vec::new();
        };

        if grants.has_blanket_grant(caller, content_type) {
            debug!("{} holds a blanket grant on {}", caller.username, content_type);
            return candidates;
        }

        match grants.objects_granted_to(caller, content_type) {
            Some(allowed) => {
                let total = candidates.len();
                let records: Vec<Record> = candidates
                    .into_iter()
                    .filter(|r| allowed.contains(&r.id))
                    .collect();
                debug!(
                    "{} holds per-object grants on {} of {} {} records",
                    caller.username,
                    records.len(),
                    total,
                    content_type
                );
                records
            }
            None => {
                warn!(
                    "{} has no grant on {}; no records released",
                    caller.username, content_type
                );
                Vec::new()
            }
        }
    }
}

/// Static grant table built from configuration
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    users: BTreeMap<String, UserPermissions>,
}

#[derive(Debug, Clone, Default)]
struct UserPermissions {
    superuser: bool,
    permissions: HashSet<String>,
    objects: BTreeMap<String, HashSet<String>>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AccessConfig) -> Self {
        let users = config
            .users
            .iter()
            .map(|grant| {
                let permissions = UserPermissions {
                    superuser: grant.superuser,
                    permissions: grant.permissions.iter().cloned().collect(),
                    objects: grant
                        .objects
                        .iter()
                        .map(|(perm, ids)| (perm.clone(), ids.iter().cloned().collect()))
                        .collect(),
                };
                (grant.username.clone(), permissions)
            })
            .collect();
        Self { users }
    }

    /// Grant a blanket permission, e.g. `library.change_book`
    pub fn grant(&mut self, username: &str, permission: &str) {
        self.users
            .entry(username.to_string())
            .or_default()
            .permissions
            .insert(permission.to_string());
    }

    /// Grant a permission on a single record
    pub fn grant_object(&mut self, username: &str, permission: &str, id: &str) {
        self.users
            .entry(username.to_string())
            .or_default()
            .objects
            .entry(permission.to_string())
            .or_default()
            .insert(id.to_string());
    }

    pub fn make_superuser(&mut self, username: &str) {
        self.users.entry(username.to_string()).or_default().superuser = true;
    }

    pub fn is_known(&self, caller: &Caller) -> bool {
        self.users.contains_key(&caller.username)
    }
}

impl AccessGrants for PermissionTable {
    fn has_blanket_grant(&self, caller: &Caller, content_type: &ContentType) -> bool {
        let permission = content_type.permission(CHANGE_ACTION);
        self.users
            .get(&caller.username)
            .is_some_and(|u| u.superuser || u.permissions.contains(&permission))
    }

    fn objects_granted_to(
        &self,
        caller: &Caller,
        content_type: &ContentType,
    ) -> Option<HashSet<String>> {
        let permission = content_type.permission(CHANGE_ACTION);
        let granted = self
            .users
            .get(&caller.username)
            .and_then(|u| u.objects.get(&permission))
            .cloned()
            .unwrap_or_default();
        Some(granted)
    }
}
