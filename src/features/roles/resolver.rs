//! Role tags and the role resolver
//!
//! Event descriptions can ask for a mention with either `role:<id>` or
//! `role:(<role name>)`. Names are resolved against a table of the guild's
//! roles that is rebuilt from scratch whenever the roster changes.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Keep the last table when a roster fetch fails
//! - 1.0.0: Initial release

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info, warn};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

static ROLE_ID_PATTERN: OnceLock<Regex> = OnceLock::new();
static ROLE_NAME_PATTERN: OnceLock<Regex> = OnceLock::new();

fn role_id_pattern() -> &'static Regex {
    ROLE_ID_PATTERN.get_or_init(|| Regex::new(r"role:(\d+)").expect("valid role id pattern"))
}

fn role_name_pattern() -> &'static Regex {
    ROLE_NAME_PATTERN.get_or_init(|| Regex::new(r"role:\((.*?)\)").expect("valid role name pattern"))
}

/// A mention request parsed out of an event description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleTag {
    Id(u64),
    Name(String),
}

/// Find a role tag in `description`. The bare id form is tried first.
pub fn extract_role_tag(description: Option<&str>) -> Option<RoleTag> {
    let description = description?;

    if let Some(id) = role_id_pattern()
        .captures(description)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
    {
        return Some(RoleTag::Id(id));
    }

    role_name_pattern()
        .captures(description)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
        .map(|name| RoleTag::Name(name.to_string()))
}

/// Where the resolver gets the current list of (role name, role id) pairs
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn fetch_roles(&self) -> Result<Vec<(String, u64)>>;
}

#[derive(Debug, Default)]
pub struct RoleResolver {
    table: RwLock<HashMap<String, u64>>,
}

impl RoleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole table. Returns the number of bound names.
    pub fn rebuild(&self, roles: impl IntoIterator<Item = (String, u64)>) -> usize {
        let table: HashMap<String, u64> = roles.into_iter().collect();
        let count = table.len();
        *self.table.write().unwrap_or_else(|e| e.into_inner()) = table;
        count
    }

    /// Fetch the roster and rebuild. On failure the previous table stays.
    pub async fn refresh(&self, roster: &dyn RosterSource, reason: &str) -> bool {
        match roster.fetch_roles().await {
            Ok(roles) => {
                let count = self.rebuild(roles);
                info!("🏷️ Role map rebuilt ({reason}): {count} roles");
                true
            }
            Err(e) => {
                warn!(
                    "Failed to fetch roles ({reason}), keeping {} known roles: {e}",
                    self.len()
                );
                false
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<u64> {
        self.table
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .copied()
    }

    /// Role id to mention for an event description, if any
    pub fn resolve(&self, description: Option<&str>) -> Option<u64> {
        match extract_role_tag(description)? {
            RoleTag::Id(id) => {
                debug!("Found role id {id} in description");
                Some(id)
            }
            RoleTag::Name(name) => {
                let id = self.lookup(&name);
                match id {
                    Some(id) => debug!("Found role id for \"{name}\": {id}"),
                    None => debug!("Role name \"{name}\" is not in the role map"),
                }
                id
            }
        }
    }

    pub fn len(&self) -> usize {
        self.table.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeRoster {
        responses: Mutex<Vec<Result<Vec<(String, u64)>>>>,
    }

    impl FakeRoster {
        fn new(responses: Vec<Result<Vec<(String, u64)>>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl RosterSource for FakeRoster {
        async fn fetch_roles(&self) -> Result<Vec<(String, u64)>> {
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn roles(pairs: &[(&str, u64)]) -> Vec<(String, u64)> {
        pairs.iter().map(|(n, id)| (n.to_string(), *id)).collect()
    }

    #[test]
    fn test_extract_id_form() {
        assert_eq!(
            extract_role_tag(Some("Bring snacks role:123456")),
            Some(RoleTag::Id(123456))
        );
    }

    #[test]
    fn test_extract_name_form() {
        assert_eq!(
            extract_role_tag(Some("role:(Raid Team) meet at the gate")),
            Some(RoleTag::Name("Raid Team".to_string()))
        );
        // Lazy match stops at the first closing paren
        assert_eq!(
            extract_role_tag(Some("role:(A) (note)")),
            Some(RoleTag::Name("A".to_string()))
        );
    }

    #[test]
    fn test_id_form_wins_over_name_form() {
        assert_eq!(
            extract_role_tag(Some("role:(Officers) or role:42")),
            Some(RoleTag::Id(42))
        );
    }

    #[test]
    fn test_no_tag() {
        assert_eq!(extract_role_tag(None), None);
        assert_eq!(extract_role_tag(Some("just a meeting")), None);
        assert_eq!(extract_role_tag(Some("role:()")), None);
        assert_eq!(extract_role_tag(Some("role: Officers")), None);
    }

    #[test]
    fn test_resolve_by_name_and_unknown_name() {
        let resolver = RoleResolver::new();
        resolver.rebuild(roles(&[("Officers", 11), ("Members", 22)]));

        assert_eq!(resolver.resolve(Some("role:(Members)")), Some(22));
        assert_eq!(resolver.resolve(Some("role:(Guests)")), None);
        assert_eq!(resolver.resolve(Some("role:99")), Some(99));
        assert_eq!(resolver.resolve(None), None);
    }

    #[test]
    fn test_rebuild_replaces_whole_table() {
        let resolver = RoleResolver::new();
        resolver.rebuild(roles(&[("Officers", 11), ("Members", 22)]));
        resolver.rebuild(roles(&[("Members", 33)]));

        assert_eq!(resolver.lookup("Officers"), None);
        assert_eq!(resolver.lookup("Members"), Some(33));
        assert_eq!(resolver.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_keeps_table_on_failure() {
        let resolver = RoleResolver::new();
        let roster = FakeRoster::new(vec![
            Ok(roles(&[("Officers", 11)])),
            Err(anyhow::anyhow!("discord unavailable")),
        ]);

        assert!(resolver.refresh(&roster, "startup").await);
        assert!(!resolver.refresh(&roster, "role deleted").await);
        assert_eq!(resolver.lookup("Officers"), Some(11));
    }
}
