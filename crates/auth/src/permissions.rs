use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Permission tag gating one functional section.
///
/// The set is closed: unknown tags fail deserialization, so a user record can
/// never carry a tag no handler checks for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Inventory + protocol log.
    Hunter,
    /// Map marker board.
    Map,
    /// Train route board.
    Zug,
}

impl Permission {
    pub const ALL: [Permission; 3] = [Permission::Hunter, Permission::Map, Permission::Zug];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Hunter => "hunter",
            Permission::Map => "map",
            Permission::Zug => "zug",
        }
    }

    /// Human-facing section name used in error messages.
    pub fn section(&self) -> &'static str {
        match self {
            Permission::Hunter => "Hunter",
            Permission::Map => "Map",
            Permission::Zug => "Zug",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplicated, ordered set of permission tags.
///
/// Serializes as a JSON array (`["hunter", "map"]`); duplicates in input
/// collapse silently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn insert(&mut self, permission: Permission) -> bool {
        self.0.insert(permission)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Permission; N]> for PermissionSet {
    fn from(value: [Permission; N]) -> Self {
        value.into_iter().collect()
    }
}
