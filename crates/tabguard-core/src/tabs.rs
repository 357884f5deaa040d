//! Tab identity and caller-declared routing properties.
//!
//! The guard never hardcodes what tabs exist or where they route; the UI
//! shell declares them once as a [`TabRegistry`], including which tab is
//! the safe fallback when a loop has to be broken.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier for a dashboard tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TabId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Declared properties of a single tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabSpec {
    /// Stable tab identifier
    pub id: TabId,
    /// Route path handed to the navigation capability
    pub path: String,
    /// Whether activating this tab triggers a data refresh
    #[serde(default)]
    pub requires_refresh: bool,
}

impl TabSpec {
    #[must_use]
    pub fn new(id: impl Into<TabId>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            requires_refresh: false,
        }
    }

    /// Mark this tab as needing a data refresh on activation.
    #[must_use]
    pub fn with_refresh(mut self) -> Self {
        self.requires_refresh = true;
        self
    }
}

/// The set of declared tabs plus the designated safe fallback.
#[derive(Debug, Clone)]
pub struct TabRegistry {
    tabs: Vec<TabSpec>,
    safe_idx: usize,
}

impl TabRegistry {
    /// Build a registry. Ids must be unique and `safe_tab` must be one of
    /// the declared tabs.
    pub fn new(tabs: Vec<TabSpec>, safe_tab: &TabId) -> Result<Self> {
        let mut seen = HashSet::new();
        for spec in &tabs {
            if !seen.insert(spec.id.clone()) {
                return Err(Error::Config(format!("duplicate tab id `{}`", spec.id)));
            }
        }
        let safe_idx = tabs
            .iter()
            .position(|t| &t.id == safe_tab)
            .ok_or_else(|| Error::UnknownTab(safe_tab.to_string()))?;
        Ok(Self { tabs, safe_idx })
    }

    /// Look up a declared tab.
    #[must_use]
    pub fn get(&self, id: &TabId) -> Option<&TabSpec> {
        self.tabs.iter().find(|t| &t.id == id)
    }

    /// The fallback tab used when a loop is broken.
    #[must_use]
    pub fn safe_tab(&self) -> &TabSpec {
        &self.tabs[self.safe_idx]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TabSpec> {
        self.tabs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tabs() -> Vec<TabSpec> {
        vec![
            TabSpec::new("announcements", "/dashboard/announcements"),
            TabSpec::new("directory", "/dashboard/directory"),
            TabSpec::new("messages", "/dashboard/messages").with_refresh(),
        ]
    }

    #[test]
    fn registry_resolves_declared_tabs() {
        let registry = TabRegistry::new(sample_tabs(), &TabId::from("announcements")).unwrap();
        assert_eq!(registry.len(), 3);

        let messages = registry.get(&TabId::from("messages")).unwrap();
        assert!(messages.requires_refresh);
        assert_eq!(messages.path, "/dashboard/messages");

        assert_eq!(registry.iter().filter(|t| t.requires_refresh).count(), 1);
        assert!(registry.get(&TabId::from("payroll")).is_none());
    }

    #[test]
    fn safe_tab_must_be_declared() {
        let err = TabRegistry::new(sample_tabs(), &TabId::from("payroll")).unwrap_err();
        assert!(matches!(err, Error::UnknownTab(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut tabs = sample_tabs();
        tabs.push(TabSpec::new("directory", "/elsewhere"));
        let err = TabRegistry::new(tabs, &TabId::from("announcements")).unwrap_err();
        assert!(err.to_string().contains("duplicate tab id"));
    }

    #[test]
    fn safe_tab_lookup_returns_its_spec() {
        let registry = TabRegistry::new(sample_tabs(), &TabId::from("directory")).unwrap();
        assert_eq!(registry.safe_tab().id, TabId::from("directory"));
    }

    #[test]
    fn tab_id_serializes_transparently() {
        let id = TabId::from("messages");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"messages\"");
    }
}
