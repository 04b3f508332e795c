//! Zone directory
//!
//! Static mapping of hosted-zone identifier → managed FQDNs, loaded once from
//! configuration and only read afterwards.

use serde::{Deserialize, Serialize};

/// A hosted zone and the FQDNs the updater keeps in sync inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedZone {
    /// Opaque provider zone handle
    pub id: String,

    /// FQDNs owned by this zone, in configuration order
    #[serde(default)]
    pub records: Vec<String>,
}

impl ManagedZone {
    pub fn new<I, S>(id: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            records: records.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `fqdn` is one of this zone's managed names (exact match)
    pub fn manages(&self, fqdn: &str) -> bool {
        self.records.iter().any(|r| r == fqdn)
    }
}

/// Read-only set of managed zones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneDirectory {
    zones: Vec<ManagedZone>,
}

impl ZoneDirectory {
    pub fn new(zones: Vec<ManagedZone>) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &[ManagedZone] {
        &self.zones
    }

    /// Zone that owns `fqdn`, if any
    pub fn zone_for(&self, fqdn: &str) -> Option<&ManagedZone> {
        self.zones.iter().find(|zone| zone.manages(fqdn))
    }

    /// Zone with the given identifier, if configured
    pub fn get(&self, zone_id: &str) -> Option<&ManagedZone> {
        self.zones.iter().find(|zone| zone.id == zone_id)
    }

    /// Every managed FQDN across all zones
    pub fn managed_records(&self) -> impl Iterator<Item = &str> {
        self.zones
            .iter()
            .flat_map(|zone| zone.records.iter().map(String::as_str))
    }
}
