//! Cycle-scoped data model
//!
//! Everything here is built fresh on each reconciliation cycle and dropped
//! once the cycle's batches have been applied. Nothing is cached between
//! cycles: the provider's zone contents are the only source of truth.

use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// TTL, in seconds, written on every upserted record
pub const DEFAULT_TTL: u32 = 300;

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Version of the given address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("ipv4"),
            IpVersion::V6 => f.write_str("ipv6"),
        }
    }
}

/// DNS record type managed by the updater
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Record type that carries the given address
    pub fn for_ip(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }

    /// Parse a wire record type; anything but A/AAAA is unmanaged
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "A" => Some(RecordType::A),
            "AAAA" => Some(RecordType::Aaaa),
            _ => None,
        }
    }

    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// IP version stored in records of this type
    pub fn version(&self) -> IpVersion {
        match self {
            RecordType::A => IpVersion::V4,
            RecordType::Aaaa => IpVersion::V6,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addresses discovered for this cycle, one slot per family
///
/// Each slot is written by its own fetch branch and read only after both
/// branches have joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservedAddresses {
    pub v4: Option<Ipv4Addr>,
    pub v6: Option<Ipv6Addr>,
}

impl ObservedAddresses {
    pub fn new(v4: Option<Ipv4Addr>, v6: Option<Ipv6Addr>) -> Self {
        Self { v4, v6 }
    }

    /// True when neither family could be discovered
    pub fn is_empty(&self) -> bool {
        self.v4.is_none() && self.v6.is_none()
    }

    /// Observed addresses, IPv4 first
    pub fn iter(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.v4
            .map(IpAddr::V4)
            .into_iter()
            .chain(self.v6.map(IpAddr::V6))
    }
}

/// One address currently published for a managed FQDN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    pub fqdn: String,
    pub record_type: RecordType,
    pub address: IpAddr,
}

impl DnsRecord {
    pub fn new(fqdn: impl Into<String>, address: IpAddr) -> Self {
        Self {
            fqdn: fqdn.into(),
            record_type: RecordType::for_ip(&address),
            address,
        }
    }
}

/// Current provider state: FQDN → published addresses
///
/// An FQDN with no A/AAAA data is absent, never mapped to an empty list.
pub type CurrentRecords = BTreeMap<String, Vec<DnsRecord>>;

/// An intended upsert of one record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Change {
    pub fqdn: String,
    pub address: IpAddr,
    pub record_type: RecordType,
    pub ttl: u32,
}

impl Change {
    /// Upsert `fqdn` to `address` with the default TTL
    pub fn upsert(fqdn: impl Into<String>, address: IpAddr) -> Self {
        Self {
            fqdn: fqdn.into(),
            address,
            record_type: RecordType::for_ip(&address),
            ttl: DEFAULT_TTL,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} (ttl {})",
            self.record_type, self.fqdn, self.address, self.ttl
        )
    }
}

/// All changes destined for one hosted zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub zone_id: String,
    pub changes: Vec<Change>,
}
