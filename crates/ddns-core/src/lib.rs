// # ddns-core
//
// Core library for the DDNS reconciliation engine.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpSource**: Trait for discovering the current public IPv4/IPv6 addresses
// - **DnsProvider**: Trait for listing and upserting hosted-zone record sets
// - **ZoneDirectory**: Static hosted-zone → managed FQDN mapping
// - **reader / reconcile / applier**: Read current records, build per-zone
//   batches, submit them
// - **DdnsEngine**: Periodic scheduler driving fetch → reconcile → apply
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider and IP source implementations
// 2. **Provider Truth**: No local state; every cycle re-reads the zones
// 3. **Minimal Changes**: Only same-family, differing values produce upserts
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Contained Failures**: Per-cycle errors are logged, never fatal

pub mod traits;
pub mod model;
pub mod zones;
pub mod reader;
pub mod reconcile;
pub mod applier;
pub mod engine;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, RecordSet};
pub use model::{Batch, Change, CurrentRecords, DnsRecord, ObservedAddresses, RecordType};
pub use zones::{ManagedZone, ZoneDirectory};
pub use engine::{CycleOutcome, DdnsEngine, EngineEvent};
pub use config::{DdnsConfig, IpSourceConfig, ProviderConfig};
pub use error::{Error, Result};
