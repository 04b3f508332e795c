//! Record reader
//!
//! Reads the provider's current A/AAAA values for every managed FQDN.
//! A failed listing for any zone fails the whole read: deciding on a partial
//! view could upsert records that are in fact already correct.

use crate::error::{Error, Result};
use crate::model::{CurrentRecords, DnsRecord, IpVersion, RecordType};
use crate::traits::{DnsProvider, RecordSet};
use crate::zones::{ManagedZone, ZoneDirectory};
use std::net::IpAddr;
use tracing::{debug, trace};

/// Fetch the current records of every managed FQDN in `zones`
///
/// FQDNs without any A/AAAA data are absent from the result.
pub async fn fetch_current(
    provider: &dyn DnsProvider,
    zones: &ZoneDirectory,
) -> Result<CurrentRecords> {
    let mut records = CurrentRecords::new();

    for zone in zones.zones() {
        let sets = provider.list_record_sets(&zone.id).await?;
        debug!("Zone {} listed {} record set(s)", zone.id, sets.len());

        for set in &sets {
            if let Some(parsed) = parse_managed_set(zone, set)? {
                records
                    .entry(set.name.clone())
                    .or_default()
                    .extend(parsed);
            }
        }
    }

    Ok(records)
}

/// Parse a record set if it is a non-empty A/AAAA set managed by `zone`
fn parse_managed_set(zone: &ManagedZone, set: &RecordSet) -> Result<Option<Vec<DnsRecord>>> {
    if !zone.manages(&set.name) {
        return Ok(None);
    }

    let Some(record_type) = RecordType::parse(&set.record_type) else {
        trace!("Ignoring {} record for {}", set.record_type, set.name);
        return Ok(None);
    };

    if set.values.is_empty() {
        return Ok(None);
    }

    set.values
        .iter()
        .map(|value| parse_value(zone, set, record_type, value))
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn parse_value(
    zone: &ManagedZone,
    set: &RecordSet,
    record_type: RecordType,
    value: &str,
) -> Result<DnsRecord> {
    let address: IpAddr = value.trim().parse().map_err(|_| {
        Error::invalid_record(format!(
            "zone {}: {} {} has invalid ip value {:?}",
            zone.id, record_type, set.name, value
        ))
    })?;

    if RecordType::for_ip(&address) != record_type {
        return Err(Error::invalid_record(format!(
            "zone {}: {} {} holds {} address {}",
            zone.id,
            record_type,
            set.name,
            IpVersion::of(&address),
            address
        )));
    }

    Ok(DnsRecord {
        fqdn: set.name.clone(),
        record_type,
        address,
    })
}
