//! Reconciler
//!
//! Compares what the provider currently publishes against the addresses
//! observed this cycle and produces the smallest set of upserts, grouped
//! into one [`Batch`] per hosted zone.
//!
//! ## Rules
//!
//! - A `(current record, observed address)` pair yields a [`Change`] only
//!   when both are of the same family and the values differ.
//! - A change for an FQDN no zone owns is dropped without error.
//! - Zones without changes get no batch; an empty result means "nothing to
//!   update", which is not an error.

use crate::model::{Batch, Change, CurrentRecords, IpVersion, ObservedAddresses};
use crate::zones::ZoneDirectory;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Build the upsert batches needed to bring `current` in line with `observed`
pub fn build_batches(
    observed: &ObservedAddresses,
    current: &CurrentRecords,
    zones: &ZoneDirectory,
) -> Vec<Batch> {
    if observed.is_empty() {
        debug!("No observed addresses, skipping reconciliation");
        return Vec::new();
    }

    let grouped = current
        .iter()
        .flat_map(|(fqdn, records)| records.iter().map(move |record| (fqdn, record)))
        .flat_map(|(fqdn, record)| {
            observed
                .iter()
                .filter(move |new_ip| {
                    IpVersion::of(new_ip) == IpVersion::of(&record.address)
                        && *new_ip != record.address
                })
                .map(move |new_ip| {
                    trace!(
                        "{} {} is {}, observed {}",
                        record.record_type, fqdn, record.address, new_ip
                    );
                    Change::upsert(fqdn.as_str(), new_ip)
                })
        })
        .filter_map(|change| match zones.zone_for(&change.fqdn) {
            Some(zone) => Some((zone.id.clone(), change)),
            None => {
                debug!("{} is not managed by any zone, dropping change", change.fqdn);
                None
            }
        })
        .fold(
            BTreeMap::<String, Vec<Change>>::new(),
            |mut acc, (zone_id, change)| {
                acc.entry(zone_id).or_default().push(change);
                acc
            },
        );

    grouped
        .into_iter()
        .map(|(zone_id, changes)| Batch { zone_id, changes })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DnsRecord, RecordType};
    use crate::zones::ManagedZone;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    fn v4(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    fn v6(s: &str) -> Ipv6Addr {
        s.parse().unwrap()
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn current(entries: &[(&str, &[&str])]) -> CurrentRecords {
        entries
            .iter()
            .map(|(fqdn, values)| {
                (
                    fqdn.to_string(),
                    values.iter().map(|v| DnsRecord::new(*fqdn, ip(v))).collect(),
                )
            })
            .collect()
    }

    fn zone_z() -> ZoneDirectory {
        ZoneDirectory::new(vec![ManagedZone::new(
            "Z",
            ["www.example.dev", "vpn.example.dev"],
        )])
    }

    #[test]
    fn two_stale_records_in_one_zone_share_a_batch() {
        let records = current(&[
            ("www.example.dev", &["1.2.3.4"]),
            ("vpn.example.dev", &["1.2.3.4"]),
        ]);
        let observed = ObservedAddresses::new(Some(v4("5.6.7.8")), None);

        let batches = build_batches(&observed, &records, &zone_z());

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].zone_id, "Z");
        assert_eq!(batches[0].changes.len(), 2);
        for change in &batches[0].changes {
            assert_eq!(change.address, ip("5.6.7.8"));
            assert_eq!(change.record_type, RecordType::A);
            assert_eq!(change.ttl, 300);
        }
    }

    #[test]
    fn matching_record_needs_no_update() {
        let records = current(&[("www.example.dev", &["5.6.7.8"])]);
        let observed = ObservedAddresses::new(Some(v4("5.6.7.8")), None);

        assert!(build_batches(&observed, &records, &zone_z()).is_empty());
    }

    #[test]
    fn families_are_never_compared_across() {
        let records = current(&[
            ("www.example.dev", &["2001:db8::1"]),
            ("vpn.example.dev", &["1.2.3.4"]),
        ]);
        // v4 differs from nothing of its family on www; v6 has nothing to compare on vpn
        let observed = ObservedAddresses::new(Some(v4("1.2.3.4")), Some(v6("2001:db8::1")));

        assert!(build_batches(&observed, &records, &zone_z()).is_empty());
    }

    #[test]
    fn each_family_updates_its_own_record_type() {
        let records = current(&[("www.example.dev", &["1.2.3.4", "2001:db8::1"])]);
        let observed = ObservedAddresses::new(Some(v4("5.6.7.8")), Some(v6("2001:db8::2")));

        let batches = build_batches(&observed, &records, &zone_z());

        assert_eq!(batches.len(), 1);
        let changes = &batches[0].changes;
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].record_type, RecordType::A);
        assert_eq!(changes[0].address, ip("5.6.7.8"));
        assert_eq!(changes[1].record_type, RecordType::Aaaa);
        assert_eq!(changes[1].address, ip("2001:db8::2"));
    }

    #[test]
    fn missing_family_leaves_its_records_untouched() {
        let records = current(&[("www.example.dev", &["1.2.3.4", "2001:db8::1"])]);
        let observed = ObservedAddresses::new(None, Some(v6("2001:db8::2")));

        let batches = build_batches(&observed, &records, &zone_z());

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].changes.len(), 1);
        assert_eq!(batches[0].changes[0].record_type, RecordType::Aaaa);
    }

    #[test]
    fn no_observed_addresses_yields_no_batches() {
        let records = current(&[("www.example.dev", &["1.2.3.4"])]);

        assert!(build_batches(&ObservedAddresses::default(), &records, &zone_z()).is_empty());
    }

    #[test]
    fn unmanaged_fqdn_is_dropped() {
        let records = current(&[
            ("other.example.com", &["1.2.3.4"]),
            ("www.example.dev", &["5.6.7.8"]),
        ]);
        let observed = ObservedAddresses::new(Some(v4("5.6.7.8")), None);

        assert!(build_batches(&observed, &records, &zone_z()).is_empty());
    }

    #[test]
    fn batches_are_keyed_by_zone() {
        let zones = ZoneDirectory::new(vec![
            ManagedZone::new("Z1", ["a.example.dev", "b.example.dev"]),
            ManagedZone::new("Z2", ["c.example.org"]),
        ]);
        let records = current(&[
            ("a.example.dev", &["1.1.1.1"]),
            ("b.example.dev", &["2.2.2.2"]),
            ("c.example.org", &["3.3.3.3"]),
        ]);
        let observed = ObservedAddresses::new(Some(v4("9.9.9.9")), None);

        let batches = build_batches(&observed, &records, &zones);

        assert_eq!(batches.len(), 2);
        let z1 = batches.iter().find(|b| b.zone_id == "Z1").unwrap();
        let z2 = batches.iter().find(|b| b.zone_id == "Z2").unwrap();
        assert_eq!(z1.changes.len(), 2);
        assert_eq!(z2.changes.len(), 1);
        assert!(batches.iter().all(|b| !b.changes.is_empty()));
    }

    #[test]
    fn rerun_after_apply_is_idempotent() {
        let zones = zone_z();
        let observed = ObservedAddresses::new(Some(v4("5.6.7.8")), Some(v6("2001:db8::9")));
        let stale = current(&[("www.example.dev", &["1.2.3.4", "2001:db8::1"])]);

        let first = build_batches(&observed, &stale, &zones);
        assert_eq!(first[0].changes.len(), 2);

        // provider state after the upserts above
        let applied: CurrentRecords = [(
            "www.example.dev".to_string(),
            first[0]
                .changes
                .iter()
                .map(|c| DnsRecord::new(c.fqdn.as_str(), c.address))
                .collect(),
        )]
        .into_iter()
        .collect();

        assert!(build_batches(&observed, &applied, &zones).is_empty());
    }

    #[test]
    fn every_stale_value_of_a_multi_value_set_produces_a_change() {
        let records = current(&[("www.example.dev", &["1.2.3.4", "1.2.3.5", "5.6.7.8"])]);
        let observed = ObservedAddresses::new(Some(v4("5.6.7.8")), None);

        let batches = build_batches(&observed, &records, &zone_z());

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].changes.len(), 2);
    }
}
