//! Test doubles and common utilities for contract tests
//!
//! The doubles share their state through `Arc`, so a test can hand a clone
//! to the engine and keep another clone for assertions.

#![allow(dead_code)]

use ddns_core::config::{DdnsConfig, IpSourceConfig, ProviderConfig};
use ddns_core::error::{Error, Result};
use ddns_core::model::Change;
use ddns_core::traits::{DnsProvider, IpSource, RecordSet};
use ddns_core::zones::ManagedZone;
use std::collections::{HashMap, HashSet};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// How a scripted IP source answers one family
#[derive(Debug, Clone)]
pub enum Answer<T> {
    /// Return this address
    Ip(T),
    /// Return an error
    Fail,
    /// Never answer
    Hang,
}

/// An IpSource with scripted answers per family
#[derive(Clone)]
pub struct ScriptedIpSource {
    v4: Arc<Mutex<Answer<Ipv4Addr>>>,
    v6: Arc<Mutex<Answer<Ipv6Addr>>>,
    v4_calls: Arc<AtomicUsize>,
    v6_calls: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn new(v4: Answer<Ipv4Addr>, v6: Answer<Ipv6Addr>) -> Self {
        Self {
            v4: Arc::new(Mutex::new(v4)),
            v6: Arc::new(Mutex::new(v6)),
            v4_calls: Arc::new(AtomicUsize::new(0)),
            v6_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Source answering only IPv4
    pub fn v4_only(ip: &str) -> Self {
        Self::new(Answer::Ip(ip.parse().unwrap()), Answer::Fail)
    }

    pub fn set_v4(&self, answer: Answer<Ipv4Addr>) {
        *self.v4.lock().unwrap() = answer;
    }

    pub fn set_v6(&self, answer: Answer<Ipv6Addr>) {
        *self.v6.lock().unwrap() = answer;
    }

    pub fn v4_calls(&self) -> usize {
        self.v4_calls.load(Ordering::SeqCst)
    }

    pub fn v6_calls(&self) -> usize {
        self.v6_calls.load(Ordering::SeqCst)
    }
}

async fn answer<T: Copy>(script: &Mutex<Answer<T>>, family: &str) -> Result<T> {
    let current = script.lock().unwrap().clone();
    match current {
        Answer::Ip(ip) => Ok(ip),
        Answer::Fail => Err(Error::ip_source(format!("scripted {} failure", family))),
        Answer::Hang => std::future::pending().await,
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn ipv4(&self) -> Result<Ipv4Addr> {
        self.v4_calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.v4, "ipv4").await
    }

    async fn ipv6(&self) -> Result<Ipv6Addr> {
        self.v6_calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.v6, "ipv6").await
    }
}

/// An in-memory hosted-zone provider
///
/// Submitted changes are applied to the stored record sets, so a second
/// cycle sees the provider state the first one produced.
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    zones: Arc<Mutex<HashMap<String, Vec<RecordSet>>>>,
    failing_list: Arc<Mutex<HashSet<String>>>,
    failing_change: Arc<Mutex<HashSet<String>>>,
    hanging_list: Arc<Mutex<bool>>,
    submitted: Arc<Mutex<Vec<(String, Vec<Change>)>>>,
    list_call_count: Arc<AtomicUsize>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record set to a zone
    pub fn with_set(self, zone_id: &str, name: &str, record_type: &str, values: &[&str]) -> Self {
        self.zones
            .lock()
            .unwrap()
            .entry(zone_id.to_string())
            .or_default()
            .push(RecordSet::new(name, record_type, values.iter().copied()));
        self
    }

    /// Make listing this zone fail
    pub fn fail_list(&self, zone_id: &str) {
        self.failing_list.lock().unwrap().insert(zone_id.to_string());
    }

    /// Make submitting changes to this zone fail
    pub fn fail_change(&self, zone_id: &str) {
        self.failing_change.lock().unwrap().insert(zone_id.to_string());
    }

    /// Make every listing call hang
    pub fn hang_list(&self) {
        *self.hanging_list.lock().unwrap() = true;
    }

    /// Change requests accepted so far, in order
    pub fn submitted(&self) -> Vec<(String, Vec<Change>)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    /// Current values of a record set
    pub fn values(&self, zone_id: &str, name: &str, record_type: &str) -> Vec<String> {
        self.zones
            .lock()
            .unwrap()
            .get(zone_id)
            .and_then(|sets| {
                sets.iter()
                    .find(|s| s.name == name && s.record_type == record_type)
                    .map(|s| s.values.clone())
            })
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);

        let hang = *self.hanging_list.lock().unwrap();
        if hang {
            std::future::pending::<()>().await;
        }

        if self.failing_list.lock().unwrap().contains(zone_id) {
            return Err(Error::provider("mock", format!("list failed for {}", zone_id)));
        }

        Ok(self
            .zones
            .lock()
            .unwrap()
            .get(zone_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn change_record_sets(&self, zone_id: &str, changes: &[Change]) -> Result<()> {
        if self.failing_change.lock().unwrap().contains(zone_id) {
            return Err(Error::provider("mock", format!("change failed for {}", zone_id)));
        }

        let mut zones = self.zones.lock().unwrap();
        let sets = zones.entry(zone_id.to_string()).or_default();
        for change in changes {
            let value = change.address.to_string();
            match sets
                .iter_mut()
                .find(|s| s.name == change.fqdn && s.record_type == change.record_type.as_str())
            {
                Some(set) => set.values = vec![value],
                None => sets.push(RecordSet::new(
                    change.fqdn.as_str(),
                    change.record_type.as_str(),
                    [value],
                )),
            }
        }

        self.submitted
            .lock()
            .unwrap()
            .push((zone_id.to_string(), changes.to_vec()));
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(zones: Vec<ManagedZone>) -> DdnsConfig {
    DdnsConfig {
        process_timeout_seconds: 10,
        check_every_seconds: 60,
        ip_source: IpSourceConfig::default(),
        aws: ProviderConfig {
            credentials_file: None,
            region: None,
            zones,
        },
    }
}

/// Zone `Z` managing `www.example.dev` and `vpn.example.dev`
pub fn example_zone() -> ManagedZone {
    ManagedZone::new("Z", ["www.example.dev", "vpn.example.dev"])
}
