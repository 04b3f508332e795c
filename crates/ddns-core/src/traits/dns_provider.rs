// # DNS Provider Trait
//
// Defines the interface to the hosted-zone API.
//
// ## Implementations
//
// - Route 53: `ddns-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
// use ddns_core::model::Change;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let sets = provider.list_record_sets("Z07083213LQ5Y6BC1F8GR").await?;
//     provider
//         .change_record_sets(
//             "Z07083213LQ5Y6BC1F8GR",
//             &[Change::upsert("www.example.dev", "5.6.7.8".parse()?)],
//         )
//         .await?;
//
//     Ok(())
// }
// ```

use crate::model::Change;
use async_trait::async_trait;

/// One record set as listed by the provider
///
/// Values are kept as raw strings: filtering and parsing belong to the
/// record reader, which decides what counts as malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    /// Record name, without the trailing root dot
    pub name: String,
    /// Wire record type ("A", "AAAA", "CNAME", ...)
    pub record_type: String,
    /// Raw record values
    pub values: Vec<String>,
}

impl RecordSet {
    pub fn new<I, S>(name: impl Into<String>, record_type: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Trait for DNS provider implementations
///
/// Providers are thin API adapters:
/// - they list a zone's record sets exactly as stored;
/// - they submit one zone's changes as a single atomic request;
/// - they never decide whether an update is needed (owned by the reconciler);
/// - they never retry (the next cycle recomputes and resubmits).
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every record set of a hosted zone
    ///
    /// Implementations must follow pagination so the result is complete.
    /// A partial listing must be reported as an error.
    async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>, crate::Error>;

    /// Upsert all `changes` into a hosted zone in one request
    async fn change_record_sets(
        &self,
        zone_id: &str,
        changes: &[Change],
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
