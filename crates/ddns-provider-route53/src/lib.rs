// # Route 53 DNS Provider
//
// This crate provides the AWS Route 53 implementation of `DnsProvider`.
//
// ## Behavior
//
// - Lists every record set of a hosted zone, following pagination
// - Submits one zone's changes as a single `ChangeResourceRecordSets` call
// - Every change is an UPSERT with a single value and the change's TTL
// - No retries, no caching: the engine re-reads and resubmits next cycle
//
// ## Credentials
//
// With `credentials-file` set, credentials come from the `default` profile of
// that shared-credentials file. Without it, the standard AWS chain applies
// (environment, shared config, instance metadata).
//
// ## API Reference
//
// - ListResourceRecordSets: https://docs.aws.amazon.com/Route53/latest/APIReference/API_ListResourceRecordSets.html
// - ChangeResourceRecordSets: https://docs.aws.amazon.com/Route53/latest/APIReference/API_ChangeResourceRecordSets.html

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_route53::Client;
use aws_sdk_route53::config::Region;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types::{
    Change as Route53Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use ddns_core::config::ProviderConfig;
use ddns_core::model::Change;
use ddns_core::traits::{DnsProvider, RecordSet};
use ddns_core::{Error, Result};
use std::collections::HashSet;
use std::path::Path;

/// Name used in provider errors and logs
const PROVIDER_NAME: &str = "route53";

/// Profile read from a configured shared-credentials file
const CREDENTIALS_PROFILE: &str = "default";

/// Region used when neither the configuration nor the environment has one
///
/// Route 53 is a global service; the region only selects the endpoint.
const FALLBACK_REGION: &str = "us-east-1";

/// AWS Route 53 DNS provider
#[derive(Debug, Clone)]
pub struct Route53Provider {
    client: Client,
}

impl Route53Provider {
    /// Wrap an already configured Route 53 client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the `aws` section of the configuration
    ///
    /// Fails if a configured credentials file is not a readable file, or if
    /// its `default` profile does not resolve to credentials.
    pub async fn from_config(config: &ProviderConfig) -> Result<Self> {
        let region = RegionProviderChain::first_try(config.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::new(FALLBACK_REGION));

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);

        if let Some(path) = &config.credentials_file {
            ensure_readable(path).await?;

            let files = ProfileFiles::builder()
                .with_file(ProfileFileKind::Credentials, path)
                .build();
            let credentials = ProfileFileCredentialsProvider::builder()
                .profile_files(files.clone())
                .profile_name(CREDENTIALS_PROFILE)
                .build();

            credentials.provide_credentials().await.map_err(|e| {
                Error::config(format!(
                    "credentials file {} has no usable {} profile: {}",
                    path.display(),
                    CREDENTIALS_PROFILE,
                    DisplayErrorContext(&e)
                ))
            })?;
            tracing::debug!("Using AWS credentials from {}", path.display());

            loader = loader
                .profile_files(files)
                .profile_name(CREDENTIALS_PROFILE)
                .credentials_provider(credentials);
        }

        let sdk_config = loader.load().await;
        Ok(Self::new(Client::new(&sdk_config)))
    }
}

#[async_trait]
impl DnsProvider for Route53Provider {
    async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>> {
        let mut sets = Vec::new();
        let mut start_name: Option<String> = None;
        let mut start_type: Option<RrType> = None;
        let mut start_identifier: Option<String> = None;

        loop {
            let page = self
                .client
                .list_resource_record_sets()
                .hosted_zone_id(zone_id)
                .set_start_record_name(start_name.take())
                .set_start_record_type(start_type.take())
                .set_start_record_identifier(start_identifier.take())
                .send()
                .await
                .map_err(|e| {
                    Error::provider(
                        PROVIDER_NAME,
                        format!(
                            "unable to list record sets of zone {}: {}",
                            zone_id,
                            DisplayErrorContext(&e)
                        ),
                    )
                })?;

            sets.extend(page.resource_record_sets().iter().map(to_record_set));

            if !page.is_truncated() {
                break;
            }

            tracing::trace!(
                "Record set listing of {} truncated, continuing at {:?}",
                zone_id,
                page.next_record_name()
            );
            start_name = page.next_record_name;
            start_type = page.next_record_type;
            start_identifier = page.next_record_identifier;
        }

        Ok(sets)
    }

    async fn change_record_sets(&self, zone_id: &str, changes: &[Change]) -> Result<()> {
        let batch = build_change_batch(changes)?;

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| {
                Error::provider(
                    PROVIDER_NAME,
                    format!(
                        "unable to change record sets of zone {}: {}",
                        zone_id,
                        DisplayErrorContext(&e)
                    ),
                )
            })?;

        tracing::debug!("Zone {} accepted {} change(s)", zone_id, changes.len());

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

async fn ensure_readable(path: &Path) -> Result<()> {
    let unreadable = |reason: String| {
        Error::config(format!(
            "credentials file {} is not readable: {}",
            path.display(),
            reason
        ))
    };

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| unreadable(e.to_string()))?;
    if !metadata.is_file() {
        return Err(unreadable("not a regular file".to_string()));
    }

    tokio::fs::File::open(path)
        .await
        .map(drop)
        .map_err(|e| unreadable(e.to_string()))
}

/// Convert a listed record set, dropping the root dot Route 53 appends
fn to_record_set(set: &ResourceRecordSet) -> RecordSet {
    RecordSet::new(
        set.name().trim_end_matches('.'),
        set.r#type().as_str(),
        set.resource_records().iter().map(|r| r.value()),
    )
}

/// Build one UPSERT batch; identical changes are sent once
///
/// Route 53 rejects a batch that touches the same record set twice.
fn build_change_batch(changes: &[Change]) -> Result<ChangeBatch> {
    let mut seen = HashSet::new();

    let upserts = changes
        .iter()
        .filter(|change| seen.insert(*change))
        .map(to_upsert)
        .collect::<Result<Vec<_>>>()?;

    ChangeBatch::builder()
        .set_changes(Some(upserts))
        .build()
        .map_err(|e| Error::provider(PROVIDER_NAME, format!("invalid change batch: {}", e)))
}

fn to_upsert(change: &Change) -> Result<Route53Change> {
    let invalid = |e: aws_sdk_route53::error::BuildError| {
        Error::provider(
            PROVIDER_NAME,
            format!("invalid change {}: {}", change, e),
        )
    };

    let record = ResourceRecord::builder()
        .value(change.address.to_string())
        .build()
        .map_err(invalid)?;

    let record_set = ResourceRecordSet::builder()
        .name(&change.fqdn)
        .r#type(RrType::from(change.record_type.as_str()))
        .ttl(i64::from(change.ttl))
        .resource_records(record)
        .build()
        .map_err(invalid)?;

    Route53Change::builder()
        .action(ChangeAction::Upsert)
        .resource_record_set(record_set)
        .build()
        .map_err(invalid)
}
