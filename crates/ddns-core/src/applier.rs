//! Batch applier
//!
//! Submits each batch as one provider request. The first failure stops the
//! remaining submissions; batches already applied stay applied, relying on
//! the provider's per-zone atomicity.

use crate::error::{Error, Result};
use crate::model::Batch;
use crate::traits::DnsProvider;
use crate::zones::ZoneDirectory;
use tracing::{debug, info};

/// Apply `batches` in order, stopping at the first failing one
pub async fn apply(
    provider: &dyn DnsProvider,
    zones: &ZoneDirectory,
    batches: &[Batch],
) -> Result<()> {
    for batch in batches {
        let zone = zones
            .get(&batch.zone_id)
            .ok_or_else(|| Error::not_found(format!("zone-id {} is not managed", batch.zone_id)))?;

        debug!(
            "Submitting {} change(s) to zone {} via {}",
            batch.changes.len(),
            zone.id,
            provider.provider_name()
        );

        provider
            .change_record_sets(&zone.id, &batch.changes)
            .await
            .map_err(|e| {
                Error::dns_provider(format!(
                    "unable to update records for zone-id {}: {}",
                    zone.id, e
                ))
            })?;

        for change in &batch.changes {
            info!("Updated {} in zone {}", change, zone.id);
        }
    }

    Ok(())
}
