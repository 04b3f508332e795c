//! Configuration types for the DDNS system
//!
//! The configuration is a YAML document with a single `ddns` root node:
//!
//! ```yaml
//! ddns:
//!   process-timeout-seconds: 10
//!   check-every-seconds: 300
//!   aws:
//!     credentials-file: /etc/ddns/credentials
//!     zones:
//!       - id: Z07083213LQ5Y6BC1F8GR
//!         records:
//!           - www.example.dev
//!           - vpn.example.dev
//! ```

use crate::error::{Error, Result};
use crate::zones::{ManagedZone, ZoneDirectory};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default IPv4 discovery endpoint
pub const DEFAULT_IPV4_URL: &str = "https://api.ipify.org/?format=json";

/// Default IPv6 discovery endpoint
pub const DEFAULT_IPV6_URL: &str = "https://api6.ipify.org/?format=json";

/// Top-level configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub ddns: DdnsConfig,
}

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DdnsConfig {
    /// Upper bound for one fetch → reconcile → apply cycle
    pub process_timeout_seconds: u64,

    /// Period between cycle starts; must exceed the timeout
    pub check_every_seconds: u64,

    /// Public IP discovery endpoints
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Route 53 access and managed zones
    pub aws: ProviderConfig,
}

impl DdnsConfig {
    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("unable to read config file {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(raw)?;
        let mut config = file.ddns;
        config.aws.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.process_timeout_seconds == 0 {
            return Err(Error::config("process-timeout-seconds must be > 0"));
        }

        if self.check_every_seconds <= self.process_timeout_seconds {
            return Err(Error::config(format!(
                "configured times error, check-every-seconds ({}) must exceed process-timeout-seconds ({})",
                self.check_every_seconds, self.process_timeout_seconds
            )));
        }

        self.ip_source.validate()?;
        self.aws.validate()?;

        Ok(())
    }

    /// Overall deadline for one cycle
    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_seconds)
    }

    /// Period between cycle starts
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_every_seconds)
    }

    /// Build the zone directory described by this configuration
    pub fn zone_directory(&self) -> ZoneDirectory {
        ZoneDirectory::new(self.aws.zones.clone())
    }
}

/// Public IP discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IpSourceConfig {
    /// Endpoint answering `{"ip": "<v4 literal>"}`
    #[serde(default = "default_ipv4_url")]
    pub ipv4_url: String,

    /// Endpoint answering `{"ip": "<v6 literal>"}`
    #[serde(default = "default_ipv6_url")]
    pub ipv6_url: String,
}

impl IpSourceConfig {
    pub fn validate(&self) -> Result<()> {
        for (key, url) in [("ipv4-url", &self.ipv4_url), ("ipv6-url", &self.ipv6_url)] {
            if url.is_empty() {
                return Err(Error::config(format!("ip-source {} cannot be empty", key)));
            }
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(Error::config(format!(
                    "ip-source {} must use HTTP or HTTPS scheme. Got: {}",
                    key, url
                )));
            }
        }
        Ok(())
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            ipv4_url: default_ipv4_url(),
            ipv6_url: default_ipv6_url(),
        }
    }
}

fn default_ipv4_url() -> String {
    DEFAULT_IPV4_URL.to_string()
}

fn default_ipv6_url() -> String {
    DEFAULT_IPV6_URL.to_string()
}

/// DNS provider (Route 53) configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProviderConfig {
    /// Shared credentials file; the SDK default chain is used when absent
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,

    /// Signing region; the SDK default chain is used when absent
    #[serde(default)]
    pub region: Option<String>,

    /// Hosted zones and the FQDNs each one manages
    #[serde(default)]
    pub zones: Vec<ManagedZone>,
}

impl ProviderConfig {
    /// Lowercase every managed FQDN and strip its trailing root dot
    ///
    /// Providers list names in lowercase; matching against them is exact.
    fn normalize(&mut self) {
        for zone in &mut self.zones {
            for record in &mut zone.records {
                let trimmed = record.strip_suffix('.').unwrap_or(record.as_str());
                *record = trimmed.to_ascii_lowercase();
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.credentials_file
            && path.as_os_str().is_empty()
        {
            return Err(Error::config("aws credentials-file cannot be empty"));
        }

        if self.zones.is_empty() {
            return Err(Error::config("No zones configured"));
        }

        let mut seen = HashSet::new();
        for zone in &self.zones {
            if zone.id.is_empty() {
                return Err(Error::config("zone id cannot be empty"));
            }
            if zone.records.is_empty() {
                return Err(Error::config(format!(
                    "zone {} does not manage any record",
                    zone.id
                )));
            }
            for record in &zone.records {
                if record.is_empty() {
                    return Err(Error::config(format!(
                        "zone {} lists an empty record name",
                        zone.id
                    )));
                }
                if !seen.insert(record.as_str()) {
                    return Err(Error::config(format!(
                        "record {} is managed by more than one zone entry",
                        record
                    )));
                }
            }
        }

        Ok(())
    }
}
