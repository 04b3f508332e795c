// # HTTP IP Source
//
// This crate provides the HTTP-based public IP source for the DDNS system.
//
// ## Architecture
//
// Each family has its own discovery endpoint answering `{"ip": "<address>"}`
// (ipify by default). One GET per call, no caching: the engine asks once
// per cycle and bounds every call with its own deadline.

use ddns_core::config::IpSourceConfig;
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use tracing::debug;

/// Transport-level timeout for one discovery request
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Body returned by the discovery endpoints
#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: String,
}

/// Public IP discovery over HTTP
pub struct HttpIpSource {
    /// Endpoint answering with the public IPv4 address
    ipv4_url: String,

    /// Endpoint answering with the public IPv6 address
    ipv6_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `ipv4_url`: endpoint for IPv4 (e.g., "https://api.ipify.org/?format=json")
    /// - `ipv6_url`: endpoint for IPv6 (e.g., "https://api6.ipify.org/?format=json")
    pub fn new(ipv4_url: impl Into<String>, ipv6_url: impl Into<String>) -> Self {
        Self {
            ipv4_url: ipv4_url.into(),
            ipv6_url: ipv6_url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create from the `ip-source` section of the configuration
    pub fn from_config(config: &IpSourceConfig) -> Self {
        Self::new(config.ipv4_url.clone(), config.ipv6_url.clone())
    }

    /// Fetch and decode one address from `url`
    async fn get_ip(&self, url: &str) -> Result<IpAddr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::http(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::ip_source(format!(
                "unable to get public ip, http code {} from {}",
                status.as_u16(),
                url
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::http(format!("reading response from {} failed: {}", url, e)))?;

        let decoded: IpResponse = serde_json::from_slice(&body).map_err(|e| {
            Error::ip_source(format!(
                "unable to get public ip, body unmarshal error: {} from {}",
                e, url
            ))
        })?;

        let ip = decoded
            .ip
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| Error::ip_source(format!("invalid ip value {}", decoded.ip)))?;

        debug!("{} answered {}", url, ip);
        Ok(ip)
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn ipv4(&self) -> Result<Ipv4Addr> {
        match self.get_ip(&self.ipv4_url).await? {
            IpAddr::V4(ip) => Ok(ip),
            IpAddr::V6(ip) => Err(Error::ip_source(format!(
                "expected an IPv4 address from {}, got {}",
                self.ipv4_url, ip
            ))),
        }
    }

    async fn ipv6(&self) -> Result<Ipv6Addr> {
        match self.get_ip(&self.ipv6_url).await? {
            IpAddr::V6(ip) => Ok(ip),
            IpAddr::V4(ip) => Err(Error::ip_source(format!(
                "expected an IPv6 address from {}, got {}",
                self.ipv6_url, ip
            ))),
        }
    }
}
