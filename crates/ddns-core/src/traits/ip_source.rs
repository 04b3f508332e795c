// # IP Source Trait
//
// Defines the interface for discovering the current public addresses.
//
// ## Implementations
//
// - HTTP (ipify-style JSON endpoints): `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let (v4, v6) = tokio::join!(source.ipv4(), source.ipv6());
//     println!("ipv4: {:?}, ipv6: {:?}", v4, v6);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Trait for public IP discovery
///
/// The two calls are independent: the engine runs them concurrently, each
/// under its own deadline, and a failure of one never affects the other.
///
/// Implementations must be thread-safe and cancellation-safe. A call that
/// is dropped because its deadline expired must leave no work behind.
///
/// Implementations do not retry. An error simply means the address is
/// unknown for this cycle; the next scheduled cycle asks again.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Current public IPv4 address
    async fn ipv4(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Current public IPv6 address
    async fn ipv6(&self) -> Result<Ipv6Addr, crate::Error>;
}
