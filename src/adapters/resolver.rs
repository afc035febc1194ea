//! Local address discovery.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::debug;

use super::AddressResolver;

/// Asks the OS which interface address it would route outbound traffic
/// from. Connecting a UDP socket sends no packets.
pub struct SystemResolver {
    v4_target: SocketAddr,
    v6_target: SocketAddr,
}

impl SystemResolver {
    pub fn new() -> Self {
        Self {
            v4_target: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)), 53),
            v6_target: SocketAddr::new(
                IpAddr::V6(Ipv6Addr::new(0x2606, 0x4700, 0x4700, 0, 0, 0, 0, 0x1111)),
                53,
            ),
        }
    }

    async fn route_source(bind: SocketAddr, target: SocketAddr) -> Option<IpAddr> {
        let socket = UdpSocket::bind(bind).await.ok()?;
        socket.connect(target).await.ok()?;
        let local = socket.local_addr().ok()?.ip();
        (!local.is_unspecified()).then_some(local)
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressResolver for SystemResolver {
    async fn resolve_local_addresses(&self) -> std::io::Result<Vec<IpAddr>> {
        let mut found = Vec::new();

        let any_v4 = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);
        if let Some(ip) = Self::route_source(any_v4, self.v4_target).await {
            found.push(ip);
        }
        let any_v6 = SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0);
        if let Some(ip) = Self::route_source(any_v6, self.v6_target).await {
            found.push(ip);
        }

        debug!(addresses = ?found, "Local addresses discovered");
        Ok(found)
    }
}

/// Returns a fixed address list. Used for the `public_address` override.
pub struct StaticResolver {
    addresses: Vec<IpAddr>,
}

impl StaticResolver {
    pub fn new(addresses: Vec<IpAddr>) -> Self {
        Self { addresses }
    }
}

#[async_trait]
impl AddressResolver for StaticResolver {
    async fn resolve_local_addresses(&self) -> std::io::Result<Vec<IpAddr>> {
        Ok(self.addresses.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver_returns_list() {
        let v4: IpAddr = "203.0.113.7".parse().unwrap();
        let v6: IpAddr = "2001:db8::1".parse().unwrap();
        let resolver = StaticResolver::new(vec![v6, v4]);
        assert_eq!(resolver.resolve_local_addresses().await.unwrap(), vec![v6, v4]);
    }

    #[tokio::test]
    async fn test_system_resolver_never_reports_unspecified() {
        // Sandboxes may have no route at all; only the shape is checked.
        let found = SystemResolver::new().resolve_local_addresses().await.unwrap();
        assert!(found.iter().all(|ip| !ip.is_unspecified()));
        assert!(found.len() <= 2);
    }
}
