//! Peer Discovery Bootstrap
//!
//! Resolves the well-known discovery name to the set of candidate peers,
//! resolves the local host's own addresses, and excludes self: a node
//! must never register itself as its own replication peer.
//!
//! Discovery failure is non-fatal; the process still boots as a single
//! unreplicated node with an empty peer list.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use tokio::net::lookup_host;
use tracing::{debug, warn};

use crate::store::replication::REPLICATION_PORT;

// == Discover Peers ==
/// Resolves the discovery name and returns peer endpoint URLs.
///
/// No ordering guarantee; duplicate addresses are tolerated (the store
/// treats peer lists idempotently).
pub async fn discover_peers(discovery_name: &str) -> Vec<String> {
    let candidates = match resolve_all(discovery_name).await {
        Ok(addrs) => addrs,
        Err(err) => {
            warn!(
                "Peer discovery for '{}' failed, starting unreplicated: {}",
                discovery_name, err
            );
            return Vec::new();
        }
    };

    let own = own_addresses().await;
    let peers = exclude_self(candidates, &own);
    debug!(
        "Discovered {} peer(s) under '{}' (excluded {} own address(es))",
        peers.len(),
        discovery_name,
        own.len()
    );

    peers.into_iter().map(peer_url).collect()
}

/// Resolves a name to all of its addresses.
async fn resolve_all(name: &str) -> std::io::Result<Vec<IpAddr>> {
    let addrs = lookup_host((name, 0u16)).await?;
    Ok(addrs.map(|sock| sock.ip()).collect())
}

/// Resolves the local host's own addresses via the same facility.
async fn own_addresses() -> HashSet<IpAddr> {
    let name = match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(err) => {
            warn!("Failed to read local hostname: {}", err);
            return HashSet::new();
        }
    };

    match resolve_all(&name).await {
        Ok(addrs) => addrs.into_iter().collect(),
        Err(err) => {
            warn!("Failed to resolve own hostname '{}': {}", name, err);
            HashSet::new()
        }
    }
}

// == Self Exclusion ==
/// Filters out every candidate that is one of the local host's own
/// addresses, independent of input ordering.
pub fn exclude_self(candidates: Vec<IpAddr>, own: &HashSet<IpAddr>) -> Vec<IpAddr> {
    candidates
        .into_iter()
        .filter(|addr| !own.contains(addr))
        .collect()
}

// == Peer URL ==
/// Maps an address to its replication endpoint on the well-known port.
pub fn peer_url(addr: IpAddr) -> String {
    format!("tcp://{}", SocketAddr::new(addr, REPLICATION_PORT))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_excludes_own_address() {
        let own: HashSet<IpAddr> = [ip("10.0.0.5")].into_iter().collect();
        let candidates = vec![ip("10.0.0.5"), ip("10.0.0.6"), ip("10.0.0.7")];

        let peers = exclude_self(candidates, &own);
        assert_eq!(peers, vec![ip("10.0.0.6"), ip("10.0.0.7")]);
    }

    #[test]
    fn test_exclusion_is_order_independent() {
        let own: HashSet<IpAddr> = [ip("10.0.0.5")].into_iter().collect();
        let candidates = vec![ip("10.0.0.7"), ip("10.0.0.5"), ip("10.0.0.6")];

        let peers = exclude_self(candidates, &own);
        assert_eq!(peers.len(), 2);
        assert!(!peers.contains(&ip("10.0.0.5")));
    }

    #[test]
    fn test_empty_own_set_keeps_all_candidates() {
        let own = HashSet::new();
        let candidates = vec![ip("10.0.0.6"), ip("10.0.0.7")];

        assert_eq!(exclude_self(candidates.clone(), &own), candidates);
    }

    #[test]
    fn test_duplicates_are_tolerated() {
        let own: HashSet<IpAddr> = [ip("10.0.0.5")].into_iter().collect();
        let candidates = vec![ip("10.0.0.6"), ip("10.0.0.6"), ip("10.0.0.5")];

        let peers = exclude_self(candidates, &own);
        assert_eq!(peers, vec![ip("10.0.0.6"), ip("10.0.0.6")]);
    }

    #[test]
    fn test_peer_url_uses_well_known_port() {
        assert_eq!(
            peer_url(ip("10.0.0.6")),
            format!("tcp://10.0.0.6:{}", REPLICATION_PORT)
        );
    }

    #[test]
    fn test_peer_url_brackets_ipv6() {
        assert_eq!(
            peer_url(ip("::1")),
            format!("tcp://[::1]:{}", REPLICATION_PORT)
        );
    }

    #[tokio::test]
    async fn test_unresolvable_discovery_name_is_non_fatal() {
        let peers = discover_peers("definitely-not-a-real-host.invalid").await;
        assert!(peers.is_empty());
    }
}
