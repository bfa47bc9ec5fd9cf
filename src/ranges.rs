/* src/ranges.rs */

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Blocks that never identify a client on the public internet.
///
/// Loopback, the three RFC1918 blocks, IPv6 link-local and unique-local.
/// The table is built at compile time and never changes.
pub static PRIVATE_RANGES: [IpNet; 7] = [
    IpNet::V4(Ipv4Net::new_assert(Ipv4Addr::new(127, 0, 0, 0), 8)),
    IpNet::V4(Ipv4Net::new_assert(Ipv4Addr::new(10, 0, 0, 0), 8)),
    IpNet::V4(Ipv4Net::new_assert(Ipv4Addr::new(172, 16, 0, 0), 12)),
    IpNet::V4(Ipv4Net::new_assert(Ipv4Addr::new(192, 168, 0, 0), 16)),
    IpNet::V6(Ipv6Net::new_assert(Ipv6Addr::LOCALHOST, 128)),
    IpNet::V6(Ipv6Net::new_assert(
        Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0),
        10,
    )),
    IpNet::V6(Ipv6Net::new_assert(
        Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0),
        7,
    )),
];

/// Check if IP falls inside one of the [`PRIVATE_RANGES`].
///
/// IPv4-mapped IPv6 addresses are checked as their IPv4 form.
pub fn is_private(ip: &IpAddr) -> bool {
    let ip = ip.to_canonical();
    PRIVATE_RANGES.iter().any(|net| net.contains(&ip))
}

/// Check if IP is a global unicast address.
///
/// Rejects unspecified, loopback, multicast, link-local unicast and the
/// IPv4 broadcast address. Private ranges still count as global unicast
/// here; callers combine this with [`is_private`].
pub fn is_global_unicast(ip: &IpAddr) -> bool {
    match ip.to_canonical() {
        IpAddr::V4(ipv4) => {
            !(ipv4.is_unspecified()
                || ipv4.is_loopback()
                || ipv4.is_multicast()
                || ipv4.is_link_local()
                || ipv4.is_broadcast())
        }
        IpAddr::V6(ipv6) => {
            !(ipv6.is_unspecified()
                || ipv6.is_loopback()
                || ipv6.is_multicast()
                || (ipv6.segments()[0] & 0xffc0) == 0xfe80) // Link local
        }
    }
}

/// An address worth reporting as somebody's public IP.
pub fn is_public(ip: &IpAddr) -> bool {
    is_global_unicast(ip) && !is_private(ip)
}
