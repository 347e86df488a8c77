// ── IP range matching ──
//
// Picks the gateway uplink whose sub-allocated ranges contain an external
// address. Ranges are compared as big-endian u32 values, inclusive at both
// ends.

use std::net::Ipv4Addr;

use tracing::{debug, warn};
use vchs_api::types::{EdgeGateway, IpRange, Reference};

use crate::error::CoreError;

/// Pack a dotted-quad literal into a `u32`, most significant octet first.
pub fn address_to_integer(addr: &str) -> Result<u32, CoreError> {
    let parsed: Ipv4Addr = addr.trim().parse().map_err(|_| CoreError::Config {
        message: format!("'{addr}' is not an IPv4 address"),
    })?;
    Ok(u32::from_be_bytes(parsed.octets()))
}

/// An inclusive `[start, end]` address range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    start: u32,
    end: u32,
}

impl AddressRange {
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        (self.start..=self.end).contains(&u32::from(addr))
    }
}

impl TryFrom<&IpRange> for AddressRange {
    type Error = CoreError;

    fn try_from(range: &IpRange) -> Result<Self, Self::Error> {
        Ok(Self {
            start: address_to_integer(&range.start_address)?,
            end: address_to_integer(&range.end_address)?,
        })
    }
}

/// Whether `addr` falls inside `range`; malformed bounds never match.
pub fn in_range(addr: Ipv4Addr, range: &IpRange) -> bool {
    AddressRange::try_from(range).is_ok_and(|r| r.contains(addr))
}

/// The network behind the first uplink range that contains `external_ip`.
///
/// Interfaces other than uplinks are ignored. A range with an unparsable
/// bound is skipped with a warning.
pub fn select_uplink_network<'g>(
    gateway: &'g EdgeGateway,
    external_ip: Ipv4Addr,
) -> Result<&'g Reference, CoreError> {
    for interface in gateway.interfaces().iter().filter(|i| i.is_uplink()) {
        let Some(network) = interface.network.as_ref() else {
            continue;
        };
        for participation in &interface.subnet_participations {
            for range in participation.ranges() {
                match AddressRange::try_from(range) {
                    Ok(r) if r.contains(external_ip) => {
                        debug!(
                            interface = %interface.name,
                            network = %network.href,
                            "external address matched uplink range"
                        );
                        return Ok(network);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(
                            interface = %interface.name,
                            start = %range.start_address,
                            end = %range.end_address,
                            error = %e,
                            "skipping malformed ip range"
                        );
                    }
                }
            }
        }
    }

    Err(CoreError::not_found(
        format!("uplink range containing {external_ip}"),
        format!("edge gateway {}", gateway.name),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vchs_api::types::{
        GatewayConfiguration, GatewayInterface, GatewayInterfaces, IpRanges, SubnetParticipation,
    };

    use super::*;

    fn range(start: &str, end: &str) -> IpRange {
        IpRange {
            start_address: start.into(),
            end_address: end.into(),
        }
    }

    fn interface(kind: &str, network: &str, ranges: Vec<IpRange>) -> GatewayInterface {
        GatewayInterface {
            name: network.into(),
            network: Some(Reference::to_href(format!("https://vcd/network/{network}"))),
            interface_type: kind.into(),
            subnet_participations: vec![SubnetParticipation {
                ip_ranges: Some(IpRanges { ranges }),
                ..SubnetParticipation::default()
            }],
            ..GatewayInterface::default()
        }
    }

    fn gateway(interfaces: Vec<GatewayInterface>) -> EdgeGateway {
        EdgeGateway {
            name: "gw-1".into(),
            href: "https://vcd/gw/1".into(),
            configuration: Some(GatewayConfiguration {
                backing_config: None,
                interfaces: Some(GatewayInterfaces { interfaces }),
            }),
            ..EdgeGateway::default()
        }
    }

    #[test]
    fn address_packs_big_endian() {
        assert_eq!(address_to_integer("0.0.0.0").unwrap(), 0);
        assert_eq!(address_to_integer("0.0.1.0").unwrap(), 256);
        assert_eq!(address_to_integer("10.0.0.1").unwrap(), 0x0A00_0001);
        assert_eq!(address_to_integer("255.255.255.255").unwrap(), u32::MAX);
        assert!(address_to_integer("10.0.0").is_err());
        assert!(address_to_integer("10.0.0.256").is_err());
    }

    #[test]
    fn conversion_preserves_order_within_a_subnet() {
        let values: Vec<u32> = (0..=255u8)
            .map(|host| address_to_integer(&format!("192.168.7.{host}")).unwrap())
            .collect();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let r = range("203.0.113.10", "203.0.113.20");
        assert!(in_range(Ipv4Addr::new(203, 0, 113, 10), &r));
        assert!(in_range(Ipv4Addr::new(203, 0, 113, 20), &r));
        assert!(in_range(Ipv4Addr::new(203, 0, 113, 15), &r));
        assert!(!in_range(Ipv4Addr::new(203, 0, 113, 9), &r));
        assert!(!in_range(Ipv4Addr::new(203, 0, 113, 21), &r));
    }

    #[test]
    fn malformed_range_never_matches() {
        let r = range("203.0.113.x", "203.0.113.20");
        assert!(!in_range(Ipv4Addr::new(203, 0, 113, 15), &r));
    }

    #[test]
    fn selects_first_matching_uplink() {
        let gw = gateway(vec![
            interface("internal", "routed", vec![range("203.0.113.1", "203.0.113.254")]),
            interface("uplink", "ext-a", vec![range("198.51.100.1", "198.51.100.9")]),
            interface("uplink", "ext-b", vec![range("203.0.113.10", "203.0.113.20")]),
            interface("uplink", "ext-c", vec![range("203.0.113.1", "203.0.113.254")]),
        ]);
        let network = select_uplink_network(&gw, Ipv4Addr::new(203, 0, 113, 12)).unwrap();
        assert_eq!(network.href, "https://vcd/network/ext-b");
    }

    #[test]
    fn malformed_ranges_are_skipped_not_fatal() {
        let gw = gateway(vec![interface(
            "uplink",
            "ext-a",
            vec![range("bogus", "203.0.113.20"), range("203.0.113.10", "203.0.113.20")],
        )]);
        let network = select_uplink_network(&gw, Ipv4Addr::new(203, 0, 113, 12)).unwrap();
        assert_eq!(network.href, "https://vcd/network/ext-a");
    }

    #[test]
    fn no_match_names_the_gateway() {
        let gw = gateway(vec![interface(
            "uplink",
            "ext-a",
            vec![range("198.51.100.1", "198.51.100.9")],
        )]);
        match select_uplink_network(&gw, Ipv4Addr::new(203, 0, 113, 12)).unwrap_err() {
            CoreError::NotFound { context, .. } => assert!(context.contains("gw-1"), "got: {context}"),
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }
}
