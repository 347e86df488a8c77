// Edge gateway documents: the gateway itself (read for its interfaces) and
// the service configuration posted to add NAT and firewall rules.

use serde::{Deserialize, Serialize};

use super::{Link, Reference, ns};

// ── Gateway ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EdgeGateway {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@href")]
    pub href: String,
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
    #[serde(rename = "Configuration", default)]
    pub configuration: Option<GatewayConfiguration>,
}

impl EdgeGateway {
    pub fn interfaces(&self) -> &[GatewayInterface] {
        self.configuration
            .as_ref()
            .and_then(|c| c.interfaces.as_ref())
            .map_or(&[], |i| i.interfaces.as_slice())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfiguration {
    #[serde(rename = "GatewayBackingConfig", default)]
    pub backing_config: Option<String>,
    #[serde(rename = "GatewayInterfaces", default)]
    pub interfaces: Option<GatewayInterfaces>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayInterfaces {
    #[serde(rename = "GatewayInterface", default)]
    pub interfaces: Vec<GatewayInterface>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayInterface {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "DisplayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "Network", default)]
    pub network: Option<Reference>,
    #[serde(rename = "InterfaceType", default)]
    pub interface_type: String,
    #[serde(rename = "SubnetParticipation", default)]
    pub subnet_participations: Vec<SubnetParticipation>,
}

impl GatewayInterface {
    /// Uplinks face the external network; the others are internal.
    pub fn is_uplink(&self) -> bool {
        self.interface_type.eq_ignore_ascii_case("uplink")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubnetParticipation {
    #[serde(rename = "Gateway", default)]
    pub gateway: Option<String>,
    #[serde(rename = "Netmask", default)]
    pub netmask: Option<String>,
    #[serde(rename = "IpAddress", default)]
    pub ip_address: Option<String>,
    #[serde(rename = "IpRanges", default)]
    pub ip_ranges: Option<IpRanges>,
}

impl SubnetParticipation {
    pub fn ranges(&self) -> &[IpRange] {
        self.ip_ranges.as_ref().map_or(&[], |r| r.ranges.as_slice())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IpRanges {
    #[serde(rename = "IpRange", default)]
    pub ranges: Vec<IpRange>,
}

/// Dotted-quad bounds exactly as the server sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct IpRange {
    #[serde(rename = "StartAddress")]
    pub start_address: String,
    #[serde(rename = "EndAddress")]
    pub end_address: String,
}

// ── Service configuration ───────────────────────────────────────────

/// Body of the gateway's `configureServices` action.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeGatewayServiceConfiguration {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "NatService", skip_serializing_if = "Option::is_none")]
    pub nat_service: Option<NatService>,
    #[serde(rename = "FirewallService", skip_serializing_if = "Option::is_none")]
    pub firewall_service: Option<FirewallService>,
}

impl EdgeGatewayServiceConfiguration {
    pub fn new(nat_service: Option<NatService>, firewall_service: Option<FirewallService>) -> Self {
        Self {
            xmlns: ns::VCLOUD,
            nat_service,
            firewall_service,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NatService {
    #[serde(rename = "IsEnabled")]
    pub is_enabled: bool,
    #[serde(rename = "NatRule")]
    pub rules: Vec<NatRule>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NatRule {
    /// `DNAT` or `SNAT`.
    #[serde(rename = "RuleType")]
    pub rule_type: String,
    #[serde(rename = "IsEnabled")]
    pub is_enabled: bool,
    #[serde(rename = "GatewayNatRule")]
    pub gateway_nat_rule: GatewayNatRule,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayNatRule {
    #[serde(rename = "Interface")]
    pub interface: Reference,
    #[serde(rename = "OriginalIp")]
    pub original_ip: String,
    #[serde(rename = "OriginalPort", skip_serializing_if = "Option::is_none")]
    pub original_port: Option<String>,
    #[serde(rename = "TranslatedIp")]
    pub translated_ip: String,
    #[serde(rename = "TranslatedPort", skip_serializing_if = "Option::is_none")]
    pub translated_port: Option<String>,
    #[serde(rename = "Protocol", skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FirewallService {
    #[serde(rename = "IsEnabled")]
    pub is_enabled: bool,
    #[serde(rename = "DefaultAction")]
    pub default_action: String,
    #[serde(rename = "LogDefaultAction")]
    pub log_default_action: bool,
    #[serde(rename = "FirewallRule")]
    pub rules: Vec<FirewallRule>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FirewallRule {
    #[serde(rename = "IsEnabled")]
    pub is_enabled: bool,
    #[serde(rename = "MatchOnTranslate")]
    pub match_on_translate: bool,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Policy")]
    pub policy: String,
    #[serde(rename = "Protocols")]
    pub protocols: FirewallProtocols,
    #[serde(rename = "DestinationPortRange")]
    pub destination_port_range: String,
    #[serde(rename = "DestinationIp")]
    pub destination_ip: String,
    #[serde(rename = "SourcePortRange")]
    pub source_port_range: String,
    #[serde(rename = "SourceIp")]
    pub source_ip: String,
    #[serde(rename = "EnableLogging")]
    pub enable_logging: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FirewallProtocols {
    #[serde(rename = "Tcp", skip_serializing_if = "Option::is_none")]
    pub tcp: Option<bool>,
    #[serde(rename = "Udp", skip_serializing_if = "Option::is_none")]
    pub udp: Option<bool>,
    #[serde(rename = "Any", skip_serializing_if = "Option::is_none")]
    pub any: Option<bool>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};

    #[test]
    fn gateway_interfaces_decode_with_ranges() {
        let gateway: EdgeGateway = decode(
            r#"<EdgeGateway xmlns="http://www.vmware.com/vcloud/v1.5" name="gw-1"
                    href="https://vcd/api/admin/edgeGateway/1">
                 <Link rel="edgeGateway:configureServices"
                       type="application/vnd.vmware.admin.edgeGatewayServiceConfiguration+xml"
                       href="https://vcd/api/admin/edgeGateway/1/action/configureServices"/>
                 <Description/>
                 <Configuration>
                   <GatewayBackingConfig>compact</GatewayBackingConfig>
                   <GatewayInterfaces>
                     <GatewayInterface>
                       <Name>d1p1-ext</Name>
                       <DisplayName>d1p1-ext</DisplayName>
                       <Network href="https://vcd/api/admin/network/ext" name="d1p1-ext"/>
                       <InterfaceType>uplink</InterfaceType>
                       <SubnetParticipation>
                         <Gateway>203.0.113.1</Gateway>
                         <Netmask>255.255.255.0</Netmask>
                         <IpAddress>203.0.113.2</IpAddress>
                         <IpRanges>
                           <IpRange>
                             <StartAddress>203.0.113.10</StartAddress>
                             <EndAddress>203.0.113.20</EndAddress>
                           </IpRange>
                         </IpRanges>
                       </SubnetParticipation>
                     </GatewayInterface>
                     <GatewayInterface>
                       <Name>default-routed</Name>
                       <InterfaceType>internal</InterfaceType>
                     </GatewayInterface>
                   </GatewayInterfaces>
                 </Configuration>
               </EdgeGateway>"#,
        )
        .unwrap();

        let interfaces = gateway.interfaces();
        assert_eq!(interfaces.len(), 2);
        assert!(interfaces[0].is_uplink());
        assert!(!interfaces[1].is_uplink());
        assert_eq!(
            interfaces[0].subnet_participations[0].ranges(),
            &[IpRange {
                start_address: "203.0.113.10".into(),
                end_address: "203.0.113.20".into(),
            }]
        );
    }

    #[test]
    fn service_configuration_encodes_nat_before_firewall() {
        let config = EdgeGatewayServiceConfiguration::new(
            Some(NatService {
                is_enabled: true,
                rules: vec![NatRule {
                    rule_type: "DNAT".into(),
                    is_enabled: true,
                    gateway_nat_rule: GatewayNatRule {
                        interface: Reference::to_href("https://vcd/api/admin/network/ext"),
                        original_ip: "203.0.113.12".into(),
                        original_port: Some("any".into()),
                        translated_ip: "192.168.109.2".into(),
                        translated_port: Some("any".into()),
                        protocol: Some("TCP".into()),
                    },
                }],
            }),
            Some(FirewallService {
                is_enabled: true,
                default_action: "drop".into(),
                log_default_action: false,
                rules: Vec::new(),
            }),
        );

        let xml = encode("EdgeGatewayServiceConfiguration", &config).unwrap();
        let nat = xml.find("<NatService>").unwrap();
        let fw = xml.find("<FirewallService>").unwrap();
        assert!(nat < fw, "got: {xml}");
        assert!(xml.contains("<RuleType>DNAT</RuleType>"), "got: {xml}");
        assert!(
            xml.contains(r#"<Interface href="https://vcd/api/admin/network/ext"/>"#),
            "got: {xml}"
        );
        assert!(xml.contains("<DefaultAction>drop</DefaultAction>"), "got: {xml}");
    }
}
