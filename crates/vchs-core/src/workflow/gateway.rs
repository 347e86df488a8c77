// ── Edge gateway rules ──
//
// Publish an internal address through an edge gateway: DNAT and SNAT rules
// between the external and internal address, plus a firewall rule letting
// inbound traffic reach the external address. The configuration is posted
// in one `configureServices` call and waited on without an attempt ceiling.

use std::net::Ipv4Addr;

use vchs_api::StatusCode;
use vchs_api::types::{
    EdgeGateway, EdgeGatewayServiceConfiguration, FirewallProtocols, FirewallRule,
    FirewallService, GatewayNatRule, NatRule, NatService, QueryResultRecords, Reference, Task,
    Vdc, media,
};

use super::{GatewayRuleReport, Orchestrator, Step};
use crate::error::CoreError;
use crate::ip_range::select_uplink_network;
use crate::links::{LinkMatch, find_link, find_named};

/// Inputs of [`Orchestrator::add_gateway_rules`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRuleParams {
    pub vdc: String,
    /// Edge gateway name (case-insensitive).
    pub gateway: String,
    /// Public address; picks the uplink network by range.
    pub external_ip: Ipv4Addr,
    pub internal_ip: Ipv4Addr,
}

impl Orchestrator {
    /// Add NAT and firewall rules for `external_ip` ↔ `internal_ip`.
    pub async fn add_gateway_rules(
        &self,
        params: &GatewayRuleParams,
    ) -> Result<GatewayRuleReport, CoreError> {
        let ctx = self.open_vdc(&params.vdc).await?;
        let vcloud = &ctx.vcloud;

        let gateway: EdgeGateway = self
            .step(Step::FindGateway, async {
                let vdc: Vdc = vcloud.get(vcloud.vdc_href()).await?;
                let list = find_link(&vdc.links, LinkMatch::Rel("edgeGateways"), &vdc.href)?;
                let records: QueryResultRecords = vcloud.get(&list.href).await?;
                let record =
                    find_named(&records.edge_gateways, &params.gateway, "edge gateway", &list.href)?;
                Ok(vcloud.get(&record.href).await?)
            })
            .await?;

        let uplink = self
            .step(Step::SelectUplink, async {
                select_uplink_network(&gateway, params.external_ip).cloned()
            })
            .await?;

        let task = self
            .step(Step::ConfigureGatewayRules, async {
                let action = find_link(
                    &gateway.links,
                    LinkMatch::TypeContains("edgeGatewayServiceConfiguration"),
                    &gateway.href,
                )?;
                let body = service_configuration(&uplink, params.external_ip, params.internal_ip);
                let task: Task = vcloud
                    .post(
                        &action.href,
                        media::EDGE_GATEWAY_SERVICE_CONFIGURATION,
                        "EdgeGatewayServiceConfiguration",
                        &body,
                        StatusCode::ACCEPTED,
                    )
                    .await?;
                self.tracker(vcloud, self.config().polling.gateway)
                    .await_completion(task)
                    .await
            })
            .await?;

        Ok(GatewayRuleReport {
            vdc: ctx.vdc_name,
            gateway: gateway.name,
            uplink_network: uplink.name.unwrap_or(uplink.href),
            external_ip: params.external_ip,
            internal_ip: params.internal_ip,
            task_href: task.href,
        })
    }
}

/// NAT and firewall configuration publishing `internal` as `external` on
/// the uplink `interface`.
pub fn service_configuration(
    interface: &Reference,
    external: Ipv4Addr,
    internal: Ipv4Addr,
) -> EdgeGatewayServiceConfiguration {
    let nat_rule = |rule_type: &str, original: Ipv4Addr, translated: Ipv4Addr, ports: bool| NatRule {
        rule_type: rule_type.into(),
        is_enabled: true,
        gateway_nat_rule: GatewayNatRule {
            interface: Reference::to_href(interface.href.clone()),
            original_ip: original.to_string(),
            original_port: ports.then(|| "any".into()),
            translated_ip: translated.to_string(),
            translated_port: ports.then(|| "any".into()),
            protocol: ports.then(|| "TCP".into()),
        },
    };

    let nat = NatService {
        is_enabled: true,
        rules: vec![
            nat_rule("DNAT", external, internal, true),
            nat_rule("SNAT", internal, external, false),
        ],
    };

    let firewall = FirewallService {
        is_enabled: true,
        default_action: "drop".into(),
        log_default_action: false,
        rules: vec![FirewallRule {
            is_enabled: true,
            match_on_translate: false,
            description: Some("Allow incoming https access".into()),
            policy: "allow".into(),
            protocols: FirewallProtocols {
                any: Some(true),
                ..FirewallProtocols::default()
            },
            destination_port_range: "any".into(),
            destination_ip: external.to_string(),
            source_port_range: "Any".into(),
            source_ip: "external".into(),
            enable_logging: false,
        }],
    };

    EdgeGatewayServiceConfiguration::new(Some(nat), Some(firewall))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rules_translate_in_both_directions() {
        let uplink = Reference::to_href("https://vcd/network/ext");
        let config = service_configuration(
            &uplink,
            Ipv4Addr::new(203, 0, 113, 12),
            Ipv4Addr::new(192, 168, 109, 2),
        );

        let nat = config.nat_service.unwrap();
        assert!(nat.is_enabled);
        let dnat = &nat.rules[0].gateway_nat_rule;
        assert_eq!(nat.rules[0].rule_type, "DNAT");
        assert_eq!(dnat.interface.href, "https://vcd/network/ext");
        assert_eq!(dnat.original_ip, "203.0.113.12");
        assert_eq!(dnat.translated_ip, "192.168.109.2");
        assert_eq!(dnat.protocol.as_deref(), Some("TCP"));

        let snat = &nat.rules[1].gateway_nat_rule;
        assert_eq!(nat.rules[1].rule_type, "SNAT");
        assert_eq!(snat.original_ip, "192.168.109.2");
        assert_eq!(snat.translated_ip, "203.0.113.12");
        assert_eq!(snat.original_port, None);
    }

    #[test]
    fn firewall_allows_inbound_to_external_address() {
        let config = service_configuration(
            &Reference::to_href("https://vcd/network/ext"),
            Ipv4Addr::new(203, 0, 113, 12),
            Ipv4Addr::new(192, 168, 109, 2),
        );

        let firewall = config.firewall_service.unwrap();
        assert_eq!(firewall.default_action, "drop");
        assert!(!firewall.log_default_action);
        let rule = &firewall.rules[0];
        assert_eq!(rule.policy, "allow");
        assert_eq!(rule.destination_ip, "203.0.113.12");
        assert_eq!(rule.source_ip, "external");
        assert_eq!(rule.protocols.any, Some(true));
    }
}
