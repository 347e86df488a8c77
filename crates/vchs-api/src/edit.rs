// In-place edits of vCloud section documents.
//
// A section GET from its own href is PUT back whole, so edits work on the
// raw event stream: every element, attribute and namespace declaration the
// edit does not name is written back exactly as the server sent it.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::codec;
use crate::error::Error;
use crate::types::{ResourceKind, VAppNetworkConfig, ns};

/// A direct child of an element: one subtree, or a single text, comment
/// or empty-element event.
type Node = Vec<Event<'static>>;

/// Add `config` to a standalone `<NetworkConfigSection>` after the networks
/// it already holds.
///
/// Existing `<NetworkConfig>` entries keep their features, router and
/// syslog settings. The read-only `<Link>` children are dropped.
pub fn add_network_config(section: &str, config: &VAppNetworkConfig) -> Result<String, Error> {
    let mut doc = Document::parse(section)?;
    let root = &mut doc.root;
    root.children.retain(|node| !has_name(node, "Link"));

    let mut fragment = read_events(&codec::encode("NetworkConfig", config)?)?;
    if !root.declares_default_namespace() {
        if let Some(Event::Start(start)) = fragment.first_mut() {
            start.push_attribute(("xmlns", ns::VCLOUD));
        }
    }

    let at = root
        .children
        .iter()
        .rposition(|node| has_name(node, "NetworkConfig") || has_name(node, "Info"))
        .map_or(root.children.len(), |i| i + 1);
    root.children.insert(at, fragment);
    doc.write()
}

/// Attach the first ethernet adapter of a standalone
/// `<ovf:VirtualHardwareSection>` to `network`, with its address taken from
/// the network's static pool.
///
/// Only the adapter's `AutomaticAllocation` and first `Connection` change.
/// Returns `None` when the section has no ethernet adapter.
pub fn connect_adapter_to_pool(section: &str, network: &str) -> Result<Option<String>, Error> {
    let mut doc = Document::parse(section)?;
    let children = &mut doc.root.children;
    let Some(index) = children.iter().position(|node| {
        has_name(node, "Item") && resource_kind(node) == Some(ResourceKind::EthernetAdapter)
    }) else {
        return Ok(None);
    };
    let Some(mut item) = Element::from_node(children.remove(index)) else {
        return Ok(None);
    };

    let allocation = item.child_qname("AutomaticAllocation");
    item.put_child(
        "AutomaticAllocation",
        vec![
            Event::Start(BytesStart::new(allocation.clone())),
            Event::Text(BytesText::new("true").into_owned()),
            Event::End(BytesEnd::new(allocation)),
        ],
    );
    let connection = pooled_connection(&item, network);
    item.put_child("Connection", connection);

    children.insert(index, item.into_events());
    doc.write().map(Some)
}

/// `<rasd:Connection ipAddressingMode="POOL">network</rasd:Connection>`,
/// keeping the other attributes of the adapter's current connection.
fn pooled_connection(item: &Element, network: &str) -> Node {
    let current = item.children.iter().find(|node| has_name(node, "Connection"));
    let mut qname = item.child_qname("Connection");
    let mut mode = String::from("vcloud:ipAddressingMode");
    let mut kept = Vec::new();

    if let Some(Some(Event::Start(old) | Event::Empty(old))) = current.map(|node| node.first()) {
        qname = String::from_utf8_lossy(old.name().as_ref()).into_owned();
        for attr in old.attributes().flatten() {
            if attr.key.local_name().as_ref() == b"ipAddressingMode" {
                mode = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            } else {
                kept.push(attr);
            }
        }
    }

    let mut start = BytesStart::new(qname.clone());
    for attr in kept {
        start.push_attribute(attr);
    }
    start.push_attribute((mode.as_str(), "POOL"));
    vec![
        Event::Start(start),
        Event::Text(BytesText::new(network).into_owned()),
        Event::End(BytesEnd::new(qname)),
    ]
}

/// The `ResourceType` of an `<ovf:Item>` subtree.
fn resource_kind(item: &[Event<'_>]) -> Option<ResourceKind> {
    item.windows(2).find_map(|pair| match pair {
        [Event::Start(start), Event::Text(text)]
            if start.local_name().as_ref() == b"ResourceType" =>
        {
            std::str::from_utf8(text)
                .ok()?
                .trim()
                .parse::<u32>()
                .ok()
                .map(ResourceKind::from)
        }
        _ => None,
    })
}

fn has_name(node: &[Event<'_>], local: &str) -> bool {
    with_local_name(node, |name| name == local.as_bytes()).unwrap_or(false)
}

fn with_local_name<R>(node: &[Event<'_>], f: impl FnOnce(&[u8]) -> R) -> Option<R> {
    match node.first() {
        Some(Event::Start(start) | Event::Empty(start)) => Some(f(start.local_name().as_ref())),
        _ => None,
    }
}

// ── Event trees ──────────────────────────────────────────────────────

/// An element split into its tags and its direct children.
struct Element {
    start: Event<'static>,
    children: Vec<Node>,
    end: Event<'static>,
}

impl Element {
    /// Split a `Start .. End` subtree. Empty elements have no children to
    /// edit and give `None`.
    fn from_node(mut node: Node) -> Option<Self> {
        if !matches!(node.first(), Some(Event::Start(_))) {
            return None;
        }
        let end = node.pop()?;
        let mut inner = node.into_iter();
        let start = inner.next()?;
        Some(Self {
            start,
            children: group_children(inner),
            end,
        })
    }

    fn into_events(self) -> Node {
        let mut events = vec![self.start];
        events.extend(self.children.into_iter().flatten());
        events.push(self.end);
        events
    }

    fn declares_default_namespace(&self) -> bool {
        match &self.start {
            Event::Start(start) => start
                .attributes()
                .flatten()
                .any(|attr| attr.key.as_ref() == b"xmlns"),
            _ => false,
        }
    }

    /// `local` qualified with the prefix the existing children use.
    fn child_qname(&self, local: &str) -> String {
        let prefix = self.children.iter().find_map(|node| match node.first() {
            Some(Event::Start(start) | Event::Empty(start)) => start
                .name()
                .prefix()
                .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned()),
            _ => None,
        });
        match prefix {
            Some(prefix) => format!("{prefix}:{local}"),
            None => local.to_owned(),
        }
    }

    /// Replace the first child named `local`, or insert `node` where the
    /// schema puts it. `rasd:` children follow the CIM schema, which orders
    /// them alphabetically.
    fn put_child(&mut self, local: &str, node: Node) {
        if let Some(existing) = self.children.iter_mut().find(|n| has_name(n, local)) {
            *existing = node;
            return;
        }
        let at = self
            .children
            .iter()
            .position(|n| with_local_name(n, |name| name > local.as_bytes()).unwrap_or(false))
            .unwrap_or(self.children.len());
        self.children.insert(at, node);
    }
}

/// A whole document: whatever precedes the root, the root, and whatever
/// follows it.
struct Document {
    prolog: Vec<Event<'static>>,
    root: Element,
    epilog: Vec<Event<'static>>,
}

impl Document {
    fn parse(xml: &str) -> Result<Self, Error> {
        let mut events = read_events(xml)?;
        let open = events.iter().position(|e| matches!(e, Event::Start(_)));
        let close = events.iter().rposition(|e| matches!(e, Event::End(_)));
        let (Some(open), Some(close)) = (open, close) else {
            return Err(malformed(xml, "no root element"));
        };
        let epilog = events.split_off(close + 1);
        let root = Element::from_node(events.split_off(open))
            .ok_or_else(|| malformed(xml, "no root element"))?;
        Ok(Self {
            prolog: events,
            root,
            epilog,
        })
    }

    fn write(self) -> Result<String, Error> {
        let mut writer = Writer::new(Vec::new());
        let events = self
            .prolog
            .into_iter()
            .chain(self.root.into_events())
            .chain(self.epilog);
        for event in events {
            writer
                .write_event(event)
                .map_err(|e| Error::Serialization(e.to_string()))?;
        }
        String::from_utf8(writer.into_inner()).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Group a flat event run into direct children.
fn group_children(events: impl Iterator<Item = Event<'static>>) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;
    for event in events {
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        current.push(event);
        if depth == 0 {
            nodes.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        nodes.push(current);
    }
    nodes
}

fn read_events(xml: &str) -> Result<Vec<Event<'static>>, Error> {
    let mut reader = Reader::from_str(xml);
    let mut events = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => return Ok(events),
            Ok(event) => events.push(event.into_owned()),
            Err(e) => {
                let at = reader.buffer_position();
                return Err(malformed(xml, &format!("{e} at byte {at}")));
            }
        }
    }
}

fn malformed(xml: &str, message: &str) -> Error {
    Error::Deserialization {
        message: message.to_owned(),
        body: xml.to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NETWORKS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<NetworkConfigSection xmlns="http://www.vmware.com/vcloud/v1.5"
        xmlns:ovf="http://schemas.dmtf.org/ovf/envelope/1"
        href="https://vcd/api/vApp/vapp-1/networkConfigSection/" ovf:required="false">
    <ovf:Info>The configuration parameters for logical networks</ovf:Info>
    <Link rel="edit" type="application/vnd.vmware.vcloud.networkConfigSection+xml"
          href="https://vcd/api/vApp/vapp-1/networkConfigSection/"/>
    <NetworkConfig networkName="vapp-internal">
        <Configuration>
            <IpScopes>
                <IpScope>
                    <IsInherited>false</IsInherited>
                    <Gateway>10.0.0.1</Gateway>
                    <Netmask>255.255.255.0</Netmask>
                    <AllocatedIpAddresses><IpAddress>10.0.0.5</IpAddress></AllocatedIpAddresses>
                </IpScope>
            </IpScopes>
            <FenceMode>natRouted</FenceMode>
            <Features>
                <DhcpService><IsEnabled>true</IsEnabled></DhcpService>
                <FirewallService><IsEnabled>true</IsEnabled></FirewallService>
            </Features>
            <RouterInfo><ExternalIp>192.168.1.20</ExternalIp></RouterInfo>
        </Configuration>
        <IsDeployed>false</IsDeployed>
    </NetworkConfig>
</NetworkConfigSection>"#;

    #[test]
    fn added_network_keeps_existing_configuration() {
        let bridged = VAppNetworkConfig::bridged("default-routed", "https://vcd/api/network/n1");
        let xml = add_network_config(NETWORKS, &bridged).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#), "got: {xml}");
        assert!(xml.contains(r#"ovf:required="false""#), "got: {xml}");
        assert!(
            xml.contains("<DhcpService><IsEnabled>true</IsEnabled></DhcpService>"),
            "got: {xml}"
        );
        assert!(xml.contains("<RouterInfo><ExternalIp>192.168.1.20</ExternalIp></RouterInfo>"));
        assert!(xml.contains("<AllocatedIpAddresses><IpAddress>10.0.0.5</IpAddress>"));
        assert!(!xml.contains("<Link"), "links must not be sent back: {xml}");

        let existing = xml.find(r#"<NetworkConfig networkName="vapp-internal">"#).unwrap();
        let added = xml.find(r#"<NetworkConfig networkName="default-routed">"#).unwrap();
        assert!(existing < added, "new network goes after the existing one: {xml}");
        assert!(xml.contains("<FenceMode>bridged</FenceMode>"), "got: {xml}");
        assert!(xml.trim_end().ends_with("</NetworkConfigSection>"), "got: {xml}");
    }

    #[test]
    fn first_network_goes_after_info() {
        let section = r#"<NetworkConfigSection xmlns="http://www.vmware.com/vcloud/v1.5"
                xmlns:ovf="http://schemas.dmtf.org/ovf/envelope/1">
              <ovf:Info>nets</ovf:Info>
              <Link rel="edit" href="https://vcd/api/vApp/vapp-1/networkConfigSection/"/>
            </NetworkConfigSection>"#;
        let bridged = VAppNetworkConfig::bridged("default-routed", "https://vcd/api/network/n1");
        let xml = add_network_config(section, &bridged).unwrap();

        let info = xml.find("</ovf:Info>").unwrap();
        let added = xml.find("<NetworkConfig ").unwrap();
        assert!(info < added, "got: {xml}");
        assert!(!xml.contains(r#"<NetworkConfig xmlns"#), "got: {xml}");
    }

    #[test]
    fn prefixed_root_gets_namespace_on_new_network() {
        let section = r#"<vcloud:NetworkConfigSection xmlns:vcloud="http://www.vmware.com/vcloud/v1.5"
                xmlns:ovf="http://schemas.dmtf.org/ovf/envelope/1">
              <ovf:Info>nets</ovf:Info>
            </vcloud:NetworkConfigSection>"#;
        let bridged = VAppNetworkConfig::bridged("default-routed", "https://vcd/api/network/n1");
        let xml = add_network_config(section, &bridged).unwrap();
        assert!(
            xml.contains(r#"xmlns="http://www.vmware.com/vcloud/v1.5""#),
            "got: {xml}"
        );
    }

    const HARDWARE: &str = r#"<ovf:VirtualHardwareSection
        xmlns:ovf="http://schemas.dmtf.org/ovf/envelope/1"
        xmlns:rasd="http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_ResourceAllocationSettingData"
        xmlns:vcloud="http://www.vmware.com/vcloud/v1.5"
        xmlns:vmw="http://www.vmware.com/schema/ovf"
        vcloud:href="https://vcd/api/vApp/vm-1/virtualHardwareSection/">
      <ovf:Info>Virtual hardware requirements</ovf:Info>
      <ovf:System><vssd:VirtualSystemType xmlns:vssd="urn:vssd">vmx-08</vssd:VirtualSystemType></ovf:System>
      <ovf:Item>
        <rasd:AllocationUnits>hertz * 10^6</rasd:AllocationUnits>
        <rasd:ElementName>2 virtual CPU(s)</rasd:ElementName>
        <rasd:InstanceID>4</rasd:InstanceID>
        <rasd:Reservation>0</rasd:Reservation>
        <rasd:ResourceType>3</rasd:ResourceType>
        <rasd:VirtualQuantity>2</rasd:VirtualQuantity>
        <rasd:Weight>0</rasd:Weight>
        <vmw:CoresPerSocket ovf:required="false">2</vmw:CoresPerSocket>
      </ovf:Item>
      <ovf:Item>
        <rasd:Address>00:50:56:01:01:01</rasd:Address>
        <rasd:AddressOnParent>0</rasd:AddressOnParent>
        <rasd:AutomaticAllocation>false</rasd:AutomaticAllocation>
        <rasd:Connection vcloud:ipAddressingMode="NONE" vcloud:primaryNetworkConnection="true">none</rasd:Connection>
        <rasd:ElementName>Network adapter 0</rasd:ElementName>
        <rasd:InstanceID>1</rasd:InstanceID>
        <rasd:ResourceSubType>E1000</rasd:ResourceSubType>
        <rasd:ResourceType>10</rasd:ResourceType>
      </ovf:Item>
      <ovf:Item>
        <rasd:ElementName>Hard disk 1</rasd:ElementName>
        <rasd:HostResource vcloud:capacity="16384" vcloud:busSubType="lsilogic" vcloud:busType="6"/>
        <rasd:InstanceID>2000</rasd:InstanceID>
        <rasd:Parent>2</rasd:Parent>
        <rasd:ResourceType>17</rasd:ResourceType>
      </ovf:Item>
    </ovf:VirtualHardwareSection>"#;

    #[test]
    fn pool_connection_leaves_other_items_untouched() {
        let xml = connect_adapter_to_pool(HARDWARE, "default-routed")
            .unwrap()
            .unwrap();

        assert!(
            xml.contains(r#"<vmw:CoresPerSocket ovf:required="false">2</vmw:CoresPerSocket>"#),
            "got: {xml}"
        );
        assert!(xml.contains("<rasd:Reservation>0</rasd:Reservation>"), "got: {xml}");
        assert!(xml.contains("<rasd:Weight>0</rasd:Weight>"), "got: {xml}");
        assert!(xml.contains("<rasd:AllocationUnits>hertz * 10^6</rasd:AllocationUnits>"));
        assert!(xml.contains("vmx-08</vssd:VirtualSystemType>"), "got: {xml}");
        assert!(
            xml.contains(
                r#"<rasd:HostResource vcloud:capacity="16384" vcloud:busSubType="lsilogic" vcloud:busType="6"/>"#
            ),
            "got: {xml}"
        );
        assert!(xml.contains(r#"vcloud:href="https://vcd/api/vApp/vm-1/virtualHardwareSection/""#));
    }

    #[test]
    fn pool_connection_rewrites_adapter() {
        let xml = connect_adapter_to_pool(HARDWARE, "default-routed")
            .unwrap()
            .unwrap();

        assert!(
            xml.contains("<rasd:AutomaticAllocation>true</rasd:AutomaticAllocation>"),
            "got: {xml}"
        );
        assert!(
            xml.contains(
                r#"<rasd:Connection vcloud:primaryNetworkConnection="true" vcloud:ipAddressingMode="POOL">default-routed</rasd:Connection>"#
            ),
            "got: {xml}"
        );
        assert!(!xml.contains(">none</rasd:Connection>"), "got: {xml}");
        assert!(xml.contains("<rasd:Address>00:50:56:01:01:01</rasd:Address>"));
        assert!(xml.contains("<rasd:ResourceSubType>E1000</rasd:ResourceSubType>"));
    }

    #[test]
    fn missing_adapter_fields_are_inserted_in_schema_order() {
        let section = r#"<ovf:VirtualHardwareSection
            xmlns:ovf="http://schemas.dmtf.org/ovf/envelope/1"
            xmlns:rasd="http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_ResourceAllocationSettingData"
            xmlns:vcloud="http://www.vmware.com/vcloud/v1.5">
          <ovf:Info>hw</ovf:Info>
          <ovf:Item>
            <rasd:Address>00:50:56:01:01:01</rasd:Address>
            <rasd:ElementName>Network adapter 0</rasd:ElementName>
            <rasd:InstanceID>1</rasd:InstanceID>
            <rasd:ResourceType>10</rasd:ResourceType>
          </ovf:Item>
        </ovf:VirtualHardwareSection>"#;
        let xml = connect_adapter_to_pool(section, "net-1").unwrap().unwrap();

        let address = xml.find("<rasd:Address>").unwrap();
        let allocation = xml
            .find("<rasd:AutomaticAllocation>true</rasd:AutomaticAllocation>")
            .unwrap();
        let connection = xml
            .find(r#"<rasd:Connection vcloud:ipAddressingMode="POOL">net-1</rasd:Connection>"#)
            .unwrap();
        let name = xml.find("<rasd:ElementName>").unwrap();
        assert!(address < allocation && allocation < connection && connection < name, "got: {xml}");
    }

    #[test]
    fn section_without_adapter_gives_none() {
        let section = r#"<ovf:VirtualHardwareSection xmlns:ovf="http://schemas.dmtf.org/ovf/envelope/1"
                xmlns:rasd="http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_ResourceAllocationSettingData">
              <ovf:Info>hw</ovf:Info>
              <ovf:Item><rasd:ResourceType>3</rasd:ResourceType></ovf:Item>
            </ovf:VirtualHardwareSection>"#;
        assert!(connect_adapter_to_pool(section, "net-1").unwrap().is_none());
    }

    #[test]
    fn malformed_section_keeps_raw_body() {
        let err = connect_adapter_to_pool("<ovf:Item><a></b>", "net-1").unwrap_err();
        match err {
            Error::Deserialization { body, .. } => assert_eq!(body, "<ovf:Item><a></b>"),
            other => panic!("expected Deserialization error, got: {other:?}"),
        }
    }
}
