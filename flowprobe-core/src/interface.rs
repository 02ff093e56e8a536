//! Raw link-layer transmission

use crate::{Error, Result};
use pnet_datalink::{self, Channel, DataLinkSender, NetworkInterface};
use std::fmt;
use tracing::{debug, info};

/// Network interface that frames are written to
#[derive(Debug, Clone)]
pub struct Interface {
    /// Interface name (e.g., "eth0", "ens16f0")
    pub name: String,
    /// Interface index
    pub index: u32,
    /// Hardware address, if the link has one
    pub mac_address: Option<[u8; 6]>,
    /// Is interface up?
    pub is_up: bool,
    /// Is this the loopback interface?
    pub is_loopback: bool,
}

impl Interface {
    /// Get interface by name
    pub fn by_name(name: &str) -> Result<Self> {
        let iface = find_link(name)?;
        Ok(Self::from(&iface))
    }

    /// List all available interfaces
    pub fn list_all() -> Vec<Self> {
        pnet_datalink::interfaces()
            .iter()
            .map(Self::from)
            .collect()
    }

    /// Open an Ethernet channel on this interface for sending frames
    ///
    /// The channel is opened once and reused for every frame, so a run of
    /// probes goes out on the same socket in order.
    pub fn sender(&self) -> Result<LinkSender> {
        let link = find_link(&self.name)?;

        let tx = match pnet_datalink::channel(&link, Default::default()) {
            Ok(Channel::Ethernet(tx, _rx)) => tx,
            Ok(_) => return Err(Error::Interface("Unsupported channel type".to_string())),
            Err(e) => return Err(Error::Interface(format!("Failed to create channel: {}", e))),
        };

        info!(interface = %self.name, "opened link-layer channel");

        Ok(LinkSender {
            interface: self.name.clone(),
            tx,
        })
    }
}

impl From<&NetworkInterface> for Interface {
    fn from(iface: &NetworkInterface) -> Self {
        Self {
            name: iface.name.clone(),
            index: iface.index,
            mac_address: iface
                .mac
                .map(|mac| [mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]),
            is_up: iface.is_up(),
            is_loopback: iface.is_loopback(),
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (index {}", self.name, self.index)?;
        if let Some(mac) = self.mac_address {
            write!(
                f,
                ", {:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
            )?;
        }
        if !self.is_up {
            write!(f, ", down")?;
        }
        write!(f, ")")
    }
}

/// Open sending half of a link-layer channel
pub struct LinkSender {
    interface: String,
    tx: Box<dyn DataLinkSender>,
}

impl LinkSender {
    /// Name of the interface this sender writes to
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Write one pre-composed frame to the wire, unmodified
    pub fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.tx
            .send_to(frame, None)
            .ok_or_else(|| Error::Interface(format!("Failed to send on {}", self.interface)))??;

        debug!(interface = %self.interface, len = frame.len(), "frame written");
        Ok(())
    }
}

fn find_link(name: &str) -> Result<NetworkInterface> {
    pnet_datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))
}
