#![forbid(unsafe_code)]

//! Device-list scan.
//!
//! Once `-device` is known to exist, the emulator can enumerate its device
//! models (`-device ?`) and the properties of individual models
//! (`-device pci-assign,?`). The captured text mixes two line shapes:
//!
//! ```text
//! name "virtio-net-pci", bus PCI
//! name "spicevmc", bus virtio-serial-bus
//! virtio-net-pci.tx=string
//! pci-assign.configfd=string
//! ```
//!
//! [`DeviceInventory`] indexes both, and [`DEVICE_RULES`] maps them onto
//! capabilities. Lines of any other shape, and lines longer than
//! [`MAX_DEVICE_LINE_LEN`], are ignored.

use std::collections::HashSet;

use crate::flags::{Capability, FlagSet};
use crate::text::lines;

/// Longest line considered when indexing a device list.
pub const MAX_DEVICE_LINE_LEN: usize = 4 * 1024;

const MODEL_PREFIX: &[u8] = b"name \"";

/// Model names and `model.property` keys found in a device list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeviceInventory<'a> {
    models: HashSet<&'a [u8]>,
    properties: HashSet<&'a [u8]>,
}

impl<'a> DeviceInventory<'a> {
    /// Index a device-list blob. Never fails; unrecognized lines are skipped.
    #[must_use]
    pub fn parse(device_list: &'a [u8]) -> Self {
        let mut inventory = Self::default();
        for line in lines(device_list) {
            if line.len() > MAX_DEVICE_LINE_LEN {
                continue;
            }
            if let Some(model) = model_name(line) {
                inventory.models.insert(model);
            } else if let Some(property) = property_key(line) {
                inventory.properties.insert(property);
            }
        }
        inventory
    }

    /// Whether a `name "<model>"` line named `model`.
    #[must_use]
    pub fn has_model(&self, model: &str) -> bool {
        self.models.contains(model.as_bytes())
    }

    /// Whether a `<model>.<property>=` line declared `key`.
    #[must_use]
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains(key.as_bytes())
    }

    #[must_use]
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}

fn model_name(line: &[u8]) -> Option<&[u8]> {
    let rest = line.strip_prefix(MODEL_PREFIX)?;
    let end = rest.iter().position(|&b| b == b'"')?;
    Some(&rest[..end])
}

fn property_key(line: &[u8]) -> Option<&[u8]> {
    let eq = line.iter().position(|&b| b == b'=')?;
    let key = &line[..eq];
    key.contains(&b'.').then_some(key)
}

/// What a [`DeviceRule`] needs to see.
#[derive(Clone, Copy)]
pub enum DeviceTest {
    /// A model line with this exact name.
    Model(&'static str),
    /// A property line with this exact `model.property` key.
    Property(&'static str),
    /// Condition over the inventory and the flags detected so far.
    Predicate(fn(&DeviceInventory<'_>, FlagSet) -> bool),
}

/// One device-conditioned capability.
#[derive(Clone, Copy)]
pub struct DeviceRule {
    pub capability: Capability,
    pub test: DeviceTest,
}

impl DeviceRule {
    /// Evaluate against an inventory and the incoming flags.
    #[must_use]
    pub fn holds(&self, inventory: &DeviceInventory<'_>, flags: FlagSet) -> bool {
        match self.test {
            DeviceTest::Model(model) => inventory.has_model(model),
            DeviceTest::Property(key) => inventory.has_property(key),
            DeviceTest::Predicate(predicate) => predicate(inventory, flags),
        }
    }
}

/// The device-list rule table.
pub const DEVICE_RULES: &[DeviceRule] = &[
    DeviceRule {
        capability: Capability::HdaDuplex,
        test: DeviceTest::Model("hda-duplex"),
    },
    DeviceRule {
        capability: Capability::CcidEmulated,
        test: DeviceTest::Model("ccid-card-emulated"),
    },
    DeviceRule {
        capability: Capability::CcidPassthru,
        test: DeviceTest::Model("ccid-card-passthru"),
    },
    // Newer builds expose spicevmc as a chardev; the device form is only
    // reported for builds that lack it.
    DeviceRule {
        capability: Capability::DeviceSpicevmc,
        test: DeviceTest::Predicate(|inventory, flags| {
            !flags.contains(Capability::ChardevSpicevmc) && inventory.has_model("spicevmc")
        }),
    },
    DeviceRule {
        capability: Capability::PciConfigfd,
        test: DeviceTest::Property("pci-assign.configfd"),
    },
    DeviceRule {
        capability: Capability::BootIndex,
        test: DeviceTest::Property("virtio-blk-pci.bootindex"),
    },
    DeviceRule {
        capability: Capability::PciBootindex,
        test: DeviceTest::Predicate(|inventory, _| {
            inventory.has_property("virtio-blk-pci.bootindex")
                && inventory.has_property("pci-assign.bootindex")
        }),
    },
    DeviceRule {
        capability: Capability::VirtioTxAlg,
        test: DeviceTest::Property("virtio-net-pci.tx"),
    },
];

/// Fold device-list capabilities into `flags`.
///
/// Without [`Capability::Device`] in `flags` the emulator cannot have
/// produced a device list, so `flags` is returned unchanged.
#[must_use]
pub fn scan_devices(device_list: &[u8], flags: FlagSet) -> FlagSet {
    if !flags.contains(Capability::Device) {
        crate::warn!("device list supplied but -device is not supported; ignoring it");
        return flags;
    }

    let inventory = DeviceInventory::parse(device_list);
    crate::debug!(
        models = inventory.model_count(),
        properties = inventory.property_count(),
        "indexed device list"
    );

    let mut extended = flags;
    for rule in DEVICE_RULES {
        if rule.holds(&inventory, flags) && extended.insert(rule.capability) {
            crate::trace!(capability = rule.capability.name(), "device capability detected");
        }
    }
    extended
}
