#![forbid(unsafe_code)]

//! Capability enumeration and the fixed-width [`FlagSet`].
//!
//! Every [`Capability`] owns one bit of a `u64`. Bit positions are part of
//! the public contract: results produced by different emulator releases are
//! compared bit for bit, so a position is never moved or reused once
//! assigned. Bit 52 is retired and has no variant.
//!
//! The bit layout is declared once, in the `capabilities!` table below, which
//! generates the enum, its stable names, and the private `bitflags` storage
//! so the three cannot drift apart.
//!
//! # Example
//!
//! ```
//! use qcaps_core::flags::{Capability, FlagSet};
//!
//! let flags: FlagSet = [Capability::Drive, Capability::DriveFormat].into_iter().collect();
//! assert!(flags.contains(Capability::Drive));
//! assert_eq!(flags.to_string(), "drive | drive-format");
//! assert_eq!("drive | drive-format".parse::<FlagSet>().unwrap(), flags);
//! ```

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

macro_rules! capabilities {
    ($( $(#[$doc:meta])* $variant:ident / $konst:ident = $bit:literal => $name:literal, )+) => {
        /// A single named emulator capability.
        ///
        /// The discriminant is the capability's bit position in a [`FlagSet`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Capability {
            $( $(#[$doc])* $variant = $bit, )+
        }

        bitflags! {
            #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
            struct RawFlags: u64 {
                $( const $konst = 1 << $bit; )+
            }
        }

        impl Capability {
            /// Every capability, in ascending bit order.
            pub const ALL: &'static [Capability] = &[ $( Capability::$variant, )+ ];

            /// Stable lowercase name used in fixture tables and reports.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $( Capability::$variant => $name, )+
                }
            }

            /// Look up a capability by its stable name.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(Capability::$variant), )+
                    _ => None,
                }
            }

            const fn raw(self) -> RawFlags {
                match self {
                    $( Capability::$variant => RawFlags::$konst, )+
                }
            }
        }
    };
}

capabilities! {
    /// `-no-kqemu` is accepted.
    Kqemu / KQEMU = 0 => "kqemu",
    /// VNC display takes `host:display` syntax.
    VncColon / VNC_COLON = 1 => "vnc-colon",
    /// `-no-reboot` is accepted.
    NoReboot / NO_REBOOT = 2 => "no-reboot",
    /// Disks are attached with `-drive`.
    Drive / DRIVE = 3 => "drive",
    /// `-drive` understands `boot=on`.
    DriveBoot / DRIVE_BOOT = 4 => "drive-boot",
    /// `-name` is accepted.
    Name / NAME = 5 => "name",
    /// `-uuid` is accepted.
    Uuid / UUID = 6 => "uuid",
    /// Legacy Xen `-domid`.
    Domid / DOMID = 7 => "domid",
    /// Tap devices support `vnet_hdr`.
    VnetHdr / VNET_HDR = 8 => "vnet-hdr",
    /// Old KVM `-incoming stdio` migration.
    MigrateKvmStdio / MIGRATE_KVM_STDIO = 9 => "migrate-kvm-stdio",
    /// Migration over `tcp:`.
    MigrateQemuTcp / MIGRATE_QEMU_TCP = 10 => "migrate-qemu-tcp",
    /// Migration over `exec:`.
    MigrateQemuExec / MIGRATE_QEMU_EXEC = 11 => "migrate-qemu-exec",
    /// `-drive cache=` takes the writethrough/writeback/none values.
    DriveCacheV2 / DRIVE_CACHE_V2 = 12 => "drive-cache-v2",
    /// `-no-kvm` is accepted.
    Kvm / KVM = 13 => "kvm",
    /// `-drive format=` is accepted.
    DriveFormat / DRIVE_FORMAT = 14 => "drive-format",
    /// `-vga` is accepted.
    Vga / VGA = 15 => "vga",
    /// Baseline 0.10 generation.
    Gen010 / GEN_0_10 = 16 => "0.10",
    /// `-pcidevice` host device assignment.
    PciDevice / PCI_DEVICE = 17 => "pci-device",
    /// `-mem-path` is accepted.
    MemPath / MEM_PATH = 18 => "mem-path",
    /// `-drive serial=` is accepted.
    DriveSerial / DRIVE_SERIAL = 19 => "drive-serial",
    /// `-xen-domid` is accepted.
    XenDomid / XEN_DOMID = 20 => "xen-domid",
    /// Migration over `unix:`.
    MigrateQemuUnix / MIGRATE_QEMU_UNIX = 21 => "migrate-qemu-unix",
    /// `-chardev` backends.
    Chardev / CHARDEV = 22 => "chardev",
    /// `-enable-kvm` is accepted.
    EnableKvm / ENABLE_KVM = 23 => "enable-kvm",
    /// QMP monitor in JSON mode.
    MonitorJson / MONITOR_JSON = 24 => "monitor-json",
    /// `-balloon` is accepted.
    Balloon / BALLOON = 25 => "balloon",
    /// `-device` and device model enumeration.
    Device / DEVICE = 26 => "device",
    /// `-sdl` is accepted.
    Sdl / SDL = 27 => "sdl",
    /// `-smp` takes `sockets=`, `cores=` and `threads=`.
    SmpTopology / SMP_TOPOLOGY = 28 => "smp-topology",
    /// `-netdev` is usable.
    Netdev / NETDEV = 29 => "netdev",
    /// `-rtc` is accepted.
    Rtc / RTC = 30 => "rtc",
    /// vhost-net acceleration.
    VhostNet / VHOST_NET = 31 => "vhost-net",
    /// `-rtc-td-hack` is accepted.
    RtcTdHack / RTC_TD_HACK = 32 => "rtc-td-hack",
    /// `-no-hpet` is accepted.
    NoHpet / NO_HPET = 33 => "no-hpet",
    /// `-no-kvm-pit-reinjection` is accepted.
    NoKvmPit / NO_KVM_PIT = 34 => "no-kvm-pit",
    /// `-tdf` is accepted.
    Tdf / TDF = 35 => "tdf",
    /// `pci-assign` takes a `configfd` property.
    PciConfigfd / PCI_CONFIGFD = 36 => "pci-configfd",
    /// `-nodefconfig` is accepted.
    Nodefconfig / NODEFCONFIG = 37 => "nodefconfig",
    /// `-boot menu=on` is accepted.
    BootMenu / BOOT_MENU = 38 => "boot-menu",
    /// `-enable-kqemu` is accepted.
    EnableKqemu / ENABLE_KQEMU = 39 => "enable-kqemu",
    /// `-fsdev` is accepted.
    Fsdev / FSDEV = 40 => "fsdev",
    /// `-enable-nesting` is accepted.
    Nesting / NESTING = 41 => "nesting",
    /// `-name` takes `,process=`.
    NameProcess / NAME_PROCESS = 42 => "name-process",
    /// Read-only disks.
    DriveReadonly / DRIVE_READONLY = 43 => "drive-readonly",
    /// `-smbios type=` is accepted.
    SmbiosType / SMBIOS_TYPE = 44 => "smbios-type",
    /// `-vga qxl`.
    VgaQxl / VGA_QXL = 45 => "vga-qxl",
    /// `-spice` is accepted.
    Spice / SPICE = 46 => "spice",
    /// `-vga none`.
    VgaNone / VGA_NONE = 47 => "vga-none",
    /// Migration over `fd:`.
    MigrateQemuFd / MIGRATE_QEMU_FD = 48 => "migrate-qemu-fd",
    /// Per-device `bootindex` property.
    BootIndex / BOOT_INDEX = 49 => "boot-index",
    /// `hda-duplex` audio codec.
    HdaDuplex / HDA_DUPLEX = 50 => "hda-duplex",
    /// `-drive aio=` is accepted.
    DriveAio / DRIVE_AIO = 51 => "drive-aio",
    /// `pci-assign` takes `bootindex`.
    PciBootindex / PCI_BOOTINDEX = 53 => "pci-bootindex",
    /// `ccid-card-emulated` smartcard device.
    CcidEmulated / CCID_EMULATED = 54 => "ccid-emulated",
    /// `ccid-card-passthru` smartcard device.
    CcidPassthru / CCID_PASSTHRU = 55 => "ccid-passthru",
    /// `-chardev spicevmc`.
    ChardevSpicevmc / CHARDEV_SPICEVMC = 56 => "chardev-spicevmc",
    /// Legacy `-device spicevmc`.
    DeviceSpicevmc / DEVICE_SPICEVMC = 57 => "device-spicevmc",
    /// `virtio-net-pci` takes a `tx` algorithm property.
    VirtioTxAlg / VIRTIO_TX_ALG = 58 => "virtio-tx-alg",
}

impl Capability {
    /// Bit position of this capability in a [`FlagSet`].
    #[must_use]
    pub const fn bit(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A capability name that is not part of the enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCapability(pub String);

impl fmt::Display for UnknownCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown capability '{}'", self.0)
    }
}

impl std::error::Error for UnknownCapability {}

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.trim()).ok_or_else(|| UnknownCapability(s.trim().to_owned()))
    }
}

/// A set of detected capabilities.
///
/// Equality is bitwise. Only named capabilities can be inserted, so unused
/// bit positions are always clear.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FlagSet(RawFlags);

impl FlagSet {
    /// The set with no capabilities.
    #[must_use]
    pub const fn empty() -> Self {
        Self(RawFlags::empty())
    }

    /// Whether `cap` is present.
    #[must_use]
    pub const fn contains(self, cap: Capability) -> bool {
        self.0.contains(cap.raw())
    }

    /// Add `cap`. Returns `true` when it was not already present.
    pub fn insert(&mut self, cap: Capability) -> bool {
        let added = !self.contains(cap);
        self.0.insert(cap.raw());
        added
    }

    /// Every capability present in either set.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0.union(other.0))
    }

    /// Capabilities present in `self` but not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0.difference(other.0))
    }

    /// Number of capabilities present.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.bits().count_ones() as usize
    }

    /// Whether no capability is present.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0.is_empty()
    }

    /// Present capabilities in ascending bit order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .iter()
            .copied()
            .filter(move |&cap| self.contains(cap))
    }

    /// The set as a 64-bit mask, for export to consumers that store the
    /// mask directly.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0.bits()
    }
}

impl FromIterator<Capability> for FlagSet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Self::empty();
        set.extend(iter);
        set
    }
}

impl Extend<Capability> for FlagSet {
    fn extend<I: IntoIterator<Item = Capability>>(&mut self, iter: I) {
        for cap in iter {
            self.insert(cap);
        }
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cap) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(cap.name())?;
        }
        Ok(())
    }
}

impl fmt::Debug for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlagSet({self})")
    }
}

impl FromStr for FlagSet {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::empty());
        }
        s.split('|').map(str::parse::<Capability>).collect()
    }
}
