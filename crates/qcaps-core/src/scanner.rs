#![forbid(unsafe_code)]

//! Help-text capability scan.
//!
//! Each capability is decided by one [`Rule`] from [`HELP_RULES`]. A rule is
//! either a textual marker that must appear somewhere in the help text, or a
//! predicate over a [`ScanContext`] for capabilities that depend on several
//! markers, on the banner version, or on the KVM build number.
//!
//! Rules never clear bits and never read each other's output, so the scan is
//! a fold over independent predicates and evaluation order does not matter.
//!
//! # Version gates
//!
//! | Capability | Condition |
//! |------------|-----------|
//! | `vnc-colon` | version ≥ 0.9.0 |
//! | `0.10`, `migrate-qemu-tcp`, `migrate-qemu-exec` | version ≥ 0.10.0 |
//! | `migrate-qemu-unix`, `migrate-qemu-fd` | version ≥ 0.12.0 |
//! | `monitor-json` | version ≥ 0.13.0 |
//! | `netdev` | `-netdev` and version ≥ 0.13.0 |
//!
//! Pre-0.10 KVM builds fall back on their build number for migration:
//! `tcp` from kvm-79, `exec` from kvm-80, and `-incoming stdio` below that.

use crate::flags::{Capability, FlagSet};
use crate::text::{contains, find_subsequence};
use crate::version::{KvmInfo, Version, VersionBanner};

const V0_9_0: u32 = 9_000;
const V0_10_0: u32 = 10_000;
const V0_12_0: u32 = 12_000;
const V0_13_0: u32 = 13_000;

const KVM_TCP_MIGRATION: u32 = 79;
const KVM_EXEC_MIGRATION: u32 = 80;
const KVM_VNET_HDR: u32 = 74;

/// Inputs visible to every help-text rule.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    /// Help text, already clipped to the input cap.
    pub help: &'a [u8],
    pub version: Version,
    pub kvm: KvmInfo,
}

impl<'a> ScanContext<'a> {
    #[must_use]
    pub const fn new(help: &'a [u8], banner: VersionBanner) -> Self {
        Self {
            help,
            version: banner.version,
            kvm: banner.kvm,
        }
    }

    /// Whether `marker` occurs anywhere in the help text.
    #[must_use]
    pub fn has(&self, marker: &str) -> bool {
        contains(self.help, marker.as_bytes())
    }

    /// Whether the encoded version is at least `threshold`.
    #[must_use]
    pub const fn at_least(&self, threshold: u32) -> bool {
        self.version.encoded() >= threshold
    }

    /// KVM build number of a pre-0.10 `(kvm-N)` build, else 0.
    const fn legacy_kvm_build(&self) -> u32 {
        if self.at_least(V0_10_0) {
            0
        } else {
            self.kvm.kvm_version
        }
    }
}

/// How a [`Rule`] decides its capability.
#[derive(Clone, Copy)]
pub enum Test {
    /// The marker occurs anywhere in the help text.
    Marker(&'static str),
    /// Arbitrary condition over the scan context.
    Predicate(fn(&ScanContext<'_>) -> bool),
}

/// One capability and the condition that sets it.
#[derive(Clone, Copy)]
pub struct Rule {
    pub capability: Capability,
    pub test: Test,
}

impl Rule {
    const fn marker(capability: Capability, marker: &'static str) -> Self {
        Self {
            capability,
            test: Test::Marker(marker),
        }
    }

    const fn when(capability: Capability, predicate: fn(&ScanContext<'_>) -> bool) -> Self {
        Self {
            capability,
            test: Test::Predicate(predicate),
        }
    }

    /// Evaluate against `ctx`.
    #[must_use]
    pub fn holds(&self, ctx: &ScanContext<'_>) -> bool {
        match self.test {
            Test::Marker(marker) => ctx.has(marker),
            Test::Predicate(predicate) => predicate(ctx),
        }
    }
}

/// The help-text rule table.
pub const HELP_RULES: &[Rule] = &[
    // --- Plain option markers ---
    Rule::marker(Capability::Kqemu, "-no-kqemu"),
    Rule::marker(Capability::EnableKqemu, "-enable-kqemu"),
    Rule::marker(Capability::Kvm, "-no-kvm"),
    Rule::marker(Capability::EnableKvm, "-enable-kvm"),
    Rule::marker(Capability::NoReboot, "-no-reboot"),
    Rule::marker(Capability::Name, "-name"),
    Rule::marker(Capability::Uuid, "-uuid"),
    Rule::marker(Capability::XenDomid, "-xen-domid"),
    Rule::marker(Capability::Drive, "-drive"),
    Rule::marker(Capability::Spice, "-spice"),
    Rule::marker(Capability::DriveBoot, "boot=on"),
    Rule::marker(Capability::DriveSerial, "serial=s"),
    Rule::marker(Capability::PciDevice, "-pcidevice"),
    Rule::marker(Capability::MemPath, "-mem-path"),
    Rule::marker(Capability::Chardev, "-chardev"),
    Rule::marker(Capability::ChardevSpicevmc, "-chardev spicevmc"),
    Rule::marker(Capability::Balloon, "-balloon"),
    Rule::marker(Capability::Device, "-device"),
    Rule::marker(Capability::Nodefconfig, "-nodefconfig"),
    Rule::marker(Capability::Rtc, "-rtc "),
    Rule::marker(Capability::RtcTdHack, "-rtc-td-hack"),
    Rule::marker(Capability::NoHpet, "-no-hpet"),
    Rule::marker(Capability::NoKvmPit, "-no-kvm-pit-reinjection"),
    Rule::marker(Capability::Tdf, "-tdf"),
    Rule::marker(Capability::Nesting, "-enable-nesting"),
    Rule::marker(Capability::BootMenu, ",menu=on"),
    Rule::marker(Capability::Fsdev, "-fsdev"),
    Rule::marker(Capability::SmbiosType, "-smbios type"),
    Rule::marker(Capability::Sdl, "-sdl"),
    // --- Combined markers ---
    Rule::when(Capability::NameProcess, |ctx| {
        ctx.has("-name") && ctx.has(",process=")
    }),
    Rule::when(Capability::Domid, |ctx| {
        ctx.has("-domid") && !ctx.has("-xen-domid")
    }),
    Rule::when(Capability::DriveCacheV2, |ctx| {
        ctx.has("-drive") && ctx.has("cache=") && !ctx.has("cache=on|off")
    }),
    Rule::when(Capability::DriveFormat, |ctx| {
        ctx.has("-drive") && ctx.has("format=")
    }),
    Rule::when(Capability::DriveReadonly, |ctx| {
        (ctx.has("-drive") && ctx.has("readonly=")) || ctx.has("-device")
    }),
    Rule::when(Capability::DriveAio, |ctx| {
        ctx.has("-drive") && ctx.has("aio=threads|native")
    }),
    Rule::when(Capability::Vga, |ctx| vga_option(ctx).is_some()),
    Rule::when(Capability::VgaQxl, |ctx| {
        vga_option(ctx).is_some_and(|rest| contains(rest, b"|qxl"))
    }),
    Rule::when(Capability::VgaNone, |ctx| {
        vga_option(ctx)
            .and_then(|rest| rest.iter().position(|&b| b == b'\n').map(|end| &rest[..end]))
            .is_some_and(|line| contains(line, b"|none"))
    }),
    Rule::when(Capability::SmpTopology, |ctx| {
        ctx.has("cores=") && ctx.has("threads=") && ctx.has("sockets=")
    }),
    Rule::when(Capability::Netdev, |ctx| {
        ctx.has("-netdev") && ctx.at_least(V0_13_0)
    }),
    Rule::when(Capability::VhostNet, |ctx| {
        ctx.kvm.is_kvm && ctx.has(",vhost=")
    }),
    // --- Version gates ---
    Rule::when(Capability::VncColon, |ctx| ctx.at_least(V0_9_0)),
    Rule::when(Capability::Gen010, |ctx| ctx.at_least(V0_10_0)),
    Rule::when(Capability::MigrateQemuUnix, |ctx| ctx.at_least(V0_12_0)),
    Rule::when(Capability::MigrateQemuFd, |ctx| ctx.at_least(V0_12_0)),
    Rule::when(Capability::MonitorJson, |ctx| ctx.at_least(V0_13_0)),
    Rule::when(Capability::VnetHdr, |ctx| {
        ctx.kvm.is_kvm && (ctx.at_least(V0_10_0) || ctx.kvm.kvm_version >= KVM_VNET_HDR)
    }),
    Rule::when(Capability::MigrateQemuTcp, |ctx| {
        ctx.at_least(V0_10_0) || ctx.legacy_kvm_build() >= KVM_TCP_MIGRATION
    }),
    Rule::when(Capability::MigrateQemuExec, |ctx| {
        ctx.at_least(V0_10_0) || ctx.legacy_kvm_build() >= KVM_EXEC_MIGRATION
    }),
    Rule::when(Capability::MigrateKvmStdio, |ctx| {
        (1..KVM_TCP_MIGRATION).contains(&ctx.legacy_kvm_build())
    }),
];

/// Help text from the first `-vga` onward, when `-vga` is present and the
/// legacy `-std-vga` option is not.
fn vga_option<'a>(ctx: &ScanContext<'a>) -> Option<&'a [u8]> {
    if ctx.has("-std-vga") {
        return None;
    }
    find_subsequence(ctx.help, b"-vga").map(|start| &ctx.help[start..])
}

/// Scan help text for capabilities.
///
/// `help` should already be clipped to the input cap; the scan itself only
/// borrows it.
#[must_use]
pub fn scan_help(help: &[u8], banner: VersionBanner) -> FlagSet {
    scan_with_rules(&ScanContext::new(help, banner), HELP_RULES)
}

/// Evaluate an arbitrary rule table.
#[must_use]
pub fn scan_with_rules(ctx: &ScanContext<'_>, rules: &[Rule]) -> FlagSet {
    let mut flags = FlagSet::empty();
    for rule in rules {
        if rule.holds(ctx) && flags.insert(rule.capability) {
            crate::trace!(capability = rule.capability.name(), "capability detected");
        }
    }
    flags
}
