//! Property-based invariant tests for the capability parser.
//!
//! 1. Parsing is deterministic.
//! 2. The `0.10` generation flag is set exactly when version ≥ 0.10.0.
//! 3. A `(kvm-N)` tag yields a KVM build N; no tag yields a plain build.
//! 4. Device-list text is ignored without the `device` bit.
//! 5. The device scan never clears a bit.
//! 6. FlagSet union is commutative, associative and idempotent.
//! 7. Version encoding preserves component order.
//! 8. Bytes past the input cap never change the result.
//! 9. No panics on arbitrary bytes.

use proptest::prelude::*;
use qcaps_core::devices::scan_devices;
use qcaps_core::{Capability, CapabilityParser, FlagSet, ParserConfig, Version, parse};

// ── Helpers ─────────────────────────────────────────────────────────────

const MARKERS: &[&str] = &[
    "-no-kqemu",
    "-enable-kvm",
    "-no-kvm",
    "-drive [file=file][,cache=writethrough|writeback|none][,format=f]",
    "-name string1[,process=string2]",
    "-uuid %08x",
    "-vga [std|cirrus|vmware|qxl|none]",
    "-std-vga",
    "-chardev spicevmc,id=id",
    "-netdev user,id=str",
    "-net tap[,vhost=on|off]",
    "-smp n[,cores=cores][,threads=threads][,sockets=sockets]",
    "-rtc [base=utc|localtime]",
    "-spice [port=nr]",
    "-mem-path FILE",
];

const DEVICE_LIST: &str = "\
name \"hda-duplex\", bus HDA-bus
name \"ccid-card-emulated\", bus ccid-bus
name \"spicevmc\", bus virtio-serial-bus
virtio-net-pci.tx=string
virtio-blk-pci.bootindex=int32
pci-assign.bootindex=int32
";

fn version_strategy() -> impl Strategy<Value = (u32, u32, u32)> {
    (0u32..=2, 0u32..=20, 0u32..=99)
}

fn body_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(MARKERS), 0..8).prop_map(|lines| lines.join("\n"))
}

fn flagset_strategy() -> impl Strategy<Value = FlagSet> {
    any::<u64>().prop_map(|mask| {
        Capability::ALL
            .iter()
            .copied()
            .filter(|cap| mask & (1 << cap.bit()) != 0)
            .collect()
    })
}

fn help_text(major: u32, minor: u32, micro: u32, tag: &str, body: &str) -> String {
    format!("QEMU PC emulator version {major}.{minor}.{micro}{tag}, Copyright (c) 2003-2008 Fabrice Bellard\n{body}\n")
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn parse_is_deterministic((major, minor, micro) in version_strategy(), body in body_strategy()) {
        let help = help_text(major, minor, micro, "", &body);
        let first = parse(help.as_bytes(), Some(DEVICE_LIST.as_bytes()));
        let second = parse(help.as_bytes(), Some(DEVICE_LIST.as_bytes()));
        prop_assert_eq!(first, second);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Generation flag tracks the version gate
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn generation_flag_iff_at_least_0_10((major, minor, micro) in version_strategy(), body in body_strategy()) {
        let help = help_text(major, minor, micro, "", &body);
        let result = parse(help.as_bytes(), None).unwrap();
        let expected = result.version.encoded() >= 10_000;
        prop_assert_eq!(
            result.flags.contains(Capability::Gen010),
            expected,
            "version {} body {:?}",
            result.version,
            body
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. KVM tag
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn kvm_tag_round_trip((major, minor, micro) in version_strategy(), build in 0u32..1000) {
        let tagged = help_text(major, minor, micro, &format!(" (kvm-{build})"), "");
        let result = parse(tagged.as_bytes(), None).unwrap();
        prop_assert!(result.is_kvm());
        prop_assert_eq!(result.kvm_version(), build);

        let plain = help_text(major, minor, micro, "", "");
        let result = parse(plain.as_bytes(), None).unwrap();
        prop_assert!(!result.is_kvm());
        prop_assert_eq!(result.kvm_version(), 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Device-list gating
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn device_list_needs_device_bit(
        (major, minor, micro) in version_strategy(),
        body in body_strategy(),
        list in "[a-z\"., =\n]{0,200}",
    ) {
        let help = help_text(major, minor, micro, "", &body);
        let without = parse(help.as_bytes(), None).unwrap();
        prop_assume!(!without.flags.contains(Capability::Device));

        let fixed = parse(help.as_bytes(), Some(DEVICE_LIST.as_bytes())).unwrap();
        let random = parse(help.as_bytes(), Some(list.as_bytes())).unwrap();
        prop_assert_eq!(fixed, without);
        prop_assert_eq!(random, without);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Device scan only adds bits
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn device_scan_is_monotone(flags in flagset_strategy(), list in "[a-z\"., =\n-]{0,200}") {
        let scanned = scan_devices(list.as_bytes(), flags);
        prop_assert!(flags.difference(scanned).is_empty());

        let scanned = scan_devices(DEVICE_LIST.as_bytes(), flags);
        prop_assert!(flags.difference(scanned).is_empty());
        if flags.contains(Capability::Device) {
            prop_assert!(scanned.contains(Capability::HdaDuplex));
        } else {
            prop_assert_eq!(scanned, flags);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Union laws
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn union_commutative(a in flagset_strategy(), b in flagset_strategy()) {
        prop_assert_eq!(a.union(b), b.union(a));
    }

    #[test]
    fn union_idempotent(a in flagset_strategy()) {
        prop_assert_eq!(a.union(a), a);
    }

    #[test]
    fn union_associative(a in flagset_strategy(), b in flagset_strategy(), c in flagset_strategy()) {
        prop_assert_eq!(a.union(b).union(c), a.union(b.union(c)));
    }

    #[test]
    fn display_parses_back(a in flagset_strategy()) {
        prop_assert_eq!(a.to_string().parse::<FlagSet>(), Ok(a));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Version encoding order
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn encoding_preserves_order(
        a in (0u32..=999, 0u32..=999, 0u32..=999),
        b in (0u32..=999, 0u32..=999, 0u32..=999),
    ) {
        let ea = Version::from_components(a.0, a.1, a.2).unwrap();
        let eb = Version::from_components(b.0, b.1, b.2).unwrap();
        prop_assert_eq!(ea.cmp(&eb), a.cmp(&b));
        prop_assert_eq!((ea.major(), ea.minor(), ea.micro()), a);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Input cap
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn bytes_past_cap_are_ignored(
        body in body_strategy(),
        tail in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let help = help_text(0, 12, 1, "", &body);
        let parser = CapabilityParser::with_config(ParserConfig::default().max_input_len(help.len()));
        let mut extended = help.clone().into_bytes();
        extended.extend_from_slice(&tail);
        prop_assert_eq!(
            parser.parse(help.as_bytes(), None),
            parser.parse(&extended, None)
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 9. No panics
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(
        help in prop::collection::vec(any::<u8>(), 0..512),
        list in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let _ = parse(&help, Some(list.as_slice()));
    }

    #[test]
    fn arbitrary_body_after_banner_parses(tail in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut help = b"QEMU emulator version 0.13.0\n".to_vec();
        help.extend_from_slice(&tail);
        let result = parse(&help, None);
        prop_assert!(result.is_ok());
        prop_assert_eq!(result.unwrap().version.encoded(), 13_000);
    }

    #[test]
    fn arbitrary_banner_suffix_never_panics(suffix in "[0-9. ()a-z-]{0,40}") {
        let help = format!("QEMU PC emulator version {suffix}\n");
        let _ = parse(help.as_bytes(), None);
    }
}
