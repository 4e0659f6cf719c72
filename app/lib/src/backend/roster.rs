//! The default backend roster.

use crate::backend::{BackendDescriptor, BackendKind, Codec};

/// Standard codecs at maximum effort followed by the ULC candidate
/// executables, in registration order.
///
/// Executable paths are relative to the configured tools directory.
pub fn standard_roster() -> Vec<BackendDescriptor> {
    vec![
        BackendDescriptor::codec("Gzip", Codec::Gzip, 9),
        BackendDescriptor::codec("Bzip2", Codec::Bzip2, 9),
        BackendDescriptor::new(
            "LZMA",
            BackendKind::Codec {
                codec: Codec::Xz,
                level: 9,
                extreme: true,
            },
        ),
        BackendDescriptor::external("ULC-C", "ulc-c/ulc", "ulc"),
        BackendDescriptor::external("ULC-Ultra", "bin/ulc-ultra", "ulcu"),
        BackendDescriptor::external("ULC-Hyper", "bin/ulc-hyper", "ulch"),
        BackendDescriptor::external("ULC-Unified", "ulc-auto", "ulc"),
    ]
}
