// crates/kryon-core/src/header.rs
//! KRB header parsing. Two incompatible layouts exist in the wild: 42 bytes
//! (v0.3) and 48 bytes (v0.4, which inserts a component-definition count and
//! offset between the style and animation sections). The meaning of the
//! low flag bits also shifts between the two versions. We branch on
//! `version.minor` once, up front, and never try to auto-upgrade a v0.3
//! file into the v0.4 layout or vice versa (see spec §9 Open Questions).

use crate::{KryonError, Result};

pub const MAGIC: [u8; 4] = *b"KRB1";

pub const HEADER_SIZE_V3: usize = 42;
pub const HEADER_SIZE_V4: usize = 48;

bitflags::bitflags! {
    /// Shared flag bits whose *position* depends on the header version.
    /// `HeaderFlags` stores the raw bitfield; use [`KRBHeader`] accessors
    /// (`has_styles`, `has_component_defs`, ...) to read version-correct
    /// values rather than testing these constants directly.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RawFlags: u16 {
        const BIT0 = 1 << 0;
        const BIT1 = 1 << 1;
        const BIT2 = 1 << 2;
        const BIT3 = 1 << 3;
        const BIT4 = 1 << 4;
        const BIT5 = 1 << 5;
        const BIT6 = 1 << 6;
        const BIT7 = 1 << 7;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub fn from_u16(raw: u16) -> Self {
        Self {
            major: (raw & 0xFF) as u8,
            minor: (raw >> 8) as u8,
        }
    }

    /// v0.4 introduces the component-definition section and the wider
    /// 48-byte header.
    pub fn is_v4_or_later(&self) -> bool {
        self.minor >= 4
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SectionOffsets {
    pub element_offset: u32,
    pub style_offset: u32,
    pub component_def_offset: u32,
    pub animation_offset: u32,
    pub string_offset: u32,
    pub resource_offset: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct KRBHeader {
    pub version: Version,
    pub raw_flags: RawFlags,
    pub element_count: u16,
    pub style_count: u16,
    pub component_def_count: u16,
    pub animation_count: u16,
    pub string_count: u16,
    pub resource_count: u16,
    pub offsets: SectionOffsets,
    pub total_size: u32,
    pub header_size: usize,
}

impl KRBHeader {
    pub fn has_styles(&self) -> bool {
        self.raw_flags.contains(RawFlags::BIT0)
    }

    pub fn has_component_defs(&self) -> bool {
        self.version.is_v4_or_later() && self.raw_flags.contains(RawFlags::BIT1)
    }

    pub fn has_animations(&self) -> bool {
        if self.version.is_v4_or_later() {
            self.raw_flags.contains(RawFlags::BIT2)
        } else {
            self.raw_flags.contains(RawFlags::BIT1)
        }
    }

    pub fn has_resources(&self) -> bool {
        if self.version.is_v4_or_later() {
            self.raw_flags.contains(RawFlags::BIT3)
        } else {
            self.raw_flags.contains(RawFlags::BIT2)
        }
    }

    pub fn compressed(&self) -> bool {
        if self.version.is_v4_or_later() {
            self.raw_flags.contains(RawFlags::BIT4)
        } else {
            self.raw_flags.contains(RawFlags::BIT3)
        }
    }

    pub fn fixed_point(&self) -> bool {
        if self.version.is_v4_or_later() {
            self.raw_flags.contains(RawFlags::BIT5)
        } else {
            self.raw_flags.contains(RawFlags::BIT4)
        }
    }

    pub fn extended_color(&self) -> bool {
        if self.version.is_v4_or_later() {
            self.raw_flags.contains(RawFlags::BIT6)
        } else {
            self.raw_flags.contains(RawFlags::BIT5)
        }
    }

    pub fn has_app(&self) -> bool {
        if self.version.is_v4_or_later() {
            self.raw_flags.contains(RawFlags::BIT7)
        } else {
            self.raw_flags.contains(RawFlags::BIT6)
        }
    }
}

fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Parses the fixed-size header at offset 0. Returns a decode-fatal error
/// for a bad magic or a truncated buffer; version mismatches and other soft
/// issues are the caller's concern (decode-warn, per spec §7).
pub fn parse_header(data: &[u8]) -> Result<KRBHeader> {
    if data.len() < HEADER_SIZE_V3 {
        return Err(KryonError::Truncated {
            expected: HEADER_SIZE_V3,
            found: data.len(),
        });
    }

    if data[0..4] != MAGIC {
        return Err(KryonError::InvalidKrb("bad magic bytes".to_string()));
    }

    let version = Version::from_u16(read_u16_le(data, 4));
    let raw_flags = RawFlags::from_bits_truncate(read_u16_le(data, 6));
    let element_count = read_u16_le(data, 8);
    let style_count = read_u16_le(data, 10);

    let (header_size, component_def_count, animation_count, string_count, resource_count, offsets, total_size) =
        if version.is_v4_or_later() {
            if data.len() < HEADER_SIZE_V4 {
                return Err(KryonError::Truncated {
                    expected: HEADER_SIZE_V4,
                    found: data.len(),
                });
            }
            let component_def_count = read_u16_le(data, 12);
            let animation_count = read_u16_le(data, 14);
            let string_count = read_u16_le(data, 16);
            let resource_count = read_u16_le(data, 18);
            let offsets = SectionOffsets {
                element_offset: read_u32_le(data, 20),
                style_offset: read_u32_le(data, 24),
                component_def_offset: read_u32_le(data, 28),
                animation_offset: read_u32_le(data, 32),
                string_offset: read_u32_le(data, 36),
                resource_offset: read_u32_le(data, 40),
            };
            let total_size = read_u32_le(data, 44);
            (
                HEADER_SIZE_V4,
                component_def_count,
                animation_count,
                string_count,
                resource_count,
                offsets,
                total_size,
            )
        } else {
            let animation_count = read_u16_le(data, 12);
            let string_count = read_u16_le(data, 14);
            let resource_count = read_u16_le(data, 16);
            let offsets = SectionOffsets {
                element_offset: read_u32_le(data, 18),
                style_offset: read_u32_le(data, 22),
                component_def_offset: 0,
                animation_offset: read_u32_le(data, 26),
                string_offset: read_u32_le(data, 30),
                resource_offset: read_u32_le(data, 34),
            };
            let total_size = read_u32_le(data, 38);
            (
                HEADER_SIZE_V3,
                0,
                animation_count,
                string_count,
                resource_count,
                offsets,
                total_size,
            )
        };

    Ok(KRBHeader {
        version,
        raw_flags,
        element_count,
        style_count,
        component_def_count,
        animation_count,
        string_count,
        resource_count,
        offsets,
        total_size,
        header_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v3_header(element_count: u16, flags: u16) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE_V3];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..6].copy_from_slice(&0x0003u16.to_le_bytes()); // major=3, minor=0
        buf[6..8].copy_from_slice(&flags.to_le_bytes());
        buf[8..10].copy_from_slice(&element_count.to_le_bytes());
        buf
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = v3_header(1, 0);
        buf[0] = b'X';
        assert!(parse_header(&buf).is_err());
    }

    #[test]
    fn rejects_truncated() {
        let buf = vec![0u8; 10];
        assert!(matches!(parse_header(&buf), Err(KryonError::Truncated { .. })));
    }

    #[test]
    fn v3_has_app_is_bit6() {
        let buf = v3_header(1, 0x40);
        let header = parse_header(&buf).unwrap();
        assert_eq!(header.header_size, HEADER_SIZE_V3);
        assert!(header.has_app());
        assert!(!header.has_styles());
    }

    #[test]
    fn v4_component_defs_flag_requires_v4() {
        let mut buf = vec![0u8; HEADER_SIZE_V4];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..6].copy_from_slice(&0x0403u16.to_le_bytes()); // major=3, minor=4
        buf[6..8].copy_from_slice(&0x02u16.to_le_bytes()); // bit1 set
        let header = parse_header(&buf).unwrap();
        assert_eq!(header.header_size, HEADER_SIZE_V4);
        assert!(header.version.is_v4_or_later());
        assert!(header.has_component_defs());
    }
}
