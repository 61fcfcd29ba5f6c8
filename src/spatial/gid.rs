//! Global tile id encoding.
//!
//! Tiled stores flip flags in the three highest bits of every tile id; the
//! remaining 29 bits index into the map's tileset ranges.

pub const FLIP_H: u32 = 0x8000_0000; // bit 31
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
pub const FLIP_MASK: u32 = FLIP_H | FLIP_V | FLIP_D;
pub const GID_MASK: u32 = !FLIP_MASK;

/// Flip flags carried by a global tile id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlipFlags {
    pub horizontal: bool,
    pub vertical: bool,
    pub diagonal: bool,
}

impl FlipFlags {
    /// No flipping.
    pub const NONE: FlipFlags = FlipFlags {
        horizontal: false,
        vertical: false,
        diagonal: false,
    };

    #[inline]
    pub fn bits(self) -> u32 {
        (if self.horizontal { FLIP_H } else { 0 })
            | (if self.vertical { FLIP_V } else { 0 })
            | (if self.diagonal { FLIP_D } else { 0 })
    }

    #[inline]
    pub fn is_flipped(self) -> bool {
        self != FlipFlags::NONE
    }
}

/// A decoded id: the tileset-relative bits plus flip flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DecodedGid {
    /// Global id with the flip bits cleared. 0 means "no tile".
    pub gid: u32,
    pub flip: FlipFlags,
}

/// Raw 32-bit id as found in layer data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileId(pub u32);

impl TileId {
    #[inline] pub fn raw(self) -> u32 { self.0 }
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }
    #[inline] pub fn is_empty(self) -> bool { self.clean() == 0 }

    #[inline]
    pub fn decode(self) -> DecodedGid {
        decode(self.0)
    }
}

impl From<DecodedGid> for TileId {
    fn from(d: DecodedGid) -> Self {
        TileId(encode(d))
    }
}

/// Split a raw id into its gid and flip flags.
#[inline]
pub fn decode(id: u32) -> DecodedGid {
    DecodedGid {
        gid: id & GID_MASK,
        flip: FlipFlags {
            horizontal: id & FLIP_H != 0,
            vertical: id & FLIP_V != 0,
            diagonal: id & FLIP_D != 0,
        },
    }
}

/// Inverse of [`decode`]. Bits of `gid` that overlap the flag bits are dropped.
#[inline]
pub fn encode(d: DecodedGid) -> u32 {
    (d.gid & GID_MASK) | d.flip.bits()
}
