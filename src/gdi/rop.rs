//! Raster operation engine.
//!
//! Ternary codes (ROP3) combine destination, source and pattern; binary codes
//! (ROP2) combine destination and pen. Both are boolean truth tables applied
//! to every bit of the packed canonical pixel word (see
//! [`Rgba::to_word`](super::color::Rgba::to_word)), alpha included.
//!
//! ROP3 truth-table bit `i` is the output for `i = (P << 2) | (S << 1) | D`.
//! A full GDI code such as `0x00CC0020` carries its table in bits 16..23; a
//! bare value up to `0xFF` is taken as the table itself.
//!
//! ROP2 codes run from `R2_BLACK` (1) to `R2_WHITE` (16). The table is
//! `code - 1` with bit `i` the output for `i = (P << 1) | D`.
//!
//! The named codes have fast paths producing the same bits as the generic
//! evaluator.
//!
//! Indexed surfaces are the exception to canonical evaluation. When the
//! destination is 1 or 8 bpp, the code reads the destination or the source,
//! reads no pattern, and any source shares the destination's depth and
//! palette, the code runs on the raw palette indices masked to the sample
//! width. Inverting an indexed surface twice therefore restores it exactly.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Operands a raster operation reads.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RopOperands: u8 {
        const DEST = 0b001;
        const SOURCE = 0b010;
        const PATTERN = 0b100;
    }
}

/// Ternary raster operation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rop3(pub u32);

impl Rop3 {
    pub const SRCCOPY: Rop3 = Rop3(0x00CC0020); // D = S
    pub const SRCPAINT: Rop3 = Rop3(0x00EE0086); // D = S | D
    pub const SRCAND: Rop3 = Rop3(0x008800C6); // D = S & D
    pub const SRCINVERT: Rop3 = Rop3(0x00660046); // D = S ^ D
    pub const SRCERASE: Rop3 = Rop3(0x00440328); // D = S & ~D
    pub const NOTSRCCOPY: Rop3 = Rop3(0x00330008); // D = ~S
    pub const NOTSRCERASE: Rop3 = Rop3(0x001100A6); // D = ~S & ~D
    pub const MERGECOPY: Rop3 = Rop3(0x00C000CA); // D = S & P
    pub const MERGEPAINT: Rop3 = Rop3(0x00BB0226); // D = ~S | D
    pub const PATCOPY: Rop3 = Rop3(0x00F00021); // D = P
    pub const PATPAINT: Rop3 = Rop3(0x00FB0A09); // D = D | P | ~S
    pub const PATINVERT: Rop3 = Rop3(0x005A0049); // D = P ^ D
    pub const DSTINVERT: Rop3 = Rop3(0x00550009); // D = ~D
    pub const BLACKNESS: Rop3 = Rop3(0x00000042); // D = 0
    pub const WHITENESS: Rop3 = Rop3(0x00FF0062); // D = 1
    pub const DSPDXAX: Rop3 = Rop3(0x00E20746); // D = (S & P) | (~S & D)
    pub const SPNA: Rop3 = Rop3(0x000C0324); // D = S & ~P
    pub const DSNA: Rop3 = Rop3(0x00220326); // D = D & ~S

    const NAMED: [(Rop3, &'static str); 18] = [
        (Self::SRCCOPY, "SRCCOPY"),
        (Self::SRCPAINT, "SRCPAINT"),
        (Self::SRCAND, "SRCAND"),
        (Self::SRCINVERT, "SRCINVERT"),
        (Self::SRCERASE, "SRCERASE"),
        (Self::NOTSRCCOPY, "NOTSRCCOPY"),
        (Self::NOTSRCERASE, "NOTSRCERASE"),
        (Self::MERGECOPY, "MERGECOPY"),
        (Self::MERGEPAINT, "MERGEPAINT"),
        (Self::PATCOPY, "PATCOPY"),
        (Self::PATPAINT, "PATPAINT"),
        (Self::PATINVERT, "PATINVERT"),
        (Self::DSTINVERT, "DSTINVERT"),
        (Self::BLACKNESS, "BLACKNESS"),
        (Self::WHITENESS, "WHITENESS"),
        (Self::DSPDXAX, "DSPDxax"),
        (Self::SPNA, "SPna"),
        (Self::DSNA, "DSna"),
    ];

    /// The 8-entry truth table.
    #[inline]
    pub const fn table(self) -> u8 {
        if self.0 > 0xFF {
            ((self.0 >> 16) & 0xFF) as u8
        } else {
            self.0 as u8
        }
    }

    /// Operands whose value can change the result.
    pub const fn operands(self) -> RopOperands {
        let t = self.table();
        let mut bits = 0u8;
        if ((t >> 1) ^ t) & 0x55 != 0 {
            bits |= RopOperands::DEST.bits();
        }
        if ((t >> 2) ^ t) & 0x33 != 0 {
            bits |= RopOperands::SOURCE.bits();
        }
        if ((t >> 4) ^ t) & 0x0F != 0 {
            bits |= RopOperands::PATTERN.bits();
        }
        RopOperands::from_bits_truncate(bits)
    }

    #[inline]
    pub const fn uses_source(self) -> bool {
        self.operands().contains(RopOperands::SOURCE)
    }

    #[inline]
    pub const fn uses_pattern(self) -> bool {
        self.operands().contains(RopOperands::PATTERN)
    }

    #[inline]
    pub const fn uses_dest(self) -> bool {
        self.operands().contains(RopOperands::DEST)
    }

    /// Name of a documented code, matched on its truth table.
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(rop, _)| rop.table() == self.table())
            .map(|(_, name)| *name)
    }

    /// Combine packed pixel words.
    #[inline]
    pub fn apply(self, d: u32, s: u32, p: u32) -> u32 {
        let table = self.table();
        fast_rop3(table, d, s, p).unwrap_or_else(|| eval_rop3(table, d, s, p))
    }
}

impl fmt::Debug for Rop3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Rop3({})", name),
            None => write!(f, "Rop3(0x{:02X})", self.table()),
        }
    }
}

impl From<u32> for Rop3 {
    fn from(code: u32) -> Self {
        Rop3(code)
    }
}

/// Named-code shortcuts, keyed by truth table.
#[inline]
fn fast_rop3(table: u8, d: u32, s: u32, p: u32) -> Option<u32> {
    let out = match table {
        0x00 => 0,
        0xFF => u32::MAX,
        0xAA => d,
        0xCC => s,
        0xF0 => p,
        0x55 => !d,
        0x33 => !s,
        0xEE => s | d,
        0x88 => s & d,
        0x66 => s ^ d,
        0x44 => s & !d,
        0x11 => !s & !d,
        0xC0 => s & p,
        0xBB => !s | d,
        0xFB => d | p | !s,
        0x5A => p ^ d,
        0xE2 => (s & p) | (!s & d),
        0x0C => s & !p,
        0x22 => d & !s,
        _ => return None,
    };
    Some(out)
}

/// Evaluate any ternary truth table, 32 bits at a time.
///
/// Each set table bit contributes the minterm selecting the bit positions
/// where `(P, S, D)` equals that bit's index.
pub fn eval_rop3(table: u8, d: u32, s: u32, p: u32) -> u32 {
    let mut out = 0u32;
    for index in 0..8u8 {
        if table & (1 << index) == 0 {
            continue;
        }
        let dm = if index & 0b001 != 0 { d } else { !d };
        let sm = if index & 0b010 != 0 { s } else { !s };
        let pm = if index & 0b100 != 0 { p } else { !p };
        out |= dm & sm & pm;
    }
    out
}

/// Binary raster operation used for strokes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rop2(u8);

impl Rop2 {
    pub const BLACK: Rop2 = Rop2(0x01); // 0
    pub const NOTMERGEPEN: Rop2 = Rop2(0x02); // DPon
    pub const MASKNOTPEN: Rop2 = Rop2(0x03); // DPna
    pub const NOTCOPYPEN: Rop2 = Rop2(0x04); // PN
    pub const MASKPENNOT: Rop2 = Rop2(0x05); // PDna
    pub const NOT: Rop2 = Rop2(0x06); // Dn
    pub const XORPEN: Rop2 = Rop2(0x07); // DPx
    pub const NOTMASKPEN: Rop2 = Rop2(0x08); // DPan
    pub const MASKPEN: Rop2 = Rop2(0x09); // DPa
    pub const NOTXORPEN: Rop2 = Rop2(0x0A); // DPxn
    pub const NOP: Rop2 = Rop2(0x0B); // D
    pub const MERGENOTPEN: Rop2 = Rop2(0x0C); // DPno
    pub const COPYPEN: Rop2 = Rop2(0x0D); // P
    pub const MERGEPENNOT: Rop2 = Rop2(0x0E); // PDno
    pub const MERGEPEN: Rop2 = Rop2(0x0F); // DPo
    pub const WHITE: Rop2 = Rop2(0x10); // 1

    const NAMES: [&'static str; 16] = [
        "BLACK",
        "NOTMERGEPEN",
        "MASKNOTPEN",
        "NOTCOPYPEN",
        "MASKPENNOT",
        "NOT",
        "XORPEN",
        "NOTMASKPEN",
        "MASKPEN",
        "NOTXORPEN",
        "NOP",
        "MERGENOTPEN",
        "COPYPEN",
        "MERGEPENNOT",
        "MERGEPEN",
        "WHITE",
    ];

    pub const fn new(code: u32) -> Option<Self> {
        if code >= 1 && code <= 16 {
            Some(Rop2(code as u8))
        } else {
            None
        }
    }

    #[inline]
    pub const fn code(self) -> u32 {
        self.0 as u32
    }

    /// The 4-entry truth table.
    #[inline]
    pub const fn table(self) -> u8 {
        self.0 - 1
    }

    pub fn name(self) -> &'static str {
        Self::NAMES[self.table() as usize]
    }

    /// Combine a destination word with the pen word.
    #[inline]
    pub fn apply(self, d: u32, p: u32) -> u32 {
        match self.0 {
            0x01 => 0,
            0x02 => !(d | p),
            0x03 => d & !p,
            0x04 => !p,
            0x05 => p & !d,
            0x06 => !d,
            0x07 => d ^ p,
            0x08 => !(d & p),
            0x09 => d & p,
            0x0A => !(d ^ p),
            0x0B => d,
            0x0C => d | !p,
            0x0D => p,
            0x0E => p | !d,
            0x0F => d | p,
            0x10 => u32::MAX,
            _ => eval_rop2(self.table(), d, p),
        }
    }
}

impl Default for Rop2 {
    fn default() -> Self {
        Self::COPYPEN
    }
}

impl fmt::Debug for Rop2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rop2({})", self.name())
    }
}

impl serde::Serialize for Rop2 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.code())
    }
}

impl<'de> serde::Deserialize<'de> for Rop2 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u32::deserialize(deserializer)?;
        Rop2::new(code)
            .ok_or_else(|| serde::de::Error::custom(format!("ROP2 code {} outside 1..=16", code)))
    }
}

/// Evaluate any binary truth table, 32 bits at a time.
pub fn eval_rop2(table: u8, d: u32, p: u32) -> u32 {
    let mut out = 0u32;
    for index in 0..4u8 {
        if table & (1 << index) == 0 {
            continue;
        }
        let dm = if index & 0b01 != 0 { d } else { !d };
        let pm = if index & 0b10 != 0 { p } else { !p };
        out |= dm & pm;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Bit-by-bit reading of the truth table.
    fn reference_rop3(table: u8, d: u32, s: u32, p: u32) -> u32 {
        (0..32).fold(0, |out, bit| {
            let index = (((p >> bit) & 1) << 2) | (((s >> bit) & 1) << 1) | ((d >> bit) & 1);
            out | ((((table >> index) & 1) as u32) << bit)
        })
    }

    #[test]
    fn test_table_extraction() {
        assert_eq!(Rop3::SRCCOPY.table(), 0xCC);
        assert_eq!(Rop3::BLACKNESS.table(), 0x00);
        assert_eq!(Rop3::WHITENESS.table(), 0xFF);
        assert_eq!(Rop3(0xCC).table(), 0xCC);
        assert_eq!(Rop3(0x5A).name(), Some("PATINVERT"));
        assert_eq!(Rop3(0x01).name(), None);
        assert_eq!(format!("{:?}", Rop3::DSTINVERT), "Rop3(DSTINVERT)");
    }

    #[test]
    fn test_named_semantics() {
        let (d, s, p) = (0xF0F0_F0F0u32, 0xCCCC_CCCCu32, 0xAAAA_AAAAu32);
        let cases: [(Rop3, u32); 18] = [
            (Rop3::SRCCOPY, s),
            (Rop3::SRCPAINT, s | d),
            (Rop3::SRCAND, s & d),
            (Rop3::SRCINVERT, s ^ d),
            (Rop3::SRCERASE, s & !d),
            (Rop3::NOTSRCCOPY, !s),
            (Rop3::NOTSRCERASE, !s & !d),
            (Rop3::MERGECOPY, s & p),
            (Rop3::MERGEPAINT, !s | d),
            (Rop3::PATCOPY, p),
            (Rop3::PATPAINT, d | p | !s),
            (Rop3::PATINVERT, p ^ d),
            (Rop3::DSTINVERT, !d),
            (Rop3::BLACKNESS, 0),
            (Rop3::WHITENESS, u32::MAX),
            (Rop3::DSPDXAX, (s & p) | (!s & d)),
            (Rop3::SPNA, s & !p),
            (Rop3::DSNA, d & !s),
        ];
        for (rop, expected) in cases {
            assert_eq!(rop.apply(d, s, p), expected, "{:?}", rop);
            assert_eq!(eval_rop3(rop.table(), d, s, p), expected, "{:?} generic", rop);
        }
    }

    #[test]
    fn test_generic_matches_reference_for_all_tables() {
        let (d, s, p) = (0x1234_5678u32, 0x9ABC_DEF0u32, 0x0F1E_2D3Cu32);
        for table in 0..=255u8 {
            assert_eq!(eval_rop3(table, d, s, p), reference_rop3(table, d, s, p));
            assert_eq!(Rop3(table as u32).apply(d, s, p), reference_rop3(table, d, s, p));
        }
    }

    #[test]
    fn test_operands() {
        assert_eq!(Rop3::SRCCOPY.operands(), RopOperands::SOURCE);
        assert_eq!(Rop3::PATCOPY.operands(), RopOperands::PATTERN);
        assert_eq!(Rop3::DSTINVERT.operands(), RopOperands::DEST);
        assert!(Rop3::BLACKNESS.operands().is_empty());
        assert!(Rop3::WHITENESS.operands().is_empty());
        assert_eq!(Rop3::DSPDXAX.operands(), RopOperands::all());
        assert!(Rop3::MERGECOPY.uses_pattern() && Rop3::MERGECOPY.uses_source());
        assert!(!Rop3::MERGECOPY.uses_dest());
    }

    #[test]
    fn test_rop2_codes() {
        assert_eq!(Rop2::new(0), None);
        assert_eq!(Rop2::new(17), None);
        assert_eq!(Rop2::new(13), Some(Rop2::COPYPEN));
        assert_eq!(Rop2::COPYPEN.table(), 0b1100);
        assert_eq!(Rop2::NOT.table(), 0b0101);
        assert_eq!(Rop2::XORPEN.name(), "XORPEN");
        assert_eq!(Rop2::default(), Rop2::COPYPEN);
    }

    #[test]
    fn test_rop2_fast_paths_match_tables() {
        let (d, p) = (0xF0F0_1234u32, 0xCCCC_8765u32);
        for code in 1..=16 {
            let rop = Rop2::new(code).unwrap();
            assert_eq!(rop.apply(d, p), eval_rop2(rop.table(), d, p), "{:?}", rop);
        }
    }

    proptest! {
        #[test]
        fn prop_fast_paths_match_generic(d in any::<u32>(), s in any::<u32>(), p in any::<u32>()) {
            for (rop, _) in Rop3::NAMED {
                prop_assert_eq!(rop.apply(d, s, p), eval_rop3(rop.table(), d, s, p));
            }
        }

        #[test]
        fn prop_dstinvert_is_involution(d in any::<u32>(), s in any::<u32>(), p in any::<u32>()) {
            let once = Rop3::DSTINVERT.apply(d, s, p);
            prop_assert_eq!(Rop3::DSTINVERT.apply(once, s, p), d);
        }

        #[test]
        fn prop_constant_codes_ignore_operands(
            d in any::<u32>(), s1 in any::<u32>(), p1 in any::<u32>(),
            s2 in any::<u32>(), p2 in any::<u32>(),
        ) {
            prop_assert_eq!(Rop3::BLACKNESS.apply(d, s1, p1), Rop3::BLACKNESS.apply(d, s2, p2));
            prop_assert_eq!(Rop3::WHITENESS.apply(d, s1, p1), Rop3::WHITENESS.apply(d, s2, p2));
            prop_assert_eq!(Rop3::BLACKNESS.apply(d, s1, p1), 0);
            prop_assert_eq!(Rop3::WHITENESS.apply(d, s1, p1), u32::MAX);
        }

        #[test]
        fn prop_rop3_matches_reference(table in any::<u8>(), d in any::<u32>(), s in any::<u32>(), p in any::<u32>()) {
            prop_assert_eq!(Rop3(table as u32).apply(d, s, p), reference_rop3(table, d, s, p));
        }
    }
}
