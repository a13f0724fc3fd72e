//! the multitype (`%`) operand grammar and its first-byte classification table.
//!
//! a multitype operand is one of ten encodings, distinguished by a prefix of up to eight bits of
//! the operand's first byte. rather than walk a ladder of mask checks on every decode, the
//! class for each of the 256 possible first bytes is computed once, at compile time, from
//! [`PATTERNS`]. two patterns claiming the same byte is a compile error.

/// one of the ten multitype operand encodings. the comment on each variant is its bit pattern,
/// as written in RFC 3320.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub enum MultitypeClass {
    /// `00nnnnnn`: `N`, in `[0, 63]`.
    Direct6,
    /// `01nnnnnn`: the word at `memory[2 * N]`.
    Indirect6,
    /// `1000011n`: `2 ^ (N + 6)`, `64` or `128`.
    PowerOfTwo6,
    /// `10001nnn`: `2 ^ (N + 8)`, `256` through `32768`.
    PowerOfTwo8,
    /// `111nnnnn`: `N + 65504`.
    Biased5,
    /// `1001nnnn nnnnnnnn`: `N + 61440`.
    Biased12,
    /// `101nnnnn nnnnnnnn`: `N`, in `[0, 8191]`.
    Direct13,
    /// `110nnnnn nnnnnnnn`: the word at `memory[N]`.
    Indirect13,
    /// `10000000 nnnnnnnn nnnnnnnn`: `N`.
    Direct16,
    /// `10000001 nnnnnnnn nnnnnnnn`: the word at `memory[N]`.
    Indirect16,
}

impl MultitypeClass {
    /// the class number as used in tables of the multitype grammar, `1` through `10`.
    pub fn number(&self) -> u8 {
        match self {
            MultitypeClass::Direct6 => 1,
            MultitypeClass::Indirect6 => 2,
            MultitypeClass::PowerOfTwo6 => 3,
            MultitypeClass::PowerOfTwo8 => 4,
            MultitypeClass::Biased5 => 5,
            MultitypeClass::Biased12 => 6,
            MultitypeClass::Direct13 => 7,
            MultitypeClass::Indirect13 => 8,
            MultitypeClass::Direct16 => 9,
            MultitypeClass::Indirect16 => 10,
        }
    }

    /// total length of an operand of this class, in bytes, including the first byte.
    pub fn len(&self) -> u8 {
        match self {
            MultitypeClass::Direct6 |
            MultitypeClass::Indirect6 |
            MultitypeClass::PowerOfTwo6 |
            MultitypeClass::PowerOfTwo8 |
            MultitypeClass::Biased5 => 1,
            MultitypeClass::Biased12 |
            MultitypeClass::Direct13 |
            MultitypeClass::Indirect13 => 2,
            MultitypeClass::Direct16 |
            MultitypeClass::Indirect16 => 3,
        }
    }

    /// `true` if the decoded field is an address whose word is the operand's actual value.
    pub fn is_indirect(&self) -> bool {
        match self {
            MultitypeClass::Indirect6 |
            MultitypeClass::Indirect13 |
            MultitypeClass::Indirect16 => true,
            _ => false,
        }
    }
}

/// `(mask, bits, class)`: a first byte `b` belongs to `class` when `b & mask == bits`.
pub const PATTERNS: &[(u8, u8, MultitypeClass)] = &[
    (0b1100_0000, 0b0000_0000, MultitypeClass::Direct6),
    (0b1100_0000, 0b0100_0000, MultitypeClass::Indirect6),
    (0b1111_1110, 0b1000_0110, MultitypeClass::PowerOfTwo6),
    (0b1111_1000, 0b1000_1000, MultitypeClass::PowerOfTwo8),
    (0b1110_0000, 0b1110_0000, MultitypeClass::Biased5),
    (0b1111_0000, 0b1001_0000, MultitypeClass::Biased12),
    (0b1110_0000, 0b1010_0000, MultitypeClass::Direct13),
    (0b1110_0000, 0b1100_0000, MultitypeClass::Indirect13),
    (0b1111_1111, 0b1000_0000, MultitypeClass::Direct16),
    (0b1111_1111, 0b1000_0001, MultitypeClass::Indirect16),
];

const fn build_table() -> [Option<MultitypeClass>; 256] {
    let mut table: [Option<MultitypeClass>; 256] = [None; 256];
    let mut byte = 0usize;
    while byte < 256 {
        let mut i = 0;
        while i < PATTERNS.len() {
            let (mask, bits, class) = PATTERNS[i];
            if (byte as u8) & mask == bits {
                if table[byte].is_some() {
                    panic!("multitype patterns overlap");
                }
                table[byte] = Some(class);
            }
            i += 1;
        }
        byte += 1;
    }
    table
}

/// the class of a multitype operand, indexed by its first byte. `None` marks first bytes that
/// begin no valid multitype operand (`0x82` through `0x85`).
pub static MULTITYPE_CLASSES: [Option<MultitypeClass>; 256] = build_table();

/// classify the first byte of a multitype operand.
#[inline(always)]
pub fn multitype_class(first: u8) -> Option<MultitypeClass> {
    MULTITYPE_CLASSES[first as usize]
}

#[cfg(test)]
mod test {
    use super::{multitype_class, MultitypeClass, PATTERNS};

    // the same predicates as `PATTERNS`, but spelled out as shifts so a typo in one is not
    // mirrored in the other.
    fn predicates(b: u8) -> [(bool, MultitypeClass); 10] {
        [
            (b >> 6 == 0b00, MultitypeClass::Direct6),
            (b >> 6 == 0b01, MultitypeClass::Indirect6),
            (b >> 1 == 0b1000011, MultitypeClass::PowerOfTwo6),
            (b >> 3 == 0b10001, MultitypeClass::PowerOfTwo8),
            (b >> 5 == 0b111, MultitypeClass::Biased5),
            (b >> 4 == 0b1001, MultitypeClass::Biased12),
            (b >> 5 == 0b101, MultitypeClass::Direct13),
            (b >> 5 == 0b110, MultitypeClass::Indirect13),
            (b == 0b1000_0000, MultitypeClass::Direct16),
            (b == 0b1000_0001, MultitypeClass::Indirect16),
        ]
    }

    #[test]
    fn table_is_total_and_exclusive() {
        for b in 0..=255u8 {
            let preds = predicates(b);
            let mut matching = preds.iter().filter(|(hit, _)| *hit).map(|(_, class)| *class);
            let first = matching.next();
            assert_eq!(matching.next(), None, "{:#04x} matches more than one class", b);
            assert_eq!(multitype_class(b), first, "{:#04x}", b);
        }
    }

    #[test]
    fn only_0x82_through_0x85_are_unmapped() {
        for b in 0..=255u8 {
            assert_eq!(multitype_class(b).is_none(), (0x82..=0x85).contains(&b), "{:#04x}", b);
        }
    }

    #[test]
    fn class_sizes() {
        let mut counts = [0usize; 11];
        for b in 0..=255u8 {
            if let Some(class) = multitype_class(b) {
                counts[class.number() as usize] += 1;
            }
        }
        assert_eq!(counts, [0, 64, 64, 2, 8, 32, 16, 32, 32, 1, 1]);
        assert_eq!(PATTERNS.len(), 10);
    }

    #[test]
    fn class_lengths() {
        assert_eq!(multitype_class(0x3f).map(|c| c.len()), Some(1));
        assert_eq!(multitype_class(0x9a).map(|c| c.len()), Some(2));
        assert_eq!(multitype_class(0x81).map(|c| c.len()), Some(3));
        assert!(MultitypeClass::Indirect6.is_indirect());
        assert!(!MultitypeClass::Biased12.is_indirect());
    }
}
