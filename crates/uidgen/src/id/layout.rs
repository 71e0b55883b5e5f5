/// Field widths of a packed 64-bit identifier.
///
/// The fields are laid out most-significant first. The top bit is always
/// zero; with [`Layout::DEFAULT`] only 59 bits are in use, so bits 59 through
/// 63 are all clear:
///
/// ```text
///  Bit Index:  63        59 58            18 17         15 14           10 9             0
///              +-----------+----------------+-------------+---------------+---------------+
///  Field:      | zero (5)  | timestamp (41) | node id (3) | issuer id (5) | sequence (10) |
///              +-----------+----------------+-------------+---------------+---------------+
///              |<----------------- MSB ----------- 64 bits ----------- LSB ---------------->|
/// ```
///
/// A `Layout` is a plain value. Issuers copy it at construction and every
/// shift and mask is derived from the four widths, so the whole bit scheme is
/// defined in one place.
///
/// # Example
///
/// ```
/// use uidgen::Layout;
///
/// let layout = Layout::DEFAULT;
/// let raw = layout.pack(42, 5, 3, 7);
///
/// assert_eq!(layout.timestamp_of(raw), 42);
/// assert_eq!(layout.node_id_of(raw), 5);
/// assert_eq!(layout.issuer_id_of(raw), 3);
/// assert_eq!(layout.sequence_of(raw), 7);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    timestamp_bits: u32,
    node_id_bits: u32,
    issuer_id_bits: u32,
    sequence_bits: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Layout {
    /// 41-bit timestamp, 3-bit node id, 5-bit issuer id, 10-bit sequence.
    pub const DEFAULT: Self = Self::new(41, 3, 5, 10);

    /// Builds a layout from explicit field widths.
    ///
    /// # Panics
    ///
    /// Panics (at compile time when used in a `const`) if the fields need more
    /// than 63 bits or if any field is empty.
    pub const fn new(
        timestamp_bits: u32,
        node_id_bits: u32,
        issuer_id_bits: u32,
        sequence_bits: u32,
    ) -> Self {
        assert!(
            timestamp_bits > 0 && node_id_bits > 0 && issuer_id_bits > 0 && sequence_bits > 0,
            "every layout field needs at least one bit"
        );
        assert!(
            timestamp_bits + node_id_bits + issuer_id_bits + sequence_bits <= 63,
            "layout must leave the top bit reserved"
        );
        Self {
            timestamp_bits,
            node_id_bits,
            issuer_id_bits,
            sequence_bits,
        }
    }

    pub const fn timestamp_bits(&self) -> u32 {
        self.timestamp_bits
    }

    pub const fn node_id_bits(&self) -> u32 {
        self.node_id_bits
    }

    pub const fn issuer_id_bits(&self) -> u32 {
        self.issuer_id_bits
    }

    pub const fn sequence_bits(&self) -> u32 {
        self.sequence_bits
    }

    /// Total number of bits in use, excluding the reserved bit.
    pub const fn used_bits(&self) -> u32 {
        self.timestamp_bits + self.node_id_bits + self.issuer_id_bits + self.sequence_bits
    }

    pub const fn sequence_shift(&self) -> u32 {
        0
    }

    pub const fn issuer_id_shift(&self) -> u32 {
        self.sequence_bits
    }

    pub const fn node_id_shift(&self) -> u32 {
        self.issuer_id_shift() + self.issuer_id_bits
    }

    pub const fn timestamp_shift(&self) -> u32 {
        self.node_id_shift() + self.node_id_bits
    }

    /// Largest tick the timestamp field can hold.
    pub const fn max_timestamp(&self) -> u64 {
        mask(self.timestamp_bits)
    }

    /// Largest node id, `7` for [`Layout::DEFAULT`].
    pub const fn max_node_id(&self) -> u64 {
        mask(self.node_id_bits)
    }

    /// Largest issuer id, `31` for [`Layout::DEFAULT`].
    pub const fn max_issuer_id(&self) -> u64 {
        mask(self.issuer_id_bits)
    }

    /// Largest sequence number within one tick, `1023` for
    /// [`Layout::DEFAULT`].
    pub const fn max_sequence(&self) -> u64 {
        mask(self.sequence_bits)
    }

    /// Packs the four fields into a raw identifier.
    ///
    /// Each value is masked to its field width; callers are expected to have
    /// range-checked them already.
    pub const fn pack(&self, timestamp: u64, node_id: u64, issuer_id: u64, sequence: u64) -> u64 {
        ((timestamp & self.max_timestamp()) << self.timestamp_shift())
            | ((node_id & self.max_node_id()) << self.node_id_shift())
            | ((issuer_id & self.max_issuer_id()) << self.issuer_id_shift())
            | ((sequence & self.max_sequence()) << self.sequence_shift())
    }

    pub const fn timestamp_of(&self, raw: u64) -> u64 {
        (raw >> self.timestamp_shift()) & self.max_timestamp()
    }

    pub const fn node_id_of(&self, raw: u64) -> u64 {
        (raw >> self.node_id_shift()) & self.max_node_id()
    }

    pub const fn issuer_id_of(&self, raw: u64) -> u64 {
        (raw >> self.issuer_id_shift()) & self.max_issuer_id()
    }

    pub const fn sequence_of(&self, raw: u64) -> u64 {
        (raw >> self.sequence_shift()) & self.max_sequence()
    }
}

const fn mask(bits: u32) -> u64 {
    (1 << bits) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_matches_documented_widths() {
        let layout = Layout::DEFAULT;
        assert_eq!(layout.used_bits(), 59);
        assert_eq!(layout.max_node_id(), 7);
        assert_eq!(layout.max_issuer_id(), 31);
        assert_eq!(layout.max_sequence(), 1023);
        assert_eq!(layout.max_timestamp(), (1 << 41) - 1);
        assert_eq!(layout.issuer_id_shift(), 10);
        assert_eq!(layout.node_id_shift(), 15);
        assert_eq!(layout.timestamp_shift(), 18);
    }

    #[test]
    fn fields_survive_packing_at_their_maxima() {
        let layout = Layout::DEFAULT;
        let raw = layout.pack(
            layout.max_timestamp(),
            layout.max_node_id(),
            layout.max_issuer_id(),
            layout.max_sequence(),
        );
        assert_eq!(raw >> 63, 0, "reserved bit must stay clear");
        assert_eq!(layout.timestamp_of(raw), layout.max_timestamp());
        assert_eq!(layout.node_id_of(raw), 7);
        assert_eq!(layout.issuer_id_of(raw), 31);
        assert_eq!(layout.sequence_of(raw), 1023);
    }

    #[test]
    fn oversized_fields_do_not_bleed_into_neighbours() {
        let layout = Layout::DEFAULT;
        let raw = layout.pack(0, 0xFF, 0, 0);
        assert_eq!(layout.node_id_of(raw), 7);
        assert_eq!(layout.timestamp_of(raw), 0);
        assert_eq!(layout.issuer_id_of(raw), 0);
    }

    #[test]
    fn timestamp_dominates_ordering() {
        let layout = Layout::DEFAULT;
        let earlier = layout.pack(10, 7, 31, 1023);
        let later = layout.pack(11, 0, 0, 0);
        assert!(earlier < later);
    }

    #[test]
    #[should_panic(expected = "top bit reserved")]
    fn rejects_layouts_wider_than_63_bits() {
        let _ = Layout::new(42, 10, 5, 10);
    }
}
