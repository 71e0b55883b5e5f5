use core::fmt;

use crate::id::Layout;

/// A packed 64-bit identifier.
///
/// `Uid` is an opaque, ordered wrapper around the raw `u64`. Within one
/// issuer, later IDs always compare greater than earlier ones because the
/// timestamp occupies the most significant used bits.
///
/// With the `serde` feature the ID serializes as a bare integer. Consumers
/// that decode JSON into floating point (JavaScript, some dynamic languages)
/// lose precision above 2^53 and should treat the value as a string instead.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid {
    id: u64,
}

/// The decoded fields of a [`Uid`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Components {
    pub timestamp: u64,
    pub node_id: u64,
    pub issuer_id: u64,
    pub sequence: u64,
}

impl Uid {
    /// Packs already range-checked fields with the given layout.
    pub const fn from_components(
        layout: &Layout,
        timestamp: u64,
        node_id: u64,
        issuer_id: u64,
        sequence: u64,
    ) -> Self {
        Self {
            id: layout.pack(timestamp, node_id, issuer_id, sequence),
        }
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Decodes the fields using [`Layout::DEFAULT`].
    pub const fn components(&self) -> Components {
        self.components_with(&Layout::DEFAULT)
    }

    /// Decodes the fields using a custom layout.
    pub const fn components_with(&self, layout: &Layout) -> Components {
        Components {
            timestamp: layout.timestamp_of(self.id),
            node_id: layout.node_id_of(self.id),
            issuer_id: layout.issuer_id_of(self.id),
            sequence: layout.sequence_of(self.id),
        }
    }

    /// Returns the ID as a zero-padded 20-digit string, which sorts
    /// lexicographically in the same order as the integer.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl From<Uid> for u64 {
    fn from(uid: Uid) -> Self {
        uid.id
    }
}

impl From<u64> for Uid {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Components {
            timestamp,
            node_id,
            issuer_id,
            sequence,
        } = self.components();
        f.debug_struct("Uid")
            .field("id", &self.id)
            .field("timestamp", &timestamp)
            .field("node_id", &node_id)
            .field("issuer_id", &issuer_id)
            .field("sequence", &sequence)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposes_into_the_packed_fields() {
        let uid = Uid::from_components(&Layout::DEFAULT, 1_000, 5, 3, 9);
        let raw = uid.to_raw();

        assert_eq!((raw >> 10) & 31, 3);
        assert_eq!((raw >> 15) & 7, 5);
        assert_eq!(
            uid.components(),
            Components {
                timestamp: 1_000,
                node_id: 5,
                issuer_id: 3,
                sequence: 9,
            }
        );
    }

    #[test]
    fn padded_string_is_twenty_digits() {
        let uid = Uid::from_raw(12_345);
        assert_eq!(uid.to_padded_string(), "00000000000000012345");
        assert_eq!(uid.to_string(), "12345");
    }

    #[test]
    fn custom_layouts_decode_with_their_own_shifts() {
        let layout = Layout::new(40, 4, 6, 12);
        let uid = Uid::from_components(&layout, 77, 12, 40, 4000);
        let parts = uid.components_with(&layout);
        assert_eq!(parts.timestamp, 77);
        assert_eq!(parts.node_id, 12);
        assert_eq!(parts.issuer_id, 40);
        assert_eq!(parts.sequence, 4000);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_a_bare_integer() {
        let uid = Uid::from_raw(u64::from(u32::MAX) << 20);
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, (u64::from(u32::MAX) << 20).to_string());
        let back: Uid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uid);
    }
}
