//! Share representation and the byte-level wire form.

use super::gf2to64::Gf2to64;

/// A single share of a sharing.
///
/// `point` is the evaluation point, mapped into the field via its 64-bit
/// coefficient vector. `bytes` is the wire form: the big-endian 8-byte
/// encoding of the polynomial evaluation for every chunk of the secret, in
/// order, followed by a single byte holding the number of zero bytes that
/// were appended to pad the secret to a multiple of 8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Share {
    /// The evaluation point, in 1..=n.
    pub point: u64,
    /// The wire-form share value; `bytes.len() % 8 == 1`.
    pub bytes: Vec<u8>,
}

impl Share {
    pub fn new(point: u64, bytes: Vec<u8>) -> Self {
        Self { point, bytes }
    }

    /// The padding byte carried at the end of the wire form, if present.
    pub fn padding(&self) -> Option<u8> {
        self.bytes.last().copied()
    }
}

/// Converts a vector of field elements into the wire form: 8 bytes per
/// element, big-endian, plus the trailing padding byte.
pub(crate) fn encode_elements(elements: &[Gf2to64], padding: u8) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(elements.len() * 8 + 1);
    for element in elements {
        bytes.extend_from_slice(&element.coefficients().to_be_bytes());
    }
    bytes.push(padding);
    bytes
}

/// Decodes a byte slice into field elements. The slice length must be a
/// multiple of 8; the caller strips the padding byte first.
pub(crate) fn decode_elements(bytes: &[u8]) -> Vec<Gf2to64> {
    bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            Gf2to64::new(u64::from_be_bytes(buf))
        })
        .collect()
}
