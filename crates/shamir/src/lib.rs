//! Shamir's secret sharing over the field GF(2^64).
//!
//! The field is represented as GF(2)[x]/(x^64 + x^4 + x^3 + x + 1), and
//! elements are mapped to integers via h(sum_i c_i x^i) = sum_i c_i 2^i.
//!
//! A secret is split into n shares such that any k of them reconstruct it,
//! while k-1 shares carry no information beyond the secret's length. An
//! 8-byte secret is converted into a field element and shared with a random
//! polynomial of degree k-1 that has the secret as its constant term; the
//! shares are the evaluations at the fixed nonzero points 1..=n. Longer
//! secrets are split into 8-byte chunks, each shared independently with a
//! fresh polynomial. Secrets whose length is not a multiple of 8 are padded
//! with zeros, and the last byte of every share records the padding size.
//!
//! # Security
//!
//! The scheme is information-theoretically secure but carries no integrity
//! check and is very malleable: a share holder who knows the other
//! evaluation points can flip chosen bits of the reconstructed secret by
//! modifying their own share. Corruption detection is the business of a
//! higher layer (per-share salted hashes in the sharing metadata).

mod gf2to64;
mod share;

use hashbrown::HashSet;
use rand::rngs::OsRng;

pub use gf2to64::Gf2to64;
pub use share::Share;

use share::{decode_elements, encode_elements};

/// Identifier of the one field this implementation supports. Recorded in
/// serialized sharing schemes; renaming it would orphan existing backups.
pub const GF_ID: &str = "GF_2to64_x64_x4_x3_x1";

/// Errors that can occur while sharing or reconstructing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShamirError {
    /// k and n must satisfy 1 <= k <= n
    InvalidThreshold { k: u32, n: u32 },
    /// The secret to be shared is empty
    EmptyInput,
    /// No shares were supplied for reconstruction
    NoShares,
    /// A share's length is not congruent to 1 modulo 8
    InvalidShareSize,
    /// The padding byte is outside 0..=7
    InvalidPadding,
    /// Shares disagree on length or padding
    IncompatibleShares,
    /// Two shares carry the same evaluation point, or a point is zero
    DuplicateShares(u64),
}

impl std::fmt::Display for ShamirError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidThreshold { k, n } => {
                write!(f, "invalid threshold: k={} must be in range 1..={}", k, n)
            }
            Self::EmptyInput => write!(f, "cannot share an empty secret"),
            Self::NoShares => write!(f, "no shares received"),
            Self::InvalidShareSize => write!(f, "invalid size of shares"),
            Self::InvalidPadding => write!(f, "invalid padding size"),
            Self::IncompatibleShares => write!(f, "incompatible shares"),
            Self::DuplicateShares(point) => {
                write!(f, "duplicate or invalid share point: {}", point)
            }
        }
    }
}

impl std::error::Error for ShamirError {}

pub type Result<T> = std::result::Result<T, ShamirError>;

/// Computes a k-out-of-n sharing of `secret` using the process-wide secure
/// RNG for the polynomial coefficients.
pub fn share(secret: &[u8], n: u32, k: u32) -> Result<Vec<Share>> {
    share_with_rng(secret, n, k, &mut OsRng)
}

/// Computes a k-out-of-n sharing of `secret` drawing polynomial
/// coefficients from the supplied RNG. Deterministic tests inject a seeded
/// RNG here; everything else goes through [`share`].
pub fn share_with_rng<R: rand::Rng>(
    secret: &[u8],
    n: u32,
    k: u32,
    rng: &mut R,
) -> Result<Vec<Share>> {
    if k < 1 || n < k {
        return Err(ShamirError::InvalidThreshold { k, n });
    }
    if secret.is_empty() {
        return Err(ShamirError::EmptyInput);
    }

    // Pad with zeros to the next multiple of 8; the padding size rides along
    // in every share so reconstruction can restore the original length.
    let rem = secret.len() % 8;
    let padding = if rem == 0 { 0 } else { 8 - rem };
    let mut encoded = secret.to_vec();
    encoded.resize(secret.len() + padding, 0);
    let chunks = decode_elements(&encoded);

    let n = n as usize;
    let mut evaluations = vec![Vec::with_capacity(chunks.len()); n];
    for &chunk in &chunks {
        // Fresh random polynomial per chunk, secret chunk as constant term.
        let mut poly = Vec::with_capacity(k as usize);
        poly.push(chunk);
        for _ in 1..k {
            poly.push(Gf2to64::new(rng.gen::<u64>()));
        }
        for (j, evals) in evaluations.iter_mut().enumerate() {
            let point = Gf2to64::new(j as u64 + 1);
            // Horner, highest coefficient first.
            let mut res = Gf2to64::ZERO;
            for &coeff in poly.iter().rev() {
                res = res.multiply(point).add(coeff);
            }
            evals.push(res);
        }
    }

    Ok(evaluations
        .into_iter()
        .enumerate()
        .map(|(j, evals)| Share::new(j as u64 + 1, encode_elements(&evals, padding as u8)))
        .collect())
}

/// Reconstructs the secret from the given shares.
///
/// All supplied shares participate in the interpolation; if more than the
/// scheme's k are passed in, the result is unchanged. Enforcing that at
/// least k shares are present is the caller's job, since the wire form of a
/// share does not carry the scheme parameters.
pub fn reconstruct(shares: &[Share]) -> Result<Vec<u8>> {
    let k = shares.len();
    if k == 0 {
        return Err(ShamirError::NoShares);
    }

    // A share is a sequence of field elements followed by the padding size,
    // so its length must be congruent to 1 modulo 8.
    let share_size = shares[0].bytes.len();
    if share_size % 8 != 1 {
        return Err(ShamirError::InvalidShareSize);
    }
    let padding = shares[0].bytes[share_size - 1];
    // The padding must fit inside the encoded chunks; in particular a
    // zero-chunk share cannot carry padding.
    if padding >= 8 || (share_size == 1 && padding != 0) {
        return Err(ShamirError::InvalidPadding);
    }
    let mut points = HashSet::with_capacity(k);
    for s in shares {
        if s.bytes.len() != share_size || s.bytes[share_size - 1] != padding {
            return Err(ShamirError::IncompatibleShares);
        }
        if !points.insert(s.point) {
            return Err(ShamirError::DuplicateShares(s.point));
        }
    }

    let x: Vec<Gf2to64> = shares.iter().map(|s| Gf2to64::new(s.point)).collect();
    let y: Vec<Vec<Gf2to64>> = shares
        .iter()
        .map(|s| decode_elements(&s.bytes[..share_size - 1]))
        .collect();

    // Only the constant term of the interpolation polynomial is needed:
    //
    //   sec = sum_i y_i prod_{j != i} x_j / (x_i + x_j)
    //
    // (addition and subtraction coincide in a binary field). With
    // prodx = prod_j x_j this simplifies to
    //
    //   sec = prodx * sum_i y_i (x_i prod_{j != i} (x_i + x_j))^{-1}
    //
    // which needs one inversion per share instead of one per pair.
    let mut prodx = Gf2to64::ONE;
    for &xi in &x {
        prodx = prodx.multiply(xi);
    }

    let mut p = Vec::with_capacity(k);
    for i in 0..k {
        let mut res = x[i];
        for j in 0..k {
            if i != j {
                res = res.multiply(x[i].add(x[j]));
            }
        }
        // The inversion fails exactly when some point is zero; duplicate
        // points were already rejected above.
        p.push(
            res.inverse()
                .ok_or(ShamirError::DuplicateShares(shares[i].point))?,
        );
    }

    let num_elements = (share_size - 1) / 8;
    let mut sec = Vec::with_capacity(num_elements);
    for c in 0..num_elements {
        let mut res = Gf2to64::ZERO;
        for i in 0..k {
            res = res.add(p[i].multiply(y[i][c]));
        }
        sec.push(res.multiply(prodx));
    }

    let mut out = encode_elements(&sec, padding);
    out.truncate(num_elements * 8 - padding as usize);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::rand_core::SeedableRng;

    fn seeded_rng(seed: u8) -> rand_chacha::ChaCha8Rng {
        rand_chacha::ChaCha8Rng::from_seed([seed; 32])
    }

    #[test]
    fn test_basic_subsets() {
        let secret = hex::decode("0001020304050607080a0b0c0d0e0f101112131415161718191a")
            .unwrap();
        let shares = share(&secret, 5, 3).unwrap();
        // Every 3-subset of the 5 shares reconstructs the secret.
        for a in 0..5 {
            for b in 0..a {
                for c in 0..b {
                    let some = vec![
                        shares[a].clone(),
                        shares[b].clone(),
                        shares[c].clone(),
                    ];
                    assert_eq!(secret, reconstruct(&some).unwrap());
                }
            }
        }
    }

    #[test]
    fn test_size_of_secret() {
        for size in 1..97usize {
            let secret: Vec<u8> = (0..size).map(|j| ((j * j) & 0xff) as u8).collect();
            let shares = share(&secret, 16, 6).unwrap();
            let some: Vec<Share> = [3, 7, 10, 15, 11, 6]
                .iter()
                .map(|&i| shares[i].clone())
                .collect();
            assert_eq!(secret, reconstruct(&some).unwrap(), "size: {size}");
        }
    }

    #[test]
    fn test_share_wire_shape() {
        let secret = [42u8; 13];
        let shares = share(&secret, 4, 2).unwrap();
        for (j, s) in shares.iter().enumerate() {
            assert_eq!(s.point, j as u64 + 1);
            assert_eq!(s.bytes.len(), 17); // 2 chunks of 8 bytes + padding byte
            assert_eq!(s.bytes.len() % 8, 1);
            assert_eq!(s.padding(), Some(3));
        }
    }

    #[test]
    fn test_more_shares_than_necessary() {
        let secret = hex::decode("0001020304050607080a0b0c0d0e0f101112131415161718191a")
            .unwrap();
        let shares = share(&secret, 16, 6).unwrap();
        let some: Vec<Share> = [3, 7, 10, 15, 11, 6, 2, 0]
            .iter()
            .map(|&i| shares[i].clone())
            .collect();
        assert_eq!(secret, reconstruct(&some).unwrap());
    }

    #[test]
    fn test_min_k() {
        // For k = 1 every single share is an encoding of the secret.
        let secret = hex::decode("0001020304050607080a0b0c0d0e0f101112131415161718191a")
            .unwrap();
        let shares = share(&secret, 5, 1).unwrap();
        for s in &shares {
            assert_eq!(secret, reconstruct(std::slice::from_ref(s)).unwrap());
        }
    }

    #[test]
    fn test_deterministic_with_seeded_rng() {
        let secret = b"deterministic";
        let a = share_with_rng(secret, 5, 3, &mut seeded_rng(0x90)).unwrap();
        let b = share_with_rng(secret, 5, 3, &mut seeded_rng(0x90)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(
            share(b"secret", 5, 0),
            Err(ShamirError::InvalidThreshold { k: 0, n: 5 })
        );
        assert_eq!(
            share(b"secret", 2, 3),
            Err(ShamirError::InvalidThreshold { k: 3, n: 2 })
        );
        assert_eq!(share(&[], 5, 3), Err(ShamirError::EmptyInput));
    }

    #[test]
    fn test_reconstruct_errors() {
        assert_eq!(reconstruct(&[]), Err(ShamirError::NoShares));

        // Length not congruent to 1 mod 8.
        let bad = Share::new(1, vec![0u8; 8]);
        assert_eq!(reconstruct(&[bad]), Err(ShamirError::InvalidShareSize));

        // Padding byte out of range.
        let mut bytes = vec![0u8; 9];
        bytes[8] = 8;
        let bad = Share::new(1, bytes);
        assert_eq!(reconstruct(&[bad]), Err(ShamirError::InvalidPadding));

        // A padding byte with no chunks to pad.
        let bad = Share::new(1, vec![3]);
        assert_eq!(reconstruct(&[bad]), Err(ShamirError::InvalidPadding));

        // Shares disagreeing on length.
        let mut shares = share(b"some secret", 3, 2).unwrap();
        shares[1].bytes = vec![0u8; shares[0].bytes.len() + 8];
        assert_eq!(reconstruct(&shares), Err(ShamirError::IncompatibleShares));

        // Shares disagreeing on padding.
        let mut shares = share(b"some secret", 3, 2).unwrap();
        let last = shares[1].bytes.len() - 1;
        shares[1].bytes[last] = 2;
        assert_eq!(reconstruct(&shares), Err(ShamirError::IncompatibleShares));

        // Two shares with the same point.
        let shares = share(b"some secret", 3, 2).unwrap();
        let dup = vec![shares[0].clone(), shares[0].clone()];
        assert_eq!(reconstruct(&dup), Err(ShamirError::DuplicateShares(1)));

        // A zero evaluation point never comes out of share(); it is caught
        // by the failing inversion.
        let zero_point = vec![Share::new(0, shares[0].bytes.clone())];
        assert_eq!(
            reconstruct(&zero_point),
            Err(ShamirError::DuplicateShares(0))
        );
    }

    /// Regression vector shared with the other client implementations: the
    /// fixed shares must keep reconstructing to the same secret, pinning
    /// down the big-endian chunk encoding and the trailing padding byte.
    #[test]
    fn test_regression() {
        let expected = "b74d8d6d3177117678db793b82b94fd520a6fa1854f42fb81521";
        let vectors: [(u64, &str); 6] = [
            (
                3,
                "68a5aa1079d5ea2daa0d49097446ca3767fb758dadf3d0e7decea238421a34ca06",
            ),
            (
                1,
                "434ab37e121dac4fffad407950a30d3b0b272bee9d9e6fdc2e06d429ae856b0106",
            ),
            (
                10,
                "fae772cd64fe37a16b73265997938e0e4c5a455f0960cf4ce90498a471b4e53806",
            ),
            (
                4,
                "564d6970ba6506b80def6d4bfa9d608e2d20aa911a86e7f00e9278a1c28b048706",
            ),
            (
                6,
                "4dd3ee1d2cebd550da65a7883fd3fc372cc13f247ea2244f383a9ed7ca65518b06",
            ),
            (
                8,
                "a5926b7610521c94e7c401e5c9756f34f4cd5dd922ae7308e82ccee6cd624fc106",
            ),
        ];
        let shares: Vec<Share> = vectors
            .iter()
            .map(|&(point, hex_bytes)| Share::new(point, hex::decode(hex_bytes).unwrap()))
            .collect();
        assert_eq!(expected, hex::encode(reconstruct(&shares).unwrap()));
    }
}
