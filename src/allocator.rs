//! Deterministic, finite probe sequences for open addressing.
//!
//! A key (in practice the textual form of a client IP) is mapped to a base slot in a space of
//! `M` slots by one seeded [MurmurHash3] and walked with a stride derived from a second,
//! independently seeded hash ([double hashing]). The stride is always coprime to `M`, so a
//! [`ProbeSequence`] yields every slot of the space exactly once and then ends. Callers treat
//! the end of the sequence as "the space is full".
//!
//! Hashes are seeded with fixed values, so a key always probes the same slots in the same order,
//! across restarts and hosts. The [registry][crate::registry] relies on this to find a previously
//! assigned name without keeping an index.
//!
//! [MurmurHash3]: https://github.com/aappleby/smhasher/wiki/MurmurHash3
//! [double hashing]: https://en.wikipedia.org/wiki/Double_hashing

use crate::error::Error;
use murmur3::murmur3_x64_128;

const BASE_SEED: u32 = 42;
const STEP_SEED: u32 = 47;

fn hash(key: &[u8], seed: u32) -> u128 {
    let mut source = key;
    // NB: unwrap is safe: reading from an in-memory slice never fails.
    murmur3_x64_128(&mut source, seed).unwrap()
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Stride in `[1, space)` coprime to `space`. Starts from `1 + h mod (space - 1)` and moves
/// forward (wrapping to 1) until coprime.
fn coprime_step(h: u128, space: u128) -> u128 {
    if space <= 2 {
        return 1;
    }
    let mut step = 1 + h % (space - 1);
    while gcd(step, space) != 1 {
        step = step % (space - 1) + 1;
    }
    step
}

/// `(a + b) mod m` for `a, b < m` without overflowing.
fn add_mod(a: u128, b: u128, m: u128) -> u128 {
    let gap = m - b;
    if a >= gap {
        a - gap
    } else {
        a + b
    }
}

/// Size of the space addressed by `parts` digits of base `range`.
///
/// # Errors
///
/// Returns [`Error::DegenerateNameSpace`] unless `parts >= 1` and `range >= 2`, and
/// [`Error::NameSpaceOverflow`] if the space doesn't fit in 128 bits.
pub fn name_space(parts: u32, range: usize) -> Result<u128, Error> {
    if parts == 0 || range < 2 {
        return Err(Error::DegenerateNameSpace { parts, range });
    }
    (range as u128)
        .checked_pow(parts)
        .ok_or(Error::NameSpaceOverflow { parts, range })
}

/// Every slot of `[0, space)` exactly once, in an order determined by the key.
#[derive(Debug, Clone)]
pub struct ProbeSequence {
    space: u128,
    step: u128,
    next: u128,
    remaining: u128,
}

impl ProbeSequence {
    /// Probe sequence for `key` over `space` slots. An empty space yields nothing.
    #[must_use]
    pub fn new(key: &[u8], space: u128) -> Self {
        if space == 0 {
            return Self {
                space,
                step: 0,
                next: 0,
                remaining: 0,
            };
        }
        Self {
            space,
            step: coprime_step(hash(key, STEP_SEED), space),
            next: hash(key, BASE_SEED) % space,
            remaining: space,
        }
    }
}

impl Iterator for ProbeSequence {
    type Item = u128;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next;
        self.next = add_mod(current, self.step, self.space);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

/// Shorthand for [`ProbeSequence::new`].
#[must_use]
pub fn probe_sequence(key: &[u8], space: u128) -> ProbeSequence {
    ProbeSequence::new(key, space)
}

/// A [`ProbeSequence`] over `range ^ parts` slots, each slot decomposed into `parts`
/// little-endian digits of base `range`.
#[derive(Debug, Clone)]
pub struct PartSequence {
    probes: ProbeSequence,
    parts: u32,
    range: u128,
}

impl Iterator for PartSequence {
    type Item = Vec<usize>;

    #[allow(clippy::cast_possible_truncation)]
    fn next(&mut self) -> Option<Self::Item> {
        let mut value = self.probes.next()?;
        let digits = (0..self.parts)
            .map(|_| {
                // Digits are below `range`, which came from a usize.
                let digit = (value % self.range) as usize;
                value /= self.range;
                digit
            })
            .collect();
        Some(digits)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.probes.size_hint()
    }
}

/// Probe `range ^ parts` slots for `key`, yielding each slot as `parts` digits in
/// `[0, range)`. Digit `i` is `(slot / range^i) mod range`.
///
/// # Errors
///
/// See [`name_space`].
pub fn part_sequence(key: &[u8], parts: u32, range: usize) -> Result<PartSequence, Error> {
    let space = name_space(parts, range)?;
    Ok(PartSequence {
        probes: ProbeSequence::new(key, space),
        parts,
        range: range as u128,
    })
}
