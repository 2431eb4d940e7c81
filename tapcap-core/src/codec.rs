//! Variable-length edge-delta codec.
//!
//! The device timer reports the tick count between two signal edges. Deltas
//! are packed into a self-describing byte stream, both in the device's
//! capture buffer and in the capture file:
//!
//! ```text
//! short form (delta < 0x8000):   2 bytes, big-endian, bit 15 clear
//!   [0] 0ddddddd  [1] dddddddd
//! long form (delta >= 0x8000):   5 bytes, bit 15 set, 15+24-bit magnitude
//!   [0] 1ddddddd  [1] dddddddd  [2..5] low 24 bits, big-endian
//! ```
//!
//! The form is chosen solely by comparing the raw delta against 0x8000,
//! never by the post-mask magnitude, and encoding is deterministic.

use std::num::NonZeroU32;

use thiserror::Error;

/// Deltas below this threshold take the 2-byte short form.
pub const LONG_FORM_THRESHOLD: u32 = 0x8000;

/// Exclusive upper bound of the encodable range (31-bit magnitudes).
pub const MAX_DELTA: u32 = 1 << 31;

const SHORT_FORM_LEN: usize = 2;
const LONG_FORM_LEN: usize = 5;

/// Malformed or unencodable delta data.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("edge delta {0:#x} exceeds the 31-bit encodable range")]
    DeltaTooWide(u64),

    #[error("truncated delta stream at byte {pos}: need {needed} bytes, {available} available")]
    Truncated {
        pos: usize,
        needed: usize,
        available: usize,
    },
}

/// One encoded delta, at most five bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedDelta {
    bytes: [u8; LONG_FORM_LEN],
    len: usize,
}

impl EncodedDelta {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for EncodedDelta {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Encode a single edge delta.
pub fn encode_delta(delta: u32) -> Result<EncodedDelta, CodecError> {
    if delta >= MAX_DELTA {
        return Err(CodecError::DeltaTooWide(u64::from(delta)));
    }

    let mut bytes = [0u8; LONG_FORM_LEN];
    if delta < LONG_FORM_THRESHOLD {
        bytes[0] = (delta >> 8) as u8;
        bytes[1] = delta as u8;
        Ok(EncodedDelta {
            bytes,
            len: SHORT_FORM_LEN,
        })
    } else {
        // Bit 31 is known clear, so forcing the long-form marker into the
        // top bit of byte 0 never collides with magnitude bits. The masked
        // high half lands in bytes 0-1, the low 24 bits in bytes 2-4.
        let hi = ((delta >> 24) as u16 & 0x7fff) | 0x8000;
        bytes[0] = (hi >> 8) as u8;
        bytes[1] = hi as u8;
        bytes[2] = (delta >> 16) as u8;
        bytes[3] = (delta >> 8) as u8;
        bytes[4] = delta as u8;
        Ok(EncodedDelta {
            bytes,
            len: LONG_FORM_LEN,
        })
    }
}

/// Decode one delta starting at `pos`, returning the delta and the number
/// of bytes consumed.
///
/// Arbitrary long-form input can carry up to 39 bits of magnitude, so the
/// decoded value is `u64`; streams produced by [`encode_delta`] always
/// decode back into the 31-bit range.
pub fn decode_delta(stream: &[u8], pos: usize) -> Result<(u64, usize), CodecError> {
    let rest = stream.get(pos..).unwrap_or(&[]);
    if rest.len() < SHORT_FORM_LEN {
        return Err(CodecError::Truncated {
            pos,
            needed: SHORT_FORM_LEN,
            available: rest.len(),
        });
    }

    let head = u16::from_be_bytes([rest[0], rest[1]]);
    if head < 0x8000 {
        return Ok((u64::from(head), SHORT_FORM_LEN));
    }

    if rest.len() < LONG_FORM_LEN {
        return Err(CodecError::Truncated {
            pos,
            needed: LONG_FORM_LEN,
            available: rest.len(),
        });
    }

    let mut delta = u64::from(head & 0x7fff);
    delta = (delta << 8) | u64::from(rest[2]);
    delta = (delta << 8) | u64::from(rest[3]);
    delta = (delta << 8) | u64::from(rest[4]);
    Ok((delta, LONG_FORM_LEN))
}

/// Read cursor over an immutable delta stream.
///
/// Yields `Ok(delta)` per entry; a malformed tail yields one `Err` and then
/// fuses. The producer phase (device writing the buffer) and this consumer
/// phase never overlap.
#[derive(Debug, Clone)]
pub struct DeltaReader<'a> {
    stream: &'a [u8],
    pos: usize,
}

impl<'a> DeltaReader<'a> {
    pub fn new(stream: &'a [u8]) -> Self {
        Self { stream, pos: 0 }
    }

    /// Current byte offset into the stream.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Iterator for DeltaReader<'_> {
    type Item = Result<u64, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.stream.len() {
            return None;
        }
        match decode_delta(self.stream, self.pos) {
            Ok((delta, consumed)) => {
                self.pos += consumed;
                Some(Ok(delta))
            }
            Err(err) => {
                self.pos = self.stream.len();
                Some(Err(err))
            }
        }
    }
}

/// Aggregate statistics for a full delta stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub signal_count: u64,
    pub total_ticks: u64,
}

/// Decode the whole stream left to right, counting entries and summing
/// ticks.
pub fn scan_stream(stream: &[u8]) -> Result<StreamStats, CodecError> {
    let mut stats = StreamStats::default();
    for delta in DeltaReader::new(stream) {
        stats.total_ticks += delta?;
        stats.signal_count += 1;
    }
    Ok(stats)
}

/// Wall-clock tape length in whole seconds for a given tick total.
///
/// The timer advances at `precision_mhz` million ticks per second with a
/// fixed /64 prescaler, hence `ticks / 64 / 15625 / precision`. Taking the
/// precision as `NonZeroU32` keeps the zero-divisor case unrepresentable;
/// the session rejects a zero report before any duration math.
pub fn tape_seconds(total_ticks: u64, precision_mhz: NonZeroU32) -> u64 {
    (total_ticks >> 6) / 15625 / u64::from(precision_mhz.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn precision(mhz: u32) -> NonZeroU32 {
        NonZeroU32::new(mhz).unwrap()
    }

    #[test]
    fn short_form_is_two_bytes() {
        for delta in [0u32, 1, 0x7f, 0xff, 0x1234, 0x7fff] {
            let enc = encode_delta(delta).unwrap();
            assert_eq!(enc.len(), 2, "delta {delta:#x}");
            assert_eq!(decode_delta(enc.as_bytes(), 0).unwrap(), (u64::from(delta), 2));
        }
    }

    #[test]
    fn long_form_is_five_bytes() {
        for delta in [0x8000u32, 0x8001, 0x0001_0203, 0x00ff_ffff, 0x7fff_ffff] {
            let enc = encode_delta(delta).unwrap();
            assert_eq!(enc.len(), 5, "delta {delta:#x}");
            assert_eq!(decode_delta(enc.as_bytes(), 0).unwrap(), (u64::from(delta), 5));
        }
    }

    #[test]
    fn boundary_between_forms() {
        assert_eq!(encode_delta(0x7fff).unwrap().len(), 2);
        assert_eq!(encode_delta(0x8000).unwrap().len(), 5);
        // 0x8000 long form: marker bit set, magnitude in the low 24 bits.
        assert_eq!(
            encode_delta(0x8000).unwrap().as_bytes(),
            &[0x80, 0x00, 0x00, 0x80, 0x00]
        );
    }

    #[test]
    fn out_of_range_delta_rejected() {
        assert_eq!(
            encode_delta(MAX_DELTA),
            Err(CodecError::DeltaTooWide(u64::from(MAX_DELTA)))
        );
        assert!(encode_delta(MAX_DELTA - 1).is_ok());
    }

    #[test]
    fn encoding_is_deterministic() {
        for delta in [0u32, 42, 0x7fff, 0x8000, 0x0dead_beu32] {
            assert_eq!(encode_delta(delta).unwrap(), encode_delta(delta).unwrap());
        }
    }

    #[test]
    fn decode_short_form_examples() {
        assert_eq!(decode_delta(&[0x00, 0x0A], 0).unwrap(), (10, 2));
        assert_eq!(decode_delta(&[0x7f, 0xff], 0).unwrap(), (0x7fff, 2));
    }

    #[test]
    fn decode_long_form_example() {
        let (delta, consumed) = decode_delta(&[0x80, 0x00, 0x01, 0x02, 0x03], 0).unwrap();
        assert_eq!(delta, 0x0001_0203);
        assert_eq!(consumed, 5);
    }

    #[test]
    fn decode_truncated_stream() {
        assert!(matches!(
            decode_delta(&[0x00], 0),
            Err(CodecError::Truncated { needed: 2, .. })
        ));
        assert!(matches!(
            decode_delta(&[0x80, 0x00, 0x01], 0),
            Err(CodecError::Truncated { needed: 5, .. })
        ));
    }

    #[test]
    fn reader_walks_mixed_stream() {
        let stream = [0x00, 0x0A, 0x80, 0x00, 0x01, 0x02, 0x03, 0x00, 0x01];
        let deltas: Vec<u64> = DeltaReader::new(&stream).map(|d| d.unwrap()).collect();
        assert_eq!(deltas, vec![10, 0x0001_0203, 1]);
    }

    #[test]
    fn reader_fuses_after_error() {
        let stream = [0x00, 0x0A, 0x80];
        let mut reader = DeltaReader::new(&stream);
        assert_eq!(reader.next(), Some(Ok(10)));
        assert!(matches!(reader.next(), Some(Err(CodecError::Truncated { .. }))));
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn scan_counts_signals_and_ticks() {
        // One short and one long signal: 10 + 0x00010203 ticks.
        let stream = [0x00, 0x0A, 0x80, 0x00, 0x01, 0x02, 0x03];
        let stats = scan_stream(&stream).unwrap();
        assert_eq!(stats.signal_count, 2);
        assert_eq!(stats.total_ticks, 10 + 0x0001_0203);
        assert_eq!(tape_seconds(stats.total_ticks, precision(16)), 0);
    }

    #[test]
    fn scan_empty_stream() {
        assert_eq!(scan_stream(&[]).unwrap(), StreamStats::default());
    }

    #[test]
    fn duration_zero_for_zero_ticks() {
        assert_eq!(tape_seconds(0, precision(16)), 0);
    }

    #[test]
    fn duration_one_second_per_million_ticks_per_mhz() {
        // 64 * 15625 * precision ticks make exactly one second.
        assert_eq!(tape_seconds(64 * 15625 * 16, precision(16)), 1);
        assert_eq!(tape_seconds(64 * 15625 * 16 - 1, precision(16)), 0);
        assert_eq!(tape_seconds(3 * 64 * 15625, precision(1)), 3);
    }

    #[test]
    fn duration_non_decreasing_in_ticks() {
        let p = precision(2);
        let mut last = 0;
        for ticks in (0..200_000_000u64).step_by(7_777_777) {
            let secs = tape_seconds(ticks, p);
            assert!(secs >= last);
            last = secs;
        }
    }

    #[test]
    fn round_trip_spread_across_range() {
        let mut delta = 0u64;
        while delta < u64::from(MAX_DELTA) {
            let enc = encode_delta(delta as u32).unwrap();
            let (back, consumed) = decode_delta(enc.as_bytes(), 0).unwrap();
            assert_eq!(back, delta);
            assert_eq!(consumed, enc.len());
            delta = delta * 3 + 1;
        }
    }
}
