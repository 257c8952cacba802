/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! FIX checksum calculation.
//!
//! The checksum is the sum of every byte preceding the `10=` field, modulo
//! 256, written as three zero-padded digits.

/// Calculates the FIX checksum for the given data.
///
/// # Example
/// ```
/// use ferrofix_tagvalue::calculate_checksum;
///
/// let data = b"8=FIX.4.2\x019=12\x0135=X\x01108=30\x01";
/// assert_eq!(calculate_checksum(data), 49);
/// ```
#[inline]
#[must_use]
pub fn calculate_checksum(data: &[u8]) -> u8 {
    let mut sum = Checksum::new();
    sum.update(data);
    sum.value()
}

/// Running checksum over bytes written in several pieces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum(u32);

impl Checksum {
    /// Starts an empty checksum.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Folds more bytes into the checksum.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        let chunk: u32 = data.iter().map(|&b| u32::from(b)).sum();
        self.0 = (self.0 + chunk % 256) % 256;
    }

    /// Returns the checksum of everything folded in so far.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u8 {
        (self.0 % 256) as u8
    }
}

/// Formats a checksum value as three zero-padded ASCII digits.
#[inline]
#[must_use]
pub fn format_checksum(checksum: u8) -> [u8; 3] {
    [
        b'0' + checksum / 100,
        b'0' + (checksum / 10) % 10,
        b'0' + checksum % 10,
    ]
}

/// Parses three ASCII digits into a checksum value.
///
/// Returns `None` for anything other than exactly three digits in `000..=255`.
#[inline]
#[must_use]
pub fn parse_checksum(bytes: &[u8]) -> Option<u8> {
    let [a, b, c] = bytes else {
        return None;
    };
    if !(a.is_ascii_digit() && b.is_ascii_digit() && c.is_ascii_digit()) {
        return None;
    }
    let value = u32::from(a - b'0') * 100 + u32::from(b - b'0') * 10 + u32::from(c - b'0');
    u8::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_checksum_empty() {
        assert_eq!(calculate_checksum(b""), 0);
    }

    #[test]
    fn test_calculate_checksum_overflow() {
        let data = vec![255u8; 1000];
        let expected = ((255u32 * 1000) % 256) as u8;
        assert_eq!(calculate_checksum(&data), expected);
    }

    #[test]
    fn test_running_checksum_matches_one_shot() {
        let data = b"8=FIX.4.4\x019=5\x0135=0\x01";
        let mut running = Checksum::new();
        for chunk in data.chunks(3) {
            running.update(chunk);
        }
        assert_eq!(running.value(), calculate_checksum(data));
    }

    #[test]
    fn test_format_checksum() {
        assert_eq!(format_checksum(0), *b"000");
        assert_eq!(format_checksum(49), *b"049");
        assert_eq!(format_checksum(255), *b"255");
    }

    #[test]
    fn test_parse_checksum_invalid() {
        assert_eq!(parse_checksum(b""), None);
        assert_eq!(parse_checksum(b"00"), None);
        assert_eq!(parse_checksum(b"0000"), None);
        assert_eq!(parse_checksum(b"12X"), None);
        assert_eq!(parse_checksum(b"256"), None);
    }

    #[test]
    fn test_every_value_parses_back() {
        for i in 0..=255u8 {
            assert_eq!(parse_checksum(&format_checksum(i)), Some(i));
        }
    }
}
