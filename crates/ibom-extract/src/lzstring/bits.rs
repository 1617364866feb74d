use super::DecompressError;

/// Symbol alphabet used to turn compressed text into integer symbol values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    /// `A-Za-z0-9+/=`, as emitted by `compressToBase64`.
    Base64,
    /// `A-Za-z0-9+-$`, as emitted by `compressToEncodedURIComponent`.
    UriSafe,
}

impl Alphabet {
    /// Value of a symbol. Characters outside the alphabet read as 0.
    pub fn value(self, c: char) -> u32 {
        match c {
            'A'..='Z' => c as u32 - 'A' as u32,
            'a'..='z' => c as u32 - 'a' as u32 + 26,
            '0'..='9' => c as u32 - '0' as u32 + 52,
            '+' => 62,
            '/' if self == Alphabet::Base64 => 63,
            '=' if self == Alphabet::Base64 => 64,
            '-' if self == Alphabet::UriSafe => 63,
            '$' if self == Alphabet::UriSafe => 64,
            // URI transports turn '+' into a space on the way through a query string.
            ' ' if self == Alphabet::UriSafe => 62,
            _ => 0,
        }
    }
}

/// On-demand bit stream over a sequence of fixed-width symbols.
///
/// Bits are handed out most-significant first within a symbol, and the next
/// symbol is only pulled when the current one is used up, so asking for a bit
/// past the last symbol is reported as truncation rather than read as zero.
pub struct BitReader<I> {
    symbols: I,
    top: u32,
    current: u32,
    mask: u32,
    consumed: usize,
}

impl<I: Iterator<Item = u32>> BitReader<I> {
    /// `bits_per_symbol` is 6 for the base64 alphabets and 15 for UTF-16.
    pub fn new(symbols: I, bits_per_symbol: u32) -> Self {
        Self {
            symbols,
            top: 1 << (bits_per_symbol - 1),
            current: 0,
            mask: 0,
            consumed: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, DecompressError> {
        if self.mask == 0 {
            self.current = self.symbols.next().ok_or(DecompressError::Truncated {
                offset: self.consumed,
            })?;
            self.mask = self.top;
            self.consumed += 1;
        }
        let bit = self.current & self.mask != 0;
        self.mask >>= 1;
        Ok(bit)
    }

    /// Read `count` bits into an integer, least-significant bit first.
    pub fn read_bits(&mut self, count: u32) -> Result<u32, DecompressError> {
        let mut value = 0;
        for shift in 0..count {
            if self.read_bit()? {
                value |= 1 << shift;
            }
        }
        Ok(value)
    }

    /// Number of symbols pulled from the input so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}
