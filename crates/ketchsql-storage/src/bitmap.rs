
use serde::{Deserialize, Serialize};

const WORD_BITS: usize = 64;

/// Per-row null map packed into 64-bit words. A set bit marks the row as
/// NULL. Rows past `len` read as null and ignore writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NullBitmap {
    words: Vec<u64>,
    len: usize,
}

impl NullBitmap {
    pub fn new() -> Self {
        Self::filled(0, false)
    }

    pub fn new_valid(len: usize) -> Self {
        Self::filled(len, false)
    }

    pub fn new_null(len: usize) -> Self {
        Self::filled(len, true)
    }

    fn filled(len: usize, null: bool) -> Self {
        let fill = if null { u64::MAX } else { 0 };
        Self {
            words: vec![fill; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    #[inline]
    fn slot(index: usize) -> (usize, u64) {
        (index / WORD_BITS, 1u64 << (index % WORD_BITS))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_null(&self, index: usize) -> bool {
        if index >= self.len {
            return true;
        }
        let (word, mask) = Self::slot(index);
        self.words[word] & mask != 0
    }

    #[inline]
    pub fn is_valid(&self, index: usize) -> bool {
        !self.is_null(index)
    }

    #[inline]
    pub fn set(&mut self, index: usize, is_null: bool) {
        if index >= self.len {
            return;
        }
        let (word, mask) = Self::slot(index);
        if is_null {
            self.words[word] |= mask;
        } else {
            self.words[word] &= !mask;
        }
    }

    pub fn push(&mut self, is_null: bool) {
        self.len += 1;
        self.words.resize(self.len.div_ceil(WORD_BITS), 0);
        if is_null {
            self.set(self.len - 1, true);
        }
    }

    /// Bitwise-OR `other` into `self`. Both maps must cover the same rows.
    pub fn or_with(&mut self, other: &NullBitmap) {
        debug_assert_eq!(self.len, other.len);
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            *word |= other_word;
        }
    }

    /// Copy truncated or padded to `len`; padded rows are valid.
    pub fn resized(&self, len: usize) -> NullBitmap {
        let mut out = Self::filled(len, false);
        let shared = out.words.len().min(self.words.len());
        out.words[..shared].copy_from_slice(&self.words[..shared]);
        // A shared tail word may carry bits past the source length.
        for row in self.len.min(len)..(shared * WORD_BITS).min(len) {
            out.set(row, false);
        }
        out
    }

    pub fn take(&self, indexes: &[u32]) -> NullBitmap {
        let mut out = NullBitmap::new_valid(indexes.len());
        for (i, &index) in indexes.iter().enumerate() {
            if self.is_null(index as usize) {
                out.set(i, true);
            }
        }
        out
    }

    pub fn count_null(&self) -> usize {
        self.words
            .iter()
            .enumerate()
            .map(|(i, &word)| {
                let live = self.len.saturating_sub(i * WORD_BITS).min(WORD_BITS);
                let mask = if live == WORD_BITS {
                    u64::MAX
                } else {
                    (1u64 << live) - 1
                };
                (word & mask).count_ones() as usize
            })
            .sum()
    }

    pub fn count_valid(&self) -> usize {
        self.len - self.count_null()
    }
}

impl Default for NullBitmap {
    fn default() -> Self {
        Self::new()
    }
}
