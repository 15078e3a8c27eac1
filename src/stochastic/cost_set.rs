//! Dense sets of aggregate costs.
//!
//! A [`CostSet`] holds integers in `[0, cap]`, one bit each, packed into
//! `u64` words. Besides membership it supports the two moves of the
//! reachable-cost dynamic program: dilating a set by a run of consecutive
//! costs, and taking its preimage under such a run. Both work a word at a
//! time by repeated doubling, in `O(cap / 64 * log w)` for a run of width `w`.

/// A set of costs in `[0, cap]`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CostSet {
    words: Vec<u64>,
    cap: usize,
}

impl CostSet {
    /// Number of bits per word.
    const BITS_PER_WORD: usize = 64;

    /// Creates an empty set able to hold costs up to `cap`.
    pub fn new(cap: usize) -> Self {
        Self {
            words: vec![0; cap / Self::BITS_PER_WORD + 1],
            cap,
        }
    }

    /// The set `{0}`.
    pub fn zero(cap: usize) -> Self {
        let mut set = Self::new(cap);
        set.insert(0);
        set
    }

    /// The interval `[lo, hi]`, clipped to `cap`.
    pub fn range(cap: usize, lo: usize, hi: usize) -> Self {
        let mut set = Self::new(cap);
        for cost in lo..=hi.min(cap) {
            set.insert(cost);
        }
        set
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    #[inline]
    fn word_and_bit(index: usize) -> (usize, usize) {
        (index / Self::BITS_PER_WORD, index % Self::BITS_PER_WORD)
    }

    #[inline]
    pub fn contains(&self, cost: usize) -> bool {
        if cost > self.cap {
            return false;
        }
        let (word, bit) = Self::word_and_bit(cost);
        self.words[word] & (1u64 << bit) != 0
    }

    /// Adds `cost`. Returns false if it was already present or exceeds `cap`.
    #[inline]
    pub fn insert(&mut self, cost: usize) -> bool {
        if cost > self.cap {
            return false;
        }
        let (word, bit) = Self::word_and_bit(cost);
        let mask = 1u64 << bit;
        let was_clear = self.words[word] & mask == 0;
        self.words[word] |= mask;
        was_clear
    }

    /// Adds every member of `other`.
    pub fn union_with(&mut self, other: &CostSet) {
        debug_assert_eq!(self.cap, other.cap);
        for (dst, &src) in self.words.iter_mut().zip(&other.words) {
            *dst |= src;
        }
    }

    /// `{c + shift | c in self}`, dropping sums above `cap`.
    fn shifted_up(&self, shift: usize) -> CostSet {
        let mut result = CostSet::new(self.cap);
        let (offset, bit) = Self::word_and_bit(shift);
        for (i, &word) in self.words.iter().enumerate() {
            let dst = i + offset;
            if dst >= result.words.len() {
                break;
            }
            if word == 0 {
                continue;
            }
            result.words[dst] |= word << bit;
            if bit > 0 && dst + 1 < result.words.len() {
                result.words[dst + 1] |= word >> (Self::BITS_PER_WORD - bit);
            }
        }
        result.trim();
        result
    }

    /// `{c - shift | c in self, c >= shift}`.
    fn shifted_down(&self, shift: usize) -> CostSet {
        let mut result = CostSet::new(self.cap);
        let (offset, bit) = Self::word_and_bit(shift);
        for (i, dst) in result.words.iter_mut().enumerate() {
            let Some(&low) = self.words.get(i + offset) else {
                break;
            };
            let high = self.words.get(i + offset + 1).copied().unwrap_or(0);
            *dst = if bit == 0 {
                low
            } else {
                (low >> bit) | (high << (Self::BITS_PER_WORD - bit))
            };
        }
        result
    }

    /// `{a + c | a in self, lo <= c <= hi}`, capped.
    pub fn dilated(&self, lo: usize, hi: usize) -> CostSet {
        debug_assert!(lo <= hi);
        let width = hi - lo + 1;
        // Invariant: result = self + [0, span - 1].
        let mut result = self.clone();
        let mut span = 1;
        while span < width {
            let step = span.min(width - span);
            let moved = result.shifted_up(step);
            result.union_with(&moved);
            span += step;
        }
        result.shifted_up(lo)
    }

    /// `{t >= 0 | t + c in self for some lo <= c <= hi}`.
    pub fn preimage(&self, lo: usize, hi: usize) -> CostSet {
        debug_assert!(lo <= hi);
        let width = hi - lo + 1;
        let mut result = self.clone();
        let mut span = 1;
        while span < width {
            let step = span.min(width - span);
            let moved = result.shifted_down(step);
            result.union_with(&moved);
            span += step;
        }
        result.shifted_down(lo)
    }

    /// Returns an iterator over the members in ascending order.
    pub fn iter(&self) -> CostSetIter<'_> {
        CostSetIter {
            set: self,
            word_idx: 0,
            current_word: self.words[0],
        }
    }

    /// Clears the bits above `cap` in the last word.
    fn trim(&mut self) {
        let used = self.cap % Self::BITS_PER_WORD + 1;
        if used < Self::BITS_PER_WORD {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }
}

/// Iterator over the members of a [`CostSet`].
pub struct CostSetIter<'a> {
    set: &'a CostSet,
    word_idx: usize,
    current_word: u64,
}

impl Iterator for CostSetIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let bit = self.current_word.trailing_zeros() as usize;
                self.current_word &= self.current_word - 1;
                return Some(self.word_idx * CostSet::BITS_PER_WORD + bit);
            }

            self.word_idx += 1;
            if self.word_idx >= self.set.words.len() {
                return None;
            }
            self.current_word = self.set.words[self.word_idx];
        }
    }
}
