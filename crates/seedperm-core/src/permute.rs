//! Ordering enumerator
//!
//! Orderings are ranked lexicographically over a symbol sequence. In `Full`
//! mode the symbols are the input positions, so a seed set with repeated words
//! yields repeated phrases. In `Distinct` mode the symbols are distinct-word
//! ids and every phrase appears exactly once.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// How orderings of repeated words are enumerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enumeration {
    /// All n! orderings of input positions
    #[default]
    Full,
    /// Each distinct phrase once: n! / ∏ mᵢ!
    Distinct,
}

/// The fixed, ordered input word list. Duplicates allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSet {
    words: Vec<String>,
}

impl SeedSet {
    pub fn new<I, S>(words: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();

        if words.is_empty() {
            return Err(SearchError::EmptySeedSet);
        }
        if let Some(pos) = words.iter().position(|w| w.trim().is_empty()) {
            return Err(SearchError::EmptyWord(pos));
        }

        Ok(Self { words })
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Distinct words in first-occurrence order with their multiplicities
    pub fn distinct(&self) -> (Vec<String>, Vec<usize>) {
        let mut alphabet: Vec<String> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();

        for word in &self.words {
            match alphabet.iter().position(|w| w == word) {
                Some(i) => counts[i] += 1,
                None => {
                    alphabet.push(word.clone());
                    counts.push(1);
                }
            }
        }

        (alphabet, counts)
    }

    /// Number of orderings under `mode`, `None` on u128 overflow
    pub fn space(&self, mode: Enumeration) -> Option<u128> {
        match mode {
            Enumeration::Full => count_orderings(&vec![1; self.len()]),
            Enumeration::Distinct => count_orderings(&self.distinct().1),
        }
    }
}

/// One ordering, identified by its rank in the enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub rank: u128,
    pub phrase: String,
}

/// Multinomial coefficient (Σcᵢ)! / ∏ cᵢ!, `None` on overflow
pub fn count_orderings(counts: &[usize]) -> Option<u128> {
    let mut result: u128 = 1;
    let mut total: u128 = 0;

    for &count in counts {
        for j in 1..=count as u128 {
            total += 1;
            result = result.checked_mul(total)? / j;
        }
    }

    Some(result)
}

/// Step `symbols` to the next lexicographic ordering in place.
/// Returns false (leaving the slice untouched) at the last ordering.
pub fn next_permutation(symbols: &mut [usize]) -> bool {
    if symbols.len() < 2 {
        return false;
    }

    let mut i = symbols.len() - 1;
    while i > 0 && symbols[i - 1] >= symbols[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }

    let mut j = symbols.len() - 1;
    while symbols[j] <= symbols[i - 1] {
        j -= 1;
    }

    symbols.swap(i - 1, j);
    symbols[i..].reverse();
    true
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Orderings of a multiset of `remaining` symbols that begin with a symbol of
/// multiplicity `count`, given `block` orderings in total. Exact: the product
/// `block * count / remaining` is an integer, so dividing by the reduced
/// denominator first never truncates.
fn leading_share(block: u128, count: usize, remaining: usize) -> u128 {
    let (c, r) = (count as u128, remaining as u128);
    let g = gcd(c, r);
    block / (r / g) * (c / g)
}

/// The enumerator: ranks, unranks and iterates orderings of a seed set
#[derive(Debug, Clone)]
pub struct Permutations {
    alphabet: Vec<String>,
    counts: Vec<usize>,
    len: usize,
    space: u128,
}

impl Permutations {
    pub fn new(seed: &SeedSet, mode: Enumeration) -> Result<Self, SearchError> {
        let (alphabet, counts) = match mode {
            Enumeration::Full => (seed.words().to_vec(), vec![1; seed.len()]),
            Enumeration::Distinct => seed.distinct(),
        };

        let space = count_orderings(&counts)
            .ok_or(SearchError::SearchSpaceTooLarge { words: seed.len() })?;

        Ok(Self {
            alphabet,
            counts,
            len: seed.len(),
            space,
        })
    }

    /// Total number of orderings
    pub fn space(&self) -> u128 {
        self.space
    }

    /// Symbol sequence at `rank`, or `None` past the end
    pub fn unrank(&self, mut rank: u128) -> Option<Vec<usize>> {
        if rank >= self.space {
            return None;
        }

        let mut counts = self.counts.clone();
        let mut block = self.space;
        let mut symbols = Vec::with_capacity(self.len);

        for remaining in (1..=self.len).rev() {
            for (symbol, count) in counts.iter_mut().enumerate() {
                if *count == 0 {
                    continue;
                }
                let share = leading_share(block, *count, remaining);
                if rank < share {
                    symbols.push(symbol);
                    *count -= 1;
                    block = share;
                    break;
                }
                rank -= share;
            }
        }

        Some(symbols)
    }

    /// Space-joined phrase for a symbol sequence
    pub fn phrase(&self, symbols: &[usize]) -> String {
        let mut phrase = String::with_capacity(symbols.len() * 9);
        for (i, &s) in symbols.iter().enumerate() {
            if i > 0 {
                phrase.push(' ');
            }
            phrase.push_str(&self.alphabet[s]);
        }
        phrase
    }

    /// Candidate at `rank`
    pub fn nth(&self, rank: u128) -> Option<Candidate> {
        self.unrank(rank).map(|symbols| Candidate {
            rank,
            phrase: self.phrase(&symbols),
        })
    }

    /// Candidates with rank in `[start, end)`; `end` is clamped to the space
    pub fn range(&self, start: u128, end: u128) -> Orderings<'_> {
        let end = end.min(self.space);
        let symbols = if start < end {
            self.unrank(start).unwrap_or_default()
        } else {
            Vec::new()
        };

        Orderings {
            perms: self,
            symbols,
            rank: start,
            end,
        }
    }

    /// Every candidate in rank order
    pub fn iter(&self) -> Orderings<'_> {
        self.range(0, self.space)
    }
}

/// Lazy walk over a rank range. Unranks once, then steps in place.
#[derive(Debug)]
pub struct Orderings<'a> {
    perms: &'a Permutations,
    symbols: Vec<usize>,
    rank: u128,
    end: u128,
}

impl Iterator for Orderings<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        if self.rank >= self.end {
            return None;
        }

        let candidate = Candidate {
            rank: self.rank,
            phrase: self.perms.phrase(&self.symbols),
        };

        self.rank += 1;
        if self.rank < self.end {
            next_permutation(&mut self.symbols);
        }

        Some(candidate)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.end.saturating_sub(self.rank);
        match usize::try_from(left) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}
