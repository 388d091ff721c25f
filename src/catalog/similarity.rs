//! Ratcliff/Obershelp sequence similarity.
//!
//! `ratio(a, b) = 2 * M / (|a| + |b|)` where `M` is the total size of the
//! matching blocks found by repeatedly taking the longest common contiguous
//! run and recursing on both sides of it. Sequences are compared as Unicode
//! scalar values.
//!
//! When `b` has 200 or more elements, elements occurring in more than
//! `len(b) / 100 + 1` positions are "popular": they cannot seed a match, only
//! extend one. This keeps long lyrics from matching on spaces and vowels.

use std::collections::HashMap;

const AUTOJUNK_MIN_LEN: usize = 200;

/// Similarity in `[0, 1]`; two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = SequenceMatcher::new(&a, &b).matched_len();
    2.0 * matched as f64 / total as f64
}

struct SequenceMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions in `b` of every non-popular element.
    b2j: HashMap<char, Vec<usize>>,
}

/// A common run: `a[i..i+size] == b[j..j+size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Match {
    i: usize,
    j: usize,
    size: usize,
}

impl<'a> SequenceMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let threshold = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= threshold);
        }

        SequenceMatcher { a, b, b2j }
    }

    /// Longest run inside `a[alo..ahi]` × `b[blo..bhi]`, earliest in `a`
    /// then in `b` on ties, extended over popular elements at both ends.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Match {
        let mut best = Match { i: alo, j: blo, size: 0 };
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best.size {
                        best = Match {
                            i: i + 1 - k,
                            j: j + 1 - k,
                            size: k,
                        };
                    }
                }
            }
            j2len = next;
        }

        while best.i > alo && best.j > blo && self.a[best.i - 1] == self.b[best.j - 1] {
            best.i -= 1;
            best.j -= 1;
            best.size += 1;
        }
        while best.i + best.size < ahi
            && best.j + best.size < bhi
            && self.a[best.i + best.size] == self.b[best.j + best.size]
        {
            best.size += 1;
        }

        best
    }

    /// Sum of all matching block sizes.
    fn matched_len(&self) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            total += m.size;
            if alo < m.i && blo < m.j {
                queue.push((alo, m.i, blo, m.j));
            }
            if m.i + m.size < ahi && m.j + m.size < bhi {
                queue.push((m.i + m.size, ahi, m.j + m.size, bhi));
            }
        }

        total
    }
}
