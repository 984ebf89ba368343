//! C2: period finder — recovers the smallest motif length whose tandem
//! repetition explains a read, and the consensus motif for that period.

use crate::errors::{Result, StrProfileError};
use crate::sequence::canonical;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Default motif-size range considered during IRR detection.
pub const DEFAULT_MOTIF_SIZE_RANGE: RangeInclusive<usize> = 1..=20;

/// Minimum match frequency used for IRR detection proper (not the
/// internal period-reduction pass, which always demands a perfect match).
pub const IRR_MIN_FREQUENCY: f64 = 0.8;

/// Number of positions `i` with `s[i] == s[i+k]`, for `i` in `[0, |s|-k)`.
/// Fails for `k < 1` or `k > |s|/2`.
pub fn matches_at_offset(k: usize, s: &[u8]) -> Result<usize> {
    if k < 1 || k > s.len() / 2 {
        return Err(StrProfileError::Format(format!(
            "invalid motif-period offset {} for a read of length {}",
            k,
            s.len()
        )));
    }
    let mut matches = 0;
    for i in 0..(s.len() - k) {
        if s[i] == s[i + k] {
            matches += 1;
        }
    }
    Ok(matches)
}

/// `matchesAtOffset(k, s) / (|s| - k)`. Fails under the same conditions as
/// `matches_at_offset`.
pub fn freq(k: usize, s: &[u8]) -> Result<f64> {
    let matches = matches_at_offset(k, s)?;
    Ok(matches as f64 / (s.len() - k) as f64)
}

/// Scans offsets from `hi'` down to `lo'`, recording the smallest offset
/// whose frequency is `>=` the best frequency seen so far (so ties favor
/// the smaller offset, since the scan decreases `k`). Returns `None` if no
/// offset reaches `f_min`.
pub fn smallest_frequent_period(
    f_min: f64,
    s: &[u8],
    range: RangeInclusive<usize>,
) -> Option<usize> {
    let lo = (*range.start()).max(1);
    let hi = (*range.end()).min(s.len() / 2);
    if hi < lo {
        return None;
    }

    let mut best_freq = f_min;
    let mut best_offset: Option<usize> = None;
    let mut k = hi;
    loop {
        if let Ok(f) = freq(k, s) {
            if f >= best_freq {
                best_freq = f;
                best_offset = Some(k);
            }
        }
        if k == lo {
            break;
        }
        k -= 1;
    }
    best_offset
}

/// For each phase `r` in `[0, k)`, the consensus base is the most frequent
/// symbol among `s[r], s[r+k], s[r+2k], ...`; ties are broken by the base
/// whose last occurrence in the phase comes latest.
pub fn consensus_motif(k: usize, s: &[u8]) -> Vec<u8> {
    let mut motif = Vec::with_capacity(k);
    for r in 0..k {
        let mut counts: HashMap<u8, usize> = HashMap::new();
        let mut last_seen: HashMap<u8, usize> = HashMap::new();
        let mut idx = r;
        let mut order = 0usize;
        while idx < s.len() {
            let base = s[idx];
            *counts.entry(base).or_insert(0) += 1;
            last_seen.insert(base, order);
            order += 1;
            idx += k;
        }
        let mut best_base = s[r];
        let mut best_count = 0usize;
        let mut best_last = 0usize;
        for (&base, &count) in &counts {
            let last = last_seen[&base];
            if count > best_count || (count == best_count && last > best_last) {
                best_count = count;
                best_last = last;
                best_base = base;
            }
        }
        motif.push(best_base);
    }
    motif
}

/// Finds the canonical motif explaining `s`, reducing further when the
/// first-pass consensus motif is itself periodic (e.g. "AAATGAAATG" ->
/// "AAATG"). Returns `None` if no offset in `range` reaches `f_min`.
pub fn canonical_motif_from_read(
    f_min: f64,
    s: &[u8],
    range: RangeInclusive<usize>,
) -> Option<Vec<u8>> {
    let k = smallest_frequent_period(f_min, s, range)?;
    let mut motif = consensus_motif(k, s);

    if let Some(reduced_k) = smallest_frequent_period(1.0, &motif, 1..=(motif.len())) {
        if reduced_k != k {
            motif = consensus_motif(reduced_k, &motif);
        }
    }

    Some(canonical(&motif))
}
