//! C3: purity scorer — quality-weighted alignment of a read against all
//! rotations of a candidate motif, on both strands.

use crate::sequence::reverse_complement;

/// Default minimum base quality (Phred, not counting the +33 offset)
/// below which a mismatch gets partial credit instead of a penalty.
pub const DEFAULT_MIN_BASEQ: u8 = 20;

const BASEQ_OFFSET: u8 = 33;
const MATCH_SCORE: f64 = 1.0;
const LOWQUAL_MISMATCH_SCORE: f64 = 0.5;
const MISMATCH_PENALTY: f64 = -1.0;

/// All `|motif|` rotations of `motif`, one per starting offset.
pub fn rotations(motif: &[u8]) -> Vec<Vec<u8>> {
    let len = motif.len();
    if len == 0 {
        return Vec::new();
    }
    let doubled: Vec<u8> = motif.iter().chain(motif.iter()).copied().collect();
    (0..len)
        .map(|offset| doubled[offset..offset + len].to_vec())
        .collect()
}

/// Scores a window (of length `|rotations[0]|`, possibly shorter for a
/// trailing partial window) against every rotation, returning the best.
fn match_units(rotations: &[Vec<u8>], bases: &[u8], quals: &[u8], min_baseq: u8) -> f64 {
    let mut best = f64::MIN;
    for unit in rotations {
        let mut score = 0.0;
        for i in 0..bases.len() {
            let base = bases[i];
            let unit_base = unit[i];
            if base == unit_base {
                score += MATCH_SCORE;
            } else if quals[i].saturating_sub(BASEQ_OFFSET) < min_baseq {
                score += LOWQUAL_MISMATCH_SCORE;
            } else {
                score += MISMATCH_PENALTY;
            }
        }
        if score > best {
            best = score;
        }
    }
    best
}

/// Tiles `bases` by windows of `|rotations[0]|`, summing window scores.
/// The final, possibly partial, window is scored against the same
/// rotations truncated to its length.
pub fn match_repeat(rotations: &[Vec<u8>], bases: &[u8], quals: &[u8], min_baseq: u8) -> f64 {
    if rotations.is_empty() {
        return 0.0;
    }
    let unit_len = rotations[0].len();
    let mut score = 0.0;
    let mut pos = 0;
    while pos + unit_len <= bases.len() {
        score += match_units(
            rotations,
            &bases[pos..pos + unit_len],
            &quals[pos..pos + unit_len],
            min_baseq,
        );
        pos += unit_len;
    }
    if pos != bases.len() {
        let truncated: Vec<Vec<u8>> = rotations
            .iter()
            .map(|r| r[..bases.len() - pos].to_vec())
            .collect();
        score += match_units(&truncated, &bases[pos..], &quals[pos..], min_baseq);
    }
    score
}

/// Max of the forward-strand score and the score of the reverse
/// complement (bases reverse-complemented, qualities reversed).
pub fn match_repeat_rc(rotations: &[Vec<u8>], bases: &[u8], quals: &[u8], min_baseq: u8) -> f64 {
    let forward = match_repeat(rotations, bases, quals, min_baseq);

    let bases_rc = reverse_complement(bases);
    let mut quals_rc = quals.to_vec();
    quals_rc.reverse();
    let reverse = match_repeat(rotations, &bases_rc, &quals_rc, min_baseq);

    forward.max(reverse)
}

/// Per-base purity used for IRR classification: `match_repeat_rc(...) /
/// |bases|`.
pub fn purity(motif: &[u8], bases: &[u8], quals: &[u8], min_baseq: u8) -> f64 {
    if bases.is_empty() {
        return 0.0;
    }
    let rots = rotations(motif);
    match_repeat_rc(&rots, bases, quals, min_baseq) / bases.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn q(baseq: u8, len: usize) -> Vec<u8> {
        vec![baseq + BASEQ_OFFSET; len]
    }

    #[test]
    fn perfect_repeat_scores_one() {
        let bases = b"CGGCGGCGG";
        let quals = q(40, bases.len());
        let p = purity(b"CGG", bases, &quals, DEFAULT_MIN_BASEQ);
        assert_approx_eq!(p, 1.0, 1e-9);
    }

    #[test]
    fn rotations_cover_all_offsets() {
        let rots = rotations(b"ACG");
        assert_eq!(rots, vec![b"ACG".to_vec(), b"CGA".to_vec(), b"GAC".to_vec()]);
    }

    #[test]
    fn low_quality_mismatch_gets_partial_credit() {
        let bases = b"CGT"; // mismatch at offset 2 vs motif CGG
        let quals_low = q(5, 3);
        let quals_high = q(40, 3);
        let low_score = match_repeat(&rotations(b"CGG"), bases, &quals_low, 20);
        let high_score = match_repeat(&rotations(b"CGG"), bases, &quals_high, 20);
        assert!(low_score > high_score);
    }

    #[test]
    fn all_n_read_is_never_a_perfect_match() {
        let bases = b"NNNNNN";
        let quals = q(40, bases.len());
        let p = purity(b"AC", bases, &quals, DEFAULT_MIN_BASEQ);
        assert!(p < 0.90);
    }
}
