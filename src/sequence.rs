//! C1: sequence utilities shared by period finding, purity scoring and
//! motif canonicalization.

/// Reverse-complements a base string. Anything other than A/C/G/T
/// (including N) maps to N. Length is preserved.
pub fn reverse_complement(bases: &[u8]) -> Vec<u8> {
    bases
        .iter()
        .rev()
        .map(|&b| match b {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            b'T' => b'A',
            _ => b'N',
        })
        .collect()
}

/// Lexicographically smallest rotation of `motif`, scanning every
/// length-|motif| substring of `motif+motif`. Deterministic: ties cannot
/// occur since rotations of the same string at different offsets that
/// tie must be identical strings.
pub fn minimal_rotation(motif: &[u8]) -> Vec<u8> {
    if motif.is_empty() {
        return Vec::new();
    }
    let len = motif.len();
    let doubled: Vec<u8> = motif.iter().chain(motif.iter()).copied().collect();
    (0..len)
        .map(|offset| doubled[offset..offset + len].to_vec())
        .min()
        .unwrap()
}

/// Canonical form of a motif: the lexicographically smaller of the
/// minimal rotation of the motif and the minimal rotation of its reverse
/// complement. Two motifs are equivalent iff their canonical forms match.
pub fn canonical(motif: &[u8]) -> Vec<u8> {
    let forward = minimal_rotation(motif);
    let rc = reverse_complement(motif);
    let reverse = minimal_rotation(&rc);
    std::cmp::min(forward, reverse)
}

pub fn canonical_str(motif: &str) -> String {
    String::from_utf8(canonical(motif.as_bytes())).expect("canonical motif is ASCII")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_complement_maps_and_reverses() {
        assert_eq!(reverse_complement(b"ACGT"), b"ACGT");
        assert_eq!(reverse_complement(b"AAGG"), b"CCTT");
        assert_eq!(reverse_complement(b"ACGN"), b"NCGT");
    }

    #[test]
    fn reverse_complement_preserves_length() {
        assert_eq!(reverse_complement(b"AAATGAAATG").len(), 10);
    }

    #[test]
    fn minimal_rotation_example() {
        assert_eq!(minimal_rotation(b"GGC"), b"CGG".to_vec());
    }

    #[test]
    fn canonicalization_example() {
        assert_eq!(canonical_str("CGG"), canonical_str("GCC"));
        assert_eq!(canonical_str("CGG"), "CCG");
    }

    #[test]
    fn canonical_is_idempotent() {
        for m in ["AAATG", "CGGCGG", "T", "ACGTACGT"] {
            let once = canonical(m.as_bytes());
            let twice = canonical(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn canonical_reverse_complement_invariant() {
        for m in ["AAATG", "CGG", "AC", "GATTACA"] {
            let c1 = canonical(m.as_bytes());
            let rc = reverse_complement(m.as_bytes());
            let c2 = canonical(&rc);
            assert_eq!(c1, c2);
        }
    }
}
