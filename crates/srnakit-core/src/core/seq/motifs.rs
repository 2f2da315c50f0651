//! Motif statistics over small-RNA sequences.
//!
//! ARN denotes the A-purine-nucleotide triplet `A[AG][ACGT]`; runs are
//! maximal non-overlapping repeats of a motif. All functions uppercase
//! their input first, and matching is DNA-alphabet based (`T` rather than
//! `U`) except where noted.

use regex::Regex;
use std::sync::LazyLock;

static ARN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"A[AG][ACGT]").unwrap());
static AAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"AA[ACGT]").unwrap());
static ARN_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:A[AG][ACGT])+").unwrap());
static U_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"U+").unwrap());
static T_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"T+").unwrap());
static A_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"A+").unwrap());

/// Number of non-overlapping ARN triplets.
pub fn count_arn_motifs(seq: &str) -> usize {
    ARN.find_iter(&seq.to_uppercase()).count()
}

/// Number of non-overlapping AAN triplets.
pub fn count_aan_motifs(seq: &str) -> usize {
    AAN.find_iter(&seq.to_uppercase()).count()
}

/// Length, in triplets, of the longest consecutive ARN run.
pub fn longest_arn_run(seq: &str) -> usize {
    ARN_RUN
        .find_iter(&seq.to_uppercase())
        .map(|m| m.len() / 3)
        .max()
        .unwrap_or(0)
}

/// Length of the longest consecutive uracil run.
///
/// Sequences written in the DNA alphabet are handled by counting `T` runs
/// instead whenever the sequence contains a `T`.
pub fn longest_u_run(seq: &str) -> usize {
    let upper = seq.to_uppercase();
    let pattern = if upper.contains('T') { &T_RUN } else { &U_RUN };
    pattern.find_iter(&upper).map(|m| m.len()).max().unwrap_or(0)
}

/// Length of the longest consecutive adenine run.
pub fn longest_a_run(seq: &str) -> usize {
    A_RUN
        .find_iter(&seq.to_uppercase())
        .map(|m| m.len())
        .max()
        .unwrap_or(0)
}

/// Longest adenine run divided by sequence length; 0.0 for an empty string.
pub fn longest_a_run_normalized(seq: &str) -> f64 {
    if seq.is_empty() {
        return 0.0;
    }
    longest_a_run(seq) as f64 / seq.len() as f64
}

/// Fraction of positions that are adenine; 0.0 for an empty string.
pub fn a_richness(seq: &str) -> f64 {
    if seq.is_empty() {
        return 0.0;
    }
    let upper = seq.to_uppercase();
    upper.chars().filter(|&c| c == 'A').count() as f64 / upper.chars().count() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_arn_run_reference_values() {
        assert_eq!(longest_arn_run("AAGAAGAT"), 2);
        assert_eq!(longest_arn_run("ccAGgAtNAGGxx"), 1);
        assert_eq!(longest_arn_run("AGGAGGA"), 2);
        assert_eq!(longest_arn_run("AAAA"), 1);
        assert_eq!(longest_arn_run("AATAGCAGGGAGG"), 3);
        assert_eq!(longest_arn_run(""), 0);
    }

    #[test]
    fn triplet_counts_are_non_overlapping() {
        assert_eq!(count_arn_motifs("AAGAAGAT"), 2);
        assert_eq!(count_arn_motifs("AGGAGGA"), 2);
        assert_eq!(count_aan_motifs("AAAA"), 1);
        assert_eq!(count_aan_motifs("AATAAC"), 2);
        assert_eq!(count_aan_motifs("GGGG"), 0);
    }

    #[test]
    fn counting_uppercases_first() {
        assert_eq!(count_arn_motifs("aagaagat"), 2);
        assert_eq!(longest_arn_run("aag"), 1);
    }

    #[test]
    fn u_runs_switch_alphabet_on_t() {
        assert_eq!(longest_u_run("GAUUUUA"), 4);
        // A 'T' anywhere switches the run base to thymine.
        assert_eq!(longest_u_run("GATTTUA"), 3);
        assert_eq!(longest_u_run("GGCC"), 0);
    }

    #[test]
    fn a_run_statistics() {
        assert_eq!(longest_a_run("GGAAAUG"), 3);
        assert_eq!(longest_a_run_normalized("AAAAUUUU"), 0.5);
        assert_eq!(longest_a_run_normalized(""), 0.0);
        assert_eq!(a_richness("AAGG"), 0.5);
        assert_eq!(a_richness(""), 0.0);
    }
}
