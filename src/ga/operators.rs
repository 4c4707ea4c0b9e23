//! Giant-tour crossover.
//!
//! HGS recombines parents on their giant tours only; the offspring tour is
//! then cut into routes by a [`Split`](super::Split).
//!
//! # References
//!
//! - Davis (1985), "Applying Adaptive Algorithms to Epistatic Domains"
//! - Prins (2004), "A simple and effective evolutionary algorithm for the
//!   vehicle routing problem"

use rand::Rng;

/// Order Crossover (OX) with a circular segment, producing one child.
///
/// # Algorithm
///
/// 1. Draw two distinct positions `start` and `end`
/// 2. Copy `parent1[start..=end]` to the child, wrapping around the end of
///    the tour when `end < start`
/// 3. Fill the remaining positions from `end + 1` onward with the elements
///    of `parent2` read from `end + 1` onward, wrapping around and skipping
///    elements already copied
///
/// # Complexity
/// O(n) time, O(n) space
///
/// # Panics
/// Panics if parents have different lengths or are empty.
///
/// # Examples
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use u_hgs::ga::ox_crossover;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let child = ox_crossover(&[1, 2, 3, 4, 5], &[5, 4, 3, 2, 1], &mut rng);
/// let mut sorted = child.clone();
/// sorted.sort();
/// assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
/// ```
pub fn ox_crossover<R: Rng>(parent1: &[usize], parent2: &[usize], rng: &mut R) -> Vec<usize> {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    assert!(n > 0, "parents must not be empty");

    if n == 1 {
        return parent1.to_vec();
    }

    let start = rng.random_range(0..n);
    let mut end = rng.random_range(0..n);
    while end == start {
        end = rng.random_range(0..n);
    }
    ox_build_child(parent1, parent2, start, end)
}

/// Build the OX child: copy the circular segment from `template`, fill from `donor`.
fn ox_build_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let bound = template.iter().copied().max().map_or(0, |m| m + 1);
    let mut child = vec![usize::MAX; n];
    let mut copied = vec![false; bound];

    let mut j = start;
    loop {
        child[j] = template[j];
        copied[template[j]] = true;
        if j == end {
            break;
        }
        j = (j + 1) % n;
    }

    let mut pos = (end + 1) % n;
    for offset in 0..n {
        let value = donor[(end + 1 + offset) % n];
        if !copied.get(value).copied().unwrap_or(false) {
            child[pos] = value;
            pos = (pos + 1) % n;
        }
    }
    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn is_permutation_of(child: &[usize], parent: &[usize]) -> bool {
        let mut a = child.to_vec();
        let mut b = parent.to_vec();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }

    #[test]
    fn test_plain_segment() {
        // keep 2, 3, 4; donor read from position 4 gives 1 then 5
        let child = ox_build_child(&[1, 2, 3, 4, 5], &[5, 4, 3, 2, 1], 1, 3);
        assert_eq!(child, vec![5, 2, 3, 4, 1]);

        let child = ox_build_child(&[1, 2, 3, 4, 5, 6], &[6, 1, 5, 2, 4, 3], 2, 3);
        // kept: 3, 4 at positions 2..=3; donor from position 4: 4, 3, 6, 1, 5, 2
        assert_eq!(child, vec![5, 2, 3, 4, 6, 1]);
    }

    #[test]
    fn test_wrapping_segment() {
        // segment wraps: positions 4, 0, 1 keep 5, 1, 2
        let child = ox_build_child(&[1, 2, 3, 4, 5], &[3, 5, 4, 1, 2], 4, 1);
        // donor read from position 2: 4, 1, 2, 3, 5 -> fills 4 then 3
        assert_eq!(child, vec![1, 2, 4, 3, 5]);
    }

    #[test]
    fn test_child_is_permutation() {
        let p1: Vec<usize> = (1..=20).collect();
        let p2: Vec<usize> = (1..=20).rev().collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let child = ox_crossover(&p1, &p2, &mut rng);
            assert!(is_permutation_of(&child, &p1));
        }
    }

    #[test]
    fn test_single_element() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(ox_crossover(&[4], &[4], &mut rng), vec![4]);
    }

    #[test]
    fn test_deterministic() {
        let p1: Vec<usize> = (1..=12).collect();
        let p2 = vec![7, 3, 11, 1, 9, 12, 5, 2, 10, 4, 8, 6];
        let a = ox_crossover(&p1, &p2, &mut StdRng::seed_from_u64(99));
        let b = ox_crossover(&p1, &p2, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic(expected = "equal length")]
    fn test_length_mismatch_panics() {
        let mut rng = StdRng::seed_from_u64(0);
        ox_crossover(&[1, 2, 3], &[1, 2], &mut rng);
    }
}
