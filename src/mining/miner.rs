//! Frequent itemset mining over edge transactions.

use std::collections::BTreeSet;

/// Frequent itemset miner.
///
/// Implementations return at most `max_patterns` itemsets contained in at
/// least `min_support` transactions, largest first.
pub trait ItemsetMiner {
    fn mine(
        &self,
        transactions: &[BTreeSet<usize>],
        min_support: usize,
        max_patterns: usize,
    ) -> Vec<BTreeSet<usize>>;
}

/// Exhaustive closed-itemset miner.
///
/// Closed itemsets are exactly the non-empty intersections of subsets of
/// the transactions, built by intersecting each new transaction with every
/// set found so far. Intended for small transaction databases such as an
/// elite set of a handful of solutions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosedItemsetMiner;

impl ItemsetMiner for ClosedItemsetMiner {
    fn mine(
        &self,
        transactions: &[BTreeSet<usize>],
        min_support: usize,
        max_patterns: usize,
    ) -> Vec<BTreeSet<usize>> {
        if max_patterns == 0 {
            return Vec::new();
        }

        let mut closed: BTreeSet<BTreeSet<usize>> = BTreeSet::new();
        for transaction in transactions.iter().filter(|t| !t.is_empty()) {
            let mut found: Vec<BTreeSet<usize>> = closed
                .iter()
                .map(|set| set.intersection(transaction).copied().collect::<BTreeSet<_>>())
                .filter(|set| !set.is_empty())
                .collect();
            found.push(transaction.clone());
            closed.extend(found);
        }

        let mut frequent: Vec<(BTreeSet<usize>, usize)> = closed
            .into_iter()
            .map(|set| {
                let support = transactions.iter().filter(|t| set.is_subset(t)).count();
                (set, support)
            })
            .filter(|&(_, support)| support >= min_support)
            .collect();

        frequent.sort_by(|(a, sa), (b, sb)| {
            b.len()
                .cmp(&a.len())
                .then(sb.cmp(sa))
                .then_with(|| a.cmp(b))
        });
        frequent
            .into_iter()
            .take(max_patterns)
            .map(|(set, _)| set)
            .collect()
    }
}
