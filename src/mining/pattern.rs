//! Edge codes and route fragment assembly.

use crate::individual::Individual;
use std::collections::BTreeSet;

/// Route fragments injected into the savings construction.
///
/// Each fragment is an ordered chain of at least two clients; fragments are
/// vertex-disjoint.
pub type Pattern = Vec<Vec<usize>>;

/// Code of the directed edge `c1 -> c2` for `nb_nodes` nodes including the depot.
#[inline]
pub fn edge_code(c1: usize, c2: usize, nb_nodes: usize) -> usize {
    c1 * nb_nodes + c2
}

/// Inverse of [`edge_code`].
#[inline]
pub fn decode_edge(code: usize, nb_nodes: usize) -> (usize, usize) {
    (code / nb_nodes, code % nb_nodes)
}

/// Client-to-client edges of every non-empty route; depot edges are left out.
pub fn edge_transaction(individual: &Individual, nb_nodes: usize) -> BTreeSet<usize> {
    individual
        .non_empty_routes()
        .flat_map(|route| route.windows(2).map(|w| edge_code(w[0], w[1], nb_nodes)))
        .collect()
}

/// Chains the edges of an itemset into vertex-disjoint fragments.
///
/// Edges are taken in ascending code order. An edge extends the fragment
/// ending in its tail and is prepended to the fragment starting at its
/// head; when both exist the two fragments are joined. Edges that touch the
/// depot, would close a cycle or would give a client a second successor or
/// predecessor are skipped.
pub fn assemble_fragments(itemset: &BTreeSet<usize>, nb_nodes: usize) -> Pattern {
    let mut fragments: Pattern = Vec::new();
    let mut placed = vec![false; nb_nodes];

    for &code in itemset {
        let (from, to) = decode_edge(code, nb_nodes);
        if from == 0 || to == 0 || from == to || from >= nb_nodes {
            continue;
        }
        let lhs = fragments.iter().position(|f| f.last() == Some(&from));
        let rhs = fragments.iter().position(|f| f.first() == Some(&to));
        if (placed[from] && lhs.is_none()) || (placed[to] && rhs.is_none()) {
            continue;
        }

        match (lhs, rhs) {
            (Some(l), Some(r)) if l == r => continue,
            (Some(l), Some(r)) => {
                let tail = fragments.remove(r);
                let l = if r < l { l - 1 } else { l };
                fragments[l].extend(tail);
            }
            (Some(l), None) => {
                fragments[l].push(to);
                placed[to] = true;
            }
            (None, Some(r)) => {
                fragments[r].insert(0, from);
                placed[from] = true;
            }
            (None, None) => {
                fragments.push(vec![from, to]);
                placed[from] = true;
                placed[to] = true;
            }
        }
    }
    fragments
}
