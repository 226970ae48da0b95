// Copyright groupdag contributors.
//
// This software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, this software is distributed
// under the GPL Licence on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licence for the specific language
// governing permissions and limitations relating to use of this software.

//! Seniority oracle (C3).
//!
//! Computes, for each public key, `(depth, add_hash)` where `depth` is the
//! length of the longest path from the root to the operation that *first*
//! added the key, and `add_hash` is that operation's hash (a deterministic
//! tie-break). Lower is more senior.

use crate::crypto::{Hash, PublicKeyHex};
use crate::dag::Dag;
use crate::ops::OpBody;
use std::collections::BTreeMap;

/// `(depth, hash)` compared lexicographically; smaller is more senior.
pub type SeniorityRank = (u64, Hash);

/// Per-key seniority plus per-hash depth, computed once from a [`Dag`].
#[derive(Debug)]
pub struct Seniority {
    depth: BTreeMap<Hash, u64>,
    rank: BTreeMap<PublicKeyHex, SeniorityRank>,
}

/// The key added (or created) by `op`, if it is an access-control op.
fn added_key_of(hash: &Hash, body: &OpBody, signed_by: &str) -> Option<PublicKeyHex> {
    match body {
        OpBody::Create { .. } => Some(signed_by.to_string()),
        OpBody::Add { added_key, .. } => Some(added_key.clone()),
        _ => {
            let _ = hash;
            None
        }
    }
}

impl Seniority {
    /// Computes depth for every node by an explicit-stack memoised
    /// traversal from the root, then derives
    /// `seniority(k) = min{(depth(h), h) : h ∈ A(k)}`.
    ///
    /// An op signed by a key that was never legitimately added is not
    /// flagged here — it has no bearing on seniority ranks, and the
    /// authority-graph resolver naturally judges such an op invalid (it
    /// has no incoming authorising edge), which is a behavioural outcome,
    /// not a structural one: it shrinks the result, it does not abort it.
    pub fn compute(dag: &Dag) -> Seniority {
        let depth = compute_depths(dag);

        let mut rank: BTreeMap<PublicKeyHex, SeniorityRank> = BTreeMap::new();
        for (hash, op) in dag.ops() {
            if let Some(key) = added_key_of(hash, &op.body, &op.signed_by) {
                let d = *depth.get(hash).expect("depth computed for every node");
                let candidate = (d, *hash);
                rank.entry(key)
                    .and_modify(|cur| {
                        if candidate < *cur {
                            *cur = candidate;
                        }
                    })
                    .or_insert(candidate);
            }
        }

        Seniority { depth, rank }
    }

    /// The longest-path depth from the root to `h`.
    pub fn depth_of(&self, h: &Hash) -> Option<u64> {
        self.depth.get(h).copied()
    }

    /// `(depth_of_first_add, add_hash)` for `pk`, if it was ever added.
    pub fn seniority_of(&self, pk: &str) -> Option<SeniorityRank> {
        self.rank.get(pk).copied()
    }
}

/// Computes, for every node, the length of the longest path from the root,
/// via an iterative post-order traversal over `preds` starting from the
/// DAG's heads. Memoised so the whole pass is O(|ops| + |edges|).
fn compute_depths(dag: &Dag) -> BTreeMap<Hash, u64> {
    let mut depth: BTreeMap<Hash, u64> = BTreeMap::new();
    let mut stack: Vec<(Hash, bool)> = dag.heads().into_iter().map(|h| (h, false)).collect();

    while let Some((h, expanded)) = stack.pop() {
        if depth.contains_key(&h) {
            continue;
        }
        let preds = dag.preds_of(&h);
        if !expanded {
            if preds.is_empty() {
                depth.insert(h, 0);
                continue;
            }
            stack.push((h, true));
            for p in &preds {
                if !depth.contains_key(p) {
                    stack.push((*p, false));
                }
            }
        } else {
            let max_pred_depth = preds.iter().filter_map(|p| depth.get(p)).max().copied();
            match max_pred_depth {
                Some(d) => {
                    depth.insert(h, d + 1);
                }
                None => {
                    // predecessors not all resolved yet — retry after they are
                    stack.push((h, false));
                }
            }
        }
    }

    depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::Dag;
    use crate::envelope;
    use crate::ops;

    #[test]
    fn creator_has_seniority_zero() {
        let a = ops::gen_keypair();
        let create = ops::create_op(&a);
        let create_hash = envelope::verify(&create).unwrap().hash;
        let dag = Dag::build(vec![create]).unwrap();
        let seniority = Seniority::compute(&dag);
        assert_eq!(
            seniority.seniority_of(&ops::public_key_hex(&a)),
            Some((0, create_hash))
        );
    }

    #[test]
    fn added_key_has_deeper_seniority_than_creator() {
        let a = ops::gen_keypair();
        let b = ops::gen_keypair();
        let create = ops::create_op(&a);
        let create_hash = envelope::verify(&create).unwrap().hash;
        let add_b = ops::add_op(&a, &ops::public_key_hex(&b), &[create_hash.to_hex()]);
        let dag = Dag::build(vec![create, add_b]).unwrap();
        let seniority = Seniority::compute(&dag);
        let (depth_a, _) = seniority.seniority_of(&ops::public_key_hex(&a)).unwrap();
        let (depth_b, _) = seniority.seniority_of(&ops::public_key_hex(&b)).unwrap();
        assert!(depth_a < depth_b);
    }

    #[test]
    fn key_never_added_has_no_seniority_rank() {
        let a = ops::gen_keypair();
        let b = ops::gen_keypair();
        let create = ops::create_op(&a);
        let create_hash = envelope::verify(&create).unwrap().hash;
        // b posts without ever having been added; this is not a structural
        // error, it just means b has no seniority rank of its own.
        let post_by_b = ops::post_op(&b, "hi", &[create_hash.to_hex()]);
        let dag = Dag::build(vec![create, post_by_b]).unwrap();
        let seniority = Seniority::compute(&dag);
        assert_eq!(seniority.seniority_of(&ops::public_key_hex(&b)), None);
    }
}
