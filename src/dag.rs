// Copyright groupdag contributors.
//
// This software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, this software is distributed
// under the GPL Licence on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licence for the specific language
// governing permissions and limitations relating to use of this software.

//! DAG builder & validator (C2).

use crate::crypto::Hash;
use crate::envelope::{self, VerifiedOp};
use crate::error::{Error, Result};
use crate::ops::OpBody;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// An immutable, validated hash DAG of operations.
///
/// Built once from a raw envelope set by [`Dag::build`] and never mutated
/// afterwards — the interpreter is a pure function of its input.
#[derive(Debug)]
pub struct Dag {
    ops: BTreeMap<Hash, VerifiedOp>,
    preds: BTreeMap<Hash, BTreeSet<Hash>>,
    succs: BTreeMap<Hash, BTreeSet<Hash>>,
    root: Hash,
}

impl Dag {
    /// Verifies and assembles `envelopes` into a `Dag`: checks every
    /// signature, resolves every `preds` entry, and confirms there is
    /// exactly one root. Duplicate raw bytes collapse naturally since they
    /// hash to the same key.
    pub fn build<I>(envelopes: I) -> Result<Dag>
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let mut ops: BTreeMap<Hash, VerifiedOp> = BTreeMap::new();
        for raw in envelopes {
            let verified = envelope::verify(&raw)?;
            ops.insert(verified.hash, verified);
        }

        let mut preds: BTreeMap<Hash, BTreeSet<Hash>> = BTreeMap::new();
        let mut root: Option<Hash> = None;

        for (hash, op) in &ops {
            match &op.body {
                OpBody::Create { .. } => {
                    if root.is_some() {
                        return Err(Error::MultipleCreates);
                    }
                    root = Some(*hash);
                    preds.insert(*hash, BTreeSet::new());
                }
                other => {
                    let raw_preds = other.preds();
                    if raw_preds.is_empty() {
                        return Err(Error::NonCreateWithoutPreds(hash.to_hex()));
                    }
                    let mut set = BTreeSet::new();
                    for p in raw_preds {
                        let parsed = Hash::from_str(p).map_err(|_| {
                            Error::DanglingPredecessor(p.clone())
                        })?;
                        if !ops.contains_key(&parsed) {
                            return Err(Error::DanglingPredecessor(parsed.to_hex()));
                        }
                        set.insert(parsed);
                    }
                    preds.insert(*hash, set);
                }
            }
        }

        let root = root.ok_or(Error::MissingRoot)?;

        let mut succs: BTreeMap<Hash, BTreeSet<Hash>> = ops.keys().map(|h| (*h, BTreeSet::new())).collect();
        for (hash, p) in &preds {
            for pred in p {
                succs.entry(*pred).or_default().insert(*hash);
            }
        }

        let dag = Dag {
            ops,
            preds,
            succs,
            root,
        };
        dag.check_acyclic()?;
        Ok(dag)
    }

    /// Because hashes bind content, a genuine predecessor cycle would
    /// require a hash pre-image. This is a sanity pass, not a load-bearing
    /// correctness check.
    fn check_acyclic(&self) -> Result<()> {
        let mut state: BTreeMap<Hash, u8> = BTreeMap::new(); // 0 unvisited, 1 in-progress, 2 done
        for start in self.ops.keys() {
            if state.get(start) == Some(&2) {
                continue;
            }
            let mut stack = vec![(*start, false)];
            while let Some((h, processed)) = stack.pop() {
                if processed {
                    state.insert(h, 2);
                    continue;
                }
                match state.get(&h) {
                    Some(1) => return Err(Error::CorruptDag(h.to_hex())),
                    Some(2) => continue,
                    _ => {}
                }
                state.insert(h, 1);
                stack.push((h, true));
                for pred in self.preds.get(&h).into_iter().flatten() {
                    stack.push((*pred, false));
                }
            }
        }
        Ok(())
    }

    pub fn ops(&self) -> &BTreeMap<Hash, VerifiedOp> {
        &self.ops
    }

    pub fn op(&self, h: &Hash) -> Option<&VerifiedOp> {
        self.ops.get(h)
    }

    pub fn preds_of(&self, h: &Hash) -> BTreeSet<Hash> {
        self.preds.get(h).cloned().unwrap_or_default()
    }

    pub fn succs_of(&self, h: &Hash) -> BTreeSet<Hash> {
        self.succs.get(h).cloned().unwrap_or_default()
    }

    pub fn root(&self) -> Hash {
        self.root
    }

    /// Nodes with no successors.
    pub fn heads(&self) -> BTreeSet<Hash> {
        self.ops
            .keys()
            .filter(|h| self.succs.get(*h).map(|s| s.is_empty()).unwrap_or(true))
            .copied()
            .collect()
    }

    /// All hashes reachable from `h` via `preds`, including `h` itself —
    /// i.e. the causal ancestors of `h` (`a` such that `a ⪯ h`).
    pub fn ancestors(&self, h: &Hash) -> BTreeSet<Hash> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![*h];
        while let Some(cur) = stack.pop() {
            if !seen.insert(cur) {
                continue;
            }
            for pred in self.preds.get(&cur).into_iter().flatten() {
                stack.push(*pred);
            }
        }
        seen
    }

    /// All hashes reachable from `h` via `succs`, including `h` itself —
    /// the causal descendants of `h` (`b` such that `h ⪯ b`).
    pub fn descendants(&self, h: &Hash) -> BTreeSet<Hash> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![*h];
        while let Some(cur) = stack.pop() {
            if !seen.insert(cur) {
                continue;
            }
            for succ in self.succs.get(&cur).into_iter().flatten() {
                stack.push(*succ);
            }
        }
        seen
    }

    /// `a ≺ b`: `a` is a (possibly improper without the `a != b` guard; see
    /// below) causal ancestor of `b`.
    pub fn precedes(&self, a: &Hash, b: &Hash) -> bool {
        a != b && self.ancestors(b).contains(a)
    }

    /// `a ∥ b`: neither `a ≺ b` nor `b ≺ a`.
    pub fn concurrent(&self, a: &Hash, b: &Hash) -> bool {
        a != b && !self.precedes(a, b) && !self.precedes(b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;

    #[test]
    fn single_create_builds_a_dag_with_one_root() {
        let key = ops::gen_keypair();
        let create = ops::create_op(&key);
        let dag = Dag::build(vec![create.clone()]).unwrap();
        let create_hash = envelope::verify(&create).unwrap().hash;
        assert_eq!(dag.root(), create_hash);
        assert_eq!(dag.heads(), BTreeSet::from([create_hash]));
    }

    #[test]
    fn two_creates_is_rejected() {
        let a = ops::gen_keypair();
        let b = ops::gen_keypair();
        let err = Dag::build(vec![ops::create_op(&a), ops::create_op(&b)]).unwrap_err();
        assert!(matches!(err, Error::MultipleCreates));
    }

    #[test]
    fn no_create_is_rejected() {
        let a = ops::gen_keypair();
        let bogus_pred = vec!["0".repeat(64)];
        let err = Dag::build(vec![ops::add_op(&a, &ops::public_key_hex(&a), &bogus_pred)])
            .unwrap_err();
        // dangling predecessor is detected before the missing-root check
        assert!(matches!(err, Error::DanglingPredecessor(_)));
    }

    #[test]
    fn dangling_predecessor_is_rejected() {
        let a = ops::gen_keypair();
        let create = ops::create_op(&a);
        let create_hash = envelope::verify(&create).unwrap().hash;
        let mut bogus_hash = create_hash.to_hex();
        bogus_hash.replace_range(0..1, if &bogus_hash[0..1] == "0" { "1" } else { "0" });
        let add = ops::add_op(&a, &ops::public_key_hex(&a), &[bogus_hash]);
        let err = Dag::build(vec![create, add]).unwrap_err();
        assert!(matches!(err, Error::DanglingPredecessor(_)));
    }
}
