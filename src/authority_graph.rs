// Copyright groupdag contributors.
//
// This software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, this software is distributed
// under the GPL Licence on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licence for the specific language
// governing permissions and limitations relating to use of this software.

//! Authority-graph resolver (C4): edge construction, cycle resolution by
//! seniority, and the pruned-graph validity computation.

use crate::config::InterpreterConfig;
use crate::crypto::{Hash, PublicKeyHex};
use crate::dag::Dag;
use crate::error::{Error, Result};
use crate::ops::OpBody;
use crate::seniority::Seniority;
use std::collections::{BTreeMap, BTreeSet};

/// A node in the authority graph: either an operation, or the sentinel
/// representing a public key's membership status.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Node {
    Op(Hash),
    Member(PublicKeyHex),
}

/// The subject key of an access-control op: `signed_by` for `create`,
/// `added_key` for `add`, `removed_key` for `remove`. `None` for `post`,
/// which contributes no authority-graph edges.
fn subject_key(op: &crate::envelope::VerifiedOp) -> Option<&str> {
    match &op.body {
        OpBody::Create { .. } => Some(op.signed_by.as_str()),
        OpBody::Add { added_key, .. } => Some(added_key.as_str()),
        OpBody::Remove { removed_key, .. } => Some(removed_key.as_str()),
        OpBody::Post { .. } => None,
    }
}

/// `a` is causally at-or-before `b`: `a == b` or `a ≺ b`. Used only for the
/// self-referential edge-construction check below, where `≺` needs to be
/// read as reflexive (unlike [`Dag::precedes`], which is irreflexive
/// everywhere else) so that a key's own self-`remove`/self-`add` forms an
/// authority edge against itself rather than a silently-dropped self-loop
/// — see DESIGN.md.
fn at_or_before(dag: &Dag, a: &Hash, b: &Hash) -> bool {
    a == b || dag.precedes(a, b)
}

/// Forward adjacency of the full (unpruned) authority graph: every op-hash
/// node to the set of nodes it may affect.
struct Graph {
    forward: BTreeMap<Hash, BTreeSet<Node>>,
    /// Restricted to op→op edges only, for cycle enumeration (spec:
    /// member sentinels are sinks and cannot participate in a cycle).
    op_only: BTreeMap<Hash, BTreeSet<Hash>>,
}

fn build_graph(dag: &Dag) -> Graph {
    let mut forward: BTreeMap<Hash, BTreeSet<Node>> = BTreeMap::new();
    let mut op_only: BTreeMap<Hash, BTreeSet<Hash>> = BTreeMap::new();

    for (&u_hash, u) in dag.ops() {
        let Some(subject) = subject_key(u) else {
            continue; // post: no authority-graph edges
        };

        forward
            .entry(u_hash)
            .or_default()
            .insert(Node::Member(subject.to_string()));

        for (&v_hash, v) in dag.ops() {
            if v.signed_by != subject {
                continue;
            }
            let emit = match &u.body {
                OpBody::Create { .. } | OpBody::Add { .. } => {
                    dag.precedes(&u_hash, &v_hash)
                }
                OpBody::Remove { .. } => !at_or_before(dag, &v_hash, &u_hash),
                OpBody::Post { .. } => unreachable!("post has no subject_key"),
            };
            if emit {
                forward.entry(u_hash).or_default().insert(Node::Op(v_hash));
                op_only.entry(u_hash).or_default().insert(v_hash);
            }
        }
    }

    Graph { forward, op_only }
}

/// Enumerates all simple cycles in `adj`, canonicalised as the set of their
/// vertices, using an explicit work stack rather than recursion (a large
/// authority graph could otherwise exhaust the call stack). Each cycle is
/// only discovered once, rooted at its lexicographically
/// smallest vertex, and extension is restricted to vertices greater than
/// the root — the standard trick for enumerating each elementary circuit
/// exactly once.
fn enumerate_cycles(
    adj: &BTreeMap<Hash, BTreeSet<Hash>>,
    budget: usize,
) -> Result<BTreeSet<BTreeSet<Hash>>> {
    let mut found: BTreeSet<BTreeSet<Hash>> = BTreeSet::new();
    let mut explored: usize = 0;
    let empty: BTreeSet<Hash> = BTreeSet::new();

    for &start in adj.keys() {
        let mut path: Vec<Hash> = vec![start];
        let mut on_path: BTreeSet<Hash> = BTreeSet::from([start]);
        let mut frames: Vec<std::vec::IntoIter<Hash>> =
            vec![adj.get(&start).unwrap_or(&empty).iter().copied().collect::<Vec<_>>().into_iter()];

        loop {
            let Some(frame) = frames.last_mut() else {
                break;
            };
            match frame.next() {
                Some(next) => {
                    explored += 1;
                    if explored > budget {
                        return Err(Error::CycleBudgetExceeded(budget));
                    }
                    if next == start {
                        found.insert(path.iter().copied().collect());
                    } else if next > start && !on_path.contains(&next) {
                        path.push(next);
                        on_path.insert(next);
                        frames.push(
                            adj.get(&next)
                                .unwrap_or(&empty)
                                .iter()
                                .copied()
                                .collect::<Vec<_>>()
                                .into_iter(),
                        );
                    }
                }
                None => {
                    frames.pop();
                    if let Some(last) = path.pop() {
                        on_path.remove(&last);
                    }
                }
            }
        }
    }

    Ok(found)
}

/// For each cycle, drops the op whose author has the least seniority
/// (maximum `(seniority, hash)`, lexicographically); unions the drops
/// across all cycles.
fn compute_drop_set(
    cycles: &BTreeSet<BTreeSet<Hash>>,
    dag: &Dag,
    seniority: &Seniority,
) -> BTreeSet<Hash> {
    let mut drop = BTreeSet::new();
    for cycle in cycles {
        let worst = cycle.iter().max_by_key(|h| {
            let op = dag.op(h).expect("cycle vertex is a known op");
            let rank = seniority
                .seniority_of(&op.signed_by)
                .unwrap_or((u64::MAX, **h));
            (rank, **h)
        });
        if let Some(h) = worst {
            warn!(op = %h, "dropping op to break authority-graph cycle");
            drop.insert(*h);
        }
    }
    drop
}

/// Builds incoming adjacency for the pruned graph `G' = {(x, y) : x ∉ D, y ∉ D}`.
fn pruned_incoming(graph: &Graph, drop: &BTreeSet<Hash>) -> BTreeMap<Node, BTreeSet<Hash>> {
    let mut incoming: BTreeMap<Node, BTreeSet<Hash>> = BTreeMap::new();
    for (&u, targets) in &graph.forward {
        if drop.contains(&u) {
            continue;
        }
        for v in targets {
            if let Node::Op(h) = v {
                if drop.contains(h) {
                    continue;
                }
            }
            incoming.entry(v.clone()).or_default().insert(u);
        }
    }
    incoming
}

/// Computes `valid: node → bool` over the pruned graph by Kahn's-algorithm
/// topological evaluation rather than recursive descent: every node's
/// incoming set is fully evaluated before the node itself is.
fn compute_validity(
    dag: &Dag,
    incoming: &BTreeMap<Node, BTreeSet<Hash>>,
) -> BTreeMap<Node, bool> {
    // out-edges restricted to the pruned graph, derived from `incoming`.
    let mut out: BTreeMap<Hash, BTreeSet<Node>> = BTreeMap::new();
    let mut all_nodes: BTreeSet<Node> = BTreeSet::new();
    for (node, sources) in incoming {
        all_nodes.insert(node.clone());
        for &src in sources {
            out.entry(src).or_default().insert(node.clone());
            all_nodes.insert(Node::Op(src));
        }
    }
    // Every op in the DAG is a node even with no incoming/outgoing pruned edges.
    for &h in dag.ops().keys() {
        all_nodes.insert(Node::Op(h));
    }

    let mut in_degree: BTreeMap<Node, usize> = all_nodes
        .iter()
        .map(|n| (n.clone(), incoming.get(n).map(BTreeSet::len).unwrap_or(0)))
        .collect();

    let mut ready: Vec<Node> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(n, _)| n.clone())
        .collect();
    ready.sort();

    let mut valid: BTreeMap<Node, bool> = BTreeMap::new();
    let mut queue: std::collections::VecDeque<Node> = ready.into_iter().collect();

    while let Some(node) = queue.pop_front() {
        if valid.contains_key(&node) {
            continue;
        }
        let is_valid = match &node {
            Node::Op(h) => {
                let op = dag.op(h).expect("every authority-graph op node is in the dag");
                if matches!(op.body, OpBody::Create { .. }) {
                    true
                } else {
                    evaluate_general_rule(dag, incoming.get(&node), &valid)
                }
            }
            Node::Member(_) => evaluate_general_rule(dag, incoming.get(&node), &valid),
        };
        trace!(?node, is_valid, "computed node validity");
        valid.insert(node.clone(), is_valid);

        let out_targets = match &node {
            Node::Op(h) => out.get(h),
            Node::Member(_) => None,
        };
        if let Some(targets) = out_targets {
            for t in targets {
                let d = in_degree.entry(t.clone()).or_insert(0);
                if *d > 0 {
                    *d -= 1;
                }
                if *d == 0 && !valid.contains_key(t) {
                    queue.push_back(t.clone());
                }
            }
        }
    }

    valid
}

/// `valid(node) = ∃ p ∈ P, op(p).type ∈ {create, add} ∧ ¬∃ q ∈ P, op(q).type = remove ∧ p ≺ q`
/// where `P = { p : (p, node) ∈ G', valid(p) }`.
fn evaluate_general_rule(
    dag: &Dag,
    incoming: Option<&BTreeSet<Hash>>,
    valid: &BTreeMap<Node, bool>,
) -> bool {
    let Some(sources) = incoming else {
        return false;
    };
    let p_set: Vec<Hash> = sources
        .iter()
        .copied()
        .filter(|p| valid.get(&Node::Op(*p)).copied().unwrap_or(false))
        .collect();

    p_set.iter().any(|&p| {
        let p_op = dag.op(&p).expect("p is a known op");
        let is_authorising = matches!(p_op.body, OpBody::Create { .. } | OpBody::Add { .. });
        if !is_authorising {
            return false;
        }
        !p_set.iter().any(|&q| {
            if q == p {
                return false;
            }
            let q_op = dag.op(&q).expect("q is a known op");
            matches!(q_op.body, OpBody::Remove { .. }) && dag.precedes(&p, &q)
        })
    })
}

/// The outcome of the authority-graph resolution: per-node validity.
pub struct Resolution {
    pub valid: BTreeMap<Node, bool>,
}

/// Runs C4 end to end: builds the authority graph, enumerates and resolves
/// cycles by seniority, prunes, and computes validity.
pub fn resolve(dag: &Dag, seniority: &Seniority, config: &InterpreterConfig) -> Result<Resolution> {
    let graph = build_graph(dag);
    let cycles = enumerate_cycles(&graph.op_only, config.max_authority_cycles)?;
    let drop = compute_drop_set(&cycles, dag, seniority);
    let incoming = pruned_incoming(&graph, &drop);
    let valid = compute_validity(dag, &incoming);
    Ok(Resolution { valid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::Dag;
    use crate::envelope;
    use crate::ops;
    use crate::seniority::Seniority;

    fn h(bytes: &[u8]) -> Hash {
        envelope::verify(bytes).unwrap().hash
    }

    #[test]
    fn simple_remove_drops_member() {
        let a = ops::gen_keypair();
        let b = ops::gen_keypair();
        let c = ops::gen_keypair();

        let create = ops::create_op(&a);
        let create_h = h(&create);
        let add_b = ops::add_op(&a, &ops::public_key_hex(&b), &[create_h.to_hex()]);
        let add_c = ops::add_op(&a, &ops::public_key_hex(&c), &[create_h.to_hex()]);
        let add_b_h = h(&add_b);
        let add_c_h = h(&add_c);
        let remove_b = ops::remove_op(
            &a,
            &ops::public_key_hex(&b),
            &[add_b_h.to_hex(), add_c_h.to_hex()],
        );

        let dag = Dag::build(vec![create, add_b, add_c, remove_b]).unwrap();
        let seniority = Seniority::compute(&dag);
        let config = InterpreterConfig::default();
        let resolution = resolve(&dag, &seniority, &config).unwrap();

        assert_eq!(
            resolution.valid.get(&Node::Member(ops::public_key_hex(&a))),
            Some(&true)
        );
        assert_eq!(
            resolution.valid.get(&Node::Member(ops::public_key_hex(&b))),
            Some(&false)
        );
        assert_eq!(
            resolution.valid.get(&Node::Member(ops::public_key_hex(&c))),
            Some(&true)
        );
    }
}
