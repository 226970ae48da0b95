// Copyright groupdag contributors.
//
// This software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, this software is distributed
// under the GPL Licence on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licence for the specific language
// governing permissions and limitations relating to use of this software.

//! Interpreter façade (C5): drives C1–C4 and exposes the single public
//! entry point, `interpret`.

use crate::authority_graph::{self, Node};
use crate::config::InterpreterConfig;
use crate::dag::Dag;
use crate::error::Result;
use crate::ops::OpBody;
use crate::seniority::Seniority;
use std::collections::BTreeSet;

/// The result of interpreting a set of operations: the currently
/// authorised members, and the application messages considered valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interpretation {
    /// Hex-encoded public keys currently authorised as group members.
    pub members: BTreeSet<String>,
    /// Message bodies of `post` operations considered valid.
    pub valid_messages: BTreeSet<String>,
}

/// Validates, reconstructs, and resolves `envelopes` into the authorised
/// member set and the valid message set.
///
/// A pure function of its input: no state is held between calls. Only
/// structural faults (a malformed envelope, a broken DAG invariant) abort
/// the call; behavioural outcomes — a never-authorised signer, concurrent
/// removals, a post after its author was removed — never raise an error,
/// they simply shrink the returned `members`/`valid_messages` sets.
pub fn interpret(envelopes: &[Vec<u8>], config: &InterpreterConfig) -> Result<Interpretation> {
    info!(count = envelopes.len(), "interpreting operation set");

    let dag = Dag::build(envelopes.iter().cloned())?;
    let seniority = Seniority::compute(&dag);
    let resolution = authority_graph::resolve(&dag, &seniority, config)?;

    let mut members = BTreeSet::new();
    let mut valid_messages = BTreeSet::new();

    for (node, is_valid) in &resolution.valid {
        if !is_valid {
            continue;
        }
        match node {
            Node::Member(pk) => {
                members.insert(pk.clone());
            }
            Node::Op(hash) => {
                if let Some(op) = dag.op(hash) {
                    if let OpBody::Post { message, .. } = &op.body {
                        valid_messages.insert(message.clone());
                    }
                }
            }
        }
    }

    debug!(
        members = members.len(),
        messages = valid_messages.len(),
        "interpretation complete"
    );

    Ok(Interpretation {
        members,
        valid_messages,
    })
}
