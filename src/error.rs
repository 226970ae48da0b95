// Copyright groupdag contributors.
//
// This software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, this software is distributed
// under the GPL Licence on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licence for the specific language
// governing permissions and limitations relating to use of this software.

//! Error taxonomy for the interpreter.
//!
//! Every variant here is a structural failure: a malformed envelope, a
//! broken DAG invariant, or an implementation resource limit. Behavioural
//! outcomes — a key losing membership, a post being dropped, an op signed
//! by a key that was never authorised — are never errors; they simply
//! shrink the result of [`crate::interpret`].

use thiserror::Error;

/// A specialised `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons `interpret` can fail outright, with no partial result returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Envelope is shorter than the 96-byte key+signature prefix, or its
    /// body is not valid UTF-8.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Ed25519 signature verification failed against the envelope's key.
    #[error("signature verification failed")]
    BadSignature,

    /// The envelope body did not parse as JSON, or did not match the
    /// expected shape for its declared `type`.
    #[error("malformed operation body: {0}")]
    MalformedBody(String),

    /// The `type` field named an operation kind this crate does not know.
    #[error("unknown operation type: {0}")]
    UnknownOpType(String),

    /// A field required for the operation's declared type was absent or of
    /// the wrong type.
    #[error("missing or invalid field `{field}` for operation type `{op_type}`")]
    MissingField {
        /// The operation type being parsed.
        op_type: String,
        /// The field that was missing or malformed.
        field: String,
    },

    /// A `preds` entry named a hash that is not present in the input set.
    #[error("dangling predecessor {0}")]
    DanglingPredecessor(String),

    /// The input set contained no `create` operation.
    #[error("no create operation found; a group must have exactly one root")]
    MissingRoot,

    /// The input set contained more than one `create` operation.
    #[error("multiple create operations found; a group must have exactly one root")]
    MultipleCreates,

    /// A non-`create` operation listed an empty `preds` array.
    #[error("operation {0} is not a create but lists no predecessors")]
    NonCreateWithoutPreds(String),

    /// The predecessor relation contains a cycle. Because hashes bind
    /// content this would require a hash pre-image; treated as corruption.
    #[error("corrupt DAG: predecessor cycle detected at {0}")]
    CorruptDag(String),

    /// The authority-graph cycle enumeration exceeded its configured
    /// budget. Legitimate inputs must never hit this in practice.
    #[error("authority-graph cycle enumeration exceeded budget of {0}")]
    CycleBudgetExceeded(usize),
}
