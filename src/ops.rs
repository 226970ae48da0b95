// Copyright groupdag contributors.
//
// This software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, this software is distributed
// under the GPL Licence on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licence for the specific language
// governing permissions and limitations relating to use of this software.

//! Operation bodies and the pure producer functions that build them.

use crate::crypto::{self, Keypair, PublicKeyHex};
use crate::envelope;
use serde::{Deserialize, Serialize};

/// The parsed, tagged body of an operation, before signature verification.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpBody {
    /// Creates a new group. Has no predecessors; exactly one may appear in
    /// a valid input set.
    Create {
        /// 128-bit random nonce, hex-encoded, so distinct group creations
        /// never collide.
        nonce: String,
    },
    /// Adds `added_key` to the group.
    Add {
        added_key: PublicKeyHex,
        preds: Vec<String>,
    },
    /// Removes `removed_key` from the group.
    Remove {
        removed_key: PublicKeyHex,
        preds: Vec<String>,
    },
    /// An application chat message.
    Post { message: String, preds: Vec<String> },
}

impl OpBody {
    /// The operation's `type` tag, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            OpBody::Create { .. } => "create",
            OpBody::Add { .. } => "add",
            OpBody::Remove { .. } => "remove",
            OpBody::Post { .. } => "post",
        }
    }

    /// The `preds` list, empty for `create`.
    pub fn preds(&self) -> &[String] {
        match self {
            OpBody::Create { .. } => &[],
            OpBody::Add { preds, .. } | OpBody::Remove { preds, .. } | OpBody::Post { preds, .. } => {
                preds
            }
        }
    }
}

/// Returns a signed envelope that creates a new group.
///
/// Embeds a fresh 128-bit random nonce so distinct group creations never
/// produce identical bytes (and therefore never identical hashes).
pub fn create_op(signing_key: &Keypair) -> Vec<u8> {
    use rand::RngCore;
    let mut nonce_bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let body = OpBody::Create {
        nonce: hex::encode(nonce_bytes),
    };
    envelope::sign(signing_key, &body)
}

/// Returns a signed envelope that adds `added_key` to the group.
pub fn add_op(signing_key: &Keypair, added_key: &str, preds: &[String]) -> Vec<u8> {
    let body = OpBody::Add {
        added_key: added_key.to_string(),
        preds: preds.to_vec(),
    };
    envelope::sign(signing_key, &body)
}

/// Returns a signed envelope that removes `removed_key` from the group.
pub fn remove_op(signing_key: &Keypair, removed_key: &str, preds: &[String]) -> Vec<u8> {
    let body = OpBody::Remove {
        removed_key: removed_key.to_string(),
        preds: preds.to_vec(),
    };
    envelope::sign(signing_key, &body)
}

/// Returns a signed envelope carrying an application chat message.
pub fn post_op(signing_key: &Keypair, message: &str, preds: &[String]) -> Vec<u8> {
    let body = OpBody::Post {
        message: message.to_string(),
        preds: preds.to_vec(),
    };
    envelope::sign(signing_key, &body)
}

/// Generates a fresh Ed25519 keypair. A convenience for callers and tests;
/// key management proper (generation, storage, rotation) is out of this
/// crate's scope.
pub fn gen_keypair() -> Keypair {
    Keypair::generate(&mut rand::rngs::OsRng)
}

/// Returns the hex-encoded public key for `keypair`.
pub fn public_key_hex(keypair: &Keypair) -> PublicKeyHex {
    crypto::public_key_to_hex(&keypair.public)
}
