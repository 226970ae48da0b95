// Copyright groupdag contributors.
//
// This software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, this software is distributed
// under the GPL Licence on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licence for the specific language
// governing permissions and limitations relating to use of this software.

//! Cryptographic primitives: Ed25519 signing and SHA-256 hashing.

pub use ed25519_dalek::{Keypair, PublicKey, Signature, SignatureError, Verifier};

use ed25519_dalek::ExpandedSecretKey;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A SHA-256 digest, displayed and parsed as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// Hashes `bytes` with SHA-256.
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Hash(out)
    }

    /// Lowercase hex representation.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let mut out = [0u8; 32];
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        out.copy_from_slice(&bytes);
        Ok(Hash(out))
    }
}

/// A public key, hex-encoded. Used as the canonical identity for members and
/// signers throughout the crate.
pub type PublicKeyHex = String;

pub fn public_key_to_hex(pk: &PublicKey) -> PublicKeyHex {
    hex::encode(pk.to_bytes())
}

pub fn public_key_from_hex(s: &str) -> Result<PublicKey, SignatureError> {
    let bytes = hex::decode(s).map_err(|_| SignatureError::new())?;
    PublicKey::from_bytes(&bytes)
}

/// Signs `msg` with `keypair`, returning a detached signature.
pub fn sign(msg: &[u8], keypair: &Keypair) -> Signature {
    let expanded_secret_key = ExpandedSecretKey::from(&keypair.secret);
    expanded_secret_key.sign(msg, &keypair.public)
}

/// Verifies a detached signature against `msg` and `public_key`.
pub fn verify(msg: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    public_key.verify(msg, signature).is_ok()
}
