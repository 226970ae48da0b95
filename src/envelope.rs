// Copyright groupdag contributors.
//
// This software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, this software is distributed
// under the GPL Licence on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licence for the specific language
// governing permissions and limitations relating to use of this software.

//! Envelope codec (C1): `sign` / `verify` over the wire format
//! `pk(32) ‖ sig(64) ‖ json_body`.

use crate::crypto::{self, Hash, Keypair, PublicKey, Signature};
use crate::error::{Error, Result};
use crate::ops::OpBody;

const PUBLIC_KEY_LEN: usize = 32;
const SIGNATURE_LEN: usize = 64;
const PREFIX_LEN: usize = PUBLIC_KEY_LEN + SIGNATURE_LEN;

/// A verified, parsed operation: the envelope's hash, its signer, and its
/// tagged body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedOp {
    /// `SHA-256` of the full envelope bytes.
    pub hash: Hash,
    /// The envelope's signing public key, hex-encoded.
    pub signed_by: crypto::PublicKeyHex,
    /// The parsed, tagged operation body.
    pub body: OpBody,
}

/// JSON-encodes `body` with deterministic field ordering, signs it with
/// `signing_key`, and returns `pk ‖ sig ‖ json`.
pub fn sign(signing_key: &Keypair, body: &OpBody) -> Vec<u8> {
    let json = crate::canonical_json::to_canonical_bytes(body)
        .expect("OpBody always serialises to JSON");
    let signature = crypto::sign(&json, signing_key);

    let mut out = Vec::with_capacity(PREFIX_LEN + json.len());
    out.extend_from_slice(&signing_key.public.to_bytes());
    out.extend_from_slice(&signature.to_bytes());
    out.extend_from_slice(&json);
    out
}

/// Splits `bytes` on the fixed 32/64 prefix, verifies the signature, parses
/// the JSON body, and attaches the hash and signer.
pub fn verify(bytes: &[u8]) -> Result<VerifiedOp> {
    if bytes.len() < PREFIX_LEN {
        return Err(Error::MalformedEnvelope(format!(
            "envelope is {} bytes, need at least {PREFIX_LEN}",
            bytes.len()
        )));
    }

    let pk_bytes = &bytes[0..PUBLIC_KEY_LEN];
    let sig_bytes = &bytes[PUBLIC_KEY_LEN..PREFIX_LEN];
    let json_bytes = &bytes[PREFIX_LEN..];

    let public_key = PublicKey::from_bytes(pk_bytes)
        .map_err(|e| Error::MalformedEnvelope(format!("invalid public key: {e}")))?;
    let signature = Signature::from_bytes(sig_bytes)
        .map_err(|e| Error::MalformedEnvelope(format!("invalid signature encoding: {e}")))?;

    if !crypto::verify(json_bytes, &signature, &public_key) {
        return Err(Error::BadSignature);
    }

    let json_str = std::str::from_utf8(json_bytes)
        .map_err(|e| Error::MalformedEnvelope(format!("body is not valid UTF-8: {e}")))?;

    let body: OpBody = serde_json::from_str(json_str)
        .map_err(|e| classify_body_error(json_str, e))?;

    let hash = Hash::of(bytes);
    let signed_by = crypto::public_key_to_hex(&public_key);

    Ok(VerifiedOp {
        hash,
        signed_by,
        body,
    })
}

/// Turns a `serde_json` parse failure into the error taxonomy: an
/// unrecognised `type` becomes `UnknownOpType`, a recognised type with a
/// missing/wrongly typed field becomes `MissingField`, anything else is
/// `MalformedBody`.
fn classify_body_error(json_str: &str, err: serde_json::Error) -> Error {
    if let Ok(raw) = serde_json::from_str::<serde_json::Value>(json_str) {
        if let Some(ty) = raw.get("type").and_then(|v| v.as_str()) {
            if !matches!(ty, "create" | "add" | "remove" | "post") {
                return Error::UnknownOpType(ty.to_string());
            }
            let field = extract_missing_field(&err.to_string()).unwrap_or_else(|| "?".to_string());
            return Error::MissingField {
                op_type: ty.to_string(),
                field,
            };
        }
    }
    Error::MalformedBody(err.to_string())
}

/// Pulls the field name out of serde_json's `missing field \`x\`` style
/// error messages, where available.
fn extract_missing_field(msg: &str) -> Option<String> {
    let start = msg.find('`')?;
    let rest = &msg[start + 1..];
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;

    #[test]
    fn sign_then_verify_round_trips() {
        let key = ops::gen_keypair();
        let bytes = ops::create_op(&key);
        let verified = verify(&bytes).unwrap();
        assert_eq!(verified.signed_by, ops::public_key_hex(&key));
        assert!(matches!(verified.body, OpBody::Create { .. }));
    }

    #[test]
    fn short_envelope_is_malformed() {
        let err = verify(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, Error::MalformedEnvelope(_)));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let key = ops::gen_keypair();
        let mut bytes = ops::create_op(&key);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let err = verify(&bytes).unwrap_err();
        assert!(matches!(err, Error::BadSignature));
    }

    #[test]
    fn unknown_op_type_is_rejected() {
        let key = ops::gen_keypair();
        let body = serde_json::json!({"type": "teleport", "foo": "bar"});
        let json = crate::canonical_json::to_canonical_bytes(&body).unwrap();
        let signature = crypto::sign(&json, &key);
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&key.public.to_bytes());
        bytes.extend_from_slice(&signature.to_bytes());
        bytes.extend_from_slice(&json);

        let err = verify(&bytes).unwrap_err();
        assert!(matches!(err, Error::UnknownOpType(_)));
    }
}
