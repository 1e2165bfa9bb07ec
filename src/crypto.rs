// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The `Crypto` collaborator (§4.4, §6 "out of scope"): hashing and
//! signature verification. This module is an external adapter boundary
//! — the interpreter never hashes or verifies signatures itself.

use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Hashing and ECDSA-verification primitives the interpreter defers
/// to. A host embedding this VM is expected to supply its own
/// implementation when its signature scheme differs from
/// [`DefaultCrypto`]'s.
pub trait Crypto {
    fn sha1(&self, bytes: &[u8]) -> [u8; 20];
    fn sha256(&self, bytes: &[u8]) -> [u8; 32];
    fn hash160(&self, bytes: &[u8]) -> [u8; 20];
    fn hash256(&self, bytes: &[u8]) -> [u8; 32];
    fn verify(&self, message: &[u8], signature: &[u8], pubkey: &[u8]) -> bool;
}

/// The canonical adapter: RIPEMD160(SHA256(x)) for `hash160`,
/// SHA256(SHA256(x)) for `hash256`, and secp256k1 ECDSA (DER or
/// compact signature, compressed or uncompressed SEC1 public key)
/// over the SHA256 digest of the message for `verify`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCrypto;

impl Crypto for DefaultCrypto {
    fn sha1(&self, bytes: &[u8]) -> [u8; 20] {
        let mut hasher = Sha1::new();
        hasher.update(bytes);
        hasher.finalize().into()
    }

    fn sha256(&self, bytes: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hasher.finalize().into()
    }

    fn hash160(&self, bytes: &[u8]) -> [u8; 20] {
        let round1 = self.sha256(bytes);
        let mut hasher = Ripemd160::new();
        hasher.update(round1);
        hasher.finalize().into()
    }

    fn hash256(&self, bytes: &[u8]) -> [u8; 32] {
        let round1 = self.sha256(bytes);
        self.sha256(&round1)
    }

    fn verify(&self, message: &[u8], signature: &[u8], pubkey: &[u8]) -> bool {
        let digest = self.sha256(message);
        let msg = match secp256k1::Message::from_digest_slice(&digest) {
            Ok(m) => m,
            Err(_) => return false,
        };
        let key = match secp256k1::PublicKey::from_slice(pubkey) {
            Ok(k) => k,
            Err(_) => return false,
        };
        let sig = match secp256k1::ecdsa::Signature::from_der(signature)
            .or_else(|_| secp256k1::ecdsa::Signature::from_compact(signature))
        {
            Ok(s) => s,
            Err(_) => return false,
        };
        let secp = secp256k1::Secp256k1::verification_only();
        secp.verify_ecdsa(&msg, &sig, &key).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash256_is_double_sha256() {
        let c = DefaultCrypto;
        let expect = c.sha256(&c.sha256(b"hello"));
        assert_eq!(c.hash256(b"hello"), expect);
    }

    #[test]
    fn hash160_is_ripemd_of_sha256() {
        let c = DefaultCrypto;
        let round1 = c.sha256(b"hello");
        let mut hasher = Ripemd160::new();
        hasher.update(round1);
        let expect: [u8; 20] = hasher.finalize().into();
        assert_eq!(c.hash160(b"hello"), expect);
    }

    #[test]
    fn verify_rejects_garbage() {
        let c = DefaultCrypto;
        assert!(!c.verify(b"message", b"not-a-signature", b"not-a-pubkey"));
    }
}
