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

//! The `Signable` collaborator (§4.5): the object whose canonical
//! byte-encoding is verified by `CHECKSIG`/`CHECKMULTISIG`.

/// Provides the message bytes signed by `CHECKSIG`/`CHECKMULTISIG`.
/// Repeated calls within a single script execution must return
/// identical bytes.
pub trait Signable {
    fn message(&self) -> Vec<u8>;
}

/// A `Signable` wrapping an already-computed message, for tests and
/// hosts that already have the signing payload in hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedMessage(pub Vec<u8>);

impl FixedMessage {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        FixedMessage(bytes.into())
    }
}

impl Signable for FixedMessage {
    fn message(&self) -> Vec<u8> {
        self.0.clone()
    }
}
