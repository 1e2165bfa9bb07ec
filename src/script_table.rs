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

//! The `ScriptTable` collaborator (§4.3): resolves a 20-byte script
//! hash to the callee's bytecode for `APPCALL`.

use std::collections::HashMap;

/// Pure lookup from a script hash to its bytecode. `None` causes
/// `APPCALL` to fault.
pub trait ScriptTable {
    fn get_script(&self, hash20: &[u8; 20]) -> Option<Vec<u8>>;
}

/// An in-memory, host-replaceable default adapter.
#[derive(Debug, Default, Clone)]
pub struct InMemoryScriptTable {
    scripts: HashMap<[u8; 20], Vec<u8>>,
}

impl InMemoryScriptTable {
    pub fn new() -> Self {
        InMemoryScriptTable {
            scripts: HashMap::new(),
        }
    }

    pub fn register(&mut self, hash20: [u8; 20], script: Vec<u8>) {
        self.scripts.insert(hash20, script);
    }
}

impl ScriptTable for InMemoryScriptTable {
    fn get_script(&self, hash20: &[u8; 20]) -> Option<Vec<u8>> {
        self.scripts.get(hash20).cloned()
    }
}
