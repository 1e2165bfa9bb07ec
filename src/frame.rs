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

//! Execution frames. `APPCALL` nests execution but reuses the
//! interpreter's evaluation and alt stacks; only the `{script, pc}`
//! pair is per-frame.

use std::rc::Rc;

/// A single execution frame: a script reference and a program
/// counter. Frames nest via `APPCALL`.
#[derive(Debug, Clone)]
pub struct Frame {
    pub script: Rc<Vec<u8>>,
    pub pc: usize,
}

impl Frame {
    pub fn new(script: Rc<Vec<u8>>) -> Self {
        Frame { script, pc: 0 }
    }
}
