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

//! The VM's terminal/non-terminal execution outcome, modelled as an
//! enumerated result rather than a bit-set (see `DESIGN.md`).

use crate::error::VmFault;

/// Outcome of executing a single opcode, or of a whole script.
#[derive(Debug, Clone, PartialEq)]
pub enum VmOutcome {
    /// Execution should continue with the next opcode.
    Continue,
    /// Terminal success.
    Halt,
    /// Terminal failure, with the internal reason for diagnostics.
    Fault(VmFault),
}

impl From<VmFault> for VmOutcome {
    fn from(f: VmFault) -> Self {
        VmOutcome::Fault(f)
    }
}

impl VmOutcome {
    pub fn is_fault(&self) -> bool {
        matches!(self, VmOutcome::Fault(_))
    }
}
