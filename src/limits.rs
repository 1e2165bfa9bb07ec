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

//! Resource bounds enforced by the [`crate::interpreter::Interpreter`].

/// Maximum number of non-push opcodes (plus any `CHECKMULTISIG`
/// public-key count) a single `execute_script` call may execute.
pub const MAX_STEPS: u64 = 1200;

/// Upper bound on a script's byte length. This is the only memory
/// bound the VM imposes on top of the step counter: §1's Non-goals
/// name "bounded by step limit and script size" and nothing else, so
/// there is deliberately no separate evaluation/alt-stack depth cap —
/// a script is free to grow the stack as large as its step budget and
/// its own byte length allow.
pub const MAX_SCRIPT_LENGTH: usize = 65536;

/// The VM's only configuration surface: a host embedding the
/// interpreter may relax or tighten these bounds (e.g. for a test
/// network). Defaults match the constants above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    pub max_steps: u64,
    pub max_script_length: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        ExecutionLimits {
            max_steps: MAX_STEPS,
            max_script_length: MAX_SCRIPT_LENGTH,
        }
    }
}
