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

//! Internal fault taxonomy.
//!
//! None of this is part of the VM's observable behaviour — a script
//! either `HALT`s or `FAULT`s, full stop — but having a concrete
//! reason at every fault site makes `log::debug!` output and unit
//! tests meaningful.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum VmFault {
    /// An opcode required more operands than the stack held.
    StackUnderflow,
    /// A view/coercion was requested that the operand's kind (or
    /// shape) does not support.
    TypeMismatch(&'static str),
    /// A binary elementwise opcode was given operands of differing
    /// element counts.
    ElementCountMismatch,
    /// Opcode byte has no assigned meaning.
    UnknownOpcode(u8),
    /// A read (opcode, immediate, or length-prefixed data) ran past
    /// the end of the script.
    TruncatedScript,
    /// A `JMP`/`JMPIF`/`JMPIFNOT`/`CALL`/`RET` target fell outside
    /// `[0, script.length]`.
    InvalidJumpTarget,
    /// A count/index/offset operand was negative or otherwise out of
    /// range (e.g. `RIGHT` with a count exceeding the string length).
    InvalidOperand(&'static str),
    /// The op counter exceeded `MAX_STEPS`.
    StepLimitExceeded,
    /// Script length exceeded `MAX_SCRIPT_LENGTH`.
    ScriptTooLarge,
    /// `APPCALL` referenced a script hash with no registered script.
    UnknownScript,
    /// `SYSCALL` referenced an unregistered interop method, or the
    /// handler itself reported failure.
    InteropFailure,
    /// `AVERAGE` was applied to an empty sequence.
    EmptyAverage,
    /// `push_only` verification encountered a non-push opcode.
    NotPushOnly,
}

impl fmt::Display for VmFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for VmFault {}
