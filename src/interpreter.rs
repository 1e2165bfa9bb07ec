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

//! The VM core: decodes one opcode at a time from the executing frame
//! and mutates the evaluation/alt stacks until `HALT`, `FAULT`, or
//! end-of-stream.

use std::rc::Rc;

use num_bigint::{BigInt, Sign};
use num_traits::{ToPrimitive, Zero};

use crate::crypto::{Crypto, DefaultCrypto};
use crate::error::VmFault;
use crate::frame::Frame;
use crate::interop::InteropDispatch;
use crate::item::{decode_canonical_int, encode_canonical_int, StackItem};
use crate::limits::ExecutionLimits;
use crate::opcode;
use crate::script_table::ScriptTable;
use crate::signable::{FixedMessage, Signable};
use crate::state::VmOutcome;

/// The stack virtual machine. Owns the evaluation and alt stacks, the
/// nesting of `APPCALL` frames, and the pluggable adapters (§4.2-4.5).
pub struct Interpreter {
    eval_stack: Vec<StackItem>,
    alt_stack: Vec<StackItem>,
    op_counter: u64,
    frames: Vec<Frame>,
    limits: ExecutionLimits,
    signable: Rc<dyn Signable>,
    crypto: Rc<dyn Crypto>,
    script_table: Option<Rc<dyn ScriptTable>>,
    interop: InteropDispatch,
}

impl Interpreter {
    pub fn new(signable: Rc<dyn Signable>, crypto: Rc<dyn Crypto>) -> Self {
        Interpreter {
            eval_stack: Vec::new(),
            alt_stack: Vec::new(),
            op_counter: 0,
            frames: Vec::new(),
            limits: ExecutionLimits::default(),
            signable,
            crypto,
            script_table: None,
            interop: InteropDispatch::new(),
        }
    }

    pub fn with_script_table(mut self, table: Rc<dyn ScriptTable>) -> Self {
        self.script_table = Some(table);
        self
    }

    pub fn with_interop(mut self, interop: InteropDispatch) -> Self {
        self.interop = interop;
        self
    }

    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// A bare interpreter with no signable payload and the default
    /// crypto adapter, for tests that only exercise stack/opcode
    /// mechanics.
    pub fn for_tests() -> Self {
        Interpreter::new(Rc::new(FixedMessage::new(Vec::new())), Rc::new(DefaultCrypto))
    }

    pub fn op_counter(&self) -> u64 {
        self.op_counter
    }

    pub fn eval_stack(&self) -> &[StackItem] {
        &self.eval_stack
    }

    pub fn alt_stack(&self) -> &[StackItem] {
        &self.alt_stack
    }

    /// Push a value onto the evaluation stack. Always succeeds: the
    /// VM has no stack-depth bound beyond the step counter and script
    /// size (§1). Interop handlers use this directly; opcode dispatch
    /// goes through [`Interpreter::push_checked`] instead, purely so
    /// every dispatch arm can use `?` uniformly.
    pub fn push(&mut self, item: StackItem) -> bool {
        self.push_checked(item).is_ok()
    }

    pub fn signable_message(&self) -> Vec<u8> {
        self.signable.message()
    }

    pub fn hash160(&self, bytes: &[u8]) -> [u8; 20] {
        self.crypto.hash160(bytes)
    }

    pub fn executing_script(&self) -> Vec<u8> {
        match self.frames.last() {
            Some(frame) => (*frame.script).clone(),
            None => Vec::new(),
        }
    }

    pub fn calling_script(&self) -> Vec<u8> {
        if self.frames.len() >= 2 {
            (*self.frames[self.frames.len() - 2].script).clone()
        } else {
            Vec::new()
        }
    }

    pub fn entry_script(&self) -> Vec<u8> {
        match self.frames.first() {
            Some(frame) => (*frame.script).clone(),
            None => Vec::new(),
        }
    }

    /// Execute `script` as a fresh frame sharing this interpreter's
    /// stacks. Returns `true` on `HALT` or clean end-of-stream, `false`
    /// on any `FAULT` (including `ScriptTooLarge`).
    pub fn execute_script(&mut self, script: &[u8], push_only: bool) -> bool {
        if script.len() > self.limits.max_script_length {
            log::debug!("fault: {:?}", VmFault::ScriptTooLarge);
            return false;
        }
        self.frames.push(Frame::new(Rc::new(script.to_vec())));
        let outcome = self.run_frame(push_only);
        self.frames.pop();
        match outcome {
            VmOutcome::Halt | VmOutcome::Continue => true,
            VmOutcome::Fault(fault) => {
                log::debug!("fault: {:?}", fault);
                false
            }
        }
    }

    fn run_frame(&mut self, push_only: bool) -> VmOutcome {
        loop {
            let pc = self.frames.last().expect("frame present").pc;
            let script = self.frames.last().expect("frame present").script.clone();
            if pc >= script.len() {
                return VmOutcome::Continue;
            }
            let op = script[pc];
            if push_only && !opcode::is_push(op) {
                return VmOutcome::Fault(VmFault::NotPushOnly);
            }
            log::trace!("pc={} op={:#04x} depth={}", pc, op, self.eval_stack.len());
            match self.execute_op(&script, op, pc) {
                VmOutcome::Continue => continue,
                other => return other,
            }
        }
    }

    /// Push onto the evaluation stack. No depth cap — the step
    /// counter and `MAX_SCRIPT_LENGTH` are the VM's only resource
    /// bounds (§1, §3.4). Returns `Result` only so every dispatch arm
    /// can chain it with `?` alongside the other fallible stack ops.
    fn push_checked(&mut self, item: StackItem) -> Result<(), VmFault> {
        self.eval_stack.push(item);
        Ok(())
    }

    fn push_alt_checked(&mut self, item: StackItem) -> Result<(), VmFault> {
        self.alt_stack.push(item);
        Ok(())
    }

    fn pop(&mut self) -> Result<StackItem, VmFault> {
        self.eval_stack.pop().ok_or(VmFault::StackUnderflow)
    }

    fn pop_alt(&mut self) -> Result<StackItem, VmFault> {
        self.alt_stack.pop().ok_or(VmFault::StackUnderflow)
    }

    fn require_depth(&self, n: usize) -> Result<(), VmFault> {
        if self.eval_stack.len() < n {
            Err(VmFault::StackUnderflow)
        } else {
            Ok(())
        }
    }

    /// Increment the op counter by one, for every non-push opcode
    /// (§3.4).
    fn step_count(&mut self) -> Result<(), VmFault> {
        self.add_steps(1)
    }

    /// Increment the op counter by an arbitrary amount. Used both by
    /// [`Interpreter::step_count`] and by `CHECKMULTISIG`'s additional
    /// `n`-key charge (§4.1.3), which is on top of that opcode's own
    /// baseline non-push increment.
    fn add_steps(&mut self, n: u64) -> Result<(), VmFault> {
        self.op_counter = self.op_counter.checked_add(n).ok_or(VmFault::StepLimitExceeded)?;
        if self.op_counter > self.limits.max_steps {
            return Err(VmFault::StepLimitExceeded);
        }
        Ok(())
    }

    /// Decode and execute the opcode at `script[pc]`. Advances the
    /// current frame's program counter by side effect (control-flow
    /// opcodes set it directly; everything else falls through to the
    /// "advance past the immediate" path at the end).
    fn execute_op(&mut self, script: &Rc<Vec<u8>>, op: u8, op_pc: usize) -> VmOutcome {
        match self.dispatch(script, op, op_pc) {
            Ok(outcome) => outcome,
            Err(fault) => VmOutcome::Fault(fault),
        }
    }

    fn dispatch(&mut self, script: &Rc<Vec<u8>>, op: u8, op_pc: usize) -> Result<VmOutcome, VmFault> {
        if !opcode::is_push(op) {
            self.step_count()?;
        }

        // --- constant push family ---------------------------------
        if op == opcode::OP_0 {
            self.push_checked(StackItem::from_int(0))?;
            self.advance(op_pc + 1);
            return Ok(VmOutcome::Continue);
        }
        if op == opcode::OP_1NEGATE {
            self.push_checked(StackItem::from_int(-1))?;
            self.advance(op_pc + 1);
            return Ok(VmOutcome::Continue);
        }
        if (opcode::OP_1..=opcode::OP_16).contains(&op) {
            let n = (op - opcode::OP_1 + 1) as i64;
            self.push_checked(StackItem::from_int(n))?;
            self.advance(op_pc + 1);
            return Ok(VmOutcome::Continue);
        }
        if let Some(len) = opcode::pushbytes_len(op) {
            let mut pc = op_pc + 1;
            let bytes = read_bytes(script, &mut pc, len)?;
            self.push_checked(StackItem::from_bytes(bytes))?;
            self.advance(pc);
            return Ok(VmOutcome::Continue);
        }
        if op == opcode::PUSHDATA1 || op == opcode::PUSHDATA2 || op == opcode::PUSHDATA4 {
            let mut pc = op_pc + 1;
            let len = match op {
                opcode::PUSHDATA1 => read_u8(script, &mut pc)? as usize,
                opcode::PUSHDATA2 => read_u16_le(script, &mut pc)? as usize,
                _ => {
                    let raw = read_i32_le(script, &mut pc)?;
                    if raw < 0 {
                        return Err(VmFault::InvalidOperand("pushdata4 length"));
                    }
                    raw as usize
                }
            };
            let bytes = read_bytes(script, &mut pc, len)?;
            self.push_checked(StackItem::from_bytes(bytes))?;
            self.advance(pc);
            return Ok(VmOutcome::Continue);
        }

        match op {
            opcode::NOP => {
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::JMP | opcode::JMPIF | opcode::JMPIFNOT => {
                let mut pc = op_pc + 1;
                let displacement = read_i16_le(script, &mut pc)?;
                let take = match op {
                    opcode::JMP => true,
                    opcode::JMPIF => self.pop()?.to_bool()?,
                    _ => !self.pop()?.to_bool()?,
                };
                if take {
                    let target = jump_target(op_pc, displacement, script.len())?;
                    self.advance(target);
                } else {
                    self.advance(pc);
                }
                Ok(VmOutcome::Continue)
            }
            opcode::CALL => {
                let mut pc = op_pc + 1;
                let displacement = read_i16_le(script, &mut pc)?;
                let return_addr = pc;
                let target = jump_target(op_pc, displacement, script.len())?;
                self.push_checked(StackItem::from_int(return_addr as i64))?;
                self.advance(target);
                Ok(VmOutcome::Continue)
            }
            opcode::RET => {
                let result = self.pop()?;
                let position_item = self.pop()?;
                let position = position_item.to_int()?;
                let position = position
                    .to_usize()
                    .filter(|p| *p <= script.len())
                    .ok_or(VmFault::InvalidJumpTarget)?;
                self.push_checked(result)?;
                self.advance(position);
                Ok(VmOutcome::Continue)
            }
            opcode::APPCALL => {
                let mut pc = op_pc + 1;
                let hash_bytes = read_bytes(script, &mut pc, 20)?;
                let hash: [u8; 20] = hash_bytes.try_into().expect("read_bytes(20) yields 20 bytes");
                let callee = self
                    .script_table
                    .as_ref()
                    .and_then(|table| table.get_script(&hash))
                    .ok_or(VmFault::UnknownScript)?;
                self.advance(pc);
                if self.execute_script(&callee, false) {
                    Ok(VmOutcome::Continue)
                } else {
                    Err(VmFault::UnknownScript)
                }
            }
            opcode::SYSCALL => {
                let mut pc = op_pc + 1;
                let len = read_varint(script, &mut pc)?;
                let name_bytes = read_bytes(script, &mut pc, len as usize)?;
                let name = String::from_utf8(name_bytes).map_err(|_| VmFault::InteropFailure)?;
                let interop = std::mem::replace(&mut self.interop, InteropDispatch::new());
                let ok = interop.invoke(&name, self);
                self.interop = interop;
                if !ok {
                    return Err(VmFault::InteropFailure);
                }
                self.advance(pc);
                Ok(VmOutcome::Continue)
            }
            opcode::HALTIFNOT => {
                self.require_depth(1)?;
                let top = self.eval_stack.last().expect("depth checked").clone();
                if top.to_bool()? {
                    self.pop()?;
                    self.advance(op_pc + 1);
                    Ok(VmOutcome::Continue)
                } else {
                    Ok(VmOutcome::Halt)
                }
            }
            opcode::HALT => Ok(VmOutcome::Halt),

            // --- stack manipulation --------------------------------
            opcode::TOALTSTACK => {
                let item = self.pop()?;
                self.push_alt_checked(item)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::FROMALTSTACK => {
                let item = self.pop_alt()?;
                self.push_checked(item)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::TWODROP => {
                self.require_depth(2)?;
                self.pop()?;
                self.pop()?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::TWODUP => {
                self.require_depth(2)?;
                let len = self.eval_stack.len();
                let a = self.eval_stack[len - 2].clone();
                let b = self.eval_stack[len - 1].clone();
                self.push_checked(a)?;
                self.push_checked(b)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::THREEDUP => {
                self.require_depth(3)?;
                let len = self.eval_stack.len();
                let a = self.eval_stack[len - 3].clone();
                let b = self.eval_stack[len - 2].clone();
                let c = self.eval_stack[len - 1].clone();
                self.push_checked(a)?;
                self.push_checked(b)?;
                self.push_checked(c)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::TWOOVER => {
                self.require_depth(4)?;
                let len = self.eval_stack.len();
                let a = self.eval_stack[len - 4].clone();
                let b = self.eval_stack[len - 3].clone();
                self.push_checked(a)?;
                self.push_checked(b)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::TWOROT => {
                self.require_depth(6)?;
                let len = self.eval_stack.len();
                let a = self.eval_stack.remove(len - 6);
                let b = self.eval_stack.remove(len - 6);
                self.push_checked(a)?;
                self.push_checked(b)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::TWOSWAP => {
                self.require_depth(4)?;
                let len = self.eval_stack.len();
                self.eval_stack.swap(len - 4, len - 2);
                self.eval_stack.swap(len - 3, len - 1);
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::IFDUP => {
                self.require_depth(1)?;
                let top = self.eval_stack.last().expect("depth checked").clone();
                if top.to_bool()? {
                    self.push_checked(top)?;
                }
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::DEPTH => {
                self.push_checked(StackItem::from_int(self.eval_stack.len() as i64))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::DROP => {
                self.pop()?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::DUP => {
                self.require_depth(1)?;
                let top = self.eval_stack.last().expect("depth checked").clone();
                self.push_checked(top)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::NIP => {
                self.require_depth(2)?;
                let len = self.eval_stack.len();
                self.eval_stack.remove(len - 2);
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::OVER => {
                self.require_depth(2)?;
                let len = self.eval_stack.len();
                let item = self.eval_stack[len - 2].clone();
                self.push_checked(item)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::PICK => {
                let n = self.pop_index()?;
                let len = self.eval_stack.len();
                let idx = len.checked_sub(1 + n).ok_or(VmFault::StackUnderflow)?;
                let item = self.eval_stack[idx].clone();
                self.push_checked(item)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::ROLL => {
                let n = self.pop_index()?;
                let len = self.eval_stack.len();
                let idx = len.checked_sub(1 + n).ok_or(VmFault::StackUnderflow)?;
                let item = self.eval_stack.remove(idx);
                self.push_checked(item)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::ROT => {
                self.require_depth(3)?;
                let len = self.eval_stack.len();
                let item = self.eval_stack.remove(len - 3);
                self.push_checked(item)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::SWAP => {
                self.require_depth(2)?;
                let len = self.eval_stack.len();
                self.eval_stack.swap(len - 2, len - 1);
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::TUCK => {
                self.require_depth(2)?;
                let top = self.eval_stack.last().expect("depth checked").clone();
                let len = self.eval_stack.len();
                self.eval_stack.insert(len - 2, top);
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }

            // --- splice ---------------------------------------------
            opcode::CAT => {
                let b = self.pop()?.as_bytes_array()?;
                let a = self.pop()?.as_bytes_array()?;
                if a.len() != b.len() {
                    return Err(VmFault::ElementCountMismatch);
                }
                let result: Vec<Vec<u8>> = a
                    .into_iter()
                    .zip(b.into_iter())
                    .map(|(mut x, y)| {
                        x.extend_from_slice(&y);
                        x
                    })
                    .collect();
                self.push_checked(StackItem::Bytes(Rc::new(result)))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::SUBSTR => {
                let count = self.pop_index()?;
                let index = self.pop_index()?;
                let x = self.pop()?.as_bytes_array()?;
                let mut out = Vec::with_capacity(x.len());
                for slot in x {
                    let end = index.checked_add(count).ok_or(VmFault::InvalidOperand("substr"))?;
                    if end > slot.len() {
                        return Err(VmFault::InvalidOperand("substr"));
                    }
                    out.push(slot[index..end].to_vec());
                }
                self.push_checked(StackItem::Bytes(Rc::new(out)))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::LEFT => {
                let count = self.pop_index()?;
                let x = self.pop()?.as_bytes_array()?;
                let mut out = Vec::with_capacity(x.len());
                for slot in x {
                    if count > slot.len() {
                        return Err(VmFault::InvalidOperand("left"));
                    }
                    out.push(slot[..count].to_vec());
                }
                self.push_checked(StackItem::Bytes(Rc::new(out)))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::RIGHT => {
                let count = self.pop_index()?;
                let x = self.pop()?.as_bytes_array()?;
                let mut out = Vec::with_capacity(x.len());
                for slot in x {
                    if count > slot.len() {
                        return Err(VmFault::InvalidOperand("right"));
                    }
                    out.push(slot[slot.len() - count..].to_vec());
                }
                self.push_checked(StackItem::Bytes(Rc::new(out)))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::SIZE => {
                let x = self.pop()?.as_bytes_array()?;
                let sizes: Vec<BigInt> = x.iter().map(|s| BigInt::from(s.len())).collect();
                self.push_checked(StackItem::Int(Rc::new(sizes)))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }

            // --- bitwise ---------------------------------------------
            opcode::INVERT => {
                self.elementwise_int1(op_pc, |a| -a - BigInt::from(1))
            }
            opcode::AND => self.elementwise_int2(op_pc, |a, b| Ok(bitwise_binary(a, b, |x, y| x & y))),
            opcode::OR => self.elementwise_int2(op_pc, |a, b| Ok(bitwise_binary(a, b, |x, y| x | y))),
            opcode::XOR => self.elementwise_int2(op_pc, |a, b| Ok(bitwise_binary(a, b, |x, y| x ^ y))),
            opcode::EQUAL => {
                let b = self.pop()?.as_bytes_array()?;
                let a = self.pop()?.as_bytes_array()?;
                if a.len() != b.len() {
                    return Err(VmFault::ElementCountMismatch);
                }
                let result: Vec<bool> = a.into_iter().zip(b.into_iter()).map(|(x, y)| x == y).collect();
                self.push_checked(StackItem::Bool(Rc::new(result)))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }

            // --- arithmetic -------------------------------------------
            opcode::ONEADD => self.elementwise_int1(op_pc, |a| a + BigInt::from(1)),
            opcode::ONESUB => self.elementwise_int1(op_pc, |a| a - BigInt::from(1)),
            opcode::TWOMUL => self.elementwise_int1(op_pc, |a| a * BigInt::from(2)),
            opcode::TWODIV => self.elementwise_int1(op_pc, |a| a / BigInt::from(2)),
            opcode::NEGATE => self.elementwise_int1(op_pc, |a| -a),
            opcode::ABS => self.elementwise_int1(op_pc, |a| a.abs()),
            opcode::NOT => self.elementwise_bool1(op_pc, |a| !a),
            opcode::ZERONOTEQUAL => self.elementwise_bool_from_int1(op_pc, |a| !a.is_zero()),
            opcode::ADD => self.elementwise_int2(op_pc, |a, b| Ok(a + b)),
            opcode::SUB => self.elementwise_int2(op_pc, |a, b| Ok(a - b)),
            opcode::MUL => self.elementwise_int2(op_pc, |a, b| Ok(a * b)),
            opcode::DIV => self.elementwise_int2(op_pc, |a, b| {
                if b.is_zero() {
                    Err(VmFault::InvalidOperand("division by zero"))
                } else {
                    Ok(a / b)
                }
            }),
            opcode::MOD => self.elementwise_int2(op_pc, |a, b| {
                if b.is_zero() {
                    Err(VmFault::InvalidOperand("modulo by zero"))
                } else {
                    Ok(a % b)
                }
            }),
            opcode::LSHIFT => self.elementwise_int2(op_pc, |a, b| {
                let shift = shift_amount(b)?;
                Ok(a << shift)
            }),
            opcode::RSHIFT => self.elementwise_int2(op_pc, |a, b| {
                let shift = shift_amount(b)?;
                Ok(a >> shift)
            }),
            opcode::BOOLAND => self.elementwise_bool2(op_pc, |a, b| a && b),
            opcode::BOOLOR => self.elementwise_bool2(op_pc, |a, b| a || b),
            opcode::NUMEQUAL => self.elementwise_int2_bool(op_pc, |a, b| a == b),
            opcode::NUMNOTEQUAL => self.elementwise_int2_bool(op_pc, |a, b| a != b),
            opcode::LESSTHAN => self.elementwise_int2_bool(op_pc, |a, b| a < b),
            opcode::GREATERTHAN => self.elementwise_int2_bool(op_pc, |a, b| a > b),
            opcode::LESSTHANOREQUAL => self.elementwise_int2_bool(op_pc, |a, b| a <= b),
            opcode::GREATERTHANOREQUAL => self.elementwise_int2_bool(op_pc, |a, b| a >= b),
            opcode::MIN => self.elementwise_int2(op_pc, |a, b| Ok(a.clone().min(b.clone()))),
            opcode::MAX => self.elementwise_int2(op_pc, |a, b| Ok(a.clone().max(b.clone()))),
            opcode::WITHIN => {
                let max = self.pop()?.as_int_array()?;
                let min = self.pop()?.as_int_array()?;
                let value = self.pop()?.as_int_array()?;
                if max.len() != min.len() || min.len() != value.len() {
                    return Err(VmFault::ElementCountMismatch);
                }
                let result: Vec<bool> = value
                    .iter()
                    .zip(min.iter())
                    .zip(max.iter())
                    .map(|((v, lo), hi)| v >= lo && v < hi)
                    .collect();
                self.push_checked(StackItem::Bool(Rc::new(result)))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }

            // --- crypto ------------------------------------------------
            opcode::SHA1 => self.elementwise_hash(op_pc, |c, b| c.sha1(b).to_vec()),
            opcode::SHA256 => self.elementwise_hash(op_pc, |c, b| c.sha256(b).to_vec()),
            opcode::HASH160 => self.elementwise_hash(op_pc, |c, b| c.hash160(b).to_vec()),
            opcode::HASH256 => self.elementwise_hash(op_pc, |c, b| c.hash256(b).to_vec()),
            opcode::CHECKSIG => {
                let pubkey = self.pop()?.single_bytes_pub()?;
                let signature = self.pop()?.single_bytes_pub()?;
                let message = self.signable.message();
                let ok = self.crypto.verify(&message, &signature, &pubkey);
                self.push_checked(StackItem::from_bool(ok))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::CHECKMULTISIG => {
                let n = self.pop_index()?;
                if n < 1 {
                    return Err(VmFault::InvalidOperand("checkmultisig: n < 1"));
                }
                self.add_steps(n as u64)?;
                let mut keys_popped = Vec::with_capacity(n);
                for _ in 0..n {
                    keys_popped.push(self.pop()?.single_bytes_pub()?);
                }
                keys_popped.reverse();
                let m = self.pop_index()?;
                if m < 1 || m > n {
                    return Err(VmFault::InvalidOperand("checkmultisig: m out of range"));
                }
                let mut sigs_popped = Vec::with_capacity(m);
                for _ in 0..m {
                    sigs_popped.push(self.pop()?.single_bytes_pub()?);
                }
                sigs_popped.reverse();
                let message = self.signable.message();
                let mut si = 0usize;
                let mut ki = 0usize;
                let mut ok = true;
                while si < sigs_popped.len() && ki < keys_popped.len() {
                    if sigs_popped.len() - si > keys_popped.len() - ki {
                        ok = false;
                        break;
                    }
                    if self.crypto.verify(&message, &sigs_popped[si], &keys_popped[ki]) {
                        si += 1;
                    }
                    ki += 1;
                }
                if si < sigs_popped.len() {
                    ok = false;
                }
                self.push_checked(StackItem::from_bool(ok))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }

            // --- collection ---------------------------------------------
            opcode::ARRAYSIZE => {
                let x = self.pop()?;
                self.push_checked(StackItem::from_int(x.count() as i64))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::PACK => {
                let c = self.pop_index()?;
                let mut items = Vec::with_capacity(c);
                for _ in 0..c {
                    items.push(self.pop()?);
                }
                items.reverse();
                self.push_checked(StackItem::from_array(items))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::UNPACK => {
                let arr = self.pop()?.as_array()?;
                let n = arr.len();
                for item in arr.iter() {
                    self.push_checked(item.clone())?;
                }
                self.push_checked(StackItem::from_int(n as i64))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::PICKITEM => {
                let idx = self.pop_index()?;
                let x = self.pop()?;
                let result = match &x {
                    StackItem::Array(items) => {
                        items.get(idx).cloned().ok_or(VmFault::InvalidOperand("pickitem: index out of range"))?
                    }
                    _ => {
                        let slot = x.single_bytes_pub()?;
                        let b = *slot.get(idx).ok_or(VmFault::InvalidOperand("pickitem: index out of range"))?;
                        StackItem::from_int(b as i64)
                    }
                };
                self.push_checked(result)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::DISTINCT => {
                let x = self.pop()?;
                self.push_checked(distinct(&x))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::SORT => {
                let mut ints = self.pop()?.as_int_array()?;
                ints.sort();
                self.push_checked(StackItem::Int(Rc::new(ints)))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::REVERSE => {
                let x = self.pop()?;
                self.push_checked(reverse(&x))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::CONCAT => {
                let items = self.pop_n_in_order(self.pop_index()?, true)?;
                self.push_checked(concat_items(items)?)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::UNION => {
                let items = self.pop_n_in_order(self.pop_index()?, true)?;
                let joined = concat_items(items)?;
                self.push_checked(distinct(&joined))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::INTERSECT => {
                let items = self.pop_n_in_order(self.pop_index()?, false)?;
                self.push_checked(intersect_items(items)?)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::EXCEPT => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push_checked(except_items(&a, &b)?)?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::TAKE => {
                let count = self.pop_index()?;
                let x = self.pop()?;
                self.push_checked(take(&x, count))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::SKIP => {
                let count = self.pop_index()?;
                let x = self.pop()?;
                self.push_checked(skip(&x, count))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::ALL => {
                let x = self.pop()?.as_bool_array()?;
                self.push_checked(StackItem::from_bool(x.into_iter().all(|b| b)))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::ANY => {
                let x = self.pop()?.as_bool_array()?;
                self.push_checked(StackItem::from_bool(x.into_iter().any(|b| b)))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::SUM => {
                let x = self.pop()?.as_int_array()?;
                let sum = x.into_iter().fold(BigInt::zero(), |acc, v| acc + v);
                self.push_checked(StackItem::from_int(sum))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::AVERAGE => {
                let x = self.pop()?.as_int_array()?;
                if x.is_empty() {
                    return Err(VmFault::EmptyAverage);
                }
                let len = x.len();
                let sum = x.into_iter().fold(BigInt::zero(), |acc, v| acc + v);
                self.push_checked(StackItem::from_int(sum / BigInt::from(len)))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::MAXITEM => {
                let x = self.pop()?.as_int_array()?;
                let max = x.into_iter().max().ok_or(VmFault::InvalidOperand("maxitem: empty"))?;
                self.push_checked(StackItem::from_int(max))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }
            opcode::MINITEM => {
                let x = self.pop()?.as_int_array()?;
                let min = x.into_iter().min().ok_or(VmFault::InvalidOperand("minitem: empty"))?;
                self.push_checked(StackItem::from_int(min))?;
                self.advance(op_pc + 1);
                Ok(VmOutcome::Continue)
            }

            _ => Err(VmFault::UnknownOpcode(op)),
        }
    }

    fn advance(&mut self, pc: usize) {
        self.frames.last_mut().expect("frame present").pc = pc;
    }

    /// Pop an integer operand used as a count/index, rejecting
    /// negative or unrepresentable values.
    fn pop_index(&mut self) -> Result<usize, VmFault> {
        let n = self.pop()?.to_int()?;
        n.to_usize().ok_or(VmFault::InvalidOperand("negative or oversized count/index"))
    }

    /// Pop `n` items in pop order, then put them in original push
    /// order ("reverse pop order" per §4.1.4). When `allow_zero` is
    /// false, `n == 0` faults (used by `CONCAT`/`UNION`; `PACK`
    /// permits zero by calling its own loop directly).
    fn pop_n_in_order(&mut self, n: usize, require_nonzero: bool) -> Result<Vec<StackItem>, VmFault> {
        if require_nonzero && n == 0 {
            return Err(VmFault::InvalidOperand("count must be >= 1"));
        }
        let mut items = Vec::with_capacity(n);
        for _ in 0..n {
            items.push(self.pop()?);
        }
        items.reverse();
        Ok(items)
    }

    fn elementwise_int1(&mut self, op_pc: usize, f: impl Fn(&BigInt) -> BigInt) -> Result<VmOutcome, VmFault> {
        let a = self.pop()?.as_int_array()?;
        let result: Vec<BigInt> = a.iter().map(f).collect();
        self.push_checked(StackItem::Int(Rc::new(result)))?;
        self.advance(op_pc + 1);
        Ok(VmOutcome::Continue)
    }

    fn elementwise_bool1(&mut self, op_pc: usize, f: impl Fn(bool) -> bool) -> Result<VmOutcome, VmFault> {
        let a = self.pop()?.as_bool_array()?;
        let result: Vec<bool> = a.into_iter().map(f).collect();
        self.push_checked(StackItem::Bool(Rc::new(result)))?;
        self.advance(op_pc + 1);
        Ok(VmOutcome::Continue)
    }

    fn elementwise_bool_from_int1(&mut self, op_pc: usize, f: impl Fn(&BigInt) -> bool) -> Result<VmOutcome, VmFault> {
        let a = self.pop()?.as_int_array()?;
        let result: Vec<bool> = a.iter().map(f).collect();
        self.push_checked(StackItem::Bool(Rc::new(result)))?;
        self.advance(op_pc + 1);
        Ok(VmOutcome::Continue)
    }

    fn elementwise_int2(
        &mut self,
        op_pc: usize,
        f: impl Fn(&BigInt, &BigInt) -> Result<BigInt, VmFault>,
    ) -> Result<VmOutcome, VmFault> {
        let b = self.pop()?.as_int_array()?;
        let a = self.pop()?.as_int_array()?;
        if a.len() != b.len() {
            return Err(VmFault::ElementCountMismatch);
        }
        let result: Result<Vec<BigInt>, VmFault> = a.iter().zip(b.iter()).map(|(x, y)| f(x, y)).collect();
        self.push_checked(StackItem::Int(Rc::new(result?)))?;
        self.advance(op_pc + 1);
        Ok(VmOutcome::Continue)
    }

    fn elementwise_int2_bool(&mut self, op_pc: usize, f: impl Fn(&BigInt, &BigInt) -> bool) -> Result<VmOutcome, VmFault> {
        let b = self.pop()?.as_int_array()?;
        let a = self.pop()?.as_int_array()?;
        if a.len() != b.len() {
            return Err(VmFault::ElementCountMismatch);
        }
        let result: Vec<bool> = a.iter().zip(b.iter()).map(|(x, y)| f(x, y)).collect();
        self.push_checked(StackItem::Bool(Rc::new(result)))?;
        self.advance(op_pc + 1);
        Ok(VmOutcome::Continue)
    }

    fn elementwise_bool2(&mut self, op_pc: usize, f: impl Fn(bool, bool) -> bool) -> Result<VmOutcome, VmFault> {
        let b = self.pop()?.as_bool_array()?;
        let a = self.pop()?.as_bool_array()?;
        if a.len() != b.len() {
            return Err(VmFault::ElementCountMismatch);
        }
        let result: Vec<bool> = a.into_iter().zip(b.into_iter()).map(|(x, y)| f(x, y)).collect();
        self.push_checked(StackItem::Bool(Rc::new(result)))?;
        self.advance(op_pc + 1);
        Ok(VmOutcome::Continue)
    }

    fn elementwise_hash(&mut self, op_pc: usize, f: impl Fn(&dyn Crypto, &[u8]) -> Vec<u8>) -> Result<VmOutcome, VmFault> {
        let x = self.pop()?.as_bytes_array()?;
        let result: Vec<Vec<u8>> = x.iter().map(|b| f(self.crypto.as_ref(), b)).collect();
        self.push_checked(StackItem::Bytes(Rc::new(result)))?;
        self.advance(op_pc + 1);
        Ok(VmOutcome::Continue)
    }
}

impl StackItem {
    /// The single byte-string slot of a count-1 item, for opcodes
    /// (`CHECKSIG`, `CHECKMULTISIG`, `APPCALL`) that require scalar
    /// byte-string operands rather than an elementwise view.
    fn single_bytes_pub(&self) -> Result<Vec<u8>, VmFault> {
        let mut bytes = self.as_bytes_array()?;
        if bytes.len() != 1 {
            return Err(VmFault::TypeMismatch("expected a scalar byte-string"));
        }
        Ok(bytes.remove(0))
    }
}

fn jump_target(op_pc: usize, displacement: i16, script_len: usize) -> Result<usize, VmFault> {
    let target = op_pc as i64 + displacement as i64;
    if target < 0 || target as usize > script_len {
        return Err(VmFault::InvalidJumpTarget);
    }
    Ok(target as usize)
}

fn shift_amount(n: &BigInt) -> Result<u32, VmFault> {
    n.to_u32().ok_or(VmFault::InvalidOperand("shift amount"))
}

fn bitwise_binary(a: &BigInt, b: &BigInt, f: impl Fn(u8, u8) -> u8) -> BigInt {
    let mut ab = encode_canonical_int(a);
    let mut bb = encode_canonical_int(b);
    let sign_a = if a.sign() == Sign::Minus { 0xffu8 } else { 0x00u8 };
    let sign_b = if b.sign() == Sign::Minus { 0xffu8 } else { 0x00u8 };
    let len = ab.len().max(bb.len()).max(1);
    ab.resize(len, sign_a);
    bb.resize(len, sign_b);
    let result: Vec<u8> = ab.iter().zip(bb.iter()).map(|(x, y)| f(*x, *y)).collect();
    decode_canonical_int(&result)
}

fn dedupe<T: Clone + PartialEq>(v: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in v {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

fn distinct(x: &StackItem) -> StackItem {
    match x {
        StackItem::Bytes(v) => StackItem::Bytes(Rc::new(dedupe(v))),
        StackItem::Int(v) => StackItem::Int(Rc::new(dedupe(v))),
        StackItem::Bool(v) => StackItem::Bool(Rc::new(dedupe(v))),
        StackItem::Array(v) => StackItem::Array(Rc::new(dedupe(v))),
    }
}

fn reverse(x: &StackItem) -> StackItem {
    match x {
        StackItem::Bytes(v) => StackItem::Bytes(Rc::new(v.iter().rev().cloned().collect())),
        StackItem::Int(v) => StackItem::Int(Rc::new(v.iter().rev().cloned().collect())),
        StackItem::Bool(v) => StackItem::Bool(Rc::new(v.iter().rev().cloned().collect())),
        StackItem::Array(v) => StackItem::Array(Rc::new(v.iter().rev().cloned().collect())),
    }
}

fn take(x: &StackItem, n: usize) -> StackItem {
    match x {
        StackItem::Bytes(v) => StackItem::Bytes(Rc::new(v.iter().take(n).cloned().collect())),
        StackItem::Int(v) => StackItem::Int(Rc::new(v.iter().take(n).cloned().collect())),
        StackItem::Bool(v) => StackItem::Bool(Rc::new(v.iter().take(n).cloned().collect())),
        StackItem::Array(v) => StackItem::Array(Rc::new(v.iter().take(n).cloned().collect())),
    }
}

fn skip(x: &StackItem, n: usize) -> StackItem {
    match x {
        StackItem::Bytes(v) => StackItem::Bytes(Rc::new(v.iter().skip(n).cloned().collect())),
        StackItem::Int(v) => StackItem::Int(Rc::new(v.iter().skip(n).cloned().collect())),
        StackItem::Bool(v) => StackItem::Bool(Rc::new(v.iter().skip(n).cloned().collect())),
        StackItem::Array(v) => StackItem::Array(Rc::new(v.iter().skip(n).cloned().collect())),
    }
}

/// Concatenate several same-kind items' element slots together,
/// preserving the operand order (the caller has already reversed pop
/// order back into push order).
fn concat_items(items: Vec<StackItem>) -> Result<StackItem, VmFault> {
    let first = items.first().ok_or(VmFault::InvalidOperand("concat: no operands"))?;
    match first {
        StackItem::Bytes(_) => {
            let mut out = Vec::new();
            for item in &items {
                match item {
                    StackItem::Bytes(v) => out.extend(v.iter().cloned()),
                    _ => return Err(VmFault::TypeMismatch("concat: mismatched operand kinds")),
                }
            }
            Ok(StackItem::Bytes(Rc::new(out)))
        }
        StackItem::Int(_) => {
            let mut out = Vec::new();
            for item in &items {
                match item {
                    StackItem::Int(v) => out.extend(v.iter().cloned()),
                    _ => return Err(VmFault::TypeMismatch("concat: mismatched operand kinds")),
                }
            }
            Ok(StackItem::Int(Rc::new(out)))
        }
        StackItem::Bool(_) => {
            let mut out = Vec::new();
            for item in &items {
                match item {
                    StackItem::Bool(v) => out.extend(v.iter().cloned()),
                    _ => return Err(VmFault::TypeMismatch("concat: mismatched operand kinds")),
                }
            }
            Ok(StackItem::Bool(Rc::new(out)))
        }
        StackItem::Array(_) => {
            let mut out = Vec::new();
            for item in &items {
                match item {
                    StackItem::Array(v) => out.extend(v.iter().cloned()),
                    _ => return Err(VmFault::TypeMismatch("concat: mismatched operand kinds")),
                }
            }
            Ok(StackItem::Array(Rc::new(out)))
        }
    }
}

fn intersect_items(items: Vec<StackItem>) -> Result<StackItem, VmFault> {
    let mut iter = items.into_iter();
    let mut acc = iter.next().ok_or(VmFault::InvalidOperand("intersect: no operands"))?;
    for item in iter {
        acc = intersection_binary(&acc, &item)?;
    }
    Ok(acc)
}

/// Slots of `a` that are also present in `b`, preserving `a`'s order
/// and kind. Building block for the multi-way `INTERSECT` opcode.
fn intersection_binary(a: &StackItem, b: &StackItem) -> Result<StackItem, VmFault> {
    match (a, b) {
        (StackItem::Bytes(av), StackItem::Bytes(bv)) => {
            Ok(StackItem::Bytes(Rc::new(av.iter().filter(|x| bv.contains(x)).cloned().collect())))
        }
        (StackItem::Int(av), StackItem::Int(bv)) => {
            Ok(StackItem::Int(Rc::new(av.iter().filter(|x| bv.contains(x)).cloned().collect())))
        }
        (StackItem::Bool(av), StackItem::Bool(bv)) => {
            Ok(StackItem::Bool(Rc::new(av.iter().filter(|x| bv.contains(x)).cloned().collect())))
        }
        (StackItem::Array(av), StackItem::Array(bv)) => {
            Ok(StackItem::Array(Rc::new(av.iter().filter(|x| bv.contains(x)).cloned().collect())))
        }
        _ => Err(VmFault::TypeMismatch("intersect: mismatched operand kinds")),
    }
}

/// Slots of `a` that are *not* present in `b`, preserving `a`'s order
/// and kind. Implements the binary `EXCEPT` opcode (first minus
/// second).
fn except_items(a: &StackItem, b: &StackItem) -> Result<StackItem, VmFault> {
    match (a, b) {
        (StackItem::Bytes(av), StackItem::Bytes(bv)) => {
            Ok(StackItem::Bytes(Rc::new(av.iter().filter(|x| !bv.contains(x)).cloned().collect())))
        }
        (StackItem::Int(av), StackItem::Int(bv)) => {
            Ok(StackItem::Int(Rc::new(av.iter().filter(|x| !bv.contains(x)).cloned().collect())))
        }
        (StackItem::Bool(av), StackItem::Bool(bv)) => {
            Ok(StackItem::Bool(Rc::new(av.iter().filter(|x| !bv.contains(x)).cloned().collect())))
        }
        (StackItem::Array(av), StackItem::Array(bv)) => {
            Ok(StackItem::Array(Rc::new(av.iter().filter(|x| !bv.contains(x)).cloned().collect())))
        }
        _ => Err(VmFault::TypeMismatch("except: mismatched operand kinds")),
    }
}

fn read_u8(script: &[u8], pc: &mut usize) -> Result<u8, VmFault> {
    let b = *script.get(*pc).ok_or(VmFault::TruncatedScript)?;
    *pc += 1;
    Ok(b)
}

fn read_bytes(script: &[u8], pc: &mut usize, n: usize) -> Result<Vec<u8>, VmFault> {
    let end = pc.checked_add(n).ok_or(VmFault::TruncatedScript)?;
    let slice = script.get(*pc..end).ok_or(VmFault::TruncatedScript)?;
    let out = slice.to_vec();
    *pc = end;
    Ok(out)
}

fn read_u16_le(script: &[u8], pc: &mut usize) -> Result<u16, VmFault> {
    let bytes = read_bytes(script, pc, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_i16_le(script: &[u8], pc: &mut usize) -> Result<i16, VmFault> {
    let bytes = read_bytes(script, pc, 2)?;
    Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_i32_le(script: &[u8], pc: &mut usize) -> Result<i32, VmFault> {
    let bytes = read_bytes(script, pc, 4)?;
    Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_u32_le(script: &[u8], pc: &mut usize) -> Result<u32, VmFault> {
    let bytes = read_bytes(script, pc, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_varint(script: &[u8], pc: &mut usize) -> Result<u64, VmFault> {
    let head = read_u8(script, pc)?;
    match head {
        0xfd => Ok(read_u16_le(script, pc)? as u64),
        0xfe => Ok(read_u32_le(script, pc)? as u64),
        0xff => {
            let bytes = read_bytes(script, pc, 8)?;
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&bytes);
            Ok(u64::from_le_bytes(buf))
        }
        n => Ok(n as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script_table::InMemoryScriptTable;

    fn run(script: &[u8]) -> (bool, Interpreter) {
        let mut interp = Interpreter::for_tests();
        let ok = interp.execute_script(script, false);
        (ok, interp)
    }

    #[test]
    fn halts_and_leaves_one_plus_one_on_stack() {
        let script = [opcode::OP_1, opcode::OP_1, opcode::ADD, opcode::HALT];
        let (ok, interp) = run(&script);
        assert!(ok);
        assert_eq!(interp.eval_stack().last().unwrap().to_int().unwrap(), BigInt::from(2));
    }

    #[test]
    fn unknown_opcode_faults() {
        let (ok, _) = run(&[0xFF_u8 - 1]);
        assert!(!ok);
    }

    #[test]
    fn stack_underflow_on_add_faults() {
        let (ok, _) = run(&[opcode::ADD]);
        assert!(!ok);
    }

    #[test]
    fn jmp_skips_over_dead_code() {
        // JMP +5 (from the opcode's own start) lands past a PUSHBYTES1.
        let script = [opcode::JMP, 5, 0, opcode::PUSHBYTES1, 0xAA, opcode::OP_1, opcode::HALT];
        let (ok, interp) = run(&script);
        assert!(ok);
        assert_eq!(interp.eval_stack().len(), 1);
        assert_eq!(interp.eval_stack()[0].to_int().unwrap(), BigInt::from(1));
    }

    #[test]
    fn haltifnot_does_not_pop_on_false() {
        let script = [opcode::OP_0, opcode::HALTIFNOT];
        let mut interp = Interpreter::for_tests();
        let ok = interp.execute_script(&script, false);
        assert!(ok);
        assert_eq!(interp.eval_stack().len(), 1);
    }

    #[test]
    fn appcall_faults_on_unregistered_script() {
        let mut script = vec![opcode::APPCALL];
        script.extend_from_slice(&[0u8; 20]);
        let (ok, _) = run(&script);
        assert!(!ok);
    }

    #[test]
    fn appcall_runs_registered_callee_sharing_stack() {
        let callee = vec![opcode::OP_1, opcode::HALT];
        let mut table = InMemoryScriptTable::new();
        let hash = [7u8; 20];
        table.register(hash, callee);
        let mut interp = Interpreter::new(
            std::rc::Rc::new(crate::signable::FixedMessage::new(Vec::new())),
            std::rc::Rc::new(DefaultCrypto),
        )
        .with_script_table(std::rc::Rc::new(table));
        let mut script = vec![opcode::APPCALL];
        script.extend_from_slice(&hash);
        script.push(opcode::HALT);
        let ok = interp.execute_script(&script, false);
        assert!(ok);
        assert_eq!(interp.eval_stack().len(), 1);
    }

    #[test]
    fn pack_unpack_round_trip() {
        let script = [
            opcode::OP_1,
            opcode::OP_1NEGATE,
            opcode::OP_1 + 1, // pushes integer 2 (PACK count)
            opcode::PACK,
            opcode::UNPACK,
            opcode::HALT,
        ];
        let (ok, interp) = run(&script);
        assert!(ok);
        // two packed elements, plus the trailing length pushed by UNPACK
        assert_eq!(interp.eval_stack().len(), 3);
        assert_eq!(interp.eval_stack().last().unwrap().to_int().unwrap(), BigInt::from(2));
    }

    #[test]
    fn checkmultisig_one_of_one_succeeds_with_matching_signer() {
        use crate::crypto::Crypto as _;
        let crypto = DefaultCrypto;
        let secp = secp256k1::Secp256k1::new();
        let secret_key = secp256k1::SecretKey::from_slice(&[0x11u8; 32]).unwrap();
        let public_key = secp256k1::PublicKey::from_secret_key(&secp, &secret_key);
        let message = b"checkmultisig-test".to_vec();
        let digest = crypto.sha256(&message);
        let msg = secp256k1::Message::from_digest_slice(&digest).unwrap();
        let sig = secp.sign_ecdsa(&msg, &secret_key);
        let sig_bytes = sig.serialize_der().to_vec();
        let pubkey_bytes = public_key.serialize().to_vec();

        let mut interp = Interpreter::new(
            std::rc::Rc::new(crate::signable::FixedMessage::new(message)),
            std::rc::Rc::new(crypto),
        );
        interp.push(StackItem::from_bytes(sig_bytes));
        interp.push(StackItem::from_int(1));
        interp.push(StackItem::from_bytes(pubkey_bytes));
        interp.push(StackItem::from_int(1));
        let outcome = interp.dispatch(&Rc::new(vec![opcode::CHECKMULTISIG]), opcode::CHECKMULTISIG, 0);
        assert!(matches!(outcome, Ok(VmOutcome::Continue)));
        assert!(interp.eval_stack().last().unwrap().to_bool().unwrap());
    }
}
