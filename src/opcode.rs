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

//! The one-byte opcode assignment for this VM's instruction set.
//!
//! The retrieved corpus for this exercise did not include an
//! authoritative byte table for this instruction set, but the literal
//! conformance vectors pin two bytes directly: `0x66` must decode as
//! `HALTIFNOT` and `0xa0` as `NUMEQUAL`. This module fixes one
//! internally-consistent assignment built around those two fixed
//! points — immediate pushes occupy the lowest block, `HALT` is the
//! last control opcode, and every mnemonic maps to exactly one byte
//! (see `DESIGN.md`).

// ===================================================================
// Constant push
// ===================================================================

pub const OP_0: u8 = 0x00;
// 0x01..=0x4B: PUSHBYTES1..PUSHBYTES75 (opcode value == length)
pub const PUSHBYTES1: u8 = 0x01;
pub const PUSHBYTES75: u8 = 0x4B;
pub const PUSHDATA1: u8 = 0x4C;
pub const PUSHDATA2: u8 = 0x4D;
pub const PUSHDATA4: u8 = 0x4E;
pub const OP_1NEGATE: u8 = 0x4F;
// 0x51..=0x60: OP_1..OP_16
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;

// ===================================================================
// Control
// ===================================================================

pub const NOP: u8 = 0x61;
pub const JMP: u8 = 0x62;
pub const JMPIF: u8 = 0x63;
pub const JMPIFNOT: u8 = 0x64;
pub const CALL: u8 = 0x65;
// HALTIFNOT is pinned at 0x66 by the literal conformance vectors
// (scenarios A-D all decode `66` as HALTIFNOT); RET/APPCALL/SYSCALL
// shift by one byte each to make room for it.
pub const HALTIFNOT: u8 = 0x66;
pub const RET: u8 = 0x67;
pub const APPCALL: u8 = 0x68;
pub const SYSCALL: u8 = 0x69;
pub const HALT: u8 = 0x6A;

// ===================================================================
// Stack
// ===================================================================

pub const TOALTSTACK: u8 = 0x6B;
pub const FROMALTSTACK: u8 = 0x6C;
pub const TWODROP: u8 = 0x6D;
pub const TWODUP: u8 = 0x6E;
pub const THREEDUP: u8 = 0x6F;
pub const TWOOVER: u8 = 0x70;
pub const TWOROT: u8 = 0x71;
pub const TWOSWAP: u8 = 0x72;
pub const IFDUP: u8 = 0x73;
pub const DEPTH: u8 = 0x74;
pub const DROP: u8 = 0x75;
pub const DUP: u8 = 0x76;
pub const NIP: u8 = 0x77;
pub const OVER: u8 = 0x78;
pub const PICK: u8 = 0x79;
pub const ROLL: u8 = 0x7A;
pub const ROT: u8 = 0x7B;
pub const SWAP: u8 = 0x7C;
pub const TUCK: u8 = 0x7D;

// ===================================================================
// Splice
// ===================================================================

pub const CAT: u8 = 0x7E;
pub const SUBSTR: u8 = 0x7F;
pub const LEFT: u8 = 0x80;
pub const RIGHT: u8 = 0x81;
pub const SIZE: u8 = 0x82;

// ===================================================================
// Bitwise
// ===================================================================

pub const INVERT: u8 = 0x83;
pub const AND: u8 = 0x84;
pub const OR: u8 = 0x85;
pub const XOR: u8 = 0x86;
pub const EQUAL: u8 = 0x87;

// ===================================================================
// Arithmetic
// ===================================================================

pub const ONEADD: u8 = 0x8B;
pub const ONESUB: u8 = 0x8C;
pub const TWOMUL: u8 = 0x8D;
pub const TWODIV: u8 = 0x8E;
pub const NEGATE: u8 = 0x8F;
pub const ABS: u8 = 0x90;
pub const NOT: u8 = 0x91;
pub const ZERONOTEQUAL: u8 = 0x92;
pub const ADD: u8 = 0x93;
pub const SUB: u8 = 0x94;
pub const MUL: u8 = 0x95;
pub const DIV: u8 = 0x96;
pub const MOD: u8 = 0x97;
pub const LSHIFT: u8 = 0x98;
pub const RSHIFT: u8 = 0x99;
pub const BOOLAND: u8 = 0x9A;
pub const BOOLOR: u8 = 0x9B;
// NUMEQUAL is pinned at 0xa0 by the literal conformance vectors
// (scenario C decodes `a0` as NUMEQUAL); NUMNOTEQUAL/LESSTHAN/
// GREATERTHAN/LESSTHANOREQUAL each shift down by one byte to make
// room for it at the end of the comparison run.
pub const NUMNOTEQUAL: u8 = 0x9C;
pub const LESSTHAN: u8 = 0x9D;
pub const GREATERTHAN: u8 = 0x9E;
pub const LESSTHANOREQUAL: u8 = 0x9F;
pub const NUMEQUAL: u8 = 0xA0;
pub const GREATERTHANOREQUAL: u8 = 0xA1;
pub const MIN: u8 = 0xA2;
pub const MAX: u8 = 0xA3;
pub const WITHIN: u8 = 0xA4;

// ===================================================================
// Crypto
// ===================================================================

pub const SHA1: u8 = 0xA7;
pub const SHA256: u8 = 0xA8;
pub const HASH160: u8 = 0xA9;
pub const HASH256: u8 = 0xAA;
pub const CHECKSIG: u8 = 0xAC;
pub const CHECKMULTISIG: u8 = 0xAE;

// ===================================================================
// Collection
// ===================================================================

pub const ARRAYSIZE: u8 = 0xC0;
pub const PACK: u8 = 0xC1;
pub const UNPACK: u8 = 0xC2;
pub const PICKITEM: u8 = 0xC3;
pub const DISTINCT: u8 = 0xC4;
pub const SORT: u8 = 0xC5;
pub const REVERSE: u8 = 0xC6;
pub const CONCAT: u8 = 0xC7;
pub const UNION: u8 = 0xC8;
pub const INTERSECT: u8 = 0xC9;
pub const EXCEPT: u8 = 0xCA;
pub const TAKE: u8 = 0xCB;
pub const SKIP: u8 = 0xCC;
pub const ALL: u8 = 0xCD;
pub const ANY: u8 = 0xCE;
pub const SUM: u8 = 0xCF;
pub const AVERAGE: u8 = 0xD0;
pub const MAXITEM: u8 = 0xD1;
pub const MINITEM: u8 = 0xD2;

/// True for every opcode which is a pure pusher (immediate push or
/// numeric constant), i.e. the opcodes permitted under `push_only`
/// script verification.
pub fn is_push(op: u8) -> bool {
    op <= OP_16 && op != 0x50
}

/// Number of bytes pushed by an immediate `PUSHBYTES1..75` opcode.
/// Returns `None` for any other opcode.
pub fn pushbytes_len(op: u8) -> Option<usize> {
    if (PUSHBYTES1..=PUSHBYTES75).contains(&op) {
        Some(op as usize)
    } else {
        None
    }
}
