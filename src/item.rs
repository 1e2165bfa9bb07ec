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

//! The polymorphic, array-shaped script value.
//!
//! A [`StackItem`] is always, conceptually, a sequence of element
//! slots: a scalar push (e.g. `PUSHBYTES4`) produces a length-1
//! sequence, while `PACK`/`UNPACK` and friends operate on genuine
//! multi-element sequences. This lets arithmetic, bitwise and splice
//! opcodes be defined once, elementwise, regardless of whether their
//! operand came from a scalar push or a constructed array.

use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::Zero;

use crate::error::VmFault;

/// A script value. See the module documentation for the array-shaped
/// design.
#[derive(Clone, Debug, PartialEq)]
pub enum StackItem {
    /// A sequence of byte-strings.
    Bytes(Rc<Vec<Vec<u8>>>),
    /// A sequence of arbitrary-precision integers.
    Int(Rc<Vec<BigInt>>),
    /// A sequence of booleans.
    Bool(Rc<Vec<bool>>),
    /// A sequence of nested items.
    Array(Rc<Vec<StackItem>>),
}

/// Canonical little-endian two's-complement encoding of an integer.
/// The empty byte-string is the canonical encoding of zero.
pub fn encode_canonical_int(n: &BigInt) -> Vec<u8> {
    if n.is_zero() {
        Vec::new()
    } else {
        n.to_signed_bytes_le()
    }
}

/// Inverse of [`encode_canonical_int`]: the empty byte-string decodes
/// to zero.
pub fn decode_canonical_int(bytes: &[u8]) -> BigInt {
    if bytes.is_empty() {
        BigInt::zero()
    } else {
        BigInt::from_signed_bytes_le(bytes)
    }
}

fn bool_to_bytes(b: bool) -> Vec<u8> {
    if b {
        vec![1]
    } else {
        Vec::new()
    }
}

fn bytes_is_true(bytes: &[u8]) -> bool {
    bytes.iter().any(|b| *b != 0)
}

impl StackItem {
    /// Construct a scalar byte-string item.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        StackItem::Bytes(Rc::new(vec![bytes]))
    }

    /// Construct a scalar integer item.
    pub fn from_int<T: Into<BigInt>>(n: T) -> Self {
        StackItem::Int(Rc::new(vec![n.into()]))
    }

    /// Construct a scalar boolean item.
    pub fn from_bool(b: bool) -> Self {
        StackItem::Bool(Rc::new(vec![b]))
    }

    /// Construct an array item from already-built elements.
    pub fn from_array(items: Vec<StackItem>) -> Self {
        StackItem::Array(Rc::new(items))
    }

    /// Number of element slots this item carries.
    pub fn count(&self) -> usize {
        match self {
            StackItem::Bytes(v) => v.len(),
            StackItem::Int(v) => v.len(),
            StackItem::Bool(v) => v.len(),
            StackItem::Array(v) => v.len(),
        }
    }

    /// View this item as a sequence of raw byte-strings.
    pub fn as_bytes_array(&self) -> Result<Vec<Vec<u8>>, VmFault> {
        match self {
            StackItem::Bytes(v) => Ok((**v).clone()),
            StackItem::Int(v) => Ok(v.iter().map(encode_canonical_int).collect()),
            StackItem::Bool(v) => Ok(v.iter().copied().map(bool_to_bytes).collect()),
            StackItem::Array(v) => v.iter().map(StackItem::single_bytes).collect(),
        }
    }

    /// View this item as a sequence of integers.
    pub fn as_int_array(&self) -> Result<Vec<BigInt>, VmFault> {
        match self {
            StackItem::Bytes(v) => Ok(v.iter().map(|b| decode_canonical_int(b)).collect()),
            StackItem::Int(v) => Ok((**v).clone()),
            StackItem::Bool(v) => Ok(v
                .iter()
                .map(|b| if *b { BigInt::from(1) } else { BigInt::zero() })
                .collect()),
            StackItem::Array(v) => v.iter().map(StackItem::single_int).collect(),
        }
    }

    /// View this item as a sequence of booleans.
    pub fn as_bool_array(&self) -> Result<Vec<bool>, VmFault> {
        match self {
            StackItem::Bytes(v) => Ok(v.iter().map(|b| bytes_is_true(b)).collect()),
            StackItem::Int(v) => Ok(v.iter().map(|n| !n.is_zero()).collect()),
            StackItem::Bool(v) => Ok((**v).clone()),
            StackItem::Array(v) => v.iter().map(StackItem::single_bool).collect(),
        }
    }

    /// View this item as the sequence of its contained items. Only
    /// defined for the array kind.
    pub fn as_array(&self) -> Result<Rc<Vec<StackItem>>, VmFault> {
        match self {
            StackItem::Array(v) => Ok(v.clone()),
            _ => Err(VmFault::TypeMismatch("as_array")),
        }
    }

    /// Boolean coercion: the logical AND of `as_bool_array()`.
    pub fn to_bool(&self) -> Result<bool, VmFault> {
        Ok(self.as_bool_array()?.into_iter().all(|b| b))
    }

    /// Integer coercion: defined only when `count() == 1`.
    pub fn to_int(&self) -> Result<BigInt, VmFault> {
        if self.count() != 1 {
            return Err(VmFault::TypeMismatch("to_int: count != 1"));
        }
        Ok(self.as_int_array()?.remove(0))
    }

    /// The single byte-string slot of a count-1 item.
    fn single_bytes(&self) -> Result<Vec<u8>, VmFault> {
        if self.count() != 1 {
            return Err(VmFault::TypeMismatch("single_bytes: count != 1"));
        }
        Ok(self.as_bytes_array()?.remove(0))
    }

    /// The single integer slot of a count-1 item.
    fn single_int(&self) -> Result<BigInt, VmFault> {
        if self.count() != 1 {
            return Err(VmFault::TypeMismatch("single_int: count != 1"));
        }
        Ok(self.as_int_array()?.remove(0))
    }

    /// The single boolean slot of a count-1 item.
    fn single_bool(&self) -> Result<bool, VmFault> {
        if self.count() != 1 {
            return Err(VmFault::TypeMismatch("single_bool: count != 1"));
        }
        Ok(self.as_bool_array()?.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bytes_is_false_and_zero() {
        let item = StackItem::from_bytes(Vec::new());
        assert_eq!(item.to_bool().unwrap(), false);
        assert_eq!(item.to_int().unwrap(), BigInt::zero());
    }

    #[test]
    fn int_bytes_round_trip() {
        for n in [-1000i64, -1, 0, 1, 127, 128, 255, 256, 70000] {
            let big = BigInt::from(n);
            let bytes = encode_canonical_int(&big);
            assert_eq!(decode_canonical_int(&bytes), big);
        }
    }

    #[test]
    fn array_of_scalars_views_elementwise() {
        let arr = StackItem::from_array(vec![
            StackItem::from_int(1),
            StackItem::from_int(2),
            StackItem::from_int(3),
        ]);
        assert_eq!(arr.count(), 3);
        assert_eq!(
            arr.as_int_array().unwrap(),
            vec![BigInt::from(1), BigInt::from(2), BigInt::from(3)]
        );
    }

    #[test]
    fn array_view_faults_on_scalar() {
        let item = StackItem::from_int(5);
        assert!(item.as_array().is_err());
    }

    #[test]
    fn bool_coercion_is_and_of_elements() {
        let all_true = StackItem::from_array(vec![StackItem::from_bool(true), StackItem::from_bool(true)]);
        assert!(all_true.to_bool().unwrap());
        let has_false = StackItem::from_array(vec![StackItem::from_bool(true), StackItem::from_bool(false)]);
        assert!(!has_false.to_bool().unwrap());
    }
}
