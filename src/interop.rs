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

//! The `InteropDispatch` collaborator (§4.2): a name-keyed registry of
//! host callbacks invoked by `SYSCALL`.

use std::collections::HashMap;

use crate::interpreter::Interpreter;
use crate::item::StackItem;

pub const GET_SCRIPT_CONTAINER: &str = "System.ScriptEngine.GetScriptContainer";
pub const GET_EXECUTING_SCRIPT_HASH: &str = "System.ScriptEngine.GetExecutingScriptHash";
pub const GET_CALLING_SCRIPT_HASH: &str = "System.ScriptEngine.GetCallingScriptHash";
pub const GET_ENTRY_SCRIPT_HASH: &str = "System.ScriptEngine.GetEntryScriptHash";

type Handler = Box<dyn Fn(&mut Interpreter) -> bool>;

/// Registry of `SYSCALL`-invokable host callbacks. Registration is
/// idempotent: re-registering an existing name is a no-op that
/// reports failure; invoking an unknown name reports failure.
pub struct InteropDispatch {
    handlers: HashMap<String, Handler>,
}

impl InteropDispatch {
    /// A dispatch table with only the four reserved
    /// `System.ScriptEngine.*` methods registered.
    pub fn new() -> Self {
        let mut dispatch = InteropDispatch {
            handlers: HashMap::new(),
        };
        dispatch.register(GET_SCRIPT_CONTAINER, Box::new(get_script_container));
        dispatch.register(GET_EXECUTING_SCRIPT_HASH, Box::new(get_executing_script_hash));
        dispatch.register(GET_CALLING_SCRIPT_HASH, Box::new(get_calling_script_hash));
        dispatch.register(GET_ENTRY_SCRIPT_HASH, Box::new(get_entry_script_hash));
        dispatch
    }

    /// Register a handler under `name`. Returns `false` (and leaves
    /// the existing registration untouched) if `name` is already
    /// registered.
    pub fn register(&mut self, name: &str, handler: Handler) -> bool {
        if self.handlers.contains_key(name) {
            return false;
        }
        self.handlers.insert(name.to_string(), handler);
        true
    }

    /// Invoke the handler registered under `name`. Returns `false` if
    /// `name` is unregistered, or whatever the handler itself
    /// returns.
    pub fn invoke(&self, name: &str, interp: &mut Interpreter) -> bool {
        match self.handlers.get(name) {
            Some(handler) => handler(interp),
            None => false,
        }
    }
}

impl Default for InteropDispatch {
    fn default() -> Self {
        InteropDispatch::new()
    }
}

fn get_script_container(interp: &mut Interpreter) -> bool {
    let message = interp.signable_message();
    interp.push(StackItem::from_bytes(message));
    true
}

fn get_executing_script_hash(interp: &mut Interpreter) -> bool {
    let hash = interp.hash160(&interp.executing_script());
    interp.push(StackItem::from_bytes(hash.to_vec()));
    true
}

fn get_calling_script_hash(interp: &mut Interpreter) -> bool {
    let hash = interp.hash160(&interp.calling_script());
    interp.push(StackItem::from_bytes(hash.to_vec()));
    true
}

fn get_entry_script_hash(interp: &mut Interpreter) -> bool {
    let hash = interp.hash160(&interp.entry_script());
    interp.push(StackItem::from_bytes(hash.to_vec()));
    true
}
