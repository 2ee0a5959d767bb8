//! Hook dispatch
//!
//! Hooks are optional script-side callbacks keyed by name in the global hook
//! table. Scripts only define the hooks they care about; an absent entry is
//! a silent no-op. A failing hook is logged and swallowed so the native
//! event loop is never aborted by one misbehaving callback.

use crate::bridge::ScriptBridge;
use crate::marshal::{self, ScriptValue};
use crate::symbols::Symbol;
use mlua::{Function, Table};

impl ScriptBridge {
    /// Invoke the hook bound to an interned symbol, if any.
    ///
    /// Arguments are marshaled in order; no return values are expected.
    /// Failures are reported as `Error calling hook <name>: <error>` and do
    /// not propagate.
    pub fn call_hook(&self, hook: Symbol, args: &[ScriptValue<'_>]) {
        let label = format!("hook {}", hook.name());
        self.protected_call_logged(&label, |lua| {
            let hooks = lua
                .globals()
                .get::<_, Option<Table>>(self.symbols.value(lua, Symbol::Hooks)?)?;
            let Some(hooks) = hooks else { return Ok(()) };
            let callback = hooks.get::<_, Option<Function>>(self.symbols.value(lua, hook)?)?;
            let Some(callback) = callback else { return Ok(()) };
            callback.call::<_, ()>(marshal::push_args(lua, args)?)?;
            Ok(())
        });
    }

    /// Invoke a hook by arbitrary name.
    ///
    /// Same contract as [`ScriptBridge::call_hook`]; for names outside the
    /// fixed symbol set.
    pub fn call_hook_named(&self, name: &str, args: &[ScriptValue<'_>]) {
        let label = format!("hook {}", name);
        self.protected_call_logged(&label, |lua| {
            let hooks = lua
                .globals()
                .get::<_, Option<Table>>(self.symbols.value(lua, Symbol::Hooks)?)?;
            let Some(hooks) = hooks else { return Ok(()) };
            let callback = hooks.get::<_, Option<Function>>(name)?;
            let Some(callback) = callback else { return Ok(()) };
            callback.call::<_, ()>(marshal::push_args(lua, args)?)?;
            Ok(())
        });
    }
}
