//! Interned script-side symbols
//!
//! The bridge touches a small, fixed set of script-side names on hot paths:
//! metamethod markers, the hook and filter table names, the skip field.
//! Each one is interned as a registry-held string at init so repeated use
//! costs a registry lookup instead of a string allocation and hash.

use mlua::{Lua, RegistryKey, Value};
use std::fmt;

/// Fixed enumeration of interned symbols
///
/// Indexed access into the [`SymbolTable`] is O(1); the set is closed at
/// build time. Add the display name in [`Symbol::name`] when extending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// `__index` metamethod marker
    Index,
    /// `__newindex` metamethod marker
    NewIndex,
    /// `__metatable` protection marker
    Metatable,
    /// Global hook table name
    Hooks,
    /// Global packet filter table name
    PacketFilters,
    /// Skip/veto output field on packet objects
    Skip,
    /// Per-tick hook name
    Tick,
    /// Shutdown notification hook name
    ShuttingDown,
}

impl Symbol {
    /// Every symbol, in table order.
    pub const ALL: [Symbol; 8] = [
        Symbol::Index,
        Symbol::NewIndex,
        Symbol::Metatable,
        Symbol::Hooks,
        Symbol::PacketFilters,
        Symbol::Skip,
        Symbol::Tick,
        Symbol::ShuttingDown,
    ];

    /// The script-side display name.
    pub const fn name(self) -> &'static str {
        match self {
            Symbol::Index => "__index",
            Symbol::NewIndex => "__newindex",
            Symbol::Metatable => "__metatable",
            Symbol::Hooks => "hooks",
            Symbol::PacketFilters => "pf",
            Symbol::Skip => "skip",
            Symbol::Tick => "tick",
            Symbol::ShuttingDown => "shuttingdown",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Registry handles for every [`Symbol`], bound once at bridge init
///
/// Handles are immutable and valid for the bridge's whole lifetime; they are
/// released together during teardown.
pub struct SymbolTable {
    entries: Vec<RegistryKey>,
}

impl SymbolTable {
    /// Intern every symbol's display name into the runtime registry.
    pub(crate) fn init(lua: &Lua) -> mlua::Result<Self> {
        let mut entries = Vec::with_capacity(Symbol::ALL.len());
        for sym in Symbol::ALL {
            let interned = lua.create_string(sym.name())?;
            entries.push(lua.create_registry_value(interned)?);
        }
        Ok(Self { entries })
    }

    /// The interned script value for a symbol (push analog).
    pub fn value<'lua>(&self, lua: &'lua Lua, sym: Symbol) -> mlua::Result<Value<'lua>> {
        lua.registry_value(&self.entries[sym as usize])
    }

    /// The registry handle backing a symbol.
    pub fn key(&self, sym: Symbol) -> &RegistryKey {
        &self.entries[sym as usize]
    }

    /// Release every held registry handle.
    pub(crate) fn fini(self, lua: &Lua) {
        for key in self.entries {
            let _ = lua.remove_registry_value(key);
        }
    }
}
