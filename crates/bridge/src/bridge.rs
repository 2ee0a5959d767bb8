//! Bridge context and protected call frames
//!
//! [`ScriptBridge`] is the single owner of the embedded runtime state: the
//! `Lua` instance, the interned symbol table, and the packet filter cache.
//! Every native call into the runtime goes through a protected frame so a
//! failure on either side of the boundary comes back as a value, never as an
//! unwind across it.
//!
//! # Thread Safety
//!
//! One native thread owns the bridge; the runtime handle is `!Send` and all
//! calls are synchronous. Concurrent use is a caller contract violation, not
//! a detected condition.

use crate::error::{BridgeError, Result};
use crate::filter::{FieldList, PacketId};
use crate::marshal::ScriptValue;
use crate::symbols::{Symbol, SymbolTable};
use mlua::Lua;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Bridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Optional cap on script memory, in bytes. `None` leaves the runtime
    /// unlimited.
    pub memory_limit: Option<usize>,
}

/// Bridge between the native host and the embedded script runtime
///
/// Created by [`ScriptBridge::new`] (which eagerly binds every fixed
/// symbol) and torn down by [`ScriptBridge::fini`], which releases every
/// registry value the bridge holds.
pub struct ScriptBridge {
    pub(crate) lua: Lua,
    pub(crate) symbols: SymbolTable,
    pub(crate) filters: Mutex<HashMap<PacketId, Arc<FieldList>>>,
    pub(crate) interest: Box<dyn Fn(PacketId) -> bool>,
}

impl ScriptBridge {
    /// Create a bridge and bind all fixed symbols.
    ///
    /// Must run before any other operation; symbol handles stay valid for
    /// the bridge's whole lifetime.
    pub fn new(config: BridgeConfig) -> Result<Self> {
        let lua = Lua::new();
        if let Some(limit) = config.memory_limit {
            lua.set_memory_limit(limit)?;
        }
        let symbols = SymbolTable::init(&lua)?;
        info!("script bridge initialized ({} symbols bound)", Symbol::ALL.len());
        Ok(Self {
            lua,
            symbols,
            filters: Mutex::new(HashMap::new()),
            interest: Box::new(|_| false),
        })
    }

    /// The underlying runtime handle, for host-side bindings.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// The interned symbol table.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Run a native closure against the runtime inside a protected frame.
    ///
    /// Structured native failures propagate as [`BridgeError::Native`] when
    /// the closure returns one (see [`BridgeError::native`]); a panic inside
    /// the closure surfaces as [`BridgeError::Unrecognized`]. Script-side
    /// runtime errors pass through unchanged, traceback included — the
    /// runtime installs a traceback handler on every protected call.
    ///
    /// This is the rethrow mode: the caller decides what to do with the
    /// error. Hot paths use [`ScriptBridge::protected_call_logged`] instead.
    pub fn protected_call<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Lua) -> Result<T>,
    {
        match panic::catch_unwind(AssertUnwindSafe(|| f(&self.lua))) {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Unrecognized),
        }
    }

    /// Protected call with a caller-supplied error handler.
    ///
    /// The handler receives the translated error and the call returns
    /// `None`; it must not raise.
    pub fn protected_call_with<T, F, H>(&self, f: F, handler: H) -> Option<T>
    where
        F: FnOnce(&Lua) -> Result<T>,
        H: FnOnce(&BridgeError),
    {
        match self.protected_call(f) {
            Ok(value) => Some(value),
            Err(err) => {
                handler(&err);
                None
            }
        }
    }

    /// Protected call in log-and-continue mode.
    ///
    /// A failure is reported through the diagnostic channel as
    /// `Error calling <label>: <error>` and swallowed, so one misbehaving
    /// script callback cannot stall the host's main loop.
    pub fn protected_call_logged<T, F>(&self, label: &str, f: F) -> Option<T>
    where
        F: FnOnce(&Lua) -> Result<T>,
    {
        self.protected_call_with(f, |err| error!("Error calling {}: {}", label, err))
    }

    /// Load and run a script chunk through the protected frame.
    pub fn exec(&self, name: &str, source: &str) -> Result<()> {
        self.protected_call(|lua| {
            lua.load(source).set_name(name).exec()?;
            Ok(())
        })
    }

    /// Tear the bridge down, releasing every held registry value.
    ///
    /// Fires the shutting-down hook first so scripts can observe whether
    /// this is a clean shutdown or an abnormal teardown.
    pub fn fini(self, error: bool) {
        self.call_hook(Symbol::ShuttingDown, &[ScriptValue::Bool(error)]);
        if error {
            warn!("script bridge shutting down after error");
        } else {
            info!("script bridge shutting down");
        }

        let Self {
            lua,
            symbols,
            filters,
            ..
        } = self;
        filters.into_inner().clear();
        symbols.fini(&lua);
        lua.expire_registry_values();
    }
}
