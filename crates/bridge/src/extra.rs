//! Per-object script-side state
//!
//! A native object can carry an "extra" table: a fresh script table held
//! alive by a registry reference, where scripts attach arbitrary state to
//! that object. Exactly one per owning object, created with it and released
//! with it.

use crate::bridge::ScriptBridge;
use crate::error::Result;
use mlua::{Lua, RegistryKey, Table, Value};

/// Registry reference to one native object's script-side state table
#[derive(Debug)]
pub struct ExtraTable {
    pub(crate) key: RegistryKey,
}

impl ExtraTable {
    pub(crate) fn to_lua<'lua>(&self, lua: &'lua Lua) -> mlua::Result<Value<'lua>> {
        lua.registry_value(&self.key)
    }
}

impl ScriptBridge {
    /// Create a fresh extra table for a native object.
    pub fn create_extra(&self) -> Result<ExtraTable> {
        let table = self.lua.create_table()?;
        Ok(ExtraTable {
            key: self.lua.create_registry_value(table)?,
        })
    }

    /// Borrow the script table behind an extra reference.
    pub fn extra_table(&self, extra: &ExtraTable) -> Result<Table<'_>> {
        Ok(self.lua.registry_value(&extra.key)?)
    }

    /// Release an extra reference. The owning object must not use it again.
    pub fn release_extra(&self, extra: ExtraTable) {
        let _ = self.lua.remove_registry_value(extra.key);
    }
}

#[cfg(test)]
mod tests {
    use crate::bridge::{BridgeConfig, ScriptBridge};
    use crate::marshal::ScriptValue;
    use crate::symbols::Symbol;

    #[test]
    fn extra_state_survives_across_accesses() {
        let bridge = ScriptBridge::new(BridgeConfig::default()).unwrap();
        let extra = bridge.create_extra().unwrap();

        bridge
            .extra_table(&extra)
            .unwrap()
            .set("frags", 17)
            .unwrap();
        let frags: i64 = bridge.extra_table(&extra).unwrap().get("frags").unwrap();
        assert_eq!(frags, 17);

        bridge.release_extra(extra);
    }

    #[test]
    fn extras_marshal_as_their_table() {
        let bridge = ScriptBridge::new(BridgeConfig::default()).unwrap();
        let extra = bridge.create_extra().unwrap();
        bridge
            .extra_table(&extra)
            .unwrap()
            .set("name", "grunt")
            .unwrap();

        bridge
            .exec(
                "setup",
                "hooks = { tick = function(obj) seen = obj.name end }",
            )
            .unwrap();
        bridge.call_hook(Symbol::Tick, &[ScriptValue::Object(&extra)]);

        let seen: String = bridge.lua().globals().get("seen").unwrap();
        assert_eq!(seen, "grunt");

        bridge.release_extra(extra);
    }

    #[test]
    fn each_object_gets_its_own_table() {
        let bridge = ScriptBridge::new(BridgeConfig::default()).unwrap();
        let first = bridge.create_extra().unwrap();
        let second = bridge.create_extra().unwrap();

        bridge.extra_table(&first).unwrap().set("id", 1).unwrap();
        bridge.extra_table(&second).unwrap().set("id", 2).unwrap();

        let id: i64 = bridge.extra_table(&first).unwrap().get("id").unwrap();
        assert_eq!(id, 1);

        bridge.release_extra(first);
        bridge.release_extra(second);
    }
}
