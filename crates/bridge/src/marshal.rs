//! Argument marshaling
//!
//! Native argument lists cross into the runtime as an ordered sequence of
//! tagged values. Order is the calling convention: the script side reads
//! positional parameters exactly as they were pushed.

use crate::extra::ExtraTable;
use mlua::{Lua, MultiValue, RegistryKey, Value};

/// A single native argument, tagged by semantic type
#[derive(Debug)]
pub enum ScriptValue<'a> {
    /// Absent value
    Nil,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point
    Number(f64),
    /// String, converted on push
    Str(&'a str),
    /// Opaque registry handle, pushed as whatever value it holds alive
    Handle(&'a RegistryKey),
    /// A bound object's script-side state table
    Object(&'a ExtraTable),
}

impl ScriptValue<'_> {
    /// Convert to a runtime value.
    pub fn to_lua<'lua>(&self, lua: &'lua Lua) -> mlua::Result<Value<'lua>> {
        Ok(match self {
            ScriptValue::Nil => Value::Nil,
            ScriptValue::Bool(b) => Value::Boolean(*b),
            ScriptValue::Int(n) => Value::Integer(*n),
            ScriptValue::Number(n) => Value::Number(*n),
            ScriptValue::Str(s) => Value::String(lua.create_string(s)?),
            ScriptValue::Handle(key) => lua.registry_value(key)?,
            ScriptValue::Object(extra) => extra.to_lua(lua)?,
        })
    }
}

/// Convert an argument list, left to right, preserving order exactly.
pub fn push_args<'lua>(lua: &'lua Lua, args: &[ScriptValue<'_>]) -> mlua::Result<MultiValue<'lua>> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(arg.to_lua(lua)?);
    }
    Ok(MultiValue::from_vec(values))
}

#[cfg(test)]
mod tests {
    use crate::bridge::{BridgeConfig, ScriptBridge};
    use super::*;
    use mlua::Function;

    #[test]
    fn arguments_keep_their_order() {
        let bridge = ScriptBridge::new(BridgeConfig::default()).unwrap();
        let lua = bridge.lua();

        let join: Function = lua
            .load("function(...) return table.concat({...}, '|') end")
            .eval()
            .unwrap();

        let args = push_args(
            lua,
            &[
                ScriptValue::Int(1),
                ScriptValue::Str("two"),
                ScriptValue::Number(3.5),
            ],
        )
        .unwrap();

        let joined: String = join.call(args).unwrap();
        assert_eq!(joined, "1|two|3.5");
    }

    #[test]
    fn handles_push_the_registered_value() {
        let bridge = ScriptBridge::new(BridgeConfig::default()).unwrap();
        let lua = bridge.lua();

        let key = lua
            .create_registry_value(lua.create_string("held").unwrap())
            .unwrap();
        let value = ScriptValue::Handle(&key).to_lua(lua).unwrap();

        match value {
            Value::String(s) => assert_eq!(s.to_str().unwrap(), "held"),
            other => panic!("expected interned string, got {:?}", other),
        }
    }

    #[test]
    fn nil_and_bool_convert_directly() {
        let bridge = ScriptBridge::new(BridgeConfig::default()).unwrap();
        let lua = bridge.lua();

        assert_eq!(ScriptValue::Nil.to_lua(lua).unwrap(), Value::Nil);
        assert_eq!(
            ScriptValue::Bool(true).to_lua(lua).unwrap(),
            Value::Boolean(true)
        );
    }
}
