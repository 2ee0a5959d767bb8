//! Packet field filtering
//!
//! Scripts intercept decoded packets through per-type filter callbacks in
//! the global filter table. For each intercepted packet the bridge builds a
//! packet object exposing the bound native fields, invokes the callback, and
//! reads back a boolean `skip` decision: `true` vetoes further native
//! processing of the packet.
//!
//! The comma-separated field-name literal is parsed exactly once per packet
//! type and cached, so parsing cost does not scale with traffic volume. An
//! interest pre-check lets uninteresting packet types bypass all script
//! interaction at native speed.

use crate::bridge::ScriptBridge;
use crate::error::Result;
use crate::symbols::Symbol;
use mlua::{FromLua, Function, IntoLua, Lua, RegistryKey, Table, Value};
use std::sync::Arc;
use tracing::{debug, error};

/// Packet type identifier, supplied by the host's protocol layer.
pub type PacketId = u16;

/// A parsed field descriptor: display name plus its interned name handle.
pub(crate) struct FieldName {
    pub(crate) name: String,
    pub(crate) key: RegistryKey,
}

/// Ordered field descriptors for one packet type.
pub(crate) type FieldList = Vec<FieldName>;

/// A native packet field the filter can expose to scripts.
///
/// Implemented for every `Clone` type with runtime conversions in both
/// directions (integers, floats, booleans, strings). Values are copied into
/// the packet object before the callback and written back after it, giving
/// scripts read/write access to the field.
pub trait PacketField {
    /// Copy the field value into the runtime.
    fn load<'lua>(&self, lua: &'lua Lua) -> mlua::Result<Value<'lua>>;

    /// Overwrite the field from the runtime value.
    fn store<'lua>(&mut self, lua: &'lua Lua, value: Value<'lua>) -> mlua::Result<()>;
}

impl<T> PacketField for T
where
    T: Clone + for<'lua> IntoLua<'lua> + for<'lua> FromLua<'lua>,
{
    fn load<'lua>(&self, lua: &'lua Lua) -> mlua::Result<Value<'lua>> {
        self.clone().into_lua(lua)
    }

    fn store<'lua>(&mut self, lua: &'lua Lua, value: Value<'lua>) -> mlua::Result<()> {
        *self = T::from_lua(value, lua)?;
        Ok(())
    }
}

impl ScriptBridge {
    /// Install the host's interest predicate.
    ///
    /// Called before any packet object construction; packet types it
    /// rejects never touch the runtime. The default predicate reports no
    /// interest at all.
    pub fn set_interest_test<F>(&mut self, test: F)
    where
        F: Fn(PacketId) -> bool + 'static,
    {
        self.interest = Box::new(test);
    }

    /// Run the filter for one intercepted packet.
    ///
    /// `literal` is the comma-separated field-name list, parsed once per
    /// packet type; `fields` are the bound native fields in declaration
    /// order. Returns the script's skip decision, `false` when the type is
    /// uninteresting, has no registered filter, or the callback failed.
    ///
    /// # Panics
    ///
    /// If the parsed name count does not match `fields.len()` — a caller
    /// contract violation, not a runtime condition.
    pub fn filter_packet(
        &self,
        ty: PacketId,
        literal: &str,
        fields: &mut [&mut dyn PacketField],
    ) -> bool {
        let names = match self.field_names(ty, literal) {
            Ok(names) => names,
            Err(err) => {
                error!("Error binding fields for pf[{}]: {}", ty, err);
                return false;
            }
        };
        assert_eq!(
            names.len(),
            fields.len(),
            "field literal {:?} names {} fields, {} bound",
            literal,
            names.len(),
            fields.len()
        );

        if !(self.interest)(ty) {
            return false;
        }

        let label = format!("pf[{}]", ty);
        self.protected_call_logged(&label, |lua| {
            let filters = lua
                .globals()
                .get::<_, Option<Table>>(self.symbols.value(lua, Symbol::PacketFilters)?)?;
            let Some(filters) = filters else {
                return Ok(false);
            };
            let callback = filters.get::<_, Option<Function>>(ty)?;
            let Some(callback) = callback else {
                return Ok(false);
            };

            let packet = lua.create_table()?;
            for (field_name, field) in names.iter().zip(fields.iter()) {
                let name: Value = lua.registry_value(&field_name.key)?;
                packet.raw_set(name, field.load(lua)?)?;
            }
            let skip_name = self.symbols.value(lua, Symbol::Skip)?;
            packet.raw_set(skip_name.clone(), false)?;

            callback.call::<_, ()>(packet.clone())?;

            let skip: bool = packet.raw_get(skip_name)?;
            // Write-back is best-effort: a bad assignment loses that one
            // field, never the already-computed skip decision.
            for (field_name, field) in names.iter().zip(fields.iter_mut()) {
                let stored = lua
                    .registry_value(&field_name.key)
                    .and_then(|name: Value| packet.raw_get(name))
                    .and_then(|value| field.store(lua, value));
                if let Err(err) = stored {
                    error!(
                        "Error writing back field {} for pf[{}]: {}",
                        field_name.name, ty, err
                    );
                }
            }
            Ok(skip)
        })
        .unwrap_or(false)
    }

    /// Cached field descriptors for a packet type, parsing on first access.
    fn field_names(&self, ty: PacketId, literal: &str) -> Result<Arc<FieldList>> {
        let mut cache = self.filters.lock();
        if let Some(names) = cache.get(&ty) {
            return Ok(names.clone());
        }
        let names = Arc::new(parse_field_literal(&self.lua, literal)?);
        debug!(
            "pf[{}] binds fields: {}",
            ty,
            names
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(",")
        );
        cache.insert(ty, names.clone());
        Ok(names)
    }
}

/// Parse a comma-separated field-name literal into descriptors, interning
/// each name in the runtime registry. Whitespace around names is ignored;
/// an empty literal yields no fields.
fn parse_field_literal(lua: &Lua, literal: &str) -> mlua::Result<FieldList> {
    literal
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            let interned = lua.create_string(name)?;
            Ok(FieldName {
                name: name.to_string(),
                key: lua.create_registry_value(interned)?,
            })
        })
        .collect()
}
