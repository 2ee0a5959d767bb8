//! # Script Bridge
//!
//! Bridge layer between a native game server and its embedded Lua runtime.
//!
//! ## Features
//! - Protected call frames with native/script error translation
//! - Interned symbol cache for hot script-side names
//! - Ordered, type-tagged argument marshaling
//! - Optional named hooks with log-and-continue failure handling
//! - Per-packet-type field filters with a script-side skip veto
//! - Raw `(pointer, length)` buffer bindings with configurable policies
//!
//! ## Model
//!
//! One native thread owns a [`ScriptBridge`], which owns the runtime state
//! for its whole lifetime. Scripts observe host events through hooks,
//! intercept decoded packets through filters, and can veto packet
//! processing by setting the packet object's `skip` field. A misbehaving
//! script callback is logged and swallowed; it never stops native event or
//! packet processing.

pub mod bridge;
pub mod buffer;
pub mod error;
pub mod extra;
pub mod filter;
pub mod hooks;
pub mod marshal;
pub mod symbols;

pub use bridge::{BridgeConfig, ScriptBridge};
pub use buffer::{AllocStrategy, BufferBinding, OverflowPolicy, ResizePolicy};
pub use error::{BridgeError, Result};
pub use extra::ExtraTable;
pub use filter::{PacketField, PacketId};
pub use marshal::{push_args, ScriptValue};
pub use symbols::{Symbol, SymbolTable};
