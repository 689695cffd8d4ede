//! Generic adapters between native signatures and the engine's calling
//! convention.
//!
//! Every adapter converts arguments left to right, runs the native code, and
//! converts the result back. Errors and panics never leave an adapter; the
//! trampoline in [`callback`] turns them into engine exceptions.

mod args;
pub(crate) mod callback;
mod constructor;
mod method;
mod native_fn;
mod property;

pub use args::{ArgCursor, FromParam, IntoJsResult};
pub use constructor::{Constructor, Fallible, Plain};
pub use method::{ClassMember, MutMethod, RefMethod};
pub use native_fn::NativeFunction;
pub use property::{Field, FieldMember};

pub(crate) use property::{getter, setter};
