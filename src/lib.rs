//! # QuickJS Bridge
//!
//! Typed bindings between native Rust code and an embedded QuickJS engine.
//!
//! ## Features
//!
//! - **Conversions**: numbers, booleans, strings, vectors, options and JSON values
//!   move across the boundary through the [`ToJs`] / [`FromJs`] traits
//! - **Native functions**: any `Fn(A, B, ..) -> R` is exported as a script callable,
//!   including trailing [`Rest`] parameters
//! - **Classes**: native types become script classes with constructors,
//!   methods and getter/setter properties
//! - **Errors**: native failures and panics surface in script as catchable errors;
//!   script failures surface in Rust as [`BindingError`]
//! - **Lifetime**: engine objects own their native instances and drop them
//!   exactly once, in the garbage collector's finalizer
//!
//! ### Example
//!
//! ```ignore
//! use quickjs_bridge::{field, Context, EvalOptions, Runtime};
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: i32,
//! }
//!
//! let runtime = Runtime::new()?;
//! let context = Context::new(&runtime)?;
//! let module = context.add_module("app")?;
//! module.function("add", |a: i32, b: i32| a + b)?;
//! module
//!     .add_class::<Counter>("Counter")?
//!     .default_constructor()?
//!     .function("count", field!(Counter, count))?
//!     .function("bump", |this: &mut Counter| this.count += 1)?;
//!
//! context.eval(
//!     "import { add, Counter } from 'app'; globalThis.c = new Counter(); c.bump();",
//!     "<main>",
//!     EvalOptions::TYPE_MODULE,
//! )?;
//! ```
//!
//! ## Modules
//!
//! - [`runtime`] / [`context`]: engine lifetime
//! - [`convert`]: value conversions
//! - [`marshal`]: native call adapters
//! - [`class`]: native classes
//! - [`module`]: script-importable native modules

/// Core infrastructure: errors, diagnostic console and macros
pub mod core;
/// Configuration system
pub mod config;
/// Raw engine access
pub mod raw;
/// Engine runtime
pub mod runtime;
/// Script execution contexts
pub mod context;
/// Evaluation flags
pub mod eval;
/// Engine value handles
pub mod value;
/// Native ↔ engine conversions
pub mod convert;
/// Variadic trailing parameters
pub mod rest;
/// Native call adapters
pub mod marshal;
/// Native classes
pub mod class;
/// Native modules
pub mod module;
/// Script functions with native signatures
pub mod function;

pub use crate::class::{ClassBuilder, InstanceCell};
pub use crate::config::{BridgeConfig, EvalConfig, LoggingConfig, RuntimeConfig};
pub use crate::context::{Context, Ctx};
pub use crate::convert::{FromJs, JsCString, ToJs, TypeConverter};
pub use crate::core::console::init_logging;
pub use crate::core::{BindingError, BindingResult, Thrown};
pub use crate::eval::{EvalOptions, EvalType};
pub use crate::function::{IntoJsArgs, JsFunction};
pub use crate::marshal::{ClassMember, Constructor, Field, NativeFunction};
pub use crate::module::Module;
pub use crate::rest::Rest;
pub use crate::runtime::Runtime;
pub use crate::value::Value;
