//! Native types exposed to scripts as classes.

mod builder;
mod instance;
pub(crate) mod registry;

pub use builder::ClassBuilder;
pub use instance::InstanceCell;
pub use registry::class_id_of;
