//! tspec_checker: The tspec type checker.
//!
//! Turns bound syntax into a type graph: resolves references, instantiates
//! templates, links model and interface heritage, applies decorators and
//! checks default values, and reports what does not hold up.

mod assignability;
mod checker;
mod cycles;
mod decorators;
mod defaults;
mod heritage;
mod names;
mod numeric;
mod state;
pub mod stdlib;
mod templates;
mod types;
pub mod utils;
mod values;

pub use assignability::{Mismatch, Relation};
pub use checker::Checker;
pub use decorators::{DecoratorContext, DecoratorFn, ModuleRecord};
pub use names::{entity_name, namespace_full_name, type_name, value_name};
pub use numeric::{Numeric, NumericKind};
pub use state::{StateMaps, StateValue};
pub use types::*;
