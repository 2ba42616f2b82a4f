//! Driving generation of a whole extension module
//!
//! [`generate`] is the main entry point: it binds every class of a descriptor set under some
//! [`Settings`], then renders whatever bound successfully.

mod errors;
mod generator;
mod renamer;
mod settings;

pub use errors::*;
pub use generator::*;
pub use renamer::*;
pub use settings::*;
