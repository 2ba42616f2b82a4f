//! Rendering bound classes as Cython sources
//!
//! A module is three files: the `.pyx` with the wrapper classes, a `.pxd` declaring what the
//! wrappers call on the native side, and a `setup.py` to build the extension. Output depends only
//! on the bindings and settings, so regenerating unchanged descriptors gives identical files.

mod class;
mod declarations;
mod marshal;
mod module;
mod writer;

pub use class::ClassWriter;
pub use declarations::DeclarationsWriter;
pub use module::ModuleWriter;
pub use writer::PyWriter;
