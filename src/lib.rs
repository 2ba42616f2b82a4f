//! Generate Cython wrappers for C++ classes, with ownership of every native object decided up
//! front so that nothing is released twice.

pub mod bind;
pub mod descriptor;
pub mod diagnostics;
pub mod emit;
pub mod generate;
pub mod ownership;
pub mod runtime;
