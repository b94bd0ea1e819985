pub mod ast;
pub mod compiler;
pub mod diag;
pub mod loader;
pub mod logging;
