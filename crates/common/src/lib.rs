pub mod diagnostics;
pub mod files;
pub mod panic;
mod span;

pub use span::Span;
