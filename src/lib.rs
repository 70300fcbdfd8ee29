pub mod config;
pub mod diagnostics;
pub mod formatter;
#[cfg(feature = "lsp")]
pub mod lsp;

pub use config::Invocation;
pub use config::Resolution;
pub use config::Settings;
pub use formatter::FormatError;
pub use formatter::FormatOutput;
pub use formatter::format;
