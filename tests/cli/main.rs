//! CLI integration tests for lua-format-ls.
//!
//! These tests execute the compiled binary and verify CLI behavior including:
//! - Subcommand behavior (format, lsp)
//! - Stdin/stdout handling
//! - Exit codes
//! - File I/O operations
//! - Error handling
//!
//! The external formatter is always a stand-in (`cat` or a scratch shell
//! script) so the tests never require a lua-format install.

mod common;
