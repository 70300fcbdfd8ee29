//! Mapping of formatter stderr output into positioned diagnostics.
//!
//! lua-format reports syntax errors as lines shaped like
//! `line 3:5: unexpected symbol`, with a 1-based row and a 0-based column.

use std::sync::LazyLock;

use regex::Regex;

static LINE_COL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^line (\d+):(\d+)").expect("valid line/column regex"));

/// One positioned problem reported by the external tool. Row and column are
/// both 0-based, matching editor conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

/// Parse the decoded error stream into diagnostics.
///
/// Only lines starting with `line <row>:<col>` produce an entry; anything
/// else is continuation text or unrelated chatter and is skipped. The full
/// matching line is kept verbatim as the message.
pub fn parse_stderr(stderr: &str) -> Vec<Diagnostic> {
    stderr
        .lines()
        .filter_map(|err| {
            let caps = LINE_COL.captures(err)?;
            let row: u32 = caps[1].parse().ok()?;
            let column: u32 = caps[2].parse().ok()?;
            Some(Diagnostic {
                // the tool's rows are 1-based
                line: row.saturating_sub(1),
                column,
                message: err.to_string(),
            })
        })
        .collect()
}
