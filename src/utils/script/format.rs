use std::{fmt, sync::OnceLock};

use log::debug;
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    Parse(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FormatError::Parse(message) => write!(f, "format error: {message}"),
        }
    }
}

impl std::error::Error for FormatError {}

pub(crate) fn page_source_type() -> SourceType {
    SourceType::default().with_module(false)
}

/// Re-prints a script in the layout the page recipes match against.
/// Malformed scripts yield an empty string.
pub fn format(script: &str) -> String {
    match try_format(script) {
        Ok(formatted) => formatted,
        Err(err) => {
            debug!("[format] dropping script: {err}");
            String::new()
        }
    }
}

pub fn try_format(script: &str) -> Result<String, FormatError> {
    static HTML_COMMENT_REGEXP: OnceLock<Regex> = OnceLock::new();
    let script = HTML_COMMENT_REGEXP
        .get_or_init(|| Regex::new(r"<!--.+?-->").unwrap())
        .replace_all(script, "");

    let allocator = Allocator::default();
    let mut ret = Parser::new(&allocator, &script, page_source_type()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        let message = ret
            .errors
            .first()
            .map(|err| err.to_string())
            .unwrap_or_else(|| "unrecoverable syntax".into());
        return Err(FormatError::Parse(message));
    }

    ret.program.comments.clear();
    Ok(Codegen::new().build(&ret.program).code)
}

/// Double-quoted literal that parses back to `value`.
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
