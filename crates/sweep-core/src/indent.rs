//! Indentation helpers shared by the locator and the span splicer.

/// Returns the leading whitespace (spaces and tabs) of `line`.
pub fn leading_whitespace(line: &str) -> &str {
    let end = line
        .find(|c| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

/// Strips `prefix` from `line` if present, otherwise strips as much
/// leading whitespace as the line actually has.
///
/// Snippets pasted from editors occasionally carry lines that are
/// shallower than the entity's base indentation (e.g. a dedented
/// comment); those are preserved as-is rather than rejected.
pub fn strip_indent<'a>(line: &'a str, prefix: &str) -> &'a str {
    if let Some(rest) = line.strip_prefix(prefix) {
        rest
    } else {
        let own = leading_whitespace(line);
        let common = own.len().min(prefix.len());
        &line[common..]
    }
}

/// Returns `true` if the line contains nothing but whitespace.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}
