//! Compound identifiers.
//!
//! Event couples, (event, object) relations and per-type net nodes are
//! identified by joining several names. Each part is escaped first, so two
//! different part lists never produce the same identifier even when a name
//! contains the separator.

/// Escape `\` and `separator` inside one part.
pub fn escape_part(part: &str, separator: char) -> String {
    let mut escaped = String::with_capacity(part.len());
    for c in part.chars() {
        if c == '\\' || c == separator {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Join escaped `parts` with `separator`.
pub fn join_escaped(parts: &[&str], separator: char) -> String {
    parts
        .iter()
        .map(|part| escape_part(part, separator))
        .collect::<Vec<_>>()
        .join(&separator.to_string())
}
