//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format key lists, type names,
//! and "did you mean?" suggestions in error output.

use std::fmt::Debug;

/// Renders a list of keys using their `Debug` representation.
///
/// # Examples
/// ```
/// use wakil_support::rendering::render_keys;
///
/// assert_eq!(render_keys(&["a", "b"]), r#"["a", "b"]"#);
/// assert_eq!(render_keys::<u8>(&[]), "[]");
/// ```
pub fn render_keys<K: Debug>(keys: &[K]) -> String {
    let parts: Vec<String> = keys.iter().map(|k| format!("{k:?}")).collect();
    format!("[{}]", parts.join(", "))
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use wakil_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::services::user::UserService");
/// assert_eq!(short, "UserService");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>");
/// assert_eq!(short, "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    // Keep only the last segment of every path:
    // "Arc<dyn my_app::Logger>" → "Arc<dyn Logger>"
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '<' | '>' | ',' | ' ' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => current_segment.push(ch),
        }
    }

    result.push_str(&current_segment);
    result
}

/// Picks registered key representations that look close to `requested`.
///
/// Used by "no accessor for key" errors. Keys are compared by their
/// rendered form, case-insensitively:
/// substring hits score highest, then long common prefixes.
pub fn suggest_similar(
    requested: &str,
    available: &[String],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = trim_quotes(requested).to_lowercase();
    if requested_lower.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(&String, usize)> = available
        .iter()
        .filter_map(|name| {
            let name_lower = trim_quotes(name).to_lowercase();
            if name_lower == requested_lower || name_lower.is_empty() {
                return None;
            }

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            let common = name_lower
                .chars()
                .zip(requested_lower.chars())
                .take_while(|(a, b)| a == b)
                .count();

            if common >= 3 {
                return Some((name, common * 10));
            }

            None
        })
        .collect();

    // stable: equal scores keep registration order
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    let mut out: Vec<String> = Vec::new();
    for (name, _) in scored {
        if out.len() == max_suggestions {
            break;
        }
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}

fn trim_quotes(s: &str) -> &str {
    s.trim_matches('"')
}
