//! Terminal output sanitization
//!
//! Domains and URLs come from web pages and browser history, so they are
//! attacker-influenced. Anything printed by `list` or `stats` passes through
//! [`sanitize_line`] first so escape sequences cannot repaint the terminal.

/// Remove ANSI CSI sequences and every control character
///
/// Newlines and tabs are removed too: each printed field must stay on one line.
///
/// # Examples
///
/// ```
/// use login_history::utils::terminal::sanitize_line;
///
/// assert_eq!(sanitize_line("\x1b[31mevil.test\x1b[0m"), "evil.test");
/// assert_eq!(sanitize_line("a\nb"), "ab");
/// ```
pub fn sanitize_line(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // CSI ends at the first ASCII letter
            for next_ch in chars.by_ref() {
                if next_ch.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }

        if ch.is_control() {
            continue;
        }

        result.push(ch);
    }

    result
}
