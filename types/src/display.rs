//! Display normalization for server-supplied messages.
//!
//! Rejection messages come straight from the network and end up in a terminal,
//! so they are reduced to a single line of printable text before anything
//! renders or stores them.

/// Upper bound on a displayed message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 200;

const ESC: char = '\x1b';
const BEL: char = '\x07';

/// Normalize an untrusted message for single-line display.
///
/// Strips ANSI escape sequences and control characters, collapses every run of
/// whitespace (newlines included) into one space, trims, and truncates to
/// [`MAX_MESSAGE_CHARS`].
#[must_use]
pub fn display_message(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ESC {
            skip_escape(&mut chars);
            continue;
        }
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if c.is_control() {
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }

    truncate_with_ellipsis(&out, MAX_MESSAGE_CHARS)
}

/// Truncate to at most `max` characters (minimum 3), ending in `...` when cut.
#[must_use]
pub fn truncate_with_ellipsis(raw: &str, max: usize) -> String {
    let max = max.max(3);
    let raw = raw.trim();
    if raw.chars().count() <= max {
        return raw.to_string();
    }
    let head: String = raw.chars().take(max - 3).collect();
    format!("{head}...")
}

fn skip_escape<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) {
    match chars.peek() {
        // CSI: parameters and intermediates, then one final byte.
        Some('[') => {
            chars.next();
            for c in chars.by_ref() {
                if ('\x40'..='\x7e').contains(&c) {
                    break;
                }
            }
        }
        // OSC: terminated by BEL or ESC \.
        Some(']') => {
            chars.next();
            while let Some(c) = chars.next() {
                if c == BEL {
                    break;
                }
                if c == ESC && chars.peek() == Some(&'\\') {
                    chars.next();
                    break;
                }
            }
        }
        Some(_) => {
            chars.next();
        }
        None => {}
    }
}
