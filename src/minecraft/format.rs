//! Minecraft `§` formatting codes.
//!
//! `§` followed by a hex digit selects one of the 16 chat colours,
//! `§k`-`§o` toggle styles and `§r` resets.

/// Section sign that introduces a formatting code.
pub const FORMAT_CHAR: char = '§';

/// Default text colour (white).
pub const DEFAULT_COLOR: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// RGB for a colour code character, if it is one.
pub fn color_for_code(code: char) -> Option<[u8; 3]> {
    let rgb = match code.to_ascii_lowercase() {
        '0' => [0x00, 0x00, 0x00],
        '1' => [0x00, 0x00, 0xAA],
        '2' => [0x00, 0xAA, 0x00],
        '3' => [0x00, 0xAA, 0xAA],
        '4' => [0xAA, 0x00, 0x00],
        '5' => [0xAA, 0x00, 0xAA],
        '6' => [0xFF, 0xAA, 0x00],
        '7' => [0xAA, 0xAA, 0xAA],
        '8' => [0x55, 0x55, 0x55],
        '9' => [0x55, 0x55, 0xFF],
        'a' => [0x55, 0xFF, 0x55],
        'b' => [0x55, 0xFF, 0xFF],
        'c' => [0xFF, 0x55, 0x55],
        'd' => [0xFF, 0x55, 0xFF],
        'e' => [0xFF, 0xFF, 0x55],
        'f' => [0xFF, 0xFF, 0xFF],
        _ => return None,
    };
    Some(rgb)
}

/// Strip every formatting code from a line.
pub fn strip_formatting(message: &str) -> String {
    let mut result = String::with_capacity(message.len());
    let mut chars = message.chars();

    while let Some(ch) = chars.next() {
        if ch == FORMAT_CHAR {
            // Drop the code character that follows
            chars.next();
        } else {
            result.push(ch);
        }
    }

    result
}

/// A run of text drawn in a single colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub color: [u8; 3],
    pub text: String,
}

/// Split a formatted line into coloured segments.
///
/// Style codes (bold, italic, ...) are dropped; `§r` returns to white.
pub fn segments(message: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = Segment {
        color: DEFAULT_COLOR,
        text: String::new(),
    };
    let mut chars = message.chars();

    while let Some(ch) = chars.next() {
        if ch != FORMAT_CHAR {
            current.text.push(ch);
            continue;
        }

        let Some(code) = chars.next() else { break };
        let next_color = match color_for_code(code) {
            Some(rgb) => rgb,
            None if code.eq_ignore_ascii_case(&'r') => DEFAULT_COLOR,
            None => continue,
        };

        if next_color != current.color {
            let finished = std::mem::replace(
                &mut current,
                Segment {
                    color: next_color,
                    text: String::new(),
                },
            );
            if !finished.text.is_empty() {
                segments.push(finished);
            }
        }
    }

    if !current.text.is_empty() {
        segments.push(current);
    }

    segments
}

/// Longest chat line the server accepts, in characters.
pub const MAX_CHAT_LENGTH: usize = 256;

/// Split text into pieces of at most `max_chars` characters.
///
/// Prefers breaking at the last space inside the window; words longer
/// than the window are cut.
pub fn split_chat(message: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    let mut remaining = message.trim();

    while !remaining.is_empty() {
        // Byte offset just past the first `max_chars` characters
        let window_end = match remaining.char_indices().nth(max_chars) {
            Some((offset, _)) => offset,
            None => {
                pieces.push(remaining.to_string());
                break;
            }
        };

        let window = &remaining[..window_end];
        let at_space = remaining[window_end..].starts_with(' ');
        let (piece, rest) = match window.rfind(' ') {
            _ if at_space => (window, &remaining[window_end..]),
            Some(space) if space > 0 => (&window[..space], &remaining[space..]),
            _ => (window, &remaining[window_end..]),
        };

        pieces.push(piece.to_string());
        remaining = rest.trim_start();
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_formatting() {
        assert_eq!(
            strip_formatting("§2Guild > §b[MVP§c+§b] Steve §e[Member]§f: hello"),
            "Guild > [MVP+] Steve [Member]: hello"
        );
        assert_eq!(strip_formatting("plain"), "plain");
        // Dangling section sign at the end
        assert_eq!(strip_formatting("oops§"), "oops");
    }

    #[test]
    fn test_segments_colors() {
        let parsed = segments("§2Guild > §bSteve§r: hi");
        assert_eq!(
            parsed,
            vec![
                Segment { color: [0x00, 0xAA, 0x00], text: "Guild > ".to_string() },
                Segment { color: [0x55, 0xFF, 0xFF], text: "Steve".to_string() },
                Segment { color: DEFAULT_COLOR, text: ": hi".to_string() },
            ]
        );
    }

    #[test]
    fn test_segments_ignore_style_codes() {
        let parsed = segments("§lbold §oitalic");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].text, "bold italic");
    }

    #[test]
    fn test_uppercase_codes() {
        assert_eq!(color_for_code('A'), color_for_code('a'));
        assert_eq!(color_for_code('z'), None);
    }

    #[test]
    fn test_split_chat_short() {
        assert_eq!(split_chat("Steve: hi", 20), vec!["Steve: hi"]);
        assert!(split_chat("   ", 20).is_empty());
    }

    #[test]
    fn test_split_chat_on_space() {
        assert_eq!(split_chat("Hello beautiful world", 15), vec!["Hello beautiful", "world"]);
        assert_eq!(split_chat("Hello beautiful world", 12), vec!["Hello", "beautiful", "world"]);
    }

    #[test]
    fn test_split_chat_long_word() {
        assert_eq!(split_chat("HelloBeautifulWorld", 10), vec!["HelloBeaut", "ifulWorld"]);
    }

    #[test]
    fn test_split_chat_counts_characters() {
        let pieces = split_chat("ééééé ééééé", 5);
        assert_eq!(pieces, vec!["ééééé", "ééééé"]);
        assert!(pieces.iter().all(|p| p.chars().count() <= 5));
    }
}
