//! Resolution of literal `\uXXXX` sequences for display.

/// Replace every `\uXXXX` sequence in `text` with the character it encodes.
///
/// Surrogate pairs written as two consecutive escapes are combined. Escapes
/// that do not form a valid character are left untouched.
pub fn unescape_unicode(text: &str) -> String {
    if !text.contains("\\u") {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("\\u") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match decode_escape(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push_str("\\u");
                rest = &tail[2..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Decode one escape at the start of `s`, returning the char and bytes consumed.
fn decode_escape(s: &str) -> Option<(char, usize)> {
    let high = hex_unit(s)?;

    if (0xD800..0xDC00).contains(&high) {
        let low = hex_unit(&s[6..])?;
        if !(0xDC00..0xE000).contains(&low) {
            return None;
        }
        let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
        return char::from_u32(code).map(|ch| (ch, 12));
    }

    char::from_u32(u32::from(high)).map(|ch| (ch, 6))
}

fn hex_unit(s: &str) -> Option<u16> {
    let digits = s.strip_prefix("\\u")?.get(..4)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(unescape_unicode("Step 1/2 : FROM nginx"), "Step 1/2 : FROM nginx");
    }

    #[test]
    fn test_basic_escape() {
        assert_eq!(unescape_unicode(r"\u003e 80"), "> 80");
        assert_eq!(unescape_unicode(r"caf\u00e9"), "café");
    }

    #[test]
    fn test_surrogate_pair() {
        assert_eq!(unescape_unicode(r"\ud83d\ude80 go"), "🚀 go");
    }

    #[test]
    fn test_lone_surrogate_left_alone() {
        assert_eq!(unescape_unicode(r"\ud83d x"), r"\ud83d x");
    }

    #[test]
    fn test_invalid_escapes_left_alone() {
        assert_eq!(unescape_unicode(r"\u12"), r"\u12");
        assert_eq!(unescape_unicode(r"\uZZZZ!"), r"\uZZZZ!");
        assert_eq!(unescape_unicode(r"end\u"), r"end\u");
    }
}
