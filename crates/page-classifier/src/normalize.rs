//! Text normalization for clue matching and model prompts.
//!
//! The host site renders typographic punctuation and the occasional accented
//! glyph; clue strings are plain ASCII. Normalization is NFC first, then a
//! transliteration pass that maps every non-ASCII code point to its closest
//! ASCII equivalent (typographic punctuation via a small table, accented
//! Latin via NFKD with the combining marks dropped).

use unicode_normalization::UnicodeNormalization;

/// NFC + transliterate to ASCII, newlines preserved.
pub fn normalize(raw: &str) -> String {
    transliterate(raw, false)
}

/// NFC + transliterate to ASCII with newlines folded to single spaces.
pub fn normalize_flat(raw: &str) -> String {
    transliterate(raw, true)
}

fn transliterate(raw: &str, fold_newlines: bool) -> String {
    let nfc: String = raw.nfc().collect();
    let mut out = String::with_capacity(nfc.len());
    let mut chars = nfc.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                // Treat \r\n as one newline.
                if chars.peek() == Some(&'\n') {
                    continue;
                }
                out.push(if fold_newlines { ' ' } else { '\n' });
            }
            '\n' => out.push(if fold_newlines { ' ' } else { '\n' }),
            _ if ch.is_ascii() => out.push(ch),
            _ => match punctuation_ascii(ch) {
                Some(mapped) => out.push_str(mapped),
                None => {
                    // Keep the ASCII base letters of a decomposed glyph.
                    for part in ch.to_string().nfkd() {
                        if part.is_ascii() {
                            out.push(part);
                        }
                    }
                }
            },
        }
    }
    out
}

fn punctuation_ascii(ch: char) -> Option<&'static str> {
    Some(match ch {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => "\"",
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
        | '\u{2212}' => "-",
        '\u{2026}' => "...",
        '\u{00A0}' | '\u{2007}' | '\u{202F}' => " ",
        '\u{00D7}' => "x",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(normalize("plain text"), "plain text");
    }

    #[test]
    fn smart_punctuation_is_flattened() {
        assert_eq!(normalize("\u{201C}quoted\u{201D}"), "\"quoted\"");
        assert_eq!(normalize("it\u{2019}s"), "it's");
        assert_eq!(normalize("a\u{2014}b\u{2026}"), "a-b...");
    }

    #[test]
    fn accented_latin_keeps_base_letters() {
        assert_eq!(normalize("caf\u{e9}"), "cafe");
        assert_eq!(normalize("na\u{ef}ve"), "naive");
    }

    #[test]
    fn newline_folding() {
        assert_eq!(normalize_flat("a\r\nb\nc"), "a b c");
        assert_eq!(normalize("a\r\nb"), "a\nb");
    }
}
