//! Language-name resolution
//!
//! The origin labels languages with a mix of English, native, and
//! abbreviated names. A fixed alias table maps the values seen in the
//! wild to ISO-639-3-like codes; anything else is handed to the host's
//! canonicalizer.

/// Code used when the page carries no language label at all.
pub const DEFAULT_LANGUAGE: &str = "kor";

const ALIASES: &[(&str, &[&str])] = &[
    ("eng", &["English", "Englisch", "ENG"]),
    ("zho", &["Chinese", "chinois", "chi"]),
    ("fra", &["French", "Francais", "FRA"]),
    ("ita", &["Italian", "Italiano", "ITA"]),
    ("dut", &["Dutch", "DUT"]),
    ("deu", &["German", "Deutsch", "GER"]),
    ("spa", &["Spanish", "Español", "Espaniol", "SPA"]),
    ("jpn", &["Japanese", "日本語", "JAP"]),
    ("por", &["Portuguese", "Portugues", "POR"]),
    ("kor", &["Korean", "한국어", "KOR"]),
];

/// Resolve a raw language value from the page to a code, or `None`
/// when the value is not in the alias table.
pub fn resolve(raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for (code, aliases) in ALIASES {
        if *code == raw.to_lowercase() {
            return Some(code);
        }
        for alias in *aliases {
            if alias.eq_ignore_ascii_case(raw) || *alias == raw {
                return Some(code);
            }
        }
    }
    None
}
