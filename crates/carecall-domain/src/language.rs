//! Language codes used for localized call messages and their native scripts.

/// Writing systems we can check translated text against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Devanagari,
    Bengali,
    Gurmukhi,
    Gujarati,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Han,
}

impl Script {
    /// Whether `c` belongs to this script's primary Unicode block(s).
    pub fn contains(self, c: char) -> bool {
        let cp = c as u32;
        match self {
            Self::Latin => c.is_ascii_alphabetic() || (0x00C0..=0x024F).contains(&cp),
            Self::Devanagari => (0x0900..=0x097F).contains(&cp),
            Self::Bengali => (0x0980..=0x09FF).contains(&cp),
            Self::Gurmukhi => (0x0A00..=0x0A7F).contains(&cp),
            Self::Gujarati => (0x0A80..=0x0AFF).contains(&cp),
            Self::Tamil => (0x0B80..=0x0BFF).contains(&cp),
            Self::Telugu => (0x0C00..=0x0C7F).contains(&cp),
            Self::Kannada => (0x0C80..=0x0CFF).contains(&cp),
            Self::Malayalam => (0x0D00..=0x0D7F).contains(&cp),
            Self::Han => (0x4E00..=0x9FFF).contains(&cp) || (0x3400..=0x4DBF).contains(&cp),
        }
    }
}

/// A supported message language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// ISO 639-1 code, lowercase.
    pub code: &'static str,
    /// English display name, used in translation prompts.
    pub name: &'static str,
    pub script: Script,
}

const LANGUAGES: &[Language] = &[
    Language { code: "en", name: "English", script: Script::Latin },
    Language { code: "hi", name: "Hindi", script: Script::Devanagari },
    Language { code: "mr", name: "Marathi", script: Script::Devanagari },
    Language { code: "bn", name: "Bengali", script: Script::Bengali },
    Language { code: "pa", name: "Punjabi", script: Script::Gurmukhi },
    Language { code: "gu", name: "Gujarati", script: Script::Gujarati },
    Language { code: "ta", name: "Tamil", script: Script::Tamil },
    Language { code: "te", name: "Telugu", script: Script::Telugu },
    Language { code: "kn", name: "Kannada", script: Script::Kannada },
    Language { code: "ml", name: "Malayalam", script: Script::Malayalam },
    Language { code: "zh", name: "Chinese", script: Script::Han },
    Language { code: "es", name: "Spanish", script: Script::Latin },
    Language { code: "fr", name: "French", script: Script::Latin },
];

/// Look up a language by its code, case-insensitively.
pub fn find_language(code: &str) -> Option<Language> {
    let code = code.trim();
    LANGUAGES
        .iter()
        .find(|lang| lang.code.eq_ignore_ascii_case(code))
        .copied()
}

/// Whether `text` is written in the native script of `code`.
///
/// Counts alphabetic characters only; digits and punctuation are script-neutral.
/// Unknown languages are not validated and always pass.
pub fn is_native_script(code: &str, text: &str) -> bool {
    let Some(lang) = find_language(code) else {
        return true;
    };
    let mut letters = 0usize;
    let mut native = 0usize;
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        letters += 1;
        if lang.script.contains(c) {
            native += 1;
        }
    }
    // Latin-script languages legitimately borrow; non-Latin ones must be mostly native.
    match lang.script {
        Script::Latin => letters == 0 || native * 2 >= letters,
        _ => native > 0 && native * 2 >= letters,
    }
}
