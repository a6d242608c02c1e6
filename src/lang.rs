use serde::Deserialize;

/// Languages with their own noise lexicon. Latin-script text and anything
/// unrecognised falls back to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "ru")]
    Russian,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Japanese => "ja",
            Language::Chinese => "zh",
            Language::Korean => "ko",
            Language::Russian => "ru",
        }
    }

    /// Scripts where a two-character string can be a whole word.
    pub fn is_cjk(self) -> bool {
        matches!(self, Language::Japanese | Language::Chinese | Language::Korean)
    }
}

/// Guess the language of a short string from the Unicode blocks it uses.
/// Kana wins over ideographs (Japanese mixes both), Hangul wins over
/// ideographs (hanja inside Korean text).
pub fn detect(text: &str) -> Language {
    let mut kana = 0usize;
    let mut han = 0usize;
    let mut hangul = 0usize;
    let mut cyrillic = 0usize;

    for c in text.chars() {
        match c as u32 {
            0x3040..=0x30FF | 0x31F0..=0x31FF | 0xFF66..=0xFF9F => kana += 1,
            0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF => han += 1,
            0xAC00..=0xD7AF | 0x1100..=0x11FF | 0x3130..=0x318F => hangul += 1,
            0x0400..=0x04FF | 0x0500..=0x052F => cyrillic += 1,
            _ => {}
        }
    }

    if kana > 0 {
        Language::Japanese
    } else if hangul > 0 {
        Language::Korean
    } else if han > 0 {
        Language::Chinese
    } else if cyrillic > 0 {
        Language::Russian
    } else {
        Language::English
    }
}

/// Kana, Han, and Hangul characters: scripts written without spaces
/// between words.
pub fn is_ideographic(c: char) -> bool {
    matches!(
        c as u32,
        0x3040..=0x30FF
            | 0x31F0..=0x31FF
            | 0xFF66..=0xFF9F
            | 0x4E00..=0x9FFF
            | 0x3400..=0x4DBF
            | 0xF900..=0xFAFF
            | 0xAC00..=0xD7AF
            | 0x1100..=0x11FF
            | 0x3130..=0x318F
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_scripts() {
        assert_eq!(detect("Overview of Findings"), Language::English);
        assert_eq!(detect("Résumé détaillé"), Language::English);
        assert_eq!(detect("日本語のテキスト"), Language::Japanese);
        assert_eq!(detect("ひらがな"), Language::Japanese);
        assert_eq!(detect("中文标题"), Language::Chinese);
        assert_eq!(detect("한국어 제목"), Language::Korean);
        assert_eq!(detect("Введение"), Language::Russian);
        assert_eq!(detect("12345"), Language::English);
    }

    #[test]
    fn cjk_grouping() {
        assert!(Language::Korean.is_cjk());
        assert!(!Language::Russian.is_cjk());
        assert_eq!(Language::Chinese.code(), "zh");
    }
}
