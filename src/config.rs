//! Tunable thresholds and per-language lexicons.
//!
//! Everything here has a built-in default, so a config file only needs the
//! values it changes:
//!
//! ```toml
//! parallel = false
//!
//! [classifier]
//! heading_ratio = 1.3
//!
//! [lexicons.ja]
//! field_words = ["日付", "氏名"]
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::OutlineError;
use crate::lang::Language;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Classify pages on a worker pool (needs the `parallel` feature).
    pub parallel: bool,
    pub region: RegionConfig,
    pub fonts: FontConfig,
    pub classifier: ClassifierConfig,
    pub reconstruct: ReconstructConfig,
    pub filter: FilterConfig,
    pub merge: MergeConfig,
    pub title: TitleConfig,
    pub levels: LevelConfig,
    pub lexicons: LexiconTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parallel: true,
            region: RegionConfig::default(),
            fonts: FontConfig::default(),
            classifier: ClassifierConfig::default(),
            reconstruct: ReconstructConfig::default(),
            filter: FilterConfig::default(),
            merge: MergeConfig::default(),
            title: TitleConfig::default(),
            levels: LevelConfig::default(),
            lexicons: LexiconTable::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Blocks whose top edge is above this fraction of the page are header.
    pub header_ratio: f32,
    /// Blocks whose top edge is below this fraction of the page are footer.
    pub footer_ratio: f32,
    pub title_min_avg_size: f32,
    pub title_min_chars: usize,
    pub title_max_chars: usize,
    /// Fraction of a span's area covered by an image above which the span
    /// is treated as part of the image.
    pub image_overlap: f32,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            header_ratio: 0.10,
            footer_ratio: 0.90,
            title_min_avg_size: 12.0,
            title_min_chars: 5,
            title_max_chars: 200,
            image_overlap: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// A most-common size at or above this is assumed to be a title that
    /// dominates the page, not body text.
    pub large_body_size: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { large_body_size: 20.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub max_distinct_sizes: usize,
    /// Minimum ratio of a heading block's main size to the body size.
    pub heading_ratio: f32,
    /// Share of a block's spans that must be at its main size.
    pub min_coverage: f32,
    /// Average-size ratio that makes any page-0 block a title-style heading.
    pub title_style_ratio: f32,
    /// Ratio for bold spans inside a body block to count as a subheading.
    pub line_bold_ratio: f32,
    /// Ratio for non-bold spans inside a body block to count as a subheading.
    pub line_large_ratio: f32,
    pub max_block_chars: usize,
    /// Lines with more tab / double-space gaps than this look like table rows.
    pub max_line_gaps: usize,
    /// Lines split into more spans than this look like table rows.
    pub max_line_spans: usize,
    /// Treat all-bold lines at body size as headings.
    pub body_emphasis_lines: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_distinct_sizes: 2,
            heading_ratio: 1.15,
            min_coverage: 0.7,
            title_style_ratio: 2.0,
            line_bold_ratio: 1.15,
            line_large_ratio: 1.5,
            max_block_chars: 250,
            max_line_gaps: 2,
            max_line_spans: 3,
            body_emphasis_lines: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconstructConfig {
    /// Shortest suffix/prefix overlap (in chars) accepted as a render
    /// artifact rather than coincidence.
    pub min_overlap: usize,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self { min_overlap: 3 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub min_chars: usize,
    pub min_chars_cjk: usize,
    pub toc_min_dots: usize,
    /// Strings at least this long that name a document type bypass the
    /// form-field rule.
    pub override_min_chars: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { min_chars: 3, min_chars_cjk: 2, toc_min_dots: 5, override_min_chars: 20 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Merged headings must stay strictly below this many chars.
    pub max_chars: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { max_chars: 100 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    pub min_chars: usize,
    /// More fragments than this at the top size is ambiguous; the longest wins.
    pub max_fragments: usize,
    /// Joins title fragments that are not on consecutive lines.
    pub separator: String,
    /// Use the input file stem when no title is found.
    pub filename_fallback: bool,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self { min_chars: 6, max_fragments: 3, separator: " - ".into(), filename_fallback: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelStrategy {
    /// Split the distinct sizes into four groups of near-equal count.
    Count,
    /// Split the numeric size range into four equal bands.
    Range,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub strategy: LevelStrategy,
    /// With four or fewer (size, bold, italic) styles, give each its own level.
    pub refine_by_style: bool,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self { strategy: LevelStrategy::Count, refine_by_style: true }
    }
}

/// Words and phrases the noise filter matches for one language.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    pub field_words: Vec<String>,
    pub boilerplate: Vec<String>,
    pub column_headers: Vec<String>,
    pub instruction_verbs: Vec<String>,
    pub doc_type_words: Vec<String>,
    pub page_words: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Lexicon {
    pub fn english() -> Self {
        Self {
            field_words: words(&[
                "date", "name", "version", "address", "phone", "telephone", "email", "e-mail",
                "signature", "amount", "total", "remarks", "designation", "age", "place",
                "status", "id", "no", "no.", "number", "s.no", "sl. no", "department",
                "date of birth", "father's name", "full name", "mobile", "fax", "website",
                "nombre", "fecha", "datum", "nom",
            ]),
            boilerplate: words(&[
                "signature of", "signed by", "for office use only", "all rights reserved",
                "copyright", "confidential", "i hereby declare", "i hereby certify",
                "authorized signatory", "authorised signatory", "intentionally left blank",
                "continued on next page", "printed on", "do not write",
            ]),
            column_headers: words(&[
                "amount", "qty", "quantity", "price", "rate", "total", "date", "description",
                "unit", "units", "no", "no.", "s.no", "sr", "sr.", "item", "cost", "balance",
                "subtotal", "tax", "sl", "sl.", "code", "value", "%", "hours", "days",
            ]),
            instruction_verbs: words(&[
                "enter", "select", "choose", "check", "tick", "fill", "provide", "attach",
                "sign", "specify", "write", "circle", "mark", "type", "print", "indicate",
                "please",
            ]),
            doc_type_words: words(&[
                "application", "form", "proposal", "report", "request", "agreement",
                "contract", "plan", "policy", "statement", "guide", "manual", "rfp",
            ]),
            page_words: words(&["page", "pg", "p", "pp", "pages"]),
        }
    }

    pub fn japanese() -> Self {
        Self {
            field_words: words(&["日付", "氏名", "名前", "住所", "電話", "版", "署名", "印", "年月日"]),
            boilerplate: words(&["署名", "捺印", "記入例", "無断転載", "無断複製"]),
            column_headers: words(&["金額", "数量", "単価", "合計", "日付", "品名", "小計"]),
            instruction_verbs: words(&["記入", "選択", "入力", "ご記入"]),
            doc_type_words: words(&["申請書", "報告書", "提案書", "計画書", "申込書"]),
            page_words: words(&["ページ", "頁"]),
        }
    }

    pub fn chinese() -> Self {
        Self {
            field_words: words(&["日期", "姓名", "名称", "地址", "电话", "版本", "签名", "签字"]),
            boilerplate: words(&["签名", "盖章", "版权所有", "签字"]),
            column_headers: words(&["金额", "数量", "单价", "合计", "日期", "小计", "单位"]),
            instruction_verbs: words(&["填写", "选择", "输入", "请填写"]),
            doc_type_words: words(&["申请书", "报告", "提案", "计划", "申请表"]),
            page_words: words(&["页", "第"]),
        }
    }

    pub fn korean() -> Self {
        Self {
            field_words: words(&["날짜", "이름", "성명", "주소", "전화", "버전", "서명", "일자"]),
            boilerplate: words(&["서명", "날인", "무단 전재", "무단 복제"]),
            column_headers: words(&["금액", "수량", "단가", "합계", "날짜", "소계"]),
            instruction_verbs: words(&["입력", "선택", "기재", "작성"]),
            doc_type_words: words(&["신청서", "보고서", "제안서", "계획서"]),
            page_words: words(&["페이지", "쪽"]),
        }
    }

    pub fn russian() -> Self {
        Self {
            field_words: words(&[
                "дата", "имя", "фамилия", "адрес", "телефон", "версия", "подпись", "отчество",
            ]),
            boilerplate: words(&["подпись", "все права защищены", "м.п."]),
            column_headers: words(&["сумма", "количество", "цена", "итого", "дата", "кол-во"]),
            instruction_verbs: words(&["введите", "выберите", "укажите", "заполните", "отметьте"]),
            doc_type_words: words(&["заявление", "отчет", "отчёт", "предложение", "форма", "договор"]),
            page_words: words(&["страница", "стр"]),
        }
    }
}

/// Lexicons keyed by language. Entries from a config file replace the
/// built-in lexicon of that language; the others stay.
#[derive(Debug, Clone)]
pub struct LexiconTable(HashMap<Language, Lexicon>);

impl LexiconTable {
    pub fn get(&self, language: Language) -> &Lexicon {
        self.0
            .get(&language)
            .or_else(|| self.0.get(&Language::English))
            .unwrap_or_else(|| empty_lexicon())
    }

    pub fn insert(&mut self, language: Language, lexicon: Lexicon) {
        self.0.insert(language, lexicon);
    }
}

fn empty_lexicon() -> &'static Lexicon {
    static EMPTY: Lazy<Lexicon> = Lazy::new(Lexicon::default);
    &EMPTY
}

impl Default for LexiconTable {
    fn default() -> Self {
        Self(HashMap::from([
            (Language::English, Lexicon::english()),
            (Language::Japanese, Lexicon::japanese()),
            (Language::Chinese, Lexicon::chinese()),
            (Language::Korean, Lexicon::korean()),
            (Language::Russian, Lexicon::russian()),
        ]))
    }
}

impl<'de> Deserialize<'de> for LexiconTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let overrides = HashMap::<Language, Lexicon>::deserialize(deserializer)?;
        let mut table = Self::default();
        table.0.extend(overrides);
        Ok(table)
    }
}

/// Parse a TOML configuration string.
pub fn parse(text: &str, origin: &Path) -> Result<Config, OutlineError> {
    toml::from_str(text).map_err(|source| OutlineError::Config { path: origin.to_path_buf(), source })
}

/// Load configuration from `explicit`, or from the user config directory
/// when that file exists, or fall back to defaults.
pub fn load(explicit: Option<&Path>) -> Result<Config, OutlineError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };
    let text = std::fs::read_to_string(&path)
        .map_err(|source| OutlineError::Io { path: path.clone(), source })?;
    debug!(path = %path.display(), "loaded configuration");
    parse(&text, &path)
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pdf-outline").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_defaults() {
        let config = parse("", Path::new("test.toml")).unwrap();
        assert!(config.parallel);
        assert_eq!(config.classifier.max_distinct_sizes, 2);
        assert_eq!(config.levels.strategy, LevelStrategy::Count);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse(
            r#"
            parallel = false

            [classifier]
            heading_ratio = 1.3

            [levels]
            strategy = "range"
            "#,
            Path::new("test.toml"),
        )
        .unwrap();
        assert!(!config.parallel);
        assert_eq!(config.classifier.heading_ratio, 1.3);
        assert_eq!(config.classifier.min_coverage, 0.7);
        assert_eq!(config.levels.strategy, LevelStrategy::Range);
        assert_eq!(config.merge.max_chars, 100);
    }

    #[test]
    fn lexicon_override_replaces_one_language() {
        let config = parse(
            r#"
            [lexicons.ja]
            field_words = ["テスト"]
            "#,
            Path::new("test.toml"),
        )
        .unwrap();
        assert_eq!(config.lexicons.get(Language::Japanese).field_words, vec!["テスト"]);
        assert!(config.lexicons.get(Language::English).field_words.contains(&"date".to_string()));
    }

    #[test]
    fn missing_language_falls_back_to_english_then_empty() {
        let mut table = LexiconTable(HashMap::new());
        assert!(table.get(Language::Korean).field_words.is_empty());

        table.insert(Language::English, Lexicon::english());
        let korean = table.get(Language::Korean);
        assert_eq!(korean.field_words, Lexicon::english().field_words);
    }

    #[test]
    fn bad_toml_names_the_file() {
        let err = parse("[classifier\n", Path::new("broken.toml")).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn missing_explicit_file_is_io_error() {
        let err = load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, OutlineError::Io { .. }));
    }
}
