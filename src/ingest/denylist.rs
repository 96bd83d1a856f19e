// src/ingest/denylist.rs
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_DENYLIST_PATH: &str = "WIKI_DENYLIST_PATH";

/// Built-in topics skipped on the Vietnamese wiki.
pub const DEFAULT_WORDS: &[&str] = &[
    "sinh ngày", "thực vật", "hoa", "cây", "tỉnh",
    "ngành", "lớp", "bộ", "họ", "chi", "loài",
    "làng", "huyện", "vùng", "xã", "thị trấn", "thành phố", "dân số", "xứ",
    "hành tinh", "ngôi sao",
    "nhóm nhạc", "nhạc", "ca sỹ", "bài hát",
    "enzyme",
    "chính trị", "nga", "game", "bóng đá",
    "diễn viên", "người mẫu", "tài tử", "nghệ sĩ",
];

/// Ordered, lowercase substrings that disqualify an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denylist {
    words: Vec<String>,
}

impl Default for Denylist {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS.iter().map(|w| w.to_string()))
    }
}

impl Denylist {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for w in words {
            let t = w.as_ref().trim().to_lowercase();
            if !t.is_empty() && !out.contains(&t) {
                out.push(t);
            }
        }
        Self { words: out }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// First entry found in `text`, compared case-insensitively.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        if self.words.is_empty() || text.is_empty() {
            return None;
        }
        let lower = text.to_lowercase();
        self.words
            .iter()
            .find(|w| lower.contains(w.as_str()))
            .map(String::as_str)
    }

    /// Checks title first, then summary.
    pub fn blocks(&self, title: &str, summary: &str) -> Option<&str> {
        self.first_match(title).or_else(|| self.first_match(summary))
    }
}

/// On-disk denylist layouts, picked by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenylistFormat {
    /// `words = ["...", ...]`
    Toml,
    /// a bare array of strings
    Json,
}

impl DenylistFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => bail!(
                "denylist {} needs a .toml or .json extension",
                path.display()
            ),
        }
    }

    pub fn parse(self, content: &str) -> Result<Denylist> {
        #[derive(serde::Deserialize)]
        struct Words {
            words: Vec<String>,
        }

        let words = match self {
            Self::Toml => toml::from_str::<Words>(content)?.words,
            Self::Json => serde_json::from_str::<Vec<String>>(content)?,
        };
        Ok(Denylist::new(words))
    }
}

/// Files tried, in order, when no path is configured.
pub const FALLBACK_PATHS: &[&str] = &["config/denylist.toml", "config/denylist.json"];

pub fn load_denylist_from(path: &Path) -> Result<Denylist> {
    let format = DenylistFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading denylist from {}", path.display()))?;
    format
        .parse(&content)
        .with_context(|| format!("parsing {format:?} denylist {}", path.display()))
}

/// `$WIKI_DENYLIST_PATH` if set (it must exist), else the first of
/// [`FALLBACK_PATHS`] present, else the built-in list.
pub fn load_denylist_default() -> Result<Denylist> {
    if let Some(p) = std::env::var_os(ENV_DENYLIST_PATH) {
        let path = PathBuf::from(p);
        if !path.exists() {
            bail!("{ENV_DENYLIST_PATH}={} does not exist", path.display());
        }
        return load_denylist_from(&path);
    }
    match FALLBACK_PATHS.iter().map(Path::new).find(|p| p.exists()) {
        Some(path) => load_denylist_from(path),
        None => Ok(Denylist::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_lowercased_trimmed_and_deduped_in_order() {
        let dl = Denylist::new([" Game ", "", "NGA", "game", "bộ"]);
        assert_eq!(dl.words(), &["game", "nga", "bộ"]);
    }

    #[test]
    fn default_list_drops_the_duplicate_entry() {
        let dl = Denylist::default();
        let stars = dl.words().iter().filter(|w| *w == "ngôi sao").count();
        assert_eq!(stars, 1);
        assert_eq!(dl.words().first().map(String::as_str), Some("sinh ngày"));
    }

    #[test]
    fn matching_is_case_insensitive_including_diacritics() {
        let dl = Denylist::new(["bóng đá"]);
        assert_eq!(dl.first_match("Đội BÓNG ĐÁ quốc gia"), Some("bóng đá"));
        assert_eq!(dl.first_match("Bong da"), None);
    }

    #[test]
    fn blocks_checks_title_then_summary() {
        let dl = Denylist::new(["enzyme", "game"]);
        assert_eq!(dl.blocks("Game of Life", "an enzyme"), Some("game"));
        assert_eq!(dl.blocks("Catalase", "An Enzyme found in cells"), Some("enzyme"));
        assert_eq!(dl.blocks("Hà Nội", "Thủ đô"), None);
    }

    #[test]
    fn empty_denylist_blocks_nothing() {
        let dl = Denylist::new(Vec::<String>::new());
        assert!(dl.is_empty());
        assert_eq!(dl.blocks("anything", "at all"), None);
    }

    #[test]
    fn format_follows_the_extension() {
        assert_eq!(
            DenylistFormat::from_path(Path::new("a/denylist.TOML")).unwrap(),
            DenylistFormat::Toml
        );
        assert_eq!(
            DenylistFormat::from_path(Path::new("denylist.json")).unwrap(),
            DenylistFormat::Json
        );
        assert!(DenylistFormat::from_path(Path::new("denylist.txt")).is_err());
        assert!(DenylistFormat::from_path(Path::new("denylist")).is_err());
    }

    #[test]
    fn toml_and_json_formats_parse() {
        let from_toml = DenylistFormat::Toml.parse(r#"words = [" Nga ", "game"]"#).unwrap();
        assert_eq!(from_toml.words(), &["nga", "game"]);
        let from_json = DenylistFormat::Json.parse(r#"["Enzyme", ""]"#).unwrap();
        assert_eq!(from_json.words(), &["enzyme"]);
        assert!(DenylistFormat::Json.parse("not a list").is_err());
    }

    #[test]
    fn content_is_not_sniffed_across_formats() {
        assert!(DenylistFormat::Toml.parse(r#"["game"]"#).is_err());
        assert!(DenylistFormat::Json.parse(r#"words = ["game"]"#).is_err());
    }
}
