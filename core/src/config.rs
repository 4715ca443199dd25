use crate::error::{AnalyzerError, Result};
use rust_stemmers::Algorithm;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Supported wiki language codes and the lexicon name each one maps to.
///
/// A code in this table only runs when `<lexicon_directory>/<name>.txt` exists; the
/// repository ships `english.txt` and `italian.txt`, other languages bring their own list.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("en", "english"),
    ("ar", "arabic"),
    ("da", "danish"),
    ("nl", "dutch"),
    ("fi", "finnish"),
    ("fr", "french"),
    ("de", "german"),
    ("el", "greek"),
    ("hu", "hungarian"),
    ("id", "indonesian"),
    ("it", "italian"),
    ("kk", "kazakh"),
    ("ne", "nepali"),
    ("no", "norwegian"),
    ("pt", "portuguese"),
    ("ro", "romanian"),
    ("ru", "russian"),
    ("es", "spanish"),
    ("sv", "swedish"),
    ("tr", "turkish"),
    ("hy", "armenian"),
    ("az", "azerbaijani"),
    ("eu", "basque"),
    ("bn", "bengali"),
    ("bg", "bulgarian"),
    ("ca", "catalan"),
    ("zh", "chinese"),
    ("sh", "croatian"),
    ("cs", "czech"),
    ("gl", "galician"),
    ("he", "hebrew"),
    ("hi", "hindi"),
    ("ga", "irish"),
    ("ja", "japanese"),
    ("ko", "korean"),
    ("lv", "latvian"),
    ("lt", "lithuanian"),
    ("mr", "marathi"),
    ("fa", "persian"),
    ("pl", "polish"),
    ("sk", "slovak"),
    ("th", "thai"),
    ("uk", "ukrainian"),
    ("ur", "urdu"),
    ("simple", "english"),
    ("vec", "italian"),
];

/// Lexicon name for a language code, if the code is supported.
pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

/// Snowball algorithm for a lexicon name; `None` for languages rust-stemmers does not cover.
pub fn stemmer_for(name: &str) -> Option<Algorithm> {
    let algo = match name {
        "arabic" => Algorithm::Arabic,
        "danish" => Algorithm::Danish,
        "dutch" => Algorithm::Dutch,
        "english" => Algorithm::English,
        "finnish" => Algorithm::Finnish,
        "french" => Algorithm::French,
        "german" => Algorithm::German,
        "greek" => Algorithm::Greek,
        "hungarian" => Algorithm::Hungarian,
        "italian" => Algorithm::Italian,
        "norwegian" => Algorithm::Norwegian,
        "portuguese" => Algorithm::Portuguese,
        "romanian" => Algorithm::Romanian,
        "russian" => Algorithm::Russian,
        "spanish" => Algorithm::Spanish,
        "swedish" => Algorithm::Swedish,
        "turkish" => Algorithm::Turkish,
        _ => return None,
    };
    Some(algo)
}

/// What to do when a single per-page input cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// The first malformed file aborts the run.
    #[default]
    Abort,
    /// Log the file and continue with the rest of the corpus.
    Skip,
}

fn default_lexicon_directory() -> PathBuf {
    PathBuf::from("lexicons")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerConfig {
    pub language: String,
    pub top_n_words_pages: usize,
    pub top_n_global_words: usize,
    pub top_n_topic_words: usize,
    pub working_directory: PathBuf,
    #[serde(default = "default_lexicon_directory")]
    pub lexicon_directory: PathBuf,
    /// Use ln(1 + N/df) instead of ln(N/df).
    #[serde(default)]
    pub smoothed_idf: bool,
    /// Leave consumed WS*.json inputs in place so a failed run can be repeated.
    #[serde(default)]
    pub keep_inputs: bool,
    #[serde(default)]
    pub on_malformed: MalformedPolicy,
}

impl AnalyzerConfig {
    pub fn new<P: AsRef<Path>>(language: &str, working_directory: P) -> Self {
        Self {
            language: language.to_string(),
            top_n_words_pages: 50,
            top_n_global_words: 100,
            top_n_topic_words: 10,
            working_directory: working_directory.as_ref().to_path_buf(),
            lexicon_directory: default_lexicon_directory(),
            smoothed_idf: false,
            keep_inputs: false,
            on_malformed: MalformedPolicy::Abort,
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| AnalyzerError::io(path, e))?;
        serde_json::from_reader(BufReader::new(f)).map_err(|e| AnalyzerError::decode(path, e))
    }

    /// Reject anything that would make a stage fail for reasons unrelated to the corpus.
    pub fn validate(&self) -> Result<()> {
        if self.language.is_empty() {
            return Err(AnalyzerError::config("language not set"));
        }
        if language_name(&self.language).is_none() {
            return Err(AnalyzerError::config(format!(
                "{} is not an available language",
                self.language
            )));
        }
        for (name, value) in [
            ("topNWordsPages", self.top_n_words_pages),
            ("topNGlobalWords", self.top_n_global_words),
            ("topNTopicWords", self.top_n_topic_words),
        ] {
            if value == 0 {
                return Err(AnalyzerError::config(format!("{name} must be positive")));
            }
        }
        if !self.working_directory.is_dir() {
            return Err(AnalyzerError::config(format!(
                "working directory {} does not exist",
                self.working_directory.display()
            )));
        }
        Ok(())
    }

    /// Lexicon name of the configured language. Only meaningful after `validate`.
    pub fn language_name(&self) -> Result<&'static str> {
        language_name(&self.language)
            .ok_or_else(|| AnalyzerError::config(format!("{} is not an available language", self.language)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn accepts_supported_language() {
        let dir = tempdir().unwrap();
        let cfg = AnalyzerConfig::new("simple", dir.path());
        cfg.validate().unwrap();
        assert_eq!(cfg.language_name().unwrap(), "english");
    }

    #[test]
    fn rejects_unknown_language_and_zero_top_n() {
        let dir = tempdir().unwrap();
        let cfg = AnalyzerConfig::new("xx", dir.path());
        assert!(cfg.validate().unwrap_err().is_config());

        let mut cfg = AnalyzerConfig::new("en", dir.path());
        cfg.top_n_topic_words = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("topNTopicWords"));
    }

    #[test]
    fn rejects_missing_directory() {
        let dir = tempdir().unwrap();
        let cfg = AnalyzerConfig::new("it", dir.path().join("absent"));
        assert!(cfg.validate().unwrap_err().is_config());
    }

    #[test]
    fn loads_camel_case_json_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        let body = format!(
            r#"{{"language":"de","topNWordsPages":5,"topNGlobalWords":20,"topNTopicWords":4,"workingDirectory":{:?},"onMalformed":"skip"}}"#,
            dir.path()
        );
        std::fs::write(&path, body).unwrap();
        let cfg = AnalyzerConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.top_n_words_pages, 5);
        assert_eq!(cfg.on_malformed, MalformedPolicy::Skip);
        assert_eq!(cfg.lexicon_directory, PathBuf::from("lexicons"));
        assert!(!cfg.keep_inputs);
    }

    #[test]
    fn stemmer_coverage() {
        assert!(stemmer_for("english").is_some());
        assert!(stemmer_for("japanese").is_none());
    }
}
