use crate::config::stemmer_for;
use crate::error::{AnalyzerError, Result};
use rust_stemmers::Stemmer;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// NFKC + lowercase, the same normalization applied to every lexicon term.
pub fn normalize(term: &str) -> String {
    term.trim().nfkc().collect::<String>().to_lowercase()
}

/// Per-language list of flagged terms, matched against stemmed page words.
#[derive(Debug, Default)]
pub struct BadWordLexicon {
    terms: HashSet<String>,
}

impl BadWordLexicon {
    /// Loads `<dir>/<language>.txt`. A missing lexicon is a configuration problem, not an I/O one.
    pub fn load(dir: &Path, language: &str) -> Result<Self> {
        let path = dir.join(format!("{language}.txt"));
        if !path.is_file() {
            return Err(AnalyzerError::config(format!(
                "no bad-word lexicon for {language} at {}",
                path.display()
            )));
        }
        let text = fs::read_to_string(&path).map_err(|e| AnalyzerError::io(&path, e))?;
        Ok(Self::from_terms(language, text.lines()))
    }

    /// Builds the lexicon from raw terms; blank lines and `#` comments are ignored.
    /// Terms are also stored stemmed when the language has a Snowball stemmer.
    pub fn from_terms<'a, I: IntoIterator<Item = &'a str>>(language: &str, raw: I) -> Self {
        let stemmer = stemmer_for(language).map(Stemmer::create);
        let mut terms = HashSet::new();
        for line in raw {
            let term = normalize(line);
            if term.is_empty() || term.starts_with('#') { continue; }
            if let Some(stemmer) = &stemmer {
                terms.insert(stemmer.stem(&term).to_string());
            }
            terms.insert(term);
        }
        Self { terms }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.terms.contains(word)
    }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}
