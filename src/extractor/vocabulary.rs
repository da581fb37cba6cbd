//! Vocabulary loading and load-time validation (§4.8, §9)
//!
//! The skills/role vocabularies are data, not code: every entry's `patterns[]`
//! must be non-empty and compile, and every `name` must be unique, checked
//! once at load time rather than discovered mid-extraction.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::ExtractionError;

#[derive(Debug, Clone, Deserialize)]
pub struct VocabEntry {
    pub name: String,
    pub patterns: Vec<String>,
}

struct CompiledEntry {
    name: String,
    regexes: Vec<Regex>,
}

fn starts_with_word_char(pattern: &str) -> bool {
    pattern.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_')
}

fn ends_with_word_char(pattern: &str) -> bool {
    pattern.chars().next_back().is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// A loaded, validated, compiled skill (or role) vocabulary
pub struct Vocabulary {
    entries: Vec<CompiledEntry>,
}

impl Vocabulary {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ExtractionError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ExtractionError::VocabularyIo(format!("{}: {e}", path.display())))?;
        Self::load_from_str(&raw)
    }

    pub fn load_from_str(json: &str) -> Result<Self, ExtractionError> {
        let raw: Vec<VocabEntry> = serde_json::from_str(json)
            .map_err(|e| ExtractionError::VocabularyMalformed(e.to_string()))?;
        Self::compile(raw)
    }

    fn compile(raw: Vec<VocabEntry>) -> Result<Self, ExtractionError> {
        let mut seen_names = HashSet::new();
        let mut entries = Vec::with_capacity(raw.len());

        for entry in raw {
            if !seen_names.insert(entry.name.to_lowercase()) {
                return Err(ExtractionError::DuplicateName(entry.name));
            }
            if entry.patterns.is_empty() {
                return Err(ExtractionError::EmptyPatterns(entry.name));
            }

            let mut regexes = Vec::with_capacity(entry.patterns.len());
            for pattern in &entry.patterns {
                // `\b` only holds between a word char and a non-word char, so
                // a pattern edge that's already non-word (C++'s `\+\+`, C#'s
                // `#`) can never satisfy a boundary placed against it — add
                // one only on the edges that are actually word chars.
                let leading = if starts_with_word_char(pattern) { r"\b" } else { "" };
                let trailing = if ends_with_word_char(pattern) { r"\b" } else { "" };
                let compiled = Regex::new(&format!("(?i){leading}{pattern}{trailing}")).map_err(|source| {
                    ExtractionError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    }
                })?;
                regexes.push(compiled);
            }

            entries.push(CompiledEntry { name: entry.name, regexes });
        }

        Ok(Self { entries })
    }

    /// All compiled entries, in file order (longest-name-first callers sort separately)
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &[Regex])> {
        self.entries.iter().map(|e| (e.name.as_str(), e.regexes.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Maps a raw job-card title to one of ~150 canonical role tags; unmatched
/// titles fall through with the raw input retained (§4.8).
pub struct RoleVocabulary {
    entries: Vec<CompiledEntry>,
}

impl RoleVocabulary {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ExtractionError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ExtractionError::VocabularyIo(format!("{}: {e}", path.display())))?;
        Self::load_from_str(&raw)
    }

    pub fn load_from_str(json: &str) -> Result<Self, ExtractionError> {
        let raw: Vec<VocabEntry> = serde_json::from_str(json)
            .map_err(|e| ExtractionError::VocabularyMalformed(e.to_string()))?;
        let vocab = Vocabulary::compile(raw)?;
        Ok(Self { entries: vocab.entries })
    }

    /// Normalise a raw job-card title to its canonical role tag, or return the
    /// original title unchanged if nothing matches.
    pub fn normalize(&self, raw_title: &str) -> String {
        for entry in &self.entries {
            if entry.regexes.iter().any(|re| re.is_match(raw_title)) {
                return entry.name.clone();
            }
        }
        raw_title.to_string()
    }
}
