//! Three-layer, region-consuming skill extraction (§4.8)
//!
//! Each layer emits matches against a description and marks their character
//! span `consumed`. Later layers skip anything overlapping an earlier
//! layer's consumed span, so a single-token vocabulary entry never
//! double-counts a phrase Layer 1 already attributed.

pub mod vocabulary;

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

pub use vocabulary::{RoleVocabulary, Vocabulary};

/// Curated multi-word technical phrases, longest first (greedy). Each phrase
/// maps to itself as the canonical name unless the synonym table overrides it.
const PHRASES: &[&str] = &[
    "natural language processing",
    "machine learning operations",
    "model lifecycle management",
    "continuous integration",
    "continuous delivery",
    "deep neural networks",
    "computer vision",
    "data engineering",
    "ci/cd",
];

/// `(trigger_pattern, captures_trailing_noun_phrase)` context templates (§4.8 Layer 2)
const CONTEXT_TEMPLATES: &[&str] = &[
    r"(?i)\b(?:experience|proficiency|expertise)\s+(?:with|in|of)\s+([A-Za-z0-9+#./\- ]{2,40}?)\b[.,;\n]",
    r"(?i)\b(?:skilled|proficient|expert)\s+(?:in|with|at)\s+([A-Za-z0-9+#./\- ]{2,40}?)\b[.,;\n]",
    r"(?i)\b(?:using|leveraging|implementing|building)\s+([A-Za-z0-9+#./\- ]{2,40}?)\b[.,;\n]",
    r"(?i)\b(?:knowledge|understanding)\s+of\s+([A-Za-z0-9+#./\- ]{2,40}?)\b[.,;\n]",
    r"(?i)\b(?:hands-on|practical)\s+experience\s+with\s+([A-Za-z0-9+#./\- ]{2,40}?)\b[.,;\n]",
    r"(?i)\b(?:requires?|must\s+have)\s+(?:experience\s+with\s+)?([A-Za-z0-9+#./\- ]{2,40}?)\b[.,;\n]",
];

fn compiled_context_templates() -> &'static Vec<Regex> {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| CONTEXT_TEMPLATES.iter().map(|p| Regex::new(p).unwrap()).collect())
}

fn synonym_table() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            ("ml", "Machine Learning"),
            ("ml engineering", "Machine Learning"),
            ("machine learning", "Machine Learning"),
            ("nlp", "Natural Language Processing"),
            ("text processing", "Natural Language Processing"),
            ("natural language processing", "Natural Language Processing"),
            ("ci-cd", "CI/CD"),
            ("cicd", "CI/CD"),
            ("ci/cd", "CI/CD"),
            ("continuous integration", "CI/CD"),
            ("deep neural networks", "Deep Learning"),
            ("dl", "Deep Learning"),
            ("deep learning", "Deep Learning"),
        ])
    })
}

fn canonicalize(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    synonym_table()
        .get(lower.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| titlecase(raw.trim()))
}

fn titlecase(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Default, Clone)]
struct ConsumedRanges(Vec<(usize, usize)>);

impl ConsumedRanges {
    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.0.iter().any(|&(s, e)| start < e && s < end)
    }

    fn consume(&mut self, start: usize, end: usize) {
        self.0.push((start, end));
    }
}

/// Region-consuming 3-layer skill extractor
pub struct SkillExtractor {
    vocabulary: Vocabulary,
    phrases: Vec<&'static str>,
}

impl SkillExtractor {
    pub fn new(vocabulary: Vocabulary) -> Self {
        let mut phrases: Vec<&'static str> = PHRASES.to_vec();
        phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));
        Self { vocabulary, phrases }
    }

    /// Extract canonical skill names from `description`, deduplicated
    /// case-insensitively, preserving first-occurrence order (I4).
    ///
    /// Layers run in priority order for the purpose of *claiming* spans
    /// (Layer 1 phrases claim before Layer 2 context, which claims before
    /// Layer 3 vocabulary), but the final list is ordered by each match's
    /// position in the document, not by which layer found it.
    pub fn extract(&self, description: &str) -> Vec<String> {
        let mut consumed = ConsumedRanges::default();
        let mut hits: Vec<(usize, String)> = Vec::new();

        self.layer1_phrases(description, &mut consumed, &mut hits);
        self.layer2_context(description, &mut consumed, &mut hits);
        self.layer3_vocabulary(description, &mut consumed, &mut hits);

        hits.sort_by_key(|(start, _)| *start);

        let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();
        let mut ordered = Vec::new();
        for (_, name) in hits {
            if seen.insert(name.to_lowercase()) {
                ordered.push(name);
            }
        }
        ordered
    }

    fn layer1_phrases(&self, description: &str, consumed: &mut ConsumedRanges, hits: &mut Vec<(usize, String)>) {
        let lower = description.to_lowercase();
        for phrase in &self.phrases {
            let mut search_from = 0usize;
            while let Some(pos) = lower[search_from..].find(phrase) {
                let start = search_from + pos;
                let end = start + phrase.len();
                search_from = end;

                if consumed.overlaps(start, end) {
                    continue;
                }
                consumed.consume(start, end);
                hits.push((start, canonicalize(phrase)));
            }
        }
    }

    fn layer2_context(&self, description: &str, consumed: &mut ConsumedRanges, hits: &mut Vec<(usize, String)>) {
        for template in compiled_context_templates() {
            for caps in template.captures_iter(description) {
                let Some(m) = caps.get(1) else { continue };
                let (start, end) = (m.start(), m.end());
                if consumed.overlaps(start, end) {
                    continue;
                }

                let candidate = m.as_str().trim().to_lowercase();
                if let Some(canonical) = synonym_table().get(candidate.as_str()) {
                    consumed.consume(start, end);
                    hits.push((start, (*canonical).to_string()));
                }
                // Unmapped candidates are discarded: Layer 2 does not
                // introduce new vocabulary (§4.8).
            }
        }
    }

    fn layer3_vocabulary(&self, description: &str, consumed: &mut ConsumedRanges, hits: &mut Vec<(usize, String)>) {
        for (name, regexes) in self.vocabulary.entries() {
            for re in regexes {
                for m in re.find_iter(description) {
                    let (start, end) = (m.start(), m.end());
                    if consumed.overlaps(start, end) {
                        continue;
                    }
                    consumed.consume(start, end);
                    hits.push((start, name.to_string()));
                }
            }
        }
    }
}
