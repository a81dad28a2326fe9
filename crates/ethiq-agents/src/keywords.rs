//! Case-insensitive keyword matching.
//!
//! Keywords are written with either spaces or underscores between words
//! (`hate speech`, `racial_stereotypes`). Both forms match any run of
//! whitespace or underscores in the content, so `Hate  Speech` and
//! `hate_speech` are both detected.

use regex::{Regex, RegexSet};

use ethiq_council::{CouncilError, Result};

/// A compiled list of keywords.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    labels: Vec<String>,
    set: RegexSet,
}

impl KeywordSet {
    /// Compiles `keywords`.
    ///
    /// # Errors
    ///
    /// Returns [`CouncilError::InvalidConfig`] if a keyword is blank or the
    /// combined pattern exceeds the regex size limit.
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = keywords.into_iter().map(Into::into).collect();

        let mut patterns = Vec::with_capacity(labels.len());
        for label in &labels {
            patterns.push(pattern_for(label)?);
        }

        let set = RegexSet::new(&patterns)
            .map_err(|e| CouncilError::InvalidConfig(format!("keyword set: {}", e)))?;

        Ok(Self { labels, set })
    }

    /// Keywords found in `content`, in declaration order.
    pub fn matches<'a>(&'a self, content: &str) -> Vec<&'a str> {
        self.set
            .matches(content)
            .into_iter()
            .map(|i| self.labels[i].as_str())
            .collect()
    }

    /// Number of distinct keywords found in `content`.
    pub fn count(&self, content: &str) -> usize {
        self.set.matches(content).iter().count()
    }

    /// Returns true if any keyword occurs in `content`.
    pub fn is_match(&self, content: &str) -> bool {
        self.set.is_match(content)
    }

    /// The keywords as declared.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of keywords.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if the set has no keywords.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Keyword sets grouped under category names.
#[derive(Debug, Clone)]
pub struct KeywordCategories {
    categories: Vec<(String, KeywordSet)>,
}

impl KeywordCategories {
    /// Compiles `(category, keywords)` pairs.
    pub fn new<C, K, S>(categories: C) -> Result<Self>
    where
        C: IntoIterator<Item = (S, K)>,
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut compiled = Vec::new();
        for (name, keywords) in categories {
            compiled.push((name.into(), KeywordSet::new(keywords)?));
        }
        Ok(Self {
            categories: compiled,
        })
    }

    /// `(category, keyword)` pairs found in `content`.
    pub fn matches<'a>(&'a self, content: &str) -> Vec<(&'a str, &'a str)> {
        self.categories
            .iter()
            .flat_map(|(name, set)| {
                set.matches(content)
                    .into_iter()
                    .map(move |keyword| (name.as_str(), keyword))
            })
            .collect()
    }

    /// Total number of keywords found across categories.
    pub fn count(&self, content: &str) -> usize {
        self.categories.iter().map(|(_, set)| set.count(content)).sum()
    }
}

fn pattern_for(keyword: &str) -> Result<String> {
    let words: Vec<String> = keyword
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();

    if words.is_empty() {
        return Err(CouncilError::InvalidConfig(format!(
            "blank keyword '{}'",
            keyword
        )));
    }

    let pattern = format!(r"(?i){}", words.join(r"[\s_]+"));
    // Surface per-keyword compile errors with the offending keyword.
    Regex::new(&pattern)
        .map_err(|e| CouncilError::InvalidConfig(format!("keyword '{}': {}", keyword, e)))?;
    Ok(pattern)
}
