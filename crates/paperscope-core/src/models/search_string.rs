use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Keywords drawn from one bucket of a thematic group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermGroup {
    pub bucket: String,
    pub keywords: Vec<String>,
}

impl TermGroup {
    pub fn new(bucket: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            bucket: bucket.into(),
            keywords,
        }
    }

    fn joined(&self) -> Option<String> {
        if self.keywords.is_empty() {
            None
        } else {
            Some(self.keywords.join(", "))
        }
    }
}

/// System / intervention / outcome keyword groups of one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermTriple {
    pub system: TermGroup,
    pub intervention: TermGroup,
    pub outcome: TermGroup,
}

impl TermTriple {
    pub fn groups(&self) -> [&TermGroup; 3] {
        [&self.system, &self.intervention, &self.outcome]
    }
}

/// The query that produced a paper.
///
/// Two search strings are equal when their rendered names are equal; the
/// underlying term triples are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchString {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<TermTriple>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_year_filter: Option<String>,
}

/// Column values persisted for a search string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStringPayload {
    pub name: String,
    pub system_keywords: Option<String>,
    pub intervention_keywords: Option<String>,
    pub outcome_keywords: Option<String>,
    pub pub_year_filter: Option<String>,
}

impl SearchString {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            terms: None,
            pub_year_filter: None,
        }
    }

    pub fn with_terms(mut self, terms: TermTriple) -> Self {
        self.terms = Some(terms);
        self
    }

    pub fn with_pub_year_filter(mut self, filter: impl Into<String>) -> Self {
        self.pub_year_filter = Some(filter.into());
        self
    }

    pub fn payload(&self) -> SearchStringPayload {
        let (system_keywords, intervention_keywords, outcome_keywords) = match &self.terms {
            Some(t) => (t.system.joined(), t.intervention.joined(), t.outcome.joined()),
            None => (None, None, None),
        };
        SearchStringPayload {
            name: self.name.clone(),
            system_keywords,
            intervention_keywords,
            outcome_keywords,
            pub_year_filter: self.pub_year_filter.clone(),
        }
    }
}

impl PartialEq for SearchString {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for SearchString {}

impl Hash for SearchString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for SearchString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn triple(system_bucket: &str) -> TermTriple {
        TermTriple {
            system: TermGroup::new(system_bucket, vec!["forestry".into()]),
            intervention: TermGroup::new("carbon markets", vec!["carbon credit".into()]),
            outcome: TermGroup::new("biodiversity", vec!["habitat".into(), "flora".into()]),
        }
    }

    #[test]
    fn equality_ignores_terms() {
        let a = SearchString::new("(forestry) AND (carbon credit)").with_terms(triple("forest"));
        let b = SearchString::new("(forestry) AND (carbon credit)").with_terms(triple("land"));
        assert_ne!(a.terms, b.terms);
        assert_eq!(a, b);

        let set: HashSet<SearchString> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn different_names_are_different() {
        assert_ne!(SearchString::new("a"), SearchString::new("b"));
    }

    #[test]
    fn payload_joins_keywords() {
        let ss = SearchString::new("q")
            .with_terms(triple("forest"))
            .with_pub_year_filter("2005");
        let payload = ss.payload();
        assert_eq!(payload.system_keywords.as_deref(), Some("forestry"));
        assert_eq!(payload.outcome_keywords.as_deref(), Some("habitat, flora"));
        assert_eq!(payload.pub_year_filter.as_deref(), Some("2005"));
    }

    #[test]
    fn payload_without_terms_has_only_name() {
        let payload = SearchString::new("soil carbon").payload();
        assert_eq!(payload.name, "soil carbon");
        assert!(payload.system_keywords.is_none());
        assert!(payload.pub_year_filter.is_none());
    }
}
