//! Random boolean queries over a keyword vocabulary.

use paperscope_core::TermTriple;
use serde::{Deserialize, Serialize};

pub mod generator;
pub mod vocabulary;

pub use generator::SearchStringGenerator;
pub use vocabulary::{KeywordGroup, Vocabulary};

/// Boolean query dialect of the target search API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuerySyntax {
    /// `(a OR b) AND (c OR d)`
    #[default]
    Plain,
    /// `(all:a+OR+all:b)+AND+(all:c+OR+all:d)`
    Arxiv,
}

impl QuerySyntax {
    pub fn render(self, triple: &TermTriple) -> String {
        let (or, and) = match self {
            QuerySyntax::Plain => (" OR ", " AND "),
            QuerySyntax::Arxiv => ("+OR+", "+AND+"),
        };
        triple
            .groups()
            .iter()
            .map(|group| {
                let terms: Vec<String> = group.keywords.iter().map(|k| self.term(k)).collect();
                format!("({})", terms.join(or))
            })
            .collect::<Vec<_>>()
            .join(and)
    }

    fn term(self, keyword: &str) -> String {
        match self {
            QuerySyntax::Plain => keyword.to_string(),
            QuerySyntax::Arxiv => format!("all:{}", keyword.replace(' ', "+")),
        }
    }
}

impl std::str::FromStr for QuerySyntax {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(QuerySyntax::Plain),
            "arxiv" => Ok(QuerySyntax::Arxiv),
            other => Err(format!("unknown query syntax: {other}")),
        }
    }
}
