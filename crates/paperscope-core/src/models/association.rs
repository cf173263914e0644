use std::fmt;
use std::str::FromStr;

use crate::error::PaperscopeError;

use super::paper::CanonicalPaper;

/// Persisted entity tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Paper,
    Source,
    Author,
    Tag,
    ResearchDb,
    UnGoal,
    SearchString,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Paper,
        EntityKind::Source,
        EntityKind::Author,
        EntityKind::Tag,
        EntityKind::ResearchDb,
        EntityKind::UnGoal,
        EntityKind::SearchString,
    ];

    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Paper => "Paper",
            EntityKind::Source => "Source",
            EntityKind::Author => "PaperAuthor",
            EntityKind::Tag => "PaperTag",
            EntityKind::ResearchDb => "ResearchDB",
            EntityKind::UnGoal => "UNGoal",
            EntityKind::SearchString => "SearchString",
        }
    }

    /// Column holding the natural key.
    pub fn natural_key(self) -> &'static str {
        match self {
            EntityKind::Paper => "title",
            _ => "name",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            EntityKind::Paper => &[
                "source_id",
                "title",
                "publication_date",
                "pub_type",
                "content_type",
                "abstract",
                "full_text",
                "citation_count",
                "doi",
                "url",
            ],
            EntityKind::SearchString => &[
                "name",
                "system_keywords",
                "intervention_keywords",
                "outcome_keywords",
                "pub_year_filter",
            ],
            _ => &["name"],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for EntityKind {
    type Err = PaperscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.table().eq_ignore_ascii_case(s))
            .ok_or_else(|| PaperscopeError::UnknownEntity(s.to_string()))
    }
}

/// Pure association tables keyed by `(paper_id, <other>_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    AuthorWritesPaper,
    PaperHasTag,
    PaperIsInDb,
    PaperHasSearchString,
    PaperHasUnGoal,
}

impl LinkKind {
    pub fn table(self) -> &'static str {
        match self {
            LinkKind::AuthorWritesPaper => "AuthorWritesPaper",
            LinkKind::PaperHasTag => "PaperHasTag",
            LinkKind::PaperIsInDb => "PaperIsInDB",
            LinkKind::PaperHasSearchString => "PaperHasSearchString",
            LinkKind::PaperHasUnGoal => "PaperHasUNGoal",
        }
    }

    pub fn other_column(self) -> &'static str {
        match self {
            LinkKind::AuthorWritesPaper => "author_id",
            LinkKind::PaperHasTag => "tag_id",
            LinkKind::PaperIsInDb => "db_id",
            LinkKind::PaperHasSearchString => "search_string_id",
            LinkKind::PaperHasUnGoal => "un_goal_id",
        }
    }
}

/// List-valued associations of a paper that resolve through a lookup entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociationKind {
    Authors,
    Tags,
    Databases,
    Goals,
}

impl AssociationKind {
    pub const ALL: [AssociationKind; 4] = [
        AssociationKind::Authors,
        AssociationKind::Tags,
        AssociationKind::Databases,
        AssociationKind::Goals,
    ];

    pub fn entity(self) -> EntityKind {
        match self {
            AssociationKind::Authors => EntityKind::Author,
            AssociationKind::Tags => EntityKind::Tag,
            AssociationKind::Databases => EntityKind::ResearchDb,
            AssociationKind::Goals => EntityKind::UnGoal,
        }
    }

    pub fn link(self) -> LinkKind {
        match self {
            AssociationKind::Authors => LinkKind::AuthorWritesPaper,
            AssociationKind::Tags => LinkKind::PaperHasTag,
            AssociationKind::Databases => LinkKind::PaperIsInDb,
            AssociationKind::Goals => LinkKind::PaperHasUnGoal,
        }
    }

    pub fn names(self, paper: &CanonicalPaper) -> &[String] {
        match self {
            AssociationKind::Authors => &paper.authors,
            AssociationKind::Tags => &paper.tags,
            AssociationKind::Databases => &paper.databases,
            AssociationKind::Goals => &paper.goals,
        }
    }
}
