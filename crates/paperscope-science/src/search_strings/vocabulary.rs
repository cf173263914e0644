use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, ScienceError};

/// Thematic group a keyword bucket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeywordGroup {
    System,
    Intervention,
    Outcome,
}

impl KeywordGroup {
    pub const ALL: [KeywordGroup; 3] = [
        KeywordGroup::System,
        KeywordGroup::Intervention,
        KeywordGroup::Outcome,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "system" => Some(KeywordGroup::System),
            "intervention" => Some(KeywordGroup::Intervention),
            "outcome" => Some(KeywordGroup::Outcome),
            _ => None,
        }
    }
}

/// Bucket name to keywords, per group.
pub type Buckets = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub system: Buckets,
    pub intervention: Buckets,
    pub outcome: Buckets,
}

#[derive(Debug, Deserialize)]
struct KeywordRow {
    group: String,
    bucket: String,
    keyword: String,
}

fn buckets(entries: &[(&str, &[&str])]) -> Buckets {
    entries
        .iter()
        .map(|(bucket, words)| {
            (
                bucket.to_string(),
                words.iter().map(|w| w.to_string()).collect(),
            )
        })
        .collect()
}

impl Default for Vocabulary {
    /// Land-use and carbon-market vocabulary.
    fn default() -> Self {
        Self {
            system: buckets(&[
                (
                    "land",
                    &[
                        "working lands",
                        "managed lands",
                        "AFOLU",
                        "land use sector",
                        "land-use sector",
                        "LULC",
                    ],
                ),
                (
                    "agriculture",
                    &["agricultur", "agroforestry", "graz", "crop", "farm", "agroecolog"],
                ),
                ("forest", &["forestry", "reforestation", "forest management"]),
            ]),
            intervention: buckets(&[
                (
                    "carbon markets",
                    &[
                        "carbon market",
                        "carbon offset",
                        "carbon offsetting",
                        "carbon credit",
                        "carbon credits",
                        "carbon accounting",
                        "greenhouse gas accounting",
                        "GHG accounting",
                        "environmental credit",
                        "environmental credits",
                        "environmental crediting",
                    ],
                ),
                (
                    "climate change",
                    &[
                        "climate change action",
                        "climate change mitigation",
                        "climate action",
                        "climate mitigation",
                        "climate actions",
                        "carbon project",
                        "carbon projects",
                        "carbon-project",
                        "carbon-projects",
                        "carbon intervention",
                        "emissions reduction scheme",
                        "ERS",
                        "emissions trading scheme",
                        "ETS",
                        "emissions trading schemes",
                        "climate change policy",
                        "climate mitigation policy",
                        "climate change mitigation policy",
                        "climate change action policy",
                        "climate action policy",
                    ],
                ),
            ]),
            outcome: buckets(&[
                (
                    "co-benefits",
                    &["co-benefit", "cobenefit", "added value", "ecosystem services"],
                ),
                (
                    "ESG",
                    &[
                        "SDG",
                        "sustainable development goals",
                        "ESG",
                        "environmental, social and corporate governance",
                        "CSR",
                        "corporate social responsibility",
                    ],
                ),
                (
                    "biodiversity",
                    &[
                        "biodiversity",
                        "species richness",
                        "wildlife",
                        "pollinator",
                        "flora",
                        "fauna",
                        "environmental protection",
                        "protected area",
                        "conservation",
                        "habitat",
                    ],
                ),
                (
                    "development",
                    &[
                        "livelihoods",
                        "financial",
                        "econom",
                        "employment",
                        "profit",
                        "poverty",
                        "inequalit",
                    ],
                ),
                (
                    "ecosystem services",
                    &[
                        "payment for ecosystem services",
                        "PES",
                        "environmental service",
                        "payments for ecosystem services",
                    ],
                ),
                (
                    "resources",
                    &[
                        "food security",
                        "water security",
                        "water access",
                        "energy security",
                        "water rights",
                        "water quality",
                        "pollution",
                    ],
                ),
            ]),
        }
    }
}

impl Vocabulary {
    pub fn group(&self, group: KeywordGroup) -> &Buckets {
        match group {
            KeywordGroup::System => &self.system,
            KeywordGroup::Intervention => &self.intervention,
            KeywordGroup::Outcome => &self.outcome,
        }
    }

    fn group_mut(&mut self, group: KeywordGroup) -> &mut Buckets {
        match group {
            KeywordGroup::System => &mut self.system,
            KeywordGroup::Intervention => &mut self.intervention,
            KeywordGroup::Outcome => &mut self.outcome,
        }
    }

    /// Load a keyword file with a `group,bucket,keyword` header.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut vocabulary = Self {
            system: Buckets::new(),
            intervention: Buckets::new(),
            outcome: Buckets::new(),
        };

        for row in csv.deserialize::<KeywordRow>() {
            let row = row?;
            let group = KeywordGroup::parse(&row.group)
                .ok_or_else(|| ScienceError::Vocabulary(format!("unknown group '{}'", row.group)))?;
            if row.keyword.is_empty() || row.bucket.is_empty() {
                continue;
            }
            let keywords = vocabulary.group_mut(group).entry(row.bucket).or_default();
            if !keywords.contains(&row.keyword) {
                keywords.push(row.keyword);
            }
        }

        vocabulary.validate()?;
        Ok(vocabulary)
    }

    /// Every group needs at least one non-empty bucket.
    pub fn validate(&self) -> Result<()> {
        for group in KeywordGroup::ALL {
            if !self.group(group).values().any(|words| !words.is_empty()) {
                return Err(ScienceError::Vocabulary(format!("no keywords for {group:?}")));
            }
        }
        Ok(())
    }
}
