use std::collections::HashSet;

use paperscope_core::{SearchString, TermGroup, TermTriple};
use rand::rngs::StdRng;
use rand::seq::{SliceRandom, index};
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use super::QuerySyntax;
use super::vocabulary::{Buckets, KeywordGroup, Vocabulary};

/// Draws keyword triples and renders them into distinct search strings.
pub struct SearchStringGenerator<R: Rng = StdRng> {
    vocabulary: Vocabulary,
    syntax: QuerySyntax,
    rng: R,
    max_terms: usize,
    max_redraws: usize,
    pub_year_filter: Option<String>,
}

impl SearchStringGenerator<StdRng> {
    pub fn new(vocabulary: Vocabulary, syntax: QuerySyntax) -> Self {
        Self::with_rng(vocabulary, syntax, StdRng::from_entropy())
    }
}

impl<R: Rng> SearchStringGenerator<R> {
    pub fn with_rng(vocabulary: Vocabulary, syntax: QuerySyntax, rng: R) -> Self {
        Self {
            vocabulary,
            syntax,
            rng,
            max_terms: 3,
            max_redraws: 100,
            pub_year_filter: None,
        }
    }

    /// Keywords sampled per group.
    pub fn with_max_terms(mut self, max_terms: usize) -> Self {
        self.max_terms = max_terms.max(1);
        self
    }

    /// Draw attempts per requested query before giving up.
    pub fn with_max_redraws(mut self, max_redraws: usize) -> Self {
        self.max_redraws = max_redraws.max(1);
        self
    }

    pub fn with_pub_year_filter(mut self, filter: Option<String>) -> Self {
        self.pub_year_filter = filter;
        self
    }

    pub fn syntax(&self) -> QuerySyntax {
        self.syntax
    }

    /// One bucket per group, then up to `max_terms` distinct keywords from it.
    pub fn draw(&mut self) -> TermTriple {
        let [system, intervention, outcome] = KeywordGroup::ALL.map(|group| {
            let buckets = self.vocabulary.group(group);
            draw_group(&mut self.rng, buckets, self.max_terms)
        });
        TermTriple {
            system,
            intervention,
            outcome,
        }
    }

    pub fn render(&self, triple: &TermTriple) -> String {
        self.syntax.render(triple)
    }

    pub fn next_search_string(&mut self) -> SearchString {
        let triple = self.draw();
        let mut search_string = SearchString::new(self.render(&triple)).with_terms(triple);
        search_string.pub_year_filter = self.pub_year_filter.clone();
        search_string
    }

    /// Up to `n` search strings whose names are neither in `existing` nor
    /// repeated. Stops early once `max_redraws` draws in a row produce only
    /// known names.
    pub fn generate_distinct(&mut self, n: usize, existing: &HashSet<String>) -> Vec<SearchString> {
        let mut seen = existing.clone();
        let mut out = Vec::with_capacity(n);

        while out.len() < n {
            let fresh = (0..self.max_redraws).find_map(|_| {
                let candidate = self.next_search_string();
                if seen.contains(&candidate.name) {
                    debug!(query = %candidate.name, "query was already drawn");
                    None
                } else {
                    Some(candidate)
                }
            });

            match fresh {
                Some(search_string) => {
                    seen.insert(search_string.name.clone());
                    out.push(search_string);
                }
                None => {
                    warn!(
                        requested = n,
                        found = out.len(),
                        max_redraws = self.max_redraws,
                        "keyword space exhausted, returning fewer queries"
                    );
                    break;
                }
            }
        }
        out
    }
}

fn draw_group<R: Rng>(rng: &mut R, buckets: &Buckets, max_terms: usize) -> TermGroup {
    let names: Vec<&String> = buckets.iter().filter(|(_, w)| !w.is_empty()).map(|(b, _)| b).collect();
    let Some(bucket) = names.choose(rng) else {
        return TermGroup::new("", Vec::new());
    };
    let words = &buckets[*bucket];
    let amount = max_terms.min(words.len());
    let keywords = index::sample(rng, words.len(), amount)
        .iter()
        .map(|i| words[i].clone())
        .collect();
    TermGroup::new(bucket.as_str(), keywords)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn seeded(vocabulary: Vocabulary) -> SearchStringGenerator<StdRng> {
        SearchStringGenerator::with_rng(vocabulary, QuerySyntax::Plain, StdRng::seed_from_u64(7))
    }

    fn single(bucket: &str, words: &[&str]) -> Buckets {
        BTreeMap::from([(bucket.to_string(), words.iter().map(|w| w.to_string()).collect())])
    }

    #[test]
    fn draw_samples_distinct_keywords_from_one_bucket() {
        let vocab = Vocabulary::default();
        let mut generator = seeded(vocab.clone());
        for _ in 0..50 {
            let triple = generator.draw();
            for (group, drawn) in KeywordGroup::ALL.iter().zip(triple.groups()) {
                let bucket = &vocab.group(*group)[&drawn.bucket];
                assert_eq!(drawn.keywords.len(), 3.min(bucket.len()));
                assert!(drawn.keywords.iter().all(|k| bucket.contains(k)));
                let unique: HashSet<_> = drawn.keywords.iter().collect();
                assert_eq!(unique.len(), drawn.keywords.len());
            }
        }
    }

    #[test]
    fn short_buckets_give_all_their_keywords() {
        let vocab = Vocabulary {
            system: single("soil", &["soil"]),
            intervention: single("markets", &["carbon credit", "offset"]),
            outcome: single("nature", &["habitat"]),
        };
        let triple = seeded(vocab).with_max_terms(5).draw();
        assert_eq!(triple.system.keywords, vec!["soil"]);
        assert_eq!(triple.intervention.keywords.len(), 2);
    }

    #[test]
    fn same_name_from_different_triples_is_kept_once() {
        let mut system = single("soil", &["soil"]);
        system.insert("land".into(), vec!["soil".into()]);
        let vocab = Vocabulary {
            system,
            intervention: single("markets", &["carbon credit"]),
            outcome: single("nature", &["habitat"]),
        };

        let mut generator = seeded(vocab).with_max_redraws(20);
        let drawn = generator.generate_distinct(3, &HashSet::new());

        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0].name, "(soil) AND (carbon credit) AND (habitat)");
    }

    #[test]
    fn existing_names_are_not_redrawn() {
        let vocab = Vocabulary {
            system: single("soil", &["soil", "peat"]),
            intervention: single("markets", &["carbon credit"]),
            outcome: single("nature", &["habitat"]),
        };
        let existing = HashSet::from(["(soil) AND (carbon credit) AND (habitat)".to_string()]);

        let drawn = seeded(vocab).with_max_terms(1).generate_distinct(2, &existing);

        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0].name, "(peat) AND (carbon credit) AND (habitat)");
    }

    #[test]
    fn generated_names_are_distinct() {
        let mut generator = seeded(Vocabulary::default()).with_pub_year_filter(Some("2005".into()));
        let drawn = generator.generate_distinct(25, &HashSet::new());
        assert_eq!(drawn.len(), 25);
        let names: HashSet<_> = drawn.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), 25);
        assert!(drawn.iter().all(|s| s.terms.is_some()));
        assert_eq!(drawn[0].pub_year_filter.as_deref(), Some("2005"));
    }

    #[test]
    fn arxiv_generator_renders_feed_syntax() {
        let vocab = Vocabulary {
            system: single("land", &["working lands"]),
            intervention: single("markets", &["carbon credit"]),
            outcome: single("nature", &["habitat"]),
        };
        let mut generator =
            SearchStringGenerator::with_rng(vocab, QuerySyntax::Arxiv, StdRng::seed_from_u64(1));
        assert_eq!(
            generator.next_search_string().name,
            "(all:working+lands)+AND+(all:carbon+credit)+AND+(all:habitat)"
        );
    }
}
