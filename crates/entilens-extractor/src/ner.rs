//! Rule-based Named Entity Recognition
//!
//! Offline recognizer registered under the model name `builtin`. It uses
//! regex patterns for numeric and temporal entities and a small gazetteer for
//! well-known names. It is meant for environments without an NER service and
//! for tests; the statistical models behind the remote service are far more
//! complete.

use regex::Regex;

use entilens_core::{byte_range_to_chars, EntityLabel, EntityRecognizer, RawEntity, Result};

/// Model name of the rule-based recognizer
pub const BUILTIN_MODEL: &str = "builtin";

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December|Jan\\.|Feb\\.|Mar\\.|Apr\\.|Aug\\.|Sept?\\.|Oct\\.|Nov\\.|Dec\\.";
const WEEKDAYS: &str = "Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday";
const UNITS: &str = "km|kilometers?|kilometres?|miles?|kg|kilograms?|grams?|lbs?|tons?|tonnes?|meters?|metres?|cm|mm|feet|foot|ft|inches|liters?|litres?|gallons?|acres?|hectares?|square (?:miles|kilometers|kilometres|feet|meters|metres)";
const NUMBER: &str = "\\d{1,3}(?:,\\d{3})+(?:\\.\\d+)?|\\d+(?:\\.\\d+)?";
const NUMBER_WORDS: &str = "one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|twenty|thirty|forty|fifty|hundred|thousand|dozen";

/// A match before overlap resolution (byte offsets)
#[derive(Debug, Clone)]
struct Candidate {
    start: usize,
    end: usize,
    label: EntityLabel,
    confidence: f32,
}

/// A compiled rule; `group` selects a capture group instead of the whole match
struct Rule {
    regex: Regex,
    label: EntityLabel,
    confidence: f32,
    group: Option<usize>,
}

/// Rule-based NER using regex patterns and a gazetteer
pub struct RuleBasedNer {
    rules: Vec<Rule>,
}

impl RuleBasedNer {
    /// Create a new rule-based NER with the default English rules
    pub fn new() -> Self {
        let mut ner = Self { rules: Vec::new() };

        ner.init_patterns();
        ner.init_gazetteer();
        ner
    }

    /// Initialize regex patterns for numeric and temporal entities
    fn init_patterns(&mut self) {
        // Dates
        self.add_pattern(r"\b\d{4}-\d{1,2}-\d{1,2}\b", EntityLabel::Date, 0.95);
        self.add_pattern(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b", EntityLabel::Date, 0.95);
        self.add_pattern(
            &format!(r"\b(?:{MONTHS})\s+\d{{1,2}}(?:st|nd|rd|th)?(?:,?\s+\d{{4}})?"),
            EntityLabel::Date,
            0.95,
        );
        self.add_pattern(
            &format!(r"\b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:{MONTHS})(?:,?\s+\d{{4}})?"),
            EntityLabel::Date,
            0.95,
        );
        self.add_pattern(
            &format!(r"\b(?:{MONTHS})\s+\d{{4}}\b"),
            EntityLabel::Date,
            0.95,
        );
        self.add_pattern(&format!(r"\b(?:{WEEKDAYS})\b"), EntityLabel::Date, 0.9);
        self.add_pattern(
            r"\b(?i:today|yesterday|tomorrow|last (?:week|month|year)|next (?:week|month|year))\b",
            EntityLabel::Date,
            0.85,
        );
        self.add_pattern(r"\bthe (?:19|20)\d0s\b", EntityLabel::Date, 0.9);
        self.add_pattern(r"\b(?:1[5-9]|20)\d{2}\b", EntityLabel::Date, 0.7);

        // Money
        self.add_pattern(
            &format!(r"[$€£¥]\s?(?:{NUMBER})(?:\s?(?:million|billion|trillion|[mbk]n?)\b)?"),
            EntityLabel::Money,
            0.95,
        );
        self.add_pattern(
            &format!(
                r"\b(?:{NUMBER})(?:\s?(?:million|billion|trillion))?\s?(?:dollars|euros|pounds sterling|yen|USD|EUR|GBP|cents)\b"
            ),
            EntityLabel::Money,
            0.95,
        );

        // Percentages
        self.add_pattern(
            &format!(r"\b(?:{NUMBER})\s?(?:%|percent\b|per cent\b)"),
            EntityLabel::Percent,
            0.95,
        );

        // Quantities
        self.add_pattern(
            &format!(r"\b(?:{NUMBER})\s?(?:{UNITS})\b"),
            EntityLabel::Quantity,
            0.9,
        );

        // Cardinals
        self.add_pattern(&format!(r"\b(?:{NUMBER})\b"), EntityLabel::Cardinal, 0.5);
        self.add_pattern(
            &format!(r"\b(?i:{NUMBER_WORDS})\b"),
            EntityLabel::Cardinal,
            0.4,
        );

        // People introduced by a title; the title itself is not part of the name
        self.add_group_pattern(
            r"\b(?:Mr|Mrs|Ms|Dr|Prof|President|Senator|Sir|Dame|Queen|King|Pope|CEO)\.?\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2})",
            EntityLabel::Person,
            0.85,
            1,
        );
    }

    /// Initialize the gazetteer of well-known names
    fn init_gazetteer(&mut self) {
        self.add_terms(
            EntityLabel::Gpe,
            &[
                "United States", "U.S.", "USA", "United Kingdom", "U.K.", "UK", "China",
                "France", "Germany", "Japan", "India", "Brazil", "Canada", "Russia", "Italy",
                "Spain", "Mexico", "Australia", "South Korea", "Korea", "Switzerland",
                "Netherlands", "Sweden", "Norway", "Egypt", "Nigeria", "Kenya", "Argentina",
                "London", "Paris", "Berlin", "Tokyo", "New York", "New York City", "Beijing",
                "Moscow", "Washington", "Rome", "Madrid", "Zurich", "Zürich", "Seoul",
                "San Francisco", "Los Angeles", "Chicago", "Boston", "Toronto", "Sydney",
                "Mumbai", "Delhi", "California", "Texas", "Florida", "Bavaria",
            ],
        );
        self.add_terms(
            EntityLabel::Loc,
            &[
                "Europe", "Asia", "Africa", "North America", "South America", "Antarctica",
                "the Alps", "the Himalayas", "Pacific Ocean", "Atlantic Ocean", "Indian Ocean",
                "Mediterranean", "Mount Everest", "Sahara", "Silicon Valley", "Middle East",
            ],
        );
        self.add_terms(
            EntityLabel::Org,
            &[
                "Google", "Apple", "Microsoft", "Amazon", "Meta", "Facebook", "IBM", "Tesla",
                "Intel", "Nvidia", "Samsung", "Toyota", "Netflix", "OpenAI", "SpaceX",
                "United Nations", "NATO", "European Union", "EU", "World Health Organization",
                "NASA", "FBI", "CIA", "Congress", "Senate", "Harvard University", "Harvard",
                "MIT", "Stanford University", "Oxford University", "University of Cambridge",
                "Reuters", "BBC", "The New York Times",
            ],
        );
        self.add_terms(
            EntityLabel::Norp,
            &[
                "American", "Americans", "British", "French", "German", "Germans", "Chinese",
                "Japanese", "Indian", "Russian", "Russians", "European", "Europeans",
                "Italian", "Spanish", "Mexican", "Canadian", "Swiss", "Christian", "Christians",
                "Muslim", "Muslims", "Jewish", "Buddhist", "Hindu", "Democrat", "Democrats",
                "Republican", "Republicans",
            ],
        );
        self.add_terms(
            EntityLabel::Language,
            &[
                "English", "Mandarin", "Cantonese", "Arabic", "Hindi", "Portuguese", "Latin",
                "Swahili", "Esperanto", "Korean language",
            ],
        );
        self.add_terms(
            EntityLabel::Event,
            &[
                "World War II", "World War I", "Second World War", "First World War",
                "the Cold War", "Olympics", "Olympic Games", "World Cup", "Super Bowl",
                "Hurricane Katrina", "the Great Depression", "the French Revolution",
            ],
        );
        self.add_terms(
            EntityLabel::Product,
            &[
                "iPhone", "iPad", "MacBook", "Windows", "Android", "PlayStation", "Xbox",
                "Boeing 747", "Model S", "ChatGPT", "Kindle",
            ],
        );
        self.add_terms(
            EntityLabel::WorkOfArt,
            &[
                "Mona Lisa", "Hamlet", "Macbeth", "The Great Gatsby", "Star Wars", "Don Quixote",
                "War and Peace", "The Starry Night", "Pride and Prejudice",
            ],
        );
        self.add_terms(
            EntityLabel::Person,
            &[
                "Barack Obama", "Obama", "Albert Einstein", "Einstein", "Marie Curie",
                "Ada Lovelace", "Charles Babbage", "Alan Turing", "Isaac Newton", "Elon Musk",
                "Bill Gates", "Steve Jobs", "William Shakespeare", "Shakespeare",
                "Angela Merkel", "Taylor Swift", "Leonardo da Vinci", "Napoleon",
            ],
        );
    }

    /// Add a regex pattern labelling the whole match
    fn add_pattern(&mut self, pattern: &str, label: EntityLabel, confidence: f32) {
        self.push_rule(pattern, label, confidence, None);
    }

    /// Add a regex pattern labelling one capture group
    fn add_group_pattern(&mut self, pattern: &str, label: EntityLabel, confidence: f32, group: usize) {
        self.push_rule(pattern, label, confidence, Some(group));
    }

    fn push_rule(&mut self, pattern: &str, label: EntityLabel, confidence: f32, group: Option<usize>) {
        match Regex::new(pattern) {
            Ok(regex) => self.rules.push(Rule {
                regex,
                label,
                confidence,
                group,
            }),
            Err(e) => tracing::warn!(%label, error = %e, "Skipping invalid NER pattern"),
        }
    }

    /// Add gazetteer terms as one alternation, longest terms first
    fn add_terms(&mut self, label: EntityLabel, terms: &[&str]) {
        let mut terms: Vec<&str> = terms.to_vec();
        terms.sort_by_key(|t| std::cmp::Reverse(t.len()));

        let alternation = terms
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");

        // Terms such as "U.S." end in a non-word character, so a plain \b
        // cannot close them; the trailing separator is trimmed in `candidates`
        let pattern = format!(r"\b(?:{alternation})(?:\b|$|\s|[,;:!?)])");
        self.add_pattern(&pattern, label, 0.9);
    }

    /// Collect every rule match
    fn candidates(&self, text: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for rule in &self.rules {
            for caps in rule.regex.captures_iter(text) {
                let matched = match rule.group {
                    Some(group) => caps.get(group),
                    None => caps.get(0),
                };
                let Some(matched) = matched else { continue };

                // Trailing separators captured by the fallback boundary are not part of the name
                let trimmed = matched
                    .as_str()
                    .trim_end_matches(|c: char| c.is_whitespace() || ",;:!?)".contains(c));
                if trimmed.is_empty() {
                    continue;
                }

                candidates.push(Candidate {
                    start: matched.start(),
                    end: matched.start() + trimmed.len(),
                    label: rule.label,
                    confidence: rule.confidence,
                });
            }
        }

        candidates
    }

    /// Remove overlapping candidates, keeping the most confident then the longest
    fn resolve_overlaps(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then((b.end - b.start).cmp(&(a.end - a.start)))
                .then(a.start.cmp(&b.start))
        });

        let mut accepted: Vec<Candidate> = Vec::new();
        for candidate in candidates {
            let overlaps = accepted
                .iter()
                .any(|kept| candidate.start < kept.end && kept.start < candidate.end);
            if !overlaps {
                accepted.push(candidate);
            }
        }

        accepted.sort_by_key(|c| c.start);
        accepted
    }

    /// Run the rules synchronously
    pub fn extract(&self, text: &str) -> Vec<RawEntity> {
        let candidates = self.candidates(text);

        self.resolve_overlaps(candidates)
            .into_iter()
            .filter_map(|c| {
                let (start, end) = byte_range_to_chars(text, c.start, c.end)?;
                Some(RawEntity::new(
                    &text[c.start..c.end],
                    start,
                    end,
                    c.label.as_str(),
                ))
            })
            .collect()
    }
}

impl Default for RuleBasedNer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EntityRecognizer for RuleBasedNer {
    async fn recognize(&self, text: &str) -> Result<Vec<RawEntity>> {
        Ok(self.extract(text))
    }

    fn model(&self) -> &str {
        BUILTIN_MODEL
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(text: &str) -> Vec<(String, String)> {
        RuleBasedNer::new()
            .extract(text)
            .into_iter()
            .map(|e| (e.text, e.label))
            .collect()
    }

    fn has(entities: &[(String, String)], text: &str, label: &str) -> bool {
        entities.iter().any(|(t, l)| t == text && l == label)
    }

    #[test]
    fn test_dates() {
        let found = labelled("Signed on March 3, 2021 and renewed 2022-01-15 on a Monday.");
        assert!(has(&found, "March 3, 2021", "DATE"));
        assert!(has(&found, "2022-01-15", "DATE"));
        assert!(has(&found, "Monday", "DATE"));
    }

    #[test]
    fn test_money_beats_cardinal() {
        let found = labelled("Apple paid $5 million and 300 euros.");
        assert!(has(&found, "$5 million", "MONEY"));
        assert!(has(&found, "300 euros", "MONEY"));
        assert!(!found.iter().any(|(t, _)| t == "5" || t == "300"));
    }

    #[test]
    fn test_percent_quantity_cardinal() {
        let found = labelled("Sales grew 15% over 120 km with 42 trucks.");
        assert!(has(&found, "15%", "PERCENT"));
        assert!(has(&found, "120 km", "QUANTITY"));
        assert!(has(&found, "42", "CARDINAL"));
    }

    #[test]
    fn test_year_is_date() {
        let found = labelled("She died in 1852.");
        assert!(has(&found, "1852", "DATE"));
    }

    #[test]
    fn test_gazetteer_labels() {
        let found = labelled(
            "Barack Obama spoke in Berlin about NATO and the Mediterranean in English.",
        );
        assert!(has(&found, "Barack Obama", "PERSON"));
        assert!(has(&found, "Berlin", "GPE"));
        assert!(has(&found, "NATO", "ORG"));
        assert!(has(&found, "Mediterranean", "LOC"));
        assert!(has(&found, "English", "LANGUAGE"));
    }

    #[test]
    fn test_gazetteer_respects_word_boundaries() {
        let found = labelled("The EUROPEAN market and Applesauce.");
        assert!(!found.iter().any(|(_, l)| l == "ORG"));
    }

    #[test]
    fn test_longest_term_wins() {
        let found = labelled("He moved to New York City last year.");
        assert!(has(&found, "New York City", "GPE"));
        assert!(!has(&found, "New York", "GPE"));
        assert!(has(&found, "last year", "DATE"));
    }

    #[test]
    fn test_title_person_excludes_title() {
        let found = labelled("Yesterday Dr. Jane Goodall arrived.");
        assert!(has(&found, "Jane Goodall", "PERSON"));
    }

    #[test]
    fn test_abbreviation_with_trailing_dot() {
        let found = labelled("Trade between the U.S. and China grew.");
        assert!(has(&found, "U.S.", "GPE"));
        assert!(has(&found, "China", "GPE"));
    }

    #[test]
    fn test_character_offsets_with_multibyte_text() {
        let text = "Café owners in Zürich earn €20.";
        let entities = RuleBasedNer::new().extract(text);

        for entity in &entities {
            let slice: String = text
                .chars()
                .skip(entity.start)
                .take(entity.end - entity.start)
                .collect();
            assert_eq!(slice, entity.text);
        }
        assert!(entities.iter().any(|e| e.text == "Zürich" && e.start == 15));
        assert!(entities.iter().any(|e| e.text == "€20" && e.label == "MONEY"));
    }

    #[test]
    fn test_output_sorted_and_non_overlapping() {
        let entities = RuleBasedNer::new()
            .extract("On 2020-05-01 Google paid $3 billion, 12% of revenue, to 40 partners in Europe.");
        for pair in entities.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[tokio::test]
    async fn test_recognizer_trait() {
        let ner = RuleBasedNer::new();
        assert_eq!(ner.model(), "builtin");
        assert!(ner.is_available().await);

        let entities = ner.recognize("Microsoft opened in Tokyo.").await.unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].label, "ORG");
        assert_eq!(entities[1].label, "GPE");
    }
}
