//! Label filtering
//!
//! The model reports every span it recognizes. Only spans whose label is in
//! the user's selection are displayed, in the order the model produced them.

use entilens_core::{EntityLabel, EntityOccurrence, LabelSelection, RawEntity};

/// Keep the raw spans whose label is selected
///
/// Labels outside the taxonomy can never be selected and are dropped.
/// Spans whose offsets do not fit in `text` are dropped with a warning.
pub fn filter_entities(
    text: &str,
    raw: &[RawEntity],
    selection: &LabelSelection,
) -> Vec<EntityOccurrence> {
    let char_count = text.chars().count();

    raw.iter()
        .filter_map(|entity| {
            let label = entity.label.parse::<EntityLabel>().ok()?;
            if !selection.contains(label) {
                return None;
            }
            if entity.start > entity.end || entity.end > char_count {
                tracing::warn!(
                    start = entity.start,
                    end = entity.end,
                    char_count,
                    label = %entity.label,
                    "Dropping entity with offsets outside the text"
                );
                return None;
            }
            Some(EntityOccurrence::new(
                entity.text.clone(),
                entity.start,
                entity.end,
                label,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEXT: &str = "Ada Lovelace met Charles Babbage in London in 1833.";

    fn sample_raw() -> Vec<RawEntity> {
        vec![
            RawEntity::new("Ada Lovelace", 0, 12, "PERSON"),
            RawEntity::new("Charles Babbage", 17, 32, "PERSON"),
            RawEntity::new("London", 36, 42, "GPE"),
            RawEntity::new("1833", 46, 50, "DATE"),
        ]
    }

    #[test]
    fn test_filter_keeps_selected_labels_in_model_order() {
        let selection = LabelSelection::from_labels([EntityLabel::Date, EntityLabel::Person]);
        let entities = filter_entities(TEXT, &sample_raw(), &selection);

        let texts: Vec<&str> = entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Ada Lovelace", "Charles Babbage", "1833"]);
    }

    #[test]
    fn test_filter_all_and_none() {
        assert_eq!(
            filter_entities(TEXT, &sample_raw(), &LabelSelection::all()).len(),
            4
        );
        assert!(filter_entities(TEXT, &sample_raw(), &LabelSelection::none()).is_empty());
    }

    #[test]
    fn test_filter_drops_labels_outside_taxonomy() {
        let raw = vec![
            RawEntity::new("noon", 0, 4, "TIME"),
            RawEntity::new("first", 5, 10, "ORDINAL"),
        ];
        assert!(filter_entities("noon first", &raw, &LabelSelection::all()).is_empty());
    }

    #[test]
    fn test_filter_drops_out_of_range_spans() {
        let raw = vec![
            RawEntity::new("Paris", 0, 5, "GPE"),
            RawEntity::new("ghost", 4, 99, "GPE"),
            RawEntity::new("reversed", 3, 1, "GPE"),
        ];
        let entities = filter_entities("Paris", &raw, &LabelSelection::all());
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "Paris");
    }

    fn any_label() -> impl Strategy<Value = String> {
        prop_oneof![
            proptest::sample::select(EntityLabel::ALL.to_vec()).prop_map(|l| l.as_str().to_string()),
            Just("TIME".to_string()),
            Just("ORDINAL".to_string()),
            Just("FAC".to_string()),
        ]
    }

    fn any_raw(len: usize) -> impl Strategy<Value = RawEntity> {
        (0..=len, 0..=len, any_label()).prop_map(|(a, b, label)| {
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            RawEntity::new(format!("span{start}"), start, end, label)
        })
    }

    proptest! {
        #[test]
        fn prop_displayed_equals_selected_subset(
            raw in proptest::collection::vec(any_raw(40), 0..30),
            selected in proptest::sample::subsequence(EntityLabel::ALL.to_vec(), 0..=14),
        ) {
            let text = "x".repeat(40);
            let selection = LabelSelection::from_labels(selected);

            let displayed = filter_entities(&text, &raw, &selection);

            let expected: Vec<EntityOccurrence> = raw
                .iter()
                .filter_map(|r| {
                    let label = r.label.parse::<EntityLabel>().ok()?;
                    selection
                        .contains(label)
                        .then(|| EntityOccurrence::new(r.text.clone(), r.start, r.end, label))
                })
                .collect();

            prop_assert_eq!(displayed, expected);
        }
    }
}
