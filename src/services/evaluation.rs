//! Attribute-level scoring of a guessed character against the round's secret.
//!
//! Works entirely on the flattened string values the character cache stores.
//! Attributes missing on either side are skipped; unparseable values fall
//! back to exact-match semantics rather than erroring.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::dao::models::{
    AttributeEntity, AttributeEvaluation, AttributeMatchType, EvaluationStatus,
};

/// Score every attribute of the room's anime for which both the guessed and
/// secret characters carry a value.
pub fn evaluate_attributes(
    definitions: &[AttributeEntity],
    guessed: &IndexMap<String, String>,
    secret: &IndexMap<String, String>,
) -> IndexMap<String, AttributeEvaluation> {
    let mut results = IndexMap::new();

    for definition in definitions {
        let (Some(guessed_value), Some(secret_value)) =
            (guessed.get(&definition.code), secret.get(&definition.code))
        else {
            continue;
        };

        let status = match definition
            .match_type
            .unwrap_or(AttributeMatchType::ExactMatch)
        {
            AttributeMatchType::ExactMatch => exact_status(guessed_value, secret_value),
            AttributeMatchType::PartialMatch => partial_status(guessed_value, secret_value),
            AttributeMatchType::RangeMatch => range_status(guessed_value, secret_value),
        };

        results.insert(
            definition.code.clone(),
            AttributeEvaluation {
                status,
                value: guessed_value.clone(),
            },
        );
    }

    results
}

fn exact_status(guessed: &str, secret: &str) -> EvaluationStatus {
    if guessed == secret {
        EvaluationStatus::Correct
    } else {
        EvaluationStatus::Incorrect
    }
}

fn partial_status(guessed: &str, secret: &str) -> EvaluationStatus {
    let (Some(guessed_list), Some(secret_list)) = (parse_list(guessed), parse_list(secret)) else {
        return exact_status(guessed, secret);
    };

    let guessed_set: HashSet<&String> = guessed_list.iter().collect();
    let secret_set: HashSet<&String> = secret_list.iter().collect();

    if guessed_set == secret_set {
        EvaluationStatus::Correct
    } else if guessed_set.is_disjoint(&secret_set) {
        EvaluationStatus::Incorrect
    } else {
        EvaluationStatus::Partial
    }
}

fn range_status(guessed: &str, secret: &str) -> EvaluationStatus {
    let (Ok(guessed_number), Ok(secret_number)) =
        (guessed.parse::<f64>(), secret.parse::<f64>())
    else {
        return exact_status(guessed, secret);
    };

    if guessed_number == secret_number {
        EvaluationStatus::Correct
    } else if guessed_number > secret_number {
        EvaluationStatus::Higher
    } else {
        EvaluationStatus::Lower
    }
}

fn parse_list(value: &str) -> Option<Vec<String>> {
    serde_json::from_str::<Vec<String>>(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::models::AttributeType,
        services::testing::attribute_fixture,
    };
    use uuid::Uuid;

    fn values(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(code, value)| (code.to_string(), value.to_string()))
            .collect()
    }

    fn single_status(
        match_type: Option<AttributeMatchType>,
        kind: AttributeType,
        guessed: &str,
        secret: &str,
    ) -> EvaluationStatus {
        let definitions = vec![attribute_fixture(Uuid::new_v4(), "attr", kind, match_type)];
        let results = evaluate_attributes(
            &definitions,
            &values(&[("attr", guessed)]),
            &values(&[("attr", secret)]),
        );
        results["attr"].status
    }

    #[test]
    fn exact_match_compares_verbatim() {
        let exact = Some(AttributeMatchType::ExactMatch);
        assert_eq!(
            single_status(exact, AttributeType::Text, "Saitama", "Saitama"),
            EvaluationStatus::Correct
        );
        assert_eq!(
            single_status(exact, AttributeType::Text, "Genos", "Saitama"),
            EvaluationStatus::Incorrect
        );
    }

    #[test]
    fn partial_match_compares_sets() {
        let partial = Some(AttributeMatchType::PartialMatch);
        assert_eq!(
            single_status(
                partial,
                AttributeType::Text,
                r#"["Action","Comedy"]"#,
                r#"["Action","Comedy"]"#
            ),
            EvaluationStatus::Correct
        );
        assert_eq!(
            single_status(
                partial,
                AttributeType::Text,
                r#"["Action"]"#,
                r#"["Action","Comedy"]"#
            ),
            EvaluationStatus::Partial
        );
        assert_eq!(
            single_status(
                partial,
                AttributeType::Text,
                r#"["Horror"]"#,
                r#"["Action"]"#
            ),
            EvaluationStatus::Incorrect
        );
    }

    #[test]
    fn partial_match_order_is_irrelevant() {
        let partial = Some(AttributeMatchType::PartialMatch);
        assert_eq!(
            single_status(
                partial,
                AttributeType::Text,
                r#"["Comedy","Action"]"#,
                r#"["Action","Comedy"]"#
            ),
            EvaluationStatus::Correct
        );
    }

    #[test]
    fn partial_match_falls_back_to_exact_on_parse_failure() {
        let partial = Some(AttributeMatchType::PartialMatch);
        assert_eq!(
            single_status(partial, AttributeType::Text, "Action", "Action"),
            EvaluationStatus::Correct
        );
        assert_eq!(
            single_status(partial, AttributeType::Text, "Action", r#"["Action"]"#),
            EvaluationStatus::Incorrect
        );
    }

    #[test]
    fn range_match_reports_direction() {
        let range = Some(AttributeMatchType::RangeMatch);
        assert_eq!(
            single_status(range, AttributeType::Number, "175", "180"),
            EvaluationStatus::Lower
        );
        assert_eq!(
            single_status(range, AttributeType::Number, "190", "180"),
            EvaluationStatus::Higher
        );
        assert_eq!(
            single_status(range, AttributeType::Number, "180", "180"),
            EvaluationStatus::Correct
        );
    }

    #[test]
    fn range_match_falls_back_to_exact_for_non_numeric_values() {
        let range = Some(AttributeMatchType::RangeMatch);
        assert_eq!(
            single_status(range, AttributeType::Text, "tall", "tall"),
            EvaluationStatus::Correct
        );
        assert_eq!(
            single_status(range, AttributeType::Text, "tall", "short"),
            EvaluationStatus::Incorrect
        );
    }

    #[test]
    fn unspecified_match_type_uses_exact_semantics() {
        assert_eq!(
            single_status(None, AttributeType::Boolean, "true", "true"),
            EvaluationStatus::Correct
        );
        assert_eq!(
            single_status(None, AttributeType::Boolean, "true", "false"),
            EvaluationStatus::Incorrect
        );
    }

    #[test]
    fn attributes_missing_on_either_side_are_skipped() {
        let anime_id = Uuid::new_v4();
        let definitions = vec![
            attribute_fixture(anime_id, "height", AttributeType::Number, None),
            attribute_fixture(anime_id, "hair", AttributeType::Text, None),
        ];

        let results = evaluate_attributes(
            &definitions,
            &values(&[("height", "180")]),
            &values(&[("hair", "black")]),
        );

        assert!(results.is_empty());
    }

    #[test]
    fn results_echo_the_guessed_value() {
        let definitions = vec![attribute_fixture(
            Uuid::new_v4(),
            "height",
            AttributeType::Number,
            Some(AttributeMatchType::RangeMatch),
        )];

        let results = evaluate_attributes(
            &definitions,
            &values(&[("height", "175")]),
            &values(&[("height", "180")]),
        );

        assert_eq!(results["height"].value, "175");
    }
}
