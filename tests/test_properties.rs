//! Property tests for normalization, co-occurrence and agreement statistics.

use proptest::prelude::*;
use qualmix::coding::{cooccurrence, KeywordMap};
use qualmix::models::{CodedResponse, Frame, Response};
use qualmix::reliability::{cohens_kappa, percent_agreement};
use qualmix::text::normalize_text;
use qualmix::Codebook;
use std::collections::BTreeSet;

const THEMES: [&str; 7] = [
    "AFFORDABILITY",
    "CHILDCARE_ACCESS",
    "EMPLOYMENT_DISRUPTION",
    "FOOD_INSECURITY",
    "PROVIDER_STAFF_SHORTAGE",
    "SCHEDULING_CONSTRAINTS",
    "STRESS_BURNOUT",
];

fn coded(idx: usize, themes: BTreeSet<String>) -> CodedResponse {
    CodedResponse {
        response: Response {
            respondent_id: format!("R{:05}", idx + 1),
            frame: Frame::Provider,
            wave: 1,
            survey_month: "January 2024".to_string(),
            state: "TX".to_string(),
            income_bracket: None,
            provider_setting: None,
            open_response_text: String::new(),
        },
        cleaned_text: String::new(),
        themes,
    }
}

fn theme_sets() -> impl Strategy<Value = Vec<BTreeSet<String>>> {
    prop::collection::vec(
        prop::collection::btree_set(prop::sample::select(THEMES.to_vec()), 0..=4)
            .prop_map(|set| set.into_iter().map(str::to_string).collect()),
        0..40,
    )
}

proptest! {
    #[test]
    fn test_normalize_is_idempotent(text in "\\PC{0,80}") {
        let once = normalize_text(Some(&text));
        prop_assert_eq!(normalize_text(Some(&once)), once.clone());
        prop_assert_eq!(once.trim(), once.as_str());
        prop_assert!(!once.contains("  "));
    }

    #[test]
    fn test_matched_themes_come_from_codebook(text in "[a-z ]{0,120}") {
        let codebook = Codebook::standard();
        let keyword_map = KeywordMap::from_codebook(&codebook);
        for theme in keyword_map.match_themes(&text) {
            prop_assert!(codebook.contains(&theme));
        }
    }

    #[test]
    fn test_cooccurrence_counts_every_pair_once(sets in theme_sets()) {
        let rows: Vec<CodedResponse> =
            sets.into_iter().enumerate().map(|(i, s)| coded(i, s)).collect();
        let expected: usize = rows
            .iter()
            .map(|r| r.themes.len() * r.themes.len().saturating_sub(1) / 2)
            .sum();

        let pairs = cooccurrence(&rows, rows.len());
        prop_assert_eq!(pairs.iter().map(|p| p.count).sum::<usize>(), expected);
        for pair in &pairs {
            prop_assert!(pair.theme_a < pair.theme_b);
            prop_assert!(pair.count > 0);
        }
        for window in pairs.windows(2) {
            prop_assert!(window[0].count >= window[1].count);
        }
    }

    #[test]
    fn test_kappa_is_bounded(labels in prop::collection::vec(any::<(bool, bool)>(), 0..200)) {
        let (a, b): (Vec<bool>, Vec<bool>) = labels.into_iter().unzip();
        let kappa = cohens_kappa(&a, &b);
        prop_assert!(kappa.is_finite());
        prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&kappa));
        prop_assert!((0.0..=1.0).contains(&percent_agreement(&a, &b)));
    }

    #[test]
    fn test_identical_labels_have_perfect_kappa(labels in prop::collection::vec(any::<bool>(), 2..200)) {
        prop_assume!(labels.iter().any(|&v| v) && labels.iter().any(|&v| !v));
        prop_assert!((cohens_kappa(&labels, &labels) - 1.0).abs() < 1e-9);
        prop_assert_eq!(percent_agreement(&labels, &labels), 1.0);
    }

    #[test]
    fn test_constant_identical_labels_have_zero_kappa(value in any::<bool>(), n in 1usize..100) {
        let labels = vec![value; n];
        prop_assert_eq!(cohens_kappa(&labels, &labels), 0.0);
    }
}
