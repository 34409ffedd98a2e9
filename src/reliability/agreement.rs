use crate::models::{ReliabilityRecord, ThemeLabels};
use std::collections::HashMap;
use std::fmt::Write;
use tracing::debug;

/// Fraction of positions where both label vectors agree.
///
/// Compares the common prefix when lengths differ; empty input is 0.0.
pub fn percent_agreement(a: &[bool], b: &[bool]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let matches = a.iter().zip(b).filter(|(x, y)| x == y).count();
    matches as f64 / n as f64
}

fn positive_rate(labels: &[bool]) -> f64 {
    labels.iter().filter(|&&v| v).count() as f64 / labels.len() as f64
}

/// Cohen's kappa for two binary raters.
///
/// Chance agreement of exactly 1 (both raters constant and identical) and
/// empty input both yield 0.0 instead of an undefined ratio.
pub fn cohens_kappa(a: &[bool], b: &[bool]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);

    let po = percent_agreement(a, b);
    let yes_a = positive_rate(a);
    let yes_b = positive_rate(b);
    let pe = yes_a * yes_b + (1.0 - yes_a) * (1.0 - yes_b);

    let denom = 1.0 - pe;
    if denom == 0.0 {
        return 0.0;
    }
    (po - pe) / denom
}

/// Agreement statistics per theme between two coders.
///
/// The second label set is aligned to the first by respondent id; respondents
/// missing from either side are left out. Themes only one coder has are
/// skipped. Output follows the first coder's theme order.
pub fn compute_reliability(coder1: &ThemeLabels, coder2: &ThemeLabels) -> Vec<ReliabilityRecord> {
    let position: HashMap<&str, usize> = coder2
        .respondent_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let aligned: Vec<(usize, usize)> = coder1
        .respondent_ids
        .iter()
        .enumerate()
        .filter_map(|(i, id)| position.get(id.as_str()).map(|&j| (i, j)))
        .collect();

    let records: Vec<ReliabilityRecord> = coder1
        .labels
        .iter()
        .filter_map(|(theme, first)| {
            let second = coder2.column(theme)?;
            let (a, b): (Vec<bool>, Vec<bool>) =
                aligned.iter().map(|&(i, j)| (first[i], second[j])).unzip();
            Some(ReliabilityRecord {
                theme: theme.clone(),
                percent_agreement: percent_agreement(&a, &b),
                kappa: cohens_kappa(&a, &b),
            })
        })
        .collect();

    debug!(
        themes = records.len(),
        aligned = aligned.len(),
        "Computed reliability"
    );
    records
}

/// Mean of a field over the records, 0.0 when there are none.
pub fn mean_of(records: &[ReliabilityRecord], field: impl Fn(&ReliabilityRecord) -> f64) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(field).sum::<f64>() / records.len() as f64
}

/// Markdown narrative of the reliability table.
pub fn reliability_summary(records: &[ReliabilityRecord]) -> String {
    let avg_agreement = mean_of(records, |r| r.percent_agreement);
    let avg_kappa = mean_of(records, |r| r.kappa);
    let lowest = records
        .iter()
        .min_by(|a, b| a.kappa.total_cmp(&b.kappa))
        .map(|low| format!("Lowest agreement on {} (κ={:.2}).", low.theme, low.kappa))
        .unwrap_or_default();

    let mut out = String::from("## Reliability overview\n");
    let _ = writeln!(
        out,
        "Average percent agreement: {:.2}%.\n",
        avg_agreement * 100.0
    );
    let _ = writeln!(out, "Average Cohen's kappa: {avg_kappa:.2}. {lowest}");
    out.push_str(
        "Simulated coder 2 flips 5-8% of labels to mimic human noise; \
         real coder studies recommended before deployment.\n",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(ids: &[&str], columns: &[(&str, &[bool])]) -> ThemeLabels {
        ThemeLabels {
            respondent_ids: ids.iter().map(|s| s.to_string()).collect(),
            labels: columns
                .iter()
                .map(|(theme, values)| (theme.to_string(), values.to_vec()))
                .collect(),
        }
    }

    #[test]
    fn test_identical_labels() {
        let a = [true, false, true, true, false];
        assert_eq!(percent_agreement(&a, &a), 1.0);
        assert!((cohens_kappa(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_identical_labels_have_zero_kappa() {
        let a = [false; 10];
        assert_eq!(percent_agreement(&a, &a), 1.0);
        assert_eq!(cohens_kappa(&a, &a), 0.0);
        let b = [true; 4];
        assert_eq!(cohens_kappa(&b, &b), 0.0);
    }

    #[test]
    fn test_known_kappa() {
        // po = 0.75, pe = 0.5 * 0.25 + 0.5 * 0.75 = 0.5
        let a = [true, true, false, false];
        let b = [true, false, false, false];
        assert_eq!(percent_agreement(&a, &b), 0.75);
        assert!((cohens_kappa(&a, &b) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_disagreement_is_negative() {
        let a = [true, false, true, false];
        let b = [false, true, false, true];
        assert_eq!(percent_agreement(&a, &b), 0.0);
        assert!((cohens_kappa(&a, &b) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_vectors() {
        assert_eq!(percent_agreement(&[], &[]), 0.0);
        assert_eq!(cohens_kappa(&[], &[]), 0.0);
    }

    #[test]
    fn test_compute_aligns_by_id() {
        let coder1 = labels(
            &["R1", "R2", "R3"],
            &[("A", &[true, false, true]), ("B", &[false, false, true])],
        );
        // Same labels, shuffled order, one extra respondent, theme B missing.
        let coder2 = labels(
            &["R3", "R9", "R1", "R2"],
            &[("A", &[true, false, true, false])],
        );
        let records = compute_reliability(&coder1, &coder2);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].theme, "A");
        assert_eq!(records[0].percent_agreement, 1.0);
        assert!((records[0].kappa - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_summary_text() {
        let records = vec![
            ReliabilityRecord {
                theme: "A".to_string(),
                percent_agreement: 0.9,
                kappa: 0.8,
            },
            ReliabilityRecord {
                theme: "B".to_string(),
                percent_agreement: 0.95,
                kappa: 0.6,
            },
        ];
        let text = reliability_summary(&records);
        assert!(text.starts_with("## Reliability overview\n"));
        assert!(text.contains("Average percent agreement: 92.50%."));
        assert!(text.contains("Average Cohen's kappa: 0.70."));
        assert!(text.contains("Lowest agreement on B (κ=0.60)."));
    }

    #[test]
    fn test_summary_of_nothing() {
        let text = reliability_summary(&[]);
        assert!(text.contains("Average percent agreement: 0.00%."));
        assert!(!text.contains("Lowest agreement"));
    }
}
