// Verdict extraction - top-probability scan of one classifier result

use super::PerModelVerdict;
use crate::types::Prediction;

/// Extract the top-probability pair from one classifier result
///
/// Scans once, starting from `("", 0.0)`. A pair replaces the current best
/// only when its probability is strictly greater, so:
/// - ties keep the first-seen pair (stable in input order)
/// - an empty or all-zero result yields the empty label with probability 0.0
///
/// The empty-label verdict is a valid, degenerate verdict rather than an
/// error; callers that want to reject empty results must do so upstream.
pub fn classify_verdict(result: &[Prediction]) -> PerModelVerdict {
    let mut best_label = "";
    let mut best_probability = 0.0;

    for prediction in result {
        if prediction.probability > best_probability {
            best_probability = prediction.probability;
            best_label = &prediction.class_name;
        }
    }

    PerModelVerdict::new(best_label, best_probability)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(pairs: &[(&str, f64)]) -> Vec<Prediction> {
        pairs.iter().map(|(l, p)| Prediction::new(*l, *p)).collect()
    }

    #[test]
    fn test_picks_strict_maximum() {
        let verdict = classify_verdict(&result(&[("1", 0.1), ("2", 0.7), ("3", 0.15), ("이외", 0.05)]));
        assert_eq!(verdict, PerModelVerdict::new("2", 0.7));
    }

    #[test]
    fn test_unique_maximum_independent_of_order() {
        let forward = result(&[("4", 0.2), ("5", 0.5), ("이외", 0.3)]);
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(classify_verdict(&forward), classify_verdict(&reversed));
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let verdict = classify_verdict(&result(&[("7", 0.4), ("8", 0.4), ("9", 0.2)]));
        assert_eq!(verdict.label, "7");

        let verdict = classify_verdict(&result(&[("8", 0.4), ("7", 0.4), ("9", 0.2)]));
        assert_eq!(verdict.label, "8");
    }

    #[test]
    fn test_empty_result_yields_empty_label() {
        let verdict = classify_verdict(&[]);
        assert_eq!(verdict, PerModelVerdict::new("", 0.0));
    }

    #[test]
    fn test_all_zero_result_yields_empty_label() {
        let verdict = classify_verdict(&result(&[("1", 0.0), ("이외", 0.0)]));
        assert_eq!(verdict.label, "");
        assert_eq!(verdict.probability, 0.0);
    }

    #[test]
    fn test_nan_scores_never_win() {
        let verdict = classify_verdict(&result(&[("1", f64::NAN), ("2", 0.3)]));
        assert_eq!(verdict, PerModelVerdict::new("2", 0.3));
    }
}
