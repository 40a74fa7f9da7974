// Arbitration - fuse per-model verdicts into one outcome
//
// Range classifiers cover disjoint digit sets, so any two non-rejecting
// verdicts necessarily disagree. Arbitration therefore only has to handle
// zero votes, one vote, and conflicting votes.

use super::{ArbitratedOutcome, Detection, ModelVerdict};
use tracing::{debug, enabled, Level};

/// Fuse one verdict per model into an arbitrated outcome
///
/// `verdicts` must be in the fixed model order; that order breaks ties.
///
/// - no non-rejecting verdict → `NoDetection`
/// - exactly one → `SingleMatch`, whatever its probability (no confidence floor)
/// - two or more → `BestOfMultiple` with the strictly greatest probability,
///   the earliest model winning exact ties
///
/// Pure: the debug-level verdict table is the only side effect and never
/// influences the result.
pub fn fuse(verdicts: &[ModelVerdict]) -> ArbitratedOutcome {
    if enabled!(Level::DEBUG) {
        debug!("Verdict table:\n{}", verdict_table(verdicts));
    }

    let candidates: Vec<&ModelVerdict> = verdicts.iter().filter(|v| !v.is_rejecting()).collect();

    match candidates.as_slice() {
        [] => ArbitratedOutcome::NoDetection,
        [only] => ArbitratedOutcome::SingleMatch(Detection::from(*only)),
        [first, rest @ ..] => {
            let mut best = *first;
            for candidate in rest {
                if candidate.verdict.probability > best.verdict.probability {
                    best = *candidate;
                }
            }

            for runner_up in candidates.iter().filter(|c| !std::ptr::eq(**c, best)) {
                debug!(
                    winner = %best.identity.key,
                    runner_up = %runner_up.identity.key,
                    label = %runner_up.verdict.label,
                    probability = runner_up.verdict.probability,
                    "Conflicting verdict overruled"
                );
            }

            ArbitratedOutcome::BestOfMultiple(Detection::from(best))
        }
    }
}

/// Render verdicts as a fixed-width table for diagnostics
pub fn verdict_table(verdicts: &[ModelVerdict]) -> String {
    let mut table = format!("{:<10} {:<8} {:<10} {:>8}  {}", "model", "range", "label", "prob", "vote");
    for v in verdicts {
        table.push('\n');
        table.push_str(&format!(
            "{:<10} {:<8} {:<10} {:>8.4}  {}",
            v.identity.key,
            v.identity.range,
            v.verdict.label,
            v.verdict.probability,
            if v.is_rejecting() { "reject" } else { "claim" }
        ));
    }
    table
}
