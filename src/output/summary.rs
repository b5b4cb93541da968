use crate::harvester::HarvestOutcome;
use crate::storage::{SessionStatus, SessionTotals};
use std::fmt::Write;

/// Status to record for a finished session
pub fn session_status(outcome: &HarvestOutcome) -> SessionStatus {
    if outcome.is_success() {
        SessionStatus::Completed
    } else {
        SessionStatus::Failed
    }
}

/// Counters to record for a finished session
pub fn session_totals(outcome: &HarvestOutcome) -> SessionTotals {
    SessionTotals {
        cycles: outcome.session.cycles,
        discovered: outcome.session.discovered,
        inserted: outcome.inserted,
    }
}

/// Renders the end-of-session summary shown by the CLI
pub fn render_summary(session_id: i64, outcome: &HarvestOutcome) -> String {
    let mut out = String::new();
    let session = &outcome.session;

    let _ = writeln!(out, "=== Harvest Session #{} ===\n", session_id);
    let _ = writeln!(out, "  Cycles:          {}", session.cycles);
    let _ = writeln!(out, "  Discovered:      {}", session.discovered);
    let _ = writeln!(out, "  Inserted:        {}", outcome.inserted);
    let _ = writeln!(out, "  Already stored:  {}", outcome.ingest.already_stored);
    let _ = writeln!(out, "  Skipped batches: {}", outcome.ingest.batches_skipped);
    let _ = writeln!(out, "  Duration:        {:.1}s", session.elapsed.as_secs_f64());
    let _ = writeln!(out, "  Items/minute:    {:.1}", outcome.items_per_minute());

    match (&session.stop_reason, &outcome.error) {
        (_, Some(e)) => {
            let _ = writeln!(out, "  Result:          failed: {}", e);
        }
        (Some(reason), None) => {
            let _ = writeln!(out, "  Result:          {}", reason);
        }
        (None, None) => {}
    }

    out
}

pub fn print_summary(session_id: i64, outcome: &HarvestOutcome) {
    print!("{}", render_summary(session_id, outcome));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverError;
    use crate::harvester::{IngestReport, SessionReport, StopReason};
    use crate::HarvestError;
    use std::time::Duration;

    fn outcome(error: Option<HarvestError>) -> HarvestOutcome {
        HarvestOutcome {
            inserted: 42,
            ingest: IngestReport {
                batches_received: 6,
                batches_skipped: 1,
                already_stored: 3,
                inserted: 42,
            },
            session: SessionReport {
                cycles: 18,
                discovered: 45,
                stop_reason: error.is_none().then_some(StopReason::MaxCycles),
                elapsed: Duration::from_secs(90),
            },
            error,
        }
    }

    #[test]
    fn test_completed_summary() {
        let outcome = outcome(None);
        assert_eq!(session_status(&outcome), SessionStatus::Completed);
        assert_eq!(
            session_totals(&outcome),
            SessionTotals {
                cycles: 18,
                discovered: 45,
                inserted: 42
            }
        );

        let text = render_summary(7, &outcome);
        assert!(text.contains("Harvest Session #7"));
        assert!(text.contains("Inserted:        42"));
        assert!(text.contains("Items/minute:    30.0"));
        assert!(text.contains("cycle limit reached"));
    }

    #[test]
    fn test_failed_summary() {
        let outcome = outcome(Some(HarvestError::Driver(DriverError::Scroll(
            "target closed".to_string(),
        ))));
        assert_eq!(session_status(&outcome), SessionStatus::Failed);
        assert!(render_summary(1, &outcome).contains("failed: Page driver error: Scroll failed: target closed"));
    }
}
