//! Severity rollup: reduce an anomaly list to one overall label.

use crate::domain::{Anomaly, OverallSeverity, Severity};

/// Anomaly count at which a run is treated as critical regardless of the
/// individual severities.
pub const CRITICAL_VOLUME: usize = 3;

/// Roll up `anomalies` into an [`OverallSeverity`].
///
/// Rules, first match wins:
/// - no anomalies → `none`
/// - any critical anomaly, or at least [`CRITICAL_VOLUME`] anomalies → `critical`
/// - any high → `high`
/// - any medium → `medium`
/// - otherwise → `low`
pub fn aggregate(anomalies: &[Anomaly]) -> OverallSeverity {
    let Some(worst) = anomalies.iter().map(|a| a.severity).max() else {
        return OverallSeverity::None;
    };

    if worst == Severity::Critical || anomalies.len() >= CRITICAL_VOLUME {
        return OverallSeverity::Critical;
    }

    OverallSeverity::from(worst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnomalyKind;

    fn anomaly(severity: Severity) -> Anomaly {
        Anomaly::new(AnomalyKind::ExcessiveDuration, "x", severity)
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(aggregate(&[]), OverallSeverity::None);
    }

    #[test]
    fn single_severity_maps_through() {
        assert_eq!(aggregate(&[anomaly(Severity::Low)]), OverallSeverity::Low);
        assert_eq!(aggregate(&[anomaly(Severity::Medium)]), OverallSeverity::Medium);
        assert_eq!(aggregate(&[anomaly(Severity::High)]), OverallSeverity::High);
        assert_eq!(
            aggregate(&[anomaly(Severity::Critical)]),
            OverallSeverity::Critical
        );
    }

    #[test]
    fn highest_wins_below_volume_threshold() {
        let list = [anomaly(Severity::Low), anomaly(Severity::High)];
        assert_eq!(aggregate(&list), OverallSeverity::High);

        let list = [anomaly(Severity::Medium), anomaly(Severity::Low)];
        assert_eq!(aggregate(&list), OverallSeverity::Medium);
    }

    #[test]
    fn three_mediums_escalate_to_critical() {
        let list = [
            anomaly(Severity::Medium),
            anomaly(Severity::Medium),
            anomaly(Severity::Medium),
        ];
        assert_eq!(aggregate(&list), OverallSeverity::Critical);
    }

    #[test]
    fn three_lows_escalate_to_critical() {
        let list = [
            anomaly(Severity::Low),
            anomaly(Severity::Low),
            anomaly(Severity::Low),
        ];
        assert_eq!(aggregate(&list), OverallSeverity::Critical);
    }

    #[test]
    fn rollup_is_monotonic_when_appending() {
        let pool = [
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ];
        // All sequences of length 0..=3 over the pool.
        let mut sequences: Vec<Vec<Severity>> = vec![vec![]];
        let mut frontier: Vec<Vec<Severity>> = vec![vec![]];
        for _ in 0..3 {
            frontier = frontier
                .iter()
                .flat_map(|seq| {
                    pool.iter().map(move |s| {
                        let mut extended = seq.clone();
                        extended.push(*s);
                        extended
                    })
                })
                .collect();
            sequences.extend(frontier.iter().cloned());
        }

        for seq in &sequences {
            let base: Vec<Anomaly> = seq.iter().map(|s| anomaly(*s)).collect();
            let before = aggregate(&base);
            for s in pool {
                let mut extended = base.clone();
                extended.push(anomaly(s));
                assert!(
                    aggregate(&extended) >= before,
                    "appending {s:?} to {seq:?} lowered severity"
                );
            }
        }
    }
}
