//! Per-task observation store.
//!
//! Holds the two ordered sequences of evidence a task accumulates: the
//! observations captured for the step in flight, and the consolidated world
//! observations visible to the planner. The merge itself is delegated to the
//! LLM during reflection, but the contract is enforced here: duplicates
//! collapse, ratings are clamped, and rules are never lost.

use llm::{ObservationKind, StepObservation};

/// Ordered observation sequences for one task.
#[derive(Debug, Clone, Default)]
pub struct ObservationStore {
    current: Vec<StepObservation>,
    world: Vec<StepObservation>,
}

impl ObservationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append observations for the step in flight, preserving input order.
    pub fn append_current(&mut self, observations: Vec<StepObservation>) {
        self.current.extend(observations);
    }

    /// Observations captured for the step in flight.
    pub fn current(&self) -> &[StepObservation] {
        &self.current
    }

    /// Consolidated world observations.
    pub fn world(&self) -> &[StepObservation] {
        &self.world
    }

    /// Immutable snapshot of the current-step observations, suitable for
    /// archiving into a completed step.
    pub fn snapshot(&self) -> Vec<StepObservation> {
        self.current.clone()
    }

    /// Clear the current-step observations when a step closes.
    pub fn reset_current(&mut self) {
        self.current.clear();
    }

    /// Replace the world observations with the LLM's merged list, enforcing
    /// the reflection contract:
    ///
    /// - importance/relevance are clamped into [1, 5];
    /// - duplicate (kind, title, summary) items collapse: the
    ///   higher-priority source wins (spec over user over data), and within
    ///   the same source the higher `step_number` wins;
    /// - every rule present before the merge survives it: a dropped rule is
    ///   re-appended, a demoted one has its kind restored.
    pub fn apply_reflection(&mut self, merged: Vec<StepObservation>) {
        let prior_rules: Vec<StepObservation> = self
            .world
            .iter()
            .chain(self.current.iter())
            .filter(|obs| obs.kind == ObservationKind::Rule)
            .cloned()
            .collect();

        let mut result: Vec<StepObservation> = Vec::with_capacity(merged.len());
        for mut obs in merged {
            obs.importance = obs.importance();
            obs.relevance = obs.relevance();

            let duplicate = result.iter_mut().find(|o| {
                o.kind == obs.kind && o.title == obs.title && o.summary == obs.summary
            });
            match duplicate {
                Some(existing) => {
                    let dominates = obs.source.priority() > existing.source.priority()
                        || (obs.source == existing.source
                            && obs.step_number > existing.step_number);
                    if dominates {
                        *existing = obs;
                    }
                }
                None => result.push(obs),
            }
        }

        for rule in prior_rules {
            let demoted = result.iter_mut().find(|o| {
                o.source == rule.source && o.title == rule.title && o.summary == rule.summary
            });
            match demoted {
                Some(existing) => existing.kind = ObservationKind::Rule,
                None => result.push(rule),
            }
        }

        self.world = result;
    }

    /// Split observations into rules and data observations, in input order.
    pub fn split_buckets(
        observations: &[StepObservation],
    ) -> (Vec<&StepObservation>, Vec<&StepObservation>) {
        let mut rules = Vec::new();
        let mut data = Vec::new();
        for obs in observations {
            match obs.kind {
                ObservationKind::Rule => rules.push(obs),
                ObservationKind::Observation => data.push(obs),
            }
        }
        (rules, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm::ObservationSource;

    fn obs(
        title: &str,
        summary: &str,
        kind: ObservationKind,
        source: ObservationSource,
        step: u32,
    ) -> StepObservation {
        StepObservation {
            title: title.to_string(),
            summary: summary.to_string(),
            kind,
            source,
            raw_output: None,
            importance: 3,
            relevance: 3,
            step_number: step,
        }
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = ObservationStore::new();
        store.append_current(vec![
            obs("a", "first", ObservationKind::Observation, ObservationSource::Data, 0),
            obs("b", "second", ObservationKind::Observation, ObservationSource::Data, 0),
        ]);
        store.append_current(vec![obs(
            "c",
            "third",
            ObservationKind::Observation,
            ObservationSource::Data,
            0,
        )]);

        let titles: Vec<&str> = store.current().iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut store = ObservationStore::new();
        store.append_current(vec![obs(
            "a",
            "s",
            ObservationKind::Observation,
            ObservationSource::Data,
            0,
        )]);
        let snapshot = store.snapshot();
        store.reset_current();

        assert!(store.current().is_empty());
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_reflection_collapses_duplicates() {
        let mut store = ObservationStore::new();
        let mut newer = obs(
            "mean",
            "mean is 4.2",
            ObservationKind::Observation,
            ObservationSource::Data,
            2,
        );
        newer.importance = 5;
        store.apply_reflection(vec![
            obs("mean", "mean is 4.2", ObservationKind::Observation, ObservationSource::Data, 1),
            newer,
        ]);

        assert_eq!(store.world().len(), 1);
        assert_eq!(store.world()[0].step_number, 2);
        assert_eq!(store.world()[0].importance, 5);
    }

    #[test]
    fn test_reflection_prefers_higher_priority_source() {
        let mut store = ObservationStore::new();
        let mut from_data = obs(
            "separator",
            "columns are tab separated",
            ObservationKind::Rule,
            ObservationSource::Data,
            3,
        );
        from_data.importance = 5;
        let from_spec = obs(
            "separator",
            "columns are tab separated",
            ObservationKind::Rule,
            ObservationSource::Spec,
            1,
        );

        // Spec dominates data even when the data item is newer.
        store.apply_reflection(vec![from_data, from_spec]);

        assert_eq!(store.world().len(), 1);
        assert_eq!(store.world()[0].source, ObservationSource::Spec);
    }

    #[test]
    fn test_reflection_same_source_keeps_newer_step() {
        let mut store = ObservationStore::new();
        store.apply_reflection(vec![
            obs("mean", "mean is 4.2", ObservationKind::Observation, ObservationSource::Data, 2),
            obs("mean", "mean is 4.2", ObservationKind::Observation, ObservationSource::Data, 1),
        ]);

        assert_eq!(store.world().len(), 1);
        assert_eq!(store.world()[0].step_number, 2);
    }

    #[test]
    fn test_reflection_preserves_dropped_rules() {
        let mut store = ObservationStore::new();
        store.append_current(vec![obs(
            "id column",
            "ids must stay unique",
            ObservationKind::Rule,
            ObservationSource::Spec,
            0,
        )]);

        // The LLM dropped the rule entirely.
        store.apply_reflection(vec![obs(
            "rows",
            "100 rows",
            ObservationKind::Observation,
            ObservationSource::Data,
            0,
        )]);

        let (rules, data) = ObservationStore::split_buckets(store.world());
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].title, "id column");
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_reflection_restores_demoted_rules() {
        let mut store = ObservationStore::new();
        store.append_current(vec![obs(
            "units",
            "report values in µM",
            ObservationKind::Rule,
            ObservationSource::User,
            1,
        )]);

        // The LLM kept the item but demoted it to a plain observation.
        store.apply_reflection(vec![obs(
            "units",
            "report values in µM",
            ObservationKind::Observation,
            ObservationSource::User,
            1,
        )]);

        assert_eq!(store.world().len(), 1);
        assert_eq!(store.world()[0].kind, ObservationKind::Rule);
    }

    #[test]
    fn test_reflection_clamps_ratings() {
        let mut store = ObservationStore::new();
        let mut wild = obs(
            "outlier",
            "value at 1e9",
            ObservationKind::Observation,
            ObservationSource::Data,
            0,
        );
        wild.importance = 99;
        wild.relevance = -1;
        store.apply_reflection(vec![wild]);

        assert_eq!(store.world()[0].importance, 5);
        assert_eq!(store.world()[0].relevance, 1);
    }

    #[test]
    fn test_world_has_no_duplicate_identity_pairs() {
        let mut store = ObservationStore::new();
        store.apply_reflection(vec![
            obs("a", "s", ObservationKind::Observation, ObservationSource::Data, 0),
            obs("a", "s", ObservationKind::Observation, ObservationSource::Data, 0),
            obs("a", "s", ObservationKind::Rule, ObservationSource::Data, 0),
        ]);

        // Same title+summary with a different kind is a distinct item.
        for (i, a) in store.world().iter().enumerate() {
            for b in store.world().iter().skip(i + 1) {
                assert_ne!(
                    (a.kind, a.source, &a.title, &a.summary),
                    (b.kind, b.source, &b.title, &b.summary)
                );
            }
        }
    }

    #[test]
    fn test_split_buckets() {
        let observations = vec![
            obs("r1", "rule", ObservationKind::Rule, ObservationSource::Spec, 0),
            obs("d1", "data", ObservationKind::Observation, ObservationSource::Data, 0),
            obs("r2", "rule", ObservationKind::Rule, ObservationSource::User, 1),
        ];
        let (rules, data) = ObservationStore::split_buckets(&observations);
        assert_eq!(rules.len(), 2);
        assert_eq!(data.len(), 1);
    }
}
