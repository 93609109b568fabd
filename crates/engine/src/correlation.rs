//! Cross-parameter correlation: slot bindings parsed from a rule
//! expression, plus the count-triggered accumulator that groups samples
//! of distinct parameters into one evaluable batch.

use std::sync::Mutex;

use tracing::debug;

use edgerule_core::{EvaluableInput, Sample};

/// A `(slot, parameter)` pair lifted from a rule expression, e.g.
/// `("input1", "Temperature")` from the token `input1.Temperature`.
pub type SlotBinding = (String, String);

/// Parse slot bindings out of a multi-parameter rule expression.
///
/// The expression is whitespace-tokenized; tokens longer than five
/// characters containing a `.` are treated as `slot.parameter`
/// references. The first occurrence wins per slot, so a parameter
/// referenced twice binds once.
pub fn parse_slot_bindings(expression: &str) -> Vec<SlotBinding> {
    let mut bindings: Vec<SlotBinding> = Vec::new();
    for token in expression.split_whitespace() {
        if token.len() <= 5 {
            continue;
        }
        if let Some((slot, parameter)) = token.split_once('.') {
            if slot.is_empty() || parameter.is_empty() {
                continue;
            }
            if bindings.iter().any(|(s, _)| s == slot) {
                continue;
            }
            bindings.push((slot.to_string(), parameter.to_string()));
        }
    }
    bindings
}

/// Accumulates samples until `width` distinct parameter ids have been
/// seen, then releases them as one batch.
///
/// Observation and release happen inside a single critical section, so
/// the distinct count can never exceed the width and a batch can never
/// be emitted twice.
#[derive(Default)]
pub struct CorrelationState {
    /// Accumulated samples in arrival order, one per distinct id.
    entries: Mutex<Vec<Sample>>,
}

impl CorrelationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample. Duplicate ids are ignored (the first value per
    /// parameter stands). When the `width`-th distinct id arrives, the
    /// accumulator is drained and the batch returned in arrival order.
    pub fn observe(&self, sample: Sample, width: usize) -> Option<Vec<Sample>> {
        let mut entries = self.entries.lock().expect("correlation lock poisoned");
        if entries.iter().any(|s| s.id == sample.id) {
            debug!(id = %sample.id, "duplicate parameter before batch completion, ignored");
            return None;
        }
        entries.push(sample);
        if entries.len() >= width.max(1) {
            return Some(std::mem::take(&mut *entries));
        }
        None
    }

    /// Number of distinct parameters accumulated so far.
    pub fn pending(&self) -> usize {
        self.entries.lock().expect("correlation lock poisoned").len()
    }
}

/// Turn a completed batch into slot-named evaluable inputs.
///
/// Each binding picks the batch sample for its parameter; bindings whose
/// parameter never arrived in this batch are skipped.
pub fn assemble_inputs(batch: &[Sample], bindings: &[SlotBinding]) -> Vec<EvaluableInput> {
    let mut inputs = Vec::with_capacity(bindings.len());
    for (slot, parameter) in bindings {
        match batch.iter().find(|s| &s.id == parameter) {
            Some(sample) => inputs.push(EvaluableInput::for_slot(slot.clone(), sample)),
            None => debug!(slot = %slot, parameter = %parameter, "no sample for bound slot in batch"),
        }
    }
    inputs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_parse_dotted_tokens() {
        let bindings =
            parse_slot_bindings("input1.Temperature > 30 And input2.Pressure < 1000");
        assert_eq!(
            bindings,
            vec![
                ("input1".to_string(), "Temperature".to_string()),
                ("input2".to_string(), "Pressure".to_string()),
            ]
        );
    }

    #[test]
    fn bindings_first_occurrence_wins_per_slot() {
        let bindings = parse_slot_bindings("input1.Temperature > 30 And input1.Pressure < 5");
        assert_eq!(
            bindings,
            vec![("input1".to_string(), "Temperature".to_string())]
        );
    }

    #[test]
    fn short_tokens_and_operators_are_skipped() {
        // "a.b" is under the length threshold, ">" and numbers carry no dot.
        let bindings = parse_slot_bindings("a.b > 30 And 100.5 < input2.Flow");
        assert_eq!(bindings, vec![("input2".to_string(), "Flow".to_string())]);
    }

    #[test]
    fn observe_emits_batch_at_width() {
        let state = CorrelationState::new();
        assert!(state.observe(Sample::new("P1", "1", "m"), 2).is_none());
        assert_eq!(state.pending(), 1);

        let batch = state.observe(Sample::new("P2", "2", "m"), 2).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id, "P1");
        assert_eq!(batch[1].id, "P2");
        assert_eq!(state.pending(), 0, "accumulator cleared with the emit");
    }

    #[test]
    fn duplicate_ids_do_not_advance_the_count() {
        let state = CorrelationState::new();
        assert!(state.observe(Sample::new("P1", "1", "m"), 2).is_none());
        assert!(state.observe(Sample::new("P1", "9", "m"), 2).is_none());
        assert_eq!(state.pending(), 1);

        let batch = state.observe(Sample::new("P2", "2", "m"), 2).unwrap();
        assert_eq!(batch[0].value, "1", "first value per parameter stands");
    }

    #[test]
    fn assemble_maps_parameters_to_slots() {
        let batch = vec![
            Sample::new("Pressure", "900", "m"),
            Sample::new("Temperature", "35", "m"),
        ];
        let bindings = parse_slot_bindings("input1.Temperature > 30 And input2.Pressure < 1000");
        let inputs = assemble_inputs(&batch, &bindings);
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].name, "input1");
        assert!(inputs[0].has_parameter("Temperature"));
        assert_eq!(inputs[1].name, "input2");
    }

    #[test]
    fn unbound_parameters_are_skipped() {
        let batch = vec![Sample::new("Temperature", "35", "m")];
        let bindings = parse_slot_bindings("input1.Temperature > 30 And input2.Pressure < 1000");
        let inputs = assemble_inputs(&batch, &bindings);
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name, "input1");
    }
}
