//! Unlock evaluator: tracks the lifecycle status of every procedure.
//!
//! Evaluation is read-only against the store. Status changes are one-shot:
//! a procedure is unlocked at most once and activated at most once, and
//! nothing ever moves it back.

use std::collections::BTreeMap;

use crate::procedures::{Procedure, ProcedureCatalog, ProcedureEffect, ProcedureStatus};
use crate::requirements::RequirementCheck;
use crate::session::ActionError;
use crate::state::GameState;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnlockEvaluator {
    catalog: ProcedureCatalog,
    statuses: BTreeMap<String, ProcedureStatus>,
}

impl UnlockEvaluator {
    #[must_use]
    pub fn new(catalog: ProcedureCatalog) -> Self {
        let statuses = catalog
            .iter()
            .map(|procedure| (procedure.id.clone(), ProcedureStatus::Locked))
            .collect();
        Self { catalog, statuses }
    }

    #[must_use]
    pub const fn catalog(&self) -> &ProcedureCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn status(&self, procedure_id: &str) -> Option<ProcedureStatus> {
        self.statuses.get(procedure_id).copied()
    }

    /// True when every requirement holds. Unknown ids never evaluate true;
    /// a procedure without requirements always does.
    #[must_use]
    pub fn evaluate(&self, procedure_id: &str, state: &GameState) -> bool {
        self.catalog.get(procedure_id).is_some_and(|procedure| {
            procedure
                .requirements
                .iter()
                .all(|requirement| requirement.is_met(state))
        })
    }

    #[must_use]
    pub fn explain(&self, procedure_id: &str, state: &GameState) -> Option<RequirementCheck> {
        self.catalog
            .get(procedure_id)
            .map(|procedure| RequirementCheck::evaluate(&procedure.requirements, state))
    }

    /// Unlock a locked procedure whose requirements hold. Returns `true` only
    /// on the call that performs the transition.
    pub fn try_unlock(&mut self, procedure_id: &str, state: &GameState) -> bool {
        if self.status(procedure_id) != Some(ProcedureStatus::Locked)
            || !self.evaluate(procedure_id, state)
        {
            return false;
        }
        self.statuses
            .insert(procedure_id.to_string(), ProcedureStatus::Unlocked);
        log::info!("procedure `{procedure_id}` unlocked");
        true
    }

    /// Try every locked procedure, returning the ids unlocked by this sweep
    /// in catalog order.
    pub fn sweep(&mut self, state: &GameState) -> Vec<String> {
        let locked: Vec<String> = self
            .catalog
            .iter()
            .filter(|procedure| self.status(&procedure.id) == Some(ProcedureStatus::Locked))
            .map(|procedure| procedure.id.clone())
            .collect();
        locked
            .into_iter()
            .filter(|id| self.try_unlock(id, state))
            .collect()
    }

    /// Move an unlocked procedure to active and hand back its effects.
    ///
    /// # Errors
    ///
    /// Returns `ActionError` when the id is unknown, the procedure is still
    /// locked, or it was already activated.
    pub fn activate(&mut self, procedure_id: &str) -> Result<Vec<ProcedureEffect>, ActionError> {
        let Some(procedure) = self.catalog.get(procedure_id) else {
            return Err(ActionError::UnknownProcedure(procedure_id.to_string()));
        };
        match self.status(procedure_id) {
            Some(ProcedureStatus::Unlocked) => {}
            Some(ProcedureStatus::Active) => {
                return Err(ActionError::AlreadyActive(procedure_id.to_string()));
            }
            _ => return Err(ActionError::ProcedureLocked(procedure_id.to_string())),
        }
        let effects = procedure.effects.clone();
        self.statuses
            .insert(procedure_id.to_string(), ProcedureStatus::Active);
        log::info!("procedure `{procedure_id}` activated");
        Ok(effects)
    }

    /// Unlocked or active procedures, in catalog order.
    pub fn available(&self) -> impl Iterator<Item = &Procedure> + '_ {
        self.catalog.iter().filter(|procedure| {
            self.status(&procedure.id)
                .is_some_and(ProcedureStatus::is_available)
        })
    }

    #[must_use]
    pub fn locked_count(&self) -> usize {
        self.statuses
            .values()
            .filter(|status| **status == ProcedureStatus::Locked)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::Requirement;

    fn procedure(id: &str, requirements: Vec<Requirement>) -> Procedure {
        Procedure {
            id: id.to_string(),
            title: id.to_string(),
            body: String::new(),
            requirements,
            effects: vec![ProcedureEffect::AddPuzzleProgress { amount: 5 }],
        }
    }

    fn evaluator() -> UnlockEvaluator {
        UnlockEvaluator::new(ProcedureCatalog::new(vec![
            procedure("open", Vec::new()),
            procedure(
                "flagged",
                vec![Requirement::PlotFlag {
                    name: "lights-out".into(),
                }],
            ),
            procedure("mystery", vec![Requirement::Unrecognized]),
        ]))
    }

    #[test]
    fn empty_requirements_are_satisfied() {
        let evaluator = evaluator();
        let state = GameState::default();
        assert!(evaluator.evaluate("open", &state));
        assert!(!evaluator.evaluate("flagged", &state));
        assert!(!evaluator.evaluate("missing", &state));
    }

    #[test]
    fn unlock_is_one_shot() {
        let mut evaluator = evaluator();
        let mut state = GameState::default();
        state.plot_flags.insert("lights-out".into());

        assert!(evaluator.try_unlock("flagged", &state));
        assert!(!evaluator.try_unlock("flagged", &state));
        assert_eq!(
            evaluator.status("flagged"),
            Some(ProcedureStatus::Unlocked)
        );

        // Requirements going false afterwards never relock.
        state.plot_flags.clear();
        assert!(!evaluator.evaluate("flagged", &state));
        assert_eq!(
            evaluator.status("flagged"),
            Some(ProcedureStatus::Unlocked)
        );
    }

    #[test]
    fn sweep_reports_new_unlocks_in_catalog_order() {
        let mut evaluator = evaluator();
        let mut state = GameState::default();
        state.plot_flags.insert("lights-out".into());
        assert_eq!(evaluator.sweep(&state), vec!["open", "flagged"]);
        assert!(evaluator.sweep(&state).is_empty());
        assert_eq!(evaluator.locked_count(), 1);
        assert_eq!(evaluator.available().count(), 2);
    }

    #[test]
    fn unrecognized_requirement_keeps_procedure_locked() {
        let mut evaluator = evaluator();
        let state = GameState::default();
        evaluator.sweep(&state);
        assert_eq!(evaluator.status("mystery"), Some(ProcedureStatus::Locked));
        let check = evaluator.explain("mystery", &state).unwrap();
        assert_eq!(check.unmet, vec![Requirement::Unrecognized]);
    }

    #[test]
    fn activation_requires_unlock_and_happens_once() {
        let mut evaluator = evaluator();
        let state = GameState::default();
        assert!(matches!(
            evaluator.activate("open"),
            Err(ActionError::ProcedureLocked(_))
        ));
        evaluator.sweep(&state);
        assert_eq!(evaluator.activate("open").unwrap().len(), 1);
        assert!(matches!(
            evaluator.activate("open"),
            Err(ActionError::AlreadyActive(_))
        ));
        assert!(matches!(
            evaluator.activate("nope"),
            Err(ActionError::UnknownProcedure(_))
        ));
    }
}
