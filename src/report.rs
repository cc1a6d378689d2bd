//! Report assembly and the simulation boundary.
//!
//! `run_simulation` is the single entry point the presentation layer calls:
//! a raw study mapping goes in, an immutable report comes out. No error
//! crosses the boundary; any failure produces an empty report carrying a
//! human-readable message, and pages render it all or not at all.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::derived::{
    self, CircularityBundle, EnergySourceBreakdown, ExecutiveSummary, GwpContribution,
    MaterialFlow, PrimaryVsRecycled,
};
use crate::error::SimError;
use crate::logging::{self, obj, v_num, v_str, Domain, Level};
use crate::reference::{ImpactCategory, ReferenceTable, RegionTable};
use crate::sampler::{self, CancelToken, ImpactSummary, DEFAULT_NUM_RUNS};
use crate::study::{normalise, DataQuality, GoalScope, StudyInput};

/// Fixed interpretation text shown alongside the numeric results. A template
/// with no substitution.
pub const AI_LIFE_CYCLE_INTERPRETATION: &str = "The impact profile is dominated by the \
production phase, which drives roughly two thirds of the Global Warming Potential through \
ore reduction and smelting energy. Transport and use contribute the remainder. Raising the \
secondary material content is the single most effective lever: the recycled route cuts GWP \
by half and energy demand by 60%. Water consumption and particulate emissions track the \
energy mix, so grid decarbonisation compounds these gains. Uncertainty bands are reported \
at the 95% level; results within overlapping bands should not be ranked.";

// =============================================================================
// Study state machine
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StudyState {
    /// Descriptor being edited.
    Draft,
    /// Submitted, waiting for the sampler.
    Queued,
    /// Sampler active.
    Running,
    /// Report produced; held by the caller only.
    Complete,
}

impl StudyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyState::Draft => "draft",
            StudyState::Queued => "queued",
            StudyState::Running => "running",
            StudyState::Complete => "complete",
        }
    }
}

/// Tracks one study through its lifecycle. The transitions mirror the UI
/// flow; anything else is a programming error and is reported as such
/// instead of panicking.
#[derive(Debug)]
pub struct StudyRun {
    state: StudyState,
    last_error: Option<String>,
}

impl StudyRun {
    pub fn new() -> Self {
        Self {
            state: StudyState::Draft,
            last_error: None,
        }
    }

    pub fn state(&self) -> StudyState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn transition(&mut self, from: StudyState, to: StudyState) -> Result<(), SimError> {
        if self.state != from {
            return Err(SimError::InvalidTransition {
                from: self.state.as_str(),
                to: to.as_str(),
            });
        }
        self.state = to;
        Ok(())
    }

    pub fn submit(&mut self) -> Result<(), SimError> {
        self.transition(StudyState::Draft, StudyState::Queued)
    }

    pub fn start(&mut self) -> Result<(), SimError> {
        self.transition(StudyState::Queued, StudyState::Running)
    }

    pub fn complete(&mut self) -> Result<(), SimError> {
        self.transition(StudyState::Running, StudyState::Complete)
    }

    /// Failure drops the study back to Draft with the error surfaced.
    pub fn fail(&mut self, message: &str) -> Result<(), SimError> {
        self.transition(StudyState::Running, StudyState::Draft)?;
        self.last_error = Some(message.to_string());
        Ok(())
    }
}

impl Default for StudyRun {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Report
// =============================================================================

/// The assembled study report. Immutable once built; either complete (every
/// section present) or empty with `error` set. Presentation must not render
/// an empty report partially.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_scope: Option<GoalScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<DataQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executive_summary: Option<ExecutiveSummary>,
    pub ai_life_cycle_interpretation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circularity_analysis: Option<CircularityBundle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_flow_analysis: Option<MaterialFlow>,
    pub key_impact_profiles: BTreeMap<ImpactCategory, ImpactSummary>,
    pub uncertainty_dashboard: BTreeMap<ImpactCategory, Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_source_breakdown: Option<EnergySourceBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gwp_contribution_analysis: Option<GwpContribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_vs_recycled: Option<PrimaryVsRecycled>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    /// The empty report returned when any stage fails.
    pub fn failed(message: String) -> Self {
        Self {
            goal_scope: None,
            data_quality: None,
            executive_summary: None,
            ai_life_cycle_interpretation: String::new(),
            circularity_analysis: None,
            material_flow_analysis: None,
            key_impact_profiles: BTreeMap::new(),
            uncertainty_dashboard: BTreeMap::new(),
            energy_source_breakdown: None,
            gwp_contribution_analysis: None,
            primary_vs_recycled: None,
            error: Some(message),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
            && self.goal_scope.is_some()
            && self.executive_summary.is_some()
            && !self.key_impact_profiles.is_empty()
            && !self.uncertainty_dashboard.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

// =============================================================================
// Simulation engine
// =============================================================================

/// Owns the static tables for a process lifetime. `builtin()` is the
/// production configuration; tests inject fixtures via `with_tables`.
#[derive(Debug, Clone)]
pub struct Simulation {
    reference: ReferenceTable,
    regions: RegionTable,
}

impl Simulation {
    pub fn builtin() -> Self {
        Self {
            reference: ReferenceTable::builtin(),
            regions: RegionTable::builtin(),
        }
    }

    pub fn with_tables(reference: ReferenceTable, regions: RegionTable) -> Self {
        Self { reference, regions }
    }

    /// Run one study to a report. Never fails: errors become an empty
    /// report with the message set.
    pub fn run(&self, input: &StudyInput, num_runs: usize) -> Report {
        self.run_cancellable(input, num_runs, None)
    }

    pub fn run_cancellable(
        &self,
        input: &StudyInput,
        num_runs: usize,
        cancel: Option<&CancelToken>,
    ) -> Report {
        let mut run = StudyRun::new();
        match self.try_run(input, num_runs, cancel, &mut run) {
            Ok(report) => report,
            Err(err) => {
                let message = err.to_string();
                // Running -> Draft; earlier-stage failures may leave the
                // study before Running, which is fine to ignore here.
                let _ = run.fail(&message);
                logging::log(
                    Level::Error,
                    Domain::Report,
                    "simulation_failed",
                    obj(&[("msg", v_str(&message))]),
                );
                Report::failed(message)
            }
        }
    }

    fn try_run(
        &self,
        input: &StudyInput,
        num_runs: usize,
        cancel: Option<&CancelToken>,
        run: &mut StudyRun,
    ) -> Result<Report, SimError> {
        let descriptor = normalise(input, &self.regions);
        let n = descriptor.num_runs.unwrap_or(num_runs).max(1);
        run.submit()?;
        logging::log(
            Level::Info,
            Domain::Study,
            "study_queued",
            obj(&[
                ("project", v_str(&descriptor.project_name)),
                ("material", v_str(descriptor.material.as_str())),
                ("region", v_str(&descriptor.region)),
                ("num_runs", v_num(n as f64)),
            ]),
        );

        run.start()?;
        let output = sampler::sample(&self.reference, n, descriptor.seed, cancel)?;
        logging::log(
            Level::Debug,
            Domain::Sampler,
            "sampling_done",
            obj(&[("categories", v_num(output.summaries.len() as f64))]),
        );

        let bundles = derived::build(&output.summaries)?;

        let report = Report {
            goal_scope: Some(descriptor.goal_scope.clone()),
            data_quality: Some(descriptor.data_quality),
            executive_summary: Some(bundles.executive_summary),
            ai_life_cycle_interpretation: AI_LIFE_CYCLE_INTERPRETATION.to_string(),
            circularity_analysis: Some(bundles.circularity_analysis),
            material_flow_analysis: Some(bundles.material_flow_analysis),
            key_impact_profiles: output.summaries,
            uncertainty_dashboard: output.samples,
            energy_source_breakdown: Some(bundles.energy_source_breakdown),
            gwp_contribution_analysis: Some(bundles.gwp_contribution_analysis),
            primary_vs_recycled: Some(bundles.primary_vs_recycled),
            error: None,
        };

        run.complete()?;
        logging::log(
            Level::Info,
            Domain::Report,
            "report_assembled",
            obj(&[("state", v_str(run.state().as_str()))]),
        );
        Ok(report)
    }
}

/// The boundary entry point: raw study mapping in, report out.
pub fn run_simulation(input: &StudyInput, num_runs: usize) -> Report {
    Simulation::builtin().run(input, num_runs)
}

/// `run_simulation` with the default workload (1000 runs).
pub fn run_simulation_default(input: &StudyInput) -> Report {
    run_simulation(input, DEFAULT_NUM_RUNS)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_happy_path() {
        let mut run = StudyRun::new();
        assert_eq!(run.state(), StudyState::Draft);
        run.submit().unwrap();
        run.start().unwrap();
        run.complete().unwrap();
        assert_eq!(run.state(), StudyState::Complete);
        assert!(run.last_error().is_none());
    }

    #[test]
    fn test_state_machine_failure_returns_to_draft() {
        let mut run = StudyRun::new();
        run.submit().unwrap();
        run.start().unwrap();
        run.fail("sampler exploded").unwrap();
        assert_eq!(run.state(), StudyState::Draft);
        assert_eq!(run.last_error(), Some("sampler exploded"));
    }

    #[test]
    fn test_state_machine_rejects_illegal_transitions() {
        let mut run = StudyRun::new();
        assert!(matches!(
            run.start(),
            Err(SimError::InvalidTransition { from: "draft", to: "running" })
        ));
        run.submit().unwrap();
        assert!(run.submit().is_err());
        assert!(run.complete().is_err());
    }

    #[test]
    fn test_run_produces_complete_report() {
        let input = StudyInput {
            seed: Some(5),
            ..Default::default()
        };
        let report = Simulation::builtin().run(&input, 200);
        assert!(report.is_complete());
        assert_eq!(report.key_impact_profiles.len(), 15);
        assert_eq!(report.uncertainty_dashboard.len(), 15);
        assert_eq!(
            report.ai_life_cycle_interpretation,
            AI_LIFE_CYCLE_INTERPRETATION
        );
    }

    #[test]
    fn test_report_copies_descriptor_fields() {
        let input = StudyInput {
            intended_application: Some("Structural steel comparison".to_string()),
            reliability: Some(5),
            seed: Some(5),
            ..Default::default()
        };
        let report = Simulation::builtin().run(&input, 100);
        assert_eq!(
            report.goal_scope.as_ref().unwrap().intended_application,
            "Structural steel comparison"
        );
        assert_eq!(report.data_quality.unwrap().reliability, 5);
    }

    #[test]
    fn test_descriptor_num_runs_overrides_argument() {
        let input = StudyInput {
            num_runs: Some(64),
            seed: Some(5),
            ..Default::default()
        };
        let report = Simulation::builtin().run(&input, 5000);
        let draws = &report.uncertainty_dashboard[&ImpactCategory::GlobalWarmingPotential];
        assert_eq!(draws.len(), 64);
    }

    #[test]
    fn test_missing_spec_yields_empty_report_not_panic() {
        let cut = ReferenceTable::builtin().without(ImpactCategory::EnergyDemand);
        let sim = Simulation::with_tables(cut, RegionTable::builtin());
        let report = sim.run(&StudyInput::default(), 100);
        assert!(!report.is_complete());
        assert!(report.error.is_some());
        assert!(report.key_impact_profiles.is_empty());
        assert!(report.uncertainty_dashboard.is_empty());
    }

    #[test]
    fn test_cancelled_run_yields_empty_report() {
        let token = CancelToken::new();
        token.cancel();
        let report =
            Simulation::builtin().run_cancellable(&StudyInput::default(), 100, Some(&token));
        assert!(!report.is_complete());
        assert_eq!(report.error.as_deref(), Some("simulation cancelled"));
    }

    #[test]
    fn test_failed_report_serializes_without_sections() {
        let report = Report::failed("boom".to_string());
        let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(json["error"], "boom");
        assert!(json.get("executive_summary").is_none());
        assert_eq!(json["key_impact_profiles"], serde_json::json!({}));
    }
}
