//! Fixed 10-scenario regression batch (spec.md §5): one baseline run, six
//! single-setpoint steps, and three disturbance/failure cases, each starting
//! from the same tuned baseline with noise disabled for determinism.

use crate::error::Result;
use crate::metrics::{self, GateStats, LoopMetrics};
use crate::scenario::{Scenario, SpKey, SpStepEvent};
use crate::scheduler::Scheduler;

/// Metrics and gate statistics for one named scenario in the batch.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub gate: GateStats,
    pub total_iae: f64,
    pub metrics: Vec<LoopMetrics>,
}

/// Step time used for every single-setpoint-step scenario (B1-B6), chosen to
/// fall well inside the 3600s baseline window, with time left to settle.
const STEP_AT_S: f64 = 600.0;

fn with_sp_step(base: &Scenario, key: SpKey, delta: f64) -> Scenario {
    let mut scn = base.clone();
    scn.sp_steps.push(SpStepEvent { t: STEP_AT_S, key, delta });
    scn
}

fn with_feed_temp_disturbance(base: &Scenario) -> Scenario {
    let mut scn = base.clone();
    scn.disturbances.t_feed_dist = STEP_AT_S;
    scn.disturbances.d_feed_temp_amp = 8.0;
    scn
}

fn with_cw_degradation(base: &Scenario) -> Scenario {
    let mut scn = base.clone();
    scn.disturbances.t_cw_degrade = STEP_AT_S;
    scn.disturbances.cw_degrade_drop = 0.25;
    scn
}

fn with_analyzer_failure(base: &Scenario) -> Scenario {
    let mut scn = base.clone();
    scn.disturbances.analyzer_fail_enable = true;
    scn.disturbances.t_analyzer_fail = 1800.0;
    scn
}

fn run_one(name: &'static str, scn: Scenario) -> Result<ScenarioResult> {
    let trace = Scheduler::new(scn.clone())?.run()?;
    let gate = metrics::gate_stats(&trace.route);
    let metrics = metrics::compute_all(&trace, &scn.metric_opts);
    let total_iae = metrics.iter().map(|m| m.iae).sum();
    Ok(ScenarioResult { name, gate, total_iae, metrics })
}

/// Run the fixed ten-scenario batch against `base`, forcing noise off on every
/// member so the suite is reproducible regardless of `base.noise`.
pub fn run_suite(base: &Scenario) -> Result<Vec<ScenarioResult>> {
    let mut base = base.clone();
    base.noise = false;
    base.sp_steps.clear();

    Ok(vec![
        run_one("A0_BASELINE", base.clone())?,
        run_one("B1_STEP_FFEED", with_sp_step(&base, SpKey::FFeed, 5.0))?,
        run_one("B2_STEP_TFEED_OUT", with_sp_step(&base, SpKey::TFeedOut, 3.0))?,
        run_one("B3_STEP_TREB", with_sp_step(&base, SpKey::TReb, 3.0))?,
        run_one("B4_STEP_TCOND_OUT", with_sp_step(&base, SpKey::TCondOut, 2.0))?,
        run_one("B5_STEP_FREFLUX", with_sp_step(&base, SpKey::FReflux, 5.0))?,
        run_one("B6_STEP_LV201", with_sp_step(&base, SpKey::LV201, 5.0))?,
        run_one("C1_DIST_FEED_TEMP", with_feed_temp_disturbance(&base))?,
        run_one("C2_DIST_CW_DEGRADE", with_cw_degradation(&base))?,
        run_one("C3_ANALYZER_FAIL", with_analyzer_failure(&base))?,
    ])
}

/// True once every member has run and produced a trace with the expected
/// fixed-step sample count for `base`'s timing.
pub fn product_route_used(results: &[ScenarioResult]) -> bool {
    results.iter().any(|r| r.gate.product_pct > 0.0)
}
