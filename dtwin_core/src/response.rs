//! Wire-format response types realizing spec.md §6's external interface.
//!
//! Rust-side field names stay idiomatic snake_case; every name the external
//! contract spells differently is bridged with `#[serde(rename = "...")]` so
//! the emitted JSON matches byte for byte.

use serde::Serialize;

use crate::gate::{GateCfg, Route};
use crate::metrics::{self, GateStats, LoopMetrics};
use crate::suite::ScenarioResult;
use crate::trace::{EventRecord, Trace};

/// `chartData` is downsampled to at most this many points.
const MAX_CHART_POINTS: usize = 700;
/// `eventLog` is truncated to the first this-many events.
const MAX_EVENTS: usize = 200;

/// One downsampled chart-data record (spec.md §6).
#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub t: f64,
    #[serde(rename = "Tfeed")]
    pub t_feed: f64,
    #[serde(rename = "SP_Tfeed")]
    pub sp_t_feed: f64,
    #[serde(rename = "Treb")]
    pub t_reb: f64,
    #[serde(rename = "SP_Treb")]
    pub sp_t_reb: f64,
    #[serde(rename = "Tcond")]
    pub t_cond: f64,
    #[serde(rename = "SP_Tcond")]
    pub sp_t_cond: f64,
    #[serde(rename = "TT106")]
    pub tt106: f64,
    #[serde(rename = "TT201")]
    pub tt201: f64,
    pub rho15: f64,
    #[serde(rename = "Gate_rho_low")]
    pub gate_rho_low: f64,
    #[serde(rename = "Gate_rho_high")]
    pub gate_rho_high: f64,
    #[serde(rename = "dTsub")]
    pub dtsub: f64,
    #[serde(rename = "Gate_dTsub_min")]
    pub gate_dtsub_min: f64,
    pub route: u8,
    pub analyzer_ok: u8,
    #[serde(rename = "Ffeed")]
    pub f_feed: f64,
    #[serde(rename = "SP_Ffeed")]
    pub sp_f_feed: f64,
    #[serde(rename = "Freflux")]
    pub f_reflux: f64,
    #[serde(rename = "SP_Freflux")]
    pub sp_f_reflux: f64,
    #[serde(rename = "Lv201")]
    pub l_v201: f64,
    #[serde(rename = "SP_Lv201")]
    pub sp_l_v201: f64,
    pub u_feed: f64,
    pub u_steam_pre: f64,
    pub u_steam_reb: f64,
    pub u_cw: f64,
    pub u_reflux: f64,
    pub u_draw: f64,
}

fn route_code(route: Route) -> u8 {
    match route {
        Route::Recycle => 0,
        Route::Product => 1,
    }
}

fn chart_point_at(trace: &Trace, gate_cfg: &GateCfg, i: usize) -> ChartPoint {
    ChartPoint {
        t: trace.t[i],
        t_feed: trace.t_feed_out[i],
        sp_t_feed: trace.sp_t_feed_out[i],
        t_reb: trace.t_reb[i],
        sp_t_reb: trace.sp_t_reb[i],
        t_cond: trace.t_cond_out[i],
        sp_t_cond: trace.sp_t_cond_out[i],
        tt106: trace.tt106[i],
        tt201: trace.tt201[i],
        rho15: trace.rho15[i],
        gate_rho_low: gate_cfg.rho15_on_low,
        gate_rho_high: gate_cfg.rho15_on_high,
        dtsub: trace.dtsub[i],
        gate_dtsub_min: gate_cfg.dtsub_min,
        route: route_code(trace.route[i]),
        analyzer_ok: u8::from(trace.analyzer_ok[i]),
        f_feed: trace.f_feed[i],
        sp_f_feed: trace.sp_f_feed[i],
        f_reflux: trace.f_reflux[i],
        sp_f_reflux: trace.sp_f_reflux[i],
        l_v201: trace.l_v201[i],
        sp_l_v201: trace.sp_l_v201[i],
        u_feed: trace.u_feed[i],
        u_steam_pre: trace.u_steam_pre[i],
        u_steam_reb: trace.u_steam_reb[i],
        u_cw: trace.u_cw[i],
        u_reflux: trace.u_reflux[i],
        u_draw: trace.u_draw[i],
    }
}

/// Downsample a full trace to at most [`MAX_CHART_POINTS`] records in a
/// single linear scan, always keeping the final sample (spec.md §6).
pub fn downsample(trace: &Trace, gate_cfg: &GateCfg) -> Vec<ChartPoint> {
    let n = trace.len();
    if n == 0 {
        return Vec::new();
    }
    let stride = n.div_ceil(MAX_CHART_POINTS).max(1);
    let mut points: Vec<ChartPoint> = (0..n)
        .step_by(stride)
        .map(|i| chart_point_at(trace, gate_cfg, i))
        .collect();
    if points.last().is_none_or(|p| p.t != trace.t[n - 1]) {
        points.push(chart_point_at(trace, gate_cfg, n - 1));
    }
    points
}

/// One loop's metrics (spec.md §6: `{name, IAE, ITAE, OvershootPct, SettlingTime}`).
#[derive(Debug, Clone, Serialize)]
pub struct MetricOut {
    pub name: String,
    #[serde(rename = "IAE")]
    pub iae: f64,
    #[serde(rename = "ITAE")]
    pub itae: f64,
    #[serde(rename = "OvershootPct")]
    pub overshoot_pct: Option<f64>,
    #[serde(rename = "SettlingTime")]
    pub settling_time: Option<f64>,
}

impl From<&LoopMetrics> for MetricOut {
    fn from(m: &LoopMetrics) -> Self {
        Self {
            name: m.name.clone(),
            iae: m.iae,
            itae: m.itae,
            overshoot_pct: m.overshoot_pct,
            settling_time: m.settling_time.as_option(),
        }
    }
}

/// Gate routing statistics (spec.md §6: `{productPct, switches}`).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GateStatsOut {
    #[serde(rename = "productPct")]
    pub product_pct: f64,
    pub switches: usize,
}

impl From<GateStats> for GateStatsOut {
    fn from(g: GateStats) -> Self {
        Self {
            product_pct: g.product_pct,
            switches: g.switches,
        }
    }
}

/// One event-log entry (spec.md §6: `{t, msg}`).
#[derive(Debug, Clone, Serialize)]
pub struct EventOut {
    pub t: f64,
    pub msg: String,
}

impl From<&EventRecord> for EventOut {
    fn from(e: &EventRecord) -> Self {
        Self { t: e.t, msg: e.msg.clone() }
    }
}

/// Single-mode response (spec.md §6).
#[derive(Debug, Clone, Serialize)]
pub struct SingleResponse {
    #[serde(rename = "chartData")]
    pub chart_data: Vec<ChartPoint>,
    pub metrics: Vec<MetricOut>,
    pub gate: GateStatsOut,
    #[serde(rename = "eventLog")]
    pub event_log: Vec<EventOut>,
}

impl SingleResponse {
    /// Build the response from a completed run's trace and its gate config.
    pub fn build(trace: &Trace, gate_cfg: &GateCfg, metrics_opts: &crate::scenario::MetricOpts) -> Self {
        let loop_metrics = metrics::compute_all(trace, metrics_opts);
        Self {
            chart_data: downsample(trace, gate_cfg),
            metrics: loop_metrics.iter().map(MetricOut::from).collect(),
            gate: metrics::gate_stats(&trace.route).into(),
            event_log: trace.events.iter().take(MAX_EVENTS).map(EventOut::from).collect(),
        }
    }
}

/// One scenario's result within a suite response (spec.md §6).
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResultOut {
    pub name: String,
    pub gate: GateStatsOut,
    #[serde(rename = "totalIAE")]
    pub total_iae: f64,
    pub metrics: Vec<MetricOut>,
}

impl From<&ScenarioResult> for ScenarioResultOut {
    fn from(r: &ScenarioResult) -> Self {
        Self {
            name: r.name.to_string(),
            gate: r.gate.into(),
            total_iae: r.total_iae,
            metrics: r.metrics.iter().map(MetricOut::from).collect(),
        }
    }
}

/// Suite-mode response: one entry per member of the fixed ten-scenario batch.
pub type SuiteResponse = Vec<ScenarioResultOut>;

/// Convert a completed suite run into its wire form.
pub fn suite_response(results: &[ScenarioResult]) -> SuiteResponse {
    results.iter().map(ScenarioResultOut::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;
    use crate::scheduler::Scheduler;

    #[test]
    fn downsample_keeps_at_most_max_points_and_always_the_last_sample() {
        let mut scn = Scenario::baseline();
        scn.sim_s = 3600.0;
        scn.dt = 1.0;
        let trace = Scheduler::new(scn.clone()).unwrap().run().unwrap();
        let points = downsample(&trace, &scn.gate_cfg);
        assert!(points.len() <= MAX_CHART_POINTS + 1);
        assert_eq!(points.last().unwrap().t, *trace.t.last().unwrap());
    }

    #[test]
    fn downsample_keeps_every_point_for_a_short_run() {
        let mut scn = Scenario::baseline();
        scn.sim_s = 10.0;
        scn.dt = 1.0;
        let trace = Scheduler::new(scn.clone()).unwrap().run().unwrap();
        let points = downsample(&trace, &scn.gate_cfg);
        assert_eq!(points.len(), trace.len());
    }

    #[test]
    fn route_and_analyzer_ok_serialize_as_zero_or_one() {
        let mut scn = Scenario::baseline();
        scn.sim_s = 10.0;
        let trace = Scheduler::new(scn.clone()).unwrap().run().unwrap();
        let points = downsample(&trace, &scn.gate_cfg);
        for p in &points {
            assert!(p.route == 0 || p.route == 1);
            assert!(p.analyzer_ok == 0 || p.analyzer_ok == 1);
        }
    }

    #[test]
    fn single_response_event_log_is_truncated_to_two_hundred() {
        let mut scn = Scenario::baseline();
        scn.disturbances.analyzer_fail_enable = true;
        scn.disturbances.t_analyzer_fail = 1.0;
        scn.sim_s = 600.0;
        let trace = Scheduler::new(scn.clone()).unwrap().run().unwrap();
        let resp = SingleResponse::build(&trace, &scn.gate_cfg, &scn.metric_opts);
        assert!(resp.event_log.len() <= MAX_EVENTS);
    }

    #[test]
    fn single_response_reports_all_six_loops() {
        let scn = Scenario::baseline();
        let trace = Scheduler::new(scn.clone()).unwrap().run().unwrap();
        let resp = SingleResponse::build(&trace, &scn.gate_cfg, &scn.metric_opts);
        assert_eq!(resp.metrics.len(), 6);
    }

    #[test]
    fn suite_response_has_one_entry_per_scenario() {
        let base = Scenario::baseline();
        let results = crate::suite::run_suite(&base).unwrap();
        let resp = suite_response(&results);
        assert_eq!(resp.len(), results.len());
    }
}
