#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! External request/response schema for the distillation-train digital twin.
//!
//! [`Request`] mirrors the engine's external request fields and deserializes
//! permissively: missing, null, or non-finite numeric fields and
//! non-boolean-looking flags fall back to the documented default rather
//! than failing to parse. [`Request::into_scenario`]
//! turns a sanitized request into the [`dtwin_core::scenario::Scenario`]
//! the engine consumes, and [`run_single`]/[`run_suite`] drive a run end to
//! end and hand back the wire-format response types from
//! `dtwin_core::response`.

use serde::Deserialize;
use serde::de::Deserializer;

use dtwin_core::gate::GateCfg;
use dtwin_core::plant::{MvBundle, nominal};
use dtwin_core::response::{self, SingleResponse, SuiteResponse};
use dtwin_core::scenario::{DisturbanceSchedule, InterlockCfg, LoopTuning, MetricOpts, Scenario, Setpoints, Tunings};
use dtwin_core::scheduler::Scheduler;
use dtwin_core::suite;

/// `"single"` or `"suite"`; unrecognized strings default to `Single`.
#[derive(Debug, Clone, Copy, Default)]
pub enum Mode {
    #[default]
    Single,
    Suite,
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            Some("suite") => Mode::Suite,
            _ => Mode::Single,
        })
    }
}

/// Accepts a JSON/TOML number or a numeric string; anything else (missing,
/// `null`, unparseable string, non-finite) becomes `None` so the caller's
/// default takes over.
fn de_flex_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flexible {
        Num(f64),
        Str(String),
    }
    let parsed = Option::<Flexible>::deserialize(deserializer)?.and_then(|f| match f {
        Flexible::Num(n) => Some(n),
        Flexible::Str(s) => s.trim().parse::<f64>().ok(),
    });
    Ok(parsed.filter(|n| n.is_finite()))
}

/// Accepts a JSON/TOML bool or the strings `"true"`/`"false"`; anything else
/// becomes `None`.
fn de_flex_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flexible {
        Bool(bool),
        Str(String),
    }
    Ok(Option::<Flexible>::deserialize(deserializer)?.and_then(|f| match f {
        Flexible::Bool(b) => Some(b),
        Flexible::Str(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
    }))
}

/// The external request bundle. Every numeric/boolean field is optional on
/// the wire; [`Request::into_scenario`] fills in defaults and clamps ranges.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Request {
    pub mode: Mode,

    #[serde(deserialize_with = "de_flex_f64")]
    pub sim_s: Option<f64>,
    #[serde(deserialize_with = "de_flex_f64")]
    pub dt: Option<f64>,
    #[serde(deserialize_with = "de_flex_bool")]
    pub noise: Option<bool>,

    #[serde(rename = "sp_Ffeed", deserialize_with = "de_flex_f64")]
    pub sp_ffeed: Option<f64>,
    #[serde(rename = "sp_Tfeed", deserialize_with = "de_flex_f64")]
    pub sp_tfeed: Option<f64>,
    #[serde(rename = "sp_Treb", deserialize_with = "de_flex_f64")]
    pub sp_treb: Option<f64>,
    #[serde(rename = "sp_Tcond", deserialize_with = "de_flex_f64")]
    pub sp_tcond: Option<f64>,
    #[serde(rename = "sp_Freflux", deserialize_with = "de_flex_f64")]
    pub sp_freflux: Option<f64>,
    #[serde(rename = "sp_Lv201", deserialize_with = "de_flex_f64")]
    pub sp_lv201: Option<f64>,

    #[serde(rename = "kp_FIC101", deserialize_with = "de_flex_f64")]
    pub kp_fic101: Option<f64>,
    #[serde(rename = "ti_FIC101", deserialize_with = "de_flex_f64")]
    pub ti_fic101: Option<f64>,
    #[serde(rename = "kp_TIC101", deserialize_with = "de_flex_f64")]
    pub kp_tic101: Option<f64>,
    #[serde(rename = "ti_TIC101", deserialize_with = "de_flex_f64")]
    pub ti_tic101: Option<f64>,
    #[serde(rename = "kp_TIC102", deserialize_with = "de_flex_f64")]
    pub kp_tic102: Option<f64>,
    #[serde(rename = "ti_TIC102", deserialize_with = "de_flex_f64")]
    pub ti_tic102: Option<f64>,
    #[serde(rename = "kp_TIC201", deserialize_with = "de_flex_f64")]
    pub kp_tic201: Option<f64>,
    #[serde(rename = "ti_TIC201", deserialize_with = "de_flex_f64")]
    pub ti_tic201: Option<f64>,
    #[serde(rename = "kp_FIC201", deserialize_with = "de_flex_f64")]
    pub kp_fic201: Option<f64>,
    #[serde(rename = "ti_FIC201", deserialize_with = "de_flex_f64")]
    pub ti_fic201: Option<f64>,
    #[serde(rename = "kp_LIC201", deserialize_with = "de_flex_f64")]
    pub kp_lic201: Option<f64>,
    #[serde(rename = "ti_LIC201", deserialize_with = "de_flex_f64")]
    pub ti_lic201: Option<f64>,

    #[serde(deserialize_with = "de_flex_f64")]
    pub g_tt_low: Option<f64>,
    #[serde(deserialize_with = "de_flex_f64")]
    pub g_tt_high: Option<f64>,
    #[serde(deserialize_with = "de_flex_f64")]
    pub g_rho_low: Option<f64>,
    #[serde(deserialize_with = "de_flex_f64")]
    pub g_rho_high: Option<f64>,
    #[serde(rename = "g_dTsub", deserialize_with = "de_flex_f64")]
    pub g_dtsub: Option<f64>,
    #[serde(deserialize_with = "de_flex_f64")]
    pub g_delay_on: Option<f64>,
    #[serde(deserialize_with = "de_flex_f64")]
    pub g_delay_off: Option<f64>,

    #[serde(rename = "analyzerFail", deserialize_with = "de_flex_bool")]
    pub analyzer_fail: Option<bool>,
}

impl Default for Request {
    fn default() -> Self {
        // Every field defaults to `None`/`Mode::Single`; `into_scenario` supplies
        // the documented numeric defaults from `Scenario::baseline()`.
        Self {
            mode: Mode::default(),
            sim_s: None,
            dt: None,
            noise: None,
            sp_ffeed: None,
            sp_tfeed: None,
            sp_treb: None,
            sp_tcond: None,
            sp_freflux: None,
            sp_lv201: None,
            kp_fic101: None,
            ti_fic101: None,
            kp_tic101: None,
            ti_tic101: None,
            kp_tic102: None,
            ti_tic102: None,
            kp_tic201: None,
            ti_tic201: None,
            kp_fic201: None,
            ti_fic201: None,
            kp_lic201: None,
            ti_lic201: None,
            g_tt_low: None,
            g_tt_high: None,
            g_rho_low: None,
            g_rho_high: None,
            g_dtsub: None,
            g_delay_on: None,
            g_delay_off: None,
            analyzer_fail: None,
        }
    }
}

/// Analyzer-fail trip time used when `analyzerFail` is enabled in single mode.
const ANALYZER_FAIL_T: f64 = 1800.0;

fn tuning(kp: Option<f64>, ti: Option<f64>, base: LoopTuning) -> LoopTuning {
    LoopTuning {
        kp: kp.filter(|v| *v >= 0.0).unwrap_or(base.kp),
        ti: ti.filter(|v| *v > 0.0).unwrap_or(base.ti),
    }
}

impl TryFrom<&str> for Request {
    type Error = eyre::Report;

    /// Parse a TOML request file (used by the CLI to load a scenario from disk).
    fn try_from(s: &str) -> eyre::Result<Self> {
        toml::from_str(s).map_err(|e| eyre::eyre!("parse request TOML: {e}"))
    }
}

impl Request {
    /// Parse a JSON request body (the shape an embedding host would send).
    pub fn from_json(s: &str) -> eyre::Result<Self> {
        serde_json::from_str(s).map_err(|e| eyre::eyre!("parse request JSON: {e}"))
    }

    /// Sanitize and convert into the immutable [`Scenario`] the engine
    /// consumes: out-of-range or absent fields fall back to
    /// [`Scenario::baseline`]'s nominal values; `sim_s`/`dt` are clamped; gate
    /// threshold pairs are swapped if given in the wrong order.
    pub fn into_scenario(&self) -> Scenario {
        let base = Scenario::baseline();

        let sim_s = self.sim_s.unwrap_or(base.sim_s).clamp(600.0, 7200.0);
        let dt = self.dt.unwrap_or(base.dt).clamp(0.5, 5.0);
        let noise = self.noise.unwrap_or(base.noise);

        let setpoints = Setpoints {
            f_feed: self.sp_ffeed.unwrap_or(base.setpoints.f_feed),
            t_feed_out: self.sp_tfeed.unwrap_or(base.setpoints.t_feed_out),
            t_reb: self.sp_treb.unwrap_or(base.setpoints.t_reb),
            t_cond_out: self.sp_tcond.unwrap_or(base.setpoints.t_cond_out),
            f_reflux: self.sp_freflux.unwrap_or(base.setpoints.f_reflux),
            l_v201: self.sp_lv201.unwrap_or(base.setpoints.l_v201),
        };

        let tunings = Tunings {
            fic101: tuning(self.kp_fic101, self.ti_fic101, base.tunings.fic101),
            tic101: tuning(self.kp_tic101, self.ti_tic101, base.tunings.tic101),
            tic102: tuning(self.kp_tic102, self.ti_tic102, base.tunings.tic102),
            tic201: tuning(self.kp_tic201, self.ti_tic201, base.tunings.tic201),
            fic201: tuning(self.kp_fic201, self.ti_fic201, base.tunings.fic201),
            lic201: tuning(self.kp_lic201, self.ti_lic201, base.tunings.lic201),
        };

        let mut tt_low = self.g_tt_low.unwrap_or(base.gate_cfg.tt106_on_low);
        let mut tt_high = self.g_tt_high.unwrap_or(base.gate_cfg.tt106_on_high);
        if tt_low > tt_high {
            std::mem::swap(&mut tt_low, &mut tt_high);
        }
        let mut rho_low = self.g_rho_low.unwrap_or(base.gate_cfg.rho15_on_low);
        let mut rho_high = self.g_rho_high.unwrap_or(base.gate_cfg.rho15_on_high);
        if rho_low > rho_high {
            std::mem::swap(&mut rho_low, &mut rho_high);
        }
        let gate_cfg = GateCfg {
            tt106_on_low: tt_low,
            tt106_on_high: tt_high,
            rho15_on_low: rho_low,
            rho15_on_high: rho_high,
            dtsub_min: self.g_dtsub.unwrap_or(base.gate_cfg.dtsub_min),
            delay_on_s: self.g_delay_on.filter(|v| *v >= 0.0).unwrap_or(base.gate_cfg.delay_on_s),
            delay_off_s: self.g_delay_off.filter(|v| *v >= 0.0).unwrap_or(base.gate_cfg.delay_off_s),
        };

        let analyzer_fail = self.analyzer_fail.unwrap_or(false) && self.mode == Mode::Single;
        let disturbances = DisturbanceSchedule {
            analyzer_fail_enable: analyzer_fail,
            t_analyzer_fail: ANALYZER_FAIL_T,
            ..base.disturbances
        };

        Scenario {
            sim_s,
            dt,
            noise,
            setpoints,
            tunings,
            gate_cfg,
            disturbances,
            ..base
        }
    }
}

impl PartialEq for Mode {
    fn eq(&self, other: &Self) -> bool {
        matches!((self, other), (Mode::Single, Mode::Single) | (Mode::Suite, Mode::Suite))
    }
}
impl Eq for Mode {}

/// Error response shape: `{"error": "..."}`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn from_report(err: &eyre::Report) -> Self {
        Self { error: err.to_string() }
    }
}

/// Run a request's `single` mode to completion and build its wire response.
pub fn run_single(req: &Request) -> eyre::Result<SingleResponse> {
    let scenario = req.into_scenario();
    let gate_cfg = scenario.gate_cfg;
    let metric_opts = scenario.metric_opts;
    let trace = Scheduler::new(scenario)?.run()?;
    Ok(SingleResponse::build(&trace, &gate_cfg, &metric_opts))
}

/// Run a request's `suite` mode (the fixed ten-scenario batch) and build its
/// wire response.
pub fn run_suite(req: &Request) -> eyre::Result<SuiteResponse> {
    let scenario = req.into_scenario();
    let results = suite::run_suite(&scenario)?;
    Ok(response::suite_response(&results))
}

/// Dispatch on `req.mode`, serializing either response shape to a JSON
/// string, or an [`ErrorResponse`] JSON body on failure.
pub fn run_to_json(req: &Request) -> String {
    let result = match req.mode {
        Mode::Single => run_single(req).map(|r| serde_json::to_string(&r)),
        Mode::Suite => run_suite(req).map(|r| serde_json::to_string(&r)),
    };
    match result {
        Ok(Ok(json)) => json,
        Ok(Err(e)) => serde_json::to_string(&ErrorResponse { error: e.to_string() })
            .unwrap_or_else(|_| "{\"error\":\"failed to serialize response\"}".to_string()),
        Err(e) => serde_json::to_string(&ErrorResponse::from_report(&e))
            .unwrap_or_else(|_| "{\"error\":\"failed to serialize response\"}".to_string()),
    }
}

/// Default manipulated-variable initialization vector, exposed for callers
/// that want the nominal anchor without building a full [`Request`].
pub fn default_mv_init() -> MvBundle {
    Scenario::baseline().mv_init
}

/// Fixed interlock thresholds, exposed read-only: the external request
/// cannot override plant safety constants.
pub fn default_interlock_cfg() -> InterlockCfg {
    Scenario::baseline().interlock_cfg
}

/// Default metric options (normalization span, settling band, hold window).
pub fn default_metric_opts() -> MetricOpts {
    Scenario::baseline().metric_opts
}

/// Re-exported so downstream crates (the CLI) do not need a direct
/// `dtwin_core` dependency just to name the nominal operating point.
pub use nominal as plant_nominal;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_request_fields_fall_back_to_baseline_defaults() {
        let req = Request::default();
        let scn = req.into_scenario();
        let base = Scenario::baseline();
        assert_eq!(scn.sim_s, base.sim_s);
        assert_eq!(scn.dt, base.dt);
        assert_eq!(scn.setpoints, base.setpoints);
        assert_eq!(scn.tunings, base.tunings);
    }

    #[test]
    fn sim_s_and_dt_clamp_to_documented_ranges() {
        let req = Request {
            sim_s: Some(100.0),
            dt: Some(50.0),
            ..Request::default()
        };
        let scn = req.into_scenario();
        assert_eq!(scn.sim_s, 600.0);
        assert_eq!(scn.dt, 5.0);
    }

    #[test]
    fn gate_threshold_pairs_swap_when_given_low_above_high() {
        let req = Request {
            g_tt_low: Some(97.0),
            g_tt_high: Some(93.0),
            ..Request::default()
        };
        let scn = req.into_scenario();
        assert!(scn.gate_cfg.tt106_on_low < scn.gate_cfg.tt106_on_high);
        assert_eq!(scn.gate_cfg.tt106_on_low, 93.0);
        assert_eq!(scn.gate_cfg.tt106_on_high, 97.0);
    }

    #[test]
    fn string_booleans_are_accepted() {
        let json = r#"{"mode": "single", "noise": "true", "analyzerFail": "false"}"#;
        let req = Request::from_json(json).unwrap();
        assert_eq!(req.noise, Some(true));
        assert_eq!(req.analyzer_fail, Some(false));
    }

    #[test]
    fn non_finite_numeric_strings_fall_back_to_default() {
        let json = r#"{"sim_s": "NaN", "dt": "inf"}"#;
        let req = Request::from_json(json).unwrap();
        let scn = req.into_scenario();
        let base = Scenario::baseline();
        assert_eq!(scn.sim_s, base.sim_s);
        assert_eq!(scn.dt, base.dt);
    }

    #[test]
    fn unknown_mode_string_defaults_to_single() {
        let json = r#"{"mode": "parallel-universe"}"#;
        let req = Request::from_json(json).unwrap();
        assert_eq!(req.mode, Mode::Single);
    }

    #[test]
    fn analyzer_fail_flag_is_ignored_outside_single_mode() {
        let json = r#"{"mode": "suite", "analyzerFail": true}"#;
        let req = Request::from_json(json).unwrap();
        let scn = req.into_scenario();
        assert!(!scn.disturbances.analyzer_fail_enable);
    }

    #[test]
    fn analyzer_fail_flag_schedules_trip_at_documented_time_in_single_mode() {
        let json = r#"{"mode": "single", "analyzerFail": true}"#;
        let req = Request::from_json(json).unwrap();
        let scn = req.into_scenario();
        assert!(scn.disturbances.analyzer_fail_enable);
        assert_eq!(scn.disturbances.t_analyzer_fail, ANALYZER_FAIL_T);
    }

    #[test]
    fn run_single_from_toml_request_produces_six_loop_metrics() {
        let req = Request::try_from("mode = \"single\"\nsim_s = 600.0\n").unwrap();
        let resp = run_single(&req).unwrap();
        assert_eq!(resp.metrics.len(), 6);
    }

    #[test]
    fn run_to_json_never_panics_on_a_default_request() {
        let req = Request::default();
        let json = run_to_json(&req);
        assert!(json.contains("chartData"));
    }

    #[test]
    fn run_suite_json_has_ten_scenarios() {
        let req = Request {
            mode: Mode::Suite,
            ..Request::default()
        };
        let json = run_to_json(&req);
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 10);
    }
}
