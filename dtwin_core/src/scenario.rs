//! The immutable bundle a [`crate::scheduler::Scheduler`] consumes for one run.
//!
//! `Scenario` gathers everything spec.md §3 calls the "Scenario/Configuration"
//! bundle: simulation timing, setpoints and their ramp rates, per-loop PI
//! tuning, gate thresholds, interlock thresholds, the disturbance schedule,
//! and metric options. [`Scenario::baseline`] is the single source of the
//! domain's nominal operating point; the request layer (`dtwin_config`)
//! overrides the subset of fields §6 exposes externally.

use crate::gate::GateCfg;
use crate::plant::{MvBundle, nominal};

/// Per-loop setpoint bundle, one entry per controlled PV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setpoints {
    pub f_feed: f64,
    pub t_feed_out: f64,
    pub t_reb: f64,
    pub t_cond_out: f64,
    pub f_reflux: f64,
    pub l_v201: f64,
}

/// Maximum setpoint change per second, one entry per controlled PV. A
/// non-positive or non-finite rate means "jump to target" (spec.md §4.6 step 3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampRates {
    pub f_feed: f64,
    pub t_feed_out: f64,
    pub t_reb: f64,
    pub t_cond_out: f64,
    pub f_reflux: f64,
    pub l_v201: f64,
}

/// Which setpoint an [`SpStepEvent`] nudges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpKey {
    FFeed,
    TFeedOut,
    TReb,
    TCondOut,
    FReflux,
    LV201,
}

/// A one-time additive nudge to a base setpoint, active from `t` onward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpStepEvent {
    pub t: f64,
    pub key: SpKey,
    pub delta: f64,
}

/// `Kp`/`Ti` pair for one PI loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopTuning {
    pub kp: f64,
    pub ti: f64,
}

/// Tuning for all six loops, named as in spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tunings {
    pub fic101: LoopTuning,
    pub tic101: LoopTuning,
    pub tic102: LoopTuning,
    pub tic201: LoopTuning,
    pub fic201: LoopTuning,
    pub lic201: LoopTuning,
}

/// Disturbance-schedule fields (spec.md §3/§4.6 step 1). Amplitudes default
/// to zero so a scenario built only from the external `Request` is
/// disturbance-free except for `analyzer_fail`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisturbanceSchedule {
    pub t_feed_dist: f64,
    pub d_feed_temp_amp: f64,
    pub t_vapor_dist: f64,
    pub d_vapor_amp: f64,
    pub t_cw_degrade: f64,
    pub cw_degrade_drop: f64,
    pub analyzer_fail_enable: bool,
    pub t_analyzer_fail: f64,
}

/// Fixed interlock thresholds (spec.md §4.5). Not exposed by the external
/// `Request` — these are operated as plant safety constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterlockCfg {
    pub t_feed_hh: f64,
    pub t_reb_hh: f64,
    pub t_cond_out_hh: f64,
    pub l_v201_hh: f64,
    pub l_v201_ll: f64,
    pub u_draw_force_high: f64,
    pub u_draw_force_low: f64,
}

/// Metric-computation options (spec.md §3/§4.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricOpts {
    /// Shared normalization span `S`; `None` disables error normalization.
    pub normalize_span: Option<f64>,
    /// Settling-time tolerance band as a fraction of `|sp_final|`.
    pub settling_band: f64,
    /// Settling-time hold window, in seconds.
    pub hold_window_s: f64,
}

/// The complete immutable input to one [`crate::scheduler::Scheduler`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub sim_s: f64,
    pub dt: f64,
    pub noise: bool,
    pub seed: u64,
    pub setpoints: Setpoints,
    pub ramp_rates: RampRates,
    pub mv_init: MvBundle,
    pub tunings: Tunings,
    pub gate_cfg: GateCfg,
    pub interlock_cfg: InterlockCfg,
    pub disturbances: DisturbanceSchedule,
    pub sp_steps: Vec<SpStepEvent>,
    pub permissive_l_min: f64,
    pub permissive_l_max: f64,
    pub metric_opts: MetricOpts,
}

impl Scenario {
    /// The nominal operating point: every PV holds at its anchor, no
    /// disturbances, no SP steps. The sole source of the domain's default
    /// numeric constants; `dtwin_config::SanitizedRequest` mirrors the subset
    /// spec.md §6 exposes externally with independently-maintained defaults,
    /// matching the teacher's config/core default split.
    pub fn baseline() -> Self {
        use nominal::*;
        Self {
            sim_s: 3600.0,
            dt: 1.0,
            noise: false,
            seed: 0,
            setpoints: Setpoints {
                f_feed: F_FEED0,
                t_feed_out: T_FEED0,
                t_reb: T_REB0,
                t_cond_out: T_COND0,
                f_reflux: 50.0,
                l_v201: L0,
            },
            ramp_rates: RampRates {
                f_feed: 1.0,
                t_feed_out: 0.5,
                t_reb: 0.5,
                t_cond_out: 0.5,
                f_reflux: 1.0,
                l_v201: 1.0,
            },
            mv_init: MvBundle {
                u_feed: U_FEED0,
                u_steam_pre: U_STEAM_PRE0,
                u_steam_reb: U_STEAM_REB0,
                u_cw: U_CW0,
                u_reflux: U_REFLUX0,
                u_draw: U_DRAW0,
            },
            tunings: Tunings {
                fic101: LoopTuning { kp: 2.0, ti: 20.0 },
                tic101: LoopTuning { kp: 3.0, ti: 120.0 },
                tic102: LoopTuning { kp: 2.5, ti: 150.0 },
                tic201: LoopTuning { kp: 2.0, ti: 100.0 },
                fic201: LoopTuning { kp: 2.0, ti: 20.0 },
                lic201: LoopTuning { kp: 1.5, ti: 60.0 },
            },
            gate_cfg: GateCfg {
                tt106_on_low: 93.0,
                tt106_on_high: 97.0,
                rho15_on_low: 0.735,
                rho15_on_high: 0.745,
                dtsub_min: 5.0,
                delay_on_s: 180.0,
                delay_off_s: 60.0,
            },
            interlock_cfg: InterlockCfg {
                t_feed_hh: 140.0,
                t_reb_hh: 185.0,
                t_cond_out_hh: 46.0,
                l_v201_hh: 85.0,
                l_v201_ll: 15.0,
                u_draw_force_high: 80.0,
                u_draw_force_low: 10.0,
            },
            disturbances: DisturbanceSchedule {
                t_feed_dist: 0.0,
                d_feed_temp_amp: 0.0,
                t_vapor_dist: 0.0,
                d_vapor_amp: 0.0,
                t_cw_degrade: 0.0,
                cw_degrade_drop: 0.0,
                analyzer_fail_enable: false,
                t_analyzer_fail: 1800.0,
            },
            sp_steps: Vec::new(),
            permissive_l_min: 10.0,
            permissive_l_max: 90.0,
            metric_opts: MetricOpts {
                normalize_span: None,
                settling_band: 0.02,
                hold_window_s: 120.0,
            },
        }
    }

    /// Number of steps beyond `t=0`; the trace holds `step_count() + 1` samples.
    pub fn step_count(&self) -> usize {
        (self.sim_s / self.dt).round() as usize
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::baseline()
    }
}
