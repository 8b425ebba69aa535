//! Per-loop performance metrics and gate statistics over a completed trace
//! (spec.md §4.7).

use crate::gate::Route;
use crate::scenario::MetricOpts;
use crate::trace::Trace;

/// Settling-time outcome: a loop can settle at a concrete time, have no
/// meaningful SP change to settle from, or never settle within the run.
/// Both of the latter two serialize as JSON `null` at the response boundary
/// (spec.md §7), but keeping them distinct here lets tests and library
/// consumers tell them apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettlingTime {
    At(f64),
    NotDefined,
    NotSettled,
}

impl SettlingTime {
    pub fn as_option(self) -> Option<f64> {
        match self {
            SettlingTime::At(t) => Some(t),
            SettlingTime::NotDefined | SettlingTime::NotSettled => None,
        }
    }
}

/// One loop's IAE/ITAE/overshoot/settling-time (spec.md §4.7).
#[derive(Debug, Clone, PartialEq)]
pub struct LoopMetrics {
    pub name: String,
    pub iae: f64,
    pub itae: f64,
    pub overshoot_pct: Option<f64>,
    pub settling_time: SettlingTime,
}

/// Gate routing statistics over a complete trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateStats {
    pub product_pct: f64,
    pub switches: usize,
}

/// `IAE = Σ|e_i|·dt`, `ITAE = Σ t_i·|e_i|·dt`, with `e_i = sp_i − pv_i`,
/// optionally divided by a shared normalization span. `dt` is taken uniformly
/// from `t[1] - t[0]`.
fn iae_itae(t: &[f64], sp: &[f64], pv: &[f64], span: Option<f64>) -> (f64, f64) {
    debug_assert!(t.len() >= 2);
    let dt = t[1] - t[0];
    let mut iae = 0.0;
    let mut itae = 0.0;
    for i in 0..t.len() {
        let mut e = sp[i] - pv[i];
        if let Some(s) = span {
            e /= s;
        }
        let ae = e.abs();
        iae += ae * dt;
        itae += t[i] * ae * dt;
    }
    (iae, itae)
}

fn overshoot_pct(sp: &[f64], pv: &[f64]) -> Option<f64> {
    let sp_final = *sp.last().expect("non-empty trace");
    if sp_final.abs() < 1e-9 {
        return None;
    }
    let max_pv = pv.iter().copied().fold(f64::MIN, f64::max);
    Some(((max_pv - sp_final) / sp_final.abs() * 100.0).max(0.0))
}

fn settling_time(t: &[f64], sp: &[f64], pv: &[f64], opts: &MetricOpts) -> SettlingTime {
    let sp0 = sp[0];
    let sp_final = *sp.last().expect("non-empty trace");
    if (sp_final - sp0).abs() <= (1e-6_f64).max(0.001 * sp0.abs().max(1.0)) {
        return SettlingTime::NotDefined;
    }

    let tol = (sp_final.abs() * opts.settling_band).max(1e-6);
    let dt = t[1] - t[0];
    let hold_steps = ((opts.hold_window_s / dt).round() as usize).max(1);

    let Some(start) = pv.iter().position(|&p| (p - sp_final).abs() > tol) else {
        // PV never left the band around the final SP: settled immediately.
        return SettlingTime::At(t[0]);
    };

    for i in start..pv.len() {
        if i + hold_steps > pv.len() {
            break;
        }
        let window_ok = pv[i..i + hold_steps].iter().all(|&p| (p - sp_final).abs() <= tol);
        if window_ok {
            return SettlingTime::At(t[i]);
        }
    }
    SettlingTime::NotSettled
}

/// Compute one loop's metrics from its `(t, sp, pv)` columns.
pub fn loop_metrics(name: &str, t: &[f64], sp: &[f64], pv: &[f64], opts: &MetricOpts) -> LoopMetrics {
    let (iae, itae) = iae_itae(t, sp, pv, opts.normalize_span);
    LoopMetrics {
        name: name.to_string(),
        iae,
        itae,
        overshoot_pct: overshoot_pct(sp, pv),
        settling_time: settling_time(t, sp, pv, opts),
    }
}

/// Compute metrics for all six named loops over a trace.
pub fn compute_all(trace: &Trace, opts: &MetricOpts) -> Vec<LoopMetrics> {
    vec![
        loop_metrics("FIC-101", &trace.t, &trace.sp_f_feed, &trace.f_feed, opts),
        loop_metrics("TIC-101", &trace.t, &trace.sp_t_feed_out, &trace.t_feed_out, opts),
        loop_metrics("TIC-102", &trace.t, &trace.sp_t_reb, &trace.t_reb, opts),
        loop_metrics("TIC-201", &trace.t, &trace.sp_t_cond_out, &trace.t_cond_out, opts),
        loop_metrics("FIC-201", &trace.t, &trace.sp_f_reflux, &trace.f_reflux, opts),
        loop_metrics("LIC-201", &trace.t, &trace.sp_l_v201, &trace.l_v201, opts),
    ]
}

/// `productPct = 100·count(PRODUCT)/N`, `switches = count(i>0 where route[i] != route[i-1])`.
pub fn gate_stats(route: &[Route]) -> GateStats {
    let n = route.len();
    if n == 0 {
        return GateStats { product_pct: 0.0, switches: 0 };
    }
    let product_count = route.iter().filter(|&&r| r == Route::Product).count();
    let switches = route.windows(2).filter(|w| w[0] != w[1]).count();
    GateStats {
        product_pct: 100.0 * product_count as f64 / n as f64,
        switches,
    }
}
