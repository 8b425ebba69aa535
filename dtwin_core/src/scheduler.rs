//! Fixed-step scheduler coupling the plant, six PI controllers, the quality
//! gate, and the interlock table (spec.md §4.6).
//!
//! Ordering within a step is fixed and must not be reordered: disturbance/SP/
//! ramp → PV sample → controller update → interlock override → controller
//! re-tracking → gate override → log (spec.md §5). This is what keeps
//! bumpless transfer intact across an interlock override.

use crate::error::{EngineError, Result};
use crate::gate::{QualityGate, Route};
use crate::interlock::{self, ActiveMask, RuleId};
use crate::pi::{Action, PiController};
use crate::plant::{Disturbances, MvBundle, PlantModel};
use crate::scenario::{Scenario, SpKey, Setpoints};
use crate::trace::{EventRecord, StepRecord, Trace};

/// Re-tracking tolerance: an MV must move by more than this for the scheduler
/// to consider it "altered by an interlock" (spec.md §4.6 step 9).
const RETRACK_EPS: f64 = 1e-6;

/// Owns one run's [`PlantModel`], six [`PiController`]s, one [`QualityGate`],
/// and the scenario's interlock thresholds; drives them through exactly one
/// [`Scenario`].
pub struct Scheduler {
    scenario: Scenario,
    plant: PlantModel,
    fic101: PiController,
    tic101: PiController,
    tic102: PiController,
    tic201: PiController,
    fic201: PiController,
    lic201: PiController,
    gate: QualityGate,
    ramped_sp: Setpoints,
    route_prev: Route,
    active_prev: ActiveMask,
    init_done: bool,
}

/// Back-calculation anti-windup gain shared by every loop; only the
/// saturation limits and action sign vary by loop (spec.md §4.2).
const AW: f64 = 0.6;
const OUT_MIN: f64 = 0.0;
const OUT_MAX: f64 = 100.0;

impl Scheduler {
    pub fn new(scenario: Scenario) -> Result<Self> {
        let dt = scenario.dt;
        let t = scenario.tunings;
        let mv0 = scenario.mv_init;

        let mut fic101 = PiController::new(
            t.fic101.kp, t.fic101.ti, dt, OUT_MIN, OUT_MAX, mv0.u_feed, AW, Action::Direct,
        )?;
        let mut tic101 = PiController::new(
            t.tic101.kp,
            t.tic101.ti,
            dt,
            OUT_MIN,
            OUT_MAX,
            mv0.u_steam_pre,
            AW,
            Action::Direct,
        )?;
        let mut tic102 = PiController::new(
            t.tic102.kp,
            t.tic102.ti,
            dt,
            OUT_MIN,
            OUT_MAX,
            mv0.u_steam_reb,
            AW,
            Action::Direct,
        )?;
        let mut tic201 = PiController::new(
            t.tic201.kp, t.tic201.ti, dt, OUT_MIN, OUT_MAX, mv0.u_cw, AW, Action::Reverse,
        )?;
        let mut fic201 = PiController::new(
            t.fic201.kp,
            t.fic201.ti,
            dt,
            OUT_MIN,
            OUT_MAX,
            mv0.u_reflux,
            AW,
            Action::Direct,
        )?;
        let mut lic201 = PiController::new(
            t.lic201.kp, t.lic201.ti, dt, OUT_MIN, OUT_MAX, mv0.u_draw, AW, Action::Reverse,
        )?;

        // Reset pins each controller's u_prev to the scenario's MV-init
        // anchor, per spec.md §4.6's initialization step; construction
        // above already does this via `bias`, reset makes it explicit and
        // resilient to a future bias/anchor split.
        fic101.reset(Some(mv0.u_feed));
        tic101.reset(Some(mv0.u_steam_pre));
        tic102.reset(Some(mv0.u_steam_reb));
        tic201.reset(Some(mv0.u_cw));
        fic201.reset(Some(mv0.u_reflux));
        lic201.reset(Some(mv0.u_draw));

        let plant = PlantModel::new(dt, scenario.noise.then_some(scenario.seed))?;
        let gate = QualityGate::new(scenario.gate_cfg);
        let ramped_sp = scenario.setpoints;

        Ok(Self {
            scenario,
            plant,
            fic101,
            tic101,
            tic102,
            tic201,
            fic201,
            lic201,
            gate,
            ramped_sp,
            route_prev: Route::Recycle,
            active_prev: ActiveMask::default(),
            init_done: false,
        })
    }

    /// Run the scenario to completion and return the full trace.
    ///
    /// Fails only on a numeric blow-up (a PV going non-finite mid-run) —
    /// this cannot happen via the sanitized request path, but guards
    /// library callers who hand-build a [`Scenario`] with, say, a `dt` too
    /// large for its loops' tunings to stay stable (spec.md §7's "Engine
    /// exceptions").
    pub fn run(mut self) -> Result<Trace> {
        let n_steps = self.scenario.step_count();
        tracing::info!(sim_s = self.scenario.sim_s, dt = self.scenario.dt, n_steps, "scheduler run start");
        let mut trace = Trace::with_capacity(n_steps);
        let mut mv = self.scenario.mv_init;

        for i in 0..=n_steps {
            let ti = i as f64 * self.scenario.dt;

            let dist = self.step_disturbances(ti);

            let mut target = self.scenario.setpoints;
            for step in &self.scenario.sp_steps {
                if ti >= step.t {
                    apply_delta(&mut target, step.key, step.delta);
                }
            }
            ramp_towards(&mut self.ramped_sp, &target, &self.scenario.ramp_rates, self.scenario.dt);

            let pv = self.plant.step(&mv, &dist);
            let dtsub = pv.tt201 - pv.t_cond_out;
            check_finite(pv.tt106, "TT106", i)?;
            check_finite(pv.rho15, "rho15", i)?;
            check_finite(pv.l_v201, "L_v201", i)?;
            check_finite(dtsub, "dTsub", i)?;

            if !self.init_done {
                self.fic101.track(mv.u_feed, self.ramped_sp.f_feed, pv.f_feed);
                self.tic101
                    .track(mv.u_steam_pre, self.ramped_sp.t_feed_out, pv.t_feed_out);
                self.tic102
                    .track(mv.u_steam_reb, self.ramped_sp.t_reb, pv.t_reb);
                self.tic201
                    .track(mv.u_cw, self.ramped_sp.t_cond_out, pv.t_cond_out);
                self.fic201
                    .track(mv.u_reflux, self.ramped_sp.f_reflux, pv.f_reflux);
                self.lic201
                    .track(mv.u_draw, self.ramped_sp.l_v201, pv.l_v201);
                self.init_done = true;
            }

            let mut mv_new = MvBundle {
                u_feed: self.fic101.update(self.ramped_sp.f_feed, pv.f_feed),
                u_steam_pre: self.tic101.update(self.ramped_sp.t_feed_out, pv.t_feed_out),
                u_steam_reb: self.tic102.update(self.ramped_sp.t_reb, pv.t_reb),
                u_cw: self.tic201.update(self.ramped_sp.t_cond_out, pv.t_cond_out),
                u_reflux: self.fic201.update(self.ramped_sp.f_reflux, pv.f_reflux),
                u_draw: self.lic201.update(self.ramped_sp.l_v201, pv.l_v201),
            };
            let pre_interlock = mv_new;

            let permissive_ok =
                self.scenario.permissive_l_min < pv.l_v201 && pv.l_v201 < self.scenario.permissive_l_max;
            let mut route = self.gate.update(
                self.scenario.dt,
                pv.tt106,
                pv.rho15,
                dtsub,
                pv.analyzer_ok,
                permissive_ok,
            );

            let outcome = interlock::evaluate(&self.scenario.interlock_cfg, &pv, &mut mv_new);

            if (mv_new.u_feed - pre_interlock.u_feed).abs() > RETRACK_EPS {
                self.fic101.track(mv_new.u_feed, self.ramped_sp.f_feed, pv.f_feed);
            }
            if (mv_new.u_steam_pre - pre_interlock.u_steam_pre).abs() > RETRACK_EPS {
                self.tic101
                    .track(mv_new.u_steam_pre, self.ramped_sp.t_feed_out, pv.t_feed_out);
            }
            if (mv_new.u_steam_reb - pre_interlock.u_steam_reb).abs() > RETRACK_EPS {
                self.tic102
                    .track(mv_new.u_steam_reb, self.ramped_sp.t_reb, pv.t_reb);
            }
            if (mv_new.u_cw - pre_interlock.u_cw).abs() > RETRACK_EPS {
                self.tic201
                    .track(mv_new.u_cw, self.ramped_sp.t_cond_out, pv.t_cond_out);
            }
            if (mv_new.u_reflux - pre_interlock.u_reflux).abs() > RETRACK_EPS {
                self.fic201
                    .track(mv_new.u_reflux, self.ramped_sp.f_reflux, pv.f_reflux);
            }
            if (mv_new.u_draw - pre_interlock.u_draw).abs() > RETRACK_EPS {
                self.lic201
                    .track(mv_new.u_draw, self.ramped_sp.l_v201, pv.l_v201);
            }

            if let Some(forced) = outcome.force_route {
                self.gate.force(forced);
                route = forced;
            }

            self.emit_events(&mut trace, ti, route, outcome.active);
            self.route_prev = route;
            self.active_prev = outcome.active;

            trace.push_step(StepRecord {
                t: ti,
                f_feed: pv.f_feed,
                sp_f_feed: self.ramped_sp.f_feed,
                t_feed_out: pv.t_feed_out,
                sp_t_feed_out: self.ramped_sp.t_feed_out,
                t_reb: pv.t_reb,
                sp_t_reb: self.ramped_sp.t_reb,
                t_cond_out: pv.t_cond_out,
                sp_t_cond_out: self.ramped_sp.t_cond_out,
                tt106: pv.tt106,
                tt201: pv.tt201,
                rho15: pv.rho15,
                f_reflux: pv.f_reflux,
                sp_f_reflux: self.ramped_sp.f_reflux,
                l_v201: pv.l_v201,
                sp_l_v201: self.ramped_sp.l_v201,
                dtsub,
                route,
                analyzer_ok: pv.analyzer_ok,
                u_feed: mv_new.u_feed,
                u_steam_pre: mv_new.u_steam_pre,
                u_steam_reb: mv_new.u_steam_reb,
                u_cw: mv_new.u_cw,
                u_reflux: mv_new.u_reflux,
                u_draw: mv_new.u_draw,
            });

            mv = mv_new;
        }

        tracing::info!(
            steps = trace.len(),
            events = trace.events.len(),
            "scheduler run complete"
        );
        Ok(trace)
    }

    fn step_disturbances(&self, ti: f64) -> Disturbances {
        let d = &self.scenario.disturbances;
        let d_feed_temp = if ti >= d.t_feed_dist { d.d_feed_temp_amp } else { 0.0 };
        let d_vapor_load = if ti >= d.t_vapor_dist { d.d_vapor_amp } else { 0.0 };
        let cw_degrade = if ti >= d.t_cw_degrade { d.cw_degrade_drop } else { 0.0 }.clamp(0.0, 1.0);
        let analyzer_ok = !d.analyzer_fail_enable || ti < d.t_analyzer_fail;
        Disturbances {
            d_feed_temp,
            d_vapor_load,
            cw_degrade,
            analyzer_ok,
        }
    }

    fn emit_events(&self, trace: &mut Trace, ti: f64, route: Route, active: ActiveMask) {
        if route != self.route_prev {
            let msg = format!("GATE_SWITCH: {:?} -> {:?}", self.route_prev, route);
            tracing::info!(t = ti, from = ?self.route_prev, to = ?route, "gate switch");
            trace.events.push(EventRecord { t: ti, msg });
        }
        for rule in RuleId::ALL {
            let was = self.active_prev.contains(rule);
            let now = active.contains(rule);
            if now && !was {
                tracing::warn!(t = ti, rule = rule.tag(), "interlock activated: {}", rule.description());
                trace.events.push(EventRecord {
                    t: ti,
                    msg: format!("INTERLOCK_ON: {} {}", rule.tag(), rule.description()),
                });
            } else if was && !now {
                tracing::info!(t = ti, rule = rule.tag(), "interlock cleared");
                trace.events.push(EventRecord {
                    t: ti,
                    msg: format!("INTERLOCK_OFF: {} {}", rule.tag(), rule.description()),
                });
            }
        }
    }
}

#[inline]
fn check_finite(value: f64, field: &'static str, step: usize) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::NonFiniteState { field, step }.into())
    }
}

fn apply_delta(target: &mut Setpoints, key: SpKey, delta: f64) {
    match key {
        SpKey::FFeed => target.f_feed += delta,
        SpKey::TFeedOut => target.t_feed_out += delta,
        SpKey::TReb => target.t_reb += delta,
        SpKey::TCondOut => target.t_cond_out += delta,
        SpKey::FReflux => target.f_reflux += delta,
        SpKey::LV201 => target.l_v201 += delta,
    }
}

fn ramp_towards(
    current: &mut Setpoints,
    target: &Setpoints,
    rates: &crate::scenario::RampRates,
    dt: f64,
) {
    ramp_one(&mut current.f_feed, target.f_feed, rates.f_feed, dt);
    ramp_one(&mut current.t_feed_out, target.t_feed_out, rates.t_feed_out, dt);
    ramp_one(&mut current.t_reb, target.t_reb, rates.t_reb, dt);
    ramp_one(&mut current.t_cond_out, target.t_cond_out, rates.t_cond_out, dt);
    ramp_one(&mut current.f_reflux, target.f_reflux, rates.f_reflux, dt);
    ramp_one(&mut current.l_v201, target.l_v201, rates.l_v201, dt);
}

fn ramp_one(cur: &mut f64, target: f64, rate: f64, dt: f64) {
    if !(rate > 0.0) || !rate.is_finite() {
        *cur = target;
        return;
    }
    let max_delta = rate * dt;
    let diff = target - *cur;
    if diff.abs() <= max_delta {
        *cur = target;
    } else {
        *cur += max_delta * diff.signum();
    }
}
