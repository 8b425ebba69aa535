//! Proportional-integral controller with back-calculation anti-windup and
//! bumpless re-tracking.

use crate::error::{EngineError, Result};

/// Error sign convention: `Direct` is `e = SP - PV` (increasing output drives
/// PV up); `Reverse` is `e = PV - SP` (increasing output drives PV down).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Direct,
    Reverse,
}

#[derive(Debug, Clone)]
pub struct PiController {
    kp: f64,
    ti: f64,
    dt: f64,
    out_min: f64,
    out_max: f64,
    bias: f64,
    aw: f64,
    action: Action,
    integral: f64,
    u_prev: f64,
}

impl PiController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kp: f64,
        ti: f64,
        dt: f64,
        out_min: f64,
        out_max: f64,
        bias: f64,
        aw: f64,
        action: Action,
    ) -> Result<Self> {
        if !(ti > 0.0) {
            return Err(EngineError::InvalidScenario(format!("Ti must be > 0, got {ti}")).into());
        }
        if !(dt > 0.0) {
            return Err(EngineError::InvalidScenario(format!("dt must be > 0, got {dt}")).into());
        }
        if !(out_min < out_max) {
            return Err(EngineError::InvalidScenario(format!(
                "out_min must be < out_max, got out_min={out_min} out_max={out_max}"
            ))
            .into());
        }
        Ok(Self {
            kp,
            ti,
            dt,
            out_min,
            out_max,
            bias,
            aw: aw.clamp(0.0, 1.0),
            action,
            integral: 0.0,
            u_prev: bias.clamp(out_min, out_max),
        })
    }

    #[inline]
    pub fn u_prev(&self) -> f64 {
        self.u_prev
    }

    #[inline]
    fn error(&self, sp: f64, pv: f64) -> f64 {
        match self.action {
            Action::Direct => sp - pv,
            Action::Reverse => pv - sp,
        }
    }

    /// Advance the controller one step and return the saturated command.
    pub fn update(&mut self, sp: f64, pv: f64) -> f64 {
        let e = self.error(sp, pv);
        self.integral += (self.dt / self.ti) * e;
        let u_unsat = self.bias + self.kp * (e + self.integral);
        let u = u_unsat.clamp(self.out_min, self.out_max);
        self.integral += self.aw * (u - u_unsat);
        self.u_prev = u;
        u
    }

    /// Bumpless re-initialization: re-solve the integrator so that a
    /// subsequent `update(sp, pv)` with the same error reproduces `u_actual`
    /// (up to the integrator's own one-step drift).
    pub fn track(&mut self, u_actual: f64, sp: f64, pv: f64) {
        let u = u_actual.clamp(self.out_min, self.out_max);
        let e = self.error(sp, pv);
        self.integral = if self.kp.abs() < 1e-9 {
            0.0
        } else {
            (u - self.bias) / self.kp - e
        };
        self.u_prev = u;
    }

    /// Reset the integrator and clamp `u0` (or the bias) into range.
    pub fn reset(&mut self, u0: Option<f64>) {
        self.integral = 0.0;
        self.u_prev = u0.unwrap_or(self.bias).clamp(self.out_min, self.out_max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl(action: Action) -> PiController {
        PiController::new(2.0, 10.0, 1.0, 0.0, 100.0, 50.0, 0.5, action).unwrap()
    }

    #[test]
    fn output_stays_within_saturation_limits() {
        let mut c = ctrl(Action::Direct);
        for _ in 0..10_000 {
            let u = c.update(1000.0, 0.0);
            assert!((0.0..=100.0).contains(&u));
        }
    }

    #[test]
    fn direct_action_error_sign() {
        let mut c = ctrl(Action::Direct);
        let u_high_pv = c.update(50.0, 60.0);
        let mut c2 = ctrl(Action::Direct);
        let u_low_pv = c2.update(50.0, 40.0);
        assert!(u_low_pv > u_high_pv, "direct action should raise output when PV is below SP");
    }

    #[test]
    fn reverse_action_error_sign() {
        let mut c = ctrl(Action::Reverse);
        let u_high_pv = c.update(50.0, 60.0);
        let mut c2 = ctrl(Action::Reverse);
        let u_low_pv = c2.update(50.0, 40.0);
        assert!(u_high_pv > u_low_pv, "reverse action should raise output when PV is above SP");
    }

    #[test]
    fn track_then_update_reproduces_command_when_error_is_zero() {
        let mut c = ctrl(Action::Direct);
        c.track(73.0, 50.0, 50.0);
        let u = c.update(50.0, 50.0);
        assert!((u - 73.0).abs() < 1e-9, "u={u}");
    }

    #[test]
    fn track_then_update_drifts_by_one_step_integral_when_error_nonzero() {
        let mut c = ctrl(Action::Direct);
        c.track(73.0, 50.0, 45.0);
        let u = c.update(50.0, 45.0);
        // e = 5; one-step integral contribution is Kp*(dt/Ti)*e = 2*0.1*5 = 1.0
        assert!((u - 74.0).abs() < 1e-9, "u={u}");
    }

    #[test]
    fn reset_clamps_initial_output_and_clears_integral() {
        let mut c = ctrl(Action::Direct);
        c.update(90.0, 0.0);
        c.reset(Some(150.0));
        assert_eq!(c.u_prev(), 100.0);
        // Integrator cleared: next update should match a fresh controller.
        let mut fresh = ctrl(Action::Direct);
        fresh.u_prev = 100.0;
        assert_eq!(c.update(50.0, 50.0), fresh.update(50.0, 50.0));
    }

    #[test]
    fn anti_windup_prevents_unbounded_integral_growth() {
        let mut c = ctrl(Action::Direct);
        for _ in 0..5_000 {
            c.update(1_000_000.0, 0.0);
        }
        // Output remains saturated, not diverging, and a reasonable setpoint
        // change should recover promptly rather than staying pinned for a
        // long unwind.
        let mut recovered = false;
        for _ in 0..50 {
            let u = c.update(0.0, 0.0);
            if u < 100.0 {
                recovered = true;
                break;
            }
        }
        assert!(recovered, "anti-windup should let the controller unwind");
    }
}
