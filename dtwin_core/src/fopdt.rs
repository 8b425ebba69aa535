//! Deviation-form first-order-plus-dead-time process block.

use std::collections::VecDeque;

use crate::error::{EngineError, Result};

/// Simulates `y(t)` for `y_ss(t) = y0 + K*(u(t-theta) - u0) + d(t)` with a
/// first-order lag `tau` at fixed step `dt`.
///
/// The delay buffer holds the last `delay_steps + 1` inputs; after `reset`
/// every slot holds `u0`, so the block starts exactly at steady state.
#[derive(Debug, Clone)]
pub struct FopdtBlock {
    gain: f64,
    tau: f64,
    dt: f64,
    y0: f64,
    u0: f64,
    delay_steps: usize,
    buf: VecDeque<f64>,
    y: f64,
}

impl FopdtBlock {
    /// `delay_steps = round(theta / dt)`.
    pub fn new(gain: f64, tau: f64, theta: f64, dt: f64, y0: f64, u0: f64) -> Result<Self> {
        if !(tau > 0.0) {
            return Err(EngineError::InvalidScenario(format!("tau must be > 0, got {tau}")).into());
        }
        if !(dt > 0.0) {
            return Err(EngineError::InvalidScenario(format!("dt must be > 0, got {dt}")).into());
        }
        if !(theta >= 0.0) {
            return Err(EngineError::InvalidScenario(format!("theta must be >= 0, got {theta}")).into());
        }
        let delay_steps = (theta / dt).round() as usize;
        let mut buf = VecDeque::with_capacity(delay_steps + 1);
        buf.resize(delay_steps + 1, u0);
        Ok(Self {
            gain,
            tau,
            dt,
            y0,
            u0,
            delay_steps,
            buf,
            y: y0,
        })
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Push `u` onto the delay queue, pop the delayed input, advance the lag,
    /// and return the new output.
    pub fn update(&mut self, u: f64, d: f64) -> f64 {
        self.buf.push_back(u);
        let u_del = self.buf.pop_front().unwrap_or(self.u0);
        let y_ss = self.y0 + self.gain * (u_del - self.u0) + d;
        self.y += (y_ss - self.y) * (self.dt / self.tau);
        self.y
    }

    /// Optionally rebind the anchor point, then refill the delay buffer with
    /// the (possibly new) `u0` and snap the output to `y0`.
    pub fn reset(&mut self, y0: Option<f64>, u0: Option<f64>) {
        if let Some(y0) = y0 {
            self.y0 = y0;
        }
        if let Some(u0) = u0 {
            self.u0 = u0;
        }
        for slot in self.buf.iter_mut() {
            *slot = self.u0;
        }
        self.y = self.y0;
    }
}
