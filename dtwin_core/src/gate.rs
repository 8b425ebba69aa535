//! Two-state hysteretic product/recycle routing gate.

/// Routing decision: RECYCLE returns material to the feed, PRODUCT draws it
/// off as finished product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Recycle,
    Product,
}

/// ON thresholds plus dwell timers. OFF thresholds are derived by widening
/// the ON band (§4.4): TT106 by ±2, rho15 by ±0.005, dTsub by −1.
#[derive(Debug, Clone, Copy)]
pub struct GateCfg {
    pub tt106_on_low: f64,
    pub tt106_on_high: f64,
    pub rho15_on_low: f64,
    pub rho15_on_high: f64,
    pub dtsub_min: f64,
    pub delay_on_s: f64,
    pub delay_off_s: f64,
}

impl GateCfg {
    #[inline]
    fn tt106_off_low(&self) -> f64 {
        self.tt106_on_low - 2.0
    }
    #[inline]
    fn tt106_off_high(&self) -> f64 {
        self.tt106_on_high + 2.0
    }
    #[inline]
    fn rho15_off_low(&self) -> f64 {
        self.rho15_on_low - 0.005
    }
    #[inline]
    fn rho15_off_high(&self) -> f64 {
        self.rho15_on_high + 0.005
    }
    #[inline]
    fn dtsub_min_off(&self) -> f64 {
        self.dtsub_min - 1.0
    }
}

/// Two-state hysteretic gate with on/off dwell timers. Starts in RECYCLE
/// with both timers at zero.
#[derive(Debug, Clone)]
pub struct QualityGate {
    cfg: GateCfg,
    route: Route,
    on_timer: f64,
    off_timer: f64,
}

impl QualityGate {
    pub fn new(cfg: GateCfg) -> Self {
        Self {
            cfg,
            route: Route::Recycle,
            on_timer: 0.0,
            off_timer: 0.0,
        }
    }

    #[inline]
    pub fn route(&self) -> Route {
        self.route
    }

    /// Advance one step and return the (provisional, pre-interlock) route.
    pub fn update(
        &mut self,
        dt: f64,
        tt106: f64,
        rho15: f64,
        dtsub: f64,
        analyzer_ok: bool,
        permissive_ok: bool,
    ) -> Route {
        if !analyzer_ok || !permissive_ok {
            self.route = Route::Recycle;
            self.on_timer = 0.0;
            self.off_timer = 0.0;
            return self.route;
        }

        let on_ok = (self.cfg.tt106_on_low..=self.cfg.tt106_on_high).contains(&tt106)
            && (self.cfg.rho15_on_low..=self.cfg.rho15_on_high).contains(&rho15)
            && dtsub >= self.cfg.dtsub_min;
        let off_bad = !(self.cfg.tt106_off_low()..=self.cfg.tt106_off_high()).contains(&tt106)
            || !(self.cfg.rho15_off_low()..=self.cfg.rho15_off_high()).contains(&rho15)
            || dtsub < self.cfg.dtsub_min_off();

        match self.route {
            Route::Recycle => {
                self.on_timer = if on_ok { self.on_timer + dt } else { 0.0 };
                if self.on_timer >= self.cfg.delay_on_s {
                    self.route = Route::Product;
                    self.on_timer = 0.0;
                    self.off_timer = 0.0;
                }
            }
            Route::Product => {
                self.off_timer = if off_bad { self.off_timer + dt } else { 0.0 };
                if self.off_timer >= self.cfg.delay_off_s {
                    self.route = Route::Recycle;
                    self.on_timer = 0.0;
                    self.off_timer = 0.0;
                }
            }
        }

        self.route
    }

    /// Force the route (from an interlock override) without touching the
    /// on/off-ok computation; timers still reset as on any transition.
    pub fn force(&mut self, route: Route) {
        if route != self.route {
            self.on_timer = 0.0;
            self.off_timer = 0.0;
        }
        self.route = route;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> GateCfg {
        GateCfg {
            tt106_on_low: 93.0,
            tt106_on_high: 97.0,
            rho15_on_low: 0.735,
            rho15_on_high: 0.745,
            dtsub_min: 5.0,
            delay_on_s: 60.0,
            delay_off_s: 30.0,
        }
    }

    #[test]
    fn starts_in_recycle() {
        let gate = QualityGate::new(cfg());
        assert_eq!(gate.route(), Route::Recycle);
    }

    #[test]
    fn promotes_to_product_after_delay_on_of_continuous_on_ok() {
        let mut gate = QualityGate::new(cfg());
        for _ in 0..59 {
            assert_eq!(gate.update(1.0, 95.0, 0.740, 6.0, true, true), Route::Recycle);
        }
        assert_eq!(gate.update(1.0, 95.0, 0.740, 6.0, true, true), Route::Product);
    }

    #[test]
    fn on_timer_resets_on_any_non_ok_sample() {
        let mut gate = QualityGate::new(cfg());
        for _ in 0..59 {
            gate.update(1.0, 95.0, 0.740, 6.0, true, true);
        }
        // One bad sample right before the threshold resets the timer.
        gate.update(1.0, 200.0, 0.740, 6.0, true, true);
        for _ in 0..59 {
            assert_eq!(gate.update(1.0, 95.0, 0.740, 6.0, true, true), Route::Recycle);
        }
    }

    #[test]
    fn demotes_to_recycle_after_delay_off_of_continuous_off_bad() {
        let mut gate = QualityGate::new(cfg());
        for _ in 0..60 {
            gate.update(1.0, 95.0, 0.740, 6.0, true, true);
        }
        assert_eq!(gate.route(), Route::Product);
        for _ in 0..29 {
            assert_eq!(gate.update(1.0, 200.0, 0.740, 6.0, true, true), Route::Product);
        }
        assert_eq!(gate.update(1.0, 200.0, 0.740, 6.0, true, true), Route::Recycle);
    }

    #[test]
    fn analyzer_failure_forces_recycle_and_zeros_timers() {
        let mut gate = QualityGate::new(cfg());
        for _ in 0..60 {
            gate.update(1.0, 95.0, 0.740, 6.0, true, true);
        }
        assert_eq!(gate.route(), Route::Product);
        assert_eq!(gate.update(1.0, 95.0, 0.740, 6.0, false, true), Route::Recycle);
        // Must re-accumulate delay_on_s from zero to re-promote.
        for _ in 0..59 {
            assert_eq!(gate.update(1.0, 95.0, 0.740, 6.0, true, true), Route::Recycle);
        }
    }

    #[test]
    fn permissive_violation_forces_recycle() {
        let mut gate = QualityGate::new(cfg());
        for _ in 0..60 {
            gate.update(1.0, 95.0, 0.740, 6.0, true, true);
        }
        assert_eq!(gate.update(1.0, 95.0, 0.740, 6.0, true, false), Route::Recycle);
    }

    #[test]
    fn hysteresis_band_tolerates_mild_excursions_while_in_product() {
        let mut gate = QualityGate::new(cfg());
        for _ in 0..60 {
            gate.update(1.0, 95.0, 0.740, 6.0, true, true);
        }
        // Outside the ON band but inside the wider OFF band: should hold PRODUCT.
        for _ in 0..100 {
            assert_eq!(gate.update(1.0, 98.5, 0.740, 6.0, true, true), Route::Product);
        }
    }

    #[test]
    fn force_resets_timers_on_transition() {
        let mut gate = QualityGate::new(cfg());
        for _ in 0..60 {
            gate.update(1.0, 95.0, 0.740, 6.0, true, true);
        }
        gate.force(Route::Recycle);
        assert_eq!(gate.route(), Route::Recycle);
        for _ in 0..59 {
            assert_eq!(gate.update(1.0, 95.0, 0.740, 6.0, true, true), Route::Recycle);
        }
        assert_eq!(gate.update(1.0, 95.0, 0.740, 6.0, true, true), Route::Product);
    }
}
