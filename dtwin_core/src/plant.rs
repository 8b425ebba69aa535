//! Seven-block FOPDT network plus the algebraic couplings and reflux-drum
//! mass balance that turn six manipulated variables into the full set of
//! process variables.

use crate::error::Result;
use crate::fopdt::FopdtBlock;
use crate::rng::NoiseRng;

/// Fixed nominal operating point. MV anchors double as each loop's PI bias.
pub mod nominal {
    pub const F_FEED0: f64 = 50.0;
    pub const T_FEED0: f64 = 120.0;
    pub const T_REB0: f64 = 165.0;
    pub const T_COND0: f64 = 35.0;
    pub const TT106_0: f64 = 95.0;
    pub const RHO0: f64 = 0.7400;
    pub const L0: f64 = 50.0;
    pub const F_COND0: f64 = 70.0;

    pub const U_FEED0: f64 = 50.0;
    pub const U_STEAM_PRE0: f64 = 35.0;
    pub const U_STEAM_REB0: f64 = 40.0;
    pub const U_CW0: f64 = 45.0;
    pub const U_REFLUX0: f64 = 55.0;
    pub const U_DRAW0: f64 = 25.0;
}

/// Manipulated-variable bundle, one value per final control element.
#[derive(Debug, Clone, Copy, Default)]
pub struct MvBundle {
    pub u_feed: f64,
    pub u_steam_pre: f64,
    pub u_steam_reb: f64,
    pub u_cw: f64,
    pub u_reflux: f64,
    pub u_draw: f64,
}

impl MvBundle {
    pub fn clamp_all(&mut self) {
        self.u_feed = self.u_feed.clamp(0.0, 100.0);
        self.u_steam_pre = self.u_steam_pre.clamp(0.0, 100.0);
        self.u_steam_reb = self.u_steam_reb.clamp(0.0, 100.0);
        self.u_cw = self.u_cw.clamp(0.0, 100.0);
        self.u_reflux = self.u_reflux.clamp(0.0, 100.0);
        self.u_draw = self.u_draw.clamp(0.0, 100.0);
    }
}

/// External disturbance inputs for a single step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disturbances {
    pub d_feed_temp: f64,
    pub d_vapor_load: f64,
    pub cw_degrade: f64,
    pub analyzer_ok: bool,
}

/// Full process-variable record produced by one [`PlantModel::step`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PvRecord {
    pub f_feed: f64,
    pub t_feed_out: f64,
    pub t_reb: f64,
    pub f_reflux: f64,
    pub t_cond_out: f64,
    pub tt106: f64,
    pub tt201: f64,
    pub rho15: f64,
    pub l_v201: f64,
    pub analyzer_ok: bool,
}

/// Noise standard deviations per signal, §4.3.
struct NoiseSigma;
impl NoiseSigma {
    const FLOW: f64 = 0.45;
    const TEMP: f64 = 0.22;
    const LEVEL: f64 = 0.2;
    const DENSITY: f64 = 0.0005;
}

/// Seven FOPDT blocks, the reflux-drum inventory integrator, and the
/// algebraic couplings tying top temperature and density to reboiler and
/// reflux behavior.
#[derive(Debug, Clone)]
pub struct PlantModel {
    g_ffeed: FopdtBlock,
    g_tfeed: FopdtBlock,
    g_treb: FopdtBlock,
    g_fref: FopdtBlock,
    g_tcond: FopdtBlock,
    g_tt106: FopdtBlock,
    g_rho: FopdtBlock,
    level: f64,
    dt: f64,
    rng: Option<NoiseRng>,
}

impl PlantModel {
    pub fn new(dt: f64, noise_seed: Option<u64>) -> Result<Self> {
        use nominal::*;
        Ok(Self {
            g_ffeed: FopdtBlock::new(1.0, 8.0, 2.0, dt, F_FEED0, U_FEED0)?,
            g_tfeed: FopdtBlock::new(1.2, 180.0, 15.0, dt, T_FEED0, U_STEAM_PRE0)?,
            g_treb: FopdtBlock::new(2.5, 240.0, 20.0, dt, T_REB0, U_STEAM_REB0)?,
            g_fref: FopdtBlock::new(1.0, 10.0, 2.0, dt, 50.0, U_REFLUX0)?,
            // Negative gain: u_cw is a cooling-water throttle, so more of it
            // lowers T_cond_out. TIC201 runs reverse action against this block.
            g_tcond: FopdtBlock::new(-0.9, 120.0, 10.0, dt, T_COND0, U_CW0)?,
            g_tt106: FopdtBlock::new(1.0, 60.0, 5.0, dt, TT106_0, TT106_0)?,
            g_rho: FopdtBlock::new(1.0, 90.0, 5.0, dt, RHO0, RHO0)?,
            level: L0,
            dt,
            rng: noise_seed.map(NoiseRng::from_seed),
        })
    }

    #[inline]
    pub fn level(&self) -> f64 {
        self.level
    }

    fn noisy(&mut self, value: f64, sigma: f64) -> f64 {
        match self.rng.as_mut() {
            Some(rng) => value + rng.gaussian(0.0, sigma),
            None => value,
        }
    }

    /// Advance one step given the current MV bundle and external
    /// disturbances, returning the full PV record.
    pub fn step(&mut self, mv: &MvBundle, dist: &Disturbances) -> PvRecord {
        use nominal::*;

        let mut mv = *mv;
        mv.clamp_all();

        let f_feed = self.g_ffeed.update(mv.u_feed, 0.0);
        let t_feed_out = self.g_tfeed.update(mv.u_steam_pre, dist.d_feed_temp);
        let t_reb = self.g_treb.update(mv.u_steam_reb, dist.d_vapor_load);
        let f_reflux = self.g_fref.update(mv.u_reflux, 0.0);
        let cw_degrade = dist.cw_degrade.clamp(0.0, 1.0);
        let t_cond_out = self.g_tcond.update(mv.u_cw * (1.0 - cw_degrade), 0.0);

        let tt106_ss =
            TT106_0 + 0.35 * (t_reb - T_REB0) - 0.20 * (f_reflux - 50.0) + 0.05 * (f_feed - F_FEED0);
        let tt106 = self.g_tt106.update(tt106_ss, 0.0);

        let tt201 = tt106 + 0.20 * (t_reb - T_REB0);

        let f_cond_in =
            (F_COND0 + 0.20 * (t_reb - T_REB0) + 0.10 * (f_feed - F_FEED0)).max(0.0);
        let f_draw = 0.8 * mv.u_draw;
        self.level = (self.level + (f_cond_in - f_reflux - f_draw) * (self.dt / 200.0))
            .clamp(0.0, 100.0);

        let rho_ss = RHO0 + 0.0009 * (tt106 - TT106_0) - 0.0011 * (f_reflux - 50.0);
        let rho15 = self.g_rho.update(rho_ss, 0.0);

        let f_feed = self.noisy(f_feed, NoiseSigma::FLOW);
        let t_feed_out = self.noisy(t_feed_out, NoiseSigma::TEMP);
        let t_reb = self.noisy(t_reb, NoiseSigma::TEMP);
        let f_reflux = self.noisy(f_reflux, NoiseSigma::FLOW);
        let t_cond_out = self.noisy(t_cond_out, NoiseSigma::TEMP);
        let tt106 = self.noisy(tt106, NoiseSigma::TEMP);
        let tt201 = self.noisy(tt201, NoiseSigma::TEMP);
        let rho15 = self.noisy(rho15, NoiseSigma::DENSITY);
        let level = self.noisy(self.level, NoiseSigma::LEVEL).clamp(0.0, 100.0);

        PvRecord {
            f_feed,
            t_feed_out,
            t_reb,
            f_reflux,
            t_cond_out,
            tt106,
            tt201,
            rho15,
            l_v201: level,
            analyzer_ok: dist.analyzer_ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor_mv() -> MvBundle {
        use nominal::*;
        MvBundle {
            u_feed: U_FEED0,
            u_steam_pre: U_STEAM_PRE0,
            u_steam_reb: U_STEAM_REB0,
            u_cw: U_CW0,
            u_reflux: U_REFLUX0,
            u_draw: U_DRAW0,
        }
    }

    #[test]
    fn holding_anchor_mvs_keeps_pvs_near_nominal() {
        let mut plant = PlantModel::new(1.0, None).unwrap();
        let mv = anchor_mv();
        let dist = Disturbances {
            analyzer_ok: true,
            ..Default::default()
        };
        let mut pv = PvRecord::default();
        for _ in 0..3000 {
            pv = plant.step(&mv, &dist);
        }
        assert!((pv.t_reb - nominal::T_REB0).abs() < 0.5);
        assert!((pv.tt106 - nominal::TT106_0).abs() < 0.5);
        assert!((plant.level() - nominal::L0).abs() < 1.0);
    }

    #[test]
    fn noise_disabled_is_deterministic_across_two_runs() {
        let mv = anchor_mv();
        let dist = Disturbances {
            analyzer_ok: true,
            ..Default::default()
        };
        let mut a = PlantModel::new(1.0, None).unwrap();
        let mut b = PlantModel::new(1.0, None).unwrap();
        for _ in 0..500 {
            let pa = a.step(&mv, &dist);
            let pb = b.step(&mv, &dist);
            assert_eq!(pa.tt106, pb.tt106);
            assert_eq!(pa.rho15, pb.rho15);
        }
    }

    #[test]
    fn noise_enabled_with_same_seed_is_deterministic() {
        let mv = anchor_mv();
        let dist = Disturbances {
            analyzer_ok: true,
            ..Default::default()
        };
        let mut a = PlantModel::new(1.0, Some(11)).unwrap();
        let mut b = PlantModel::new(1.0, Some(11)).unwrap();
        for _ in 0..200 {
            let pa = a.step(&mv, &dist);
            let pb = b.step(&mv, &dist);
            assert_eq!(pa.tt106, pb.tt106);
        }
    }

    #[test]
    fn raising_steam_to_reboiler_raises_reboiler_temperature() {
        let mut plant = PlantModel::new(1.0, None).unwrap();
        let mut mv = anchor_mv();
        mv.u_steam_reb += 20.0;
        let dist = Disturbances {
            analyzer_ok: true,
            ..Default::default()
        };
        let mut pv = PvRecord::default();
        for _ in 0..3000 {
            pv = plant.step(&mv, &dist);
        }
        assert!(pv.t_reb > nominal::T_REB0);
    }

    #[test]
    fn cw_degradation_raises_condenser_outlet_temperature() {
        let mut plant = PlantModel::new(1.0, None).unwrap();
        let mv = anchor_mv();
        let dist = Disturbances {
            analyzer_ok: true,
            cw_degrade: 0.25,
            ..Default::default()
        };
        let mut pv = PvRecord::default();
        for _ in 0..2000 {
            pv = plant.step(&mv, &dist);
        }
        assert!(pv.t_cond_out > nominal::T_COND0);
    }

    #[test]
    fn level_stays_within_bounds_under_draw_starvation() {
        let mut plant = PlantModel::new(1.0, None).unwrap();
        let mut mv = anchor_mv();
        mv.u_draw = 0.0;
        let dist = Disturbances {
            analyzer_ok: true,
            ..Default::default()
        };
        for _ in 0..5000 {
            plant.step(&mv, &dist);
            assert!((0.0..=100.0).contains(&plant.level()));
        }
    }
}
