//! Fixed-order safety-interlock table (spec.md §4.5).
//!
//! A tagged-variant list rather than closure-heavy dispatch, per the design
//! notes (spec.md §9): the six rules are evaluated inline in fixed order
//! against the *current step's* PVs, never against MVs already mutated by an
//! earlier rule this step.

use crate::gate::Route;
use crate::plant::{MvBundle, PvRecord};
use crate::scenario::InterlockCfg;

/// One of the six fixed interlock rules, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleId {
    Il01FeedTempHigh,
    Il02RebTempHigh,
    Il03CondOutHigh,
    Il04LevelHigh,
    Il05LevelLow,
    Il06AnalyzerFail,
}

impl RuleId {
    pub const ALL: [RuleId; 6] = [
        RuleId::Il01FeedTempHigh,
        RuleId::Il02RebTempHigh,
        RuleId::Il03CondOutHigh,
        RuleId::Il04LevelHigh,
        RuleId::Il05LevelLow,
        RuleId::Il06AnalyzerFail,
    ];

    /// Stable short tag used in event-log messages, e.g. `INTERLOCK_ON: IL-03 ...`.
    pub fn tag(self) -> &'static str {
        match self {
            RuleId::Il01FeedTempHigh => "IL-01",
            RuleId::Il02RebTempHigh => "IL-02",
            RuleId::Il03CondOutHigh => "IL-03",
            RuleId::Il04LevelHigh => "IL-04",
            RuleId::Il05LevelLow => "IL-05",
            RuleId::Il06AnalyzerFail => "IL-06",
        }
    }

    /// Human-readable description for the event log.
    pub fn description(self) -> &'static str {
        match self {
            RuleId::Il01FeedTempHigh => "feed-out temperature high, steam preheat closed",
            RuleId::Il02RebTempHigh => "reboiler temperature high, reboiler steam closed",
            RuleId::Il03CondOutHigh => "condenser-out temperature high, forcing recycle",
            RuleId::Il04LevelHigh => "reflux-drum level high, draw forced open",
            RuleId::Il05LevelLow => "reflux-drum level low, draw forced shut",
            RuleId::Il06AnalyzerFail => "analyzer unavailable, forcing recycle",
        }
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Bitset of currently-active rules; avoids a heap allocation per step
/// (spec.md §9's "Hot-path numerics should avoid heap churn").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActiveMask(u8);

impl ActiveMask {
    pub fn contains(self, rule: RuleId) -> bool {
        self.0 & rule.bit() != 0
    }

    fn set(&mut self, rule: RuleId) {
        self.0 |= rule.bit();
    }
}

/// Result of walking the table for one step.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterlockOutcome {
    pub force_route: Option<Route>,
    pub active: ActiveMask,
}

/// Walk the fixed-order table once, mutating `mv` in place and returning the
/// active-rule set plus any forced route. Every predicate reads the PV
/// record passed in, never `mv`'s post-mutation state (spec.md §4.5's
/// evaluation policy).
pub fn evaluate(cfg: &InterlockCfg, pv: &PvRecord, mv: &mut MvBundle) -> InterlockOutcome {
    let mut out = InterlockOutcome::default();

    if pv.t_feed_out >= cfg.t_feed_hh {
        mv.u_steam_pre = 0.0;
        out.active.set(RuleId::Il01FeedTempHigh);
    }
    if pv.t_reb >= cfg.t_reb_hh {
        mv.u_steam_reb = 0.0;
        out.active.set(RuleId::Il02RebTempHigh);
    }
    if pv.t_cond_out >= cfg.t_cond_out_hh {
        out.force_route = Some(Route::Recycle);
        out.active.set(RuleId::Il03CondOutHigh);
    }
    if pv.l_v201 >= cfg.l_v201_hh {
        mv.u_draw = mv.u_draw.max(cfg.u_draw_force_high);
        out.active.set(RuleId::Il04LevelHigh);
    }
    if pv.l_v201 <= cfg.l_v201_ll {
        mv.u_draw = mv.u_draw.min(cfg.u_draw_force_low);
        out.active.set(RuleId::Il05LevelLow);
    }
    if !pv.analyzer_ok {
        out.force_route = Some(Route::Recycle);
        out.active.set(RuleId::Il06AnalyzerFail);
    }

    out
}
