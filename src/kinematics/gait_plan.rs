//! Slot tables for the supported gaits.
//!
//! A plan is a sequence of slots. Each slot tells every leg what to do
//! ([`LegPhase`]); the engine starts the next slot only once every leg has finished
//! the current one, so the number of legs in the air never exceeds what a single
//! slot lists.
use core::f32::consts::{PI, TAU};
use core::fmt::Display;

use micromath::F32Ext;

use crate::robot::leg::LegMount;
use crate::LEG_COUNT;

/// No plan ever lifts more than this many legs at once.
pub const MAX_SWINGING: usize = 2;

/// Crawl swing order, by mount index (front left, front right, back left, back right).
pub const CRAWL_ORDER: [usize; LEG_COUNT] = [0, 2, 1, 3];

/// Tripod group per mount index: diagonal pairs move together.
pub const TRIPOD_GROUPS: [u8; LEG_COUNT] = [0, 1, 1, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaitKind {
    /// Each leg in turn swings forward then pushes back on its own
    Walk,
    /// One leg swings per slot while the others push back by a fraction of a stride
    Wave,
    /// Round-robin swing, the previous leg returns while the next one swings
    Crawl,
    /// Diagonal pairs alternate
    Tripod,
    /// Every leg settles on the neutral foot position
    Stand,
}

impl Display for GaitKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            GaitKind::Walk => "walk",
            GaitKind::Wave => "wave",
            GaitKind::Crawl => "crawl",
            GaitKind::Tripod => "tripod",
            GaitKind::Stand => "stand",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LegPhase {
    #[default]
    Hold,
    /// Lift and move the foot one stride forward
    Swing,
    /// Push the foot back along the ground by `stroke` strides
    Stance { stroke: f32 },
    /// Move straight to the neutral pose
    Settle,
}

pub type Slot = [LegPhase; LEG_COUNT];

/// Phase offset of leg `position` in a wave cycle, in radians.
pub fn phase_offset(position: usize) -> f32 {
    2.0 * PI * position as f32 / LEG_COUNT as f32
}

/// Wave slot in which leg `position` swings: its phase offset as a fraction of the cycle.
pub fn wave_swing_slot(position: usize) -> usize {
    (phase_offset(position) / TAU * LEG_COUNT as f32).round() as usize % LEG_COUNT
}

/// Stance share of a wave slot: a full stride spread over the slots a leg spends on the ground.
pub fn wave_stroke() -> f32 {
    1.0 / (LEG_COUNT - 1) as f32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaitPlan {
    kind: GaitKind,
    cycles: u8,
    // crawl swing order as leg array positions
    order: [usize; LEG_COUNT],
    groups: [u8; LEG_COUNT],
}

impl GaitPlan {
    /// Plan for legs laid out as `mounts` in the leg array. `cycles` is ignored by `Stand`.
    pub fn new(kind: GaitKind, cycles: u8, mounts: [LegMount; LEG_COUNT]) -> Self {
        let mut order = [0; LEG_COUNT];
        for (k, slot) in order.iter_mut().enumerate() {
            *slot = mounts
                .iter()
                .position(|m| m.index() == CRAWL_ORDER[k])
                .unwrap_or(k);
        }
        let groups = mounts.map(|m| TRIPOD_GROUPS[m.index()]);

        Self {
            kind,
            cycles,
            order,
            groups,
        }
    }

    pub fn kind(&self) -> GaitKind {
        self.kind
    }

    pub fn cycles(&self) -> u8 {
        self.cycles
    }

    pub fn slot_count(&self) -> usize {
        let cycles = self.cycles as usize;
        match self.kind {
            GaitKind::Stand => 1,
            GaitKind::Walk => cycles * LEG_COUNT * 2,
            GaitKind::Wave => cycles * LEG_COUNT,
            // plus one slot for the last leg to return
            GaitKind::Crawl if cycles > 0 => cycles * LEG_COUNT + 1,
            GaitKind::Tripod if cycles > 0 => cycles * 2 + 1,
            GaitKind::Crawl | GaitKind::Tripod => 0,
        }
    }

    pub fn slot(&self, index: usize) -> Option<Slot> {
        if index >= self.slot_count() {
            return None;
        }

        let mut slot = [LegPhase::Hold; LEG_COUNT];
        let full_stroke = LegPhase::Stance { stroke: 1.0 };
        match self.kind {
            GaitKind::Stand => slot = [LegPhase::Settle; LEG_COUNT],
            GaitKind::Walk => {
                let leg = (index / 2) % LEG_COUNT;
                slot[leg] = if index % 2 == 0 {
                    LegPhase::Swing
                } else {
                    full_stroke
                };
            }
            GaitKind::Wave => {
                // legs swing in order of their phase offset
                let swinging = index % LEG_COUNT;
                for (leg, phase) in slot.iter_mut().enumerate() {
                    *phase = if wave_swing_slot(leg) == swinging {
                        LegPhase::Swing
                    } else {
                        LegPhase::Stance {
                            stroke: wave_stroke(),
                        }
                    };
                }
            }
            GaitKind::Crawl => {
                let swings = self.cycles as usize * LEG_COUNT;
                if index < swings {
                    slot[self.order[index % LEG_COUNT]] = LegPhase::Swing;
                }
                if index > 0 {
                    slot[self.order[(index - 1) % LEG_COUNT]] = full_stroke;
                }
            }
            GaitKind::Tripod => {
                let swings = self.cycles as usize * 2;
                for (leg, phase) in slot.iter_mut().enumerate() {
                    let group = self.groups[leg] as usize;
                    if index < swings && group == index % 2 {
                        *phase = LegPhase::Swing;
                    } else if index > 0 && group == (index - 1) % 2 {
                        *phase = full_stroke;
                    }
                }
            }
        }
        Some(slot)
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        (0..self.slot_count()).filter_map(|i| self.slot(i))
    }

    /// Largest number of legs any slot of this kind lifts.
    pub fn stability_bound(&self) -> usize {
        match self.kind {
            GaitKind::Stand => 0,
            GaitKind::Tripod => MAX_SWINGING,
            GaitKind::Walk | GaitKind::Wave | GaitKind::Crawl => 1,
        }
    }

    /// Largest number of legs the generated slots actually lift.
    pub fn max_swinging(&self) -> usize {
        self.slots().map(|slot| swinging_in(&slot)).max().unwrap_or(0)
    }
}

pub fn swinging_in(slot: &Slot) -> usize {
    slot.iter().filter(|p| **p == LegPhase::Swing).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(kind: GaitKind, cycles: u8) -> GaitPlan {
        GaitPlan::new(kind, cycles, LegMount::ALL)
    }

    /// Net stride count moved by each leg over the whole plan.
    fn net_strides(plan: &GaitPlan) -> [f32; LEG_COUNT] {
        let mut net = [0.0; LEG_COUNT];
        for slot in plan.slots() {
            for (leg, phase) in slot.iter().enumerate() {
                match phase {
                    LegPhase::Swing => net[leg] += 1.0,
                    LegPhase::Stance { stroke } => net[leg] -= stroke,
                    _ => {}
                }
            }
        }
        net
    }

    #[test]
    fn no_plan_exceeds_its_bound() {
        for kind in [
            GaitKind::Walk,
            GaitKind::Wave,
            GaitKind::Crawl,
            GaitKind::Tripod,
            GaitKind::Stand,
        ] {
            for cycles in 0..4 {
                let plan = plan(kind, cycles);
                assert!(plan.max_swinging() <= plan.stability_bound(), "{kind}");
                assert!(plan.max_swinging() <= MAX_SWINGING, "{kind}");
            }
        }
    }

    #[test]
    fn full_cycles_bring_every_foot_back() {
        for kind in [GaitKind::Walk, GaitKind::Wave, GaitKind::Crawl, GaitKind::Tripod] {
            for net in net_strides(&plan(kind, 2)) {
                assert!(net.abs() < 1e-5, "{kind}: {net}");
            }
        }
    }

    #[test]
    fn wave_swings_in_phase_order() {
        let plan = plan(GaitKind::Wave, 1);
        assert_eq!(plan.slot_count(), 4);
        for (i, slot) in plan.slots().enumerate() {
            assert_eq!(slot[i], LegPhase::Swing);
            assert_eq!(swinging_in(&slot), 1);
        }
        assert!((phase_offset(1) - PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn wave_slots_follow_phase_offsets() {
        for leg in 0..LEG_COUNT {
            let slot = wave_swing_slot(leg);
            let expected = TAU * slot as f32 / LEG_COUNT as f32;
            assert!((phase_offset(leg) - expected).abs() < 1e-5, "leg {leg}");
        }
        let slots: std::vec::Vec<usize> = (0..LEG_COUNT).map(wave_swing_slot).collect();
        assert_eq!(slots, [0, 1, 2, 3]);
    }

    #[test]
    fn crawl_follows_round_robin_order() {
        let plan = plan(GaitKind::Crawl, 1);
        let swung: std::vec::Vec<usize> = plan
            .slots()
            .filter_map(|slot| slot.iter().position(|p| *p == LegPhase::Swing))
            .collect();
        assert_eq!(swung, [0, 2, 1, 3]);

        // the previous leg returns while the next swings
        let second = plan.slot(1).unwrap();
        assert_eq!(second[2], LegPhase::Swing);
        assert_eq!(second[0], LegPhase::Stance { stroke: 1.0 });
        assert_eq!(plan.slot(4).unwrap()[3], LegPhase::Stance { stroke: 1.0 });
    }

    #[test]
    fn crawl_order_follows_mounts_not_positions() {
        let mounts = [
            LegMount::BackRight,
            LegMount::FrontRight,
            LegMount::BackLeft,
            LegMount::FrontLeft,
        ];
        let plan = GaitPlan::new(GaitKind::Crawl, 1, mounts);
        // front left sits at position 3
        assert_eq!(plan.slot(0).unwrap()[3], LegPhase::Swing);
    }

    #[test]
    fn tripod_moves_diagonal_pairs() {
        let plan = plan(GaitKind::Tripod, 1);
        assert_eq!(plan.slot_count(), 3);
        let first = plan.slot(0).unwrap();
        assert_eq!(first[LegMount::FrontLeft.index()], LegPhase::Swing);
        assert_eq!(first[LegMount::BackRight.index()], LegPhase::Swing);
        assert_eq!(first[LegMount::BackLeft.index()], LegPhase::Hold);
        assert_eq!(plan.max_swinging(), 2);
    }

    #[test]
    fn stand_is_a_single_settle_slot() {
        let plan = plan(GaitKind::Stand, 0);
        assert_eq!(plan.slot_count(), 1);
        assert_eq!(plan.slot(0), Some([LegPhase::Settle; LEG_COUNT]));
        assert_eq!(plan.slot(1), None);
    }
}
