//! Break bookkeeping for an open attendance session.
//!
//! A session has two coffee slots and one lunch slot. Each slot is either
//! unused, open (break in progress) or done. Slots only change through the
//! toggle methods on [`BreakSchedule`], which walk a fixed sequence:
//!
//! - coffee: slot 1 start, slot 1 end, slot 2 start, slot 2 end, then exhausted
//! - lunch: start, end, then exhausted
//!
//! At most one slot is open at a time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BreakKind {
    Coffee,
    Lunch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakSlot {
    #[default]
    Unused,
    Open {
        start: DateTime<Utc>,
    },
    Done {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl BreakSlot {
    /// Rebuilds a slot from its stored start/end pair.
    ///
    /// Returns `None` for an end without a start.
    pub fn from_columns(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<Self> {
        match (start, end) {
            (None, None) => Some(BreakSlot::Unused),
            (Some(start), None) => Some(BreakSlot::Open { start }),
            (Some(start), Some(end)) => Some(BreakSlot::Done { start, end }),
            (None, Some(_)) => None,
        }
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        match self {
            BreakSlot::Unused => None,
            BreakSlot::Open { start } | BreakSlot::Done { start, .. } => Some(*start),
        }
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        match self {
            BreakSlot::Done { end, .. } => Some(*end),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, BreakSlot::Open { .. })
    }

    /// Length of a completed break. Open and unused slots count as zero.
    pub fn duration(&self) -> Duration {
        match self {
            BreakSlot::Done { start, end } => *end - *start,
            _ => Duration::zero(),
        }
    }

    fn close(&mut self, now: DateTime<Utc>) {
        if let BreakSlot::Open { start } = *self {
            *self = BreakSlot::Done { start, end: now };
        }
    }
}

/// Derived "what is the user doing right now" view of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BreakPhase {
    Idle,
    CoffeeBreak1,
    CoffeeBreak2,
    LunchBreak,
}

/// One step taken by a toggle, reported for audit logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakTransition {
    Started { kind: BreakKind, slot: u8 },
    Ended { kind: BreakKind, slot: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BreakSchedule {
    coffee: [BreakSlot; 2],
    lunch: BreakSlot,
}

impl BreakSchedule {
    /// Builds a schedule from stored slots, rejecting combinations the
    /// toggles can never produce.
    pub fn from_slots(coffee1: BreakSlot, coffee2: BreakSlot, lunch: BreakSlot) -> Option<Self> {
        let open_count = [coffee1, coffee2, lunch]
            .iter()
            .filter(|slot| slot.is_open())
            .count();
        if open_count > 1 {
            return None;
        }
        if coffee2 != BreakSlot::Unused && !matches!(coffee1, BreakSlot::Done { .. }) {
            return None;
        }

        Some(Self {
            coffee: [coffee1, coffee2],
            lunch,
        })
    }

    pub fn coffee(&self, slot: usize) -> BreakSlot {
        self.coffee[slot]
    }

    pub fn lunch(&self) -> BreakSlot {
        self.lunch
    }

    pub fn phase(&self) -> BreakPhase {
        if self.lunch.is_open() {
            BreakPhase::LunchBreak
        } else if self.coffee[0].is_open() {
            BreakPhase::CoffeeBreak1
        } else if self.coffee[1].is_open() {
            BreakPhase::CoffeeBreak2
        } else {
            BreakPhase::Idle
        }
    }

    /// Advances the coffee sequence by exactly one step.
    pub fn toggle_coffee(&mut self, now: DateTime<Utc>) -> EngineResult<BreakTransition> {
        if self.lunch.is_open() {
            return Err(EngineError::conflict(
                "Lunch break in progress; end it before starting a coffee break",
            ));
        }

        for (index, slot) in self.coffee.iter_mut().enumerate() {
            let number = index as u8 + 1;
            match *slot {
                BreakSlot::Unused => {
                    *slot = BreakSlot::Open { start: now };
                    return Ok(BreakTransition::Started {
                        kind: BreakKind::Coffee,
                        slot: number,
                    });
                }
                BreakSlot::Open { .. } => {
                    slot.close(now);
                    return Ok(BreakTransition::Ended {
                        kind: BreakKind::Coffee,
                        slot: number,
                    });
                }
                BreakSlot::Done { .. } => continue,
            }
        }

        Err(EngineError::BreakLimit {
            kind: BreakKind::Coffee,
        })
    }

    /// Advances the lunch sequence by one step. Starting lunch force-closes
    /// an open coffee break at the same instant.
    pub fn toggle_lunch(&mut self, now: DateTime<Utc>) -> EngineResult<Vec<BreakTransition>> {
        match self.lunch {
            BreakSlot::Done { .. } => Err(EngineError::BreakLimit {
                kind: BreakKind::Lunch,
            }),
            BreakSlot::Open { .. } => {
                self.lunch.close(now);
                Ok(vec![BreakTransition::Ended {
                    kind: BreakKind::Lunch,
                    slot: 1,
                }])
            }
            BreakSlot::Unused => {
                let mut transitions = Vec::with_capacity(2);
                for (index, slot) in self.coffee.iter_mut().enumerate() {
                    if slot.is_open() {
                        slot.close(now);
                        transitions.push(BreakTransition::Ended {
                            kind: BreakKind::Coffee,
                            slot: index as u8 + 1,
                        });
                    }
                }
                self.lunch = BreakSlot::Open { start: now };
                transitions.push(BreakTransition::Started {
                    kind: BreakKind::Lunch,
                    slot: 1,
                });
                Ok(transitions)
            }
        }
    }

    /// Ends whichever break is still open at `now`. Used at time-out so a
    /// closed session is never left on break.
    pub fn close_open(&mut self, now: DateTime<Utc>) -> Vec<BreakTransition> {
        let mut transitions = Vec::new();

        for (index, slot) in self.coffee.iter_mut().enumerate() {
            if slot.is_open() {
                slot.close(now);
                transitions.push(BreakTransition::Ended {
                    kind: BreakKind::Coffee,
                    slot: index as u8 + 1,
                });
            }
        }
        if self.lunch.is_open() {
            self.lunch.close(now);
            transitions.push(BreakTransition::Ended {
                kind: BreakKind::Lunch,
                slot: 1,
            });
        }

        transitions
    }

    /// Completed lunch time. This is the only break deducted from worked hours.
    pub fn lunch_duration(&self) -> Duration {
        self.lunch.duration()
    }

    /// Completed coffee time, reported but not deducted.
    pub fn coffee_duration(&self) -> Duration {
        self.coffee[0].duration() + self.coffee[1].duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_coffee_walks_four_states_then_limits() {
        let mut schedule = BreakSchedule::default();

        assert_eq!(
            schedule.toggle_coffee(at(10, 0)).unwrap(),
            BreakTransition::Started { kind: BreakKind::Coffee, slot: 1 }
        );
        assert_eq!(schedule.phase(), BreakPhase::CoffeeBreak1);
        assert_eq!(
            schedule.toggle_coffee(at(10, 15)).unwrap(),
            BreakTransition::Ended { kind: BreakKind::Coffee, slot: 1 }
        );
        assert_eq!(
            schedule.toggle_coffee(at(15, 0)).unwrap(),
            BreakTransition::Started { kind: BreakKind::Coffee, slot: 2 }
        );
        assert_eq!(schedule.phase(), BreakPhase::CoffeeBreak2);
        assert_eq!(
            schedule.toggle_coffee(at(15, 10)).unwrap(),
            BreakTransition::Ended { kind: BreakKind::Coffee, slot: 2 }
        );
        assert_eq!(schedule.phase(), BreakPhase::Idle);

        let err = schedule.toggle_coffee(at(16, 0)).unwrap_err();
        assert!(matches!(err, EngineError::BreakLimit { kind: BreakKind::Coffee }));
        assert_eq!(schedule.coffee_duration(), Duration::minutes(25));
    }

    #[test]
    fn test_lunch_force_closes_open_coffee() {
        let mut schedule = BreakSchedule::default();
        schedule.toggle_coffee(at(11, 50)).unwrap();

        let transitions = schedule.toggle_lunch(at(12, 0)).unwrap();

        assert_eq!(
            transitions,
            vec![
                BreakTransition::Ended { kind: BreakKind::Coffee, slot: 1 },
                BreakTransition::Started { kind: BreakKind::Lunch, slot: 1 },
            ]
        );
        assert_eq!(schedule.coffee(0).end(), Some(at(12, 0)));
        assert_eq!(schedule.lunch().start(), Some(at(12, 0)));
        assert_eq!(schedule.phase(), BreakPhase::LunchBreak);
    }

    #[test]
    fn test_single_lunch_slot() {
        let mut schedule = BreakSchedule::default();
        schedule.toggle_lunch(at(12, 0)).unwrap();
        schedule.toggle_lunch(at(12, 30)).unwrap();

        assert_eq!(schedule.lunch_duration(), Duration::minutes(30));
        let err = schedule.toggle_lunch(at(13, 0)).unwrap_err();
        assert!(matches!(err, EngineError::BreakLimit { kind: BreakKind::Lunch }));
    }

    #[test]
    fn test_lunch_limit_leaves_open_coffee_untouched() {
        let mut schedule = BreakSchedule::default();
        schedule.toggle_lunch(at(12, 0)).unwrap();
        schedule.toggle_lunch(at(12, 30)).unwrap();
        schedule.toggle_coffee(at(15, 0)).unwrap();

        assert!(schedule.toggle_lunch(at(15, 5)).is_err());
        assert!(schedule.coffee(0).is_open());
    }

    #[test]
    fn test_coffee_rejected_during_lunch() {
        let mut schedule = BreakSchedule::default();
        schedule.toggle_lunch(at(12, 0)).unwrap();

        let err = schedule.toggle_coffee(at(12, 10)).unwrap_err();
        assert!(matches!(err, EngineError::Conflict { .. }));
        assert_eq!(schedule.coffee(0), BreakSlot::Unused);
    }

    #[test]
    fn test_close_open_ends_lunch_in_progress() {
        let mut schedule = BreakSchedule::default();
        schedule.toggle_lunch(at(12, 0)).unwrap();

        let transitions = schedule.close_open(at(17, 0));

        assert_eq!(
            transitions,
            vec![BreakTransition::Ended { kind: BreakKind::Lunch, slot: 1 }]
        );
        assert_eq!(schedule.phase(), BreakPhase::Idle);
        assert_eq!(schedule.lunch_duration(), Duration::hours(5));
    }

    #[test]
    fn test_close_open_ends_second_coffee() {
        let mut schedule = BreakSchedule::default();
        schedule.toggle_coffee(at(10, 0)).unwrap();
        schedule.toggle_coffee(at(10, 15)).unwrap();
        schedule.toggle_coffee(at(16, 50)).unwrap();

        let transitions = schedule.close_open(at(17, 0));

        assert_eq!(
            transitions,
            vec![BreakTransition::Ended { kind: BreakKind::Coffee, slot: 2 }]
        );
        assert_eq!(schedule.coffee(1).end(), Some(at(17, 0)));
        assert_eq!(schedule.coffee_duration(), Duration::minutes(25));
    }

    #[test]
    fn test_close_open_is_noop_when_idle() {
        let mut schedule = BreakSchedule::default();
        schedule.toggle_lunch(at(12, 0)).unwrap();
        schedule.toggle_lunch(at(12, 30)).unwrap();
        let before = schedule;

        assert!(schedule.close_open(at(17, 0)).is_empty());
        assert_eq!(schedule, before);
    }

    #[test]
    fn test_from_columns_rejects_end_without_start() {
        assert_eq!(BreakSlot::from_columns(None, Some(at(9, 0))), None);
        assert_eq!(
            BreakSlot::from_columns(Some(at(9, 0)), None),
            Some(BreakSlot::Open { start: at(9, 0) })
        );
    }

    #[test]
    fn test_from_slots_rejects_unreachable_states() {
        let open = BreakSlot::Open { start: at(10, 0) };
        let done = BreakSlot::Done { start: at(10, 0), end: at(10, 10) };

        assert!(BreakSchedule::from_slots(open, BreakSlot::Unused, open).is_none());
        assert!(BreakSchedule::from_slots(BreakSlot::Unused, done, BreakSlot::Unused).is_none());
        assert!(BreakSchedule::from_slots(done, open, BreakSlot::Unused).is_some());
    }
}
