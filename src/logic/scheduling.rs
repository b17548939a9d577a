//! Court and time for matches the engine creates after the initial schedule.

use crate::models::{Match, Tournament};
use chrono::{Duration, NaiveDateTime};
use std::collections::HashSet;

/// Hands out free `(court, time)` slots, scanning forward from the latest
/// scheduled match and wrapping to later time slots when every court is taken.
#[derive(Clone, Debug)]
pub struct SlotFinder {
    court_count: u32,
    step: Duration,
    cursor: Option<NaiveDateTime>,
    occupied: HashSet<(NaiveDateTime, u32)>,
}

impl SlotFinder {
    /// `existing` should hold every match of the tournament, across categories,
    /// since courts are shared.
    pub fn new(tournament: &Tournament, existing: &[Match]) -> Self {
        let occupied: HashSet<(NaiveDateTime, u32)> = existing
            .iter()
            .filter_map(|m| Some((m.scheduled_at?, m.court?)))
            .collect();
        let latest = existing.iter().filter_map(|m| m.scheduled_at).max();
        Self {
            court_count: tournament.court_count.max(1),
            step: Duration::minutes(i64::from(tournament.match_duration_minutes.max(1))),
            cursor: latest.or(tournament.start_time),
            occupied,
        }
    }

    /// Next free slot, or None when nothing anchors the schedule yet.
    pub fn next_slot(&mut self) -> Option<(u32, NaiveDateTime)> {
        let mut time = self.cursor?;
        loop {
            if let Some(court) = (1..=self.court_count).find(|c| !self.occupied.contains(&(time, *c))) {
                self.occupied.insert((time, court));
                self.cursor = Some(time);
                return Some((court, time));
            }
            time += self.step;
        }
    }

    /// Move to a fresh time slot if the current one already has a match, so the
    /// next batch never shares a time with the previous one.
    pub fn start_new_timeslot(&mut self) {
        if let Some(time) = self.cursor {
            if (1..=self.court_count).any(|c| self.occupied.contains(&(time, c))) {
                self.cursor = Some(time + self.step);
            }
        }
    }

    /// Schedule `m` in place if a slot is available.
    pub fn assign(&mut self, m: &mut Match) {
        if let Some((court, time)) = self.next_slot() {
            m.court = Some(court);
            m.scheduled_at = Some(time);
        }
    }
}
