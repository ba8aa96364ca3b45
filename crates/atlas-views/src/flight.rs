//! Single-flight bookkeeping.
//!
//! Each fetch is issued with a [`Ticket`]. Starting a new fetch for a region
//! supersedes the region's previous ticket; an outcome is applied only if it
//! still holds the region's current ticket.

use std::collections::HashMap;
use std::fmt;

use crate::controller::FetchRegion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct FlightTracker {
    issued: u64,
    current: HashMap<FetchRegion, Ticket>,
}

impl FlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for `region`, superseding any in-flight one.
    pub fn begin(&mut self, region: FetchRegion) -> Ticket {
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.current.insert(region, ticket);
        ticket
    }

    /// Consume the region's ticket if `ticket` is still current.
    pub fn complete(&mut self, region: FetchRegion, ticket: Ticket) -> bool {
        match self.current.get(&region) {
            Some(current) if *current == ticket => {
                self.current.remove(&region);
                true
            }
            _ => false,
        }
    }

    /// Drop the region's in-flight ticket so its outcome will be discarded.
    pub fn cancel(&mut self, region: FetchRegion) {
        self.current.remove(&region);
    }

    /// Supersede every in-flight fetch.
    pub fn cancel_all(&mut self) {
        self.current.clear();
    }

    pub fn in_flight(&self) -> usize {
        self.current.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_common::Subject;

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let mut flights = FlightTracker::new();
        let region = FetchRegion::Heatmap(Subject::A);
        let first = flights.begin(region);
        let second = flights.begin(region);
        assert!(!flights.complete(region, first));
        assert!(flights.complete(region, second));
        assert_eq!(flights.in_flight(), 0);
    }

    #[test]
    fn test_regions_are_tracked_independently() {
        let mut flights = FlightTracker::new();
        let a = flights.begin(FetchRegion::Heatmap(Subject::A));
        let b = flights.begin(FetchRegion::Heatmap(Subject::B));
        assert!(flights.complete(FetchRegion::Heatmap(Subject::B), b));
        assert_eq!(flights.in_flight(), 1);
        assert!(flights.complete(FetchRegion::Heatmap(Subject::A), a));
    }

    #[test]
    fn test_cancelled_ticket_is_discarded() {
        let mut flights = FlightTracker::new();
        let ticket = flights.begin(FetchRegion::Detail);
        flights.cancel_all();
        assert!(!flights.complete(FetchRegion::Detail, ticket));
    }

    #[test]
    fn test_ticket_is_consumed_once() {
        let mut flights = FlightTracker::new();
        let ticket = flights.begin(FetchRegion::Size);
        assert!(flights.complete(FetchRegion::Size, ticket));
        assert!(!flights.complete(FetchRegion::Size, ticket));
    }
}
