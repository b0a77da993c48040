//! Direct and transfer ticket search (spec §4.4). Both operations are
//! read-only: they range-scan the station index, join by train id, and
//! consult the relevant `DayTrain` records for remaining capacity, but
//! never write anything back.

use std::collections::HashMap;

use crate::command::{SortKey, TicketLeg};
use crate::entities::{DayTrain, Station, Train};
use crate::ids::{StationName, TrainId};
use crate::pmap::PMap;
use crate::time::Minutes;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Bundles the three indexes search needs: the station index for the
/// `(station, tid)` range scans, the train map for a released train's
/// full per-stop arrays, and the day-train map for remaining capacity.
pub struct SearchIndex<'a> {
    pub stations: &'a PMap<(StationName, TrainId), Station>,
    pub trains: &'a PMap<TrainId, Train>,
    pub day_trains: &'a PMap<(Minutes, TrainId), DayTrain>,
}

impl<'a> SearchIndex<'a> {
    fn stops_at(&self, station: &StationName) -> Vec<Station> {
        self.stations
            .range_find(&station.range_floor(), &station.range_ceiling())
    }

    fn seats(&self, start_day: Minutes, tid: &TrainId, l: usize, r: usize) -> i64 {
        self.day_trains
            .find(&(start_day, tid.clone()))
            .map(|dt| dt.query_seat(l, r))
            .unwrap_or(0)
    }

    /// Direct single-train itineraries from `s` to `t` boarding on `date`
    /// (spec §4.4). Every train calling at both stations, in order,
    /// whose sale window admits the derived boarding day.
    pub fn query_ticket(
        &self,
        s: &StationName,
        t: &StationName,
        date: Minutes,
        sort_key: SortKey,
    ) -> Vec<TicketLeg> {
        if s == t {
            return Vec::new();
        }
        let s_stops = self.stops_at(s);
        let t_by_tid: HashMap<TrainId, Station> = self
            .stops_at(t)
            .into_iter()
            .map(|st| (st.train_id().clone(), st))
            .collect();

        let mut legs = Vec::new();
        for si in &s_stops {
            let Some(ti) = t_by_tid.get(si.train_id()) else {
                continue;
            };
            if !(si.leaving_time() < ti.arriving_time() && si.index() < ti.index()) {
                continue;
            }
            let start_day = date - si.leaving_time().date();
            if start_day < *si.start_sale_date() || start_day > *si.end_sale_date() {
                continue;
            }
            let leaving = start_day + *si.leaving_time();
            let arriving = start_day + *ti.arriving_time();
            let seats = self.seats(start_day, si.train_id(), *si.index(), ti.index() - 1);
            legs.push(TicketLeg {
                train_id: si.train_id().clone(),
                from: s.clone(),
                leaving,
                to: t.clone(),
                arriving,
                cost: ti.price_sum() - si.price_sum(),
                seats,
            });
        }

        sort_legs(&mut legs, sort_key);
        legs
    }

    /// Two-leg itineraries from `s` to `t` boarding on `date` with
    /// exactly one change of train at an intermediate stop (spec §4.4).
    /// Returns the single best pair by the selection ordering, or
    /// `None` if no feasible pair exists.
    pub fn query_transfer(
        &self,
        s: &StationName,
        t: &StationName,
        date: Minutes,
        sort_key: SortKey,
    ) -> Option<(TicketLeg, TicketLeg)> {
        if s == t {
            return None;
        }
        let s_stops = self.stops_at(s);
        let t_stops = self.stops_at(t);

        let mut best: Option<(i64, i64, TrainId, TrainId, TicketLeg, TicketLeg)> = None;

        for si in &s_stops {
            let Some(train1) = self.trains.find(si.train_id()) else {
                continue;
            };
            let start_day1 = date - si.leaving_time().date();
            if start_day1 < *si.start_sale_date() || start_day1 > *si.end_sale_date() {
                continue;
            }

            for ti in &t_stops {
                if ti.train_id() == si.train_id() {
                    continue;
                }
                let Some(train2) = self.trains.find(ti.train_id()) else {
                    continue;
                };

                for k in (si.index() + 1)..*train1.station_num() {
                    let x = &train1.stations()[k];
                    let Some(l) = train2.index_of(x) else {
                        continue;
                    };
                    if l >= *ti.index() {
                        continue;
                    }

                    let arriving1 = train1.arriving_times()[k];
                    let t1 = start_day1 + arriving1;
                    let day_anchor = t1.date();
                    let leaving2 = train2.leaving_times()[l];
                    let fastest = if arriving1.clock() <= leaving2.clock() {
                        day_anchor - leaving2.date()
                    } else {
                        (day_anchor + MINUTES_PER_DAY) - leaving2.date()
                    };
                    if fastest > *ti.end_sale_date() {
                        continue;
                    }
                    let start_day2 = fastest.max(*ti.start_sale_date());

                    let cost = (train1.price_sum()[k] - si.price_sum())
                        + (ti.price_sum() - train2.price_sum()[l]);
                    let total_time =
                        ((start_day2 + *ti.arriving_time()) - (start_day1 + *si.leaving_time())).raw();
                    let first_leg_time = (arriving1 - *si.leaving_time()).raw();

                    let primary = match sort_key {
                        SortKey::Cost => cost,
                        SortKey::Time => total_time,
                    };
                    let candidate_key = (
                        primary,
                        first_leg_time,
                        si.train_id().clone(),
                        ti.train_id().clone(),
                    );

                    let better = match &best {
                        None => true,
                        Some((bp, bf, bt1, bt2, ..)) => {
                            (primary, first_leg_time, si.train_id(), ti.train_id())
                                < (*bp, *bf, bt1, bt2)
                        }
                    };
                    if !better {
                        continue;
                    }

                    let seats1 = self.seats(start_day1, si.train_id(), *si.index(), k - 1);
                    let seats2 = self.seats(start_day2, ti.train_id(), l, ti.index() - 1);
                    let leg1 = TicketLeg {
                        train_id: si.train_id().clone(),
                        from: s.clone(),
                        leaving: start_day1 + *si.leaving_time(),
                        to: x.clone(),
                        arriving: t1,
                        cost: train1.price_sum()[k] - si.price_sum(),
                        seats: seats1,
                    };
                    let leg2 = TicketLeg {
                        train_id: ti.train_id().clone(),
                        from: x.clone(),
                        leaving: start_day2 + leaving2,
                        to: t.clone(),
                        arriving: start_day2 + *ti.arriving_time(),
                        cost: ti.price_sum() - train2.price_sum()[l],
                        seats: seats2,
                    };
                    best = Some((
                        candidate_key.0,
                        candidate_key.1,
                        candidate_key.2,
                        candidate_key.3,
                        leg1,
                        leg2,
                    ));
                }
            }
        }

        best.map(|(_, _, _, _, leg1, leg2)| (leg1, leg2))
    }
}

fn sort_legs(legs: &mut [TicketLeg], sort_key: SortKey) {
    legs.sort_by(|a, b| {
        let primary = match sort_key {
            SortKey::Cost => a.cost.cmp(&b.cost),
            SortKey::Time => (a.arriving - a.leaving).raw().cmp(&(b.arriving - b.leaving).raw()),
        };
        primary.then_with(|| a.train_id.cmp(&b.train_id))
    });
}
