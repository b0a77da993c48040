//! Purchase and refund (spec §4.3): the two operations that mutate a
//! `DayTrain`'s seat vector and the order stores together, as a single
//! committed unit. Everything here assumes the caller has already
//! authorised the request (login, privilege, train existence); this
//! module only knows about seats, segments, and the FIFO drain.

use crate::command::BuyOutcome;
use crate::entities::{DayTrain, Order, OrderStatus, Train};
use crate::error::{CoreError, CoreResult};
use crate::ids::{StationName, TrainId, UserId};
use crate::pmap::PMap;
use crate::time::Minutes;

pub struct Inventory<'a> {
    pub day_trains: &'a mut PMap<(Minutes, TrainId), DayTrain>,
    pub orders: &'a mut PMap<(UserId, u64), Order>,
    pub pending: &'a mut PMap<((Minutes, TrainId), u64), Order>,
}

impl<'a> Inventory<'a> {
    /// Attempt a purchase on `train`, boarding at `from` and alighting
    /// at `to` on `date` (spec §4.3 "Purchase"). `train` must already be
    /// released; the caller enforces that along with login and capacity
    /// bound checks against `total_seat_num`.
    pub fn purchase(
        &mut self,
        train: &Train,
        uid: UserId,
        date: Minutes,
        from: &StationName,
        to: &StationName,
        num: i64,
        accept_queue: bool,
    ) -> CoreResult<BuyOutcome> {
        let from_index = train.index_of(from).ok_or(CoreError::NotFound("station"))?;
        let to_index = train.index_of(to).ok_or(CoreError::NotFound("station"))?;
        if from_index >= to_index {
            return Err(CoreError::Range("from must precede to"));
        }

        let start_day = date - train.leaving_times()[from_index].date();
        if start_day < *train.start_sale_date() || start_day > *train.end_sale_date() {
            return Err(CoreError::Range("date outside the train's sale window"));
        }

        let key = (start_day, train.id().clone());
        let mut day_train = self
            .day_trains
            .find(&key)
            .ok_or(CoreError::NotFound("day train"))?;

        // Order.price is the unit fare, not the line total (spec §6's
        // `query_order` reports it verbatim alongside `num`); the buy
        // reply multiplies it out separately.
        let unit_price = train.price_sum()[to_index] - train.price_sum()[from_index];
        let order_id = self.orders.size() as u64;

        if day_train.query_seat(from_index, to_index - 1) >= num {
            day_train.modify_seat(from_index, to_index - 1, -num);
            self.day_trains.modify(key, day_train);
            let order = Order::new(
                order_id,
                uid.clone(),
                train.id().clone(),
                from_index,
                to_index,
                from.clone(),
                to.clone(),
                start_day,
                train.leaving_times()[from_index],
                train.arriving_times()[to_index],
                unit_price,
                num,
                OrderStatus::Success,
            );
            self.orders.insert((uid, order_id), order);
            Ok(BuyOutcome::Purchased { total_cost: num * unit_price })
        } else if accept_queue {
            let order = Order::new(
                order_id,
                uid.clone(),
                train.id().clone(),
                from_index,
                to_index,
                from.clone(),
                to.clone(),
                start_day,
                train.leaving_times()[from_index],
                train.arriving_times()[to_index],
                unit_price,
                num,
                OrderStatus::Pending,
            );
            self.orders.insert((uid, order_id), order.clone());
            self.pending.insert(((start_day, train.id().clone()), order_id), order);
            Ok(BuyOutcome::Queued)
        } else {
            Err(CoreError::Range("insufficient remaining seats"))
        }
    }

    /// Refund `uid`'s `n`-th most recent order, 1-based (spec §4.3
    /// "Refund"). Releases the seats of a `SUCCESS` order and drains
    /// the pending queue for its departure in ascending oid order;
    /// simply dequeues a `PENDING` order without touching seats.
    pub fn refund(&mut self, uid: &UserId, n: u32) -> CoreResult<()> {
        if n == 0 {
            return Err(CoreError::Arg("refund index is 1-based"));
        }
        let lo = (uid.clone(), 0u64);
        let hi = (uid.clone(), u64::MAX);
        let mut owned = self.orders.range_find(&lo, &hi);
        let idx = owned
            .len()
            .checked_sub(n as usize)
            .ok_or(CoreError::NotFound("order"))?;
        let mut order = owned.swap_remove(idx);

        if *order.status() == OrderStatus::Refunded {
            return Err(CoreError::State("order already refunded"));
        }

        let was_success = *order.status() == OrderStatus::Success;
        order.set_status(OrderStatus::Refunded);
        self.orders.modify((uid.clone(), *order.order_id()), order.clone());

        let key = (*order.start_day(), order.train_id().clone());
        if !was_success {
            self.pending.erase(&(key, *order.order_id()));
            return Ok(());
        }

        let mut day_train = self
            .day_trains
            .find(&key)
            .ok_or(CoreError::NotFound("day train"))?;
        day_train.modify_seat(*order.from_index(), order.to_index() - 1, *order.num());

        let q_lo = (key.clone(), 0u64);
        let q_hi = (key.clone(), u64::MAX);
        for mut candidate in self.pending.range_find(&q_lo, &q_hi) {
            if !candidate.intersects(*order.from_index(), *order.to_index()) {
                continue;
            }
            let remain = day_train.query_seat(*candidate.from_index(), candidate.to_index() - 1);
            if remain < *candidate.num() {
                continue;
            }
            day_train.modify_seat(*candidate.from_index(), candidate.to_index() - 1, -*candidate.num());
            candidate.set_status(OrderStatus::Success);
            self.orders
                .modify((candidate.user_id().clone(), *candidate.order_id()), candidate.clone());
            self.pending.erase(&(key.clone(), *candidate.order_id()));
        }

        self.day_trains.modify(key, day_train);
        Ok(())
    }
}
