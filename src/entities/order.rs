use getset::Getters;
use serde::{Deserialize, Serialize};

use crate::ids::{StationName, TrainId, UserId};
use crate::time::Minutes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Success,
    Pending,
    Refunded,
}

/// An order (spec §3), keyed by `(uid, oid)` in the order map and, while
/// `Pending`, mirrored at `((startDay, tid), oid)` in the pending queue.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct Order {
    order_id: u64,
    user_id: UserId,
    train_id: TrainId,
    from_index: usize,
    to_index: usize,
    from: StationName,
    to: StationName,
    start_day: Minutes,
    leaving_time: Minutes,
    arriving_time: Minutes,
    /// Unit fare (`priceSum[to] - priceSum[from]`), not the line total —
    /// `query_order`'s `<price>` column reports this verbatim next to
    /// `num`; the `buy_ticket` reply multiplies the two out separately.
    price: i64,
    num: i64,
    status: OrderStatus,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: u64,
        user_id: UserId,
        train_id: TrainId,
        from_index: usize,
        to_index: usize,
        from: StationName,
        to: StationName,
        start_day: Minutes,
        leaving_time: Minutes,
        arriving_time: Minutes,
        price: i64,
        num: i64,
        status: OrderStatus,
    ) -> Self {
        Self {
            order_id,
            user_id,
            train_id,
            from_index,
            to_index,
            from,
            to,
            start_day,
            leaving_time,
            arriving_time,
            price,
            num,
            status,
        }
    }

    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }

    /// Does this (pending) order's segment intersect the `[from_index,
    /// to_index)` segment just released by a refund? Used by the refund
    /// drain to skip orders whose availability cannot have changed
    /// (spec §4.3, §9's preserved optimisation). Two segments that only
    /// touch at a shared station boundary still count as intersecting
    /// here, matching the reference drain's station-index comparison.
    pub fn intersects(&self, from_index: usize, to_index: usize) -> bool {
        self.from_index <= to_index && self.to_index >= from_index
    }
}
