//! Typed dispatcher commands and responses (spec §4.5, §6). A [`Command`]
//! is already shape-validated (argument counts, parseable values) by
//! `framing`; `System::dispatch` only has to apply the domain rules.

use crate::ids::{DisplayName, MailAddr, Password, StationName, TrainId, UserId};
use crate::time::Minutes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Time,
    Cost,
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::Time
    }
}

#[derive(Debug, Clone)]
pub enum Command {
    AddUser {
        cur_uid: Option<UserId>,
        new_uid: UserId,
        password: Password,
        name: DisplayName,
        mail: MailAddr,
        privilege: u8,
    },
    Login {
        uid: UserId,
        password: Password,
    },
    Logout {
        uid: UserId,
    },
    QueryProfile {
        cur_uid: UserId,
        uid: UserId,
    },
    ModifyProfile {
        cur_uid: UserId,
        uid: UserId,
        password: Option<Password>,
        name: Option<DisplayName>,
        mail: Option<MailAddr>,
        privilege: Option<u8>,
    },
    AddTrain {
        id: TrainId,
        stations: Vec<StationName>,
        prices: Vec<i64>,
        start_time: Minutes,
        travel_times: Vec<i64>,
        stopover_times: Vec<i64>,
        total_seat_num: i64,
        start_sale_date: Minutes,
        end_sale_date: Minutes,
        train_type: char,
    },
    ReleaseTrain {
        id: TrainId,
    },
    QueryTrain {
        id: TrainId,
        date: Minutes,
    },
    DeleteTrain {
        id: TrainId,
    },
    QueryTicket {
        s: StationName,
        t: StationName,
        date: Minutes,
        sort_key: SortKey,
    },
    QueryTransfer {
        s: StationName,
        t: StationName,
        date: Minutes,
        sort_key: SortKey,
    },
    BuyTicket {
        uid: UserId,
        id: TrainId,
        date: Minutes,
        num: i64,
        from: StationName,
        to: StationName,
        accept_queue: bool,
    },
    QueryOrder {
        uid: UserId,
    },
    RefundTicket {
        uid: UserId,
        n: u32,
    },
    Clean,
    Exit,
}

/// One leg of a ticket result (spec §6: `query_ticket` / `query_transfer`
/// per-leg record shape).
#[derive(Debug, Clone)]
pub struct TicketLeg {
    pub train_id: TrainId,
    pub from: StationName,
    pub leaving: Minutes,
    pub to: StationName,
    pub arriving: Minutes,
    pub cost: i64,
    pub seats: i64,
}

/// One row of `query_profile` / `modify_profile`'s reply.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub uid: UserId,
    pub name: DisplayName,
    pub mail: MailAddr,
    pub privilege: u8,
}

/// Seat count column of `query_train`: either a concrete number, or `x`
/// for the unused first/last slot (spec §6).
#[derive(Debug, Clone, Copy)]
pub enum SeatCell {
    Seats(i64),
    NotApplicable,
}

/// One row of `query_train`'s reply.
#[derive(Debug, Clone)]
pub struct TrainStopRow {
    pub station: StationName,
    pub arriving: Option<Minutes>,
    pub leaving: Option<Minutes>,
    pub price_sum: i64,
    pub seats: SeatCell,
}

/// One row of `query_order`'s reply, newest first.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub status_label: &'static str,
    pub train_id: TrainId,
    pub from: StationName,
    pub leaving: Minutes,
    pub to: StationName,
    pub arriving: Minutes,
    pub price: i64,
    pub num: i64,
}

#[derive(Debug, Clone)]
pub enum BuyOutcome {
    Purchased { total_cost: i64 },
    Queued,
}

/// The dispatcher's reply (spec §6). Every side-effecting command with
/// no payload collapses to `Ack`/`Failure`; queries carry their own
/// structured payload even when empty, since an empty `query_ticket`
/// result is a success (`0`), not a failure (`-1`).
#[derive(Debug, Clone)]
pub enum Response {
    Ack,
    Failure,
    Profile(ProfileView),
    TrainDetails { train_id: TrainId, train_type: char, rows: Vec<TrainStopRow> },
    Tickets(Vec<TicketLeg>),
    Transfer(Option<(TicketLeg, TicketLeg)>),
    Bought(BuyOutcome),
    Orders(Vec<OrderView>),
    Bye,
}

impl Response {
    pub fn failure() -> Self {
        Response::Failure
    }
}
