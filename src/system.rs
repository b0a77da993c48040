//! `System`: owns every persistent map plus the in-memory logged-in set,
//! and `dispatch`, the single match that replaces the original's
//! member-function-pointer table (spec §9 REDESIGN FLAGS) with a tagged
//! variant over [`Command`].

use std::collections::HashMap;

use log::{debug, info, trace, warn};

use crate::command::{
    BuyOutcome, Command, OrderView, ProfileView, Response, SeatCell, TrainStopRow,
};
use crate::config::StorageConfig;
use crate::entities::{DayTrain, Order, OrderStatus, Station, Train, User};
use crate::error::{CoreError, CoreResult, StorageError};
use crate::ids::{DisplayName, MailAddr, Password, StationName, TrainId, UserId};
use crate::inventory::Inventory;
use crate::pmap::PMap;
use crate::search::SearchIndex;
use crate::time::Minutes;

pub struct System {
    users: PMap<UserId, User>,
    trains: PMap<TrainId, Train>,
    day_trains: PMap<(Minutes, TrainId), DayTrain>,
    stations: PMap<(StationName, TrainId), Station>,
    orders: PMap<(UserId, u64), Order>,
    pending: PMap<((Minutes, TrainId), u64), Order>,
    logged_in: HashMap<UserId, u8>,
}

impl System {
    /// Open every persistent map under `config`'s data directory.
    pub fn open(config: &StorageConfig) -> Result<Self, StorageError> {
        std::fs::create_dir_all(config.data_dir()).map_err(|source| StorageError::Open {
            path: config.data_dir().to_path_buf(),
            source,
        })?;
        let (users_data, users_meta) = config.paths_for("user");
        let (trains_data, trains_meta) = config.paths_for("train");
        let (day_trains_data, day_trains_meta) = config.paths_for("daytrain");
        let (stations_data, stations_meta) = config.paths_for("station");
        let (orders_data, orders_meta) = config.paths_for("order");
        let (pending_data, pending_meta) = config.paths_for("queue");

        Ok(Self {
            users: PMap::open(users_data, users_meta)?,
            trains: PMap::open(trains_data, trains_meta)?,
            day_trains: PMap::open(day_trains_data, day_trains_meta)?,
            stations: PMap::open(stations_data, stations_meta)?,
            orders: PMap::open(orders_data, orders_meta)?,
            pending: PMap::open(pending_data, pending_meta)?,
            logged_in: HashMap::new(),
        })
    }

    /// Dispatch one already-framed command, never panicking: every
    /// precondition failure collapses to `Response::Failure` (spec
    /// §4.5's wire-level `-1`).
    pub fn dispatch(&mut self, cmd: Command) -> Response {
        debug!("dispatch {cmd:?}");
        let outcome = match cmd {
            Command::AddUser { cur_uid, new_uid, password, name, mail, privilege } => {
                self.add_user(cur_uid, new_uid, password, name, mail, privilege).map(|_| Response::Ack)
            }
            Command::Login { uid, password } => self.login(uid, password).map(|_| Response::Ack),
            Command::Logout { uid } => self.logout(&uid).map(|_| Response::Ack),
            Command::QueryProfile { cur_uid, uid } => {
                self.query_profile(&cur_uid, &uid).map(Response::Profile)
            }
            Command::ModifyProfile { cur_uid, uid, password, name, mail, privilege } => self
                .modify_profile(&cur_uid, &uid, password, name, mail, privilege)
                .map(Response::Profile),
            Command::AddTrain {
                id,
                stations,
                prices,
                start_time,
                travel_times,
                stopover_times,
                total_seat_num,
                start_sale_date,
                end_sale_date,
                train_type,
            } => self
                .add_train(
                    id,
                    stations,
                    prices,
                    start_time,
                    travel_times,
                    stopover_times,
                    total_seat_num,
                    start_sale_date,
                    end_sale_date,
                    train_type,
                )
                .map(|_| Response::Ack),
            Command::ReleaseTrain { id } => self.release_train(&id).map(|_| Response::Ack),
            Command::QueryTrain { id, date } => self.query_train(&id, date).map(|(train_id, train_type, rows)| {
                Response::TrainDetails { train_id, train_type, rows }
            }),
            Command::DeleteTrain { id } => self.delete_train(&id).map(|_| Response::Ack),
            Command::QueryTicket { s, t, date, sort_key } => {
                Ok(Response::Tickets(self.search().query_ticket(&s, &t, date, sort_key)))
            }
            Command::QueryTransfer { s, t, date, sort_key } => {
                Ok(Response::Transfer(self.search().query_transfer(&s, &t, date, sort_key)))
            }
            Command::BuyTicket { uid, id, date, num, from, to, accept_queue } => {
                self.buy_ticket(uid, &id, date, num, &from, &to, accept_queue).map(Response::Bought)
            }
            Command::QueryOrder { uid } => self.query_order(&uid).map(Response::Orders),
            Command::RefundTicket { uid, n } => self.refund_ticket(&uid, n).map(|_| Response::Ack),
            Command::Clean => {
                self.clean();
                Ok(Response::Ack)
            }
            Command::Exit => {
                self.exit();
                Ok(Response::Bye)
            }
        };

        outcome.unwrap_or_else(|err| {
            warn!("command rejected: {err}");
            Response::Failure
        })
    }

    fn search(&self) -> SearchIndex<'_> {
        SearchIndex {
            stations: &self.stations,
            trains: &self.trains,
            day_trains: &self.day_trains,
        }
    }

    fn require_login(&self, uid: &UserId) -> CoreResult<u8> {
        self.logged_in.get(uid).copied().ok_or(CoreError::Auth)
    }

    fn add_user(
        &mut self,
        cur_uid: Option<UserId>,
        new_uid: UserId,
        password: Password,
        name: DisplayName,
        mail: MailAddr,
        privilege: u8,
    ) -> CoreResult<()> {
        let privilege = if self.users.size() == 0 {
            10
        } else {
            let cur_uid = cur_uid.ok_or(CoreError::Auth)?;
            let cur_priv = self.require_login(&cur_uid)?;
            if cur_priv <= privilege {
                return Err(CoreError::Auth);
            }
            if self.users.contains(&new_uid) {
                return Err(CoreError::Duplicate("user"));
            }
            privilege
        };
        self.users.insert(new_uid, User::new(password, name, mail, privilege));
        Ok(())
    }

    fn login(&mut self, uid: UserId, password: Password) -> CoreResult<()> {
        let user = self.users.find(&uid).ok_or(CoreError::NotFound("user"))?;
        if self.logged_in.contains_key(&uid) {
            return Err(CoreError::State("already logged in"));
        }
        if *user.password() != password {
            return Err(CoreError::Auth);
        }
        self.logged_in.insert(uid, *user.privilege());
        Ok(())
    }

    fn logout(&mut self, uid: &UserId) -> CoreResult<()> {
        self.require_login(uid)?;
        self.logged_in.remove(uid);
        Ok(())
    }

    fn query_profile(&self, cur_uid: &UserId, uid: &UserId) -> CoreResult<ProfileView> {
        let cur_priv = self.require_login(cur_uid)?;
        let target = self.users.find(uid).ok_or(CoreError::NotFound("user"))?;
        if cur_uid != uid && cur_priv <= *target.privilege() {
            return Err(CoreError::Auth);
        }
        Ok(ProfileView {
            uid: uid.clone(),
            name: target.name().clone(),
            mail: target.mail().clone(),
            privilege: *target.privilege(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn modify_profile(
        &mut self,
        cur_uid: &UserId,
        uid: &UserId,
        password: Option<Password>,
        name: Option<DisplayName>,
        mail: Option<MailAddr>,
        privilege: Option<u8>,
    ) -> CoreResult<ProfileView> {
        let cur_priv = self.require_login(cur_uid)?;
        let mut target = self.users.find(uid).ok_or(CoreError::NotFound("user"))?;
        if cur_uid != uid && cur_priv <= *target.privilege() {
            return Err(CoreError::Auth);
        }
        if let Some(g) = privilege {
            if g >= cur_priv {
                return Err(CoreError::Auth);
            }
        }

        if let Some(password) = password {
            target.set_password(password);
        }
        if let Some(name) = name {
            target.set_name(name);
        }
        if let Some(mail) = mail {
            target.set_mail(mail);
        }
        if let Some(g) = privilege {
            target.set_privilege(g);
            if self.logged_in.contains_key(uid) {
                self.logged_in.insert(uid.clone(), g);
            }
        }

        self.users.modify(uid.clone(), target.clone());
        Ok(ProfileView {
            uid: uid.clone(),
            name: target.name().clone(),
            mail: target.mail().clone(),
            privilege: *target.privilege(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn add_train(
        &mut self,
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
    ) -> CoreResult<()> {
        if self.trains.contains(&id) {
            return Err(CoreError::Duplicate("train"));
        }
        let station_num = stations.len();

        let mut price_sum = vec![0i64; station_num];
        for i in 1..station_num {
            price_sum[i] = price_sum[i - 1] + prices[i - 1];
        }

        let mut arriving_times = vec![Minutes::from_raw(0); station_num];
        let mut leaving_times = vec![Minutes::from_raw(0); station_num];
        leaving_times[0] = start_time;
        for i in 1..station_num {
            arriving_times[i] = leaving_times[i - 1] + travel_times[i - 1];
            if i < station_num - 1 {
                leaving_times[i] = arriving_times[i] + stopover_times[i - 1];
            }
        }
        leaving_times[station_num - 1] = Minutes::INF;

        let train = Train::new(
            id.clone(),
            stations,
            total_seat_num,
            price_sum,
            arriving_times,
            leaving_times,
            start_sale_date,
            end_sale_date,
            train_type,
        );
        self.trains.insert(id, train);
        Ok(())
    }

    fn release_train(&mut self, id: &TrainId) -> CoreResult<()> {
        let mut train = self.trains.find(id).ok_or(CoreError::NotFound("train"))?;
        if *train.is_released() {
            return Err(CoreError::State("train already released"));
        }

        for day in train.sale_dates() {
            self.day_trains.insert(
                (day, id.clone()),
                DayTrain::new(*train.station_num(), *train.total_seat_num()),
            );
        }
        for i in 0..*train.station_num() {
            self.stations.insert(
                (train.stations()[i].clone(), id.clone()),
                Station::new(
                    id.clone(),
                    i,
                    train.price_sum()[i],
                    *train.start_sale_date(),
                    *train.end_sale_date(),
                    train.arriving_times()[i],
                    train.leaving_times()[i],
                ),
            );
        }

        train.release();
        self.trains.modify(id.clone(), train);
        info!("released train {id}");
        Ok(())
    }

    fn query_train(&self, id: &TrainId, date: Minutes) -> CoreResult<(TrainId, char, Vec<TrainStopRow>)> {
        let train = self.trains.find(id).ok_or(CoreError::NotFound("train"))?;
        if date < *train.start_sale_date() || date > *train.end_sale_date() {
            return Err(CoreError::Range("date outside the train's sale window"));
        }
        let day_train = if *train.is_released() {
            Some(self.day_trains.find(&(date, id.clone())).ok_or(CoreError::NotFound("day train"))?)
        } else {
            None
        };

        let station_num = *train.station_num();
        let mut rows = Vec::with_capacity(station_num);
        for i in 0..station_num {
            let seats = match &day_train {
                Some(dt) if i < station_num - 1 => SeatCell::Seats(dt.query_seat(i, i)),
                Some(_) => SeatCell::NotApplicable,
                None if i < station_num - 1 => SeatCell::Seats(*train.total_seat_num()),
                None => SeatCell::NotApplicable,
            };
            rows.push(TrainStopRow {
                station: train.stations()[i].clone(),
                arriving: if i == 0 { None } else { Some(date + train.arriving_times()[i]) },
                leaving: if i == station_num - 1 { None } else { Some(date + train.leaving_times()[i]) },
                price_sum: train.price_sum()[i],
                seats,
            });
        }
        Ok((id.clone(), *train.train_type(), rows))
    }

    fn delete_train(&mut self, id: &TrainId) -> CoreResult<()> {
        let train = self.trains.find(id).ok_or(CoreError::NotFound("train"))?;
        if *train.is_released() {
            return Err(CoreError::State("train already released"));
        }
        self.trains.erase(id);
        Ok(())
    }

    fn buy_ticket(
        &mut self,
        uid: UserId,
        id: &TrainId,
        date: Minutes,
        num: i64,
        from: &StationName,
        to: &StationName,
        accept_queue: bool,
    ) -> CoreResult<BuyOutcome> {
        self.require_login(&uid)?;
        let train = self.trains.find(id).ok_or(CoreError::NotFound("train"))?;
        if !*train.is_released() {
            return Err(CoreError::State("train not released"));
        }
        if num > *train.total_seat_num() {
            return Err(CoreError::Range("requested seats exceed train capacity"));
        }

        let mut inventory = Inventory {
            day_trains: &mut self.day_trains,
            orders: &mut self.orders,
            pending: &mut self.pending,
        };
        let outcome = inventory.purchase(&train, uid, date, from, to, num, accept_queue)?;
        if matches!(outcome, BuyOutcome::Queued) {
            trace!("order queued on train {id}");
        }
        Ok(outcome)
    }

    fn query_order(&self, uid: &UserId) -> CoreResult<Vec<OrderView>> {
        self.require_login(uid)?;
        let lo = (uid.clone(), 0u64);
        let hi = (uid.clone(), u64::MAX);
        let mut orders = self.orders.range_find(&lo, &hi);
        orders.reverse();
        Ok(orders.into_iter().map(order_view).collect())
    }

    fn refund_ticket(&mut self, uid: &UserId, n: u32) -> CoreResult<()> {
        self.require_login(uid)?;
        let mut inventory = Inventory {
            day_trains: &mut self.day_trains,
            orders: &mut self.orders,
            pending: &mut self.pending,
        };
        inventory.refund(uid, n)
    }

    fn clean(&mut self) {
        self.logged_in.clear();
        self.users.clear();
        self.trains.clear();
        self.day_trains.clear();
        self.stations.clear();
        self.orders.clear();
        self.pending.clear();
        for result in self.flush_all() {
            if let Err(err) = result {
                warn!("clean: failed to flush an emptied map: {err}");
            }
        }
        info!("clean: dropped all persistent and in-memory state");
    }

    fn exit(&mut self) {
        for result in self.flush_all() {
            if let Err(err) = result {
                warn!("exit: failed to flush a map: {err}");
            }
        }
        info!("exit: flushed every persistent map");
    }

    fn flush_all(&self) -> [Result<(), StorageError>; 6] {
        [
            self.users.flush(),
            self.trains.flush(),
            self.day_trains.flush(),
            self.stations.flush(),
            self.orders.flush(),
            self.pending.flush(),
        ]
    }
}

fn order_view(order: Order) -> OrderView {
    OrderView {
        status_label: match order.status() {
            OrderStatus::Success => "success",
            OrderStatus::Pending => "pending",
            OrderStatus::Refunded => "refunded",
        },
        train_id: order.train_id().clone(),
        from: order.from().clone(),
        leaving: *order.start_day() + *order.leaving_time(),
        to: order.to().clone(),
        arriving: *order.start_day() + *order.arriving_time(),
        price: *order.price(),
        num: *order.num(),
    }
}
