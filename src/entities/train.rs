use getset::Getters;
use serde::{Deserialize, Serialize};

use crate::ids::{StationName, TrainId};
use crate::time::Minutes;

/// A scheduled service (spec §3). Created unreleased by `add_train`;
/// `release_train` is the one-way transition that materialises its
/// [`crate::entities::DayTrain`] and [`crate::entities::Station`]
/// records and forbids further mutation.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct Train {
    id: TrainId,
    station_num: usize,
    stations: Vec<StationName>,
    total_seat_num: i64,
    /// `price_sum[0] == 0`; `price_sum[i]` is the cumulative fare from
    /// station 0 to station `i`.
    price_sum: Vec<i64>,
    /// `arriving_times[0]` is unused; `leaving_times[0]` carries the
    /// given start clock fused onto the implicit epoch date (spec §9);
    /// `leaving_times[station_num - 1] == Minutes::INF`.
    arriving_times: Vec<Minutes>,
    leaving_times: Vec<Minutes>,
    start_sale_date: Minutes,
    end_sale_date: Minutes,
    train_type: char,
    is_released: bool,
}

impl Train {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TrainId,
        stations: Vec<StationName>,
        total_seat_num: i64,
        price_sum: Vec<i64>,
        arriving_times: Vec<Minutes>,
        leaving_times: Vec<Minutes>,
        start_sale_date: Minutes,
        end_sale_date: Minutes,
        train_type: char,
    ) -> Self {
        let station_num = stations.len();
        Self {
            id,
            station_num,
            stations,
            total_seat_num,
            price_sum,
            arriving_times,
            leaving_times,
            start_sale_date,
            end_sale_date,
            train_type,
            is_released: false,
        }
    }

    pub fn release(&mut self) {
        self.is_released = true;
    }

    /// Index of `station` among this train's stops, if it calls there.
    pub fn index_of(&self, station: &StationName) -> Option<usize> {
        self.stations.iter().position(|s| s == station)
    }

    /// Every sale-window departure date, inclusive, stepped a day at a
    /// time (spec §3: "for every date in [startSaleDate, endSaleDate]").
    pub fn sale_dates(&self) -> Vec<Minutes> {
        const MINUTES_PER_DAY: i64 = 24 * 60;
        let mut dates = Vec::new();
        let mut d = self.start_sale_date;
        while d <= self.end_sale_date {
            dates.push(d);
            d = d + MINUTES_PER_DAY;
        }
        dates
    }
}
