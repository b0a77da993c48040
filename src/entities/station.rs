use getset::Getters;
use serde::{Deserialize, Serialize};

use crate::ids::TrainId;
use crate::time::Minutes;

/// One stop of one released train, keyed by `(stationName, tid)`
/// (spec §3). A trimmed-down copy of the fields needed for search,
/// so search never has to go back to the [`crate::entities::Train`]
/// map for the common case.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct Station {
    train_id: TrainId,
    index: usize,
    price_sum: i64,
    start_sale_date: Minutes,
    end_sale_date: Minutes,
    arriving_time: Minutes,
    leaving_time: Minutes,
}

impl Station {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        train_id: TrainId,
        index: usize,
        price_sum: i64,
        start_sale_date: Minutes,
        end_sale_date: Minutes,
        arriving_time: Minutes,
        leaving_time: Minutes,
    ) -> Self {
        Self {
            train_id,
            index,
            price_sum,
            start_sale_date,
            end_sale_date,
            arriving_time,
            leaving_time,
        }
    }
}
