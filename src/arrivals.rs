use rand::Rng;
use tracing::{debug, warn};

use crate::models::SimulationParams;
use crate::random::VariateSource;
use crate::state::Customer;

/// Expected arrivals above which generation logs a warning.
pub const LARGE_RUN_ARRIVALS: f64 = 1_000_000.0;

/// Mean number of customers a run materializes, `arrival_rate * duration`.
pub fn expected_arrivals(params: &SimulationParams) -> f64 {
    params.arrival_rate * params.duration
}

/// Materializes every arrival inside `[0, duration)` as a Poisson process.
///
/// Gaps are drawn at `arrival_rate` and accumulated; the first draw that lands
/// on or past the horizon is discarded and ends generation. Ids start at 1.
///
/// Arrival rate has no upper bound, so the list (and the event log built from
/// it) grows with `arrival_rate * duration`; memory is proportional to that.
pub fn generate_arrivals<R: Rng>(
    params: &SimulationParams,
    variates: &mut VariateSource<R>,
) -> Vec<Customer> {
    let expected = expected_arrivals(params);
    if expected > LARGE_RUN_ARRIVALS {
        warn!(expected, "large run, every arrival is held in memory");
    } else {
        debug!(expected, "generating arrivals");
    }
    let mut customers = Vec::new();
    let mut time = variates.exponential(params.arrival_rate);
    let mut id = 1usize;
    while time < params.duration {
        customers.push(Customer::new(id, time));
        id += 1;
        time += variates.exponential(params.arrival_rate);
    }
    customers
}
