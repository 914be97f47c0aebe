use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const MAX_SERVERS: usize = 20;
/// One day, in simulated minutes.
pub const MAX_DURATION: f64 = 1440.0;

/// Inputs of a single M/M/c run. Rates are customers per minute, the
/// duration is in minutes.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SimulationParams {
    pub arrival_rate: f64,
    pub service_rate: f64,
    pub num_servers: usize,
    pub duration: f64,
}

impl SimulationParams {
    pub fn new(arrival_rate: f64, service_rate: f64, num_servers: usize, duration: f64) -> Self {
        Self {
            arrival_rate,
            service_rate,
            num_servers,
            duration,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_rate("arrival_rate", self.arrival_rate)?;
        check_rate("service_rate", self.service_rate)?;
        if self.num_servers == 0 || self.num_servers > MAX_SERVERS {
            return Err(Error::configuration(
                "num_servers",
                format!(
                    "must be between 1 and {} (got {})",
                    MAX_SERVERS, self.num_servers
                ),
            ));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 || self.duration > MAX_DURATION {
            return Err(Error::configuration(
                "duration",
                format!(
                    "must be > 0 and <= {} minutes (got {})",
                    MAX_DURATION, self.duration
                ),
            ));
        }
        Ok(())
    }

    /// Offered load per server, `arrival_rate / (num_servers * service_rate)`.
    pub fn traffic_intensity(&self) -> f64 {
        self.arrival_rate / (self.num_servers as f64 * self.service_rate)
    }
}

fn check_rate(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::configuration(
            field,
            format!("must be a finite value > 0 (got {})", value),
        ));
    }
    Ok(())
}

/// File-level configuration: every field is optional so command-line flags
/// can fill in or override what the file leaves out.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default)]
    pub arrival_rate: Option<f64>,
    #[serde(default)]
    pub service_rate: Option<f64>,
    #[serde(default)]
    pub num_servers: Option<usize>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimConfig {
    pub fn into_params(self) -> Result<(SimulationParams, u64)> {
        let params = SimulationParams {
            arrival_rate: self
                .arrival_rate
                .ok_or(Error::MissingParameter("arrival_rate"))?,
            service_rate: self
                .service_rate
                .ok_or(Error::MissingParameter("service_rate"))?,
            num_servers: self
                .num_servers
                .ok_or(Error::MissingParameter("num_servers"))?,
            duration: self.duration.ok_or(Error::MissingParameter("duration"))?,
        };
        params.validate()?;
        Ok((params, self.seed.unwrap_or(0)))
    }
}
