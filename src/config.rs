//! Service configuration: command-line flags with environment fallbacks.

use std::time::Duration;

use clap::Parser;

use crate::classifier::BoosterParams;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "mlsim", about = "Train / test / replay service for time-ordered datasets")]
pub struct Config {
    /// Interface to bind
    #[arg(long, env = "MLSIM_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Pause between replayed events (0 disables pacing)
    #[arg(long, env = "SIMULATION_DELAY_MS", default_value_t = 1000)]
    pub simulation_delay_ms: u64,

    /// Maximum accepted upload size
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = 50)]
    pub max_upload_mb: usize,

    #[arg(long, env = "MODEL_N_ESTIMATORS", default_value_t = 200)]
    pub n_estimators: usize,

    #[arg(long, env = "MODEL_MAX_DEPTH", default_value_t = 5)]
    pub max_depth: usize,

    #[arg(long, env = "MODEL_LEARNING_RATE", default_value_t = 0.1)]
    pub learning_rate: f64,

    #[arg(long, env = "MODEL_SUBSAMPLE", default_value_t = 0.9)]
    pub subsample: f64,

    #[arg(long, env = "MODEL_COLSAMPLE_BYTREE", default_value_t = 0.9)]
    pub colsample_bytree: f64,

    /// Seed for row/column sampling; fixed so retraining is reproducible
    #[arg(long, env = "MODEL_SEED", default_value_t = 42)]
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        let booster = BoosterParams::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            simulation_delay_ms: 1000,
            max_upload_mb: 50,
            n_estimators: booster.n_estimators,
            max_depth: booster.max_depth,
            learning_rate: booster.learning_rate,
            subsample: booster.subsample,
            colsample_bytree: booster.colsample_bytree,
            seed: booster.seed,
        }
    }
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn simulation_delay(&self) -> Duration {
        Duration::from_millis(self.simulation_delay_ms)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn booster_params(&self) -> BoosterParams {
        BoosterParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            learning_rate: self.learning_rate,
            subsample: self.subsample,
            colsample_bytree: self.colsample_bytree,
            seed: self.seed,
            ..BoosterParams::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::try_parse_from([
            "mlsim",
            "--port",
            "9100",
            "--simulation-delay-ms",
            "0",
            "--n-estimators",
            "10",
        ])
        .unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.simulation_delay(), Duration::ZERO);
        assert_eq!(config.booster_params().n_estimators, 10);
    }

    #[test]
    fn test_default_matches_booster_defaults() {
        let config = Config::default();
        assert_eq!(config.booster_params(), BoosterParams::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.max_upload_bytes(), 50 * 1024 * 1024);
    }
}
