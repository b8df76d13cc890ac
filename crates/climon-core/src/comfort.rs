//! Comfort-band configuration and reading evaluation.

use serde::{Deserialize, Serialize};

/// Inclusive comfort bands a reading is evaluated against.
///
/// Built once at startup and passed explicitly to the pipeline and query
/// layer — never read from ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComfortConfig {
    /// Lower temperature bound in °C (default: 18).
    pub temp_min: f64,
    /// Upper temperature bound in °C (default: 25).
    pub temp_max: f64,
    /// Lower relative-humidity bound in % (default: 40).
    pub hum_min: f64,
    /// Upper relative-humidity bound in % (default: 60).
    pub hum_max: f64,
}

impl Default for ComfortConfig {
    fn default() -> Self {
        Self {
            temp_min: 18.0,
            temp_max: 25.0,
            hum_min: 40.0,
            hum_max: 60.0,
        }
    }
}

impl ComfortConfig {
    /// Evaluate a reading against the comfort bands.
    ///
    /// Returns `None` when both dimensions are within their inclusive
    /// ranges; otherwise a human-readable warning naming each
    /// out-of-range dimension exactly once, joined with `"; "`.
    /// Equal-to-bound values do not trigger.
    pub fn evaluate(&self, temperature: f64, humidity: f64) -> Option<String> {
        let mut warnings = Vec::new();

        if temperature < self.temp_min || temperature > self.temp_max {
            warnings.push(format!("Temperature out of range ({temperature:.1}°C)"));
        }

        if humidity < self.hum_min || humidity > self.hum_max {
            warnings.push(format!("Humidity out of range ({humidity:.1}%)"));
        }

        if warnings.is_empty() {
            None
        } else {
            Some(warnings.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_yields_no_warning() {
        let config = ComfortConfig::default();
        assert_eq!(config.evaluate(22.0, 50.0), None);
    }

    #[test]
    fn bounds_are_inclusive() {
        let config = ComfortConfig::default();
        assert_eq!(config.evaluate(18.0, 40.0), None);
        assert_eq!(config.evaluate(25.0, 60.0), None);
    }

    #[test]
    fn temperature_out_of_range() {
        let config = ComfortConfig::default();
        assert_eq!(
            config.evaluate(30.0, 50.0),
            Some("Temperature out of range (30.0°C)".into())
        );
    }

    #[test]
    fn humidity_out_of_range() {
        let config = ComfortConfig::default();
        assert_eq!(
            config.evaluate(22.0, 85.0),
            Some("Humidity out of range (85.0%)".into())
        );
    }

    #[test]
    fn both_out_of_range_mentions_each_once() {
        let config = ComfortConfig::default();
        let warning = config.evaluate(5.0, 95.0).unwrap();
        assert_eq!(
            warning,
            "Temperature out of range (5.0°C); Humidity out of range (95.0%)"
        );
        assert_eq!(warning.matches("Temperature").count(), 1);
        assert_eq!(warning.matches("Humidity").count(), 1);
    }

    #[test]
    fn just_outside_bounds_triggers() {
        let config = ComfortConfig::default();
        assert!(config.evaluate(17.9, 50.0).is_some());
        assert!(config.evaluate(25.1, 50.0).is_some());
        assert!(config.evaluate(22.0, 39.9).is_some());
        assert!(config.evaluate(22.0, 60.1).is_some());
    }
}
