// Water quality snapshot domain model
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
}

/// How the `alerts` figure of a snapshot should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertMeasure {
    Percentage,
    Count,
}

/// Which dashboard flavour is being scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringProfile {
    /// One pH and one turbidity channel; alerts are a percentage band.
    SingleSensor,
    /// Several pH channels; alerts count out-of-range readings.
    MultiSensor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitySnapshot {
    pub quality_percentage: u8,
    pub alerts: u32,
    pub alert_measure: AlertMeasure,
    pub lost_metric: u32,
    pub trend: Trend,
    pub avg_ph: f64,
    pub avg_turbidity: f64,
}

/// Scoring constants. Defaults are the stock thresholds for drinking water.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringThresholds {
    pub ph_min: f64,
    pub ph_max: f64,
    pub ph_neutral: f64,
    pub ph_penalty_factor: f64,
    pub turbidity_default: f64,
    pub turbidity_limit: f64,
    pub turbidity_penalty_factor: f64,
    pub baseline_quality: f64,
    pub alert_quality_below: u8,
    pub alert_percentage_high: u32,
    pub alert_percentage_low: u32,
    pub lost_quality_below: u8,
    pub lost_metric_high: u32,
    pub lost_metric_low: u32,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            ph_min: 6.5,
            ph_max: 8.5,
            ph_neutral: 7.0,
            ph_penalty_factor: 10.0,
            turbidity_default: 0.0,
            turbidity_limit: 1.0,
            turbidity_penalty_factor: 5.0,
            baseline_quality: 100.0,
            alert_quality_below: 70,
            alert_percentage_high: 25,
            alert_percentage_low: 15,
            lost_quality_below: 60,
            lost_metric_high: 8,
            lost_metric_low: 4,
        }
    }
}

impl ScoringThresholds {
    pub fn ph_in_range(&self, ph: f64) -> bool {
        ph >= self.ph_min && ph <= self.ph_max
    }
}
