// Quality scorer - Derives the composite water quality snapshot from channel windows
use crate::domain::channel::ChannelKind;
use crate::domain::quality::{AlertMeasure, QualitySnapshot, ScoringProfile, ScoringThresholds, Trend};
use crate::domain::rolling_buffer::RollingBuffer;

/// Read-only view of one channel's window, tagged with what it measures.
#[derive(Debug, Clone, Copy)]
pub struct ChannelWindow<'a> {
    pub kind: ChannelKind,
    pub values: &'a RollingBuffer<f64>,
}

/// Recomputes the whole snapshot from the current windows. `previous` is the
/// snapshot emitted before this one and only feeds the trend.
pub fn score(
    windows: &[ChannelWindow<'_>],
    profile: ScoringProfile,
    thresholds: &ScoringThresholds,
    previous: Option<&QualitySnapshot>,
) -> QualitySnapshot {
    let avg_ph = pooled_mean(windows, ChannelKind::Ph).unwrap_or(thresholds.ph_neutral);
    let avg_turbidity =
        pooled_mean(windows, ChannelKind::Turbidity).unwrap_or(thresholds.turbidity_default);

    let raw_quality = if windows.iter().all(|w| w.values.is_empty()) {
        thresholds.baseline_quality
    } else {
        composite_quality(avg_ph, avg_turbidity, thresholds)
    };
    let quality_percentage = clamp_percentage(raw_quality, thresholds.baseline_quality);

    let (alerts, alert_measure) = match profile {
        ScoringProfile::SingleSensor => {
            let alerts = if quality_percentage < thresholds.alert_quality_below {
                thresholds.alert_percentage_high
            } else {
                thresholds.alert_percentage_low
            };
            (alerts, AlertMeasure::Percentage)
        }
        ScoringProfile::MultiSensor => (out_of_range_count(windows, thresholds), AlertMeasure::Count),
    };

    let previous_alerts = previous.map(|p| p.alerts).unwrap_or(0);
    let trend = if alerts > previous_alerts { Trend::Up } else { Trend::Down };

    let lost_metric = if quality_percentage < thresholds.lost_quality_below {
        thresholds.lost_metric_high
    } else {
        thresholds.lost_metric_low
    };

    QualitySnapshot {
        quality_percentage,
        alerts,
        alert_measure,
        lost_metric,
        trend,
        avg_ph,
        avg_turbidity,
    }
}

fn composite_quality(avg_ph: f64, avg_turbidity: f64, thresholds: &ScoringThresholds) -> f64 {
    let mut quality = 100.0;
    if !thresholds.ph_in_range(avg_ph) {
        quality -= (avg_ph - thresholds.ph_neutral).abs() * thresholds.ph_penalty_factor;
    }
    if avg_turbidity > thresholds.turbidity_limit {
        quality -= avg_turbidity * thresholds.turbidity_penalty_factor;
    }
    quality
}

/// Rounds into [0, 100]. Overflowed penalties saturate to 0; only NaN falls
/// back to the baseline.
fn clamp_percentage(quality: f64, baseline: f64) -> u8 {
    let value = if quality.is_nan() { baseline } else { quality };
    let value = if value.is_nan() { 100.0 } else { value };
    value.round().clamp(0.0, 100.0) as u8
}

/// Sums `v / count` so that windows of huge readings do not overflow.
fn pooled_mean(windows: &[ChannelWindow<'_>], kind: ChannelKind) -> Option<f64> {
    let count = values_of(windows, kind).count();
    if count == 0 {
        return None;
    }
    let count = count as f64;
    Some(values_of(windows, kind).fold(0.0_f64, |mean, v| mean + v / count))
}

fn values_of<'a>(windows: &'a [ChannelWindow<'a>], kind: ChannelKind) -> impl Iterator<Item = &'a f64> {
    windows
        .iter()
        .filter(move |w| w.kind == kind)
        .flat_map(|w| w.values.iter())
}

fn out_of_range_count(windows: &[ChannelWindow<'_>], thresholds: &ScoringThresholds) -> u32 {
    values_of(windows, ChannelKind::Ph)
        .filter(|v| !thresholds.ph_in_range(**v))
        .count() as u32
}
