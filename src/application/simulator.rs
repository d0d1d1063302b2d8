// Reading simulator - Demo sensor feed for the HMI panel and dashboards
use crate::application::scheduler::TickTask;
use crate::domain::reading::InboundMessage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// One simulated reading of the whole plant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HmiSample {
    pub water_level: f64,
    pub ph: f64,
    pub turbidity: f64,
    pub conductivity: f64,
    pub pump_active: bool,
}

impl HmiSample {
    /// The pump kicks in when pH drifts out of [6, 8] or the water is cloudy.
    pub fn pump_needed(ph: f64, turbidity: f64) -> bool {
        !(6.0..=8.0).contains(&ph) || turbidity > 7.0
    }
}

pub struct ReadingSimulator {
    rng: StdRng,
}

impl ReadingSimulator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    pub fn sample(&mut self) -> HmiSample {
        let water_level = self.draw(30.0, 100.0);
        let ph = self.draw(5.5, 8.5);
        let turbidity = self.draw(1.0, 10.0);
        let conductivity = self.draw(100.0, 1500.0);
        HmiSample {
            water_level,
            ph,
            turbidity,
            conductivity,
            pump_active: HmiSample::pump_needed(ph, turbidity),
        }
    }

    fn draw(&mut self, min: f64, max: f64) -> f64 {
        (self.rng.random_range(min..max) * 100.0).round() / 100.0
    }
}

/// Emits one simulated sample every `interval` ticks' worth of time.
pub struct SimulatorTask {
    simulator: ReadingSimulator,
    interval: Duration,
    last_emit: Option<Duration>,
    ph_channels: Vec<String>,
    turbidity_channels: Vec<String>,
    queue: mpsc::Sender<InboundMessage>,
    latest: watch::Sender<Option<HmiSample>>,
}

impl SimulatorTask {
    pub fn new(
        simulator: ReadingSimulator,
        interval: Duration,
        ph_channels: Vec<String>,
        turbidity_channels: Vec<String>,
        queue: mpsc::Sender<InboundMessage>,
        latest: watch::Sender<Option<HmiSample>>,
    ) -> Self {
        Self {
            simulator,
            interval,
            last_emit: None,
            ph_channels,
            turbidity_channels,
            queue,
            latest,
        }
    }

    fn messages(&self, sample: &HmiSample) -> Vec<InboundMessage> {
        let ph = self
            .ph_channels
            .iter()
            .map(|channel| InboundMessage::new(channel.clone(), json!({ "value": sample.ph })));
        let turbidity = self
            .turbidity_channels
            .iter()
            .map(|channel| InboundMessage::new(channel.clone(), json!({ "value": sample.turbidity })));
        ph.chain(turbidity).collect()
    }
}

impl TickTask for SimulatorTask {
    fn name(&self) -> &str {
        "simulator"
    }

    fn on_tick(&mut self, now: Duration) {
        let due = match self.last_emit {
            Some(last) => now.saturating_sub(last) >= self.interval,
            None => true,
        };
        if !due {
            return;
        }
        self.last_emit = Some(now);

        let sample = self.simulator.sample();
        tracing::debug!(
            "Simulated sample: pH={} turbidity={} level={} conductivity={} pump={}",
            sample.ph,
            sample.turbidity,
            sample.water_level,
            sample.conductivity,
            sample.pump_active
        );

        for message in self.messages(&sample) {
            if let Err(e) = self.queue.try_send(message) {
                tracing::warn!("Dropping simulated reading: {}", e);
            }
        }
        self.latest.send_replace(Some(sample));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_samples_stay_in_range() {
        let mut simulator = ReadingSimulator::new(Some(7));
        for _ in 0..500 {
            let sample = simulator.sample();
            assert!((30.0..=100.0).contains(&sample.water_level));
            assert!((5.5..=8.5).contains(&sample.ph));
            assert!((1.0..=10.0).contains(&sample.turbidity));
            assert!((100.0..=1500.0).contains(&sample.conductivity));
            assert_eq!(sample.ph, (sample.ph * 100.0).round() / 100.0);
            assert_eq!(sample.pump_active, HmiSample::pump_needed(sample.ph, sample.turbidity));
        }
    }

    #[test]
    fn test_seeded_simulators_agree() {
        let mut a = ReadingSimulator::new(Some(42));
        let mut b = ReadingSimulator::new(Some(42));
        assert_eq!(a.sample(), b.sample());
    }

    #[test]
    fn test_pump_rule() {
        assert!(HmiSample::pump_needed(5.9, 2.0));
        assert!(HmiSample::pump_needed(8.1, 2.0));
        assert!(HmiSample::pump_needed(7.0, 7.5));
        assert!(!HmiSample::pump_needed(7.0, 7.0));
        assert!(!HmiSample::pump_needed(6.0, 1.0));
    }

    #[test]
    fn test_task_emits_on_interval() {
        let (tx, mut rx) = mpsc::channel(16);
        let (latest_tx, latest_rx) = watch::channel(None);
        let mut task = SimulatorTask::new(
            ReadingSimulator::new(Some(1)),
            ms(2500),
            vec!["pH Sensor".into(), "pH Sensor 1".into()],
            vec!["Turbidity Sensor".into()],
            tx,
            latest_tx,
        );

        task.on_tick(ms(0));
        task.on_tick(ms(1000));
        task.on_tick(ms(2499));

        let mut channels = Vec::new();
        while let Ok(message) = rx.try_recv() {
            assert!(message.payload.is_some());
            channels.push(message.channel.unwrap());
        }
        assert_eq!(channels, vec!["pH Sensor", "pH Sensor 1", "Turbidity Sensor"]);
        assert!(latest_rx.borrow().is_some());

        task.on_tick(ms(2500));
        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_full_queue_drops_without_panicking() {
        let (tx, mut rx) = mpsc::channel(1);
        let (latest_tx, _latest_rx) = watch::channel(None);
        let mut task = SimulatorTask::new(
            ReadingSimulator::new(Some(3)),
            ms(10),
            vec!["pH Sensor".into()],
            vec!["Turbidity Sensor".into()],
            tx,
            latest_tx,
        );

        task.on_tick(ms(0));
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
