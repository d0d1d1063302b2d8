// Tick scheduler - Single time source for the animation and the simulator
use crate::domain::animation::ProgressAnimator;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Work driven by the shared tick. `now` is the offset from the scheduler's
/// origin, so tests can feed synthetic time.
pub trait TickTask: Send {
    fn name(&self) -> &str;
    fn on_tick(&mut self, now: Duration);
}

#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<Box<dyn TickTask>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, task: Box<dyn TickTask>) {
        tracing::debug!("Registered tick task {}", task.name());
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn tick(&mut self, now: Duration) {
        for task in self.tasks.iter_mut() {
            task.on_tick(now);
        }
    }

    /// Ticks every `period` forever. Late ticks are skipped rather than
    /// replayed in a burst.
    pub async fn run(mut self, period: Duration) {
        let origin = Instant::now();
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!("Scheduler running {} tasks every {:?}", self.len(), period);
        loop {
            let instant = interval.tick().await;
            self.tick(instant.duration_since(origin));
        }
    }
}

/// Animates one dashboard's quality gauge toward the latest published target.
pub struct AnimatorTask {
    name: String,
    animator: ProgressAnimator,
    target: watch::Receiver<f64>,
    primed: bool,
    output: watch::Sender<f64>,
}

impl AnimatorTask {
    pub fn new(
        name: impl Into<String>,
        animator: ProgressAnimator,
        target: watch::Receiver<f64>,
        output: watch::Sender<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            animator,
            target,
            primed: false,
            output,
        }
    }
}

impl TickTask for AnimatorTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_tick(&mut self, now: Duration) {
        // Only the latest scalar matters; intermediate targets are skipped.
        if !self.primed || self.target.has_changed().unwrap_or(false) {
            let target = *self.target.borrow_and_update();
            self.animator.set_target(target, now);
            self.primed = true;
        } else if self.animator.is_finished(now) && self.animator.current() == self.animator.target() {
            // Already published the final value.
            return;
        }

        let value = self.animator.tick(now);
        self.output.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}
