//! Simulated live detection pipeline.
//!
//! One actor task owns the camera flag, the detection/liveness state and the
//! attendance log. The tick generator and every one-shot delay are separate
//! tasks that only post [`Timer`] messages back to the actor, so all state
//! changes happen in one place.
//!
//! Switching the camera off stops the tick generator. One-shot timers from a
//! cycle already in flight keep running unless
//! [`PipelineSettings::cancel_pending_on_stop`] is set, so a late liveness
//! step or record can still land after the camera is off.

use presence_core::{
    classify, AttendanceLog, AttendanceRecord, Branching, DetectionOutcome, DetectionState, Draw,
    LivenessState, Roster, StatusCounts, StudentProfile, Subject,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

const EVENT_CAPACITY: usize = 64;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("pipeline task exited")]
    ChannelClosed,
}

/// Timings and branch cut points of a detection cycle.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub tick_interval: Duration,
    pub scan_delay: Duration,
    pub blink_hold: Duration,
    pub smile_hold: Duration,
    pub reset_delay: Duration,
    pub branching: Branching,
    pub cancel_pending_on_stop: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(3000),
            scan_delay: Duration::from_millis(2000),
            blink_hold: Duration::from_millis(2000),
            smile_hold: Duration::from_millis(1500),
            reset_delay: Duration::from_millis(4000),
            branching: Branching::default(),
            cancel_pending_on_stop: false,
        }
    }
}

/// State changes published to subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum PipelineEvent {
    Camera { on: bool },
    Detection { state: DetectionState },
    Liveness { state: LivenessState },
    Recorded { record: AttendanceRecord },
}

/// Point-in-time view of the live screen.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub camera_on: bool,
    pub processing: bool,
    pub detection: DetectionState,
    pub liveness: LivenessState,
    pub counts: StatusCounts,
    pub records: usize,
}

/// Messages sent from handles to the pipeline task.
enum Request {
    SetCamera {
        on: bool,
        reply: oneshot::Sender<bool>,
    },
    ToggleCamera {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    Records {
        reply: oneshot::Sender<Vec<AttendanceRecord>>,
    },
}

/// Messages posted by timer tasks.
enum Timer {
    Tick,
    ScanComplete,
    Smile(StudentProfile),
    Passed(StudentProfile),
    Reset,
}

/// Clone-safe handle to the pipeline task.
#[derive(Clone)]
pub struct PipelineHandle {
    tx: mpsc::Sender<Request>,
    events: broadcast::Sender<PipelineEvent>,
}

impl PipelineHandle {
    /// Flip the camera flag. Returns the new value.
    pub async fn toggle_camera(&self) -> Result<bool, PipelineError> {
        self.call(|reply| Request::ToggleCamera { reply }).await
    }

    /// Set the camera flag explicitly. Returns the new value.
    pub async fn set_camera(&self, on: bool) -> Result<bool, PipelineError> {
        self.call(|reply| Request::SetCamera { on, reply }).await
    }

    pub async fn snapshot(&self) -> Result<Snapshot, PipelineError> {
        self.call(|reply| Request::Snapshot { reply }).await
    }

    /// The attendance log, newest first.
    pub async fn records(&self) -> Result<Vec<AttendanceRecord>, PipelineError> {
        self.call(|reply| Request::Records { reply }).await
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, PipelineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| PipelineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| PipelineError::ChannelClosed)
    }
}

/// Spawn the pipeline on the current tokio runtime with the camera off.
///
/// The task exits once every handle has been dropped.
pub fn spawn_pipeline<R>(
    settings: PipelineSettings,
    roster: R,
    draw: Box<dyn Draw + Send>,
) -> PipelineHandle
where
    R: Roster + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<Request>(16);
    let (timer_tx, timer_rx) = mpsc::unbounded_channel::<Timer>();
    let (events, _) = broadcast::channel(EVENT_CAPACITY);

    let pipeline = Pipeline {
        settings,
        roster,
        draw,
        log: AttendanceLog::new(),
        camera_on: false,
        processing: false,
        detection: DetectionState::Idle,
        liveness: LivenessState::Pending,
        timer_tx,
        ticker: None,
        pending: Vec::new(),
        events: events.clone(),
    };
    tokio::spawn(pipeline.run(rx, timer_rx));

    PipelineHandle { tx, events }
}

struct Pipeline<R> {
    settings: PipelineSettings,
    roster: R,
    draw: Box<dyn Draw + Send>,
    log: AttendanceLog,
    camera_on: bool,
    processing: bool,
    detection: DetectionState,
    liveness: LivenessState,
    timer_tx: mpsc::UnboundedSender<Timer>,
    ticker: Option<JoinHandle<()>>,
    pending: Vec<JoinHandle<()>>,
    events: broadcast::Sender<PipelineEvent>,
}

impl<R: Roster> Pipeline<R> {
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<Request>,
        mut timer_rx: mpsc::UnboundedReceiver<Timer>,
    ) {
        tracing::info!("pipeline started");
        loop {
            tokio::select! {
                req = rx.recv() => match req {
                    Some(req) => self.handle_request(req),
                    None => break,
                },
                Some(timer) = timer_rx.recv() => self.handle_timer(timer),
            }
        }
        self.stop_ticks();
        self.abort_pending();
        tracing::info!(records = self.log.len(), "pipeline exiting");
    }

    fn handle_request(&mut self, req: Request) {
        match req {
            Request::SetCamera { on, reply } => {
                self.set_camera(on);
                let _ = reply.send(self.camera_on);
            }
            Request::ToggleCamera { reply } => {
                self.set_camera(!self.camera_on);
                let _ = reply.send(self.camera_on);
            }
            Request::Snapshot { reply } => {
                let _ = reply.send(Snapshot {
                    camera_on: self.camera_on,
                    processing: self.processing,
                    detection: self.detection.clone(),
                    liveness: self.liveness,
                    counts: self.log.counts(),
                    records: self.log.len(),
                });
            }
            Request::Records { reply } => {
                let _ = reply.send(self.log.records().cloned().collect());
            }
        }
    }

    fn handle_timer(&mut self, timer: Timer) {
        match timer {
            Timer::Tick => self.on_tick(),
            Timer::ScanComplete => self.on_scan_complete(),
            Timer::Smile(student) => {
                self.set_liveness(LivenessState::Smile);
                self.schedule(self.settings.smile_hold, Timer::Passed(student));
            }
            Timer::Passed(student) => {
                self.set_liveness(LivenessState::Passed);
                self.emit(Subject::Student(&student));
            }
            Timer::Reset => {
                self.set_detection(DetectionState::Idle);
                self.set_liveness(LivenessState::Pending);
            }
        }
    }

    fn set_camera(&mut self, on: bool) {
        if on == self.camera_on {
            return;
        }
        self.camera_on = on;
        tracing::info!(on, "camera toggled");
        self.publish(PipelineEvent::Camera { on });

        if on {
            self.start_ticks();
        } else {
            self.stop_ticks();
            self.set_detection(DetectionState::Idle);
            self.set_liveness(LivenessState::Pending);
            if self.settings.cancel_pending_on_stop {
                self.abort_pending();
                self.processing = false;
            }
        }
    }

    fn on_tick(&mut self) {
        // A tick queued just before the generator was aborted.
        if !self.camera_on {
            return;
        }
        if self.processing {
            tracing::debug!("tick dropped: cycle in flight");
            return;
        }
        self.processing = true;
        self.set_detection(DetectionState::Scanning);
        self.schedule(self.settings.scan_delay, Timer::ScanComplete);
    }

    fn on_scan_complete(&mut self) {
        let outcome = classify(self.draw.as_mut(), &self.roster, self.settings.branching);
        tracing::debug!(outcome = outcome.state().label(), "scan complete");
        self.set_detection(outcome.state());

        match outcome {
            DetectionOutcome::Detected {
                student,
                confidence,
            } => {
                tracing::info!(
                    enrollment_id = %student.enrollment_id,
                    confidence,
                    "face recognized; starting liveness check"
                );
                self.set_liveness(LivenessState::Blink);
                self.schedule(self.settings.blink_hold, Timer::Smile(student));
            }
            DetectionOutcome::Unknown => {
                self.set_liveness(LivenessState::Failed);
                self.emit(Subject::Unknown);
            }
            DetectionOutcome::Spoof => {
                tracing::warn!("spoof attempt detected");
                self.set_liveness(LivenessState::Failed);
                self.emit(Subject::Spoof);
            }
        }

        self.processing = false;
        self.schedule(self.settings.reset_delay, Timer::Reset);
    }

    fn emit(&mut self, subject: Subject<'_>) {
        let record = self.log.emit(subject).clone();
        self.publish(PipelineEvent::Recorded { record });
    }

    fn set_detection(&mut self, state: DetectionState) {
        if self.detection != state {
            self.detection = state.clone();
            self.publish(PipelineEvent::Detection { state });
        }
    }

    fn set_liveness(&mut self, state: LivenessState) {
        if self.liveness != state {
            self.liveness = state;
            self.publish(PipelineEvent::Liveness { state });
        }
    }

    fn publish(&self, event: PipelineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn start_ticks(&mut self) {
        let tx = self.timer_tx.clone();
        let period = self.settings.tick_interval;
        self.ticker = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                if tx.send(Timer::Tick).is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_ticks(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn schedule(&mut self, delay: Duration, timer: Timer) {
        let tx = self.timer_tx.clone();
        self.pending.retain(|h| !h.is_finished());
        self.pending.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(timer);
        }));
    }

    fn abort_pending(&mut self) {
        let n = self.pending.len();
        for handle in self.pending.drain(..) {
            handle.abort();
        }
        if n > 0 {
            tracing::debug!(count = n, "pending timers aborted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_core::{Directory, RecordStatus};
    use tokio::time::sleep;

    /// Replays `values` in a loop.
    struct Cycle {
        values: Vec<f64>,
        next: usize,
    }

    impl Draw for Cycle {
        fn unit(&mut self) -> f64 {
            let v = self.values[self.next % self.values.len()];
            self.next += 1;
            v
        }
    }

    fn spawn_with(values: &[f64], settings: PipelineSettings) -> PipelineHandle {
        let draw = Cycle {
            values: values.to_vec(),
            next: 0,
        };
        spawn_pipeline(settings, Directory::demo().clone(), Box::new(draw))
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    // Script for a recognized Drishti Butani at 90% confidence.
    const DRISHTI: [f64; 3] = [0.1, 0.3, 0.5];

    #[tokio::test(start_paused = true)]
    async fn test_camera_off_never_records() {
        let handle = spawn_with(&[0.7], PipelineSettings::default());
        sleep(Duration::from_secs(30)).await;

        let snap = handle.snapshot().await.unwrap();
        assert!(!snap.camera_on);
        assert_eq!(snap.detection, DetectionState::Idle);
        assert_eq!(snap.liveness, LivenessState::Pending);
        assert!(handle.records().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_detected_cycle_timeline() {
        let handle = spawn_with(&DRISHTI, PipelineSettings::default());
        assert!(handle.toggle_camera().await.unwrap());

        sleep(ms(2900)).await;
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.detection, DetectionState::Idle);

        sleep(ms(600)).await; // t = 3.5s
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.detection, DetectionState::Scanning);
        assert!(snap.processing);

        sleep(ms(2000)).await; // t = 5.5s
        let snap = handle.snapshot().await.unwrap();
        match &snap.detection {
            DetectionState::Detected {
                student,
                confidence,
            } => {
                assert_eq!(student.enrollment_id, "CS2021002");
                assert_eq!(*confidence, 90);
            }
            other => panic!("expected detection, got {other:?}"),
        }
        assert_eq!(snap.liveness, LivenessState::Blink);
        assert!(!snap.processing);
        assert_eq!(snap.records, 0);

        sleep(ms(3200)).await; // t = 8.7s
        let records = handle.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RecordStatus::Present);
        assert_eq!(records[0].name, "Drishti Butani");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_records_immediately() {
        let handle = spawn_with(&[0.7], PipelineSettings::default());
        handle.set_camera(true).await.unwrap();
        sleep(ms(5500)).await;

        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.detection, DetectionState::Unknown);
        assert_eq!(snap.liveness, LivenessState::Failed);
        let records = handle.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Unknown Person");
        assert_eq!(records[0].enrollment_id, "N/A");
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_newest_first() {
        let handle = spawn_with(&[0.7, 0.95], PipelineSettings::default());
        handle.set_camera(true).await.unwrap();
        sleep(ms(8500)).await;

        let statuses: Vec<RecordStatus> = handle
            .records()
            .await
            .unwrap()
            .iter()
            .map(|r| r.status)
            .collect();
        assert_eq!(statuses, [RecordStatus::Spoof, RecordStatus::Unknown]);

        let counts = handle.snapshot().await.unwrap().counts;
        assert_eq!((counts.present, counts.unknown, counts.spoof), (0, 1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_dropped_while_processing() {
        let settings = PipelineSettings {
            tick_interval: ms(1000),
            scan_delay: ms(2500),
            ..Default::default()
        };
        let handle = spawn_with(&[0.7], settings);
        handle.set_camera(true).await.unwrap();

        // Cycle starts at 1s, ticks at 2s and 3s are dropped, outcome at 3.5s.
        sleep(ms(5000)).await;
        assert_eq!(handle.records().await.unwrap().len(), 1);

        // Next cycle starts at 4s, outcome at 6.5s.
        sleep(ms(1600)).await;
        assert_eq!(handle.records().await.unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_camera_off_leaves_inflight_timers_running() {
        let handle = spawn_with(&DRISHTI, PipelineSettings::default());
        handle.set_camera(true).await.unwrap();
        sleep(ms(5500)).await;

        assert!(!handle.toggle_camera().await.unwrap());
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.detection, DetectionState::Idle);
        assert_eq!(snap.liveness, LivenessState::Pending);

        // The smile step of the earlier cycle still lands at 7s.
        sleep(ms(2000)).await;
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.liveness, LivenessState::Smile);

        sleep(ms(12_500)).await;
        let records = handle.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RecordStatus::Present);
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.detection, DetectionState::Idle);
        assert_eq!(snap.liveness, LivenessState::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending_on_stop() {
        let settings = PipelineSettings {
            cancel_pending_on_stop: true,
            ..Default::default()
        };
        let handle = spawn_with(&DRISHTI, settings);
        handle.set_camera(true).await.unwrap();
        sleep(ms(5500)).await;
        handle.set_camera(false).await.unwrap();

        sleep(Duration::from_secs(20)).await;
        assert!(handle.records().await.unwrap().is_empty());
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.liveness, LivenessState::Pending);
        assert!(!snap.processing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_published() {
        let handle = spawn_with(&[0.95], PipelineSettings::default());
        let mut events = handle.subscribe();
        handle.set_camera(true).await.unwrap();
        sleep(ms(5500)).await;

        let mut seen = Vec::new();
        while let Ok(ev) = events.try_recv() {
            seen.push(ev);
        }
        assert!(matches!(seen[0], PipelineEvent::Camera { on: true }));
        let scanning = seen.iter().any(|e| match e {
            PipelineEvent::Detection { state } => *state == DetectionState::Scanning,
            _ => false,
        });
        assert!(scanning);
        let spoofed = seen.iter().any(|e| match e {
            PipelineEvent::Recorded { record } => record.status == RecordStatus::Spoof,
            _ => false,
        });
        assert!(spoofed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_returns_to_idle_after_delay() {
        let settings = PipelineSettings {
            tick_interval: Duration::from_secs(60),
            ..Default::default()
        };
        let handle = spawn_with(&[0.7], settings);
        handle.set_camera(true).await.unwrap();

        // Scan at 60s, unknown outcome at 62s, reset due at 66s.
        sleep(ms(65_900)).await;
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.detection, DetectionState::Unknown);
        assert_eq!(snap.liveness, LivenessState::Failed);

        sleep(ms(200)).await;
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.detection, DetectionState::Idle);
        assert_eq!(snap.liveness, LivenessState::Pending);
        assert_eq!(snap.records, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_reset_clears_next_cycle() {
        let settings = PipelineSettings {
            reset_delay: ms(3500),
            ..Default::default()
        };
        // Cycle 1 is an unknown face, cycle 2 recognizes Drishti Butani.
        let handle = spawn_with(&[0.7, 0.1, 0.3, 0.5], settings);
        handle.set_camera(true).await.unwrap();

        // Cycle 1: outcome at 5s, reset at 8.5s. Cycle 2: tick at 6s, outcome at 8s.
        sleep(ms(8200)).await;
        let snap = handle.snapshot().await.unwrap();
        assert!(matches!(snap.detection, DetectionState::Detected { .. }));
        assert_eq!(snap.liveness, LivenessState::Blink);

        sleep(ms(500)).await;
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.detection, DetectionState::Idle);
        assert_eq!(snap.liveness, LivenessState::Pending);

        // Cycle 2's liveness steps still run over cycle 3's scan.
        sleep(ms(1400)).await;
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.detection, DetectionState::Scanning);
        assert_eq!(snap.liveness, LivenessState::Smile);
    }

    #[tokio::test]
    async fn test_clone_keeps_pipeline_alive() {
        let handle = spawn_with(&[0.7], PipelineSettings::default());
        let clone = handle.clone();
        drop(handle);
        // A live clone keeps the task running.
        assert!(clone.snapshot().await.is_ok());
    }
}
