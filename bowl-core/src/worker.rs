//! # Analysis Worker
//!
//! Runs a [`TunerPipeline`] on a dedicated thread fed over crossbeam channels.
//! The capture side pushes frames without ever blocking. A frame is only
//! accepted while the worker is idle, so nothing waits behind the frame being
//! analysed. Outcomes come back on their own bounded channel in frame order.
//!
//! ## Lifecycle
//! - `spawn` builds the pipeline on the worker thread
//! - `set_reference_pitch` takes effect from the next processed frame
//! - `stop` halts delivery, resets the pipeline and joins the thread

use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow};
use crossbeam_channel::{Receiver, Sender, TrySendError, select};
use log::{debug, error, info};

use crate::config::PipelineConfig;
use crate::frame::AudioFrame;
use crate::pipeline::{TunerOutcome, TunerPipeline};

/// Outcomes held for the host before newer ones are dropped.
pub const OUTCOME_QUEUE_DEPTH: usize = 4;

enum Control {
    SetReference(f32),
    Stop,
}

pub struct AnalysisWorker {
    frame_tx: Sender<AudioFrame>,
    control_tx: Sender<Control>,
    outcome_rx: Receiver<TunerOutcome>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    /// Starts the analysis thread.
    ///
    /// # Arguments
    /// * `config` - Pipeline configuration, validated before the thread starts
    /// * `a4_hz` - Initial reference pitch
    pub fn spawn(config: PipelineConfig, a4_hz: f32) -> Result<Self> {
        config.validate()?;
        // Zero capacity: a frame is handed over only while the worker waits for one.
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<AudioFrame>(0);
        let (control_tx, control_rx) = crossbeam_channel::unbounded::<Control>();
        let (outcome_tx, outcome_rx) =
            crossbeam_channel::bounded::<TunerOutcome>(OUTCOME_QUEUE_DEPTH);

        let thread_handle = thread::Builder::new()
            .name("bowl-analysis".into())
            .spawn(move || {
                let mut pipeline = match TunerPipeline::new(config) {
                    Ok(pipeline) => pipeline,
                    Err(e) => {
                        error!("[WORKER] Could not build pipeline: {e:#}");
                        return;
                    }
                };
                info!("[WORKER] Analysis thread started");
                let mut a4 = a4_hz;
                loop {
                    select! {
                        recv(control_rx) -> msg => match msg {
                            Ok(Control::SetReference(hz)) => a4 = hz,
                            Ok(Control::Stop) | Err(_) => break,
                        },
                        recv(frame_rx) -> msg => match msg {
                            Ok(frame) => {
                                // Apply any settings that arrived alongside this frame.
                                if !drain_controls(&control_rx, &mut a4) {
                                    break;
                                }
                                let outcome = pipeline.process(frame, a4);
                                match outcome_tx.try_send(outcome) {
                                    Ok(()) => {}
                                    Err(TrySendError::Full(_)) => {
                                        debug!("[WORKER] Outcome queue full, dropping outcome");
                                    }
                                    Err(TrySendError::Disconnected(_)) => {
                                        debug!("[WORKER] Outcome receiver dropped");
                                        break;
                                    }
                                }
                            }
                            Err(_) => break,
                        },
                    }
                }
                pipeline.reset();
                info!("[WORKER] Analysis thread finished");
            })?;

        Ok(Self {
            frame_tx,
            control_tx,
            outcome_rx,
            thread_handle: Some(thread_handle),
        })
    }

    /// Hands a frame to the worker without blocking.
    ///
    /// Returns `false` if the frame was dropped because the worker is still
    /// busy with the previous frame or has stopped.
    pub fn push_frame(&self, frame: AudioFrame) -> bool {
        match self.frame_tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("[WORKER] Worker busy, dropping frame");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Updates A4; frames processed after this call use the new value.
    pub fn set_reference_pitch(&self, a4_hz: f32) {
        let _ = self.control_tx.send(Control::SetReference(a4_hz));
    }

    pub fn outcomes(&self) -> &Receiver<TunerOutcome> {
        &self.outcome_rx
    }

    /// Stops the stream and waits for the thread to finish.
    ///
    /// A frame already being analysed finishes before the thread exits.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        let Some(handle) = self.thread_handle.take() else {
            return Ok(());
        };
        let _ = self.control_tx.send(Control::Stop);
        handle
            .join()
            .map_err(|_| anyhow!("analysis thread panicked"))
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// Applies pending control messages. Returns `false` if a stop was requested.
fn drain_controls(control_rx: &Receiver<Control>, a4: &mut f32) -> bool {
    while let Ok(msg) = control_rx.try_recv() {
        match msg {
            Control::SetReference(hz) => *a4 = hz,
            Control::Stop => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use crate::config::{DEFAULT_A4_HZ, DEFAULT_SAMPLE_RATE, FRAME_SIZE};
    use crate::pitch::tests::sine;
    use crate::tuning::NoteName;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn frame(freq: f32) -> AudioFrame {
        AudioFrame::new(
            sine(freq, DEFAULT_SAMPLE_RATE, FRAME_SIZE, 0.5),
            DEFAULT_SAMPLE_RATE,
        )
    }

    /// Retries until the worker is idle and takes the frame.
    fn hand_over(worker: &AnalysisWorker, frame: AudioFrame) {
        let deadline = Instant::now() + TIMEOUT;
        while !worker.push_frame(frame.clone()) {
            assert!(Instant::now() < deadline, "worker never became idle");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn frames_flow_through_to_outcomes() {
        let worker = AnalysisWorker::spawn(PipelineConfig::default(), DEFAULT_A4_HZ).unwrap();
        hand_over(&worker, frame(440.0));
        let outcome = worker.outcomes().recv_timeout(TIMEOUT).unwrap();
        assert_eq!(outcome.reading.unwrap().name, NoteName::A);
        worker.stop().unwrap();
    }

    #[test]
    fn reference_pitch_reaches_the_next_frame() {
        let worker = AnalysisWorker::spawn(PipelineConfig::default(), 440.0).unwrap();
        worker.set_reference_pitch(432.0);
        hand_over(&worker, frame(432.0));
        let reading = worker.outcomes().recv_timeout(TIMEOUT).unwrap().reading.unwrap();
        assert!(reading.cents_offset.abs() < 5.0);
        worker.stop().unwrap();
    }

    #[test]
    fn frames_are_not_queued_behind_a_busy_worker() {
        let worker = AnalysisWorker::spawn(PipelineConfig::default(), DEFAULT_A4_HZ).unwrap();
        let burst: Vec<AudioFrame> = (0..8).map(|_| frame(440.0)).collect();

        hand_over(&worker, frame(440.0));
        // The worker is analysing; a tight burst finds it busy almost every time,
        // and nothing is parked for later.
        let accepted = burst.into_iter().filter(|f| worker.push_frame(f.clone())).count();
        assert!(accepted < 3, "{accepted} frames slipped past a busy worker");

        for _ in 0..1 + accepted {
            assert!(worker.outcomes().recv_timeout(TIMEOUT).is_ok());
        }
        assert!(worker.outcomes().recv_timeout(Duration::from_millis(200)).is_err());
        worker.stop().unwrap();
    }

    #[test]
    fn unread_outcomes_are_capped() {
        let worker = AnalysisWorker::spawn(PipelineConfig::default(), DEFAULT_A4_HZ).unwrap();
        // Each handoff waits until the previous frame has been fully analysed.
        for _ in 0..OUTCOME_QUEUE_DEPTH + 3 {
            hand_over(&worker, frame(440.0));
        }
        assert_eq!(worker.outcomes().len(), OUTCOME_QUEUE_DEPTH);
        worker.stop().unwrap();
    }

    #[test]
    fn drain_stops_on_stop_request() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(Control::SetReference(415.0)).unwrap();
        let mut a4 = 440.0;
        assert!(drain_controls(&rx, &mut a4));
        assert_eq!(a4, 415.0);

        tx.send(Control::Stop).unwrap();
        assert!(!drain_controls(&rx, &mut a4));
    }

    #[test]
    fn invalid_config_fails_to_spawn() {
        let config = PipelineConfig {
            min_freq_hz: -1.0,
            ..PipelineConfig::default()
        };
        assert!(AnalysisWorker::spawn(config, DEFAULT_A4_HZ).is_err());
    }
}
