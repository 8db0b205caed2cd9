use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::error::TrackerError;
use crate::predict::{
    position_at, GroundStation, PositionSource, PredictError, Satellite, Topocentric,
};
use crate::sampler::{round_angle, round_azimuth, Sample};

const CHANNEL_CAPACITY: usize = 16;

/// A satellite and station owned together, so the pair can move into the
/// polling task.
#[derive(Debug)]
pub struct TrackedSatellite {
    pub satellite: Satellite,
    pub station: GroundStation,
}

impl PositionSource for TrackedSatellite {
    fn position_at(&self, timestamp: DateTime<Utc>) -> Result<Topocentric, PredictError> {
        position_at(&self.satellite, &self.station, timestamp)
    }
}

/// One live position report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub sample: Sample,
    /// Positive while the satellite recedes from the station.
    pub range_rate_km_s: f64,
}

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<Result<(), TrackerError>>,
}

/// Reports the current position of one satellite at a fixed period until
/// stopped.
#[derive(Debug, Default)]
pub struct LiveTracker {
    worker: Option<WorkerHandle>,
}

impl LiveTracker {
    pub fn new() -> Self {
        Self { worker: None }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map(|w| !w.join.is_finished())
            .unwrap_or(false)
    }

    /// Spawn the polling task. Readings arrive on the returned channel, which
    /// closes when the task ends.
    pub fn start<P>(
        &mut self,
        source: P,
        period: Duration,
    ) -> Result<mpsc::Receiver<Reading>, TrackerError>
    where
        P: PositionSource + Send + Sync + 'static,
    {
        if self.worker.is_some() {
            return Err(TrackerError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let (reading_tx, reading_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let join = tokio::spawn(async move {
            let result = run_polling_loop(source, period, reading_tx, stop_rx).await;
            if let Err(e) = &result {
                log::error!("Live tracking stopped: {}", e);
            }
            result
        });

        self.worker = Some(WorkerHandle { stop_tx, join });
        Ok(reading_rx)
    }

    /// Signal the task to stop and wait for it. Returns the task's error if
    /// it had already failed.
    pub async fn stop(&mut self) -> Result<(), TrackerError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let _ = worker.stop_tx.send(());
        worker
            .join
            .await
            .map_err(|e| TrackerError::Worker(e.to_string()))?
    }
}

async fn run_polling_loop<P: PositionSource>(
    source: P,
    period: Duration,
    reading_tx: mpsc::Sender<Reading>,
    mut stop_rx: oneshot::Receiver<()>,
) -> Result<(), TrackerError> {
    loop {
        let timestamp = Utc::now();
        let position = source.position_at(timestamp)?;
        let reading = Reading {
            sample: Sample {
                timestamp,
                altitude_deg: round_angle(position.altitude_deg),
                azimuth_deg: round_azimuth(position.azimuth_deg),
                range_km: position.range_km,
            },
            range_rate_km_s: position.range_rate_km_s,
        };

        if reading_tx.send(reading).await.is_err() {
            log::debug!("Reading receiver dropped, stopping tracker");
            return Ok(());
        }

        let should_stop = tokio::select! {
            _ = sleep(period) => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            return Ok(());
        }
    }
}
