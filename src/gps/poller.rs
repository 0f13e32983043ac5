// src/gps/poller.rs
//! Background polling of an HTTP GPS device

use super::data::{parse_gps_payload, GpsData, GpsReading};
use crate::error::{MapError, Result};
use log::{debug, error, info, warn};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::{sync::Notify, task::JoinHandle};

/// Shortest wait between two requests to the device
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Polling parameters
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub url: String,
    pub interval: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl PollSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(1),
            user_agent: crate::map::DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Configured interval, never shorter than [`MIN_POLL_INTERVAL`]
    pub fn poll_interval(&self) -> Duration {
        self.interval.max(MIN_POLL_INTERVAL)
    }
}

/// Shared handle to the latest GPS fix. Cloning shares the same state.
#[derive(Clone)]
pub struct GpsPoller {
    data: Arc<Mutex<GpsData>>,
    dirty: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl GpsPoller {
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(GpsData::new())),
            dirty: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(true)),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Spawn the polling task on the current tokio runtime
    pub fn start(&self, settings: PollSettings) -> JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move { poller.run(settings).await })
    }

    async fn run(self, settings: PollSettings) {
        let client = match reqwest::Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(settings.request_timeout)
            // The device sits on the local network
            .no_proxy()
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to create GPS HTTP client: {}", e);
                self.publish_error(format!("HTTP client error: {}", e));
                return;
            }
        };

        let interval = settings.poll_interval();
        info!("Polling GPS at {} every {:?}", settings.url, interval);

        while self.running.load(Ordering::Relaxed) {
            match fetch_reading(&client, &settings.url).await {
                Ok(reading) => {
                    debug!("GPS reading: {:?}", reading);
                    self.publish(&reading);
                }
                Err(e) => {
                    warn!("GPS unavailable: {}", e);
                    self.publish_error(e.to_string());
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = self.wake.notified() => {}
            }
        }

        debug!("GPS poller stopped");
    }

    fn publish(&self, reading: &GpsReading) {
        self.data.lock().unwrap().apply(reading);
        self.dirty.store(true, Ordering::Release);
    }

    fn publish_error(&self, reason: String) {
        self.data.lock().unwrap().mark_unavailable(reason);
        self.dirty.store(true, Ordering::Release);
    }

    /// Latest data if it changed since the previous call
    pub fn take_update(&self) -> Option<GpsData> {
        if self.dirty.swap(false, Ordering::AcqRel) {
            Some(self.snapshot())
        } else {
            None
        }
    }

    /// Latest data regardless of the dirty flag
    pub fn snapshot(&self) -> GpsData {
        self.data.lock().unwrap().clone()
    }

    /// Stop polling; an in-flight request is allowed to finish
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        self.wake.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Default for GpsPoller {
    fn default() -> Self {
        Self::new()
    }
}

/// Perform a single GET against the device and parse the response
pub async fn fetch_reading(client: &reqwest::Client, url: &str) -> Result<GpsReading> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| MapError::Network(format!("Failed to reach GPS at {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(MapError::Network(format!("GPS HTTP error: {}", response.status())));
    }

    let body = response
        .text()
        .await
        .map_err(|e| MapError::Network(format!("Failed to read GPS response: {}", e)))?;
    parse_gps_payload(&body)
}
