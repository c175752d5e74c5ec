//! A scanning session at one gate.

use std::sync::Arc;

use domain::models::{ReconcileReport, ScanRequest, ScanResponse};
use domain::services::{Clock, SystemClock};
use tracing::{info, warn};

use crate::api::{CheckInApi, ClientError};
use crate::buffer::{Enqueued, OfflineBuffer};

/// What happened to a presented code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presented {
    /// The service decided the scan.
    Online(ScanResponse),
    /// The service was unreachable; the scan waits in the offline buffer.
    Queued,
    /// Unreachable, and this ticket is already waiting in the buffer.
    AlreadyQueued,
}

/// Drives scans for one gate, falling back to the offline buffer.
pub struct GateSession<A> {
    api: A,
    gate_name: String,
    device_info: Option<String>,
    buffer: OfflineBuffer,
    clock: Arc<dyn Clock>,
}

impl<A: CheckInApi> GateSession<A> {
    pub fn new(api: A, gate_name: impl Into<String>) -> Self {
        Self {
            api,
            gate_name: gate_name.into(),
            device_info: None,
            buffer: OfflineBuffer::new(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_device_info(mut self, device_info: impl Into<String>) -> Self {
        self.device_info = Some(device_info.into());
        self
    }

    /// Resumes with a buffer restored from device storage.
    pub fn with_buffer(mut self, buffer: OfflineBuffer) -> Self {
        self.buffer = buffer;
        self
    }

    /// Device clock used to stamp offline scans.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn buffer(&self) -> &OfflineBuffer {
        &self.buffer
    }

    /// Presents a scanned code to the service, queueing it if the service
    /// cannot be reached. Non-transport errors are returned and nothing is
    /// queued.
    pub async fn present(&mut self, qr: &str) -> Result<Presented, ClientError> {
        let request = ScanRequest {
            ticket_identifier: qr.to_string(),
            gate_name: self.gate_name.clone(),
            scanned_offline: false,
            device_info: self.device_info.clone(),
        };

        match self.api.scan(&request).await {
            Ok(response) => Ok(Presented::Online(response)),
            Err(e) if e.is_transport() => {
                warn!(gate = %self.gate_name, error = %e, "Check-in service unreachable, buffering scan");
                let scanned_at = self.clock.now();
                match self.buffer.enqueue(
                    qr,
                    &self.gate_name,
                    scanned_at,
                    self.device_info.clone(),
                ) {
                    Enqueued::Queued => Ok(Presented::Queued),
                    Enqueued::AlreadyQueued => Ok(Presented::AlreadyQueued),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Submits the oldest buffered scans and drops the ones the service
    /// resolved. On error the buffer is left untouched.
    pub async fn flush(&mut self) -> Result<ReconcileReport, ClientError> {
        let Some(request) = self.buffer.to_request() else {
            return Ok(ReconcileReport::default());
        };

        let report = self.api.sync_offline(&request).await?;
        let removed = self.buffer.acknowledge(&report);
        info!(
            gate = %self.gate_name,
            removed,
            remaining = self.buffer.len(),
            failed = report.failed.len(),
            "Offline buffer flushed"
        );
        Ok(report)
    }
}
