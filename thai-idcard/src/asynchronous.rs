// thai-idcard/src/asynchronous.rs
//! Tokio front end. Reader I/O is blocking, so every call runs on the
//! blocking pool; event streams become unbounded channels.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task;

use crate::card::ReadOutcome;
use crate::coordinator::Coordinator;
use crate::events::{DeviceEvent, ReaderEvent};
use crate::{Error, Result};

#[derive(Clone)]
pub struct AsyncCoordinator {
    inner: Arc<Coordinator>,
}

impl AsyncCoordinator {
    pub fn new(inner: Arc<Coordinator>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Arc<Coordinator> {
        &self.inner
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Coordinator) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        task::spawn_blocking(move || f(&inner))
            .await
            .map_err(|e| Error::EventLoop(e.to_string()))?
    }

    pub async fn device_list(&self) -> Result<Vec<DeviceEvent>> {
        self.blocking(|c| c.device_list()).await
    }

    pub async fn request_permission(&self, identifier: String) -> Result<DeviceEvent> {
        self.blocking(move |c| c.request_permission(&identifier)).await
    }

    pub async fn open_device(&self, identifier: String, has_permission: bool) -> Result<DeviceEvent> {
        self.blocking(move |c| c.open_device(&identifier, has_permission))
            .await
    }

    pub async fn power_on(&self) -> Result<Vec<u8>> {
        self.blocking(|c| c.power_on()).await
    }

    pub async fn power_off(&self) -> Result<()> {
        self.blocking(|c| c.power_off()).await
    }

    pub async fn read_all(&self) -> Result<ReadOutcome> {
        self.blocking(|c| c.read_all()).await
    }

    pub async fn read_specific(&self, fields: Vec<String>) -> Result<ReadOutcome> {
        self.blocking(move |c| c.read_specific(&fields)).await
    }

    /// Replace the device listener with a channel.
    pub fn device_events(&self) -> mpsc::UnboundedReceiver<DeviceEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.set_device_listener(move |ev| {
            let _ = tx.send(ev.clone());
        });
        rx
    }

    /// Replace the reader listener with a channel.
    pub fn reader_events(&self) -> mpsc::UnboundedReceiver<ReaderEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.set_reader_listener(move |ev| {
            let _ = tx.send(ev.clone());
        });
        rx
    }
}
