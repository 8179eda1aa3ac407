//! Download sink that records every delivery.

use allconv_processing::{Delivery, DownloadSink};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Default)]
pub struct RecordingSink {
    deliveries: Mutex<Vec<Delivery>>,
    fail_names: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes deliveries with this suggested name fail.
    pub fn fail_on(&self, name: &str) {
        self.fail_names.lock().unwrap().push(name.to_string());
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.deliveries()
            .into_iter()
            .map(|d| d.suggested_name)
            .collect()
    }
}

#[async_trait]
impl DownloadSink for RecordingSink {
    async fn deliver(&self, delivery: Delivery) -> anyhow::Result<()> {
        if self
            .fail_names
            .lock()
            .unwrap()
            .contains(&delivery.suggested_name)
        {
            anyhow::bail!("disk full");
        }
        self.deliveries.lock().unwrap().push(delivery);
        Ok(())
    }
}
