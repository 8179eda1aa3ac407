//! Converter whose behavior is scripted per file name.

use allconv_core::{ConversionSettings, RawFile};
use allconv_processing::{mime_for_format, ConvertedBytes, Converter};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// One converter invocation as seen by the backend.
#[derive(Debug, Clone)]
pub struct Call {
    pub name: String,
    pub settings: ConversionSettings,
}

#[derive(Default)]
pub struct ScriptedConverter {
    fail_all: bool,
    fail_names: HashSet<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            fail_names: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_names(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.name).collect()
    }
}

#[async_trait]
impl Converter for ScriptedConverter {
    async fn convert(
        &self,
        input: &RawFile,
        settings: &ConversionSettings,
    ) -> anyhow::Result<ConvertedBytes> {
        self.calls.lock().unwrap().push(Call {
            name: input.name.clone(),
            settings: settings.clone(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_all || self.fail_names.contains(&input.name) {
            anyhow::bail!("decoder rejected {}", input.name);
        }
        let mut data = input.data.bytes().to_vec();
        data.extend_from_slice(settings.format.as_bytes());
        Ok(ConvertedBytes {
            data: Bytes::from(data),
            mime_type: mime_for_format(&settings.format),
        })
    }
}
