//! Persistence boundary
//!
//! The bridge reads trains, devices and their bindings through
//! [`Repository`] and never assumes how they are stored. The in-memory
//! implementation is backed by a JSON layout file.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tswio_buttons::{ButtonInputBinding, InputKind, RegisteredInput, Sequence};
use tswio_calibration::Calibration;
use tswio_errors::RepositoryError;
use tswio_lever::{BldcParams, LeverConfig, LeverType, Notch};
use tswio_protocol::InputConfig;

use crate::outputs::OutputBinding;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// A train the bridge can drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainRecord {
    pub id: String,
    pub name: String,
    /// Matched against the simulator's formation identifier
    pub identifier: String,
}

/// A lever element of a train bound to an analog input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverElement {
    pub element_id: String,
    pub input_id: String,
    pub lever: LeverConfig,
    /// Haptic parameters when the input drives a BLDC lever
    #[serde(default)]
    pub bldc: Option<BldcParams>,
}

/// One input configured on a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    pub id: String,
    pub config: InputConfig,
    #[serde(default)]
    pub calibration: Option<Calibration>,
}

impl InputRecord {
    pub fn kind(&self) -> InputKind {
        match self.config {
            InputConfig::Analog { .. } => InputKind::Analog,
            InputConfig::Button { .. } | InputConfig::Matrix { .. } => InputKind::Button,
        }
    }

    /// Physical pin of an analog or button input.
    pub fn pin(&self) -> Option<u8> {
        match self.config {
            InputConfig::Analog { pin, .. } | InputConfig::Button { pin, .. } => Some(pin),
            InputConfig::Matrix { .. } => None,
        }
    }

    pub fn registered(&self) -> RegisteredInput {
        RegisteredInput {
            id: self.id.clone(),
            config: self.config.clone(),
        }
    }
}

/// A control board, identified by the name of the transport it is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub transport: String,
    #[serde(default)]
    pub name: String,
    /// Id of the configuration the board should carry
    pub config_id: u32,
    #[serde(default)]
    pub inputs: Vec<InputRecord>,
}

impl DeviceRecord {
    pub fn input(&self, input_id: &str) -> Option<&InputRecord> {
        self.inputs.iter().find(|i| i.id == input_id)
    }

    pub fn input_configs(&self) -> Vec<InputConfig> {
        self.inputs.iter().map(|i| i.config.clone()).collect()
    }
}

/// A train with everything bound to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainLayout {
    #[serde(flatten)]
    pub train: TrainRecord,
    #[serde(default)]
    pub levers: Vec<LeverElement>,
    #[serde(default)]
    pub buttons: Vec<ButtonInputBinding>,
    #[serde(default)]
    pub outputs: Vec<OutputBinding>,
}

/// Everything the bridge persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub devices: Vec<DeviceRecord>,
    pub trains: Vec<TrainLayout>,
    pub sequences: Vec<Sequence>,
}

impl Layout {
    /// Re-check record invariants that serde cannot express.
    pub fn validate(&mut self) -> RepositoryResult<()> {
        for train in &mut self.trains {
            for lever in &mut train.levers {
                if let Err(e) = lever.lever.validate() {
                    return Err(RepositoryError::invalid(
                        "lever",
                        format!("{}: {e}", lever.element_id),
                    ));
                }
            }
        }
        Ok(())
    }

    fn train_mut(&mut self, train_id: &str) -> RepositoryResult<&mut TrainLayout> {
        self.trains
            .iter_mut()
            .find(|t| t.train.id == train_id)
            .ok_or_else(|| RepositoryError::not_found("train", train_id))
    }

    fn train(&self, train_id: &str) -> RepositoryResult<&TrainLayout> {
        self.trains
            .iter()
            .find(|t| t.train.id == train_id)
            .ok_or_else(|| RepositoryError::not_found("train", train_id))
    }
}

/// Storage the bridge reads its bindings from.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn trains(&self) -> RepositoryResult<Vec<TrainRecord>>;

    async fn lever_elements(&self, train_id: &str) -> RepositoryResult<Vec<LeverElement>>;

    async fn button_bindings(&self, train_id: &str) -> RepositoryResult<Vec<ButtonInputBinding>>;

    async fn output_bindings(&self, train_id: &str) -> RepositoryResult<Vec<OutputBinding>>;

    async fn sequences(&self) -> RepositoryResult<Vec<Sequence>>;

    async fn devices(&self) -> RepositoryResult<Vec<DeviceRecord>>;

    async fn device(&self, transport: &str) -> RepositoryResult<DeviceRecord> {
        self.devices()
            .await?
            .into_iter()
            .find(|d| d.transport == transport)
            .ok_or_else(|| RepositoryError::not_found("device", transport))
    }

    /// Store a fresh calibration for an input, replacing the old one whole.
    async fn save_calibration(
        &self,
        input_id: &str,
        calibration: Calibration,
    ) -> RepositoryResult<()>;

    /// Replace a lever's notch table and type: every existing notch is
    /// dropped and the new ones inserted.
    async fn replace_notches(
        &self,
        train_id: &str,
        element_id: &str,
        lever_type: LeverType,
        notches: Vec<Notch>,
    ) -> RepositoryResult<()>;
}

#[async_trait]
impl<T: Repository + ?Sized> Repository for Arc<T> {
    async fn trains(&self) -> RepositoryResult<Vec<TrainRecord>> {
        (**self).trains().await
    }

    async fn lever_elements(&self, train_id: &str) -> RepositoryResult<Vec<LeverElement>> {
        (**self).lever_elements(train_id).await
    }

    async fn button_bindings(&self, train_id: &str) -> RepositoryResult<Vec<ButtonInputBinding>> {
        (**self).button_bindings(train_id).await
    }

    async fn output_bindings(&self, train_id: &str) -> RepositoryResult<Vec<OutputBinding>> {
        (**self).output_bindings(train_id).await
    }

    async fn sequences(&self) -> RepositoryResult<Vec<Sequence>> {
        (**self).sequences().await
    }

    async fn devices(&self) -> RepositoryResult<Vec<DeviceRecord>> {
        (**self).devices().await
    }

    async fn save_calibration(
        &self,
        input_id: &str,
        calibration: Calibration,
    ) -> RepositoryResult<()> {
        (**self).save_calibration(input_id, calibration).await
    }

    async fn replace_notches(
        &self,
        train_id: &str,
        element_id: &str,
        lever_type: LeverType,
        notches: Vec<Notch>,
    ) -> RepositoryResult<()> {
        (**self)
            .replace_notches(train_id, element_id, lever_type, notches)
            .await
    }
}

/// Repository held in memory, loadable from and savable to a layout file.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    layout: RwLock<Layout>,
}

impl InMemoryRepository {
    pub fn new(mut layout: Layout) -> RepositoryResult<Self> {
        layout.validate()?;
        Ok(Self {
            layout: RwLock::new(layout),
        })
    }

    pub fn from_json(json: &str) -> RepositoryResult<Self> {
        let layout: Layout =
            serde_json::from_str(json).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        Self::new(layout)
    }

    pub async fn load(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            RepositoryError::Storage(format!("failed to read {}: {e}", path.display()))
        })?;
        let repository = Self::from_json(&json)?;
        let (trains, devices) = {
            let layout = repository.layout.read();
            (layout.trains.len(), layout.devices.len())
        };
        info!(path = %path.display(), trains, devices, "layout loaded");
        Ok(repository)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> RepositoryResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&*self.layout.read())
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        tokio::fs::write(path, json).await.map_err(|e| {
            RepositoryError::Storage(format!("failed to write {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "layout saved");
        Ok(())
    }

    /// Snapshot of the whole layout.
    pub fn layout(&self) -> Layout {
        self.layout.read().clone()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn trains(&self) -> RepositoryResult<Vec<TrainRecord>> {
        Ok(self
            .layout
            .read()
            .trains
            .iter()
            .map(|t| t.train.clone())
            .collect())
    }

    async fn lever_elements(&self, train_id: &str) -> RepositoryResult<Vec<LeverElement>> {
        Ok(self.layout.read().train(train_id)?.levers.clone())
    }

    async fn button_bindings(&self, train_id: &str) -> RepositoryResult<Vec<ButtonInputBinding>> {
        Ok(self.layout.read().train(train_id)?.buttons.clone())
    }

    async fn output_bindings(&self, train_id: &str) -> RepositoryResult<Vec<OutputBinding>> {
        Ok(self.layout.read().train(train_id)?.outputs.clone())
    }

    async fn sequences(&self) -> RepositoryResult<Vec<Sequence>> {
        Ok(self.layout.read().sequences.clone())
    }

    async fn devices(&self) -> RepositoryResult<Vec<DeviceRecord>> {
        Ok(self.layout.read().devices.clone())
    }

    async fn save_calibration(
        &self,
        input_id: &str,
        calibration: Calibration,
    ) -> RepositoryResult<()> {
        let mut layout = self.layout.write();
        let input = layout
            .devices
            .iter_mut()
            .flat_map(|d| d.inputs.iter_mut())
            .find(|i| i.id == input_id)
            .ok_or_else(|| RepositoryError::not_found("input", input_id))?;
        if input.kind() != InputKind::Analog {
            return Err(RepositoryError::invalid(
                "calibration",
                format!("input {input_id} is not analog"),
            ));
        }
        input.calibration = Some(calibration);
        debug!(input = input_id, "calibration saved");
        Ok(())
    }

    async fn replace_notches(
        &self,
        train_id: &str,
        element_id: &str,
        lever_type: LeverType,
        notches: Vec<Notch>,
    ) -> RepositoryResult<()> {
        let mut layout = self.layout.write();
        let lever = layout
            .train_mut(train_id)?
            .levers
            .iter_mut()
            .find(|l| l.element_id == element_id)
            .ok_or_else(|| RepositoryError::not_found("lever", element_id))?;
        let count = notches.len();
        lever
            .lever
            .replace_notches(notches)
            .map_err(|e| RepositoryError::invalid("notch", e))?;
        lever.lever.lever_type = lever_type;
        info!(train_id, element_id, %lever_type, notches = count, "notch table replaced");
        Ok(())
    }
}

/// Find the device and record of an input.
pub fn locate_input<'a>(
    devices: &'a [DeviceRecord],
    input_id: &str,
) -> Option<(&'a DeviceRecord, &'a InputRecord)> {
    devices
        .iter()
        .find_map(|d| d.input(input_id).map(|i| (d, i)))
}
