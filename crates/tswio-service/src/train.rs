//! Train detection from the simulator's current formation

use std::sync::Arc;

use tracing::{debug, info, warn};
use tswio_errors::SimulatorError;
use tswio_simulator::{SimValue, SimulatorClient};

use crate::repository::{Repository, TrainRecord};

/// What a poll decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainChange {
    Activated(TrainRecord),
    Deactivated,
}

/// Whether a formation identifier belongs to `train`. Simulator object
/// names carry decorations around the class name, so a containment match is
/// enough.
pub fn matches_train(train: &TrainRecord, formation: &str) -> bool {
    let identifier = train.identifier.trim();
    !identifier.is_empty() && formation.contains(identifier)
}

/// Polls the formation identifier and reports train changes.
pub struct TrainWatcher {
    simulator: Arc<dyn SimulatorClient>,
    repository: Arc<dyn Repository>,
    detection_path: String,
    formation: Option<String>,
    active: Option<String>,
}

impl TrainWatcher {
    pub fn new(
        simulator: Arc<dyn SimulatorClient>,
        repository: Arc<dyn Repository>,
        detection_path: impl Into<String>,
    ) -> Self {
        Self {
            simulator,
            repository,
            detection_path: detection_path.into(),
            formation: None,
            active: None,
        }
    }

    /// Id of the train the watcher last activated.
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    async fn read_formation(&self) -> Result<Option<String>, SimulatorError> {
        match self.simulator.get(&self.detection_path).await {
            Ok(SimValue::Text(name)) if !name.trim().is_empty() => Ok(Some(name)),
            Ok(SimValue::Number(n)) => Ok(Some(n.to_string())),
            Ok(_) => Ok(None),
            // The path disappears while no train is driven.
            Err(SimulatorError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Read the formation once. Returns a change when the matched train
    /// differs from the one active before.
    ///
    /// An unreachable simulator leaves the current train active.
    pub async fn poll_once(&mut self) -> Option<TrainChange> {
        let formation = match self.read_formation().await {
            Ok(formation) => formation,
            Err(e) => {
                debug!(path = %self.detection_path, error = %e, "formation read failed");
                return None;
            }
        };
        if formation == self.formation {
            return None;
        }
        debug!(formation = ?formation, "formation changed");
        self.formation = formation.clone();

        let matched = match formation {
            Some(name) => match self.repository.trains().await {
                Ok(trains) => trains.into_iter().find(|t| matches_train(t, &name)),
                Err(e) => {
                    warn!(error = %e, "failed to list trains");
                    // Forget the formation so the next poll retries the lookup.
                    self.formation = None;
                    return None;
                }
            },
            None => None,
        };

        match matched {
            Some(train) if self.active.as_deref() == Some(train.id.as_str()) => None,
            Some(train) => {
                info!(train_id = %train.id, name = %train.name, "train detected");
                self.active = Some(train.id.clone());
                Some(TrainChange::Activated(train))
            }
            None if self.active.is_some() => {
                info!("no configured train is being driven");
                self.active = None;
                Some(TrainChange::Deactivated)
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_matching() {
        let train = TrainRecord {
            id: "br-class-66".into(),
            name: "BR Class 66".into(),
            identifier: "Class66".into(),
        };
        assert!(matches_train(&train, "RVM_DB_Class66_C_2147"));
        assert!(!matches_train(&train, "RVM_DB_Class43_C_1"));

        let blank = TrainRecord {
            identifier: "  ".into(),
            ..train
        };
        assert!(!matches_train(&blank, "anything"));
    }
}
