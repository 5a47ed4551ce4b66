//! Five-point lever check

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tswio_errors::CalibrationError;
use tswio_simulator::SimulatorClient;

use crate::analyzer::{AnalyzerResult, is_integral};
use crate::{AnalyzerConfig, LeverAnalyzer, LeverEndpoints, LeverType, Sample};

pub const QUICK_CHECK_POINTS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickCheck {
    pub control: String,
    pub lever_type: LeverType,
    pub samples: Vec<Sample>,
}

/// Classify a lever from five samples instead of a full sweep.
///
/// Integer outputs everywhere read as discrete, a mix of integer and
/// fractional outputs as hybrid, and anything else as continuous.
pub async fn quick_check(
    client: Arc<dyn SimulatorClient>,
    control_path: &str,
) -> AnalyzerResult<QuickCheck> {
    LeverAnalyzer::new(client, AnalyzerConfig::default())
        .quick_check(&LeverEndpoints::for_control(control_path))
        .await
}

impl LeverAnalyzer {
    pub async fn quick_check(&self, endpoints: &LeverEndpoints) -> AnalyzerResult<QuickCheck> {
        let original = self.client().get_f64(&endpoints.value).await.ok();
        let mut samples = Vec::with_capacity(QUICK_CHECK_POINTS.len());
        for point in QUICK_CHECK_POINTS {
            match self.sample_at(endpoints, point).await {
                Ok(sample) => samples.push(sample),
                Err(e) => warn!(point, error = %e, "quick check sample failed"),
            }
        }
        if let Some(value) = original {
            if let Err(e) = self.client().set(&endpoints.value, value).await {
                warn!(error = %e, "failed to restore lever position");
            }
        }

        if samples.len() < 2 {
            return Err(CalibrationError::InsufficientSamples {
                got: samples.len(),
                required: 2,
            });
        }

        let integral = samples.iter().filter(|s| is_integral(s.output)).count();
        let lever_type = if integral == samples.len() {
            LeverType::Discrete
        } else if integral > 0 {
            LeverType::Hybrid
        } else {
            LeverType::Continuous
        };
        debug!(control = %endpoints.value, %lever_type, "quick check");
        Ok(QuickCheck {
            control: endpoints.value.clone(),
            lever_type,
            samples,
        })
    }
}
