//! Calibration type definitions

use serde::{Deserialize, Serialize};

use crate::{CalibrationError, CalibrationResult};

/// Calibration of one analog input
///
/// `min` is the raw reading at the start of travel and `max` the reading at
/// the end. For an inverted sensor `min > max`. With `rollover` the travel
/// crosses the wrap point of a sensor whose readings run `0..=max_hardware_value`,
/// so the span is measured modulo `max_hardware_value + 1`.
///
/// # Examples
///
/// ```
/// use tswio_calibration::Calibration;
///
/// let calib = Calibration::new(100, 900, 1023, false, false)?;
/// assert_eq!(calib.normalize(500), 400);
/// assert!((calib.normalized(500) - 0.5).abs() < 1e-9);
/// # Ok::<(), tswio_calibration::CalibrationError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calibration {
    pub min: u16,
    pub max: u16,
    pub max_hardware_value: u16,
    pub inverted: bool,
    pub rollover: bool,
}

impl Calibration {
    pub fn new(
        min: u16,
        max: u16,
        max_hardware_value: u16,
        inverted: bool,
        rollover: bool,
    ) -> CalibrationResult<Self> {
        let calibration = Self {
            min,
            max,
            max_hardware_value,
            inverted,
            rollover,
        };
        if calibration.span() == 0 {
            return Err(CalibrationError::EmptyRange(min));
        }
        Ok(calibration)
    }

    fn modulus(&self) -> i32 {
        i32::from(self.max_hardware_value) + 1
    }

    /// Signed distance travelled from `min` to `raw` in the forward direction.
    fn offset(&self, raw: i32) -> i32 {
        let delta = if self.inverted {
            i32::from(self.min) - raw
        } else {
            raw - i32::from(self.min)
        };
        if self.rollover {
            delta.rem_euclid(self.modulus())
        } else {
            delta
        }
    }

    /// Number of calibrated steps between the start and end of travel.
    /// Zero when the calibration is degenerate.
    pub fn span(&self) -> u16 {
        let span = self.offset(i32::from(self.max));
        u16::try_from(span.max(0)).unwrap_or(u16::MAX)
    }

    /// Map a raw reading onto `0..=span()`.
    ///
    /// Readings beyond either end clamp to that end. With rollover, a reading
    /// in the dead band outside the travel snaps to whichever end is nearer.
    pub fn normalize(&self, raw: i32) -> u16 {
        let span = i32::from(self.span());
        let offset = self.offset(raw);
        let clamped = if offset <= span {
            offset.max(0)
        } else if self.rollover {
            let past_end = offset - span;
            let before_start = self.modulus() - offset;
            if past_end <= before_start { span } else { 0 }
        } else {
            span
        };
        u16::try_from(clamped).unwrap_or(0)
    }

    /// Position as a fraction of travel in `[0.0, 1.0]`.
    pub fn normalized(&self, raw: i32) -> f64 {
        let span = self.span();
        if span == 0 {
            return 0.0;
        }
        f64::from(self.normalize(raw)) / f64::from(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_travel() -> CalibrationResult<()> {
        let calib = Calibration::new(100, 900, 1023, false, false)?;
        assert_eq!(calib.span(), 800);
        assert_eq!(calib.normalize(100), 0);
        assert_eq!(calib.normalize(900), 800);
        assert_eq!(calib.normalize(50), 0);
        assert_eq!(calib.normalize(1000), 800);
        Ok(())
    }

    #[test]
    fn test_inverted_travel() -> CalibrationResult<()> {
        let calib = Calibration::new(900, 100, 1023, true, false)?;
        assert_eq!(calib.span(), 800);
        assert_eq!(calib.normalize(900), 0);
        assert_eq!(calib.normalize(100), 800);
        assert_eq!(calib.normalize(500), 400);
        assert_eq!(calib.normalize(950), 0);
        Ok(())
    }

    #[test]
    fn test_rollover_travel() -> CalibrationResult<()> {
        // 1000 -> 1023 -> 0 -> 200
        let calib = Calibration::new(1000, 200, 1023, false, true)?;
        assert_eq!(calib.span(), 224);
        assert_eq!(calib.normalize(1000), 0);
        assert_eq!(calib.normalize(1023), 23);
        assert_eq!(calib.normalize(0), 24);
        assert_eq!(calib.normalize(200), 224);
        // Dead band: 210 is just past the end, 990 is just before the start.
        assert_eq!(calib.normalize(210), 224);
        assert_eq!(calib.normalize(990), 0);
        Ok(())
    }

    #[test]
    fn test_inverted_rollover_travel() -> CalibrationResult<()> {
        // 100 -> 0 -> 1023 -> 900
        let calib = Calibration::new(100, 900, 1023, true, true)?;
        assert_eq!(calib.span(), 224);
        assert_eq!(calib.normalize(0), 100);
        assert_eq!(calib.normalize(1023), 101);
        assert_eq!(calib.normalize(900), 224);
        Ok(())
    }

    #[test]
    fn test_empty_range_rejected() {
        assert_eq!(
            Calibration::new(512, 512, 1023, false, false),
            Err(CalibrationError::EmptyRange(512))
        );
        // Direction disagrees with the inverted flag.
        assert_eq!(
            Calibration::new(100, 900, 1023, true, false),
            Err(CalibrationError::EmptyRange(100))
        );
    }

    #[test]
    fn test_serde_shape() -> Result<(), serde_json::Error> {
        let calib = Calibration {
            min: 10,
            max: 1000,
            max_hardware_value: 1023,
            inverted: false,
            rollover: false,
        };
        insta::assert_snapshot!(
            serde_json::to_string(&calib)?,
            @r#"{"min":10,"max":1000,"max_hardware_value":1023,"inverted":false,"rollover":false}"#
        );
        Ok(())
    }
}
