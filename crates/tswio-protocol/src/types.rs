//! Message bodies and their field-level invariants

use serde::{Deserialize, Serialize};

use crate::{
    FrameReader, FrameWriter, MAX_ANALOG_SENSITIVITY, MAX_DETENT_POSITION, MAX_LIST_ENTRIES,
    ProtocolError, ProtocolResult, VIRTUAL_PIN_BASE,
};

/// Host asks the board who it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRequest {
    pub request_id: u32,
}

/// Firmware version as `(major, minor, patch)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl FirmwareVersion {
    pub fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Board reply to [`IdentityRequest`]. `config_id` is the id of the
/// configuration the board has stored, 0 when it has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub request_id: u32,
    pub version: FirmwareVersion,
    pub config_id: u32,
}

/// Hardware configuration of one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputConfig {
    Analog { pin: u8, sensitivity: u8 },
    Button { pin: u8, debounce: u8 },
    Matrix { row_pins: Vec<u8>, col_pins: Vec<u8> },
}

impl InputConfig {
    pub const KIND_ANALOG: u8 = 0x00;
    pub const KIND_BUTTON: u8 = 0x01;
    pub const KIND_MATRIX: u8 = 0x02;

    pub fn kind(&self) -> u8 {
        match self {
            InputConfig::Analog { .. } => Self::KIND_ANALOG,
            InputConfig::Button { .. } => Self::KIND_BUTTON,
            InputConfig::Matrix { .. } => Self::KIND_MATRIX,
        }
    }

    pub fn validate(&self) -> ProtocolResult<()> {
        match self {
            InputConfig::Analog { sensitivity, .. } => {
                if *sensitivity > MAX_ANALOG_SENSITIVITY {
                    return Err(ProtocolError::InvalidValue);
                }
            }
            InputConfig::Button { .. } => {}
            InputConfig::Matrix { row_pins, col_pins } => {
                if row_pins.len() > MAX_LIST_ENTRIES || col_pins.len() > MAX_LIST_ENTRIES {
                    return Err(ProtocolError::InvalidPin);
                }
                let mut seen = [false; 256];
                for pin in row_pins.iter().chain(col_pins.iter()) {
                    let slot = seen
                        .get_mut(usize::from(*pin))
                        .ok_or(ProtocolError::InvalidPin)?;
                    if *slot {
                        return Err(ProtocolError::InvalidPin);
                    }
                    *slot = true;
                }
            }
        }
        Ok(())
    }

    /// Virtual pins the firmware reports for each matrix key, row-major.
    /// Empty for non-matrix inputs.
    pub fn virtual_pins(&self) -> Vec<MatrixKey> {
        let InputConfig::Matrix { row_pins, col_pins } = self else {
            return Vec::new();
        };
        let mut keys = Vec::with_capacity(row_pins.len() * col_pins.len());
        for row in 0..row_pins.len() {
            for col in 0..col_pins.len() {
                if let Some(pin) = matrix_virtual_pin(row, col, col_pins.len()) {
                    keys.push(MatrixKey { row, col, pin });
                }
            }
        }
        keys
    }

    fn encode_body(&self, writer: &mut FrameWriter) -> ProtocolResult<()> {
        self.validate()?;
        writer.write_u8(self.kind());
        match self {
            InputConfig::Analog { pin, sensitivity } => {
                writer.write_u8(*pin).write_u8(*sensitivity);
            }
            InputConfig::Button { pin, debounce } => {
                writer.write_u8(*pin).write_u8(*debounce);
            }
            InputConfig::Matrix { row_pins, col_pins } => {
                let rows = u8::try_from(row_pins.len()).ok().ok_or(ProtocolError::InvalidPin)?;
                let cols = u8::try_from(col_pins.len()).ok().ok_or(ProtocolError::InvalidPin)?;
                writer
                    .write_u8(rows)
                    .write_u8(cols)
                    .write_bytes(row_pins)
                    .write_bytes(col_pins);
            }
        }
        Ok(())
    }

    fn decode_body(reader: &mut FrameReader<'_>) -> ProtocolResult<Self> {
        let config = match reader.read_u8()? {
            Self::KIND_ANALOG => InputConfig::Analog {
                pin: reader.read_u8()?,
                sensitivity: reader.read_u8()?,
            },
            Self::KIND_BUTTON => InputConfig::Button {
                pin: reader.read_u8()?,
                debounce: reader.read_u8()?,
            },
            Self::KIND_MATRIX => {
                let rows = usize::from(reader.read_u8()?);
                let cols = usize::from(reader.read_u8()?);
                let row_pins = reader.read_bytes(rows)?.to_vec();
                let col_pins = reader.read_bytes(cols)?.to_vec();
                InputConfig::Matrix { row_pins, col_pins }
            }
            _ => return Err(ProtocolError::InvalidInput),
        };
        reject_on_decode(config.validate())?;
        Ok(config)
    }
}

/// Field checks that fail while decoding mean the frame itself is bad.
fn reject_on_decode(checked: ProtocolResult<()>) -> ProtocolResult<()> {
    checked.or(Err(ProtocolError::InvalidMessage))
}

/// One key of a matrix input and the virtual pin it reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixKey {
    pub row: usize,
    pub col: usize,
    pub pin: u8,
}

/// Virtual pin for the key at `(row, col)` of a matrix with `col_count`
/// columns, or `None` if it would not fit in a byte.
pub fn matrix_virtual_pin(row: usize, col: usize, col_count: usize) -> Option<u8> {
    let offset = row.checked_mul(col_count)?.checked_add(col)?;
    let pin = usize::from(VIRTUAL_PIN_BASE).checked_add(offset)?;
    u8::try_from(pin).ok()
}

/// One part of a (possibly multi-part) configuration upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configure {
    pub config_id: u32,
    pub total_parts: u8,
    pub part_number: u8,
    pub input: InputConfig,
}

impl Configure {
    /// Split a device's inputs into numbered `Configure` parts sharing one config id.
    pub fn split_parts(config_id: u32, inputs: &[InputConfig]) -> ProtocolResult<Vec<Configure>> {
        let total_parts = u8::try_from(inputs.len()).ok().ok_or(ProtocolError::InvalidValue)?;
        inputs
            .iter()
            .enumerate()
            .map(|(index, input)| {
                input.validate()?;
                let part_number = u8::try_from(index).ok().ok_or(ProtocolError::InvalidValue)?;
                Ok(Configure {
                    config_id,
                    total_parts,
                    part_number,
                    input: input.clone(),
                })
            })
            .collect()
    }

    pub fn validate(&self) -> ProtocolResult<()> {
        if self.total_parts == 0 || self.part_number >= self.total_parts {
            return Err(ProtocolError::InvalidValue);
        }
        self.input.validate()
    }

    pub(crate) fn write_body(&self, writer: &mut FrameWriter) -> ProtocolResult<()> {
        self.validate()?;
        writer
            .write_u32_le(self.config_id)
            .write_u8(self.total_parts)
            .write_u8(self.part_number);
        self.input.encode_body(writer)
    }

    pub(crate) fn read_body(reader: &mut FrameReader<'_>) -> ProtocolResult<Self> {
        let config_id = reader.read_u32_le()?;
        let total_parts = reader.read_u8()?;
        let part_number = reader.read_u8()?;
        let input = InputConfig::decode_body(reader)?;
        let configure = Configure {
            config_id,
            total_parts,
            part_number,
            input,
        };
        reject_on_decode(configure.validate())?;
        Ok(configure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationStored {
    pub config_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationError {
    pub config_id: u32,
}

/// Raw reading of one pin. Buttons report 0/1, analog inputs the ADC value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputValue {
    pub pin: u8,
    pub value: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Heartbeat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLevel {
    Low,
    High,
}

impl OutputLevel {
    pub fn to_byte(self) -> u8 {
        match self {
            OutputLevel::Low => 0,
            OutputLevel::High => 1,
        }
    }

    pub fn from_byte(byte: u8) -> ProtocolResult<Self> {
        match byte {
            0 => Ok(OutputLevel::Low),
            1 => Ok(OutputLevel::High),
            _ => Err(ProtocolError::InvalidMessage),
        }
    }
}

impl From<bool> for OutputLevel {
    fn from(on: bool) -> Self {
        if on { OutputLevel::High } else { OutputLevel::Low }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOutput {
    pub pin: u8,
    pub value: OutputLevel,
}

/// A haptic detent on a BLDC lever. `position` is a percentage of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detent {
    pub position: u8,
    pub engagement: u8,
    pub hold: u8,
    pub exit: u8,
    pub spring_back: u8,
}

/// Damping applied while the lever travels between two detents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DampingRange {
    pub start_detent: u8,
    pub end_detent: u8,
    pub damping: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBldcProfile {
    pub pin: u8,
    pub detents: Vec<Detent>,
    pub ranges: Vec<DampingRange>,
}

impl LoadBldcProfile {
    pub fn validate(&self) -> ProtocolResult<()> {
        if self.detents.len() > MAX_LIST_ENTRIES {
            return Err(ProtocolError::TooManyDetents);
        }
        if self.ranges.len() > MAX_LIST_ENTRIES {
            return Err(ProtocolError::TooManyRanges);
        }
        if self.detents.is_empty() && !self.ranges.is_empty() {
            return Err(ProtocolError::InvalidProfileParams);
        }
        if self
            .detents
            .iter()
            .any(|d| d.position > MAX_DETENT_POSITION)
        {
            return Err(ProtocolError::InvalidDetent);
        }
        let detent_count = self.detents.len();
        for range in &self.ranges {
            if range.start_detent > range.end_detent
                || usize::from(range.end_detent) >= detent_count
            {
                return Err(ProtocolError::InvalidRange);
            }
        }
        Ok(())
    }

    pub(crate) fn write_body(&self, writer: &mut FrameWriter) -> ProtocolResult<()> {
        self.validate()?;
        let detent_count =
            u8::try_from(self.detents.len()).ok().ok_or(ProtocolError::TooManyDetents)?;
        let range_count =
            u8::try_from(self.ranges.len()).ok().ok_or(ProtocolError::TooManyRanges)?;
        writer
            .write_u8(self.pin)
            .write_u8(detent_count)
            .write_u8(range_count);
        for d in &self.detents {
            writer
                .write_u8(d.position)
                .write_u8(d.engagement)
                .write_u8(d.hold)
                .write_u8(d.exit)
                .write_u8(d.spring_back);
        }
        for r in &self.ranges {
            writer
                .write_u8(r.start_detent)
                .write_u8(r.end_detent)
                .write_u8(r.damping);
        }
        Ok(())
    }

    pub(crate) fn read_body(reader: &mut FrameReader<'_>) -> ProtocolResult<Self> {
        let pin = reader.read_u8()?;
        let detent_count = reader.read_u8()?;
        let range_count = reader.read_u8()?;

        let mut detents = Vec::with_capacity(usize::from(detent_count));
        for _ in 0..detent_count {
            detents.push(Detent {
                position: reader.read_u8()?,
                engagement: reader.read_u8()?,
                hold: reader.read_u8()?,
                exit: reader.read_u8()?,
                spring_back: reader.read_u8()?,
            });
        }

        let mut ranges = Vec::with_capacity(usize::from(range_count));
        for _ in 0..range_count {
            ranges.push(DampingRange {
                start_detent: reader.read_u8()?,
                end_detent: reader.read_u8()?,
                damping: reader.read_u8()?,
            });
        }

        let profile = LoadBldcProfile {
            pin,
            detents,
            ranges,
        };
        reject_on_decode(profile.validate())?;
        Ok(profile)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivateBldcProfile {
    pub pin: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detent(position: u8) -> Detent {
        Detent {
            position,
            engagement: 80,
            hold: 120,
            exit: 60,
            spring_back: 0,
        }
    }

    #[test]
    fn test_matrix_virtual_pins() {
        let matrix = InputConfig::Matrix {
            row_pins: vec![2, 3],
            col_pins: vec![4, 5, 6],
        };
        let keys = matrix.virtual_pins();
        assert_eq!(keys.len(), 6);
        assert_eq!(keys.first().map(|k| k.pin), Some(128));
        assert_eq!(keys.last().map(|k| (k.row, k.col, k.pin)), Some((1, 2, 133)));
    }

    #[test]
    fn test_matrix_virtual_pin_overflow() {
        assert_eq!(matrix_virtual_pin(0, 127, 128), Some(255));
        assert_eq!(matrix_virtual_pin(1, 0, 128), None);
    }

    #[test]
    fn test_matrix_rejects_shared_pin() {
        let matrix = InputConfig::Matrix {
            row_pins: vec![2, 3],
            col_pins: vec![3],
        };
        assert_eq!(matrix.validate(), Err(ProtocolError::InvalidPin));
    }

    #[test]
    fn test_analog_sensitivity_bound() {
        let analog = InputConfig::Analog {
            pin: 14,
            sensitivity: 11,
        };
        assert_eq!(analog.validate(), Err(ProtocolError::InvalidValue));
    }

    #[test]
    fn test_split_parts_numbering() -> ProtocolResult<()> {
        let inputs = vec![
            InputConfig::Analog {
                pin: 14,
                sensitivity: 5,
            },
            InputConfig::Button {
                pin: 2,
                debounce: 20,
            },
        ];
        let parts = Configure::split_parts(0xDEAD_BEEF, &inputs)?;
        assert_eq!(parts.len(), 2);
        for (i, part) in parts.iter().enumerate() {
            assert_eq!(part.total_parts, 2);
            assert_eq!(usize::from(part.part_number), i);
            assert_eq!(part.config_id, 0xDEAD_BEEF);
        }
        Ok(())
    }

    #[test]
    fn test_profile_validation_order() {
        let mut profile = LoadBldcProfile {
            pin: 3,
            detents: vec![],
            ranges: vec![DampingRange {
                start_detent: 0,
                end_detent: 0,
                damping: 10,
            }],
        };
        assert_eq!(profile.validate(), Err(ProtocolError::InvalidProfileParams));

        profile.detents = vec![detent(101)];
        assert_eq!(profile.validate(), Err(ProtocolError::InvalidDetent));

        profile.detents = vec![detent(0), detent(100)];
        profile.ranges = vec![DampingRange {
            start_detent: 1,
            end_detent: 0,
            damping: 10,
        }];
        assert_eq!(profile.validate(), Err(ProtocolError::InvalidRange));

        profile.ranges = vec![DampingRange {
            start_detent: 0,
            end_detent: 2,
            damping: 10,
        }];
        assert_eq!(profile.validate(), Err(ProtocolError::InvalidRange));

        profile.ranges = vec![DampingRange {
            start_detent: 0,
            end_detent: 1,
            damping: 10,
        }];
        assert_eq!(profile.validate(), Ok(()));
    }

    #[test]
    fn test_too_many_detents() {
        let profile = LoadBldcProfile {
            pin: 3,
            detents: vec![detent(50); 256],
            ranges: vec![],
        };
        assert_eq!(profile.validate(), Err(ProtocolError::TooManyDetents));
    }
}
