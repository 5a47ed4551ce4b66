//! Tagged message envelope

use serde::{Deserialize, Serialize};

use crate::{
    ConfigurationError, ConfigurationStored, Configure, DeactivateBldcProfile, FirmwareVersion,
    FrameReader, FrameWriter, Heartbeat, IdentityRequest, IdentityResponse, InputValue,
    LoadBldcProfile, OutputLevel, ProtocolError, ProtocolResult, SetOutput,
    TAG_CONFIGURATION_ERROR, TAG_CONFIGURATION_STORED, TAG_CONFIGURE,
    TAG_DEACTIVATE_BLDC_PROFILE, TAG_HEARTBEAT, TAG_IDENTITY_REQUEST, TAG_IDENTITY_RESPONSE,
    TAG_INPUT_VALUE, TAG_LOAD_BLDC_PROFILE, TAG_SET_OUTPUT,
};

/// A message body with a fixed type tag.
///
/// `encode` and `decode` handle the tag byte and the exact-length check;
/// implementors only deal with the body.
pub trait WireMessage: Sized {
    const TAG: u8;

    fn encode_body(&self, writer: &mut FrameWriter) -> ProtocolResult<()>;

    fn decode_body(reader: &mut FrameReader<'_>) -> ProtocolResult<Self>;

    fn encode(&self) -> ProtocolResult<Vec<u8>> {
        let mut writer = FrameWriter::with_capacity(8);
        writer.write_u8(Self::TAG);
        self.encode_body(&mut writer)?;
        Ok(writer.into_inner())
    }

    /// Empty, truncated or over-long buffers are all `InvalidMessage`;
    /// `InsufficientData` is reserved for [`Message::decode_any`].
    fn decode(buffer: &[u8]) -> ProtocolResult<Self> {
        let mut reader = FrameReader::new(buffer);
        let tag = reader.read_u8()?;
        if tag != Self::TAG {
            return Err(ProtocolError::InvalidMessage);
        }
        let message = Self::decode_body(&mut reader)?;
        reader.finish()?;
        Ok(message)
    }
}

impl WireMessage for IdentityRequest {
    const TAG: u8 = TAG_IDENTITY_REQUEST;

    fn encode_body(&self, writer: &mut FrameWriter) -> ProtocolResult<()> {
        writer.write_u32_le(self.request_id);
        Ok(())
    }

    fn decode_body(reader: &mut FrameReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            request_id: reader.read_u32_le()?,
        })
    }
}

impl WireMessage for IdentityResponse {
    const TAG: u8 = TAG_IDENTITY_RESPONSE;

    fn encode_body(&self, writer: &mut FrameWriter) -> ProtocolResult<()> {
        writer
            .write_u32_le(self.request_id)
            .write_u8(self.version.major)
            .write_u8(self.version.minor)
            .write_u8(self.version.patch)
            .write_u32_le(self.config_id);
        Ok(())
    }

    fn decode_body(reader: &mut FrameReader<'_>) -> ProtocolResult<Self> {
        let request_id = reader.read_u32_le()?;
        let version = FirmwareVersion::new(reader.read_u8()?, reader.read_u8()?, reader.read_u8()?);
        let config_id = reader.read_u32_le()?;
        Ok(Self {
            request_id,
            version,
            config_id,
        })
    }
}

impl WireMessage for Configure {
    const TAG: u8 = TAG_CONFIGURE;

    fn encode_body(&self, writer: &mut FrameWriter) -> ProtocolResult<()> {
        self.write_body(writer)
    }

    fn decode_body(reader: &mut FrameReader<'_>) -> ProtocolResult<Self> {
        Configure::read_body(reader)
    }
}

impl WireMessage for ConfigurationStored {
    const TAG: u8 = TAG_CONFIGURATION_STORED;

    fn encode_body(&self, writer: &mut FrameWriter) -> ProtocolResult<()> {
        writer.write_u32_le(self.config_id);
        Ok(())
    }

    fn decode_body(reader: &mut FrameReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            config_id: reader.read_u32_le()?,
        })
    }
}

impl WireMessage for ConfigurationError {
    const TAG: u8 = TAG_CONFIGURATION_ERROR;

    fn encode_body(&self, writer: &mut FrameWriter) -> ProtocolResult<()> {
        writer.write_u32_le(self.config_id);
        Ok(())
    }

    fn decode_body(reader: &mut FrameReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            config_id: reader.read_u32_le()?,
        })
    }
}

impl WireMessage for InputValue {
    const TAG: u8 = TAG_INPUT_VALUE;

    fn encode_body(&self, writer: &mut FrameWriter) -> ProtocolResult<()> {
        writer.write_u8(self.pin).write_i16_le(self.value);
        Ok(())
    }

    fn decode_body(reader: &mut FrameReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            pin: reader.read_u8()?,
            value: reader.read_i16_le()?,
        })
    }
}

impl WireMessage for Heartbeat {
    const TAG: u8 = TAG_HEARTBEAT;

    fn encode_body(&self, _writer: &mut FrameWriter) -> ProtocolResult<()> {
        Ok(())
    }

    fn decode_body(_reader: &mut FrameReader<'_>) -> ProtocolResult<Self> {
        Ok(Heartbeat)
    }
}

impl WireMessage for SetOutput {
    const TAG: u8 = TAG_SET_OUTPUT;

    fn encode_body(&self, writer: &mut FrameWriter) -> ProtocolResult<()> {
        writer.write_u8(self.pin).write_u8(self.value.to_byte());
        Ok(())
    }

    fn decode_body(reader: &mut FrameReader<'_>) -> ProtocolResult<Self> {
        let pin = reader.read_u8()?;
        let value = OutputLevel::from_byte(reader.read_u8()?)?;
        Ok(Self { pin, value })
    }
}

impl WireMessage for LoadBldcProfile {
    const TAG: u8 = TAG_LOAD_BLDC_PROFILE;

    fn encode_body(&self, writer: &mut FrameWriter) -> ProtocolResult<()> {
        self.write_body(writer)
    }

    fn decode_body(reader: &mut FrameReader<'_>) -> ProtocolResult<Self> {
        LoadBldcProfile::read_body(reader)
    }
}

impl WireMessage for DeactivateBldcProfile {
    const TAG: u8 = TAG_DEACTIVATE_BLDC_PROFILE;

    fn encode_body(&self, writer: &mut FrameWriter) -> ProtocolResult<()> {
        writer.write_u8(self.pin);
        Ok(())
    }

    fn decode_body(reader: &mut FrameReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            pin: reader.read_u8()?,
        })
    }
}

/// Any message the bridge and firmware exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    IdentityRequest(IdentityRequest),
    IdentityResponse(IdentityResponse),
    Configure(Configure),
    ConfigurationStored(ConfigurationStored),
    ConfigurationError(ConfigurationError),
    InputValue(InputValue),
    Heartbeat(Heartbeat),
    SetOutput(SetOutput),
    LoadBldcProfile(LoadBldcProfile),
    DeactivateBldcProfile(DeactivateBldcProfile),
}

impl Message {
    pub fn tag(&self) -> u8 {
        match self {
            Message::IdentityRequest(_) => TAG_IDENTITY_REQUEST,
            Message::IdentityResponse(_) => TAG_IDENTITY_RESPONSE,
            Message::Configure(_) => TAG_CONFIGURE,
            Message::ConfigurationStored(_) => TAG_CONFIGURATION_STORED,
            Message::ConfigurationError(_) => TAG_CONFIGURATION_ERROR,
            Message::InputValue(_) => TAG_INPUT_VALUE,
            Message::Heartbeat(_) => TAG_HEARTBEAT,
            Message::SetOutput(_) => TAG_SET_OUTPUT,
            Message::LoadBldcProfile(_) => TAG_LOAD_BLDC_PROFILE,
            Message::DeactivateBldcProfile(_) => TAG_DEACTIVATE_BLDC_PROFILE,
        }
    }

    /// Serialize to the tag byte followed by the body.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        match self {
            Message::IdentityRequest(m) => m.encode(),
            Message::IdentityResponse(m) => m.encode(),
            Message::Configure(m) => m.encode(),
            Message::ConfigurationStored(m) => m.encode(),
            Message::ConfigurationError(m) => m.encode(),
            Message::InputValue(m) => m.encode(),
            Message::Heartbeat(m) => m.encode(),
            Message::SetOutput(m) => m.encode(),
            Message::LoadBldcProfile(m) => m.encode(),
            Message::DeactivateBldcProfile(m) => m.encode(),
        }
    }

    /// Decode a complete buffer, dispatching on its first byte.
    pub fn decode_any(buffer: &[u8]) -> ProtocolResult<Self> {
        let Some(&tag) = buffer.first() else {
            return Err(ProtocolError::InsufficientData);
        };
        let message = match tag {
            TAG_IDENTITY_REQUEST => Message::IdentityRequest(IdentityRequest::decode(buffer)?),
            TAG_IDENTITY_RESPONSE => Message::IdentityResponse(IdentityResponse::decode(buffer)?),
            TAG_CONFIGURE => Message::Configure(Configure::decode(buffer)?),
            TAG_CONFIGURATION_STORED => {
                Message::ConfigurationStored(ConfigurationStored::decode(buffer)?)
            }
            TAG_CONFIGURATION_ERROR => {
                Message::ConfigurationError(ConfigurationError::decode(buffer)?)
            }
            TAG_INPUT_VALUE => Message::InputValue(InputValue::decode(buffer)?),
            TAG_HEARTBEAT => Message::Heartbeat(Heartbeat::decode(buffer)?),
            TAG_SET_OUTPUT => Message::SetOutput(SetOutput::decode(buffer)?),
            TAG_LOAD_BLDC_PROFILE => Message::LoadBldcProfile(LoadBldcProfile::decode(buffer)?),
            TAG_DEACTIVATE_BLDC_PROFILE => {
                Message::DeactivateBldcProfile(DeactivateBldcProfile::decode(buffer)?)
            }
            other => return Err(ProtocolError::UnknownMessageType(other)),
        };
        Ok(message)
    }
}

macro_rules! impl_from_body {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Message {
                fn from(body: $variant) -> Self {
                    Message::$variant(body)
                }
            }
        )*
    };
}

impl_from_body!(
    IdentityRequest,
    IdentityResponse,
    Configure,
    ConfigurationStored,
    ConfigurationError,
    InputValue,
    Heartbeat,
    SetOutput,
    LoadBldcProfile,
    DeactivateBldcProfile,
);
