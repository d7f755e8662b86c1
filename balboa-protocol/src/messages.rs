//! Message types for the Balboa spa bus
//!
//! Message types are divided into two categories:
//! - Spa → client: negotiation, clear-to-send, status and settings replies
//! - Client → spa: registration, toggles, setpoints and settings requests

use crate::frame::{Frame, FrameError};

/// Magic byte on status broadcasts
pub const MAGIC_BROADCAST: u8 = 0xAF;
/// Magic byte on addressed frames (always used by clients)
pub const MAGIC_ADDRESSED: u8 = 0xBF;

/// Broadcast channel carrying status updates
pub const CHANNEL_BROADCAST: u8 = 0xFF;
/// Channel used while negotiating a client id
pub const CHANNEL_NEW_CLIENT: u8 = 0xFE;
/// Highest client channel the spa hands out
pub const MAX_CLIENT_CHANNEL: u8 = 0x2F;

// Message type IDs: spa → client
pub const MSG_NEW_CLIENT_QUERY: u8 = 0x00;
pub const MSG_ID_ASSIGNED: u8 = 0x02;
pub const MSG_CLEAR_TO_SEND: u8 = 0x06;
pub const MSG_STATUS: u8 = 0x13;
pub const MSG_FILTER_CYCLES: u8 = 0x23;
pub const MSG_FAULT_LOG: u8 = 0x28;
pub const MSG_CONFIGURATION: u8 = 0x2E;

// Message type IDs: client → spa
pub const MSG_ID_REQUEST: u8 = 0x01;
pub const MSG_ID_ACK: u8 = 0x03;
pub const MSG_NOTHING_TO_SEND: u8 = 0x07;
pub const MSG_TOGGLE_ITEM: u8 = 0x11;
pub const MSG_SET_TEMPERATURE: u8 = 0x20;
pub const MSG_SET_TIME: u8 = 0x21;
pub const MSG_SETTINGS_REQUEST: u8 = 0x22;

/// Fixed payload of an ID request
const ID_REQUEST_PAYLOAD: [u8; 3] = [0x02, 0xF1, 0x73];

/// Items the spa toggles on request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ToggleItem {
    Jet1,
    Jet2,
    Jet3,
    Blower,
    Lights,
    Lights2,
    /// Switch between low and high temperature range
    TempRange,
}

// Wire format values
const ITEM_JET1: u8 = 0x04;
const ITEM_JET2: u8 = 0x05;
const ITEM_JET3: u8 = 0x06;
const ITEM_BLOWER: u8 = 0x0C;
const ITEM_LIGHTS: u8 = 0x11;
const ITEM_LIGHTS2: u8 = 0x12;
const ITEM_TEMP_RANGE: u8 = 0x50;

impl ToggleItem {
    /// Parse an item from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            ITEM_JET1 => Some(ToggleItem::Jet1),
            ITEM_JET2 => Some(ToggleItem::Jet2),
            ITEM_JET3 => Some(ToggleItem::Jet3),
            ITEM_BLOWER => Some(ToggleItem::Blower),
            ITEM_LIGHTS => Some(ToggleItem::Lights),
            ITEM_LIGHTS2 => Some(ToggleItem::Lights2),
            ITEM_TEMP_RANGE => Some(ToggleItem::TempRange),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            ToggleItem::Jet1 => ITEM_JET1,
            ToggleItem::Jet2 => ITEM_JET2,
            ToggleItem::Jet3 => ITEM_JET3,
            ToggleItem::Blower => ITEM_BLOWER,
            ToggleItem::Lights => ITEM_LIGHTS,
            ToggleItem::Lights2 => ITEM_LIGHTS2,
            ToggleItem::TempRange => ITEM_TEMP_RANGE,
        }
    }
}

/// Settings the client can ask the spa to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsKind {
    /// Installed equipment (answered with 0x2E)
    Configuration,
    /// Most recent fault log entry (answered with 0x28)
    FaultLog,
    /// Filter cycle schedule (answered with 0x23)
    FilterCycles,
}

impl SettingsKind {
    fn request_payload(self) -> [u8; 3] {
        match self {
            SettingsKind::Configuration => [0x00, 0x00, 0x01],
            SettingsKind::FaultLog => [0x20, 0xFF, 0x00],
            SettingsKind::FilterCycles => [0x01, 0x00, 0x00],
        }
    }

    fn from_request_payload(payload: &[u8]) -> Option<Self> {
        match payload {
            [0x00, 0x00, 0x01] => Some(SettingsKind::Configuration),
            [0x20, 0xFF, 0x00] => Some(SettingsKind::FaultLog),
            [0x01, 0x00, 0x00] => Some(SettingsKind::FilterCycles),
            _ => None,
        }
    }
}

/// Messages from the client to the spa
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClientMessage {
    /// Ask for a channel (answer to a new-client query)
    IdRequest,
    /// Accept the channel the spa assigned
    IdAck { channel: u8 },
    /// Decline a clear-to-send
    NothingToSend { channel: u8 },
    /// Toggle a pump, light, blower or the temperature range
    Toggle { channel: u8, item: ToggleItem },
    /// Set the target temperature (raw spa units)
    SetTemperature { channel: u8, raw: u8 },
    /// Set the spa clock
    SetTime { channel: u8, hour: u8, minute: u8 },
    /// Ask for a settings report
    SettingsRequest { channel: u8, kind: SettingsKind },
}

impl ClientMessage {
    /// Encode this message into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match *self {
            ClientMessage::IdRequest => Frame::new(
                CHANNEL_NEW_CLIENT,
                MAGIC_ADDRESSED,
                MSG_ID_REQUEST,
                &ID_REQUEST_PAYLOAD,
            ),
            ClientMessage::IdAck { channel } => {
                Ok(Frame::empty(channel, MAGIC_ADDRESSED, MSG_ID_ACK))
            }
            ClientMessage::NothingToSend { channel } => {
                Ok(Frame::empty(channel, MAGIC_ADDRESSED, MSG_NOTHING_TO_SEND))
            }
            ClientMessage::Toggle { channel, item } => Frame::new(
                channel,
                MAGIC_ADDRESSED,
                MSG_TOGGLE_ITEM,
                &[item.to_byte(), 0x00],
            ),
            ClientMessage::SetTemperature { channel, raw } => {
                Frame::new(channel, MAGIC_ADDRESSED, MSG_SET_TEMPERATURE, &[raw])
            }
            ClientMessage::SetTime {
                channel,
                hour,
                minute,
            } => Frame::new(channel, MAGIC_ADDRESSED, MSG_SET_TIME, &[hour, minute]),
            ClientMessage::SettingsRequest { channel, kind } => Frame::new(
                channel,
                MAGIC_ADDRESSED,
                MSG_SETTINGS_REQUEST,
                &kind.request_payload(),
            ),
        }
    }

    /// Parse a client message from a frame (for bus sniffing and testing)
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        let channel = frame.channel;
        let payload = frame.payload.as_slice();
        match frame.msg_type {
            MSG_ID_REQUEST if channel == CHANNEL_NEW_CLIENT => Ok(ClientMessage::IdRequest),
            MSG_ID_ACK => Ok(ClientMessage::IdAck { channel }),
            MSG_NOTHING_TO_SEND => Ok(ClientMessage::NothingToSend { channel }),
            MSG_TOGGLE_ITEM => {
                let item = payload
                    .first()
                    .and_then(|&b| ToggleItem::from_byte(b))
                    .ok_or(FrameError::InvalidFrame)?;
                Ok(ClientMessage::Toggle { channel, item })
            }
            MSG_SET_TEMPERATURE => {
                let raw = *payload.first().ok_or(FrameError::InvalidFrame)?;
                Ok(ClientMessage::SetTemperature { channel, raw })
            }
            MSG_SET_TIME => match payload {
                [hour, minute, ..] => Ok(ClientMessage::SetTime {
                    channel,
                    hour: *hour,
                    minute: *minute,
                }),
                _ => Err(FrameError::InvalidFrame),
            },
            MSG_SETTINGS_REQUEST => {
                let kind =
                    SettingsKind::from_request_payload(payload).ok_or(FrameError::InvalidFrame)?;
                Ok(ClientMessage::SettingsRequest { channel, kind })
            }
            _ => Err(FrameError::InvalidFrame),
        }
    }
}

/// Messages from the spa, classified by channel and type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpaMessage {
    /// "Any new clients?" on the negotiation channel
    NewClientQuery,
    /// A channel was handed out on the negotiation channel
    IdAssigned { channel: u8 },
    /// The addressed client may send one frame now
    ClearToSend { channel: u8 },
    /// Status broadcast; decode the payload with `StatusSnapshot`
    Status,
    /// Configuration reply addressed to `channel`
    Configuration { channel: u8 },
    /// Fault log reply addressed to `channel`
    FaultLog { channel: u8 },
    /// Filter cycle reply addressed to `channel`
    FilterCycles { channel: u8 },
    /// Anything else seen on the bus
    Other { channel: u8, msg_type: u8 },
}

impl SpaMessage {
    /// Classify a frame received from the bus
    pub fn classify(frame: &Frame) -> Self {
        let channel = frame.channel;
        match (channel, frame.msg_type) {
            (CHANNEL_NEW_CLIENT, MSG_NEW_CLIENT_QUERY) => SpaMessage::NewClientQuery,
            (CHANNEL_NEW_CLIENT, MSG_ID_ASSIGNED) => match frame.payload.first() {
                Some(&assigned) => SpaMessage::IdAssigned { channel: assigned },
                None => SpaMessage::Other {
                    channel,
                    msg_type: MSG_ID_ASSIGNED,
                },
            },
            (CHANNEL_BROADCAST, MSG_STATUS) => SpaMessage::Status,
            (_, MSG_CLEAR_TO_SEND) => SpaMessage::ClearToSend { channel },
            (_, MSG_CONFIGURATION) => SpaMessage::Configuration { channel },
            (_, MSG_FAULT_LOG) => SpaMessage::FaultLog { channel },
            (_, MSG_FILTER_CYCLES) => SpaMessage::FilterCycles { channel },
            (_, msg_type) => SpaMessage::Other { channel, msg_type },
        }
    }

    /// Channel the spa addressed, if the message targets one client
    pub fn addressed_channel(&self) -> Option<u8> {
        match *self {
            SpaMessage::ClearToSend { channel }
            | SpaMessage::Configuration { channel }
            | SpaMessage::FaultLog { channel }
            | SpaMessage::FilterCycles { channel } => Some(channel),
            _ => None,
        }
    }
}

/// Clamp a channel handed out by the spa to the range clients may use
pub fn clamp_client_channel(channel: u8) -> u8 {
    channel.min(MAX_CLIENT_CHANNEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_request_frame() {
        let frame = ClientMessage::IdRequest.to_frame().unwrap();
        let encoded = frame.encode_to_vec().unwrap();
        assert_eq!(
            encoded.as_slice(),
            &[0x7E, 0x08, 0xFE, 0xBF, 0x01, 0x02, 0xF1, 0x73, 0xB9, 0x7E]
        );
    }

    #[test]
    fn test_toggle_frame() {
        let msg = ClientMessage::Toggle {
            channel: 0x10,
            item: ToggleItem::Jet1,
        };
        let encoded = msg.to_frame().unwrap().encode_to_vec().unwrap();
        assert_eq!(
            encoded.as_slice(),
            &[0x7E, 0x07, 0x10, 0xBF, 0x11, 0x04, 0x00, 0x6A, 0x7E]
        );
    }

    #[test]
    fn test_settings_request_payloads() {
        let frame = ClientMessage::SettingsRequest {
            channel: 0x10,
            kind: SettingsKind::FaultLog,
        }
        .to_frame()
        .unwrap();
        assert_eq!(frame.msg_type, MSG_SETTINGS_REQUEST);
        assert_eq!(frame.payload.as_slice(), &[0x20, 0xFF, 0x00]);
    }

    #[test]
    fn test_toggle_item_bytes() {
        let items = [
            ToggleItem::Jet1,
            ToggleItem::Jet2,
            ToggleItem::Jet3,
            ToggleItem::Blower,
            ToggleItem::Lights,
            ToggleItem::Lights2,
            ToggleItem::TempRange,
        ];
        for item in items {
            assert_eq!(ToggleItem::from_byte(item.to_byte()), Some(item));
        }
        assert_eq!(ToggleItem::Lights2.to_byte(), 0x12);
        assert!(ToggleItem::from_byte(0xFF).is_none());
    }

    #[test]
    fn test_classify_negotiation() {
        let query = Frame::empty(0xFE, 0xBF, 0x00);
        assert_eq!(SpaMessage::classify(&query), SpaMessage::NewClientQuery);

        let assigned = Frame::new(0xFE, 0xBF, 0x02, &[0x11]).unwrap();
        assert_eq!(
            SpaMessage::classify(&assigned),
            SpaMessage::IdAssigned { channel: 0x11 }
        );
    }

    #[test]
    fn test_classify_addressed() {
        let cts = Frame::empty(0x10, 0xBF, 0x06);
        let msg = SpaMessage::classify(&cts);
        assert_eq!(msg, SpaMessage::ClearToSend { channel: 0x10 });
        assert_eq!(msg.addressed_channel(), Some(0x10));

        let status = Frame::empty(0xFF, 0xAF, 0x13);
        assert_eq!(SpaMessage::classify(&status), SpaMessage::Status);
        assert_eq!(SpaMessage::Status.addressed_channel(), None);
    }

    #[test]
    fn test_clamp_channel() {
        assert_eq!(clamp_client_channel(0x10), 0x10);
        assert_eq!(clamp_client_channel(0x35), 0x2F);
    }

    #[test]
    fn test_client_message_parse() {
        let message = ClientMessage::SetTime {
            channel: 0x10,
            hour: 21,
            minute: 5,
        };
        let parsed = ClientMessage::from_frame(&message.to_frame().unwrap()).unwrap();
        assert_eq!(parsed, message);
    }
}
