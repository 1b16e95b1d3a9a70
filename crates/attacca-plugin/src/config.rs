//! Configuration snapshots and the flat parameter surface used for host
//! save/restore.
//!
//! Every mapping field is addressable under a stable string key per
//! channel slot (`ch<slot>.<field>`, plus the global `port`), so the host
//! shell can persist and restore state one scalar at a time. Out-of-range
//! values are clamped here, at the configuration boundary, before they
//! reach the bridge core.

use serde::{Deserialize, Serialize};

use attacca_bridge::MessageKind;

use crate::error::{Error, Result};

/// Number of bridge channel slots.
pub const NUM_CHANNELS: usize = 8;

/// Default OSC listening port.
pub const DEFAULT_PORT: u16 = 6666;

/// Mapping configuration for one channel slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub address: String,
    pub input_min: f32,
    pub input_max: f32,
    /// 1-based MIDI channel.
    pub output_channel: u8,
    pub output_number: u8,
    pub kind: MessageKind,
    pub muted: bool,
}

impl ChannelConfig {
    /// Default mapping for a slot: `/<slot+1>/value` driving a note at
    /// `48 + slot` on MIDI channel 1.
    pub fn for_slot(slot: usize) -> Self {
        Self {
            address: format!("/{}/value", slot + 1),
            input_min: 0.0,
            input_max: 1.0,
            output_channel: 1,
            output_number: (48 + slot).min(127) as u8,
            kind: MessageKind::Note,
            muted: false,
        }
    }

    /// Clamp MIDI ranges in place.
    pub fn clamp(&mut self) {
        self.output_channel = self.output_channel.clamp(1, 16);
        self.output_number = self.output_number.min(127);
    }
}

/// Full bridge configuration: the listening port plus one mapping per
/// slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub port: u16,
    pub channels: Vec<ChannelConfig>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            channels: (0..NUM_CHANNELS).map(ChannelConfig::for_slot).collect(),
        }
    }
}

impl BridgeConfig {
    /// Flatten into `(key, value)` pairs for host persistence.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("port".to_owned(), self.port.to_string())];
        for (slot, channel) in self.channels.iter().enumerate() {
            let key = |field: &str| format!("ch{}.{}", slot, field);
            pairs.push((key("address"), channel.address.clone()));
            pairs.push((key("input_min"), channel.input_min.to_string()));
            pairs.push((key("input_max"), channel.input_max.to_string()));
            pairs.push((key("output_channel"), channel.output_channel.to_string()));
            pairs.push((key("output_number"), channel.output_number.to_string()));
            pairs.push((key("kind"), (channel.kind as u8).to_string()));
            pairs.push((key("muted"), (channel.muted as u8).to_string()));
        }
        pairs
    }

    /// Apply one persisted `(key, value)` pair. Unknown keys and
    /// unparsable values are errors; out-of-range numbers are clamped.
    pub fn set_pair(&mut self, key: &str, value: &str) -> Result<()> {
        if key == "port" {
            self.port = parse(key, value)?;
            return Ok(());
        }

        let (slot, field) = key
            .strip_prefix("ch")
            .and_then(|rest| rest.split_once('.'))
            .ok_or_else(|| Error::UnknownKey(key.to_owned()))?;
        let slot: usize = slot
            .parse()
            .map_err(|_| Error::UnknownKey(key.to_owned()))?;
        let channel = self
            .channels
            .get_mut(slot)
            .ok_or_else(|| Error::UnknownKey(key.to_owned()))?;

        match field {
            "address" => channel.address = value.to_owned(),
            "input_min" => channel.input_min = parse(key, value)?,
            "input_max" => channel.input_max = parse(key, value)?,
            "output_channel" => channel.output_channel = parse::<u8>(key, value)?.clamp(1, 16),
            "output_number" => channel.output_number = parse::<u8>(key, value)?.min(127),
            "kind" => channel.kind = MessageKind::from_u8(parse(key, value)?),
            "muted" => {
                channel.muted = match value {
                    "0" | "false" => false,
                    "1" | "true" => true,
                    _ => {
                        return Err(Error::InvalidValue {
                            key: key.to_owned(),
                            value: value.to_owned(),
                        })
                    }
                }
            }
            _ => return Err(Error::UnknownKey(key.to_owned())),
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| Error::InvalidValue {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}
