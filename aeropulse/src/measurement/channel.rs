//! Sensor channel identifiers and per-record channel values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A sensor channel reported by the air-quality station.
///
/// The set is fixed: the station exposes four upstream feed fields
/// (`field1`..`field4`) which map onto these channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelName {
    /// Relative humidity in percent.
    Humidity,
    /// Air temperature in degrees Celsius.
    Temperature,
    /// Fine particulate matter (PM2.5) in µg/m³.
    Pm25,
    /// Coarse particulate matter (PM10) in µg/m³.
    Pm10,
}

impl ChannelName {
    /// All channels, in upstream field order.
    pub const ALL: [ChannelName; 4] = [
        ChannelName::Humidity,
        ChannelName::Temperature,
        ChannelName::Pm25,
        ChannelName::Pm10,
    ];

    /// The raw feed field key this channel maps from (`field1`..`field4`).
    pub fn field_key(&self) -> &'static str {
        match self {
            ChannelName::Humidity => "field1",
            ChannelName::Temperature => "field2",
            ChannelName::Pm25 => "field3",
            ChannelName::Pm10 => "field4",
        }
    }

    /// Canonical lowercase name, as used in snapshot file headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelName::Humidity => "humidity",
            ChannelName::Temperature => "temperature",
            ChannelName::Pm25 => "pm25",
            ChannelName::Pm10 => "pm10",
        }
    }

    /// Parse a canonical channel name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "humidity" => Some(ChannelName::Humidity),
            "temperature" => Some(ChannelName::Temperature),
            "pm25" => Some(ChannelName::Pm25),
            "pm10" => Some(ChannelName::Pm10),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values for every channel of a single measurement.
///
/// Missing or unparseable readings are `None`, never zero - a sensor
/// dropout must stay distinguishable from a genuine zero reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelValues {
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
}

impl ChannelValues {
    /// Look up a single channel's reading.
    pub fn get(&self, channel: ChannelName) -> Option<f64> {
        match channel {
            ChannelName::Humidity => self.humidity,
            ChannelName::Temperature => self.temperature,
            ChannelName::Pm25 => self.pm25,
            ChannelName::Pm10 => self.pm10,
        }
    }

    /// Set a single channel's reading.
    pub fn set(&mut self, channel: ChannelName, value: Option<f64>) {
        match channel {
            ChannelName::Humidity => self.humidity = value,
            ChannelName::Temperature => self.temperature = value,
            ChannelName::Pm25 => self.pm25 = value,
            ChannelName::Pm10 => self.pm10 = value,
        }
    }

    /// True if no channel carries a reading.
    pub fn is_empty(&self) -> bool {
        ChannelName::ALL.iter().all(|c| self.get(*c).is_none())
    }
}
