//! Experiment parameters.
//!
//! Most of these only matter to the simulator; this crate reads the timing, addressing and
//! per-class settings and passes the rest through to the settings banner.

use std::{fmt, net::Ipv4Addr, str::FromStr};

use crate::{
    class::ClassTable,
    error::{Error, Result},
    units::{BitsPerSec, Bytes, Microsecs, Millisecs, Nanosecs, Secs},
};

/// Propagation loss model of the wireless channel.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    derivative::Derivative,
    serde::Serialize,
    serde::Deserialize,
)]
#[derivative(Default)]
#[serde(try_from = "String", into = "String")]
pub enum LossModel {
    Friis,
    #[derivative(Default)]
    LogDistance,
    TwoRayGround,
    Nakagami,
}

impl LossModel {
    pub const fn name(self) -> &'static str {
        match self {
            LossModel::Friis => "Friis",
            LossModel::LogDistance => "LogDistance",
            LossModel::TwoRayGround => "TwoRayGround",
            LossModel::Nakagami => "Nakagami",
        }
    }
}

impl FromStr for LossModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Friis" => Ok(LossModel::Friis),
            "LogDistance" => Ok(LossModel::LogDistance),
            "TwoRayGround" => Ok(LossModel::TwoRayGround),
            "Nakagami" => Ok(LossModel::Nakagami),
            other => Err(Error::UnknownLossModel(other.to_owned())),
        }
    }
}

/// How stations are placed around the access point.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    derivative::Derivative,
    serde::Serialize,
    serde::Deserialize,
)]
#[derivative(Default)]
#[serde(try_from = "String", into = "String")]
pub enum Placement {
    Grid,
    Rectangle,
    #[derivative(Default)]
    Disc,
}

impl Placement {
    pub const fn name(self) -> &'static str {
        match self {
            Placement::Grid => "grid",
            Placement::Rectangle => "rectangle",
            Placement::Disc => "disc",
        }
    }
}

impl FromStr for Placement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "grid" => Ok(Placement::Grid),
            "rectangle" => Ok(Placement::Rectangle),
            "disc" => Ok(Placement::Disc),
            other => Err(Error::UnknownPlacement(other.to_owned())),
        }
    }
}

macro_rules! named_enum_conversions {
    ($name: ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(s: String) -> Result<Self> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(val: $name) -> Self {
                val.name().to_owned()
            }
        }
    };
}

named_enum_conversions!(LossModel);
named_enum_conversions!(Placement);

#[derive(
    Debug, Clone, PartialEq, typed_builder::TypedBuilder, serde::Serialize, serde::Deserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    /// Slow stations, in addition to the single fast station.
    #[builder(default = 19)]
    pub nr_stations: usize,
    #[builder(default = Bytes::new(1470), setter(into))]
    pub packet_size: Bytes,
    /// Generators stop and the run ends at this time. Milliseconds, as `sim_time_ms` in JSON.
    #[builder(default = Secs::new(10).into_ms(), setter(into))]
    #[serde(rename = "sim_time_ms")]
    pub sim_time: Millisecs,
    /// Start of the analysis window. Milliseconds, as `calc_start_ms` in JSON.
    #[builder(default, setter(into))]
    #[serde(rename = "calc_start_ms")]
    pub calc_start: Millisecs,
    /// Placement radius in meters.
    #[builder(default = 1.0)]
    pub radius: f64,
    #[builder(default)]
    pub placement: Placement,
    #[builder(default)]
    pub rts_cts: bool,
    #[builder(default = true)]
    pub vo: bool,
    #[builder(default = true)]
    pub vi: bool,
    #[builder(default = true)]
    pub be: bool,
    #[builder(default = true)]
    pub bk: bool,
    /// Load offered per class in Mb/s, split across the stations. May be fractional.
    #[builder(default = 10.0)]
    pub offered_load: f64,
    #[builder(default = 1)]
    pub seed: u64,
    #[builder(default = 7)]
    pub mcs: u8,
    /// Channel width in MHz.
    #[builder(default = 20)]
    pub channel_width: u16,
    #[builder(default = Nanosecs::new(800), setter(into))]
    pub guard_interval: Nanosecs,
    #[builder(default)]
    pub loss_model: LossModel,
    #[builder(default = Ipv4Addr::new(192, 168, 1, 0))]
    pub network: Ipv4Addr,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Scenario {
    /// The access point, the fast station and the slow stations.
    pub fn nr_nodes(&self) -> usize {
        self.nr_stations + 2
    }

    pub fn classes(&self) -> ClassTable {
        ClassTable::new(self.vo, self.vi, self.be, self.bk)
    }

    /// The interval throughput is averaged over: simulation time minus analysis start.
    pub fn analysis_window(&self) -> Result<Microsecs> {
        let window = self.sim_time.saturating_sub(self.calc_start);
        if window == Millisecs::ZERO {
            return Err(Error::EmptyWindow {
                sim_time: self.sim_time,
                calc_start: self.calc_start,
            });
        }
        Ok(window.into_us())
    }

    /// The per-class offered load as a rate.
    pub fn offered_rate(&self) -> BitsPerSec {
        BitsPerSec::from_mbps(self.offered_load)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.offered_load.is_finite() && self.offered_load >= 0.0) {
            return Err(Error::InvalidOfferedLoad(self.offered_load));
        }
        self.analysis_window().map(|_| ())
    }
}
