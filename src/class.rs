//! Traffic classes and how they are carried on the wire.
//!
//! A flow's class is never signalled explicitly: the destination port carries it (`1000 + tid`)
//! and the type-of-service byte carries the user priority the MAC uses to pick an EDCA queue.

use std::fmt;

/// Traffic identifier: an 802.11 user priority in `0..=7`.
#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash, derive_more::Display)]
pub struct Tid(u8);

impl Tid {
    pub const COUNT: usize = 8;
    /// Destination port of TID 0.
    pub const BASE_PORT: u16 = 1000;

    pub const fn new(value: u8) -> Option<Self> {
        if value < Self::COUNT as u8 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn all() -> impl Iterator<Item = Tid> {
        (0..Self::COUNT as u8).map(Tid)
    }

    pub const fn into_u8(self) -> u8 {
        self.0
    }

    pub const fn into_usize(self) -> usize {
        self.0 as usize
    }

    pub const fn port(self) -> u16 {
        Self::BASE_PORT + self.0 as u16
    }

    /// The type-of-service byte: the TID in the three precedence bits.
    pub const fn tos(self) -> u8 {
        self.0 << 5
    }

    pub fn from_port(port: u16) -> Option<Self> {
        let offset = port.checked_sub(Self::BASE_PORT)?;
        u8::try_from(offset).ok().and_then(Self::new)
    }
}

/// The access categories traffic is generated for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessCategory {
    BestEffort,
    Background,
    Video,
    Voice,
}

impl AccessCategory {
    pub const fn tid(self) -> Tid {
        match self {
            AccessCategory::BestEffort => Tid(0),
            AccessCategory::Background => Tid(1),
            AccessCategory::Video => Tid(5),
            AccessCategory::Voice => Tid(6),
        }
    }

    pub fn from_tid(tid: Tid) -> Option<Self> {
        match tid.into_u8() {
            0 => Some(AccessCategory::BestEffort),
            1 => Some(AccessCategory::Background),
            5 => Some(AccessCategory::Video),
            6 => Some(AccessCategory::Voice),
            _ => None,
        }
    }

    pub const fn abbrev(self) -> &'static str {
        match self {
            AccessCategory::BestEffort => "BE",
            AccessCategory::Background => "BK",
            AccessCategory::Video => "VI",
            AccessCategory::Voice => "VO",
        }
    }
}

impl fmt::Display for AccessCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessCategory::BestEffort => "BestEffort",
            AccessCategory::Background => "Background",
            AccessCategory::Video => "Video",
            AccessCategory::Voice => "Voice",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, derive_new::new)]
pub struct ClassDesc {
    pub category: AccessCategory,
    pub enabled: bool,
}

impl ClassDesc {
    pub const fn tid(&self) -> Tid {
        self.category.tid()
    }
}

/// The per-class table driving both traffic generation and reporting, ordered by TID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTable {
    classes: [ClassDesc; 4],
}

impl ClassTable {
    pub fn new(vo: bool, vi: bool, be: bool, bk: bool) -> Self {
        Self {
            classes: [
                ClassDesc::new(AccessCategory::BestEffort, be),
                ClassDesc::new(AccessCategory::Background, bk),
                ClassDesc::new(AccessCategory::Video, vi),
                ClassDesc::new(AccessCategory::Voice, vo),
            ],
        }
    }

    pub fn all_enabled() -> Self {
        Self::new(true, true, true, true)
    }

    /// Every class in the table, whether or not it generates traffic.
    pub fn iter(&self) -> impl Iterator<Item = &ClassDesc> {
        self.classes.iter()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &ClassDesc> {
        self.classes.iter().filter(|c| c.enabled)
    }

    pub fn contains(&self, tid: Tid) -> bool {
        self.classes.iter().any(|c| c.tid() == tid)
    }
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::all_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_round_trip_for_every_tid() {
        for tid in Tid::all() {
            assert_eq!(Tid::from_port(tid.port()), Some(tid));
        }
    }

    #[test]
    fn ports_classify_into_categories() {
        let cat = |port| Tid::from_port(port).and_then(AccessCategory::from_tid);
        assert_eq!(cat(1006), Some(AccessCategory::Voice));
        assert_eq!(cat(1005), Some(AccessCategory::Video));
        assert_eq!(cat(1000), Some(AccessCategory::BestEffort));
        assert_eq!(cat(1001), Some(AccessCategory::Background));
        assert_eq!(cat(1003), None);
    }

    #[test]
    fn out_of_range_ports() {
        assert_eq!(Tid::from_port(1500), None);
        assert_eq!(Tid::from_port(1008), None);
        assert_eq!(Tid::from_port(999), None);
        assert_eq!(Tid::from_port(9), None);
    }

    #[test]
    fn tos_marking() {
        assert_eq!(AccessCategory::Voice.tid().tos(), 0xc0);
        assert_eq!(AccessCategory::Video.tid().tos(), 0xa0);
        assert_eq!(AccessCategory::Background.tid().tos(), 0x20);
        assert_eq!(AccessCategory::BestEffort.tid().tos(), 0x00);
    }

    #[test]
    fn table_order_and_flags() {
        let table = ClassTable::new(true, false, true, false);
        let tids = table.iter().map(|c| c.tid().into_u8()).collect::<Vec<_>>();
        assert_eq!(tids, vec![0, 1, 5, 6]);
        let enabled = table.enabled().map(|c| c.category).collect::<Vec<_>>();
        assert_eq!(
            enabled,
            vec![AccessCategory::BestEffort, AccessCategory::Voice]
        );
    }
}
