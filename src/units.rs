macro_rules! unit {
    ($name: ident) => {
        #[derive(
            Debug,
            Default,
            Copy,
            Clone,
            PartialOrd,
            Ord,
            PartialEq,
            Eq,
            Hash,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::SubAssign,
            derive_more::Display,
            derive_more::FromStr,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const ZERO: $name = Self::new(0);
            pub const MAX: $name = Self::new(u64::MAX);

            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn into_u64(self) -> u64 {
                self.0
            }

            pub const fn into_f64(self) -> f64 {
                self.0 as f64
            }

            pub const fn checked_div(self, rhs: u64) -> Option<Self> {
                if rhs == 0 {
                    None
                } else {
                    Some(Self::new(self.0 / rhs))
                }
            }

            pub const fn saturating_sub(self, rhs: Self) -> Self {
                Self::new(self.0.saturating_sub(rhs.0))
            }
        }
    };
}

unit!(Nanosecs);
unit!(Microsecs);
unit!(Millisecs);
unit!(Secs);

impl Nanosecs {
    /// Whole microseconds; the sub-microsecond remainder is dropped.
    pub const fn into_us(self) -> Microsecs {
        Microsecs::new(self.0 / 1_000)
    }
}

impl Microsecs {
    pub const fn into_ns(self) -> Nanosecs {
        Nanosecs::new(self.0 * 1_000)
    }

    /// Fractional milliseconds, the unit delay and jitter are reported in.
    pub fn as_ms_f64(self) -> f64 {
        self.into_f64() / 1_000.0
    }
}

impl Millisecs {
    pub const fn into_us(self) -> Microsecs {
        Microsecs::new(self.0 * 1_000)
    }

    pub const fn into_ns(self) -> Nanosecs {
        self.into_us().into_ns()
    }
}

impl Secs {
    pub const fn into_ms(self) -> Millisecs {
        Millisecs::new(self.0 * 1_000)
    }

    pub const fn into_us(self) -> Microsecs {
        self.into_ms().into_us()
    }

    pub const fn into_ns(self) -> Nanosecs {
        self.into_us().into_ns()
    }
}

impl From<Microsecs> for Nanosecs {
    fn from(us: Microsecs) -> Self {
        us.into_ns()
    }
}

impl From<Millisecs> for Nanosecs {
    fn from(ms: Millisecs) -> Self {
        ms.into_ns()
    }
}

impl From<Secs> for Nanosecs {
    fn from(s: Secs) -> Self {
        s.into_ns()
    }
}

impl From<Millisecs> for Microsecs {
    fn from(ms: Millisecs) -> Self {
        ms.into_us()
    }
}

impl From<Secs> for Microsecs {
    fn from(s: Secs) -> Self {
        s.into_us()
    }
}

impl From<Secs> for Millisecs {
    fn from(s: Secs) -> Self {
        s.into_ms()
    }
}

unit!(Bits);
unit!(Bytes);

impl Bytes {
    pub const fn into_bits(self) -> Bits {
        Bits::new(self.0 * 8)
    }
}

impl From<Bytes> for Bits {
    fn from(val: Bytes) -> Self {
        val.into_bits()
    }
}

impl Bits {
    /// Average rate in Mb/s when these bits are spread over `window`. One bit per microsecond is
    /// one megabit per second.
    pub fn mbps_over(self, window: Microsecs) -> f64 {
        assert!(window != Microsecs::ZERO);
        self.into_f64() / window.into_f64()
    }
}

unit!(BitsPerSec);

impl BitsPerSec {
    /// Converts a rate given in Mb/s, which may be fractional, rounding to the nearest bit/s.
    /// Negative and non-finite rates are not representable and come out as zero.
    pub fn from_mbps(mbps: f64) -> Self {
        if mbps.is_finite() && mbps > 0.0 {
            Self((mbps * 1e6).round() as u64)
        } else {
            Self::ZERO
        }
    }

    /// Splits this rate evenly across `n` senders, rounding down.
    pub const fn share(self, n: u64) -> Option<Self> {
        self.checked_div(n)
    }
}
