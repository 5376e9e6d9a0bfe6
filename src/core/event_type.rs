//! Event type and trace option bitmasks

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};
use std::str::FromStr;

macro_rules! bitmask {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $kind:literal {
            $( $(#[$fmeta:meta])* const $flag:ident = $value:expr, $label:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u32);

        impl $name {
            $( $(#[$fmeta])* pub const $flag: Self = Self($value); )+

            const FLAGS: &'static [(Self, &'static str)] = &[$( (Self::$flag, $label), )+];

            /// Mask with no bits set
            pub const fn empty() -> Self {
                Self(0)
            }

            /// Mask with every named bit set
            pub const fn all() -> Self {
                Self(0 $( | $value )+)
            }

            pub const fn from_bits_truncate(bits: u32) -> Self {
                Self(bits & Self::all().0)
            }

            pub const fn bits(self) -> u32 {
                self.0
            }

            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// True when every bit of `other` is also set in `self`
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// True when at least one bit is shared
            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            /// The named flags set in this mask, lowest bit first
            pub fn iter(self) -> impl Iterator<Item = Self> {
                Self::FLAGS
                    .iter()
                    .map(|(flag, _)| *flag)
                    .filter(move |flag| self.contains(*flag))
            }

            fn label(self) -> Option<&'static str> {
                Self::FLAGS
                    .iter()
                    .find(|(flag, _)| *flag == self)
                    .map(|(_, label)| *label)
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl BitAnd for $name {
            type Output = Self;

            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }

        impl BitAndAssign for $name {
            fn bitand_assign(&mut self, rhs: Self) {
                self.0 &= rhs.0;
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_empty() {
                    return f.write_str("None");
                }
                let mut first = true;
                for flag in self.iter() {
                    if !first {
                        f.write_str("|")?;
                    }
                    f.write_str(flag.label().unwrap_or("?"))?;
                    first = false;
                }
                Ok(())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.eq_ignore_ascii_case("none") {
                    return Ok(Self::empty());
                }
                let mut mask = Self::empty();
                for part in trimmed.split(|c: char| c == '|' || c == ',') {
                    let part = part.trim();
                    let flag = Self::FLAGS
                        .iter()
                        .find(|(_, label)| label.eq_ignore_ascii_case(part))
                        .map(|(flag, _)| *flag)
                        .ok_or_else(|| format!("Invalid {}: '{}'", $kind, part))?;
                    mask |= flag;
                }
                Ok(mask)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

bitmask! {
    /// Kind of a loggable event
    ///
    /// Bits may combine: an entry can be both `ERROR` and `STOP`, for example.
    /// Filters test entries against masks of these bits.
    ///
    /// # Example
    ///
    /// ```
    /// use log_dispatch::EventType;
    ///
    /// let kind = EventType::ERROR | EventType::STOP;
    /// assert!(kind.contains(EventType::ERROR));
    /// assert_eq!(kind.to_string(), "Error|Stop");
    /// assert_eq!("error|stop".parse::<EventType>().unwrap(), kind);
    /// ```
    pub struct EventType: "event type" {
        const CRITICAL = 0x0001, "Critical";
        const ERROR = 0x0002, "Error";
        const WARNING = 0x0004, "Warning";
        const INFORMATION = 0x0008, "Information";
        const VERBOSE = 0x0010, "Verbose";
        /// Starting of a logical operation
        const START = 0x0100, "Start";
        /// Stopping of a logical operation
        const STOP = 0x0200, "Stop";
        const SUSPEND = 0x0400, "Suspend";
        const RESUME = 0x0800, "Resume";
        /// Change of correlation identity
        const TRANSFER = 0x1000, "Transfer";
    }
}

bitmask! {
    /// Diagnostic fields captured when an entry is constructed
    pub struct TraceOptions: "trace option" {
        const TIMESTAMP = 0x01, "Timestamp";
        const PROCESS_ID = 0x02, "ProcessId";
        const THREAD_ID = 0x04, "ThreadId";
        /// Capture a backtrace; expensive
        const CALLSTACK = 0x08, "Callstack";
    }
}

impl EventType {
    /// True for `CRITICAL` and `ERROR` entries
    pub const fn is_failure(self) -> bool {
        self.intersects(Self(Self::CRITICAL.0 | Self::ERROR.0))
    }
}

impl Default for EventType {
    fn default() -> Self {
        Self::VERBOSE
    }
}

impl TraceOptions {
    /// Options applied when an entry does not choose its own
    pub const DEFAULT: Self = Self(Self::TIMESTAMP.0 | Self::PROCESS_ID.0 | Self::THREAD_ID.0);
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let kind = EventType::WARNING | EventType::TRANSFER;
        assert_eq!(kind.to_string(), "Warning|Transfer");
        assert_eq!("WARNING, transfer".parse::<EventType>().unwrap(), kind);
        assert_eq!(EventType::empty().to_string(), "None");
        assert_eq!("none".parse::<EventType>().unwrap(), EventType::empty());
    }

    #[test]
    fn test_parse_rejects_unknown_flag() {
        let err = "Error|Fatal".parse::<EventType>().unwrap_err();
        assert_eq!(err, "Invalid event type: 'Fatal'");
    }

    #[test]
    fn test_contains_requires_all_bits() {
        let kind = EventType::ERROR | EventType::START;
        assert!(kind.contains(EventType::ERROR));
        assert!(kind.contains(EventType::ERROR | EventType::START));
        assert!(!kind.contains(EventType::ERROR | EventType::STOP));
        assert!(kind.intersects(EventType::ERROR | EventType::STOP));
    }

    #[test]
    fn test_from_bits_truncate_drops_unknown_bits() {
        let kind = EventType::from_bits_truncate(0x0002 | 0x0020);
        assert_eq!(kind, EventType::ERROR);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&(EventType::CRITICAL | EventType::ERROR)).unwrap();
        assert_eq!(json, "\"Critical|Error\"");
        let back: EventType = serde_json::from_str(&json).unwrap();
        assert!(back.is_failure());
    }

    #[test]
    fn test_default_trace_options() {
        assert!(TraceOptions::DEFAULT.contains(TraceOptions::TIMESTAMP));
        assert!(!TraceOptions::DEFAULT.contains(TraceOptions::CALLSTACK));
        assert_eq!(TraceOptions::DEFAULT.to_string(), "Timestamp|ProcessId|ThreadId");
        assert_eq!(TraceOptions::default(), TraceOptions::DEFAULT);
    }

    #[test]
    fn test_default_event_type_is_verbose() {
        assert_eq!(EventType::default(), EventType::VERBOSE);
        assert!(!EventType::default().is_empty());
    }
}
