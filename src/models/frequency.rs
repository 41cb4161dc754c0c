use serde::Serialize;

/// Repetition cadence of a tracked item. Stored as its integer code.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Frequency {
    Key,   // 0
    Loop,  // 1
    Day,   // 2
    Week,  // 3
    Month, // 4
}

impl Frequency {
    pub const ALL: [Frequency; 5] = [
        Frequency::Key,
        Frequency::Loop,
        Frequency::Day,
        Frequency::Week,
        Frequency::Month,
    ];

    /// Convert enum → DB code
    pub fn code(&self) -> i64 {
        match self {
            Frequency::Key => 0,
            Frequency::Loop => 1,
            Frequency::Day => 2,
            Frequency::Week => 3,
            Frequency::Month => 4,
        }
    }

    /// Convert DB code → enum
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Frequency::Key),
            1 => Some(Frequency::Loop),
            2 => Some(Frequency::Day),
            3 => Some(Frequency::Week),
            4 => Some(Frequency::Month),
            _ => None,
        }
    }

    /// Member name, as matched by the deserializer (`KEY`, `LOOP`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            Frequency::Key => "KEY",
            Frequency::Loop => "LOOP",
            Frequency::Day => "DAY",
            Frequency::Week => "WEEK",
            Frequency::Month => "MONTH",
        }
    }

    /// Title-cased display name (`Key`, `Loop`, ...).
    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Key => "Key",
            Frequency::Loop => "Loop",
            Frequency::Day => "Day",
            Frequency::Week => "Week",
            Frequency::Month => "Month",
        }
    }

    /// Case-insensitive lookup by member name.
    pub fn from_name(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        Self::ALL.into_iter().find(|f| f.name() == upper)
    }
}
