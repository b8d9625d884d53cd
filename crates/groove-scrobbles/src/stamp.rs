use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use serde_json::{Value, json};

/// Calendar components of one listening instant, UTC. This is the sub-key
/// format of the composite view keys: always all seven fields, so stamps
/// of equal precision collate chronologically. Field order matches the
/// array encoding, which makes the derived ordering chronological too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventStamp {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
}

impl EventStamp {
    /// The `[year, month, day, hour, minute, second, millisecond]` array
    /// used inside composite view keys.
    pub fn to_key(&self) -> Value {
        json!([
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.millisecond
        ])
    }

    /// Decode a sub-key array. Anything but a seven-integer array is
    /// rejected; partial stamps do not exist.
    pub fn from_key(value: &Value) -> Option<Self> {
        let parts = value.as_array()?;
        if parts.len() != 7 {
            return None;
        }
        let field = |index: usize| parts[index].as_i64();
        Some(Self {
            year: i32::try_from(field(0)?).ok()?,
            month: u32::try_from(field(1)?).ok()?,
            day: u32::try_from(field(2)?).ok()?,
            hour: u32::try_from(field(3)?).ok()?,
            minute: u32::try_from(field(4)?).ok()?,
            second: u32::try_from(field(5)?).ok()?,
            millisecond: u32::try_from(field(6)?).ok()?,
        })
    }

    /// Cursor token form, RFC 3339 with millisecond precision.
    pub fn token(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.millisecond
        )
    }

    /// Parse a cursor token back into a stamp.
    pub fn parse_token(token: &str) -> Result<Self, chrono::ParseError> {
        let instant = DateTime::parse_from_rfc3339(token)?;
        Ok(Self::from(instant.with_timezone(&Utc)))
    }

    /// The instant this stamp names, when its fields form a real calendar
    /// date.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        )
        .single()?
        .checked_add_signed(Duration::milliseconds(self.millisecond as i64))
    }
}

impl From<DateTime<Utc>> for EventStamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self {
            year: instant.year(),
            month: instant.month(),
            day: instant.day(),
            hour: instant.hour(),
            minute: instant.minute(),
            second: instant.second(),
            millisecond: instant.timestamp_subsec_millis(),
        }
    }
}
