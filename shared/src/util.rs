use chrono::{DateTime, Utc};

/// Current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current UTC timestamp as an RFC 3339 string (wire format)
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
