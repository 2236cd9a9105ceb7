use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Short-lived bearer credential for the mailbox API. The remote side
/// can invalidate it at any time; `acquired_at_unix` only records when
/// we got it, expiry is discovered through a 401.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub acquired_at_unix: u64,
}

impl Credential {
    pub fn acquired_now(token: String) -> Self {
        Self {
            token,
            acquired_at_unix: now_unix(),
        }
    }
}

pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_acquisition_time() {
        let credential = Credential::acquired_now("tok".to_string());
        assert_eq!(credential.token, "tok");
        assert!(credential.acquired_at_unix > 0);
    }

    #[test]
    fn round_trips_through_json() {
        let credential = Credential {
            token: "abc".to_string(),
            acquired_at_unix: 1_700_000_000,
        };

        let raw = serde_json::to_string(&credential).expect("serialize");
        let back: Credential = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(back, credential);
    }
}
