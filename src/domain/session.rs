use super::enums::Plan;
use crate::error::{BillableError, BillableResult};
use chrono::{DateTime, Duration, Utc};

/// Signed-in freelancer, passed explicitly to every operation that writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: String,
    pub plan: Plan,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Open a session valid for `ttl` from `now`
    pub fn open(identity: impl Into<String>, plan: Plan, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            identity: identity.into(),
            plan,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Reject operations once the session has lapsed
    pub fn ensure_active(&self, now: DateTime<Utc>) -> BillableResult<()> {
        if self.is_expired(now) {
            return Err(BillableError::SessionExpired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let session = Session::open("ana@example.com", Plan::Paid, now, Duration::hours(8));

        assert!(session.ensure_active(now).is_ok());
        assert!(session.ensure_active(now + Duration::minutes(479)).is_ok());
        assert!(matches!(
            session.ensure_active(now + Duration::hours(8)),
            Err(BillableError::SessionExpired)
        ));
    }
}
