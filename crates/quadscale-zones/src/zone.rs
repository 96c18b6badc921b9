//! zone and zone-policy types.

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};

/// a named network region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// unique zone identifier.
    pub id: String,
    /// human-readable name.
    pub name: String,
    /// the subnet this zone covers, if it is network-derived.
    pub subnet: Option<IpNet>,
    /// minimum entitlement level; above zero the caller must hold the
    /// zone in its claims regardless of policy outcome.
    pub access_level: u8,
    /// free-form description.
    pub description: String,
}

/// input for registering a zone; the subnet arrives as text and is
/// parsed eagerly so malformed cidr fails at registration time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneDefinition {
    /// unique zone identifier.
    pub id: String,
    /// human-readable name.
    pub name: String,
    /// optional cidr subnet (e.g. `"10.20.0.0/16"`).
    #[serde(default)]
    pub subnet: Option<String>,
    /// minimum entitlement level.
    #[serde(default)]
    pub access_level: u8,
    /// free-form description.
    #[serde(default)]
    pub description: String,
}

/// access rules attached to a zone.
///
/// zones and policies are independent maps keyed by zone id; a zone may
/// exist with no policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZonePolicy {
    /// the zone this policy applies to.
    pub zone_id: String,
    /// roles allowed into the zone; empty means any role.
    #[serde(default)]
    pub allowed_roles: Vec<String>,
    /// subjects always allowed (overrides role checks, not the deny list).
    #[serde(default)]
    pub allowed_users: Vec<String>,
    /// subjects always denied; wins over every allow rule.
    #[serde(default)]
    pub denied_users: Vec<String>,
    /// zones a caller may originate from when `require_zone_auth` is set.
    #[serde(default)]
    pub allowed_from: Vec<String>,
    /// require the caller's ip-derived zone to be the target zone or one
    /// of `allowed_from`.
    #[serde(default)]
    pub require_zone_auth: bool,
    /// access windows; empty means always.
    #[serde(default)]
    pub time_restrictions: Vec<TimeRestriction>,
}

/// one recurring access window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRestriction {
    /// iso weekdays the window applies to (1 = monday .. 7 = sunday).
    pub days: Vec<u8>,
    /// window start (inclusive), utc.
    pub start: NaiveTime,
    /// window end (exclusive), utc.
    pub end: NaiveTime,
}

impl TimeRestriction {
    /// whether every day number is a valid iso weekday.
    pub fn is_valid(&self) -> bool {
        !self.days.is_empty() && self.days.iter().all(|d| (1..=7).contains(d))
    }

    /// whether `at` falls inside this window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        use chrono::Datelike;
        let day = at.weekday().number_from_monday() as u8;
        if !self.days.contains(&day) {
            return false;
        }
        let time = at.time().with_nanosecond(0).unwrap_or_else(|| at.time());
        self.start <= time && time < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window(days: Vec<u8>, start: &str, end: &str) -> TimeRestriction {
        TimeRestriction {
            days,
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
        }
    }

    #[test]
    fn restriction_validates_days() {
        assert!(window(vec![1, 5], "08:00:00", "18:00:00").is_valid());
        assert!(!window(vec![], "08:00:00", "18:00:00").is_valid());
        assert!(!window(vec![0], "08:00:00", "18:00:00").is_valid());
        assert!(!window(vec![8], "08:00:00", "18:00:00").is_valid());
    }

    #[test]
    fn restriction_matches_day_and_time() {
        // 2026-01-05 is a monday
        let monday_noon = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        let monday_night = Utc.with_ymd_and_hms(2026, 1, 5, 22, 0, 0).unwrap();
        let sunday_noon = Utc.with_ymd_and_hms(2026, 1, 4, 12, 0, 0).unwrap();

        let w = window(vec![1], "08:00:00", "18:00:00");
        assert!(w.contains(monday_noon));
        assert!(!w.contains(monday_night));
        assert!(!w.contains(sunday_noon));
    }
}
