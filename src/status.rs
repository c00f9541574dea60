//! Record status vocabulary and the date arithmetic behind it.
//!
//! Every function takes "today" explicitly; nothing here reads the clock.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::value::parse_instant;

const NEUTRAL_COLOR: &str = "text-gray-600 bg-gray-100";

/// Status values shared by sales, accounts, appointments and travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
    Scheduled,
    Completed,
    InProgress,
    Planned,
}

impl EntityStatus {
    pub const ALL: [EntityStatus; 8] = [
        EntityStatus::Pending,
        EntityStatus::Paid,
        EntityStatus::Overdue,
        EntityStatus::Cancelled,
        EntityStatus::Scheduled,
        EntityStatus::Completed,
        EntityStatus::InProgress,
        EntityStatus::Planned,
    ];

    /// pt-BR label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            EntityStatus::Pending => "Pendente",
            EntityStatus::Paid => "Pago",
            EntityStatus::Overdue => "Vencido",
            EntityStatus::Cancelled => "Cancelado",
            EntityStatus::Scheduled => "Agendado",
            EntityStatus::Completed => "Concluído",
            EntityStatus::InProgress => "Em Andamento",
            EntityStatus::Planned => "Planejado",
        }
    }

    /// Text and background utility classes for a status badge.
    pub fn color(&self) -> &'static str {
        match self {
            EntityStatus::Pending => "text-yellow-600 bg-yellow-100",
            EntityStatus::Paid | EntityStatus::Completed => "text-green-600 bg-green-100",
            EntityStatus::Overdue => "text-red-600 bg-red-100",
            EntityStatus::Cancelled => NEUTRAL_COLOR,
            EntityStatus::Scheduled => "text-blue-600 bg-blue-100",
            EntityStatus::InProgress => "text-orange-600 bg-orange-100",
            EntityStatus::Planned => "text-purple-600 bg-purple-100",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            EntityStatus::Pending => "pending",
            EntityStatus::Paid => "paid",
            EntityStatus::Overdue => "overdue",
            EntityStatus::Cancelled => "cancelled",
            EntityStatus::Scheduled => "scheduled",
            EntityStatus::Completed => "completed",
            EntityStatus::InProgress => "in_progress",
            EntityStatus::Planned => "planned",
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for EntityStatus {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityStatus::ALL
            .into_iter()
            .find(|status| status.key() == s)
            .ok_or_else(|| PipelineError::invalid_argument(format!("unknown status '{s}'")))
    }
}

/// Label for a raw status key, or the key itself when unknown.
pub fn translate_status(key: &str) -> String {
    key.parse::<EntityStatus>()
        .map(|status| status.label().to_string())
        .unwrap_or_else(|_| key.to_string())
}

/// Badge classes for a raw status key; unknown keys get the neutral pair.
pub fn status_color(key: &str) -> &'static str {
    key.parse::<EntityStatus>()
        .map(|status| status.color())
        .unwrap_or(NEUTRAL_COLOR)
}

/// Is the due date strictly before `today`? Missing or unparseable dates
/// are never overdue.
pub fn is_overdue(due_date: &str, today: NaiveDate) -> bool {
    parse_day(due_date).is_some_and(|due| due < today)
}

/// Status of a receivable/payable account.
pub fn account_status(due_date: &str, is_paid: bool, today: NaiveDate) -> EntityStatus {
    if is_paid {
        EntityStatus::Paid
    } else if is_overdue(due_date, today) {
        EntityStatus::Overdue
    } else {
        EntityStatus::Pending
    }
}

/// Whole days between two dates, rounded up, ignoring order.
pub fn days_between(a: &str, b: &str) -> Option<i64> {
    let (a, b) = (parse_instant(a.trim())?, parse_instant(b.trim())?);
    let millis = (b - a).num_milliseconds().abs();
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    Some((millis + DAY_MS - 1) / DAY_MS)
}

/// Completed years between a birth date and `today`.
pub fn age_on(birth_date: &str, today: NaiveDate) -> Option<u32> {
    let birth = parse_day(birth_date)?;
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    u32::try_from(age).ok()
}

fn parse_day(s: &str) -> Option<NaiveDate> {
    parse_instant(s.trim()).map(|at| at.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_roundtrip_and_label() {
        for status in EntityStatus::ALL {
            assert_eq!(status.to_string().parse::<EntityStatus>().unwrap(), status);
        }
        assert_eq!(EntityStatus::InProgress.to_string(), "in_progress");
        assert_eq!(EntityStatus::InProgress.label(), "Em Andamento");
    }

    #[test]
    fn test_translate_status_falls_back_to_key() {
        assert_eq!(translate_status("paid"), "Pago");
        assert_eq!(translate_status("archived"), "archived");
    }

    #[test]
    fn test_status_color() {
        assert_eq!(status_color("overdue"), "text-red-600 bg-red-100");
        assert_eq!(status_color("completed"), status_color("paid"));
        assert_eq!(status_color("archived"), "text-gray-600 bg-gray-100");
    }

    #[test]
    fn test_account_status() {
        let today = day(2024, 3, 10);
        assert_eq!(account_status("2024-03-01", true, today), EntityStatus::Paid);
        assert_eq!(account_status("2024-03-09", false, today), EntityStatus::Overdue);
        assert_eq!(account_status("2024-03-10", false, today), EntityStatus::Pending);
        assert_eq!(account_status("", false, today), EntityStatus::Pending);
    }

    #[test]
    fn test_days_between_rounds_up() {
        assert_eq!(days_between("2024-01-01", "2024-01-31"), Some(30));
        assert_eq!(days_between("2024-01-31", "2024-01-01"), Some(30));
        assert_eq!(days_between("2024-01-01", "2024-01-01T01:00:00Z"), Some(1));
        assert_eq!(days_between("x", "2024-01-01"), None);
    }

    #[test]
    fn test_age_on() {
        let today = day(2024, 3, 10);
        assert_eq!(age_on("1990-03-10", today), Some(34));
        assert_eq!(age_on("1990-03-11", today), Some(33));
        assert_eq!(age_on("2030-01-01", today), None);
        assert_eq!(age_on("", today), None);
    }
}
