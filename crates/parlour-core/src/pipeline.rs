//! # Job Pipeline
//!
//! Job statuses, the transitions allowed between them, and the kanban board
//! the pipeline page renders.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Pending ──► Scheduled ──► InProgress ──► Completed ──► Invoiced      │
//! │      ▲  ◄──────────┘  ◄──────────┘                                      │
//! │      │                                                                  │
//! │      │         (any of the first four) ──► Cancelled                    │
//! │      └──────────────────────────────────────── Cancelled (reopen)       │
//! │                                                                         │
//! │   Completed ──► InProgress is allowed (job reopened before invoicing)  │
//! │   Invoiced is terminal.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A drag-and-drop move on the board is applied optimistically by the client,
//! persisted through [`transition`], and reverted by the client when the
//! server returns an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Job;

// =============================================================================
// Job Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Logged but not yet booked in.
    Pending,
    /// Has a date and (usually) an engineer.
    Scheduled,
    /// Engineer is on site.
    InProgress,
    /// Work done; counts toward the customer's balance.
    Completed,
    /// An invoice has been raised from the job.
    Invoiced,
    Cancelled,
}

impl JobStatus {
    /// All statuses in board order.
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Pending,
        JobStatus::Scheduled,
        JobStatus::InProgress,
        JobStatus::Completed,
        JobStatus::Invoiced,
        JobStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Scheduled => "scheduled",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Invoiced => "invoiced",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Human label for the board column.
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Scheduled => "Scheduled",
            JobStatus::InProgress => "In Progress",
            JobStatus::Completed => "Completed",
            JobStatus::Invoiced => "Invoiced",
            JobStatus::Cancelled => "Cancelled",
        }
    }

    /// True when the job's total counts toward the customer's balance.
    pub fn counts_toward_balance(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Invoiced)
    }

    /// True when items may still be added to or removed from the job.
    pub fn is_editable(&self) -> bool {
        !matches!(self, JobStatus::Invoiced | JobStatus::Cancelled)
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Pending
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "pending" => Ok(JobStatus::Pending),
            "scheduled" => Ok(JobStatus::Scheduled),
            "in_progress" | "inprogress" => Ok(JobStatus::InProgress),
            "completed" | "complete" => Ok(JobStatus::Completed),
            "invoiced" => Ok(JobStatus::Invoiced),
            "cancelled" | "canceled" => Ok(JobStatus::Cancelled),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: JobStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Transitions
// =============================================================================

/// Returns true when a job may move from `from` to `to`.
///
/// Moving a job onto its own column is a no-op and always allowed.
pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
    use JobStatus::*;

    if from == to {
        return true;
    }

    match (from, to) {
        (Invoiced, _) => false,
        (_, Cancelled) => true,
        (Cancelled, Pending) => true,
        (Cancelled, _) => false,
        // Invoiced is only reachable by raising an invoice from a completed job
        (Completed, Invoiced) => true,
        (_, Invoiced) => false,
        (Pending, Scheduled | InProgress | Completed) => true,
        (Scheduled, Pending | InProgress | Completed) => true,
        (InProgress, Pending | Scheduled | Completed) => true,
        (Completed, InProgress) => true,
        _ => false,
    }
}

/// Validates a move and returns the new status.
pub fn transition(from: JobStatus, to: JobStatus) -> CoreResult<JobStatus> {
    if can_transition(from, to) {
        Ok(to)
    } else {
        Err(CoreError::InvalidJobTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

// =============================================================================
// Board
// =============================================================================

/// A card on the board.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PipelineCard {
    pub job_id: String,
    pub title: String,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub engineer_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub scheduled_date: Option<chrono::NaiveDate>,
    pub total_pence: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PipelineColumn {
    pub status: JobStatus,
    pub label: String,
    pub cards: Vec<PipelineCard>,
    pub total_pence: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PipelineBoard {
    pub columns: Vec<PipelineColumn>,
}

impl PipelineBoard {
    /// Groups jobs into one column per status, in board order.
    ///
    /// Cards within a column are ordered by scheduled date (unscheduled
    /// last), then title. `customer_name` resolves customer ids for display.
    pub fn build<F>(jobs: &[Job], customer_name: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let columns = JobStatus::ALL
            .iter()
            .map(|status| {
                let mut cards: Vec<PipelineCard> = jobs
                    .iter()
                    .filter(|job| job.status == *status)
                    .map(|job| PipelineCard {
                        job_id: job.id.clone(),
                        title: job.title.clone(),
                        customer_id: job.customer_id.clone(),
                        customer_name: customer_name(&job.customer_id),
                        engineer_id: job.engineer_id.clone(),
                        scheduled_date: job.scheduled_date,
                        total_pence: job.total_pence,
                    })
                    .collect();

                cards.sort_by(|a, b| {
                    let date_order = match (a.scheduled_date, b.scheduled_date) {
                        (Some(x), Some(y)) => x.cmp(&y),
                        (Some(_), None) => std::cmp::Ordering::Less,
                        (None, Some(_)) => std::cmp::Ordering::Greater,
                        (None, None) => std::cmp::Ordering::Equal,
                    };
                    date_order.then_with(|| a.title.cmp(&b.title))
                });

                let total: Money = cards.iter().map(|c| Money::from_pence(c.total_pence)).sum();

                PipelineColumn {
                    status: *status,
                    label: status.label().to_string(),
                    cards,
                    total_pence: total.pence(),
                }
            })
            .collect();

        PipelineBoard { columns }
    }

    pub fn column(&self, status: JobStatus) -> Option<&PipelineColumn> {
        self.columns.iter().find(|c| c.status == status)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn job(id: &str, status: JobStatus, date: Option<NaiveDate>, total: i64) -> Job {
        let now = Utc::now();
        Job {
            id: id.to_string(),
            customer_id: "cust-1".to_string(),
            engineer_id: None,
            quote_id: None,
            title: format!("Job {}", id),
            description: None,
            status,
            scheduled_date: date,
            completed_date: None,
            subtotal_pence: total,
            vat_pence: 0,
            total_pence: total,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_forward_transitions() {
        assert!(can_transition(JobStatus::Pending, JobStatus::Scheduled));
        assert!(can_transition(JobStatus::Scheduled, JobStatus::InProgress));
        assert!(can_transition(JobStatus::InProgress, JobStatus::Completed));
        assert!(can_transition(JobStatus::Completed, JobStatus::Invoiced));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!can_transition(JobStatus::Pending, JobStatus::Invoiced));
        assert!(!can_transition(JobStatus::Invoiced, JobStatus::Completed));
        assert!(!can_transition(JobStatus::Invoiced, JobStatus::Cancelled));
        assert!(!can_transition(JobStatus::Cancelled, JobStatus::Completed));
        assert!(!can_transition(JobStatus::Completed, JobStatus::Pending));

        let err = transition(JobStatus::Pending, JobStatus::Invoiced).unwrap_err();
        assert_eq!(err.to_string(), "Job cannot move from pending to invoiced");
    }

    #[test]
    fn test_cancel_and_reopen() {
        assert!(can_transition(JobStatus::InProgress, JobStatus::Cancelled));
        assert!(can_transition(JobStatus::Cancelled, JobStatus::Pending));
        assert_eq!(
            transition(JobStatus::Cancelled, JobStatus::Pending).unwrap(),
            JobStatus::Pending
        );
    }

    #[test]
    fn test_same_column_is_noop() {
        for status in JobStatus::ALL {
            assert!(can_transition(status, status));
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("in-progress".parse::<JobStatus>().unwrap(), JobStatus::InProgress);
        assert_eq!("Completed".parse::<JobStatus>().unwrap(), JobStatus::Completed);
        assert!("done".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_board_groups_and_orders() {
        let d1 = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let jobs = vec![
            job("a", JobStatus::Scheduled, Some(d2), 1000),
            job("b", JobStatus::Scheduled, None, 500),
            job("c", JobStatus::Scheduled, Some(d1), 250),
            job("d", JobStatus::Completed, None, 4000),
        ];

        let board = PipelineBoard::build(&jobs, |_| Some("Hill Farm".to_string()));
        assert_eq!(board.columns.len(), 6);

        let scheduled = board.column(JobStatus::Scheduled).unwrap();
        let order: Vec<&str> = scheduled.cards.iter().map(|c| c.job_id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(scheduled.total_pence, 1750);
        assert_eq!(scheduled.cards[0].customer_name.as_deref(), Some("Hill Farm"));

        assert_eq!(board.column(JobStatus::Completed).unwrap().cards.len(), 1);
        assert!(board.column(JobStatus::Pending).unwrap().cards.is_empty());
    }
}
