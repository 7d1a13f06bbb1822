//! Attendance marking and the derived reports.
//!
//! Every report is recomputed from the roster and the full ledger on each call.
//! Nothing is cached, so a report can never disagree with the stored marks.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::repository;
use crate::error::AppError;
use crate::models::{AttendanceRecord, AttendanceStatus, DayStatus, Student};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalStats {
    pub total_students: usize,
    pub total_days: usize,
    pub total_present: usize,
    pub total_records: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayEntry {
    pub student_id: i64,
    pub name: String,
    pub course: String,
    pub status: DayStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentReport {
    pub student_id: i64,
    pub name: String,
    pub course: String,
    pub total_days: usize,
    pub present_days: usize,
    pub absent_days: usize,
    pub attendance_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateSummary {
    pub date: String,
    pub total: usize,
    pub present: usize,
}

/// Outcome of one mark-attendance batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkSummary {
    pub date: String,
    pub marked: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedMark {
    pub student_id: i64,
    pub status: AttendanceStatus,
}

/// Parses an ISO calendar date and returns it in canonical `YYYY-MM-DD` form.
pub fn parse_date(raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::validation("date required"));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .map_err(|_| AppError::validation("invalid date"))
}

/// Builds one mark per roster member. Ids outside the roster and unknown status
/// strings are rejected; roster members without a submitted status are absent.
pub fn plan_marks(
    roster_ids: &[i64],
    marks: &HashMap<i64, String>,
) -> Result<Vec<PlannedMark>, AppError> {
    let known: HashSet<i64> = roster_ids.iter().copied().collect();

    let mut submitted: Vec<(&i64, &String)> = marks.iter().collect();
    submitted.sort_by_key(|(id, _)| **id);

    let mut statuses = HashMap::with_capacity(submitted.len());
    for (id, raw) in submitted {
        if !known.contains(id) {
            return Err(AppError::Validation(format!("unknown student {}", id)));
        }
        let status = raw
            .parse::<AttendanceStatus>()
            .map_err(|_| AppError::validation("invalid status"))?;
        statuses.insert(*id, status);
    }

    Ok(roster_ids
        .iter()
        .map(|id| PlannedMark {
            student_id: *id,
            status: statuses.get(id).copied().unwrap_or(AttendanceStatus::Absent),
        })
        .collect())
}

pub fn attendance_percentage(present: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (present as f64 * 100.0 / total as f64 * 100.0).round() / 100.0
}

pub fn global_stats(roster: &[Student], ledger: &[AttendanceRecord]) -> GlobalStats {
    let days: HashSet<&str> = ledger.iter().map(|r| r.date.as_str()).collect();
    GlobalStats {
        total_students: roster.len(),
        total_days: days.len(),
        total_present: ledger
            .iter()
            .filter(|r| r.status == AttendanceStatus::Present)
            .count(),
        total_records: ledger.len(),
    }
}

fn by_name(roster: &[Student]) -> Vec<&Student> {
    let mut sorted: Vec<&Student> = roster.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    sorted
}

/// Every roster member's status on `date`, "not marked" where no record exists.
pub fn day_view(roster: &[Student], ledger: &[AttendanceRecord], date: &str) -> Vec<DayEntry> {
    let marked: HashMap<i64, AttendanceStatus> = ledger
        .iter()
        .filter(|r| r.date == date)
        .map(|r| (r.student_id, r.status))
        .collect();

    by_name(roster)
        .into_iter()
        .map(|s| DayEntry {
            student_id: s.id,
            name: s.name.clone(),
            course: s.course.clone(),
            status: DayStatus::from(marked.get(&s.id).copied()),
        })
        .collect()
}

pub fn student_report(roster: &[Student], ledger: &[AttendanceRecord]) -> Vec<StudentReport> {
    let mut counts: HashMap<i64, (usize, usize)> = HashMap::new();
    for record in ledger {
        let entry = counts.entry(record.student_id).or_default();
        entry.0 += 1;
        if record.status == AttendanceStatus::Present {
            entry.1 += 1;
        }
    }

    by_name(roster)
        .into_iter()
        .map(|s| {
            let (total, present) = counts.get(&s.id).copied().unwrap_or_default();
            StudentReport {
                student_id: s.id,
                name: s.name.clone(),
                course: s.course.clone(),
                total_days: total,
                present_days: present,
                absent_days: total - present,
                attendance_percentage: attendance_percentage(present, total),
            }
        })
        .collect()
}

/// Per-date totals, most recent date first.
pub fn date_summaries(ledger: &[AttendanceRecord]) -> Vec<DateSummary> {
    let mut by_date: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for record in ledger {
        let entry = by_date.entry(record.date.as_str()).or_default();
        entry.0 += 1;
        if record.status == AttendanceStatus::Present {
            entry.1 += 1;
        }
    }

    by_date
        .into_iter()
        .rev()
        .map(|(date, (total, present))| DateSummary {
            date: date.to_string(),
            total,
            present,
        })
        .collect()
}

/// Roster and ledger read together so the reports see one consistent state.
pub async fn snapshot(db: &SqlitePool) -> Result<(Vec<Student>, Vec<AttendanceRecord>), AppError> {
    let mut tx = db.begin().await?;
    let roster = repository::fetch_students(&mut *tx).await?;
    let ledger = repository::fetch_ledger(&mut *tx).await?;
    tx.commit().await?;
    Ok((roster, ledger))
}

/// Marks every roster member for `date` in one transaction. Either the whole
/// day is written or nothing is.
pub async fn mark_attendance(
    db: &SqlitePool,
    date: &str,
    marks: &HashMap<i64, String>,
) -> Result<MarkSummary, AppError> {
    let date = parse_date(date)?;

    let mut tx = db.begin().await?;
    let roster_ids = repository::fetch_student_ids(&mut *tx).await?;
    let plan = plan_marks(&roster_ids, marks)?;

    for mark in &plan {
        debug!("marking student {} {} on {}", mark.student_id, mark.status, date);
        repository::upsert_attendance(&mut *tx, mark.student_id, &date, mark.status).await?;
    }
    tx.commit().await?;

    info!("attendance marked for {} ({} students)", date, plan.len());
    Ok(MarkSummary {
        date,
        marked: plan.len(),
    })
}

pub async fn stats(db: &SqlitePool) -> Result<GlobalStats, AppError> {
    let (roster, ledger) = snapshot(db).await?;
    Ok(global_stats(&roster, &ledger))
}

pub async fn attendance_on(db: &SqlitePool, date: &str) -> Result<(String, Vec<DayEntry>), AppError> {
    let date = parse_date(date)?;
    let (roster, ledger) = snapshot(db).await?;
    let entries = day_view(&roster, &ledger, &date);
    Ok((date, entries))
}

pub async fn report(db: &SqlitePool) -> Result<Vec<StudentReport>, AppError> {
    let (roster, ledger) = snapshot(db).await?;
    Ok(student_report(&roster, &ledger))
}

pub async fn dates(db: &SqlitePool) -> Result<Vec<DateSummary>, AppError> {
    let ledger = repository::fetch_ledger(db).await?;
    Ok(date_summaries(&ledger))
}
