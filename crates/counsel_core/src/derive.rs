//! Local, synchronous derivations over the in-memory student set.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::{Record, Stage, StatusFilter, Student};

/// Students matching `query` (case-insensitive substring of name or email)
/// and `status`, in input order.
pub fn filter_students<'a>(
    students: &'a [Student],
    query: &str,
    status: StatusFilter,
) -> Vec<&'a Student> {
    let needle = query.trim().to_lowercase();
    students
        .iter()
        .filter(|student| matches_text(student, &needle) && status.admits(student.status))
        .collect()
}

fn matches_text(student: &Student, needle: &str) -> bool {
    needle.is_empty()
        || student.name.to_lowercase().contains(needle)
        || student.email.to_lowercase().contains(needle)
}

/// Number of students per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageCounts {
    counts: [usize; 4],
}

impl StageCounts {
    pub fn get(&self, stage: Stage) -> usize {
        self.counts[stage.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, usize)> + '_ {
        Stage::ALL.into_iter().map(|stage| (stage, self.get(stage)))
    }
}

pub fn stage_counts(students: &[Student]) -> StageCounts {
    let mut counts = StageCounts::default();
    for student in students {
        counts.counts[student.stage().index()] += 1;
    }
    counts
}

/// Students split by whether they have a communication inside the window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContactPartition {
    pub recently_contacted: Vec<String>,
    pub not_contacted: Vec<String>,
}

/// Partitions `students` using communication records from a collection-group
/// query. A record counts when `timestamp >= now - window` (inclusive).
pub fn contact_partition(
    students: &[Student],
    comm_records: &[Record],
    now: DateTime<Utc>,
    window: Duration,
) -> ContactPartition {
    let cutoff = now - window;
    let contacted: HashSet<&str> = comm_records
        .iter()
        .filter(|record| {
            record
                .instant("timestamp")
                .is_some_and(|timestamp| timestamp >= cutoff)
        })
        .filter_map(|record| record.parent_id.as_deref())
        .collect();

    let mut partition = ContactPartition::default();
    for student in students {
        if contacted.contains(student.id.as_str()) {
            partition.recently_contacted.push(student.id.clone());
        } else {
            partition.not_contacted.push(student.id.clone());
        }
    }
    partition
}

/// Students flagged as high intent.
pub fn high_intent(students: &[Student]) -> Vec<&Student> {
    students.iter().filter(|student| student.high_intent).collect()
}
