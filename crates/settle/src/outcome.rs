//! What happened to each object during a run.

use settle_schema::naming::Violation;
use std::fmt;

/// Result of reconciling one object. The labels are the values of the
/// ledger's status enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    AlreadyExists,
    Added,
    Mismatch,
    Failed,
    /// The store is in a state no run of ours would have left it in,
    /// e.g. an enum type with no column using it.
    Anomalous,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::AlreadyExists,
        Status::Added,
        Status::Mismatch,
        Status::Failed,
        Status::Anomalous,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Status::AlreadyExists => "already exists",
            Status::Added => "added",
            Status::Mismatch => "mismatch",
            Status::Failed => "failed",
            Status::Anomalous => "anomalous",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What kind of object an outcome is about. Stored as `table_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Database,
    Table,
    Column,
    CommentsColumn,
    EnumType,
    ReservedColumn,
    TagNames,
    Tags,
    TagAliases,
    TagGroups,
    Descriptor,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Database => "database",
            ObjectKind::Table => "table",
            ObjectKind::Column => "column",
            ObjectKind::CommentsColumn => "comments column",
            ObjectKind::EnumType => "enum type",
            ObjectKind::ReservedColumn => "reserved column",
            ObjectKind::TagNames => "tag names",
            ObjectKind::Tags => "tags",
            ObjectKind::TagAliases => "tag aliases",
            ObjectKind::TagGroups => "tag groups",
            ObjectKind::Descriptor => "descriptor",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reconciliation attempt on one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub database: String,
    /// The table the object lives in (or is), empty for databases.
    pub table: String,
    /// The declared table a sibling object hangs off, if any.
    pub parent: Option<String>,
    pub kind: ObjectKind,
    /// The object's own name: column, type or table name.
    pub entry: String,
    pub status: Status,
    /// Why, for anything that isn't a plain success.
    pub detail: Option<String>,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.database)?;
        if !self.table.is_empty() {
            write!(f, ".{}", self.table)?;
            if self.entry != self.table {
                write!(f, ".{}", self.entry)?;
            }
        }
        write!(f, ": {}", self.status)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// An object the naming policy kept out of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// `database`, `database/table`, and so on down to the object.
    pub location: String,
    pub violations: Vec<Violation>,
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: skipping.", self.location)?;
        for violation in &self.violations {
            write!(f, " {violation}")?;
        }
        Ok(())
    }
}

/// Callbacks that see each outcome and skip as the run records it, so
/// progress can be shown while the run is still going.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub outcome: fn(&Outcome),
    pub skipped: fn(&Skipped),
}

/// Everything a run did, in the order it did it.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<Outcome>,
    pub skipped: Vec<Skipped>,
    /// Set when the connection was lost and the run ended early. Everything
    /// recorded before that still happened.
    pub aborted: Option<String>,
    /// Set when outcomes could not be written to the audit ledger.
    pub ledger_error: Option<String>,
    progress: Option<Progress>,
}

impl RunReport {
    /// An empty report that announces every record to `progress`.
    pub fn with_progress(progress: Progress) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, outcome: Outcome) {
        match outcome.status {
            Status::Added => tracing::info!(
                kind = %outcome.kind,
                database = %outcome.database,
                table = %outcome.table,
                entry = %outcome.entry,
                "added"
            ),
            Status::AlreadyExists => tracing::debug!(
                kind = %outcome.kind,
                database = %outcome.database,
                table = %outcome.table,
                entry = %outcome.entry,
                "already exists"
            ),
            Status::Mismatch | Status::Anomalous => tracing::warn!(
                kind = %outcome.kind,
                database = %outcome.database,
                table = %outcome.table,
                entry = %outcome.entry,
                detail = outcome.detail.as_deref().unwrap_or_default(),
                "{}",
                outcome.status
            ),
            Status::Failed => tracing::error!(
                kind = %outcome.kind,
                database = %outcome.database,
                table = %outcome.table,
                entry = %outcome.entry,
                detail = outcome.detail.as_deref().unwrap_or_default(),
                "failed"
            ),
        }
        if let Some(progress) = &self.progress {
            (progress.outcome)(&outcome);
        }
        self.outcomes.push(outcome);
    }

    pub(crate) fn skip(&mut self, location: String, violations: Vec<Violation>) {
        let skipped = Skipped {
            location,
            violations,
        };
        tracing::warn!("{skipped}");
        if let Some(progress) = &self.progress {
            (progress.skipped)(&skipped);
        }
        self.skipped.push(skipped);
    }

    /// How many outcomes ended in `status`.
    pub fn count(&self, status: Status) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Outcomes with a status other than added or already-exists.
    pub fn problems(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.status, Status::Added | Status::AlreadyExists))
    }

    /// Whether anything failed or was skipped.
    pub fn is_clean(&self) -> bool {
        self.problems().next().is_none()
            && self.skipped.is_empty()
            && self.aborted.is_none()
            && self.ledger_error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(kind: ObjectKind, status: Status) -> Outcome {
        Outcome {
            database: "shop".into(),
            table: "widgets".into(),
            parent: None,
            kind,
            entry: "sku".into(),
            status,
            detail: None,
        }
    }

    #[test]
    fn test_status_labels() {
        let labels: Vec<_> = Status::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            ["already exists", "added", "mismatch", "failed", "anomalous"]
        );
    }

    #[test]
    fn test_outcome_display() {
        let mut o = outcome(ObjectKind::Column, Status::Failed);
        o.detail = Some("stored as text, declared integer".into());
        assert_eq!(
            o.to_string(),
            "column shop.widgets.sku: failed (stored as text, declared integer)"
        );

        let db = Outcome {
            table: String::new(),
            entry: "shop".into(),
            ..outcome(ObjectKind::Database, Status::Added)
        };
        assert_eq!(db.to_string(), "database shop: added");
    }

    #[test]
    fn test_report_counts() {
        let mut report = RunReport::default();
        report.record(outcome(ObjectKind::Column, Status::Added));
        report.record(outcome(ObjectKind::Column, Status::Added));
        report.record(outcome(ObjectKind::CommentsColumn, Status::Mismatch));
        assert_eq!(report.count(Status::Added), 2);
        assert_eq!(report.count(Status::Mismatch), 1);
        assert_eq!(report.problems().count(), 1);
        assert!(!report.is_clean());
    }
}
