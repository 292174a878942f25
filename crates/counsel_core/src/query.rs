//! Plain-data descriptions of backend locations and live queries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::FieldValue;

pub const STUDENTS: &str = "students";
pub const TIMELINE: &str = "timeline";
pub const COMM_LOG: &str = "commLog";
pub const NOTES: &str = "notes";
pub const TASKS: &str = "tasks";

/// A collection, either top-level (`students`) or owned by a student
/// (`students/{id}/notes`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionPath {
    pub parent: Option<String>,
    pub name: String,
}

impl CollectionPath {
    pub fn top_level(name: impl Into<String>) -> Self {
        Self {
            parent: None,
            name: name.into(),
        }
    }

    pub fn students() -> Self {
        Self::top_level(STUDENTS)
    }

    pub fn of_student(student_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            parent: Some(student_id.into()),
            name: name.into(),
        }
    }

    pub fn doc(&self, id: impl Into<String>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.into(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => write!(f, "{STUDENTS}/{parent}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentPath {
    pub collection: CollectionPath,
    pub id: String,
}

impl DocumentPath {
    pub fn student(id: impl Into<String>) -> Self {
        CollectionPath::students().doc(id)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    Equal,
    AtLeast,
    AtMost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: FieldValue,
}

/// What a live query reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    /// A single document; the snapshot holds zero or one record.
    Document(DocumentPath),
    Collection(CollectionPath),
    /// Every sub-collection with this name, regardless of parent.
    Group(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub source: Source,
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<usize>,
    pub filters: Vec<Filter>,
}

impl Query {
    pub fn document(path: DocumentPath) -> Self {
        Self {
            source: Source::Document(path),
            order_by: None,
            limit: None,
            filters: Vec::new(),
        }
    }

    pub fn collection(path: CollectionPath) -> Self {
        Self {
            source: Source::Collection(path),
            order_by: None,
            limit: None,
            filters: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self {
            source: Source::Group(name.into()),
            order_by: None,
            limit: None,
            filters: Vec::new(),
        }
    }

    /// Most-recent-first ordering on `field`.
    pub fn newest_first(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some((field.into(), SortDirection::Descending));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: FieldValue) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value,
        });
        self
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Document(path) => write!(f, "doc {path}")?,
            Source::Collection(path) => write!(f, "collection {path}")?,
            Source::Group(name) => write!(f, "group {name}")?,
        }
        if let Some((field, direction)) = &self.order_by {
            write!(f, " order_by {field} {direction:?}")?;
        }
        if let Some(limit) = self.limit {
            write!(f, " limit {limit}")?;
        }
        Ok(())
    }
}
