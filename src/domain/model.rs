use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named slice of a course's holes ("Front 9", "Course B"), addressed by
/// absolute hole numbers. `start_hole`/`end_hole` are 1-based and inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubCourse {
    pub id: String,
    pub name: String,
    pub start_hole: u32,
    pub end_hole: u32,
    #[serde(default)]
    pub sequence: Option<u32>,
}

/// An ordered combination of sub-courses that defines one playable round
/// layout (e.g. 18 holes from two 9-hole segments).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseConfiguration {
    pub id: String,
    pub name: String,
    pub sub_courses: Vec<SubCourse>,
}

/// One entry of the derived absolute/display mapping. Recomputed per
/// configuration, never persisted: the same absolute hole can carry a
/// different display number under another configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleMapping {
    pub absolute_hole: u32,
    pub display_hole: u32,
    pub sub_course_id: String,
}

/// A physical hole keyed by its absolute number, as stored against score and
/// par data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hole {
    pub hole_number: u32,
    pub par: u32,
    #[serde(default)]
    pub yardage: Option<u32>,
    #[serde(default)]
    pub handicap: Option<u32>,
}

/// One exported row on its way between database instances, tagged with the
/// table it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub table: String,
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            data: HashMap::new(),
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        // CSV extraction keeps everything as strings; JSON exports carry
        // real numbers. Accept both.
        match self.data.get(key)? {
            serde_json::Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        match self.data.get(key)? {
            serde_json::Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// A row the transform phase refused to carry forward, kept for the report
/// instead of aborting the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedRow {
    pub table: String,
    pub reason: String,
    pub row: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    /// Accepted rows grouped by target table, already in insert shape.
    pub tables: HashMap<String, Vec<serde_json::Value>>,
    pub rejected: Vec<RejectedRow>,
}

impl TransformOutput {
    pub fn accepted_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}
