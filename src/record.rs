use serde::{Deserialize, Serialize};

/// One table row, transcribed verbatim. Missing cells are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub name: String,
    pub id: String,
    pub status: String,
    pub date: String,
}

/// A row after status/date canonicalization. `name` and `id` are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub name: String,
    pub id: String,
    pub status: String,
    pub date: String,
}

impl RawRecord {
    /// Build a record from a row of cell texts using the fixed column order
    /// name, id, status, date.
    pub fn from_cells(cells: &[String]) -> Self {
        let cell = |i: usize| cells.get(i).map(|c| c.trim().to_string()).unwrap_or_default();
        RawRecord {
            name: cell(0),
            id: cell(1),
            status: cell(2),
            date: cell(3),
        }
    }
}

impl NormalizedRecord {
    /// The 4-column row used by the spreadsheet exporter.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.id.clone(),
            self.status.clone(),
            self.date.clone(),
        ]
    }
}

/// Saved runs hold normalized records; re-normalizing one treats it as raw input.
impl From<NormalizedRecord> for RawRecord {
    fn from(r: NormalizedRecord) -> Self {
        RawRecord {
            name: r.name,
            id: r.id,
            status: r.status,
            date: r.date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn column_order() {
        let r = RawRecord::from_cells(&cells(&["Alice", "a1", "Active", "01/02/2024 03:04:05"]));
        assert_eq!(r.name, "Alice");
        assert_eq!(r.id, "a1");
        assert_eq!(r.status, "Active");
        assert_eq!(r.date, "01/02/2024 03:04:05");
    }

    #[test]
    fn missing_cells_are_empty() {
        let r = RawRecord::from_cells(&cells(&["  Bob  ", "b2"]));
        assert_eq!(r.name, "Bob");
        assert_eq!(r.id, "b2");
        assert!(r.status.is_empty());
        assert!(r.date.is_empty());
    }

    #[test]
    fn extra_cells_ignored() {
        let r = RawRecord::from_cells(&cells(&["n", "i", "s", "d", "actions"]));
        assert_eq!(r.date, "d");
    }

    #[test]
    fn json_field_order() {
        let n = NormalizedRecord {
            name: "n".into(),
            id: "i".into(),
            status: "s".into(),
            date: "d".into(),
        };
        let json = serde_json::to_string(&n).unwrap();
        assert_eq!(json, r#"{"name":"n","id":"i","status":"s","date":"d"}"#);
        assert_eq!(n.to_row(), vec!["n", "i", "s", "d"]);
    }
}
