//! Per-student activity tables shared by every aggregation level.
//!
//! A table has identity columns (`Module`, `Class`, outermost first), then
//! `Name` and `Grades`, then one count column per observed action.

use std::collections::HashMap;

pub const MODULE_COLUMN: &str = "Module";
pub const CLASS_COLUMN: &str = "Class";
pub const NAME_COLUMN: &str = "Name";
pub const GRADES_COLUMN: &str = "Grades";

#[derive(Debug, Clone, PartialEq)]
pub struct StudentRow {
    /// Values for [`ActivityTable::identity`], same order.
    pub identity: Vec<String>,
    pub name: String,
    pub grade: Option<f64>,
    /// Action counts, aligned with [`ActivityTable::actions`].
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityTable {
    pub identity: Vec<String>,
    pub actions: Vec<String>,
    pub rows: Vec<StudentRow>,
}

impl ActivityTable {
    pub fn new(actions: Vec<String>) -> Self {
        Self {
            identity: Vec::new(),
            actions,
            rows: Vec::new(),
        }
    }

    /// Appends a row with no identity values. Counts are zero-padded to the action set.
    pub fn push(&mut self, name: impl Into<String>, grade: Option<f64>, mut counts: Vec<u64>) {
        counts.resize(self.actions.len(), 0);
        self.rows.push(StudentRow {
            identity: vec![String::new(); self.identity.len()],
            name: name.into(),
            grade,
            counts,
        });
    }

    /// Full header row: identity columns, `Name`, `Grades`, then actions.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = self.identity.clone();
        headers.push(NAME_COLUMN.to_string());
        headers.push(GRADES_COLUMN.to_string());
        headers.extend(self.actions.iter().cloned());
        headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, name: &str) -> Option<&StudentRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn action_index(&self, action: &str) -> Option<usize> {
        self.actions.iter().position(|a| a == action)
    }

    /// Count of `action` for the first row named `name`.
    pub fn count(&self, name: &str, action: &str) -> Option<u64> {
        let idx = self.action_index(action)?;
        self.row(name).map(|r| r.counts[idx])
    }

    /// Prepends an identity column holding the same `value` on every row.
    pub fn with_identity(mut self, column: &str, value: &str) -> Self {
        self.identity.insert(0, column.to_string());
        for row in &mut self.rows {
            row.identity.insert(0, value.to_string());
        }
        self
    }

    /// Replaces every missing grade and every empty identity cell with zero.
    ///
    /// Empty identity cells come from [`concat`](Self::concat) over a table
    /// that lacked one of the identity columns.
    pub fn fill_missing(&mut self) {
        for row in &mut self.rows {
            if row.grade.is_none() {
                row.grade = Some(0.0);
            }
            for value in row.identity.iter_mut().filter(|v| v.is_empty()) {
                *value = "0".to_string();
            }
        }
    }

    /// Stacks tables row-wise over the union of their columns.
    ///
    /// Identity and action columns keep first-occurrence order across the
    /// inputs. Action cells a source table lacks are zero; identity cells it
    /// lacks are empty.
    pub fn concat(tables: impl IntoIterator<Item = ActivityTable>) -> Self {
        let tables: Vec<ActivityTable> = tables.into_iter().collect();

        let mut identity: Vec<String> = Vec::new();
        let mut actions: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.identity {
                if !identity.contains(column) {
                    identity.push(column.clone());
                }
            }
            for action in &table.actions {
                if !actions.contains(action) {
                    actions.push(action.clone());
                }
            }
        }

        let identity_pos: HashMap<&str, usize> = identity
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        let action_pos: HashMap<&str, usize> = actions
            .iter()
            .enumerate()
            .map(|(i, a)| (a.as_str(), i))
            .collect();

        let mut rows = Vec::with_capacity(tables.iter().map(|t| t.rows.len()).sum());
        for table in &tables {
            let id_map: Vec<usize> = table
                .identity
                .iter()
                .map(|c| identity_pos[c.as_str()])
                .collect();
            let act_map: Vec<usize> = table
                .actions
                .iter()
                .map(|a| action_pos[a.as_str()])
                .collect();

            for row in &table.rows {
                let mut row_identity = vec![String::new(); identity.len()];
                for (value, &to) in row.identity.iter().zip(&id_map) {
                    row_identity[to] = value.clone();
                }
                let mut counts = vec![0; actions.len()];
                for (count, &to) in row.counts.iter().zip(&act_map) {
                    counts[to] = *count;
                }
                rows.push(StudentRow {
                    identity: row_identity,
                    name: row.name.clone(),
                    grade: row.grade,
                    counts,
                });
            }
        }

        Self {
            identity,
            actions,
            rows,
        }
    }

    /// Serializes one row in [`headers`](Self::headers) order.
    pub fn record(&self, row: &StudentRow) -> Vec<String> {
        let mut record = row.identity.clone();
        record.push(row.name.clone());
        record.push(row.grade.map(|g| g.to_string()).unwrap_or_default());
        record.extend(row.counts.iter().map(|c| c.to_string()));
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn class_table(actions: &[&str], rows: &[(&str, f64, &[u64])]) -> ActivityTable {
        let mut table = ActivityTable::new(actions.iter().map(|a| a.to_string()).collect());
        for (name, grade, counts) in rows {
            table.push(*name, Some(*grade), counts.to_vec());
        }
        table
    }

    #[test]
    fn test_headers_lead_with_identity() {
        let table = class_table(&["View", "Submit"], &[("Ana Silva", 8.5, &[2, 1])])
            .with_identity(CLASS_COLUMN, "A")
            .with_identity(MODULE_COLUMN, "M1");

        assert_eq!(
            table.headers(),
            vec!["Module", "Class", "Name", "Grades", "View", "Submit"]
        );
        assert_eq!(table.rows[0].identity, vec!["M1", "A"]);
    }

    #[test]
    fn test_concat_unions_actions_and_zero_fills() {
        let a = class_table(&["View", "Submit"], &[("Ana", 8.5, &[2, 1])])
            .with_identity(CLASS_COLUMN, "A");
        let b = class_table(&["Submit", "Post"], &[("Bruno", 7.0, &[3, 4])])
            .with_identity(CLASS_COLUMN, "B");

        let merged = ActivityTable::concat(vec![a, b]);

        assert_eq!(
            merged.headers(),
            vec!["Class", "Name", "Grades", "View", "Submit", "Post"]
        );
        assert_eq!(merged.rows[0].counts, vec![2, 1, 0]);
        assert_eq!(merged.rows[1].counts, vec![0, 3, 4]);
        assert_eq!(merged.count("Bruno", "View"), Some(0));
        assert_eq!(merged.rows[1].identity, vec!["B"]);
    }

    #[test]
    fn test_concat_keeps_row_order_per_source() {
        let a = class_table(&["View"], &[("Zoe", 1.0, &[1]), ("Ana", 2.0, &[2])]);
        let b = class_table(&["View"], &[("Caio", 3.0, &[3])]);

        let merged = ActivityTable::concat(vec![a, b]);
        let names: Vec<_> = merged.rows.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["Zoe", "Ana", "Caio"]);
    }

    #[test]
    fn test_fill_missing_sets_zero_grade() {
        let mut table = ActivityTable::new(vec!["View".to_string()]);
        table.push("Ana", None, vec![1]);
        table.fill_missing();

        assert_eq!(table.rows[0].grade, Some(0.0));
    }

    #[test]
    fn test_fill_missing_sets_zero_identity() {
        let module = class_table(&["View"], &[("Ana", 8.5, &[1])])
            .with_identity(CLASS_COLUMN, "A")
            .with_identity(MODULE_COLUMN, "M1");
        let single = class_table(&["View"], &[("Caio", 7.0, &[1])])
            .with_identity(MODULE_COLUMN, "M2");

        let mut merged = ActivityTable::concat(vec![module, single]);
        assert_eq!(merged.rows[1].identity, vec!["M2", ""]);

        merged.fill_missing();
        assert_eq!(merged.rows[0].identity, vec!["M1", "A"]);
        assert_eq!(merged.rows[1].identity, vec!["M2", "0"]);
    }

    #[test]
    fn test_push_pads_counts() {
        let mut table = ActivityTable::new(vec!["View".to_string(), "Post".to_string()]);
        table.push("Ana", Some(5.0), vec![]);

        assert_eq!(table.rows[0].counts, vec![0, 0]);
    }

    #[test]
    fn test_record_formats_numbers() {
        let mut table = ActivityTable::new(vec!["View".to_string()]);
        table.push("Ana Silva", Some(8.5), vec![2]);
        table.push("Bruno Lima", Some(7.0), vec![0]);
        table.push("Caio Reis", None, vec![1]);

        assert_eq!(table.record(&table.rows[0]), vec!["Ana Silva", "8.5", "2"]);
        assert_eq!(table.record(&table.rows[1]), vec!["Bruno Lima", "7", "0"]);
        assert_eq!(table.record(&table.rows[2]), vec!["Caio Reis", "", "1"]);
    }
}
