//! Label table: label name to instruction index.

use crate::asm::loader::LoadError;
use std::collections::HashMap;

/// Where a label points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    /// Index of the instruction following the label definition.
    /// Equal to the program length for a trailing label.
    pub index: usize,
    /// Source line of the definition.
    pub line: usize,
}

/// Resolved labels of a program. Names are case-sensitive and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: HashMap<String, Label>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a label, failing if the name is already taken.
    pub fn define(&mut self, name: &str, label: Label) -> Result<(), LoadError> {
        if let Some(first) = self.labels.get(name) {
            return Err(LoadError::DuplicateLabel {
                name: name.to_string(),
                line: label.line,
                first_line: first.line,
            });
        }
        self.labels.insert(name.to_string(), label);
        Ok(())
    }

    /// Instruction index for `name`.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.labels.get(name).map(|label| label.index)
    }

    pub fn get(&self, name: &str) -> Option<&Label> {
        self.labels.get(name)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels ordered by definition line.
    pub fn sorted(&self) -> Vec<(&str, Label)> {
        let mut entries: Vec<_> = self
            .labels
            .iter()
            .map(|(name, label)| (name.as_str(), *label))
            .collect();
        entries.sort_by_key(|(_, label)| label.line);
        entries
    }

    /// Names of the labels pointing at `index`, in definition order.
    pub fn names_at(&self, index: usize) -> Vec<&str> {
        self.sorted()
            .into_iter()
            .filter(|(_, label)| label.index == index)
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_resolve() {
        let mut table = LabelTable::new();
        table.define("loop", Label { index: 2, line: 3 }).unwrap();
        table.define("Loop", Label { index: 4, line: 6 }).unwrap();

        assert_eq!(table.resolve("loop"), Some(2));
        assert_eq!(table.resolve("Loop"), Some(4));
        assert_eq!(table.resolve("LOOP"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut table = LabelTable::new();
        table.define("x", Label { index: 0, line: 1 }).unwrap();
        let err = table.define("x", Label { index: 3, line: 7 }).unwrap_err();

        assert_eq!(
            err,
            LoadError::DuplicateLabel { name: "x".into(), line: 7, first_line: 1 }
        );
        assert_eq!(table.resolve("x"), Some(0));
    }

    #[test]
    fn test_names_at() {
        let mut table = LabelTable::new();
        table.define("b", Label { index: 1, line: 3 }).unwrap();
        table.define("a", Label { index: 1, line: 2 }).unwrap();
        table.define("c", Label { index: 2, line: 5 }).unwrap();

        assert_eq!(table.names_at(1), vec!["a", "b"]);
        assert!(table.names_at(0).is_empty());
    }
}
