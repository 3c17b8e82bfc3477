/// Fields pulled from one `FinInstrm` element, keyed `FinInstrmGnlAttrbts.<field>`.
///
/// Only fields present in the source appear; a present but empty element keeps
/// its key with no value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRow {
    fields: Vec<(String, Option<String>)>,
}

impl ExtractedRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `key` unless it is already present; the first value wins.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.fields.push((key, value));
        true
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// `None` when the key is absent, `Some(None)` when present without text.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Rows in document order with the union of their keys as columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTable {
    columns: Vec<String>,
    rows: Vec<ExtractedRow>,
}

impl OutputTable {
    pub fn from_rows(rows: Vec<ExtractedRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.to_string());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ExtractedRow] {
        &self.rows
    }

    /// One cell per column; gaps and valueless fields come back empty.
    pub fn cells<'a>(&'a self, row: &'a ExtractedRow) -> impl Iterator<Item = &'a str> + 'a {
        self.columns
            .iter()
            .map(move |c| row.get(c).flatten().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Option<&str>)]) -> ExtractedRow {
        let mut row = ExtractedRow::new();
        for (k, v) in pairs {
            row.insert(*k, v.map(str::to_string));
        }
        row
    }

    #[test]
    fn test_first_insert_wins() {
        let mut r = ExtractedRow::new();
        assert!(r.insert("FinInstrmGnlAttrbts.Id", Some("A".into())));
        assert!(!r.insert("FinInstrmGnlAttrbts.Id", Some("B".into())));
        assert_eq!(r.get("FinInstrmGnlAttrbts.Id"), Some(Some("A")));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_get_distinguishes_absent_from_empty() {
        let r = row(&[("FinInstrmGnlAttrbts.Issr", None)]);
        assert_eq!(r.get("FinInstrmGnlAttrbts.Issr"), Some(None));
        assert_eq!(r.get("FinInstrmGnlAttrbts.Id"), None);
    }

    #[test]
    fn test_columns_are_union_in_first_seen_order() {
        let table = OutputTable::from_rows(vec![
            row(&[("b", Some("1"))]),
            ExtractedRow::new(),
            row(&[("a", Some("2")), ("b", Some("3")), ("c", None)]),
        ]);

        assert_eq!(table.columns(), ["b", "a", "c"]);
        assert_eq!(table.rows().len(), 3);

        let first: Vec<&str> = table.cells(&table.rows()[0]).collect();
        assert_eq!(first, vec!["1", "", ""]);
        let last: Vec<&str> = table.cells(&table.rows()[2]).collect();
        assert_eq!(last, vec!["3", "2", ""]);
    }
}
