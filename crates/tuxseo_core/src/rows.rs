use std::collections::BTreeMap;

/// Editable key/value rows backing the auto-submission header and body editors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueRows {
    rows: Vec<(String, String)>,
}

impl Default for KeyValueRows {
    fn default() -> Self {
        Self {
            rows: vec![(String::new(), String::new())],
        }
    }
}

impl KeyValueRows {
    /// Starts from existing pairs; an empty set still yields one blank row.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let rows: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if rows.is_empty() {
            Self::default()
        } else {
            Self { rows }
        }
    }

    pub fn rows(&self) -> &[(String, String)] {
        &self.rows
    }

    pub fn add_row(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.rows.push((key.into(), value.into()));
    }

    pub fn remove_row(&mut self, index: usize) -> Option<(String, String)> {
        if index < self.rows.len() {
            Some(self.rows.remove(index))
        } else {
            None
        }
    }

    pub fn set_row(&mut self, index: usize, key: impl Into<String>, value: impl Into<String>) {
        if let Some(row) = self.rows.get_mut(index) {
            *row = (key.into(), value.into());
        }
    }

    /// Trimmed pairs with non-empty keys; later duplicates win.
    pub fn serialize(&self) -> BTreeMap<String, String> {
        self.rows
            .iter()
            .filter_map(|(key, value)| {
                let key = key.trim();
                (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_single_blank_row() {
        let rows = KeyValueRows::from_pairs(Vec::<(String, String)>::new());
        assert_eq!(rows.rows(), &[(String::new(), String::new())]);
        assert!(rows.serialize().is_empty());
    }

    #[test]
    fn serialize_trims_and_drops_blank_keys() {
        let mut rows = KeyValueRows::from_pairs([(" Authorization ", " Bearer x ")]);
        rows.add_row("   ", "ignored");
        rows.add_row("X-Site", "blog");
        let out = rows.serialize();
        assert_eq!(out.len(), 2);
        assert_eq!(out["Authorization"], "Bearer x");
        assert_eq!(out["X-Site"], "blog");

        rows.remove_row(0);
        assert!(!rows.serialize().contains_key("Authorization"));
        assert_eq!(rows.remove_row(10), None);
    }
}
