use std::collections::HashSet;

use atlas_catalog::OptionSet;
use atlas_common::{AtlasError, MatrixPayload, Result, Subject};
use serde::Serialize;

/// Multi-select gene picker for one subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenePicker {
    subject: Option<Subject>,
    /// Symbols in payload order, deduplicated.
    #[serde(skip)]
    symbols: Vec<String>,
    options: OptionSet,
    selected: Vec<String>,
}

impl GenePicker {
    /// Picker over `subject`'s genes with the default selection applied.
    pub fn from_matrix(matrix: &MatrixPayload, subject: Subject, default_count: usize) -> Self {
        let mut seen = HashSet::new();
        let symbols: Vec<String> = matrix
            .symbols(subject)
            .into_iter()
            .filter(|symbol| seen.insert(symbol.clone()))
            .collect();
        let selected = default_selection(&symbols, default_count);
        Self {
            subject: Some(subject),
            options: OptionSet::from_labels(&symbols),
            symbols,
            selected,
        }
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Replace the selection. Every gene must be one of the options.
    pub fn select(&mut self, genes: &[String]) -> Result<()> {
        let mut seen = HashSet::new();
        let mut selected: Vec<String> = Vec::with_capacity(genes.len());
        for gene in genes {
            let option = self.options.resolve(gene).ok_or_else(|| AtlasError::InvalidOption {
                field: format!("{}_genes", self.subject.map(|s| s.as_str()).unwrap_or("gene")),
                value: gene.clone(),
            })?;
            if seen.insert(option.label.as_str()) {
                selected.push(option.label.clone());
            }
        }
        self.selected = selected;
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.selected = self.symbols.clone();
    }

    pub fn select_none(&mut self) {
        self.selected.clear();
    }
}

/// First `count` symbols plus the lexically first one, without repeats.
pub fn default_selection(symbols: &[String], count: usize) -> Vec<String> {
    let mut selected: Vec<String> = symbols.iter().take(count).cloned().collect();
    if let Some(first) = symbols.iter().min() {
        if !selected.contains(first) {
            selected.push(first.clone());
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_test_utils::fixtures::{host_symbols, matrix, phage_symbols};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_selection_adds_lexical_first() {
        let symbols = phage_symbols(); // gp23, gp24, gp32, denB, alt
        assert_eq!(default_selection(&symbols, 3), vec!["gp23", "gp24", "gp32", "alt"]);
    }

    #[test]
    fn test_default_selection_without_repeat() {
        let symbols: Vec<String> = ["a", "c", "b"].map(String::from).to_vec();
        assert_eq!(default_selection(&symbols, 3), vec!["a", "c", "b"]);
        assert_eq!(default_selection(&[], 3), Vec::<String>::new());
    }

    #[test]
    fn test_picker_keeps_subjects_apart() {
        let payload = matrix(&phage_symbols(), &host_symbols());
        let host = GenePicker::from_matrix(&payload, Subject::B, 3);
        assert_eq!(host.options().labels(), vec!["dnaK", "lacZ", "rpoB", "thrL"]);
        // dnaK is both among the first three and the lexical first.
        assert_eq!(host.selected(), ["thrL", "dnaK", "rpoB"]);
    }

    #[test]
    fn test_repeated_symbols_collapse_in_payload_order() {
        let host: Vec<String> = ["rpoB", "lacZ", "rpoB", "dnaK", "lacZ"].map(String::from).to_vec();
        let payload = matrix(&phage_symbols(), &host);
        let mut picker = GenePicker::from_matrix(&payload, Subject::B, 10);
        assert_eq!(picker.options().labels(), vec!["dnaK", "lacZ", "rpoB"]);
        picker.select_all();
        assert_eq!(picker.selected(), ["rpoB", "lacZ", "dnaK"]);

        picker.select(&["lacZ".to_string(), "rpoB".to_string(), "lacZ".to_string()]).unwrap();
        assert_eq!(picker.selected(), ["lacZ", "rpoB"]);
    }

    #[test]
    fn test_select_rejects_unknown_gene() {
        let payload = matrix(&phage_symbols(), &host_symbols());
        let mut picker = GenePicker::from_matrix(&payload, Subject::A, 3);
        let err = picker.select(&["thrL".to_string()]).unwrap_err();
        assert!(matches!(err, AtlasError::InvalidOption { ref field, .. } if field == "phage_genes"));
        assert_eq!(picker.selected().len(), 4);
    }

    #[test]
    fn test_select_all_and_none() {
        let payload = matrix(&phage_symbols(), &host_symbols());
        let mut picker = GenePicker::from_matrix(&payload, Subject::A, 1);
        picker.select_all();
        assert_eq!(picker.selected(), phage_symbols().as_slice());
        picker.select_none();
        assert!(picker.selected().is_empty());
    }
}
