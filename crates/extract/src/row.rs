use crate::consts::{ETD_COLUMNS, MAX_COMMITTEE};

/// One thesis, as a Digital Commons loader row. Missing values are empty
/// strings, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EtdRow {
    pub title: String,
    /// Thesis PDF name, derived from the metadata file name.
    pub filename: String,
    pub keywords: String,
    pub abstract_text: String,
    pub author_first: String,
    pub author_middle: String,
    pub author_last: String,
    pub author_suffix: String,
    pub institution: String,
    pub advisor: String,
    pub committee: [String; MAX_COMMITTEE],
    pub document_type: String,
    pub embargo_date: String,
    pub publication_date: String,
    /// `<degree without dots> + <department>`.
    pub subject_area: String,
}

impl EtdRow {
    /// Values in [`ETD_COLUMNS`] order.
    #[must_use]
    pub fn record(&self) -> Vec<&str> {
        let [c1, c2, c3, c4, c5] = &self.committee;
        let record = vec![
            self.title.as_str(),
            "",
            &self.filename,
            &self.keywords,
            &self.abstract_text,
            &self.author_first,
            &self.author_middle,
            &self.author_last,
            &self.author_suffix,
            "",
            &self.institution,
            &self.advisor,
            c1,
            c2,
            c3,
            c4,
            c5,
            "",
            "",
            &self.document_type,
            "",
            &self.embargo_date,
            "",
            &self.publication_date,
            "",
            "",
            &self.subject_area,
            "",
        ];
        debug_assert_eq!(record.len(), ETD_COLUMNS.len());
        record
    }
}
