//! Field extraction from ProQuest `DISS_submission` metadata.

mod people;

use crate::consts;
use crate::error::{ErrorKind, Result};
use crate::row::EtdRow;
use roxmltree::{Document, Node, ParsingOptions};
use tracing::instrument;

pub(crate) use self::people::full_name;

#[derive(Debug)]
pub struct Extractor<'input> {
    document: Document<'input>,
}

impl<'input> Extractor<'input> {
    /// Parse a metadata document. ProQuest files carry a DOCTYPE, so DTDs
    /// are allowed (but never fetched).
    pub fn from_xml(xml: &'input str) -> Result<Self> {
        let options = ParsingOptions { allow_dtd: true, ..ParsingOptions::default() };
        let document = match Document::parse_with_options(xml, options) {
            Ok(document) => document,
            Err(e) => exn::bail!(ErrorKind::MalformedXml(e.to_string())),
        };
        if !document.root_element().has_tag_name(consts::ROOT) {
            exn::bail!(ErrorKind::InvalidDocument);
        }
        Ok(Self { document })
    }

    /// Build the loader row. `xml_name` is the metadata file name, used to
    /// derive the PDF name.
    #[instrument(level = "trace", skip(self))]
    pub fn row(&self, xml_name: &str) -> EtdRow {
        let author = self.first(consts::AUTHOR);
        let within = |tag: &str| author.and_then(|a| descendant(a, tag)).map(text).unwrap_or_default();
        EtdRow {
            title: self.text(consts::TITLE),
            filename: pdf_name(xml_name),
            keywords: self.text(consts::KEYWORD),
            abstract_text: self.abstract_text(),
            author_first: within(consts::FIRST_NAME),
            author_middle: within(consts::MIDDLE_NAME),
            author_last: within(consts::SURNAME),
            author_suffix: within(consts::SUFFIX),
            institution: self
                .first(consts::INSTITUTION)
                .and_then(|i| descendant(i, consts::INSTITUTION_NAME))
                .map(text)
                .unwrap_or_default(),
            advisor: self.first(consts::ADVISOR).map(full_name).unwrap_or_default(),
            committee: people::committee(self.document.root_element()),
            document_type: self.text(consts::PROCESSING_CODE),
            embargo_date: self
                .first(consts::SALES_RESTRICTION)
                .and_then(|n| n.attribute("remove"))
                .unwrap_or_default()
                .trim()
                .to_string(),
            publication_date: self.text(consts::COMPLETION_DATE),
            subject_area: self.subject_area(),
        }
    }

    fn first(&self, tag: &str) -> Option<Node<'_, 'input>> {
        descendant(self.document.root_element(), tag)
    }

    fn text(&self, tag: &str) -> String {
        self.first(tag).map(text).unwrap_or_default()
    }

    /// Paragraphs are separated by a blank line.
    fn abstract_text(&self) -> String {
        let Some(node) = self.first(consts::ABSTRACT) else {
            return String::new();
        };
        let paragraphs: Vec<String> = node
            .children()
            .filter(|n| n.has_tag_name(consts::PARAGRAPH))
            .map(text)
            .filter(|p| !p.is_empty())
            .collect();
        match paragraphs.is_empty() {
            true => text(node),
            false => paragraphs.join("\n\n"),
        }
    }

    fn subject_area(&self) -> String {
        let degree = self.text(consts::DEGREE).replace('.', "");
        let department = self.text(consts::INSTITUTION_CONTACT);
        match (degree.trim(), department.as_str()) {
            ("", "") => String::new(),
            (degree, department) => format!("{degree} + {department}"),
        }
    }
}

pub(crate) fn descendant<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.descendants().find(|n| n.has_tag_name(tag))
}

/// All text below `node`, trimmed.
pub(crate) fn text(node: Node<'_, '_>) -> String {
    node.descendants().filter(|n| n.is_text()).filter_map(|n| n.text()).collect::<String>().trim().to_string()
}

/// `Smith_J_DATA.xml` names `Smith_J.pdf`; other names are kept as they are.
fn pdf_name(xml_name: &str) -> String {
    match xml_name.strip_suffix(consts::DATA_XML_SUFFIX) {
        Some(stem) => format!("{stem}.pdf"),
        None => xml_name.to_string(),
    }
}
