/// Digital Commons batch upload columns, in order. Columns without a
/// ProQuest counterpart are left empty.
pub const ETD_COLUMNS: [&str; 28] = [
    "title",
    "fulltext_url",
    "filename",
    "keywords",
    "abstract",
    "author1_fname",
    "author1_mname",
    "author1_lname",
    "author1_suffix",
    "author1_email",
    "author1_institution",
    "advisor1",
    "advisor2",
    "advisor3",
    "advisor4",
    "advisor5",
    "advisor6",
    "disciplines",
    "comments",
    "document_type",
    "doi",
    "embargo_date",
    "isbn",
    "publication_date",
    "season",
    "pubmedid",
    "subject_area",
    "uuid",
];

/// Committee members beyond this many are ignored.
pub const MAX_COMMITTEE: usize = 5;

/// ProQuest metadata files end with this; the thesis PDF shares the stem.
pub const DATA_XML_SUFFIX: &str = "_DATA.xml";

pub(crate) const ROOT: &str = "DISS_submission";
pub(crate) const TITLE: &str = "DISS_title";
pub(crate) const KEYWORD: &str = "DISS_keyword";
pub(crate) const ABSTRACT: &str = "DISS_abstract";
pub(crate) const PARAGRAPH: &str = "DISS_para";
pub(crate) const AUTHOR: &str = "DISS_author";
pub(crate) const FIRST_NAME: &str = "DISS_fname";
pub(crate) const MIDDLE_NAME: &str = "DISS_middle";
pub(crate) const SURNAME: &str = "DISS_surname";
pub(crate) const SUFFIX: &str = "DISS_suffix";
pub(crate) const INSTITUTION: &str = "DISS_institution";
pub(crate) const INSTITUTION_NAME: &str = "DISS_inst_name";
pub(crate) const INSTITUTION_CONTACT: &str = "DISS_inst_contact";
pub(crate) const ADVISOR: &str = "DISS_advisor";
pub(crate) const COMMITTEE_MEMBER: &str = "DISS_cmte_member";
pub(crate) const PROCESSING_CODE: &str = "DISS_processing_code";
pub(crate) const SALES_RESTRICTION: &str = "DISS_sales_restriction";
pub(crate) const COMPLETION_DATE: &str = "DISS_comp_date";
pub(crate) const DEGREE: &str = "DISS_degree";
