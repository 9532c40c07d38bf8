use super::{descendant, text};
use crate::consts;
use roxmltree::Node;

/// First, middle and last name plus suffix, single-spaced, skipping the
/// parts that are missing.
pub(crate) fn full_name(person: Node<'_, '_>) -> String {
    [consts::FIRST_NAME, consts::MIDDLE_NAME, consts::SURNAME, consts::SUFFIX]
        .into_iter()
        .filter_map(|tag| descendant(person, tag).map(text))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Names of the first committee members, in document order.
pub(super) fn committee(root: Node<'_, '_>) -> [String; consts::MAX_COMMITTEE] {
    let mut members: [String; consts::MAX_COMMITTEE] = Default::default();
    let found = root.descendants().filter(|n| n.has_tag_name(consts::COMMITTEE_MEMBER));
    for (slot, member) in members.iter_mut().zip(found) {
        *slot = full_name(member);
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    #[test]
    fn extra_committee_members_are_ignored() {
        let members: String = (1..=7)
            .map(|n| format!("<DISS_cmte_member><DISS_surname>M{n}</DISS_surname></DISS_cmte_member>"))
            .collect();
        let xml = format!("<DISS_submission>{members}</DISS_submission>");
        let document = Document::parse(&xml).unwrap();
        let committee = committee(document.root_element());
        assert_eq!(committee[0], "M1");
        assert_eq!(committee[4], "M5");
    }
}
