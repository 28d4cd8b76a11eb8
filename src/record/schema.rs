//! Static field schemas per record variant
//!
//! Each table maps raw wire field names to the canonical names exposed on
//! records. Fields absent from a table pass through under their wire name.

use crate::types::{JsonObject, ValueMap};

/// Raw-to-canonical field name pairs for one variant
pub type FieldMap = &'static [(&'static str, &'static str)];

/// Publications: wire names are already canonical
pub const PUBLICATION_FIELDS: FieldMap = &[("journal_title", "journal")];

/// Researchers: `research_orgs` carries organization ids that resolve to
/// full organization records on demand
pub const RESEARCHER_FIELDS: FieldMap = &[
    ("orcid_id", "orcid"),
    ("research_orgs", "affiliations"),
    ("current_research_org", "current_organization"),
];

/// Authors embedded in a publication; their affiliation list is contextual
/// to that publication and arrives inline
pub const AUTHOR_FIELDS: FieldMap = &[("orcid_id", "orcid")];

/// Grants
pub const GRANT_FIELDS: FieldMap = &[
    ("funding_usd", "funding"),
    ("funding_org_name", "funder"),
];

/// Organizations
pub const ORGANIZATION_FIELDS: FieldMap = &[
    ("country_name", "country"),
    ("city_name", "city"),
    ("state_name", "state"),
];

/// Copy a raw entity into a canonical field map, renaming mapped fields and
/// passing the rest through unchanged.
pub fn canonicalize(raw: &JsonObject, map: FieldMap) -> ValueMap {
    let mut fields = ValueMap::with_capacity(raw.len());
    for (name, value) in raw {
        let canonical = map
            .iter()
            .find(|(wire, _)| wire == name)
            .map_or(name.as_str(), |(_, canonical)| canonical);
        fields.insert(canonical.to_string(), value.clone());
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonicalize_renames_mapped_fields() {
        let raw = json!({
            "id": "ur.123",
            "orcid_id": "0000-0001-2345-6789",
            "research_orgs": ["grid.1"],
        });
        let fields = canonicalize(raw.as_object().unwrap(), RESEARCHER_FIELDS);

        assert!(fields.contains_key("orcid"));
        assert!(fields.contains_key("affiliations"));
        assert!(fields.contains_key("id"));
        assert!(!fields.contains_key("orcid_id"));
        assert!(!fields.contains_key("research_orgs"));
    }

    #[test]
    fn test_canonicalize_passes_unmapped_through() {
        let raw = json!({ "doi": "10.1/x", "year": 2020 });
        let fields = canonicalize(raw.as_object().unwrap(), PUBLICATION_FIELDS);
        assert_eq!(fields.get("doi"), Some(&json!("10.1/x")));
        assert_eq!(fields.get("year"), Some(&json!(2020)));
    }
}
