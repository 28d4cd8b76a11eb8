//! Record materialization
//!
//! Converts raw page entries into typed records. Most fields are populated
//! eagerly from the page after canonical renaming (see [`schema`]); fields
//! that only arrive as entity ids — a researcher's affiliations — are held
//! as [`Deferred`] values and resolved through the transport on first read.
//!
//! `Author` and `Researcher` share a person-shaped field contract, but an
//! author's affiliation list is contextual to one publication and arrives
//! inline; it is never conflated with a researcher's general affiliation
//! list, which requires a lookup.

mod deferred;
pub mod schema;

pub use deferred::Deferred;

use crate::error::Result;
use crate::http::{DslClient, MAX_PAGE_SIZE};
use crate::query::Query;
use crate::types::{JsonObject, JsonValue, ResultType, ValueMap};
use std::sync::Arc;

/// A typed record yielded by a query traversal
#[derive(Debug)]
pub enum Record {
    Publication(Publication),
    Researcher(Researcher),
    Grant(Grant),
    Organization(Organization),
}

impl Record {
    /// The server-assigned id, when present
    pub fn id(&self) -> Option<&str> {
        match self {
            Record::Publication(r) => r.id(),
            Record::Researcher(r) => r.id(),
            Record::Grant(r) => r.id(),
            Record::Organization(r) => r.id(),
        }
    }

    /// Access any canonical field on the underlying variant
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        match self {
            Record::Publication(r) => r.field(name),
            Record::Researcher(r) => r.field(name),
            Record::Grant(r) => r.field(name),
            Record::Organization(r) => r.field(name),
        }
    }

    /// The publication variant, if this is one
    pub fn as_publication(&self) -> Option<&Publication> {
        match self {
            Record::Publication(r) => Some(r),
            _ => None,
        }
    }

    /// The researcher variant, if this is one
    pub fn as_researcher(&self) -> Option<&Researcher> {
        match self {
            Record::Researcher(r) => Some(r),
            _ => None,
        }
    }

    /// The grant variant, if this is one
    pub fn as_grant(&self) -> Option<&Grant> {
        match self {
            Record::Grant(r) => Some(r),
            _ => None,
        }
    }
}

/// Convert one raw page entry into the record variant selected by the
/// declared result type.
pub fn materialize(
    client: &Arc<DslClient>,
    raw: &JsonObject,
    result_type: ResultType,
) -> Result<Record> {
    let record = match result_type {
        ResultType::Publications => Record::Publication(Publication::from_raw(raw)),
        ResultType::Researchers => {
            Record::Researcher(Researcher::from_raw(Arc::clone(client), raw))
        }
        ResultType::Grants => Record::Grant(Grant::from_raw(raw)),
        ResultType::Organizations => Record::Organization(Organization::from_raw(raw)),
    };
    Ok(record)
}

fn str_field<'a>(fields: &'a ValueMap, name: &str) -> Option<&'a str> {
    fields.get(name).and_then(JsonValue::as_str)
}

fn int_field(fields: &ValueMap, name: &str) -> Option<i64> {
    fields.get(name).and_then(JsonValue::as_i64)
}

// ============================================================================
// Publication
// ============================================================================

/// A publication with its embedded author sub-records
#[derive(Debug)]
pub struct Publication {
    fields: ValueMap,
    authors: Vec<Author>,
}

impl Publication {
    fn from_raw(raw: &JsonObject) -> Self {
        let mut fields = schema::canonicalize(raw, schema::PUBLICATION_FIELDS);

        // Authors arrive either under `authors` or, older responses, as the
        // nested `author_affiliations` list-of-lists.
        let raw_authors = fields
            .remove("authors")
            .or_else(|| fields.remove("author_affiliations"));
        let authors = raw_authors.map(parse_authors).unwrap_or_default();

        Self { fields, authors }
    }

    pub fn id(&self) -> Option<&str> {
        str_field(&self.fields, "id")
    }

    pub fn doi(&self) -> Option<&str> {
        str_field(&self.fields, "doi")
    }

    pub fn title(&self) -> Option<&str> {
        str_field(&self.fields, "title")
    }

    pub fn year(&self) -> Option<i64> {
        int_field(&self.fields, "year")
    }

    pub fn journal(&self) -> Option<&str> {
        match self.fields.get("journal") {
            Some(JsonValue::String(name)) => Some(name),
            Some(JsonValue::Object(journal)) => journal.get("title").and_then(JsonValue::as_str),
            _ => None,
        }
    }

    /// Authors in publication order
    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    /// Access any canonical field
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.fields.get(name)
    }
}

fn parse_authors(value: JsonValue) -> Vec<Author> {
    let JsonValue::Array(entries) = value else {
        return Vec::new();
    };
    let mut authors = Vec::new();
    for entry in entries {
        match entry {
            JsonValue::Object(raw) => authors.push(Author::from_raw(&raw)),
            // author_affiliations nests the author list one level deeper
            JsonValue::Array(nested) => {
                for inner in nested {
                    if let JsonValue::Object(raw) = inner {
                        authors.push(Author::from_raw(&raw));
                    }
                }
            }
            _ => {}
        }
    }
    authors
}

// ============================================================================
// Author
// ============================================================================

/// An author as listed on one publication.
///
/// The affiliation list reflects that publication only.
#[derive(Debug)]
pub struct Author {
    fields: ValueMap,
    affiliations: Vec<Organization>,
}

impl Author {
    fn from_raw(raw: &JsonObject) -> Self {
        let mut fields = schema::canonicalize(raw, schema::AUTHOR_FIELDS);
        let affiliations = match fields.remove("affiliations") {
            Some(JsonValue::Array(entries)) => entries
                .iter()
                .filter_map(|entry| entry.as_object().map(Organization::from_raw))
                .collect(),
            _ => Vec::new(),
        };
        Self {
            fields,
            affiliations,
        }
    }

    pub fn first_name(&self) -> Option<&str> {
        str_field(&self.fields, "first_name")
    }

    pub fn last_name(&self) -> Option<&str> {
        str_field(&self.fields, "last_name")
    }

    pub fn orcid(&self) -> Option<&str> {
        str_field(&self.fields, "orcid")
    }

    /// Link to the researcher entity, when the server provides one
    pub fn researcher_id(&self) -> Option<&str> {
        str_field(&self.fields, "researcher_id")
    }

    /// Affiliations in the context of the publication this author appears on
    pub fn affiliations(&self) -> &[Organization] {
        &self.affiliations
    }

    /// Access any canonical field
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.fields.get(name)
    }
}

// ============================================================================
// Researcher
// ============================================================================

/// A researcher; the general affiliation list resolves lazily
pub struct Researcher {
    fields: ValueMap,
    affiliations: Deferred<Vec<Organization>>,
    client: Arc<DslClient>,
}

impl Researcher {
    fn from_raw(client: Arc<DslClient>, raw: &JsonObject) -> Self {
        let mut fields = schema::canonicalize(raw, schema::RESEARCHER_FIELDS);

        // `research_orgs` (canonical: affiliations) is a list of organization
        // ids; the full organization records require a scoped lookup.
        let ids = match fields.remove("affiliations") {
            Some(JsonValue::Array(entries)) => entries
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            fields,
            affiliations: Deferred::unresolved(ids),
            client,
        }
    }

    pub fn id(&self) -> Option<&str> {
        str_field(&self.fields, "id")
    }

    pub fn first_name(&self) -> Option<&str> {
        str_field(&self.fields, "first_name")
    }

    pub fn last_name(&self) -> Option<&str> {
        str_field(&self.fields, "last_name")
    }

    pub fn orcid(&self) -> Option<&str> {
        str_field(&self.fields, "orcid")
    }

    /// Whether the affiliation organizations have been fetched yet
    pub fn affiliations_resolved(&self) -> bool {
        self.affiliations.is_resolved()
    }

    /// The researcher's affiliation organizations.
    ///
    /// The first read issues one scoped lookup through the session transport
    /// (rate limited and cached like any page fetch); later reads on this
    /// instance return the stored value without I/O.
    pub async fn affiliations(&self) -> Result<&[Organization]> {
        let orgs = self
            .affiliations
            .get_or_resolve(|| async {
                let ids = self.affiliations.pending_ids();
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                let query = Query::entity_lookup(ResultType::Organizations, ids);
                let limit = (ids.len() as u32).clamp(1, MAX_PAGE_SIZE);
                tracing::debug!(count = ids.len(), "resolving researcher affiliations");
                let page = self.client.fetch_page(&query, 0, limit).await?;
                Ok(page
                    .items
                    .iter()
                    .map(Organization::from_raw)
                    .collect::<Vec<_>>())
            })
            .await?;
        Ok(orgs)
    }

    /// Access any canonical field
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.fields.get(name)
    }
}

impl std::fmt::Debug for Researcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Researcher")
            .field("id", &self.id())
            .field("affiliations_resolved", &self.affiliations.is_resolved())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Grant
// ============================================================================

/// A funded grant
#[derive(Debug)]
pub struct Grant {
    fields: ValueMap,
}

impl Grant {
    fn from_raw(raw: &JsonObject) -> Self {
        Self {
            fields: schema::canonicalize(raw, schema::GRANT_FIELDS),
        }
    }

    pub fn id(&self) -> Option<&str> {
        str_field(&self.fields, "id")
    }

    pub fn title(&self) -> Option<&str> {
        str_field(&self.fields, "title")
    }

    pub fn start_year(&self) -> Option<i64> {
        int_field(&self.fields, "start_year")
    }

    pub fn funding(&self) -> Option<f64> {
        self.fields.get("funding").and_then(JsonValue::as_f64)
    }

    pub fn funder(&self) -> Option<&str> {
        str_field(&self.fields, "funder")
    }

    /// Access any canonical field
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.fields.get(name)
    }
}

// ============================================================================
// Organization
// ============================================================================

/// A research organization
#[derive(Debug, Clone)]
pub struct Organization {
    fields: ValueMap,
}

impl Organization {
    pub(crate) fn from_raw(raw: &JsonObject) -> Self {
        Self {
            fields: schema::canonicalize(raw, schema::ORGANIZATION_FIELDS),
        }
    }

    pub fn id(&self) -> Option<&str> {
        str_field(&self.fields, "id")
    }

    pub fn name(&self) -> Option<&str> {
        str_field(&self.fields, "name")
    }

    pub fn acronym(&self) -> Option<&str> {
        str_field(&self.fields, "acronym")
    }

    pub fn country(&self) -> Option<&str> {
        str_field(&self.fields, "country")
    }

    pub fn city(&self) -> Option<&str> {
        str_field(&self.fields, "city")
    }

    /// Access any canonical field
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.fields.get(name)
    }
}
