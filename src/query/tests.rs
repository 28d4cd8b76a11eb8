//! Tests for query parsing and grammar validation

use super::*;
use crate::error::Error;
use crate::types::ResultType;
use test_case::test_case;

#[test_case("search publications for \"SBML\" return publications", ResultType::Publications; "publications")]
#[test_case("search researchers where research_orgs = \"grid.214458.e\" return researchers", ResultType::Researchers; "researchers")]
#[test_case("search grants for \"malaria\" return grants", ResultType::Grants; "grants")]
#[test_case("search publications return publications", ResultType::Publications; "minimal")]
fn test_parse_accepts_valid_queries(raw: &str, expected: ResultType) {
    let query = Query::parse(raw).unwrap();
    assert_eq!(query.result_type(), expected);
    assert_eq!(query.raw(), raw);
}

#[test_case(""; "empty")]
#[test_case("   "; "whitespace only")]
#[test_case("find publications return publications"; "does not start with search")]
#[test_case("searching publications return publications"; "search must be a whole word")]
#[test_case("search publications"; "missing return clause")]
#[test_case("search publications return journals"; "unknown result type")]
#[test_case("search publications return organizations"; "organizations not user facing")]
#[test_case("search publications return publications, researchers"; "two result types")]
#[test_case("search publications return publications return researchers"; "two return clauses")]
#[test_case("search publications for \"SBML\" return publications aggregate year"; "aggregate clause")]
#[test_case("search publications facet year return publications"; "facet clause")]
#[test_case("search publications return publications limit 10"; "trailing tokens after type")]
fn test_parse_rejects_invalid_queries(raw: &str) {
    let err = Query::parse(raw).unwrap_err();
    assert!(matches!(err, Error::InvalidQuery { .. }), "got: {err}");
}

#[test]
fn test_parse_trims_whitespace() {
    let query = Query::parse("  search grants return grants \n").unwrap();
    assert_eq!(query.raw(), "search grants return grants");
}

#[test]
fn test_entity_lookup_builds_scoped_query() {
    let ids = vec!["grid.214458.e".to_string(), "grid.4991.5".to_string()];
    let query = Query::entity_lookup(ResultType::Organizations, &ids);
    assert_eq!(query.result_type(), ResultType::Organizations);
    assert_eq!(
        query.raw(),
        "search organizations where id in [\"grid.214458.e\", \"grid.4991.5\"] return organizations"
    );
}

#[test]
fn test_query_display_and_try_from() {
    let query: Query = "search grants return grants".try_into().unwrap();
    assert_eq!(query.to_string(), "search grants return grants");
}
