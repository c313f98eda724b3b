//! Declarative query descriptors for the graph API.
//!
//! Queries are built from typed [`Projection`] values and only become the
//! JSON-LD wire shape (`@context` / `meta` / `structure`) at serialization
//! time, so traversal and validation logic stays independent of the wire
//! representation. Serde structs keep field and projection order exactly as
//! declared.

use crate::client::{check_response, KgClient};
use crate::error::{KgError, Result};
use crate::node::vocab_key;
use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query vocabulary used for descriptor keys.
const QUERY_VOCAB: &str = "https://core.kg.ebrains.eu/vocab/query/";
/// Response vocabulary: payload keys come back under this prefix.
const RESPONSE_VOCAB: &str = "http://example.org/";

/// Filter comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOp {
    Contains,
    Equals,
}

/// A filter applied to a projected field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn contains(value: impl Into<String>) -> Filter {
        Filter {
            op: FilterOp::Contains,
            value: value.into(),
        }
    }

    pub fn equals(value: impl Into<String>) -> Filter {
        Filter {
            op: FilterOp::Equals,
            value: value.into(),
        }
    }
}

/// Single-value reduction policy for multi-valued fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SingleValue {
    First,
}

/// One hop in a projection path.
///
/// Forward hops serialize as plain URI strings; reverse hops serialize as
/// `{"@id": <uri>, "reverse": true}`, following the link from the far end.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Forward(String),
    Reverse(String),
}

impl Serialize for PathSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PathSegment::Forward(uri) => serializer.serialize_str(uri),
            PathSegment::Reverse(uri) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("@id", uri)?;
                map.serialize_entry("reverse", &true)?;
                map.end()
            }
        }
    }
}

/// Source path of a projection: one or more hops, in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// A single forward hop.
    pub fn single(uri: impl Into<String>) -> Path {
        Path(vec![PathSegment::Forward(uri.into())])
    }

    /// A multi-hop traversal in the given order.
    pub fn hops(segments: Vec<PathSegment>) -> Path {
        Path(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        // A lone forward hop stays a bare string on the wire
        match self.0.as_slice() {
            [PathSegment::Forward(uri)] => serializer.serialize_str(uri),
            segments => segments.serialize(serializer),
        }
    }
}

/// A single named output field in a query descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    #[serde(rename = "propertyName")]
    property_name: String,
    path: Path,
    #[serde(skip_serializing_if = "is_false")]
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
    #[serde(rename = "singleValue", skip_serializing_if = "Option::is_none")]
    single_value: Option<SingleValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    structure: Vec<Projection>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Projection {
    /// A projection of the short vocab property `name`, output as
    /// `query:<name>`.
    pub fn vocab(name: &str) -> Projection {
        Projection::new(format!("query:{}", name), Path::single(vocab_key(name)))
    }

    pub fn new(property_name: impl Into<String>, path: Path) -> Projection {
        Projection {
            property_name: property_name.into(),
            path,
            required: false,
            filter: None,
            single_value: None,
            structure: Vec::new(),
        }
    }

    pub fn required(mut self) -> Projection {
        self.required = true;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Projection {
        self.filter = Some(filter);
        self
    }

    pub fn first_value(mut self) -> Projection {
        self.single_value = Some(SingleValue::First);
        self
    }

    /// Attach sub-projections for an embedded object field.
    pub fn nested(mut self, structure: Vec<Projection>) -> Projection {
        self.structure = structure;
        self
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }
}

/// The fixed `@context` block of every descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryContext {
    #[serde(rename = "@vocab")]
    vocab: String,
    query: String,
    #[serde(rename = "propertyName")]
    property_name: IdTerm,
    path: IdTerm,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct IdTerm {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    type_: String,
}

impl Default for QueryContext {
    fn default() -> Self {
        QueryContext {
            vocab: QUERY_VOCAB.to_string(),
            query: RESPONSE_VOCAB.to_string(),
            property_name: IdTerm {
                id: "propertyName".to_string(),
                type_: "@id".to_string(),
            },
            path: IdTerm {
                id: "path".to_string(),
                type_: "@id".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMeta {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(rename = "responseVocab")]
    pub response_vocab: String,
}

/// A complete query descriptor: target type plus an ordered projection list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDescriptor {
    #[serde(rename = "@context")]
    context: QueryContext,
    meta: QueryMeta,
    structure: Vec<Projection>,
}

impl QueryDescriptor {
    /// Start a descriptor targeting the given node type.
    pub fn for_type(type_uri: impl Into<String>) -> QueryDescriptor {
        QueryDescriptor {
            context: QueryContext::default(),
            meta: QueryMeta {
                type_: type_uri.into(),
                response_vocab: RESPONSE_VOCAB.to_string(),
            },
            structure: Vec::new(),
        }
    }

    /// Append a projection, rejecting duplicate output names.
    pub fn push(&mut self, projection: Projection) -> Result<()> {
        if self
            .structure
            .iter()
            .any(|p| p.property_name == projection.property_name)
        {
            return Err(KgError::Config(format!(
                "duplicate projection name: {}",
                projection.property_name
            )));
        }
        self.structure.push(projection);
        Ok(())
    }

    pub fn structure(&self) -> &[Projection] {
        &self.structure
    }
}

/// Build the DatasetVersion search descriptor for a search term.
///
/// Mixes every projection feature the API supports: a required field with a
/// substring filter, plain fields, a reverse multi-hop path reduced to its
/// first value, and a nested repository sub-projection.
pub fn dataset_version_query(search_term: &str) -> Result<QueryDescriptor> {
    let mut query = QueryDescriptor::for_type("https://openminds.ebrains.eu/core/DatasetVersion");

    query.push(
        Projection::vocab("fullName")
            .required()
            .filter(Filter::contains(search_term)),
    )?;
    query.push(Projection::vocab("versionIdentifier"))?;
    query.push(Projection::vocab("releaseDate"))?;
    // Owning dataset, reached backwards along its hasVersion link
    query.push(
        Projection::new(
            "query:datasetName",
            Path::hops(vec![
                PathSegment::Reverse(vocab_key("hasVersion")),
                PathSegment::Forward(vocab_key("fullName")),
            ]),
        )
        .first_value(),
    )?;
    query.push(
        Projection::new("query:repository", Path::single(vocab_key("repository"))).nested(vec![
            Projection::vocab("name"),
            Projection::new("query:iri", Path::single(vocab_key("IRI"))),
        ]),
    )?;

    Ok(query)
}

/// Run the DatasetVersion search against the API.
///
/// POSTs to `queries/?stage=<stage>&size=<page_size>[&restrictToSpaces=<space>]`
/// and returns the payload list unchanged. An empty list is a domain-level
/// condition, reported as [`KgError::EmptyResult`] rather than a transport
/// failure.
pub async fn query_kg(
    client: &KgClient,
    stage: &str,
    space: Option<&str>,
    page_size: usize,
    search_term: &str,
) -> Result<Vec<Value>> {
    let query = dataset_version_query(search_term)?;

    let mut url = client.endpoint("queries/")?;
    url.query_pairs_mut()
        .append_pair("stage", stage)
        .append_pair("size", &page_size.to_string());
    if let Some(space) = space {
        url.query_pairs_mut().append_pair("restrictToSpaces", space);
    }

    let response = client.post_query(url, &query).await?;
    let payload = check_response(response)?;
    let items: Vec<Value> = serde_json::from_value(payload)?;

    if items.is_empty() {
        return Err(KgError::EmptyResult(search_term.to_string()));
    }
    log::info!("query \"{}\" matched {} result(s)", search_term, items.len());
    Ok(items)
}

/// One row of the DatasetVersion search, as rendered by the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetVersionSummary {
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(rename = "versionIdentifier", default)]
    pub version_identifier: Option<String>,
    #[serde(rename = "releaseDate", default)]
    pub release_date: Option<NaiveDate>,
    #[serde(rename = "datasetName", default)]
    pub dataset_name: Option<String>,
}
