use super::Issue;
use serde::{Deserialize, Serialize};

/// Paging and expansion options of a search.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand: Option<Vec<String>>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// One page of issues with every field and the embedded changelog.
    pub fn page_with_changelog(start_at: u32, max_results: u32) -> Self {
        Self::new()
            .start_at(start_at)
            .max_results(max_results)
            .fields(vec!["*all".to_string()])
            .expand(vec!["changelog".to_string()])
    }

    pub fn start_at(mut self, start_at: u32) -> Self {
        self.start_at = Some(start_at);
        self
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn expand(mut self, expand: Vec<String>) -> Self {
        self.expand = Some(expand);
        self
    }
}

/// JSON body of `POST /search`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchRequest<'a> {
    pub jql: &'a str,
    #[serde(flatten)]
    pub params: SearchParams,
}

impl<'a> SearchRequest<'a> {
    pub fn new(jql: &'a str, params: SearchParams) -> Self {
        Self { jql, params }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default)]
    pub start_at: u32,
    /// Page size the server actually applied, which may be below the one requested.
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub issues: Vec<Issue>,
}
