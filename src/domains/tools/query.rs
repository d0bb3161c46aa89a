//! OData query URL construction.
//!
//! The BCB open-data service follows the OData system query option names
//! (`$format`, `$top`, `$skip`, `$filter`, `$orderby`). Options are appended
//! in that fixed order after any parameters already carried by the endpoint
//! template, each key and value form-urlencoded on its own.

use super::error::ToolError;

/// Base address of the payment-methods OData service.
pub const API_BASE_URL: &str =
    "https://olinda.bcb.gov.br/olinda/servico/MPV_DadosAbertos/versao/v1/odata";

/// Optional query options understood by the service.
///
/// Absent fields, empty strings and zero counts are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub format: Option<String>,
    pub top: Option<u64>,
    pub skip: Option<u64>,
    pub filter: Option<String>,
    pub orderby: Option<String>,
}

impl QueryOptions {
    /// Options requesting a JSON response.
    pub fn json() -> Self {
        Self {
            format: Some("json".to_string()),
            ..Default::default()
        }
    }

    /// The options as ordered `(parameter, value)` pairs.
    fn pairs(&self) -> Vec<(String, String)> {
        let text = |name: &str, value: &Option<String>| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (name.to_string(), v.to_string()))
        };
        let count = |name: &str, value: Option<u64>| {
            value
                .filter(|v| *v > 0)
                .map(|v| (name.to_string(), v.to_string()))
        };

        [
            text("$format", &self.format),
            count("$top", self.top),
            count("$skip", self.skip),
            text("$filter", &self.filter),
            text("$orderby", &self.orderby),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Build the full service URL for a relative endpoint template.
///
/// The template may carry its own query string (the OData parameter alias);
/// those parameters are kept first. Fails with [`ToolError::InvalidEndpoint`]
/// when the template is not a relative path.
pub fn build_url(endpoint: &str, options: &QueryOptions) -> Result<String, ToolError> {
    let (path, query) = match endpoint.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (endpoint, None),
    };

    if !is_relative_path(path) {
        return Err(ToolError::invalid_endpoint(endpoint));
    }

    let mut pairs: Vec<(String, String)> = match query {
        Some(query) => serde_urlencoded::from_str(query)
            .map_err(|_| ToolError::invalid_endpoint(endpoint))?,
        None => Vec::new(),
    };
    pairs.extend(options.pairs());

    let mut url = format!("{API_BASE_URL}/{path}");
    if !pairs.is_empty() {
        let encoded = serde_urlencoded::to_string(&pairs)
            .map_err(|_| ToolError::invalid_endpoint(endpoint))?;
        url.push('?');
        url.push_str(&encoded);
    }

    Ok(url)
}

fn is_relative_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains("://")
        && !path.contains(['#', '\\'])
        && !path.chars().any(|c| c.is_whitespace() || c.is_control())
        && path.split('/').all(|segment| !segment.is_empty() && segment != "..")
}
