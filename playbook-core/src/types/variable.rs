use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeSide {
    Request,
    Response,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariableLocation {
    Body,
    Header,
    Query,
    Path,
    Cookie,
    StatusCode,
}

impl fmt::Display for VariableLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VariableLocation::Body => "body",
            VariableLocation::Header => "header",
            VariableLocation::Query => "query",
            VariableLocation::Path => "path",
            VariableLocation::Cookie => "cookie",
            VariableLocation::StatusCode => "statusCode",
        };
        f.write_str(s)
    }
}

/// Rule deriving a new environment value from a completed HTTP exchange.
///
/// For `body`, `path` is a JSON pointer (`/a/0/b`) or a JSONPath (`$.a[0].b`).
/// For `header`, `query`, `cookie` and `path` it names the item to read.
/// `statusCode` ignores `path`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VariableAssignment {
    pub name: String,

    pub from: ExchangeSide,

    #[serde(rename = "in", alias = "location")]
    pub location: VariableLocation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}
