use crate::types::{AnyValue, TemplateString, ValueMap};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RequestTemplate {
    pub method: String,

    /// Absolute URL template, e.g. `{{host}}/users/{id}`. `{param}` placeholders are
    /// filled from `parameters.path`.
    pub url: TemplateString,

    #[serde(default)]
    pub parameters: RequestParameters,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RequestParameters {
    #[serde(default, skip_serializing_if = "ValueMap::is_empty")]
    pub path: ValueMap,

    #[serde(default, skip_serializing_if = "ValueMap::is_empty")]
    pub query: ValueMap,

    #[serde(default, skip_serializing_if = "ValueMap::is_empty")]
    pub header: ValueMap,

    #[serde(default, skip_serializing_if = "ValueMap::is_empty")]
    pub cookie: ValueMap,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "mediaType")]
    pub media_type: Option<String>,

    pub value: AnyValue,
}

impl RequestBody {
    pub fn is_json(&self) -> bool {
        match &self.media_type {
            None => true,
            Some(mt) => {
                let mt = mt.to_ascii_lowercase();
                mt.starts_with("application/json") || mt.ends_with("+json")
            }
        }
    }
}
