use crate::error::ParseError;
use crate::types::Bundle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone)]
pub struct ParsedBundle {
    pub bundle: Bundle,
    pub format: BundleFormat,
}

/// Loads an already-authored bundle document into the in-memory model.
pub fn parse_bundle_str(input: &str, format: BundleFormat) -> Result<ParsedBundle, ParseError> {
    match format {
        BundleFormat::Json => Ok(ParsedBundle {
            bundle: serde_json::from_str::<Bundle>(input)?,
            format,
        }),
        BundleFormat::Yaml => Ok(ParsedBundle {
            bundle: serde_yaml::from_str::<Bundle>(input)?,
            format,
        }),
        BundleFormat::Auto => parse_bundle_auto(input),
    }
}

fn parse_bundle_auto(input: &str) -> Result<ParsedBundle, ParseError> {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    // JSON always starts with `{` after trimming; YAML flow mappings do too, so fall back.
    if trimmed.starts_with('{') {
        return match serde_json::from_str::<Bundle>(input) {
            Ok(bundle) => Ok(ParsedBundle {
                bundle,
                format: BundleFormat::Json,
            }),
            Err(e) => match serde_yaml::from_str::<Bundle>(input) {
                Ok(bundle) => Ok(ParsedBundle {
                    bundle,
                    format: BundleFormat::Yaml,
                }),
                Err(_) => Err(ParseError::Json(e)),
            },
        };
    }

    match serde_yaml::from_str::<Bundle>(input) {
        Ok(bundle) => Ok(ParsedBundle {
            bundle,
            format: BundleFormat::Yaml,
        }),
        Err(e) => Err(ParseError::Yaml(e)),
    }
}
