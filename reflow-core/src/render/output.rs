//! Render output handed to mount targets.

use std::fmt;

use serde::Serialize;

/// Text produced by a render function.
///
/// Serializes as a plain string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RenderOutput {
    Text(String),
    /// Ordered pieces, materialized back to back.
    Fragments(Vec<String>),
}

impl RenderOutput {
    /// Concatenate the output into a single string.
    pub fn into_text(self) -> String {
        match self {
            RenderOutput::Text(text) => text,
            RenderOutput::Fragments(fragments) => fragments.concat(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RenderOutput::Text(text) => text.is_empty(),
            RenderOutput::Fragments(fragments) => fragments.iter().all(String::is_empty),
        }
    }
}

impl fmt::Display for RenderOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderOutput::Text(text) => f.write_str(text),
            RenderOutput::Fragments(fragments) => {
                for fragment in fragments {
                    f.write_str(fragment)?;
                }
                Ok(())
            }
        }
    }
}

impl From<String> for RenderOutput {
    fn from(text: String) -> Self {
        RenderOutput::Text(text)
    }
}

impl From<&str> for RenderOutput {
    fn from(text: &str) -> Self {
        RenderOutput::Text(text.to_owned())
    }
}

impl From<Vec<String>> for RenderOutput {
    fn from(fragments: Vec<String>) -> Self {
        RenderOutput::Fragments(fragments)
    }
}

impl From<Vec<&str>> for RenderOutput {
    fn from(fragments: Vec<&str>) -> Self {
        RenderOutput::Fragments(fragments.into_iter().map(str::to_owned).collect())
    }
}
