use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::label::ProjectId;

/// The document payload of a record. Binary documents (images, audio) are
/// stored by file name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Data {
    Text {
        filename: String,
        #[serde(default)]
        upload_name: Option<String>,
        text: String,
    },
    Binary {
        filename: String,
        #[serde(default)]
        upload_name: Option<String>,
    },
}

impl Data {
    pub fn text(filename: impl Into<String>, text: impl Into<String>) -> Self {
        Data::Text {
            filename: filename.into(),
            upload_name: None,
            text: text.into(),
        }
    }
    pub fn binary(filename: impl Into<String>) -> Self {
        Data::Binary {
            filename: filename.into(),
            upload_name: None,
        }
    }
    pub fn filename(&self) -> &str {
        match self {
            Data::Text { filename, .. } | Data::Binary { filename, .. } => filename,
        }
    }
    // falls back to the file name when the upload kept it
    pub fn upload_name(&self) -> &str {
        match self {
            Data::Text { filename, upload_name, .. }
            | Data::Binary { filename, upload_name } => upload_name.as_deref().unwrap_or(filename),
        }
    }
    pub fn content(&self) -> Option<&str> {
        match self {
            Data::Text { text, .. } => Some(text),
            Data::Binary { .. } => None,
        }
    }
    pub fn create(&self, project: ProjectId, meta: &Map<String, Value>) -> NewExample {
        NewExample {
            uuid: Uuid::new_v4(),
            project,
            filename: self.filename().to_owned(),
            upload_name: self.upload_name().to_owned(),
            text: self.content().map(str::to_owned),
            meta: Value::Object(meta.clone()),
        }
    }
}
impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Data::Text { text, .. } => write!(f, "{}", text),
            Data::Binary { filename, .. } => write!(f, "{}", filename),
        }
    }
}

/// An unsaved example.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExample {
    pub uuid: Uuid,
    pub project: ProjectId,
    pub filename: String,
    pub upload_name: String,
    pub text: Option<String>,
    pub meta: Value,
}
