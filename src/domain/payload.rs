use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::utils::error::Result;

/// Route parameters substituted into `{param}` placeholders.
pub type RouteParams = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: &str, mime_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            bytes,
        }
    }

    /// 從磁碟讀取附件，MIME 由副檔名推斷
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let mime_type = mime_for_extension(path.extension().and_then(|e| e.to_str()));
        Ok(Self {
            file_name,
            mime_type: mime_type.to_string(),
            bytes,
        })
    }
}

fn mime_for_extension(extension: Option<&str>) -> &'static str {
    match extension.map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadValue {
    Text(String),
    /// Sent as repeated `name[]` parts, or a JSON array.
    List(Vec<String>),
    Bool(bool),
    File(Attachment),
    Files(Vec<Attachment>),
}

impl PayloadValue {
    pub fn has_file(&self) -> bool {
        match self {
            PayloadValue::File(_) => true,
            PayloadValue::Files(files) => !files.is_empty(),
            _ => false,
        }
    }
}

/// Ordered form fields, named the way the backend expects them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    fields: Vec<(String, PayloadValue)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: PayloadValue) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, PayloadValue::Text(value.into()));
        self
    }

    pub fn list<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(
            name,
            PayloadValue::List(values.into_iter().map(Into::into).collect()),
        );
        self
    }

    pub fn flag(mut self, name: &str, value: bool) -> Self {
        self.set(name, PayloadValue::Bool(value));
        self
    }

    pub fn file(mut self, name: &str, attachment: Attachment) -> Self {
        self.set(name, PayloadValue::File(attachment));
        self
    }

    pub fn files(mut self, name: &str, attachments: Vec<Attachment>) -> Self {
        self.set(name, PayloadValue::Files(attachments));
        self
    }

    pub fn get(&self, name: &str) -> Option<&PayloadValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<PayloadValue> {
        let index = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(index).1)
    }

    pub fn has_files(&self) -> bool {
        self.fields.iter().any(|(_, v)| v.has_file())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PayloadValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// JSON body for submissions without attachments.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.fields {
            let json = match value {
                PayloadValue::Text(text) => serde_json::Value::String(text.clone()),
                PayloadValue::List(items) => serde_json::Value::Array(
                    items
                        .iter()
                        .cloned()
                        .map(serde_json::Value::String)
                        .collect(),
                ),
                PayloadValue::Bool(flag) => serde_json::Value::Bool(*flag),
                PayloadValue::File(_) | PayloadValue::Files(_) => continue,
            };
            map.insert(name.clone(), json);
        }
        serde_json::Value::Object(map)
    }
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submitted {
    pub status: u16,
    /// URL after redirects; the page the server sent the user to.
    pub final_url: String,
    pub preserve_scroll: bool,
    pub body: Option<serde_json::Value>,
}
