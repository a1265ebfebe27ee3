use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Request recovered from a page's own `$.ajax` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AjaxDescriptor {
    pub method: String,
    pub url: String,
    pub data: Option<IndexMap<String, String>>,
}

impl AjaxDescriptor {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.data.as_ref()?.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageScripts {
    pub page: String,
    /// External scripts, run before the recovered setup.
    pub prelude: String,
}

impl PageScripts {
    pub fn is_empty(&self) -> bool {
        self.page.is_empty() && self.prelude.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub url: String,
    pub pwd: Option<String>,
}
