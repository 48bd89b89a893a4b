use serde::{Deserialize, Serialize, Serializer};
use setu_core::config::RequestConfig;
use setu_core::{RequestMode, SetuError};
use std::collections::HashMap;

/// Upper bound the API accepts for `num`.
pub const MAX_NUM: u32 = 20;
/// Upper bound the API accepts for the `uid` list.
pub const MAX_UIDS: usize = 20;

/// Request body for `POST /setu/v2`.
///
/// Empty or unset filters are left out of the JSON entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetuQuery {
    pub r18: u8,
    #[serde(serialize_with = "serialize_num")]
    pub num: u32,
    /// AND-of-ORs tag filter: every inner list must match at least one tag.
    #[serde(rename = "tag", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub size: Vec<String>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_uids"
    )]
    pub uid: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(rename = "excludeAI", skip_serializing_if = "Option::is_none")]
    pub exclude_ai: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}

impl SetuQuery {
    pub fn new(mode: RequestMode) -> Self {
        Self {
            r18: mode.r18(),
            num: 1,
            ..Default::default()
        }
    }

    /// Build the per-message query from the configured filters.
    pub fn from_config(mode: RequestMode, cfg: &RequestConfig) -> Self {
        Self {
            r18: mode.r18(),
            num: cfg.num,
            tags: cfg.tags.clone(),
            size: cfg.size.clone(),
            uid: cfg.uid.clone(),
            keyword: cfg.keyword.clone().filter(|s| !s.is_empty()),
            proxy: cfg.proxy.clone().filter(|s| !s.is_empty()),
            exclude_ai: cfg.exclude_ai,
            aspect_ratio: cfg.aspect_ratio.clone().filter(|s| !s.is_empty()),
        }
    }

    pub fn num(mut self, num: u32) -> Self {
        self.num = num;
        self
    }

    pub fn tags(mut self, tags: Vec<Vec<String>>) -> Self {
        self.tags = tags;
        self
    }

    pub fn exclude_ai(mut self, exclude: bool) -> Self {
        self.exclude_ai = Some(exclude);
        self
    }

    pub fn aspect_ratio(mut self, ratio: &str) -> Self {
        self.aspect_ratio = Some(ratio.to_string());
        self
    }

    /// `num` as it goes on the wire.
    pub fn effective_num(&self) -> u32 {
        self.num.clamp(1, MAX_NUM)
    }
}

fn serialize_num<S: Serializer>(num: &u32, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u32((*num).clamp(1, MAX_NUM))
}

#[allow(clippy::ptr_arg)]
fn serialize_uids<S: Serializer>(uids: &Vec<u64>, s: S) -> Result<S::Ok, S::Error> {
    let end = uids.len().min(MAX_UIDS);
    uids[..end].serialize(s)
}

/// Raw API envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SetuResponse {
    /// Empty or null on success.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<SetuItem>>,
}

/// One illustration returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetuItem {
    pub pid: u64,
    /// Page index within the work.
    pub p: u32,
    pub uid: u64,
    pub title: String,
    pub author: String,
    pub r18: bool,
    pub width: u32,
    pub height: u32,
    pub tags: Vec<String>,
    pub ext: String,
    pub ai_type: u8,
    pub upload_date: i64,
    /// Size label ("original", "regular", ...) to URL.
    pub urls: HashMap<String, String>,
}

impl SetuItem {
    pub fn original_url(&self) -> Option<&str> {
        self.urls
            .get("original")
            .map(String::as_str)
            .filter(|u| !u.is_empty())
    }

    /// Local file name `{pid}_p{page}.{ext}`.
    ///
    /// `ext` comes from the remote side, so anything that is not a plain
    /// alphanumeric extension is rejected instead of being joined into a path.
    pub fn file_name(&self) -> Result<String, SetuError> {
        if self.ext.is_empty() || !self.ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SetuError::InvalidRecord {
                pid: self.pid,
                reason: format!("unusable extension '{}'", self.ext),
            });
        }
        Ok(format!("{}_p{}.{}", self.pid, self.p, self.ext))
    }
}
