use std::collections::BTreeMap;

use md5::{Digest, Md5};

/// Transport hint sent with every request but never signed.
pub const FORMAT_PARAM: &str = "format";
pub const SIGNATURE_PARAM: &str = "api_sig";

/// Computes the Last.fm `api_sig` for a parameter set.
///
/// Names are taken in lexicographic order and concatenated as `name` followed
/// directly by `value`, then the shared secret is appended and the UTF-8
/// bytes are MD5-hashed into 32 lowercase hex characters. `format` and any
/// existing `api_sig` are left out.
pub fn sign<'a, I>(params: I, secret: &str) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let sorted: BTreeMap<&str, &str> = params
        .into_iter()
        .filter(|(name, _)| *name != FORMAT_PARAM && *name != SIGNATURE_PARAM)
        .collect();

    let mut hasher = Md5::new();
    for (name, value) in sorted {
        hasher.update(name.as_bytes());
        hasher.update(value.as_bytes());
    }
    hasher.update(secret.as_bytes());

    format!("{:x}", hasher.finalize())
}

/// A Last.fm web service call under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    params: BTreeMap<String, String>,
}

impl ApiRequest {
    pub fn new(method: &str, api_key: &str) -> Self {
        let mut params = BTreeMap::new();
        params.insert("method".to_string(), method.to_string());
        params.insert("api_key".to_string(), api_key.to_string());
        Self { params }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn method(&self) -> &str {
        self.get("method").unwrap_or_default()
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn signature(&self, secret: &str) -> String {
        sign(
            self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            secret,
        )
    }

    /// Form body for an authenticated call: every parameter, `api_sig` and
    /// `format=json`.
    pub fn signed(&self, secret: &str) -> Vec<(String, String)> {
        let signature = self.signature(secret);
        let mut form = self.unsigned();
        form.push((SIGNATURE_PARAM.to_string(), signature));
        form
    }

    /// Query for a read-only call: every parameter and `format=json`.
    pub fn unsigned(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .filter(|(k, _)| k.as_str() != FORMAT_PARAM && k.as_str() != SIGNATURE_PARAM)
            .map(|(k, v)| (k.clone(), v.clone()))
            .chain(std::iter::once((FORMAT_PARAM.to_string(), "json".to_string())))
            .collect()
    }
}
