//! Request building for the weather endpoint.
//!
//! # Design
//! Everything here is pure data: `build_resource` turns a base path and an
//! ordered parameter list into a resource path, and `RequestSpec` renders the
//! exact request bytes that go on the wire. No I/O happens in this module.
//!
//! Parameter values are passed through verbatim. URL safety is the caller's
//! responsibility.

/// Ordered query parameters. Insertion order is wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters {
    pairs: Vec<(String, String)>,
}

impl QueryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, returning `self` for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.push(k, v);
        }
        params
    }
}

/// Join `base_path` and `params` into `base?k1=v1&k2=v2`.
///
/// With no parameters the base path is returned unchanged, without a trailing `?`.
pub fn build_resource(base_path: &str, params: &QueryParameters) -> String {
    let mut resource = String::with_capacity(base_path.len() + 16 * params.len());
    resource.push_str(base_path);
    for (i, (name, value)) in params.iter().enumerate() {
        resource.push(if i == 0 { '?' } else { '&' });
        resource.push_str(name);
        resource.push('=');
        resource.push_str(value);
    }
    resource
}

/// Target and resource of a single GET request. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    host: String,
    port: u16,
    resource_path: String,
}

impl RequestSpec {
    pub fn new(host: impl Into<String>, port: u16, resource_path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            resource_path: resource_path.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    /// Render the request exactly as it is sent.
    pub fn to_wire(&self) -> String {
        format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            self.resource_path, self.host
        )
    }
}
