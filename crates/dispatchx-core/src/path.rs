use core::fmt;
use core::str::FromStr;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid resource path '{path}': {reason}")]
pub struct InvalidPath {
    pub path: String,
    pub reason: &'static str,
}

impl InvalidPath {
    fn new(path: &str, reason: &'static str) -> Self {
        Self {
            path: path.to_string(),
            reason,
        }
    }
}

/// A normalized, absolute resource path.
///
/// `/` is the root. Every other path starts with `/`, has no trailing slash
/// and no empty, `.` or `..` segments.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct ResourcePath(String);

impl ResourcePath {
    pub fn root() -> Self {
        ResourcePath("/".to_string())
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidPath> {
        if raw == "/" {
            return Ok(Self::root());
        }
        let Some(rest) = raw.strip_prefix('/') else {
            return Err(InvalidPath::new(raw, "path must be absolute"));
        };
        for segment in rest.split('/') {
            match segment {
                "" => return Err(InvalidPath::new(raw, "empty path segment")),
                "." | ".." => return Err(InvalidPath::new(raw, "relative path segment")),
                _ if segment.contains('\0') => return Err(InvalidPath::new(raw, "NUL in path segment")),
                _ => {}
            }
        }
        Ok(ResourcePath(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Last segment, empty for the root.
    pub fn name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => "",
        }
    }

    pub fn parent(&self) -> Option<ResourcePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(ResourcePath(self.0[..idx].to_string())),
            None => None,
        }
    }

    pub fn join(&self, name: &str) -> Result<ResourcePath, InvalidPath> {
        if self.is_root() {
            Self::parse(&format!("/{}", name))
        } else {
            Self::parse(&format!("{}/{}", self.0, name))
        }
    }

    /// Returns `true` if `self` equals `prefix` or lies below it.
    /// Matching is done on whole segments: `/ab` does not start with `/a`.
    pub fn starts_with(&self, prefix: &ResourcePath) -> bool {
        if prefix.is_root() {
            return true;
        }
        match self.0.strip_prefix(prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|segment| !segment.is_empty())
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourcePath {
    type Err = InvalidPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourcePath {
    type Error = InvalidPath;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl AsRef<str> for ResourcePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
