use dispatchx_core::{InvalidPath, ResourcePath};

/// Maps a raw request path to the resource path it addresses.
///
/// 1. Strips the first configured prefix that matches on a segment boundary.
/// 2. Empty and `/` become the root.
/// 3. Drops at most one trailing slash (never from the root). `//` is not
///    the root and fails like any other empty segment.
#[derive(Debug, Clone, Default)]
pub struct PathNormalizer {
    prefixes: Vec<String>,
}

impl PathNormalizer {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = prefixes
            .into_iter()
            .filter_map(|prefix| {
                let trimmed = prefix.as_ref().trim_end_matches('/');
                if trimmed.is_empty() {
                    return None;
                }
                if trimmed.starts_with('/') {
                    Some(trimmed.to_string())
                } else {
                    Some(format!("/{}", trimmed))
                }
            })
            .collect();
        Self { prefixes }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn normalize(&self, raw: &str) -> Result<ResourcePath, InvalidPath> {
        let mut path = raw;
        for prefix in &self.prefixes {
            if let Some(rest) = path.strip_prefix(prefix.as_str()) {
                if rest.is_empty() || rest.starts_with('/') {
                    path = rest;
                    break;
                }
            }
        }

        if path.is_empty() || path == "/" {
            return Ok(ResourcePath::root());
        }
        let trimmed = path.strip_suffix('/').unwrap_or(path);
        if trimmed == "/" {
            // Only `//` lands here; parse it whole so the empty segment is rejected.
            return ResourcePath::parse(path);
        }
        ResourcePath::parse(trimmed)
    }
}
