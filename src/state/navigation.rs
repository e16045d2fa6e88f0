//! Route model for the two-screen navigation stack.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Path prefix of detail routes.
const DETAIL_PREFIX: &str = "/image/";

/// A screen in the navigation stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Route {
    /// The image grid.
    #[default]
    Gallery,
    /// Full-screen detail for a catalog id.
    ///
    /// The id is not checked against the catalog; unknown ids resolve to the
    /// not-found placeholder.
    Detail { id: String },
}

impl Route {
    /// Creates a detail route for `id`.
    pub fn detail(id: impl Into<String>) -> Self {
        Self::Detail { id: id.into() }
    }

    /// Parses a route path such as `/` or `/image/leaf-1`.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        if path == "/" || path.is_empty() {
            return Some(Self::Gallery);
        }

        let id = path.strip_prefix(DETAIL_PREFIX)?;
        if id.is_empty() || id.contains('/') {
            return None;
        }
        Some(Self::detail(id))
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Gallery => "/".to_string(),
            Self::Detail { id } => format!("{DETAIL_PREFIX}{id}"),
        }
    }

    /// Catalog id carried by a detail route.
    #[must_use]
    pub fn item_id(&self) -> Option<&str> {
        match self {
            Self::Gallery => None,
            Self::Detail { id } => Some(id),
        }
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use crate::state::Route;

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Gallery.path(), "/");
        assert_eq!(Route::detail("leaf-1").path(), "/image/leaf-1");
        assert_eq!(Route::detail("leaf-1").to_string(), "/image/leaf-1");
    }

    #[test]
    fn test_parse_routes() {
        assert_eq!(Route::parse("/"), Some(Route::Gallery));
        assert_eq!(Route::parse("/image/leaf-2"), Some(Route::detail("leaf-2")));
        assert_eq!(Route::parse("/image/ghost"), Some(Route::detail("ghost")));
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        assert_eq!(Route::parse("/image/"), None);
        assert_eq!(Route::parse("/image/a/b"), None);
        assert_eq!(Route::parse("/album/leaf-1"), None);
    }

    #[test]
    fn test_item_id() {
        assert_eq!(Route::Gallery.item_id(), None);
        assert_eq!(Route::detail("leaf-4").item_id(), Some("leaf-4"));
    }
}
