use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryType {
    User,
    Group,
}

impl LibraryType {
    fn as_path_segment(self) -> &'static str {
        match self {
            LibraryType::User => "users",
            LibraryType::Group => "groups",
        }
    }
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LibraryType::User => "user",
            LibraryType::Group => "group",
        })
    }
}

/// Identifies one Zotero library: a user's personal library or a group library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRef {
    pub library_type: LibraryType,
    pub id: String,
}

impl LibraryRef {
    pub fn new(library_type: LibraryType, id: impl Into<String>) -> Self {
        Self {
            library_type,
            id: id.into(),
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::new(LibraryType::User, id)
    }

    pub fn group(id: impl Into<String>) -> Self {
        Self::new(LibraryType::Group, id)
    }

    pub(crate) fn path_prefix(&self) -> String {
        format!("/{}/{}", self.library_type.as_path_segment(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_prefix_uses_plural_segment() {
        assert_eq!(LibraryRef::user("42").path_prefix(), "/users/42");
        assert_eq!(LibraryRef::group("7").path_prefix(), "/groups/7");
    }
}
