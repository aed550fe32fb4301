//! Places a request can be sent after a mutation.

use std::fmt;

use uuid::Uuid;

/// A read-only view a handler redirects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Index,
    PostDetail(Uuid),
    Profile(String),
}

impl Destination {
    pub fn path(&self) -> String {
        match self {
            Destination::Index => "/".to_string(),
            Destination::PostDetail(id) => format!("/posts/{id}/"),
            Destination::Profile(username) => format!("/profile/{username}/"),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let id = Uuid::new_v4();
        assert_eq!(Destination::Index.path(), "/");
        assert_eq!(Destination::PostDetail(id).path(), format!("/posts/{id}/"));
        assert_eq!(Destination::Profile("ann".into()).to_string(), "/profile/ann/");
    }
}
