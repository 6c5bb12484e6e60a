//! Core type definitions for shelftalk

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Raw integer value
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                $name(value)
            }
        }

        impl FromStr for $name {
            type Err = crate::ShelfError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map($name).map_err(|_| {
                    crate::ShelfError::Validation(format!("Invalid {}: {}", $label, s))
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a discussion thread
    ThreadId,
    "thread id"
);

numeric_id!(
    /// Identifier of a comment or reply
    CommentId,
    "comment id"
);

numeric_id!(
    /// Identifier of a book in the external catalog
    BookId,
    "book id"
);

numeric_id!(
    /// Identifier of a member in the external member directory
    MemberId,
    "member id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_parse() {
        let id: ThreadId = "42".parse().unwrap();
        assert_eq!(id, ThreadId(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_id_parse_rejects_garbage() {
        let err = "abc".parse::<CommentId>().unwrap_err();
        assert!(err.to_string().contains("comment id"));
    }

    #[test]
    fn test_id_serializes_transparently() {
        let json = serde_json::to_string(&MemberId(7)).unwrap();
        assert_eq!(json, "7");
    }
}
