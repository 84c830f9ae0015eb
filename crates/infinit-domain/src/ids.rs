//! Row identifier newtypes

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                Self(v)
            }
        }
    };
}

id_newtype! {
    /// Identifier of a Movement row
    MovementId
}

id_newtype! {
    /// Identifier of an Alias row
    AliasId
}

id_newtype! {
    /// Identifier of a SourceDoc row
    SourceId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(MovementId(42).to_string(), "42");
        assert_eq!(SourceId(7).as_i64(), 7);
    }

    #[test]
    fn test_ordering_is_by_value() {
        assert!(MovementId(1) < MovementId(2));
    }
}
