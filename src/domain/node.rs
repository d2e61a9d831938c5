use std::{fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;

use crate::domain::NodeId;

/// A requirement tracked by the graph.
///
/// A node is declared in a source document (`file`) at a position described
/// by `location`, a breadcrumb of section headings. The `checksum` is the
/// fingerprint of the requirement's body at the last time it was recorded as
/// in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Unique identifier, e.g. `BR-001`.
    pub id: NodeId,
    /// Requirement tier, e.g. `business`.
    pub node_type: NodeType,
    /// Short human-readable title.
    pub title: NonEmptyString,
    /// Path of the declaring document, relative to the repository root.
    pub file: String,
    /// Headings leading to the requirement within `file`.
    pub location: Vec<String>,
    /// Lifecycle state.
    pub status: Status,
    /// Fingerprint of the requirement body at last sync.
    pub checksum: String,
}

impl Node {
    /// Create a node with an empty location, `active` status and no checksum.
    #[must_use]
    pub fn new(id: NodeId, node_type: NodeType, title: NonEmptyString, file: String) -> Self {
        Self {
            id,
            node_type,
            title,
            file,
            location: Vec::new(),
            status: Status::active(),
            checksum: String::new(),
        }
    }

    /// Set the location breadcrumb.
    #[must_use]
    pub fn with_location(mut self, location: Vec<String>) -> Self {
        self.location = location;
        self
    }

    /// Set the lifecycle status.
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Set the recorded checksum.
    #[must_use]
    pub fn with_checksum(mut self, checksum: String) -> Self {
        self.checksum = checksum;
        self
    }
}

/// Error returned when a vocabulary term is empty or malformed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid term '{0}': must be non-empty and contain only lowercase letters, digits or '_'")]
pub struct InvalidTermError(String);

fn is_term(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

// Each vocabulary (tiers, statuses, relations) gets its own type so they
// cannot be mixed up, while sharing validation.
macro_rules! term {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(NonEmptyString);

        impl $name {
            /// Creates a new term.
            ///
            /// # Errors
            ///
            /// Returns [`InvalidTermError`] if the string is empty or contains
            /// characters other than lowercase letters, digits and `_`.
            pub fn new(s: String) -> Result<Self, InvalidTermError> {
                if !is_term(&s) {
                    return Err(InvalidTermError(s));
                }
                NonEmptyString::new(s).map(Self).map_err(InvalidTermError)
            }

            /// Returns the string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl FromStr for $name {
            type Err = InvalidTermError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s.to_string())
            }
        }

        impl TryFrom<&str> for $name {
            type Error = InvalidTermError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value.to_string())
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.0.as_str())
            }
        }
    };
}

term! {
    /// A requirement tier, e.g. `business` or `system`.
    NodeType
}

term! {
    /// The lifecycle state of a requirement, e.g. `active` or `deprecated`.
    Status
}

term! {
    /// The kind of relationship a link expresses, e.g. `refines`.
    RelationType
}

impl Status {
    /// The `active` status.
    ///
    /// # Panics
    ///
    /// Never; `active` is a valid term.
    #[must_use]
    pub fn active() -> Self {
        Self::new("active".to_string()).expect("this should never fail")
    }
}

impl RelationType {
    /// The `refines` relation.
    ///
    /// # Panics
    ///
    /// Never; `refines` is a valid term.
    #[must_use]
    pub fn refines() -> Self {
        Self::new("refines".to_string()).expect("this should never fail")
    }
}
