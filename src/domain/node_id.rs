use std::{cmp::Ordering, fmt, num::NonZeroUsize, str::FromStr};

/// The identifier of a requirement node.
///
/// Format: `{PREFIX}-{NUMBER}`, where:
/// - `PREFIX` is a non-empty run of uppercase ASCII letters naming the tier
///   (e.g. `BR` for business, `SR` for system)
/// - `NUMBER` is a positive integer, usually zero-padded (e.g. `001`)
///
/// The text is kept exactly as written, so `BR-001` and `BR-1` are distinct
/// identifiers. Identifiers order by prefix, then numerically, then by text,
/// so `BR-2` sorts before `BR-10`.
///
/// Examples: `BR-001`, `SR-042`, `ADR-0007`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId {
    text: String,
    prefix_len: usize,
    number: NonZeroUsize,
}

impl NodeId {
    /// Create an identifier from its parts, padding the number with leading
    /// zeros to `padding` digits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Prefix`] if `prefix` is empty or contains anything
    /// other than uppercase ASCII letters.
    ///
    /// ```
    /// use std::num::NonZeroUsize;
    ///
    /// use contextgit::NodeId;
    ///
    /// let number = NonZeroUsize::new(42).unwrap();
    ///
    /// assert_eq!(NodeId::new("BR", number, 3).unwrap().as_str(), "BR-042");
    /// assert_eq!(NodeId::new("BR", number, 4).unwrap().as_str(), "BR-0042");
    /// assert_eq!(NodeId::new("BR", number, 1).unwrap().as_str(), "BR-42");
    /// ```
    pub fn new(prefix: &str, number: NonZeroUsize, padding: usize) -> Result<Self, Error> {
        validate_prefix(prefix)?;
        Ok(Self {
            text: format!("{prefix}-{number:0padding$}"),
            prefix_len: prefix.len(),
            number,
        })
    }

    /// The tier prefix, e.g. `BR`.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.text[..self.prefix_len]
    }

    /// The numeric component.
    #[must_use]
    pub const fn number(&self) -> NonZeroUsize {
        self.number
    }

    /// The identifier exactly as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

fn validate_prefix(prefix: &str) -> Result<(), Error> {
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(Error::Prefix(prefix.to_string()));
    }
    Ok(())
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.prefix()
            .cmp(other.prefix())
            .then_with(|| self.number.cmp(&other.number))
            .then_with(|| self.text.cmp(&other.text))
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Errors that can occur when parsing or constructing a [`NodeId`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The identifier is not of the form `PREFIX-NUMBER`.
    #[error("Invalid node id '{0}': expected PREFIX-NUMBER, e.g. BR-001")]
    Syntax(String),

    /// The prefix is empty or not uppercase alphabetic.
    #[error("Invalid prefix '{0}': must be non-empty and contain only uppercase letters (A-Z)")]
    Prefix(String),

    /// The number is not a positive integer.
    #[error("Invalid number in node id '{0}': expected a non-zero integer, got '{1}'")]
    Number(String, String),
}

impl FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((prefix, digits)) = s.split_once('-') else {
            return Err(Error::Syntax(s.to_string()));
        };

        if prefix.is_empty() || digits.is_empty() {
            return Err(Error::Syntax(s.to_string()));
        }
        validate_prefix(prefix)?;

        // `usize::from_str` accepts a leading '+', which is not a valid id.
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::Number(s.to_string(), digits.to_string()));
        }
        let number = digits
            .parse::<usize>()
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| Error::Number(s.to_string(), digits.to_string()))?;

        Ok(Self {
            text: s.to_string(),
            prefix_len: prefix.len(),
            number,
        })
    }
}

impl TryFrom<&str> for NodeId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}
