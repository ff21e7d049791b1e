use crate::error::CommonError;
use once_cell::sync::Lazy;
use regex::Regex;

static NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s/]+(/[^\s/]+)*$").expect("Failed to compile operation name regex")
});

/// Collection every operation created by an lro node lives under.
pub static OPERATIONS_COLLECTION: &str = "operations";

/// The resource name of a long-running operation, e.g. `operations/{uuid}`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct OperationName(String);

// Creation goes through FromStr so every name held by the node has been validated.
impl OperationName {
    /// A fresh name in the `operations` collection.
    pub fn generate() -> Self {
        OperationName(format!("{OPERATIONS_COLLECTION}/{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this name lives under the collection `parent`. An empty parent matches everything.
    pub fn is_in(&self, parent: &str) -> bool {
        let parent = parent.trim_end_matches('/');
        parent.is_empty()
            || (self.0.starts_with(parent) && self.0.as_bytes().get(parent.len()) == Some(&b'/'))
    }
}

impl std::fmt::Display for OperationName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<OperationName> for String {
    fn from(name: OperationName) -> Self {
        name.0
    }
}

impl std::str::FromStr for OperationName {
    type Err = CommonError;

    fn from_str(name: &str) -> Result<OperationName, Self::Err> {
        if !NAME_REGEX.is_match(name) {
            return Err(CommonError::InvalidName(name.to_string()));
        }
        Ok(OperationName(name.to_string()))
    }
}
