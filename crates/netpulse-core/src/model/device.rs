use serde::{Deserialize, Serialize};

/// A monitored network device.
///
/// List order is the backend's display order and is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub host: Option<String>,
    pub name: Option<String>,
}

impl Device {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            host: None,
            name: None,
        }
    }

    /// Label for the device bar: the friendly name when the backend has
    /// one, the id otherwise.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
