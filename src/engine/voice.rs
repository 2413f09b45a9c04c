//! Voice metadata reported by speech engines

use serde::{Deserialize, Serialize};

/// One selectable voice.
///
/// Descriptors are snapshots of the engine's inventory at query time. The
/// `id` is an opaque engine-scoped identifier and `language` is the tag the
/// engine reports, usually BCP 47 shaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    pub id: String,
    pub name: String,
    pub language: String,
}

impl VoiceDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: language.into(),
        }
    }

    /// Display label in the "Name (language)" form voice menus use.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_format() {
        let voice = VoiceDescriptor::new("v1", "Alex", "en-US");
        assert_eq!(voice.label(), "Alex (en-US)");
    }
}
