use serde::{Deserialize, Serialize};

use crate::model::ids::{ModuleId, TutorialId};

/// A single tutorial of a learning path, as published by the catalog.
///
/// Catalog records are immutable. Progress tracking only relies on `id` and on
/// the position of the record within the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tutorial {
    pub id: TutorialId,
    pub number: u32,
    pub module_id: ModuleId,
    pub title: String,
    pub duration_seconds: u32,
    pub video_url: String,
    pub start_files_url: String,
    pub finished_files_url: String,
}

impl Tutorial {
    /// Minimal record with empty links; handy for tests and fixtures.
    #[must_use]
    pub fn titled(id: u64, number: u32, title: impl Into<String>) -> Self {
        Self {
            id: TutorialId::new(id),
            number,
            module_id: ModuleId::new(1),
            title: title.into(),
            duration_seconds: 0,
            video_url: String::new(),
            start_files_url: String::new(),
            finished_files_url: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_catalog_wire_format() {
        let json = r#"{
            "id": 12,
            "number": 3,
            "moduleId": 2,
            "title": "Ownership",
            "durationSeconds": 540,
            "videoUrl": "https://cdn.example/v/12",
            "startFilesUrl": "https://cdn.example/s/12.zip",
            "finishedFilesUrl": "https://cdn.example/f/12.zip"
        }"#;

        let tutorial: Tutorial = serde_json::from_str(json).unwrap();
        assert_eq!(tutorial.id, TutorialId::new(12));
        assert_eq!(tutorial.module_id, ModuleId::new(2));
        assert_eq!(tutorial.duration_seconds, 540);
        assert_eq!(tutorial.finished_files_url, "https://cdn.example/f/12.zip");
    }
}
