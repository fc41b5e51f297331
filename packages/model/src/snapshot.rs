use crate::context::ProjectContext;
use crate::ids::{PageId, PatternId, ProjectId};
use crate::page::PageSnapshot;
use crate::pattern::Pattern;
use serde::{Deserialize, Serialize};

/// Inert, serialized representation of a whole project
///
/// Clipboard payloads may carry one of these so that pasted content can
/// resolve its references against the project it was copied from, even if
/// that project is no longer open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub pages: Vec<PageSnapshot>,
    #[serde(default)]
    pub patterns: Vec<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_page: Option<PageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_seed: Option<String>,
    #[serde(default)]
    pub id_count: u32,
}

impl ProjectSnapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ProjectContext for ProjectSnapshot {
    fn pattern(&self, id: &PatternId) -> Option<&Pattern> {
        self.patterns.iter().find(|p| &p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ElementId;
    use crate::project::Project;

    #[test]
    fn test_project_survives_snapshot() {
        let mut project = Project::new("Site");
        let home = project.create_page("Home");
        let root = project.page_by_id(&home).unwrap().root.clone();
        project.create_element(&root, "Header", true).unwrap();
        project.create_page("About");

        let json = project.to_snapshot().to_json().unwrap();
        let restored = Project::from_snapshot(&ProjectSnapshot::from_json(&json).unwrap()).unwrap();

        assert_eq!(restored.pages(), project.pages());
        assert_eq!(restored.element_count(), project.element_count());
        assert_eq!(restored.active_page().map(|p| &p.id), Some(&home));
        assert_eq!(restored.id_generator(), project.id_generator());
    }

    #[test]
    fn test_minimal_snapshot_reserves_existing_ids() {
        let seed = crate::ids::seed_for("Imported");
        let json = format!(
            r#"{{
                "id": "p",
                "name": "Imported",
                "pages": [
                    {{ "id": "{seed}-4", "name": "Home", "root": {{ "id": "{seed}-9", "name": "Root", "acceptsChildren": true }} }}
                ]
            }}"#
        );

        let snapshot = ProjectSnapshot::from_json(&json).unwrap();
        let mut project = Project::from_snapshot(&snapshot).unwrap();
        let next = project.id_generator_mut().next_element_id();

        assert_eq!(next, ElementId::new(format!("{seed}-10")));
    }
}
