use serde::{Deserialize, Serialize};

/// The editor's form steps, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditorStep {
    #[default]
    GeneralInfo,
    PersonalInfo,
    WorkExperience,
    Education,
    Skills,
    Summary,
}

impl EditorStep {
    pub const ALL: [EditorStep; 6] = [
        EditorStep::GeneralInfo,
        EditorStep::PersonalInfo,
        EditorStep::WorkExperience,
        EditorStep::Education,
        EditorStep::Skills,
        EditorStep::Summary,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            EditorStep::GeneralInfo => "General info",
            EditorStep::PersonalInfo => "Personal info",
            EditorStep::WorkExperience => "Work experience",
            EditorStep::Education => "Education",
            EditorStep::Skills => "Skills",
            EditorStep::Summary => "Summary",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    /// `None` on the first step.
    pub fn previous(&self) -> Option<EditorStep> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// `None` on the last step.
    pub fn next(&self) -> Option<EditorStep> {
        Self::ALL.get(self.index() + 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_at_the_edges() {
        assert_eq!(EditorStep::GeneralInfo.previous(), None);
        assert_eq!(EditorStep::GeneralInfo.next(), Some(EditorStep::PersonalInfo));
        assert_eq!(EditorStep::Summary.next(), None);
        assert_eq!(EditorStep::Summary.previous(), Some(EditorStep::Skills));
    }

    #[test]
    fn test_step_keys_are_kebab_case() {
        let json = serde_json::to_string(&EditorStep::WorkExperience).unwrap();
        assert_eq!(json, "\"work-experience\"");
        let step: EditorStep = serde_json::from_str("\"personal-info\"").unwrap();
        assert_eq!(step, EditorStep::PersonalInfo);
    }
}
