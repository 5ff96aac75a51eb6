use serde::{Deserialize, Serialize};

use crate::model::Question;

/// Static content of one campaign unit (a monument).
///
/// Progress flags live in `CampaignState`; this type never changes at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Name handed to the scene loader when the unit is entered.
    pub scene: String,
    pub questions: Vec<Question>,
}

impl UnitDef {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        scene: impl Into<String>,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            scene: scene.into(),
            questions,
        }
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question(&self, cursor: usize) -> Option<&Question> {
        self.questions.get(cursor)
    }
}
