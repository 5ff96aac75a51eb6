use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{CampaignRules, Question, QuestionError, UnitDef};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog must contain at least one unit")]
    Empty,

    #[error("unit {index} has an empty name")]
    EmptyUnitName { index: usize },

    #[error("unit {index} has an empty scene name")]
    EmptySceneName { index: usize },

    #[error("invalid question in unit {unit}: {source}")]
    Question {
        unit: usize,
        #[source]
        source: QuestionError,
    },
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Ordered list of units making up a campaign.
///
/// Unit 0 is the entry point; unlocking always proceeds to the unit that
/// immediately follows the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    units: Vec<UnitDef>,
}

/// On-disk shape of a catalog file: units plus optional rule overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogFile {
    pub units: Vec<UnitDef>,
    #[serde(default)]
    pub rules: Option<CampaignRules>,
}

impl Catalog {
    /// Creates a catalog from unit definitions.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if there are no units or a unit is unnamed.
    pub fn new(units: Vec<UnitDef>) -> Result<Self, CatalogError> {
        if units.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (index, unit) in units.iter().enumerate() {
            if unit.name.trim().is_empty() {
                return Err(CatalogError::EmptyUnitName { index });
            }
            if unit.scene.trim().is_empty() {
                return Err(CatalogError::EmptySceneName { index });
            }
        }
        Ok(Self { units })
    }

    /// Builds a catalog from a deserialized file, returning any rule override alongside.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the units fail structural validation.
    pub fn from_file(file: CatalogFile) -> Result<(Self, Option<CampaignRules>), CatalogError> {
        let catalog = Self::new(file.units)?;
        Ok((catalog, file.rules))
    }

    #[must_use]
    pub fn units(&self) -> &[UnitDef] {
        &self.units
    }

    #[must_use]
    pub fn unit(&self, index: usize) -> Option<&UnitDef> {
        self.units.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The built-in campaign: five monuments of Thessaloniki, four questions each.
///
/// Each unit holds at least as many questions as the default unlock
/// threshold, so finishing a unit always opens the next one.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Question` if a built-in question fails validation.
    pub fn thessaloniki() -> Result<Self, CatalogError> {
        let monuments: [(&str, &str, &str, [(&str, [&str; 4], usize); 4]); 5] = [
            (
                "White Tower",
                "The symbol of Thessaloniki",
                "WhiteTower",
                [
                    (
                        "When was the White Tower of Thessaloniki built?",
                        ["15th century", "16th century", "17th century", "18th century"],
                        0,
                    ),
                    (
                        "What was the White Tower originally called?",
                        ["Tower of Kalamaria", "Red Tower", "Tower of Blood", "Byzantine Tower"],
                        2,
                    ),
                    (
                        "Which empire built the White Tower?",
                        ["Byzantine", "Ottoman", "Venetian", "Roman"],
                        1,
                    ),
                    (
                        "Roughly how tall is the White Tower?",
                        ["24 metres", "34 metres", "44 metres", "54 metres"],
                        1,
                    ),
                ],
            ),
            (
                "Arch of Galerius",
                "Also known as Kamara",
                "ArchOfGalerius",
                [
                    (
                        "Who commissioned the Arch of Galerius?",
                        [
                            "Emperor Constantine",
                            "Emperor Galerius",
                            "Emperor Justinian",
                            "Emperor Diocletian",
                        ],
                        1,
                    ),
                    (
                        "What victory does the arch commemorate?",
                        [
                            "Victory over Goths",
                            "Victory over Persians",
                            "Victory over Bulgars",
                            "Victory over Arabs",
                        ],
                        1,
                    ),
                    (
                        "Around which year was the arch completed?",
                        ["100 AD", "200 AD", "300 AD", "400 AD"],
                        2,
                    ),
                    (
                        "What are the arch's relief panels carved from?",
                        ["Marble", "Granite", "Bronze", "Limestone"],
                        0,
                    ),
                ],
            ),
            (
                "Rotunda",
                "Ancient Roman monument",
                "Rotunda",
                [
                    (
                        "What was the Rotunda originally built as?",
                        ["A church", "A mausoleum", "A palace", "A library"],
                        1,
                    ),
                    (
                        "The Rotunda was later converted into what?",
                        ["A mosque", "A museum", "A library", "A palace"],
                        0,
                    ),
                    (
                        "Which emperor built the Rotunda?",
                        ["Galerius", "Constantine", "Theodosius", "Hadrian"],
                        0,
                    ),
                    (
                        "What decorates the inside of the Rotunda's dome?",
                        ["Frescoes", "Mosaics", "Stained glass", "Carved wood"],
                        1,
                    ),
                ],
            ),
            (
                "Church of Saint Demetrios",
                "Patron saint of the city",
                "ChurchOfSaintDemetrios",
                [
                    (
                        "Saint Demetrios is the patron saint of which city?",
                        ["Athens", "Constantinople", "Thessaloniki", "Patras"],
                        2,
                    ),
                    (
                        "What type of building was Saint Demetrios martyred in?",
                        ["A church", "A prison", "A bathhouse", "A palace"],
                        2,
                    ),
                    (
                        "In which century was the first large basilica built?",
                        ["3rd century", "5th century", "9th century", "12th century"],
                        1,
                    ),
                    (
                        "What destroyed much of the church in 1917?",
                        ["An earthquake", "A great fire", "A flood", "A siege"],
                        1,
                    ),
                ],
            ),
            (
                "Eptapyrgio",
                "Byzantine fortress walls",
                "Eptapyrgio",
                [
                    (
                        "How many towers does Eptapyrgio traditionally have?",
                        ["Five", "Six", "Seven", "Eight"],
                        2,
                    ),
                    (
                        "What was Eptapyrgio used for in the Ottoman period?",
                        ["A palace", "A prison", "A mosque", "A market"],
                        1,
                    ),
                    (
                        "Where in the city does Eptapyrgio stand?",
                        ["By the harbour", "In the Upper Town", "On the seafront", "Outside the walls"],
                        1,
                    ),
                    (
                        "In which decade did its prison finally close?",
                        ["1920s", "1950s", "1980s", "2000s"],
                        2,
                    ),
                ],
            ),
        ];

        let mut units = Vec::with_capacity(monuments.len());
        for (unit_index, (name, description, scene, questions)) in monuments.into_iter().enumerate() {
            let questions = questions
                .into_iter()
                .map(|(prompt, answers, correct)| {
                    Question::new(
                        prompt,
                        answers.iter().map(|a| (*a).to_string()).collect(),
                        correct,
                    )
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| CatalogError::Question {
                    unit: unit_index,
                    source,
                })?;
            units.push(UnitDef::new(name, description, scene, questions));
        }
        Self::new(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_five_units() {
        let catalog = Catalog::thessaloniki().unwrap();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.unit(0).unwrap().name, "White Tower");
        let threshold = CampaignRules::default().answers_needed_to_unlock() as usize;
        assert!(catalog.units().iter().all(|u| u.question_count() >= threshold));
        assert!(catalog.unit(5).is_none());
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert_eq!(Catalog::new(Vec::new()).unwrap_err(), CatalogError::Empty);
    }

    #[test]
    fn parses_catalog_file_with_rules() {
        let raw = r#"{
            "units": [
                {
                    "name": "Unit A",
                    "scene": "SceneA",
                    "questions": [
                        { "prompt": "1+1?", "answers": ["1", "2"], "correct_answer_index": 1 }
                    ]
                }
            ],
            "rules": {
                "points_per_correct": 3,
                "points_lost_per_wrong": 1,
                "answers_needed_to_unlock": 2
            }
        }"#;
        let file: CatalogFile = serde_json::from_str(raw).unwrap();
        let (catalog, rules) = Catalog::from_file(file).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.unit(0).unwrap().description, "");
        assert_eq!(rules.unwrap().answers_needed_to_unlock(), 2);
    }
}
