use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::election::CandidateId;

/// An election specification, as submitted by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSpec {
    /// Election name.
    pub name: String,
    /// Candidates, in ballot order.
    pub candidates: Vec<CandidateId>,
    /// Whether the election accepts votes.
    #[serde(default = "active_by_default")]
    pub active: bool,
    /// Seconds after creation at which the election closes, if ever.
    #[serde(default)]
    pub duration: Option<u32>,
}

fn active_by_default() -> bool {
    true
}

impl ElectionSpec {
    /// Check the spec describes an election we can run.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("Election name is required"));
        }
        if self.candidates.is_empty() {
            return Err(Error::invalid_input("At least one candidate is required"));
        }
        if self.candidates.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::invalid_input("Candidate names cannot be empty"));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = self.candidates.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(Error::invalid_input(format!(
                "Duplicate candidate '{duplicate}'"
            )));
        }
        Ok(())
    }

    /// The election every fresh deployment starts with.
    pub fn demo() -> Self {
        Self {
            name: "Bangladesh General Election 2025".to_string(),
            candidates: vec![
                "National Citizen Party".to_string(),
                "Bangladesh Nationalist Party".to_string(),
                "Bangladesh Jamate Islam".to_string(),
                "Jatiya Party".to_string(),
                "Independent Candidates".to_string(),
            ],
            active: true,
            duration: None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_specs() {
        ElectionSpec::example().validate().unwrap();
        ElectionSpec::demo().validate().unwrap();

        let single = ElectionSpec {
            candidates: vec!["Unopposed".to_string()],
            ..ElectionSpec::example()
        };
        single.validate().unwrap();
    }

    #[test]
    fn invalid_specs() {
        let no_candidates = ElectionSpec {
            candidates: vec![],
            ..ElectionSpec::example()
        };
        assert!(matches!(
            no_candidates.validate(),
            Err(Error::InvalidInput(_))
        ));

        let duplicates = ElectionSpec {
            candidates: vec!["Alice".to_string(), "Bob".to_string(), "Alice".to_string()],
            ..ElectionSpec::example()
        };
        assert_eq!(
            duplicates.validate(),
            Err(Error::InvalidInput("Duplicate candidate 'Alice'".to_string()))
        );

        let blank_candidate = ElectionSpec {
            candidates: vec!["Alice".to_string(), "  ".to_string()],
            ..ElectionSpec::example()
        };
        assert!(matches!(
            blank_candidate.validate(),
            Err(Error::InvalidInput(_))
        ));

        let no_name = ElectionSpec {
            name: String::new(),
            ..ElectionSpec::example()
        };
        assert!(matches!(no_name.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn defaults_when_deserialising() {
        let spec: ElectionSpec =
            serde_json::from_str(r#"{"name": "Referendum", "candidates": ["Yes", "No"]}"#)
                .unwrap();
        assert!(spec.active);
        assert_eq!(spec.duration, None);
    }
}
