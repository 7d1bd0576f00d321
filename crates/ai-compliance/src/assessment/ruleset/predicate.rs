use crate::assessment::domain::InputProfile;

/// Profile fields holding vocabulary tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagField {
    AiSystemType,
    Sector,
    Role,
    DecisionType,
    DataTypes,
    DecisionImpact,
}

impl TagField {
    pub const ALL: [TagField; 6] = [
        TagField::AiSystemType,
        TagField::Sector,
        TagField::Role,
        TagField::DecisionType,
        TagField::DataTypes,
        TagField::DecisionImpact,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "ai_system_type" => Some(TagField::AiSystemType),
            "sector" => Some(TagField::Sector),
            "role" => Some(TagField::Role),
            "decision_type" => Some(TagField::DecisionType),
            "data_types" => Some(TagField::DataTypes),
            "decision_impact" => Some(TagField::DecisionImpact),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TagField::AiSystemType => "ai_system_type",
            TagField::Sector => "sector",
            TagField::Role => "role",
            TagField::DecisionType => "decision_type",
            TagField::DataTypes => "data_types",
            TagField::DecisionImpact => "decision_impact",
        }
    }

    pub fn values<'a>(&self, profile: &'a InputProfile) -> Vec<&'a str> {
        match self {
            TagField::AiSystemType => vec![profile.ai_system_type.as_str()],
            TagField::Sector => vec![profile.sector.as_str()],
            TagField::Role => vec![profile.role.as_str()],
            TagField::DecisionType => vec![profile.decision_type.as_str()],
            TagField::DataTypes => profile.data_types.iter().map(String::as_str).collect(),
            TagField::DecisionImpact => profile.decision_impact.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagField {
    HandlesPersonalData,
    AutomatedDecisions,
}

impl FlagField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "handles_personal_data" => Some(FlagField::HandlesPersonalData),
            "automated_decisions" => Some(FlagField::AutomatedDecisions),
            _ => None,
        }
    }

    fn value(&self, profile: &InputProfile) -> bool {
        match self {
            FlagField::HandlesPersonalData => profile.handles_personal_data,
            FlagField::AutomatedDecisions => profile.automated_decisions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Description,
}

impl TextField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "description" => Some(TextField::Description),
            _ => None,
        }
    }

    fn value<'a>(&self, profile: &'a InputProfile) -> &'a str {
        match self {
            TextField::Description => &profile.description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetField {
    DataTypes,
    DecisionImpact,
}

impl SetField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "data_types" => Some(SetField::DataTypes),
            "decision_impact" => Some(SetField::DecisionImpact),
            _ => None,
        }
    }

    fn is_empty(&self, profile: &InputProfile) -> bool {
        match self {
            SetField::DataTypes => profile.data_types.is_empty(),
            SetField::DecisionImpact => profile.decision_impact.is_empty(),
        }
    }
}

/// Checked predicate over an [`InputProfile`]. Tag comparisons ignore ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Always,
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
    TagIn { field: TagField, values: Vec<String> },
    Flag { field: FlagField, value: bool },
    /// Keywords are stored lowercase.
    Mentions { field: TextField, keywords: Vec<String> },
    NonEmpty { field: SetField },
}

impl Predicate {
    pub fn matches(&self, profile: &InputProfile) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::All(parts) => parts.iter().all(|part| part.matches(profile)),
            Predicate::Any(parts) => parts.iter().any(|part| part.matches(profile)),
            Predicate::Not(inner) => !inner.matches(profile),
            Predicate::TagIn { field, values } => field.values(profile).iter().any(|actual| {
                values
                    .iter()
                    .any(|expected| expected.eq_ignore_ascii_case(actual.trim()))
            }),
            Predicate::Flag { field, value } => field.value(profile) == *value,
            Predicate::Mentions { field, keywords } => {
                let text = field.value(profile).to_lowercase();
                keywords.iter().any(|keyword| text.contains(keyword.as_str()))
            }
            Predicate::NonEmpty { field } => !field.is_empty(profile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> InputProfile {
        InputProfile {
            description: "Ranks candidates for Social Scoring pilots".to_string(),
            ai_system_type: "ml".to_string(),
            sector: "HR".to_string(),
            handles_personal_data: true,
            automated_decisions: false,
            role: "deployer".to_string(),
            data_types: vec!["contact".to_string(), "biometric".to_string()],
            decision_type: "ranking".to_string(),
            decision_impact: Vec::new(),
        }
    }

    #[test]
    fn tag_in_matches_any_list_element_ignoring_case() {
        let predicate = Predicate::TagIn {
            field: TagField::DataTypes,
            values: vec!["BIOMETRIC".to_string()],
        };
        assert!(predicate.matches(&profile()));

        let sector = Predicate::TagIn {
            field: TagField::Sector,
            values: vec!["hr".to_string()],
        };
        assert!(sector.matches(&profile()));
    }

    #[test]
    fn mentions_searches_lowercased_text() {
        let predicate = Predicate::Mentions {
            field: TextField::Description,
            keywords: vec!["social scoring".to_string()],
        };
        assert!(predicate.matches(&profile()));
    }

    #[test]
    fn combinators_compose() {
        let predicate = Predicate::All(vec![
            Predicate::Flag {
                field: FlagField::HandlesPersonalData,
                value: true,
            },
            Predicate::Not(Box::new(Predicate::NonEmpty {
                field: SetField::DecisionImpact,
            })),
            Predicate::Any(vec![
                Predicate::Flag {
                    field: FlagField::AutomatedDecisions,
                    value: true,
                },
                Predicate::Always,
            ]),
        ]);
        assert!(predicate.matches(&profile()));
    }
}
