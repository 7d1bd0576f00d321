use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

use super::domain::{default_decision_type, default_role, InputProfile};

#[derive(Debug)]
pub enum ProfileImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ProfileImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileImportError::Io(err) => write!(f, "failed to read profile export: {}", err),
            ProfileImportError::Csv(err) => write!(f, "invalid profile CSV data: {}", err),
        }
    }
}

impl std::error::Error for ProfileImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProfileImportError::Io(err) => Some(err),
            ProfileImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ProfileImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ProfileImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// A named profile read from one CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedProfile {
    pub system_name: String,
    pub profile: InputProfile,
}

/// Reads system profiles from a CSV export, one system per row. List
/// columns are `;` separated.
pub struct ProfileCsvImporter;

impl ProfileCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ImportedProfile>, ProfileImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ImportedProfile>, ProfileImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut profiles = Vec::new();

        for record in csv_reader.deserialize::<ProfileRow>() {
            profiles.push(record?.into_profile());
        }

        Ok(profiles)
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    system_name: String,
    #[serde(default)]
    description: String,
    ai_system_type: String,
    sector: String,
    #[serde(deserialize_with = "flexible_bool")]
    handles_personal_data: bool,
    #[serde(deserialize_with = "flexible_bool")]
    automated_decisions: bool,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    role: Option<String>,
    #[serde(default)]
    data_types: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    decision_type: Option<String>,
    #[serde(default)]
    decision_impact: String,
}

impl ProfileRow {
    fn into_profile(self) -> ImportedProfile {
        ImportedProfile {
            system_name: self.system_name,
            profile: InputProfile {
                description: self.description,
                ai_system_type: self.ai_system_type,
                sector: self.sector,
                handles_personal_data: self.handles_personal_data,
                automated_decisions: self.automated_decisions,
                role: self.role.unwrap_or_else(default_role),
                data_types: split_list(&self.data_types),
                decision_type: self.decision_type.unwrap_or_else(default_decision_type),
                decision_impact: split_list(&self.decision_impact),
            },
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected a yes/no value, found '{other}'"
        ))),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
