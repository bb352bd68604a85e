//! Local diagnosis code mapping table.
//!
//! Each entry maps a local NAMASTE code to two parallel ICD-11 codes (TM2 and MMS).
//! The table is static reference data: looked up, never mutated.
//!
//! Responsibilities:
//! - Provide the built-in table
//! - Case-insensitive substring search over name, local code and description
//! - Load replacement tables from YAML with strict schema checking

use crate::{IntakeError, IntakeResult};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

// ============================================================================
// Public domain-level types
// ============================================================================

/// A code in an external classification, with its display name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassificationCode {
    pub name: String,
    pub code: String,
}

impl ClassificationCode {
    fn new(name: &str, code: &str) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
        }
    }
}

/// One row of the mapping table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosisEntry {
    /// Local (NAMASTE) code; unique within a table.
    pub local_code: String,

    /// Human-readable name.
    pub name: String,

    pub description: String,

    /// Optional tradition tag, e.g. `ayurveda` or `modern`.
    pub category: Option<String>,

    /// ICD-11 Traditional Medicine chapter 2 code. Used in generated Conditions.
    pub icd11_tm2: ClassificationCode,

    /// ICD-11 Mortality and Morbidity Statistics code.
    pub icd11_mms: ClassificationCode,
}

impl DiagnosisEntry {
    fn matches(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self.local_code.to_lowercase().contains(needle_lower)
            || self.description.to_lowercase().contains(needle_lower)
    }
}

/// The code mapping table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeMappingTable {
    entries: Vec<DiagnosisEntry>,
}

impl CodeMappingTable {
    /// The built-in table.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                DiagnosisEntry {
                    local_code: "AYU-001".into(),
                    name: "Vata Dosha Imbalance".into(),
                    description:
                        "Imbalance of Vata dosha causing movement and nervous system disorders"
                            .into(),
                    category: Some("ayurveda".into()),
                    icd11_tm2: ClassificationCode::new("Traditional medicine disorders", "XM1A50"),
                    icd11_mms: ClassificationCode::new("Traditional medicine conditions", "XM1A"),
                },
                DiagnosisEntry {
                    local_code: "NAM-002".into(),
                    name: "Diabetes Mellitus Type 2".into(),
                    description: "Non-insulin dependent diabetes mellitus".into(),
                    category: Some("modern".into()),
                    icd11_tm2: ClassificationCode::new("Type 2 diabetes mellitus", "5A11"),
                    icd11_mms: ClassificationCode::new("Diabetes mellitus", "5A1"),
                },
                DiagnosisEntry {
                    local_code: "NAM-003".into(),
                    name: "Essential Hypertension".into(),
                    description: "Primary high blood pressure without identifiable cause".into(),
                    category: Some("modern".into()),
                    icd11_tm2: ClassificationCode::new("Essential hypertension", "BA00"),
                    icd11_mms: ClassificationCode::new("Hypertensive diseases", "11BB"),
                },
            ],
        }
    }

    /// Build a table from explicit entries.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidTerminology`] if two entries share a local code.
    pub fn with_entries(entries: Vec<DiagnosisEntry>) -> IntakeResult<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.local_code.as_str()) {
                return Err(IntakeError::InvalidTerminology(format!(
                    "duplicate local code '{}'",
                    entry.local_code
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Entries whose name, local code or description contains `query`, case-insensitively.
    ///
    /// Results keep table order. No minimum length is applied here; callers that drive
    /// suggestions must enforce their own threshold.
    pub fn lookup(&self, query: &str) -> Vec<&DiagnosisEntry> {
        let needle = query.to_lowercase();
        self.entries.iter().filter(|e| e.matches(&needle)).collect()
    }

    /// Exact lookup by local code.
    pub fn get(&self, local_code: &str) -> Option<&DiagnosisEntry> {
        self.entries.iter().find(|e| e.local_code == local_code)
    }

    pub fn entries(&self) -> &[DiagnosisEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a table from YAML text.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort path (e.g.
    /// `entries[1].icd11_tm2.code`) to the failing field.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidTerminology`] if:
    /// - the YAML does not match the table schema or contains unknown keys,
    /// - any code or name is blank,
    /// - two entries share a local code.
    pub fn from_yaml(yaml_text: &str) -> IntakeResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = match serde_path_to_error::deserialize::<_, TableWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(IntakeError::InvalidTerminology(format!(
                    "schema mismatch at {path}: {source}"
                )));
            }
        };

        let entries = wire
            .entries
            .into_iter()
            .enumerate()
            .map(|(i, e)| wire_to_entry(i, e))
            .collect::<IntakeResult<Vec<_>>>()?;

        Self::with_entries(entries)
    }

    /// Read and parse a YAML table from disk.
    pub fn from_yaml_file(path: &Path) -> IntakeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(IntakeError::FileRead)?;
        Self::from_yaml(&text)
    }
}

impl Default for CodeMappingTable {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableWire {
    entries: Vec<EntryWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntryWire {
    local_code: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: Option<String>,
    icd11_tm2: CodeWire,
    icd11_mms: CodeWire,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CodeWire {
    name: String,
    code: String,
}

fn require(index: usize, field: &str, value: String) -> IntakeResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IntakeError::InvalidTerminology(format!(
            "entries[{index}].{field} cannot be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn wire_to_entry(index: usize, wire: EntryWire) -> IntakeResult<DiagnosisEntry> {
    Ok(DiagnosisEntry {
        local_code: require(index, "local_code", wire.local_code)?,
        name: require(index, "name", wire.name)?,
        description: wire.description.trim().to_string(),
        category: wire
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        icd11_tm2: ClassificationCode {
            name: require(index, "icd11_tm2.name", wire.icd11_tm2.name)?,
            code: require(index, "icd11_tm2.code", wire.icd11_tm2.code)?,
        },
        icd11_mms: ClassificationCode {
            name: require(index, "icd11_mms.name", wire.icd11_mms.name)?,
            code: require(index, "icd11_mms.code", wire.icd11_mms.code)?,
        },
    })
}
