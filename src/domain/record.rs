//! Records attached to tree nodes
//!
//! The record source tags each entity with `@type`. Unknown tags are kept as
//! [`Record::Other`] so that a new server-side kind never breaks snapshot loading.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag (label) attached to an experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metaproject {
    pub name: String,
}

/// File attached to an experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentRecord {
    pub identifier: String,
    pub experiment_type_code: String,
    #[serde(default)]
    pub perm_id: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// `None` when the record source did not fetch tags at all
    #[serde(default)]
    pub metaprojects: Option<Vec<Metaproject>>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    pub identifier: String,
    pub sample_type_code: String,
    #[serde(default)]
    pub experiment_identifier_or_null: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataSetRecord {
    pub code: String,
    pub data_set_type_code: String,
    pub experiment_identifier: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Direct download location of the underlying file, if the source exposes one
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Entity attached to a tree node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "@type")]
pub enum Record {
    Experiment(ExperimentRecord),
    Sample(SampleRecord),
    DataSet(DataSetRecord),
    #[serde(other)]
    Other,
}

impl Record {
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Experiment(_) => "Experiment",
            Record::Sample(_) => "Sample",
            Record::DataSet(_) => "DataSet",
            Record::Other => "Other",
        }
    }

    pub fn as_experiment(&self) -> Option<&ExperimentRecord> {
        match self {
            Record::Experiment(exp) => Some(exp),
            _ => None,
        }
    }

    pub fn as_sample(&self) -> Option<&SampleRecord> {
        match self {
            Record::Sample(sample) => Some(sample),
            _ => None,
        }
    }

    pub fn as_data_set(&self) -> Option<&DataSetRecord> {
        match self {
            Record::DataSet(ds) => Some(ds),
            _ => None,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Experiment(exp) => write!(f, "Experiment {}", exp.identifier),
            Record::Sample(sample) => {
                write!(f, "Sample {} [{}]", sample.identifier, sample.sample_type_code)
            }
            Record::DataSet(ds) => write!(f, "DataSet {} [{}]", ds.code, ds.data_set_type_code),
            Record::Other => write!(f, "Other"),
        }
    }
}

/// Type codes and property keys derived from the deployment's experiment prefix.
///
/// The prefix differs per instrument (e.g. `LSR_FORTESSA`, `FACS_ARIA`), so none of
/// these are hard-coded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCodes {
    prefix: String,
}

impl TypeCodes {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn with_suffix(&self, suffix: &str) -> String {
        format!("{}_{}", self.prefix, suffix)
    }

    pub fn plate(&self) -> String {
        self.with_suffix("PLATE")
    }

    pub fn tubeset(&self) -> String {
        self.with_suffix("TUBESET")
    }

    pub fn all_plates(&self) -> String {
        self.with_suffix("ALL_PLATES")
    }

    pub fn fcs_file(&self) -> String {
        self.with_suffix("FCSFILE")
    }

    /// Property key (on plate samples) holding the plate geometry.
    pub fn plate_geometry_key(&self) -> String {
        self.with_suffix("PLATE_GEOMETRY")
    }

    /// Property key (on FCS datasets) holding the serialized parameter list.
    pub fn fcs_parameters_key(&self) -> String {
        self.with_suffix("FCSFILE_PARAMETERS")
    }

    /// Property key on experiments, e.g. `experiment_key("NAME")` → `P_EXPERIMENT_NAME`.
    pub fn experiment_key(&self, field: &str) -> String {
        self.with_suffix(&format!("EXPERIMENT_{field}"))
    }
}
