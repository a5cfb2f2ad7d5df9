//! Detail summaries for experiments and selected nodes

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::domain::arena::NodeData;
use crate::domain::record::{ExperimentRecord, Record, TypeCodes};

/// Events requested for a scatter plot when the user did not pick a number.
pub const DEFAULT_PLOT_EVENTS: usize = 20_000;

/// Sample types of the BD FACS Aria sorter, which records the sort mode.
const SORTER_SAMPLE_TYPES: [&str; 2] = ["FACS_ARIA_WELL", "FACS_ARIA_TUBE"];

/// Parameter metadata of an FCS file, as returned by the record source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParameterInfo {
    pub num_parameters: usize,
    pub num_events: usize,
    pub names: Vec<String>,
    pub composite_names: Vec<String>,
}

impl ParameterInfo {
    /// `(name, display name)` pairs offered for the plot axes.
    pub fn axis_options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .zip(&self.composite_names)
            .take(self.num_parameters)
            .map(|(name, composite)| (name.as_str(), composite.as_str()))
    }

    pub fn summary(&self) -> String {
        format!(
            "This file contains {} parameters and {} events.",
            self.num_parameters, self.num_events
        )
    }
}

/// One selectable plot axis.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AxisOption {
    pub name: String,
    pub label: String,
}

/// Scatter plot request forwarded to the plotting collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlotRequest {
    pub data_set_code: String,
    pub param_x: String,
    pub param_y: String,
    pub num_events: usize,
}

impl PlotRequest {
    /// Pre-selects the first two parameters; None without any parameter.
    pub fn default_for(code: &str, info: &ParameterInfo) -> Option<Self> {
        let x = info.names.first()?;
        let y = info.names.get(1).unwrap_or(x);
        Some(Self {
            data_set_code: code.to_string(),
            param_x: x.clone(),
            param_y: y.clone(),
            num_events: DEFAULT_PLOT_EVENTS,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortType {
    Standard,
    Index,
}

impl SortType {
    pub fn label(&self) -> &'static str {
        match self {
            SortType::Standard => "Standard sort",
            SortType::Index => "Index sort",
        }
    }
}

/// What the detail pane shows for a selected node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeDetails {
    pub title: String,
    pub plate_geometry: Option<String>,
    pub sort_type: Option<SortType>,
    /// FCS dataset whose parameters can be plotted
    pub plottable: bool,
    pub parameter_summary: Option<String>,
    pub plot: Option<PlotRequest>,
    /// Parameters offered on both plot axes
    pub axis_options: Vec<AxisOption>,
}

impl NodeDetails {
    pub fn for_node(data: &NodeData, codes: &TypeCodes) -> Self {
        let mut details = NodeDetails {
            title: data.title.clone(),
            ..Default::default()
        };

        match &data.record {
            Some(Record::Sample(sample)) => {
                if sample.sample_type_code == codes.plate() {
                    details.plate_geometry = sample.properties.get(&codes.plate_geometry_key()).cloned();
                }
                if SORTER_SAMPLE_TYPES.contains(&sample.sample_type_code.as_str()) {
                    let key = format!("{}_ISINDEXSORT", sample.sample_type_code);
                    details.sort_type = Some(match sample.properties.get(&key).map(String::as_str) {
                        Some("true") => SortType::Index,
                        _ => SortType::Standard,
                    });
                }
            }
            Some(Record::DataSet(ds)) if ds.data_set_type_code == codes.fcs_file() => {
                // Older experiments carry no parameter list
                details.plottable = ds
                    .properties
                    .get(&codes.fcs_parameters_key())
                    .is_some_and(|params| !params.is_empty());
                if details.plottable {
                    if let Some(info) = &data.parameter_info {
                        details.parameter_summary = Some(info.summary());
                        details.plot = PlotRequest::default_for(&ds.code, info);
                        details.axis_options = info
                            .axis_options()
                            .map(|(name, label)| AxisOption {
                                name: name.to_string(),
                                label: label.to_string(),
                            })
                            .collect();
                    }
                }
            }
            _ => {}
        }
        details
    }
}

/// Header information for an experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperimentSummary {
    pub name: String,
    pub tags: String,
    pub description: String,
    pub acquisition: String,
    pub attachments: String,
    /// Viewer location of the experiment's attachment tab
    pub attachment_link: Option<String>,
}

impl ExperimentSummary {
    pub fn from_record(exp: &ExperimentRecord, codes: &TypeCodes) -> Self {
        let property = |field: &str| {
            exp.properties
                .get(&codes.experiment_key(field))
                .cloned()
                .unwrap_or_default()
        };

        let tags = match &exp.metaprojects {
            None => String::new(),
            Some(tags) if tags.is_empty() => "None".to_string(),
            Some(tags) => tags.iter().map(|tag| tag.name.as_str()).join(", "),
        };

        let description = match property("DESCRIPTION") {
            d if d.is_empty() => "No description provided.".to_string(),
            d => d,
        };

        let date = property("DATE");
        let day: String = date.chars().take(10).collect();
        let acquisition = format!(
            "{} on {} (acquisition by {} on {}).",
            property("ACQ_SOFTWARE"),
            property("ACQ_HARDWARE"),
            property("OWNER"),
            day
        );

        Self {
            name: property("NAME"),
            tags,
            description,
            acquisition,
            attachments: attachment_summary(exp.attachments.len()),
            attachment_link: exp.perm_id.as_deref().map(attachment_link),
        }
    }
}

pub fn attachment_summary(count: usize) -> String {
    match count {
        0 => "There are no attachments.".to_string(),
        1 => "There is one attachment.".to_string(),
        n => format!("There are {n} attachments"),
    }
}

pub fn attachment_link(perm_id: &str) -> String {
    format!("#entity=EXPERIMENT&permId={perm_id}&ui-subtab=attachment-section")
}
