use crate::error::ConfigError;
use itertools::Itertools;
use schema::MetricSettings;
use schema::MetricsDocument;
use std::str::FromStr;
use strum::Display;
use strum::EnumString;

/// Which end of a metric's raw values scores higher.
#[derive(EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Preference {
    /// Smaller raw values score higher, e.g. P/E.
    Low,

    /// Larger raw values score higher, e.g. ROE.
    High,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricConfig {
    /// Column of the entity table this entry applies to.
    pub name: String,
    pub preference: Preference,

    /// A weight of 0 leaves the metric out of every score table.
    pub weight: f64,

    /// Forces the score of any negative raw value to 0.
    pub penalize_negative: bool,
}

/// Validated metric configurations in the order they were written.
///
/// Both document shapes normalize to the same entries, so scoring never
/// depends on which one was loaded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricConfigs {
    entries: Vec<MetricConfig>,
}

impl MetricConfigs {
    pub fn validate(document: MetricsDocument) -> Result<Self, ConfigError> {
        let settings: Vec<(String, MetricSettings)> = match document {
            MetricsDocument::Mapping(entries) => entries,
            MetricsDocument::List(entries) => entries
                .into_iter()
                .map(|(name, preference, weight)| {
                    let settings = MetricSettings {
                        preference,
                        weight,
                        penalize_negative: false,
                    };
                    (name, settings)
                })
                .collect(),
        };
        if let Some(name) = settings.iter().map(|(name, _)| name).duplicates().next() {
            return Err(ConfigError::DuplicateMetric(name.clone()));
        }
        let entries = settings
            .into_iter()
            .map(|(name, settings)| validate_entry(name, settings))
            .collect::<Result<_, _>>()?;
        Ok(Self { entries })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::validate(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Self::validate(serde_yaml::from_str(yaml)?)
    }

    /// The screener's built-in catalog of fundamental and technical metrics.
    pub fn default_catalog() -> Result<Self, ConfigError> {
        Self::from_json(include_str!("default-metrics.json"))
    }

    /// Converts back to a document in mapping form, which carries every setting.
    pub fn to_document(&self) -> MetricsDocument {
        let entries = self
            .entries
            .iter()
            .map(|config| {
                let settings = MetricSettings {
                    preference: config.preference.to_string(),
                    weight: config.weight,
                    penalize_negative: config.penalize_negative,
                };
                (config.name.clone(), settings)
            })
            .collect();
        MetricsDocument::Mapping(entries)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricConfig> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_entry(name: String, settings: MetricSettings) -> Result<MetricConfig, ConfigError> {
    let Ok(preference) = Preference::from_str(&settings.preference) else {
        return Err(ConfigError::InvalidPreference {
            metric: name,
            value: settings.preference,
        });
    };
    if settings.weight < 0.0 {
        return Err(ConfigError::NegativeWeight {
            metric: name,
            weight: settings.weight,
        });
    }
    if !settings.weight.is_finite() {
        return Err(ConfigError::NonFiniteWeight { metric: name });
    }
    Ok(MetricConfig {
        name,
        preference,
        weight: settings.weight,
        penalize_negative: settings.penalize_negative,
    })
}
