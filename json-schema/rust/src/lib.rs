use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::MapAccess;
use serde::de::SeqAccess;
use serde::de::Visitor;
use serde::ser::SerializeMap;
use serde::ser::SerializeSeq;
use std::fmt::Formatter;

/// Scoring settings of one metric as written in a configuration document.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct MetricSettings {
    /// Either `low` or `high`, checked when the document is validated.
    pub preference: String,
    pub weight: f64,
    #[serde(default)]
    pub penalize_negative: bool,
}

/// A metric configuration in either of its accepted shapes.
///
/// Both shapes keep the order in which metrics are written.
#[derive(Debug, PartialEq, Clone)]
pub enum MetricsDocument {
    /// `{"P/E": {"preference": "low", "weight": 0.8, "penalize_negative": true}}`
    Mapping(Vec<(String, MetricSettings)>),

    /// `[["P/E", "low", 0.8]]`
    List(Vec<(String, String, f64)>),
}

impl<'de> Deserialize<'de> for MetricsDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MetricsDocumentVisitor)
    }
}

impl Serialize for MetricsDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (name, settings) in entries {
                    map.serialize_entry(name, settings)?;
                }
                map.end()
            }
            Self::List(entries) => {
                let mut seq = serializer.serialize_seq(Some(entries.len()))?;
                for entry in entries {
                    seq.serialize_element(entry)?;
                }
                seq.end()
            }
        }
    }
}

struct MetricsDocumentVisitor;

impl<'de> Visitor<'de> for MetricsDocumentVisitor {
    type Value = MetricsDocument;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a map of metric settings or a list of [name, preference, weight]")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or_default());
        while let Some(entry) = map.next_entry::<String, MetricSettings>()? {
            entries.push(entry);
        }
        Ok(MetricsDocument::Mapping(entries))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or_default());
        while let Some(entry) = seq.next_element::<(String, String, f64)>()? {
            entries.push(entry);
        }
        Ok(MetricsDocument::List(entries))
    }
}
