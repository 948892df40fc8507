//! Parameter and machine schemas.
//!
//! A machine declares an ordered list of parameters. Every parameter kind
//! except free-text is *optimizable*: it enters the GP input space in
//! declared order, and that order stays stable for the lifetime of an
//! optimizer state.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Kind-specific configuration of one machine parameter.
///
/// Externally tagged so records containing it survive the durable store's
/// non-self-describing encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSpec {
    /// Real-valued with a fixed interval and quantization step.
    Bounded {
        /// Lower bound (inclusive).
        min: f64,
        /// Upper bound (inclusive).
        max: f64,
        /// Quantization step, > 0.
        step: f64,
        /// Optional prefill default.
        #[serde(default)]
        default: Option<f64>,
    },
    /// Real-valued with no declared range; the encoding range is derived
    /// from the pair's own history plus padding.
    Unbounded {
        /// Optional prefill default.
        #[serde(default)]
        default: Option<f64>,
    },
    /// Values drawn from a short ordered list of strings.
    Ordinal {
        /// Ordered option strings, length >= 1.
        options: Vec<String>,
        /// Optional prefill default.
        #[serde(default)]
        default: Option<String>,
    },
    /// Free-form text, opaque to the model.
    FreeText {
        /// Optional prefill default.
        #[serde(default)]
        default: Option<String>,
    },
}

impl ParamSpec {
    /// True for every kind the GP can model.
    #[must_use]
    pub const fn is_optimizable(&self) -> bool {
        !matches!(self, Self::FreeText { .. })
    }

    /// The declared default as a raw parameter value, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<ParamValue> {
        match self {
            Self::Bounded { default, .. } => default.map(ParamValue::Bounded),
            Self::Unbounded { default } => default.map(ParamValue::Unbounded),
            Self::Ordinal { default, .. } => default.clone().map(ParamValue::Ordinal),
            Self::FreeText { default } => default.clone().map(ParamValue::Text),
        }
    }
}

/// One parameter of a machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Stable identifier, unique within the machine.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Kind-specific configuration.
    pub spec: ParamSpec,
}

/// Ordered parameter declaration for one brewing machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSchema {
    /// Stable machine identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Parameters in declared order.
    pub parameters: Vec<ParameterSchema>,
}

impl MachineSchema {
    /// The optimizable subset, in declared order.
    pub fn optimizable(&self) -> impl Iterator<Item = &ParameterSchema> {
        self.parameters.iter().filter(|p| p.spec.is_optimizable())
    }

    /// Number of optimizable parameters (the GP input dimension).
    #[must_use]
    pub fn optimizable_len(&self) -> usize {
        self.optimizable().count()
    }

    /// Look up a parameter by id.
    #[must_use]
    pub fn parameter(&self, id: &str) -> Option<&ParameterSchema> {
        self.parameters.iter().find(|p| p.id == id)
    }
}

/// A raw parameter value, tagged by the kind that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    /// Bounded-continuous number.
    Bounded(f64),
    /// Unbounded-continuous number.
    Unbounded(f64),
    /// Ordinal option (a string drawn from the declared finite set).
    Ordinal(String),
    /// Free-form text, carried through without entering the model.
    Text(String),
}

impl ParamValue {
    /// Numeric payload for continuous kinds.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Bounded(v) | Self::Unbounded(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload for ordinal and free-text kinds.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Ordinal(s) | Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One historical brewing experiment as recorded by the run store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Stable run identifier.
    pub id: String,
    /// Bean the run was brewed with.
    pub bean_id: String,
    /// Machine the run was brewed on.
    pub machine_id: String,
    /// Raw value per parameter id, in entry order.
    pub values: IndexMap<String, ParamValue>,
    /// Rating in 1..=10, `None` while unrated.
    #[serde(default)]
    pub rating: Option<u8>,
}

impl RunRecord {
    /// True once the run has been rated.
    #[must_use]
    pub const fn is_rated(&self) -> bool {
        self.rating.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn espresso_machine() -> MachineSchema {
        MachineSchema {
            id: "m1".into(),
            name: "Espresso".into(),
            parameters: vec![
                ParameterSchema {
                    id: "grind".into(),
                    name: "Grind size".into(),
                    spec: ParamSpec::Bounded {
                        min: 0.0,
                        max: 10.0,
                        step: 1.0,
                        default: Some(5.0),
                    },
                },
                ParameterSchema {
                    id: "temp".into(),
                    name: "Water temperature".into(),
                    spec: ParamSpec::Unbounded { default: None },
                },
                ParameterSchema {
                    id: "basket".into(),
                    name: "Basket".into(),
                    spec: ParamSpec::Ordinal {
                        options: vec!["Single".into(), "Double".into()],
                        default: None,
                    },
                },
                ParameterSchema {
                    id: "notes".into(),
                    name: "Notes".into(),
                    spec: ParamSpec::FreeText { default: None },
                },
            ],
        }
    }

    #[test]
    fn test_optimizable_excludes_free_text() {
        let machine = espresso_machine();
        let ids: Vec<&str> = machine.optimizable().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["grind", "temp", "basket"]);
        assert_eq!(machine.optimizable_len(), 3);
    }

    #[test]
    fn test_optimizable_preserves_declared_order() {
        let mut machine = espresso_machine();
        machine.parameters.reverse();
        let ids: Vec<&str> = machine.optimizable().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["basket", "temp", "grind"]);
    }

    #[test]
    fn test_parameter_lookup() {
        let machine = espresso_machine();
        assert!(machine.parameter("temp").is_some());
        assert!(machine.parameter("pressure").is_none());
    }

    #[test]
    fn test_default_value_per_kind() {
        let machine = espresso_machine();
        assert_eq!(
            machine.parameter("grind").unwrap().spec.default_value(),
            Some(ParamValue::Bounded(5.0))
        );
        assert_eq!(machine.parameter("temp").unwrap().spec.default_value(), None);
    }

    #[test]
    fn test_param_value_accessors() {
        assert_eq!(ParamValue::Bounded(3.0).as_number(), Some(3.0));
        assert_eq!(ParamValue::Unbounded(91.5).as_number(), Some(91.5));
        assert_eq!(ParamValue::Ordinal("Fine".into()).as_number(), None);
        assert_eq!(
            ParamValue::Ordinal("Fine".into()).as_text(),
            Some("Fine")
        );
        assert_eq!(ParamValue::Text("lovely".into()).as_text(), Some("lovely"));
        assert_eq!(ParamValue::Bounded(3.0).as_text(), None);
    }

    #[test]
    fn test_run_record_rated() {
        let mut run = RunRecord {
            id: "r1".into(),
            bean_id: "b1".into(),
            machine_id: "m1".into(),
            values: IndexMap::new(),
            rating: None,
        };
        assert!(!run.is_rated());
        run.rating = Some(7);
        assert!(run.is_rated());
    }

    #[test]
    fn test_param_spec_serde_roundtrip() {
        let spec = ParamSpec::Ordinal {
            options: vec!["Fine".into(), "Coarse".into()],
            default: Some("Fine".into()),
        };
        let yaml = serde_yaml::to_string(&spec).unwrap();
        let back: ParamSpec = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_param_value_survives_bincode() {
        // The durable store uses a non-self-describing encoding; every
        // record type has to round-trip through it.
        let values = vec![
            ParamValue::Bounded(5.0),
            ParamValue::Unbounded(91.5),
            ParamValue::Ordinal("Fine".into()),
            ParamValue::Text("washed process".into()),
        ];
        let bytes = bincode::serialize(&values).unwrap();
        let back: Vec<ParamValue> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_machine_schema_serde_roundtrip() {
        let machine = espresso_machine();
        let yaml = serde_yaml::to_string(&machine).unwrap();
        let back: MachineSchema = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, machine);
    }
}
