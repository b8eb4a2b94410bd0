//! Lookup tables from network node names to actuator and sensor roles.
//!
//! The driving network announces its input (sensor) and output (actuator)
//! node names once per session. Both lists are parsed here into typed tags so
//! a tick never has to scan strings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

use crate::creature::{LegId, Side};

/// Effect of an output node on the creature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Actuator {
    /// `STxN`: stance force pushing the body forward.
    Backward(LegId),
    /// `SWxN`: swing force.
    Forward(LegId),
    /// `LExN`: lateral force, front and middle legs only.
    Lateral(LegId),
    /// `FOOTxN`: foot planted while the value is positive.
    Foot(LegId),
    /// `MO`: mouth open while the value exceeds one half.
    Mouth,
}

impl Actuator {
    /// Parses an output node name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        if name == "MO" || name == "FOMC" {
            return Some(Self::Mouth);
        }
        if let Some(code) = name.strip_prefix("FOOT") {
            return LegId::from_code(code).map(Self::Foot);
        }
        let (prefix, code) = split_leg_suffix(name)?;
        let leg = LegId::from_code(code)?;
        match prefix {
            "ST" => Some(Self::Backward(leg)),
            "SW" => Some(Self::Forward(leg)),
            "LE" if leg.segment() < 3 => Some(Self::Lateral(leg)),
            _ => None,
        }
    }
}

/// Category of an input node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SensorKind {
    /// `FASxN`
    LegForwardLimit(LegId),
    /// `BASxN`
    LegBackwardLimit(LegId),
    /// `ATSL`/`ATSR`
    AntennaContact(Side),
    /// `ACSL`/`ACSR`
    AntennaOdor(Side),
    /// `MCS`
    MouthOdor,
    /// `ES`
    Energy,
    /// `MTS`
    MouthContact,
    /// Anything else; always reads zero.
    Unmapped,
}

impl SensorKind {
    /// Parses an input node name, falling back to [`SensorKind::Unmapped`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "MCS" => return Self::MouthOdor,
            "ES" => return Self::Energy,
            "MTS" => return Self::MouthContact,
            _ => {}
        }
        if let Some((prefix, code)) = split_leg_suffix(name)
            && let Some(leg) = LegId::from_code(code)
        {
            match prefix {
                "FAS" => return Self::LegForwardLimit(leg),
                "BAS" => return Self::LegBackwardLimit(leg),
                _ => {}
            }
        }
        let mut chars = name.chars();
        if let Some(side) = chars.next_back().and_then(Side::from_letter) {
            match chars.as_str() {
                "ATS" => return Self::AntennaContact(side),
                "ACS" => return Self::AntennaOdor(side),
                _ => {}
            }
        }
        Self::Unmapped
    }
}

fn split_leg_suffix(name: &str) -> Option<(&str, &str)> {
    let split = name.len().checked_sub(2)?;
    if !name.is_char_boundary(split) {
        return None;
    }
    Some(name.split_at(split))
}

/// Name tables negotiated at session init.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IoMap {
    inputs: Vec<(String, SensorKind)>,
    outputs: HashMap<String, Option<Actuator>>,
}

impl IoMap {
    /// Builds the tables from the declared input and output node names.
    pub fn new<I, O>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        let inputs = inputs
            .into_iter()
            .map(Into::into)
            .map(|name: String| {
                let kind = SensorKind::parse(&name);
                if kind == SensorKind::Unmapped {
                    trace!(%name, "input node has no sensor role");
                }
                (name, kind)
            })
            .collect();
        let outputs = outputs
            .into_iter()
            .map(Into::into)
            .map(|name: String| {
                let actuator = Actuator::parse(&name);
                if actuator.is_none() {
                    trace!(%name, "output node has no actuator role");
                }
                (name, actuator)
            })
            .collect();
        Self { inputs, outputs }
    }

    /// Whether `name` was declared as an output node.
    #[must_use]
    pub fn is_output(&self, name: &str) -> bool {
        self.outputs.contains_key(name)
    }

    /// Actuator role of a declared output node.
    #[must_use]
    pub fn actuator(&self, name: &str) -> Option<Actuator> {
        self.outputs.get(name).copied().flatten()
    }

    /// Declared input nodes in announcement order.
    pub fn inputs(&self) -> impl Iterator<Item = (&str, SensorKind)> {
        self.inputs.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    #[must_use]
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    #[must_use]
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actuator_names_parse() {
        assert_eq!(Actuator::parse("STL1"), Some(Actuator::Backward(LegId::L1)));
        assert_eq!(Actuator::parse("SWR3"), Some(Actuator::Forward(LegId::R3)));
        assert_eq!(Actuator::parse("LER2"), Some(Actuator::Lateral(LegId::R2)));
        assert_eq!(Actuator::parse("FOOTL2"), Some(Actuator::Foot(LegId::L2)));
        assert_eq!(Actuator::parse("MO"), Some(Actuator::Mouth));
        assert_eq!(Actuator::parse("FOMC"), Some(Actuator::Mouth));
    }

    #[test]
    fn unknown_actuators_miss() {
        assert_eq!(Actuator::parse("LEL3"), None);
        assert_eq!(Actuator::parse("STX1"), None);
        assert_eq!(Actuator::parse("FOOT"), None);
        assert_eq!(Actuator::parse("L"), None);
        assert_eq!(Actuator::parse(""), None);
        assert_eq!(Actuator::parse("LCS"), None);
    }

    #[test]
    fn sensor_names_parse() {
        assert_eq!(SensorKind::parse("FASL1"), SensorKind::LegForwardLimit(LegId::L1));
        assert_eq!(SensorKind::parse("BASR2"), SensorKind::LegBackwardLimit(LegId::R2));
        assert_eq!(SensorKind::parse("ATSR"), SensorKind::AntennaContact(Side::Right));
        assert_eq!(SensorKind::parse("ACSL"), SensorKind::AntennaOdor(Side::Left));
        assert_eq!(SensorKind::parse("MCS"), SensorKind::MouthOdor);
        assert_eq!(SensorKind::parse("ES"), SensorKind::Energy);
        assert_eq!(SensorKind::parse("MTS"), SensorKind::MouthContact);
        assert_eq!(SensorKind::parse("LCS"), SensorKind::Unmapped);
        assert_eq!(SensorKind::parse("é"), SensorKind::Unmapped);
    }

    #[test]
    fn io_map_distinguishes_declared_outputs() {
        let map = IoMap::new(["FASL1", "ES"], ["STL1", "BOGUS"]);
        assert!(map.is_output("STL1"));
        assert!(map.is_output("BOGUS"));
        assert!(!map.is_output("ES"));
        assert_eq!(map.actuator("STL1"), Some(Actuator::Backward(LegId::L1)));
        assert_eq!(map.actuator("BOGUS"), None);
        let inputs: Vec<_> = map.inputs().collect();
        assert_eq!(
            inputs,
            vec![
                ("FASL1", SensorKind::LegForwardLimit(LegId::L1)),
                ("ES", SensorKind::Energy)
            ]
        );
    }
}
