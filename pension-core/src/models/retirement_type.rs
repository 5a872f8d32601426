use std::fmt;

use serde::{Deserialize, Serialize};

/// The retirement modality being simulated.
///
/// The serialized values are part of the wire contract shared with the
/// front end and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetirementType {
    #[serde(rename = "ordinaria")]
    Ordinary,
    #[serde(rename = "anticipada_involuntaria")]
    InvoluntaryEarly,
    #[serde(rename = "anticipada_voluntaria")]
    VoluntaryEarly,
    #[serde(rename = "parcial")]
    Partial,
    #[serde(rename = "demorada")]
    Deferred,
}

impl RetirementType {
    /// All modalities, in the order they are presented to users.
    pub const ALL: [RetirementType; 5] = [
        Self::Ordinary,
        Self::VoluntaryEarly,
        Self::InvoluntaryEarly,
        Self::Partial,
        Self::Deferred,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ordinary => "ordinaria",
            Self::InvoluntaryEarly => "anticipada_involuntaria",
            Self::VoluntaryEarly => "anticipada_voluntaria",
            Self::Partial => "parcial",
            Self::Deferred => "demorada",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ordinaria" => Some(Self::Ordinary),
            "anticipada_involuntaria" => Some(Self::InvoluntaryEarly),
            "anticipada_voluntaria" => Some(Self::VoluntaryEarly),
            "parcial" => Some(Self::Partial),
            "demorada" => Some(Self::Deferred),
            _ => None,
        }
    }

    /// Human readable name, e.g. "Jubilación Ordinaria".
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ordinary => "Jubilación Ordinaria",
            Self::InvoluntaryEarly => "Jubilación Anticipada Involuntaria",
            Self::VoluntaryEarly => "Jubilación Anticipada Voluntaria",
            Self::Partial => "Jubilación Parcial",
            Self::Deferred => "Jubilación Demorada",
        }
    }

    pub fn is_early(&self) -> bool {
        matches!(self, Self::VoluntaryEarly | Self::InvoluntaryEarly)
    }
}

impl fmt::Display for RetirementType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "Masculino",
            Self::Female => "Femenino",
        }
    }
}

/// How the bonus for deferring retirement is received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncrementOption {
    /// Recurring percentage increase of the monthly pension.
    #[serde(rename = "porcentual")]
    Percentage,
    /// One-time payment; the monthly pension is not increased.
    #[serde(rename = "tanto_alzado")]
    LumpSum,
    /// Part percentage increase, part one-time payment.
    #[serde(rename = "mixto")]
    Mixed,
}

impl IncrementOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "porcentual",
            Self::LumpSum => "tanto_alzado",
            Self::Mixed => "mixto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "porcentual" => Some(Self::Percentage),
            "tanto_alzado" => Some(Self::LumpSum),
            "mixto" => Some(Self::Mixed),
            _ => None,
        }
    }
}
