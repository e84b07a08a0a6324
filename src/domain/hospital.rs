use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::geo::LatLon;

/// Clinical-urgency class of a location. Drives the priority weight, the
/// soft arrival bounds and the drop penalties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    /// Production depot. Exactly one per hospital set, always node 0.
    Source,
    /// Metro hospital: highest volume, lowest urgency.
    Metro,
    Regional,
    /// Remote hospital: highest urgency.
    Remote,
}

impl Tier {
    /// Weight used in the arc-cost denominator. Higher urgency maps to a
    /// lower weight, which makes arcs toward it cost more per minute.
    pub fn priority_weight(self) -> f64 {
        match self {
            Tier::Remote => 1.0,
            Tier::Regional => 2.0,
            Tier::Metro => 3.0,
            Tier::Source => 0.0,
        }
    }

    pub fn is_depot(self) -> bool {
        self == Tier::Source
    }
}

impl TryFrom<u8> for Tier {
    type Error = DispatchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Tier::Source),
            1 => Ok(Tier::Metro),
            2 => Ok(Tier::Regional),
            3 => Ok(Tier::Remote),
            other => Err(DispatchError::InvalidTier(other)),
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        match tier {
            Tier::Source => 0,
            Tier::Metro => 1,
            Tier::Regional => 2,
            Tier::Remote => 3,
        }
    }
}

/// One node of the dispatch problem, as loaded from the hospital file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub tier: Tier,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Hospital {
    pub fn position(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

/// Loads the hospital list from a JSON array and validates the depot
/// invariant: exactly one tier-0 entry, sitting at index 0.
pub fn load_hospitals(path: impl AsRef<Path>) -> Result<Vec<Hospital>, DispatchError> {
    let raw = fs::read_to_string(path)?;
    let hospitals: Vec<Hospital> = serde_json::from_str(&raw)?;
    validate_hospitals(&hospitals)?;
    Ok(hospitals)
}

pub fn validate_hospitals(hospitals: &[Hospital]) -> Result<(), DispatchError> {
    if hospitals.is_empty() {
        return Err(DispatchError::EmptyHospitalList);
    }
    let depots = hospitals.iter().filter(|h| h.tier.is_depot()).count();
    if depots != 1 {
        return Err(DispatchError::DepotCount(depots));
    }
    if !hospitals[0].tier.is_depot() {
        let at = hospitals
            .iter()
            .position(|h| h.tier.is_depot())
            .unwrap_or(0);
        return Err(DispatchError::DepotNotFirst(at));
    }
    Ok(())
}
