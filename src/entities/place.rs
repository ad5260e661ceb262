use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub address: String,
    pub coordinates: Coordinates,
}

impl Place {
    pub fn validate(&self, label: &str) -> Result<(), Error> {
        if self.address.trim().is_empty() {
            return Err(Error::validation(format!("{} address is required", label)));
        }

        let Coordinates { lat, lng } = self.coordinates;

        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(Error::validation(format!(
                "{} latitude must be between -90 and 90",
                label
            )));
        }

        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(Error::validation(format!(
                "{} longitude must be between -180 and 180",
                label
            )));
        }

        Ok(())
    }
}
