use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use crate::predict::error::PredictError;

/// A propagatable orbit parsed from one element set.
pub struct Satellite {
    pub name: String,
    pub norad_id: u64,
    pub international_designator: Option<String>,
    pub elements: Elements,
    pub constants: Constants,
}

impl Satellite {
    pub fn epoch(&self) -> DateTime<Utc> {
        self.elements.datetime.and_utc()
    }

    /// Signed age of the elements at `now`, in days.
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        (now - self.epoch()).num_seconds() as f64 / 86_400.0
    }
}

impl std::fmt::Debug for Satellite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Satellite")
            .field("name", &self.name)
            .field("norad_id", &self.norad_id)
            .field("epoch", &self.epoch())
            .finish()
    }
}

/// Parse every element set in `content`. `source` names the file in errors.
pub fn parse_satellites(content: &str, source: &str) -> Result<Vec<Satellite>, PredictError> {
    let mut results = Vec::new();

    for (name, line1, line2) in parse_multi_tle(content) {
        let elements = Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())
            .map_err(|e| PredictError::InvalidTle {
                file: source.to_string(),
                message: e.to_string(),
            })?;

        let constants =
            Constants::from_elements(&elements).map_err(|e| PredictError::InvalidTle {
                file: source.to_string(),
                message: e.to_string(),
            })?;

        let sat_name = name.unwrap_or_else(|| format!("NORAD {}", elements.norad_id));

        results.push(Satellite {
            name: sat_name,
            norad_id: elements.norad_id,
            international_designator: elements.international_designator.clone(),
            elements,
            constants,
        });
    }

    Ok(results)
}

/// Parse multi-satellite TLE content
pub fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            // 2-line TLE (no name)
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            // 3-line TLE (with name)
            result.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}
