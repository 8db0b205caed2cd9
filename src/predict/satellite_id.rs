use std::fmt;
use std::str::FromStr;

use crate::predict::error::PredictError;

/// How CelesTrak is asked for an element set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum QueryKind {
    #[strum(serialize = "CATNR")]
    CatalogNumber,
    #[strum(serialize = "INTDES")]
    InternationalDesignator,
}

/// A satellite identifier as given on the command line.
///
/// International designators name a launch, and a launch usually puts
/// several objects in orbit. The trailing piece letter picks one of them
/// from the element sets returned for the launch, in the order CelesTrak
/// lists them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatelliteId {
    Norad(u32),
    International { launch: String, piece: usize },
}

impl SatelliteId {
    pub fn parse(text: &str) -> Result<Self, PredictError> {
        let text = text.trim();
        let invalid = || PredictError::InvalidId(text.to_string());

        let last = text.chars().last().ok_or_else(invalid)?;
        if last.is_ascii_alphabetic() {
            let launch = &text[..text.len() - 1];
            if launch.is_empty() || !launch.chars().all(|c| c.is_ascii_digit() || c == '-') {
                return Err(invalid());
            }
            let piece = (last.to_ascii_uppercase() as u8 - b'A') as usize;
            return Ok(SatelliteId::International {
                launch: launch.to_string(),
                piece,
            });
        }

        if !text.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        text.parse().map(SatelliteId::Norad).map_err(|_| invalid())
    }

    pub fn query_kind(&self) -> QueryKind {
        match self {
            SatelliteId::Norad(_) => QueryKind::CatalogNumber,
            SatelliteId::International { .. } => QueryKind::InternationalDesignator,
        }
    }

    /// The value sent with the query, without any piece letter.
    pub fn query_value(&self) -> String {
        match self {
            SatelliteId::Norad(id) => id.to_string(),
            SatelliteId::International { launch, .. } => launch.clone(),
        }
    }

    /// Index into the element sets returned for the query.
    pub fn offset(&self) -> usize {
        match self {
            SatelliteId::Norad(_) => 0,
            SatelliteId::International { piece, .. } => *piece,
        }
    }
}

impl FromStr for SatelliteId {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SatelliteId::parse(s)
    }
}

impl fmt::Display for SatelliteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SatelliteId::Norad(id) => write!(f, "{}", id),
            SatelliteId::International { launch, piece } => {
                write!(f, "{}{}", launch, (b'A' + *piece as u8) as char)
            }
        }
    }
}
