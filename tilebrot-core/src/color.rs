use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How the presentation layer shades escape values.
///
/// The engine never looks at this; it travels with the view so the
/// renderer and the plane-state encoder can read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Shade by `ln ν / ln budget`.
    #[default]
    Logarithmic,
    /// Shade by `ν` modulo the shade range.
    Cyclic,
    /// Shade by `ν / budget`.
    Linear,
    /// Linear, folded back at the midpoint.
    Mirrored,
}

impl ColorMode {
    pub const ALL: [ColorMode; 4] = [
        ColorMode::Logarithmic,
        ColorMode::Cyclic,
        ColorMode::Linear,
        ColorMode::Mirrored,
    ];

    /// Stable numeric index used by the plane-state encoding.
    pub fn index(self) -> u8 {
        match self {
            Self::Logarithmic => 0,
            Self::Cyclic => 1,
            Self::Linear => 2,
            Self::Mirrored => 3,
        }
    }

    pub fn from_index(index: i64) -> crate::Result<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(CoreError::InvalidColorMode(index))
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Logarithmic => "Logarithmic",
            Self::Cyclic => "Cyclic",
            Self::Linear => "Linear",
            Self::Mirrored => "Mirrored",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trip() {
        for mode in ColorMode::ALL {
            assert_eq!(ColorMode::from_index(mode.index() as i64).unwrap(), mode);
        }
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        assert!(ColorMode::from_index(4).is_err());
        assert!(ColorMode::from_index(-1).is_err());
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&ColorMode::Mirrored).unwrap();
        assert_eq!(json, "\"mirrored\"");
    }
}
