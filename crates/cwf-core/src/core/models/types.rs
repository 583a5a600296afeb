use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error produced when parsing one of the enumerated option types from a string.
#[derive(Debug, Clone, Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// All members of the enumeration.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(UnknownVariant { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

/// The degrees of freedom that are allowed to vary during a relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaxType {
    /// Single-point calculation, nothing is relaxed.
    None,
    /// Only the atomic positions.
    Positions,
    /// Only the cell volume, at fixed shape and positions.
    Volume,
    /// Only the cell shape, at fixed volume and positions.
    Shape,
    /// The full cell, at fixed positions.
    Cell,
    /// Atomic positions and the full cell.
    PositionsCell,
    /// Atomic positions and the cell volume.
    PositionsVolume,
    /// Atomic positions and the cell shape, at fixed volume.
    PositionsShape,
}

string_enum!(RelaxType, "relax type", {
    None => "none",
    Positions => "positions",
    Volume => "volume",
    Shape => "shape",
    Cell => "cell",
    PositionsCell => "positions_cell",
    PositionsVolume => "positions_volume",
    PositionsShape => "positions_shape",
});

impl RelaxType {
    /// Whether this relaxation keeps the cell volume fixed.
    ///
    /// Only fixed-volume members are legal inputs to the equation-of-state workflow,
    /// since a variable volume would defeat the purpose of sampling explicit scale
    /// factors.
    pub fn is_fixed_volume(&self) -> bool {
        !matches!(
            self,
            RelaxType::Volume
                | RelaxType::Cell
                | RelaxType::PositionsCell
                | RelaxType::PositionsVolume
        )
    }
}

/// The spin polarization treatment of a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinType {
    None,
    Collinear,
    NonCollinear,
    SpinOrbit,
}

string_enum!(SpinType, "spin type", {
    None => "none",
    Collinear => "collinear",
    NonCollinear => "non_collinear",
    SpinOrbit => "spin_orbit",
});

/// The electronic character of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectronicType {
    Automatic,
    Metal,
    Insulator,
    Unknown,
}

string_enum!(ElectronicType, "electronic type", {
    Automatic => "automatic",
    Metal => "metal",
    Insulator => "insulator",
    Unknown => "unknown",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relax_type_round_trips_through_strings() {
        for relax_type in RelaxType::ALL {
            assert_eq!(
                relax_type.as_str().parse::<RelaxType>().unwrap(),
                *relax_type
            );
        }
    }

    #[test]
    fn unknown_relax_type_is_rejected() {
        let err = "everything".parse::<RelaxType>().unwrap_err();
        assert_eq!(err.kind, "relax type");
        assert_eq!(err.value, "everything");
    }

    #[test]
    fn fixed_volume_members_exclude_variable_volume_types() {
        let variable: Vec<_> = RelaxType::ALL
            .iter()
            .filter(|t| !t.is_fixed_volume())
            .collect();
        assert_eq!(
            variable,
            [
                &RelaxType::Volume,
                &RelaxType::Cell,
                &RelaxType::PositionsCell,
                &RelaxType::PositionsVolume
            ]
        );
    }

    #[test]
    fn spin_and_electronic_types_parse() {
        assert_eq!(
            "non_collinear".parse::<SpinType>().unwrap(),
            SpinType::NonCollinear
        );
        assert_eq!(
            "insulator".parse::<ElectronicType>().unwrap(),
            ElectronicType::Insulator
        );
    }
}
