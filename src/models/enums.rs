use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate an ordered enum with as_str + std::str::FromStr pattern.
/// Variant order is the clinical ordering (lowest first), so `Ord` gives the
/// max-severity reduction used by the checkers.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(AllergySeverity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
    LifeThreatening => "life-threatening",
});

str_enum!(InteractionSeverity {
    Minor => "minor",
    Moderate => "moderate",
    Major => "major",
    Contraindicated => "contraindicated",
});

str_enum!(ContraindicationSeverity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
    Critical => "critical",
});

str_enum!(ContraindicationKind {
    Relative => "relative",
    Absolute => "absolute",
});

str_enum!(HepaticFunction {
    Normal => "normal",
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
});

str_enum!(PediatricFormula {
    YoungsRule => "youngs-rule",
    ClarksRule => "clarks-rule",
});

str_enum!(ClassSource {
    LookupTable => "lookup-table",
    Heuristic => "heuristic",
});

/// Severity scale shared by the alert types, so results can reduce to a
/// single "highest severity" regardless of which checker produced them.
pub trait SeverityLevel: Copy + Ord {
    fn as_str(&self) -> &'static str;
}

impl SeverityLevel for AllergySeverity {
    fn as_str(&self) -> &'static str {
        AllergySeverity::as_str(self)
    }
}

impl SeverityLevel for InteractionSeverity {
    fn as_str(&self) -> &'static str {
        InteractionSeverity::as_str(self)
    }
}

impl SeverityLevel for ContraindicationSeverity {
    fn as_str(&self) -> &'static str {
        ContraindicationSeverity::as_str(self)
    }
}

/// Max over an iterator of severities; `None` when there is nothing to reduce.
pub fn highest<S: SeverityLevel>(levels: impl IntoIterator<Item = S>) -> Option<S> {
    levels.into_iter().max()
}

/// Serialize an optional severity as its string, or `"none"` when absent.
pub fn serialize_severity_or_none<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: SeverityLevel,
{
    serializer.serialize_str(value.as_ref().map(SeverityLevel::as_str).unwrap_or("none"))
}
