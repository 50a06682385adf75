use crate::foundation::error::{PixError, PixResult};

/// Closed six-way enumeration of blending compose operations, selected by ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComposeOp {
    /// `0`: backdrop x source.
    Multiply,
    /// `1`: absolute difference.
    Difference,
    /// `2`: inverse multiply of inverses.
    Screen,
    /// `3`: multiply or screen depending on the backdrop.
    Overlay,
    /// `4`: backdrop minus source, floored at zero.
    Subtract,
    /// `5`: difference with lower contrast.
    Exclusion,
}

impl ComposeOp {
    /// All variants in ordinal order.
    pub const ALL: [ComposeOp; 6] = [
        Self::Multiply,
        Self::Difference,
        Self::Screen,
        Self::Overlay,
        Self::Subtract,
        Self::Exclusion,
    ];

    /// Select by ordinal; anything outside `0..=5` is rejected.
    pub fn from_index(index: i64) -> PixResult<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(PixError::UnknownComposeOp(index))
    }

    /// Ordinal of this operation.
    pub fn index(self) -> i64 {
        match self {
            Self::Multiply => 0,
            Self::Difference => 1,
            Self::Screen => 2,
            Self::Overlay => 3,
            Self::Subtract => 4,
            Self::Exclusion => 5,
        }
    }

    /// Catalog identifier of the operation.
    pub fn operation_name(self) -> &'static str {
        match self {
            Self::Multiply => "gegl:multiply",
            Self::Difference => "gegl:difference",
            Self::Screen => "gegl:screen",
            Self::Overlay => "gegl:overlay",
            Self::Subtract => "gegl:subtract",
            Self::Exclusion => "gegl:exclusion",
        }
    }

    /// Separable blend of backdrop `cb` and source `cs` color channels.
    pub(crate) fn blend(self, cb: f32, cs: f32) -> f32 {
        match self {
            Self::Multiply => cb * cs,
            Self::Difference => (cb - cs).abs(),
            Self::Screen => cb + cs - cb * cs,
            Self::Overlay => {
                if cb <= 0.5 {
                    2.0 * cb * cs
                } else {
                    1.0 - 2.0 * (1.0 - cb) * (1.0 - cs)
                }
            }
            Self::Subtract => (cb - cs).max(0.0),
            Self::Exclusion => cb + cs - 2.0 * cb * cs,
        }
    }
}

impl TryFrom<i64> for ComposeOp {
    type Error = PixError;

    fn try_from(index: i64) -> Result<Self, Self::Error> {
        Self::from_index(index)
    }
}

/// Select a compose operation by ordinal index.
pub fn select_compose_operation(index: i64) -> PixResult<ComposeOp> {
    ComposeOp::from_index(index)
}

#[cfg(test)]
#[path = "../../tests/unit/graph/compose.rs"]
mod tests;
