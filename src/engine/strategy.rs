//! Branch handling strategies.

use strum::{Display, EnumIter, EnumString};

/// How the interpreter treats a conditional branch.
///
/// Both strategies run on the same state machine and differ only at `if`
/// instructions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Strategy {
    /// Fork into both arms and drop the arms whose path condition the solver
    /// proves unsatisfiable. Every completed path is reported.
    #[default]
    Dynamic,
    /// Fork into both arms without consulting the solver. Completed paths
    /// are folded into one ordered decision table.
    Static,
}

impl Strategy {
    /// Returns `true` if branch arms are checked for feasibility.
    #[must_use]
    pub const fn prunes(self) -> bool {
        matches!(self, Strategy::Dynamic)
    }
}
