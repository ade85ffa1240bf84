//! Heap regions: one symbolic array per storage class.

use imbl::Vector as ImVector;

use crate::{
    expr::{Expr, RegionKind},
    ir::Type,
};

/// A named symbolic array keyed by heap handles.
///
/// Writes are recorded in insertion order and keyed by expression identity;
/// a write to a key that is already known drops the old entry and appends
/// the new one, so the encoded stores keep program order. Reads
/// of unknown keys are not answered here but deferred to the solver through
/// [`Region::snapshot`].
#[derive(Debug, Clone)]
pub struct Region {
    name: String,
    kind: RegionKind,
    component: Type,
    known: ImVector<(Expr, Expr)>,
}

impl Region {
    /// Creates an empty region.
    ///
    /// # Arguments
    ///
    /// * `name` - Region name, e.g. `*int`, `Point.x` or `[]float64`
    /// * `kind` - Storage class
    /// * `component` - Type of the stored values (row entries for element regions)
    #[must_use]
    pub fn new(name: impl Into<String>, kind: RegionKind, component: Type) -> Self {
        Region {
            name: name.into(),
            kind,
            component,
            known: ImVector::new(),
        }
    }

    /// Returns the region name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the storage class.
    #[must_use]
    pub fn kind(&self) -> &RegionKind {
        &self.kind
    }

    /// Returns the type of the stored values.
    #[must_use]
    pub fn component(&self) -> &Type {
        &self.component
    }

    /// Returns the number of known writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// Returns `true` if nothing was written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Looks up the value last written at exactly `key`.
    #[must_use]
    pub fn lookup(&self, key: &Expr) -> Option<&Expr> {
        self.known
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Records a write at `key`.
    ///
    /// A rewrite moves the key to the end, so the stores stay in program
    /// order for every pair of keys that may alias.
    pub fn write(&mut self, key: Expr, value: Expr) {
        if let Some(position) = self.known.iter().position(|(k, _)| *k == key) {
            self.known.remove(position);
        }
        self.known.push_back((key, value));
    }


    /// Returns the region's current content as an array expression.
    #[must_use]
    pub fn snapshot(&self) -> Expr {
        Expr::array(
            self.name.clone(),
            self.kind.clone(),
            self.component.clone(),
            None,
            self.known.iter().cloned().collect(),
        )
    }
}
