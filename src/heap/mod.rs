//! Symbolic heap.
//!
//! This module provides [`SymbolicHeap`], the memory model of one execution
//! state. Every storage class lives in its own [`Region`], a symbolic array
//! keyed by heap handles:
//!
//! | Storage | Region name | Key | Stored value |
//! |---------|-------------|-----|--------------|
//! | `*p` for `p: *T` | `*T` | pointer | `T` |
//! | `s.f` for `s: S` | `S.f` | struct handle | field type |
//! | `a[i]` for `a: []E` | `[]E` | slice handle | row array keyed by `i` |
//!
//! Handles are either [`ExprKind::Ref`](crate::expr::ExprKind::Ref) nodes
//! minted by allocation or arbitrary handle-typed expressions such as pointer
//! parameters. Reads of a handle that was written before return the written
//! value; any other read returns an
//! [`ExprKind::ArrayAccess`](crate::expr::ExprKind::ArrayAccess) over a
//! snapshot of the region, which leaves possible aliasing between distinct
//! handle expressions to the solver.
//!
//! # Copy-on-Write Semantics
//!
//! All tables are `imbl` maps and vectors, so [`SymbolicHeap::fork`] is O(1)
//! and forked states share structure until one of them writes.

mod region;

pub use region::Region;

use std::sync::Arc;

use imbl::HashMap as ImHashMap;

use crate::{
    expr::{builtin, Expr, ExprKind, RegionKind},
    ir::{StructDef, Type},
    Result,
};

/// The heap of one execution state.
#[derive(Debug, Clone, Default)]
pub struct SymbolicHeap {
    /// Regions by name.
    regions: ImHashMap<String, Region>,
    /// Next allocation id per handle type signature.
    counters: ImHashMap<String, u64>,
    /// Struct schemas, registered on first allocation or field access.
    structs: ImHashMap<String, Arc<StructDef>>,
    /// Recorded slice lengths by handle.
    lengths: ImHashMap<Expr, Expr>,
}

impl SymbolicHeap {
    /// Creates an empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an independent copy sharing structure with this heap.
    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Allocates a fresh handle of type `ty`.
    ///
    /// Ids are counted per handle type, starting at 1.
    ///
    /// # Arguments
    ///
    /// * `ty` - The handle type, e.g. `*int` or `[]float64`
    pub fn allocate(&mut self, ty: Type) -> Expr {
        let counter = self.counters.entry(ty.to_string()).or_insert(0);
        *counter += 1;
        Expr::reference(*counter, ty)
    }

    /// Allocates a struct and registers its schema.
    ///
    /// The returned handle has type `*Name`; field reads through it go to the
    /// per-field regions of `def`.
    pub fn allocate_struct(&mut self, def: &StructDef) -> Expr {
        self.register_struct(def);
        self.allocate(Type::pointer(Type::named(def.name.clone())))
    }

    /// Allocates a slice of `elem` and records its length.
    pub fn allocate_array(&mut self, elem: &Type, len: Expr) -> Expr {
        let handle = self.allocate(Type::slice(elem.clone()));
        self.lengths.insert(handle.clone(), len);
        handle
    }

    /// Registers a struct schema if it is not known yet.
    pub fn register_struct(&mut self, def: &StructDef) {
        if !self.structs.contains_key(&def.name) {
            self.structs.insert(def.name.clone(), Arc::new(def.clone()));
        }
    }

    /// Returns a registered struct schema.
    #[must_use]
    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.structs.get(name).map(AsRef::as_ref)
    }

    /// Returns a region by name.
    #[must_use]
    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    /// Iterates over all regions, in no particular order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    fn region_or_empty(&self, name: &str, kind: RegionKind, component: &Type) -> Region {
        self.regions
            .get(name)
            .cloned()
            .unwrap_or_else(|| Region::new(name, kind, component.clone()))
    }

    fn read(&self, name: &str, kind: RegionKind, component: &Type, key: &Expr) -> Expr {
        match self.regions.get(name) {
            Some(region) => match region.lookup(key) {
                Some(value) => value.clone(),
                None => Expr::array_access(region.snapshot(), key.clone()),
            },
            None => Expr::array_access(
                Region::new(name, kind, component.clone()).snapshot(),
                key.clone(),
            ),
        }
    }

    fn write(&mut self, name: &str, kind: RegionKind, component: &Type, key: Expr, value: Expr) {
        let mut region = self.region_or_empty(name, kind, component);
        region.write(key, value);
        self.regions.insert(name.to_string(), region);
    }

    /// Reads field `field` of the struct behind `receiver`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `def` has no such field.
    pub fn get_field(&self, receiver: &Expr, def: &StructDef, field: usize) -> Result<Expr> {
        let (name, ty) = Self::field_region(def, field)?;
        Ok(self.read(&name, RegionKind::Field, ty, receiver))
    }

    /// Writes field `field` of the struct behind `receiver`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `def` has no such field.
    pub fn assign_field(
        &mut self,
        receiver: &Expr,
        def: &StructDef,
        field: usize,
        value: Expr,
    ) -> Result<()> {
        self.register_struct(def);
        let (name, ty) = Self::field_region(def, field)?;
        let ty = ty.clone();
        self.write(&name, RegionKind::Field, &ty, receiver.clone(), value);
        Ok(())
    }

    /// Copies every field of `source` into `target`.
    ///
    /// # Errors
    ///
    /// Propagates field lookup failures.
    pub fn copy_struct(&mut self, target: &Expr, source: &Expr, def: &StructDef) -> Result<()> {
        for index in 0..def.fields.len() {
            let value = self.get_field(source, def, index)?;
            self.assign_field(target, def, index, value)?;
        }
        Ok(())
    }

    fn field_region(def: &StructDef, field: usize) -> Result<(String, &Type)> {
        let field_def = def.field(field).ok_or_else(|| {
            malformed_error!("Struct {} has no field #{}", def.name, field)
        })?;
        Ok((format!("{}.{}", def.name, field_def.name), &field_def.ty))
    }

    fn pointee(pointer: &Expr) -> Result<Type> {
        match pointer.ty() {
            Type::Pointer(inner) => Ok(*inner),
            other => Err(malformed_error!(
                "Dereferenced value {} has non-pointer type {}",
                pointer,
                other
            )),
        }
    }

    /// Loads the value behind `pointer`.
    ///
    /// Pointers to structs are their own struct value: fields are stored per
    /// struct handle, so dereferencing yields the handle itself.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `pointer` is not pointer-typed.
    pub fn deref(&self, pointer: &Expr) -> Result<Expr> {
        let pointee = Self::pointee(pointer)?;
        if matches!(pointee, Type::Named(_)) {
            return Ok(pointer.clone());
        }
        Ok(self.read(&pointer.ty().to_string(), RegionKind::Cells, &pointee, pointer))
    }

    /// Stores `value` behind `pointer`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `pointer` is not pointer-typed.
    pub fn assign(&mut self, pointer: &Expr, value: Expr) -> Result<()> {
        let pointee = Self::pointee(pointer)?;
        self.write(
            &pointer.ty().to_string(),
            RegionKind::Cells,
            &pointee,
            pointer.clone(),
            value,
        );
        Ok(())
    }

    /// Returns the element type of a slice, array or pointer-to-array handle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for any other type.
    pub fn element_type(array: &Expr) -> Result<Type> {
        match array.ty() {
            Type::Slice(elem) | Type::Array(elem, _) => Ok(*elem),
            Type::Pointer(inner) => match *inner {
                Type::Array(elem, _) => Ok(*elem),
                other => Err(malformed_error!("Indexed pointer to non-array {}", other)),
            },
            other => Err(malformed_error!(
                "Indexed value {} has non-sequence type {}",
                array,
                other
            )),
        }
    }

    fn elements_region(elem: &Type) -> String {
        format!("[]{elem}")
    }

    /// Reads `array[index]`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `array` is not indexable.
    pub fn get_from_array(&self, array: &Expr, index: &Expr) -> Result<Expr> {
        let elem = Self::element_type(array)?;
        let name = Self::elements_region(&elem);
        match self.regions.get(&name) {
            Some(rows) => match rows.lookup(array) {
                Some(row) => Ok(match Self::row_lookup(row, index) {
                    Some(value) => value,
                    None => Expr::array_access(row.clone(), index.clone()),
                }),
                None => Ok(Expr::array_access(
                    Expr::array_access(rows.snapshot(), array.clone()),
                    index.clone(),
                )),
            },
            None => Ok(Expr::array_access(
                Expr::array_access(
                    Region::new(name, RegionKind::Elements, elem).snapshot(),
                    array.clone(),
                ),
                index.clone(),
            )),
        }
    }

    /// Writes `array[index] = value`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `array` is not indexable.
    pub fn assign_to_array(&mut self, array: &Expr, index: Expr, value: Expr) -> Result<()> {
        let elem = Self::element_type(array)?;
        let name = Self::elements_region(&elem);
        let mut rows = self.region_or_empty(&name, RegionKind::Elements, &elem);

        let mut known = match rows.lookup(array).map(Expr::kind) {
            Some(ExprKind::Array { known, .. }) => known.clone(),
            _ => Vec::new(),
        };
        if let Some(position) = known.iter().position(|(k, _)| *k == index) {
            known.remove(position);
        }
        known.push((index, value));

        let row = Expr::array(
            name.clone(),
            RegionKind::Row(array.clone()),
            elem,
            self.lengths.get(array).cloned(),
            known,
        );
        rows.write(array.clone(), row);
        self.regions.insert(name, rows);
        Ok(())
    }

    fn row_lookup(row: &Expr, index: &Expr) -> Option<Expr> {
        match row.kind() {
            ExprKind::Array { known, .. } => known
                .iter()
                .find(|(k, _)| k == index)
                .map(|(_, value)| value.clone()),
            _ => None,
        }
    }

    /// Returns the length of a slice or array.
    ///
    /// Fixed-size arrays have a literal length and slices made in this state
    /// have their recorded length. For any other handle the length is the
    /// uninterpreted `builtin_len` applied to the handle, so equal handles
    /// have equal lengths.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn length(&self, array: &Expr) -> Expr {
        if let Some(len) = self.lengths.get(array) {
            return len.clone();
        }
        match array.ty() {
            Type::Array(_, n) => Expr::int(n as i64),
            Type::Pointer(inner) => match *inner {
                Type::Array(_, n) => Expr::int(n as i64),
                _ => Expr::call(builtin::LEN, vec![array.clone()], Type::INT),
            },
            _ => Expr::call(builtin::LEN, vec![array.clone()], Type::INT),
        }
    }
}
