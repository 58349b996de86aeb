//! Typed fields declared by component fragments, and the merged field layout
//! of a composed entity kind.
//!
//! A fragment declares [`FieldDef`]s. Composition merges the fields of every
//! fragment of a kind into one [`FieldLayout`] that maps each field name to a
//! dense [`FieldSlot`]. An entity instance stores its state as one flat
//! `Vec<FieldValue>` indexed by those slots, and hooks see it through the
//! [`Fields`] / [`FieldsMut`] accessors.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// The type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// `bool`
    Bool,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit float.
    Float,
    /// Two-component float vector.
    Vec2,
    /// UTF-8 string.
    Text,
    /// Reference to another entity; [`EntityId::INVALID`] means none.
    Entity,
}

impl FieldType {
    /// The zero value of this type.
    #[must_use]
    pub fn zero(self) -> FieldValue {
        match self {
            FieldType::Bool => FieldValue::Bool(false),
            FieldType::Int => FieldValue::Int(0),
            FieldType::Long => FieldValue::Long(0),
            FieldType::Float => FieldValue::Float(0.0),
            FieldType::Vec2 => FieldValue::Vec2(Vec2::ZERO),
            FieldType::Text => FieldValue::Text(String::new()),
            FieldType::Entity => FieldValue::Entity(EntityId::INVALID),
        }
    }

    /// Lower-case type name, used in fingerprints and diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Long => "long",
            FieldType::Float => "float",
            FieldType::Vec2 => "vec2",
            FieldType::Text => "text",
            FieldType::Entity => "entity",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// `bool`
    Bool(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 32-bit float.
    Float(f32),
    /// Two-component float vector.
    Vec2(Vec2),
    /// UTF-8 string.
    Text(String),
    /// Entity reference.
    Entity(EntityId),
}

impl FieldValue {
    /// Returns the type of this value.
    #[must_use]
    pub fn ty(&self) -> FieldType {
        match self {
            FieldValue::Bool(_) => FieldType::Bool,
            FieldValue::Int(_) => FieldType::Int,
            FieldValue::Long(_) => FieldType::Long,
            FieldValue::Float(_) => FieldType::Float,
            FieldValue::Vec2(_) => FieldType::Vec2,
            FieldValue::Text(_) => FieldType::Text,
            FieldValue::Entity(_) => FieldType::Entity,
        }
    }

    /// Numeric view of the value, as exposed to the logic layer.
    ///
    /// Booleans map to 0/1, entity references to their raw id, vectors to
    /// their length and text to 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> f64 {
        match self {
            FieldValue::Bool(b) => f64::from(u8::from(*b)),
            FieldValue::Int(v) => f64::from(*v),
            FieldValue::Long(v) => *v as f64,
            FieldValue::Float(v) => f64::from(*v),
            FieldValue::Vec2(v) => f64::from(v.length()),
            FieldValue::Text(_) => 0.0,
            FieldValue::Entity(id) => id.id() as f64,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Long(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v)
    }
}

impl From<Vec2> for FieldValue {
    fn from(v: Vec2) -> Self {
        FieldValue::Vec2(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<EntityId> for FieldValue {
    fn from(v: EntityId) -> Self {
        FieldValue::Entity(v)
    }
}

/// A field declared by a fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name, unique within a composed kind unless `shared`.
    pub name: &'static str,
    /// Declared type.
    pub ty: FieldType,
    /// Initial value for freshly created instances.
    pub default: FieldValue,
    /// Whether other fragments may declare the same field (same type) and
    /// share a single slot with it.
    pub shared: bool,
    /// Excluded from auto-generated sync hooks.
    pub transient: bool,
}

impl FieldDef {
    /// Declare a field whose type is inferred from its default value.
    #[must_use]
    pub fn new(name: &'static str, default: impl Into<FieldValue>) -> Self {
        let default = default.into();
        Self {
            name,
            ty: default.ty(),
            default,
            shared: false,
            transient: false,
        }
    }

    /// Declare a field initialised to the zero value of `ty`.
    #[must_use]
    pub fn zeroed(name: &'static str, ty: FieldType) -> Self {
        Self::new(name, ty.zero())
    }

    /// Mark the field as shareable with other fragments.
    #[must_use]
    pub fn shared(mut self) -> Self {
        self.shared = true;
        self
    }

    /// Mark the field as transient.
    #[must_use]
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }
}

/// Dense index of a field within a [`FieldLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldSlot(pub usize);

/// The merged field table of a composed kind.
#[derive(Debug, Clone, Default)]
pub struct FieldLayout {
    defs: Vec<FieldDef>,
    index: HashMap<&'static str, FieldSlot>,
}

impl FieldLayout {
    /// Create an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field and return its slot. If a field with the same name is
    /// already present, the existing slot is returned unchanged.
    pub fn push(&mut self, def: FieldDef) -> FieldSlot {
        if let Some(&slot) = self.index.get(def.name) {
            return slot;
        }
        let slot = FieldSlot(self.defs.len());
        self.index.insert(def.name, slot);
        self.defs.push(def);
        slot
    }

    /// Look up the slot of a field by name.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<FieldSlot> {
        self.index.get(name).copied()
    }

    /// Returns the definition stored at `slot`.
    #[must_use]
    pub fn def(&self, slot: FieldSlot) -> Option<&FieldDef> {
        self.defs.get(slot.0)
    }

    /// Look up a definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.slot(name).and_then(|slot| self.def(slot))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns `true` if the layout has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Iterate definitions in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDef> {
        self.defs.iter()
    }

    /// Default values of every field, in slot order.
    #[must_use]
    pub fn defaults(&self) -> Vec<FieldValue> {
        self.defs.iter().map(|d| d.default.clone()).collect()
    }
}

/// Read access to merged field values.
///
/// The typed getters return the zero value when the field is absent or holds a
/// different type. Composition guarantees that every field a fragment declares
/// or imports is present with its declared type.
pub trait FieldAccess {
    /// The layout the values are indexed by.
    fn layout(&self) -> &FieldLayout;

    /// The raw values, in slot order.
    fn values(&self) -> &[FieldValue];

    /// Returns the value of a field by name.
    fn get(&self, name: &str) -> Option<&FieldValue> {
        let slot = self.layout().slot(name)?;
        self.values().get(slot.0)
    }

    /// Returns the value stored at a pre-resolved slot.
    fn at(&self, slot: FieldSlot) -> Option<&FieldValue> {
        self.values().get(slot.0)
    }

    /// Reads a `bool` field.
    fn bool(&self, name: &str) -> bool {
        matches!(self.get(name), Some(FieldValue::Bool(true)))
    }

    /// Reads an `int` field.
    fn int(&self, name: &str) -> i32 {
        match self.get(name) {
            Some(FieldValue::Int(v)) => *v,
            _ => 0,
        }
    }

    /// Reads a `long` field.
    fn long(&self, name: &str) -> i64 {
        match self.get(name) {
            Some(FieldValue::Long(v)) => *v,
            _ => 0,
        }
    }

    /// Reads a `float` field.
    fn float(&self, name: &str) -> f32 {
        match self.get(name) {
            Some(FieldValue::Float(v)) => *v,
            _ => 0.0,
        }
    }

    /// Reads a `vec2` field.
    fn vec2(&self, name: &str) -> Vec2 {
        match self.get(name) {
            Some(FieldValue::Vec2(v)) => *v,
            _ => Vec2::ZERO,
        }
    }

    /// Reads a `text` field.
    fn text(&self, name: &str) -> &str {
        match self.get(name) {
            Some(FieldValue::Text(v)) => v.as_str(),
            _ => "",
        }
    }

    /// Reads an `entity` field.
    fn entity(&self, name: &str) -> EntityId {
        match self.get(name) {
            Some(FieldValue::Entity(v)) => *v,
            _ => EntityId::INVALID,
        }
    }
}

/// Shared view of an entity's merged fields.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    layout: &'a FieldLayout,
    values: &'a [FieldValue],
}

impl<'a> Fields<'a> {
    /// Wrap a layout and its values.
    #[must_use]
    pub fn new(layout: &'a FieldLayout, values: &'a [FieldValue]) -> Self {
        Self { layout, values }
    }
}

impl FieldAccess for Fields<'_> {
    fn layout(&self) -> &FieldLayout {
        self.layout
    }

    fn values(&self) -> &[FieldValue] {
        self.values
    }
}

/// Mutable view of an entity's merged fields.
#[derive(Debug)]
pub struct FieldsMut<'a> {
    layout: &'a FieldLayout,
    values: &'a mut [FieldValue],
}

impl<'a> FieldsMut<'a> {
    /// Wrap a layout and its values.
    #[must_use]
    pub fn new(layout: &'a FieldLayout, values: &'a mut [FieldValue]) -> Self {
        Self { layout, values }
    }

    /// Reborrow as a shared view.
    #[must_use]
    pub fn as_fields(&self) -> Fields<'_> {
        Fields::new(self.layout, self.values)
    }

    /// Overwrite a field by name.
    ///
    /// Returns `false` and leaves the field untouched if it does not exist or
    /// the value has a different type.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> bool {
        match self.layout.slot(name) {
            Some(slot) => self.set_at(slot, value),
            None => false,
        }
    }

    /// Overwrite the field at a pre-resolved slot, with the same type check as
    /// [`FieldsMut::set`].
    pub fn set_at(&mut self, slot: FieldSlot, value: impl Into<FieldValue>) -> bool {
        let value = value.into();
        match self.values.get_mut(slot.0) {
            Some(current) if current.ty() == value.ty() => {
                *current = value;
                true
            }
            _ => false,
        }
    }
}

impl FieldAccess for FieldsMut<'_> {
    fn layout(&self) -> &FieldLayout {
        self.layout
    }

    fn values(&self) -> &[FieldValue] {
        self.values
    }
}
