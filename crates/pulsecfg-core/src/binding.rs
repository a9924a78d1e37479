use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::document::{Document, EntitySlot, IntegrityError};
use crate::path::{self, FieldPath, PathError};
use crate::section::{Dirty, Section};
use crate::view::ViewNode;

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("'{input}' is not a number (field {path})")]
    InvalidNumber { path: String, input: String },
    #[error("'{input}' is not a boolean (field {path})")]
    InvalidBoolean { path: String, input: String },
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("field {path} rejected: {message}")]
    Schema { path: String, message: String },
    #[error("document could not be encoded: {0}")]
    Encode(String),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    #[error("{0} does not address an entity id")]
    NotAnIdField(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueKind {
    #[default]
    Text,
    Number,
    Boolean,
    List,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldRole {
    #[default]
    Plain,
    EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    pub path: FieldPath,
    pub kind: ValueKind,
    pub empty_as_absent: bool,
    pub ensure: Option<FieldPath>,
    pub role: FieldRole,
    pub rerender: Option<Section>,
    pub updates_title: bool,
}

impl FieldBinding {
    pub fn new(path: FieldPath) -> Self {
        Self {
            path,
            kind: ValueKind::Text,
            empty_as_absent: false,
            ensure: None,
            role: FieldRole::Plain,
            rerender: None,
            updates_title: false,
        }
    }

    pub fn parse(path: &str) -> Result<Self, PathError> {
        Ok(Self::new(FieldPath::parse(path)?))
    }

    pub fn number(mut self) -> Self {
        self.kind = ValueKind::Number;
        self
    }

    pub fn boolean(mut self) -> Self {
        self.kind = ValueKind::Boolean;
        self
    }

    pub fn list(mut self) -> Self {
        self.kind = ValueKind::List;
        self
    }

    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn empty_as_absent(mut self) -> Self {
        self.empty_as_absent = true;
        self
    }

    pub fn ensure(mut self, container: FieldPath) -> Self {
        self.ensure = Some(container);
        self
    }

    pub fn entity_id(mut self) -> Self {
        self.role = FieldRole::EntityId;
        self
    }

    pub fn rerender(mut self, section: Section) -> Self {
        self.rerender = Some(section);
        self
    }

    pub fn updates_title(mut self) -> Self {
        self.updates_title = true;
        self
    }

    pub fn section(&self) -> Section {
        Section::from_path_root(self.path.root())
    }

    pub fn coerce(&self, raw: &RawValue) -> Result<Option<Value>, BindingError> {
        let value = match self.kind {
            ValueKind::Text => Some(Value::String(raw.text().into_owned())),
            ValueKind::Boolean => Some(Value::Bool(self.coerce_bool(raw)?)),
            ValueKind::List => Some(Value::Array(
                raw.text()
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
            )),
            ValueKind::Number => self.coerce_number(raw)?,
        };

        Ok(match value {
            Some(v) if self.empty_as_absent && is_empty(&v) => None,
            other => other,
        })
    }

    fn coerce_bool(&self, raw: &RawValue) -> Result<bool, BindingError> {
        match raw {
            RawValue::Checked(checked) => Ok(*checked),
            RawValue::Text(text) => match text.trim() {
                "true" | "on" | "1" => Ok(true),
                "false" | "off" | "0" | "" => Ok(false),
                other => Err(BindingError::InvalidBoolean {
                    path: self.path.to_string(),
                    input: other.to_string(),
                }),
            },
        }
    }

    fn coerce_number(&self, raw: &RawValue) -> Result<Option<Value>, BindingError> {
        let text = raw.text();
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Some(Value::Number(n.into())));
        }
        if let Ok(n) = text.parse::<u64>() {
            return Ok(Some(Value::Number(n.into())));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(|n| Some(Value::Number(n)))
            .ok_or_else(|| BindingError::InvalidNumber {
                path: self.path.to_string(),
                input: text.to_string(),
            })
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Null => true,
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    Checked(bool),
}

impl RawValue {
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        match self {
            RawValue::Text(s) => std::borrow::Cow::Borrowed(s),
            RawValue::Checked(b) => std::borrow::Cow::Owned(b.to_string()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Checked(b)
    }
}

pub trait FormSurface {
    fn read(&self, binding: &FieldBinding) -> Option<RawValue>;
}

#[derive(Debug, Clone, Default)]
pub struct FormState {
    values: BTreeMap<FieldPath, RawValue>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: &FieldPath, value: RawValue) {
        self.values.insert(path.clone(), value);
    }

    pub fn get(&self, path: &FieldPath) -> Option<&RawValue> {
        self.values.get(path)
    }

    pub fn populate(&mut self, view: &ViewNode) {
        for field in view.fields() {
            self.values
                .insert(field.binding.path.clone(), field.value.clone());
        }
    }

    pub fn clear_region(&mut self, region: Section) {
        self.values
            .retain(|path, _| Section::from_path_root(path.root()) != region);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl FormSurface for FormState {
    fn read(&self, binding: &FieldBinding) -> Option<RawValue> {
        self.values.get(&binding.path).cloned()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BindMode {
    #[default]
    Immediate,
    Batched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushScope {
    All,
    Region(Section),
}

impl FlushScope {
    fn covers(self, section: Section) -> bool {
        match self {
            FlushScope::All => true,
            FlushScope::Region(region) => region == section,
        }
    }
}

#[derive(Debug, Default)]
pub struct FlushReport {
    pub dirty: Dirty,
    pub applied: usize,
    pub rejected: Vec<(String, BindingError)>,
}

#[derive(Debug)]
pub enum FlushOutcome {
    Skipped,
    Applied(FlushReport),
}

pub struct BindingEngine {
    mode: BindMode,
    regions: RefCell<BTreeMap<Section, Vec<FieldBinding>>>,
    pending: RefCell<IndexMap<FieldPath, FieldBinding>>,
    flushing: Cell<bool>,
}

struct FlushGuard<'a>(&'a Cell<bool>);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl BindingEngine {
    pub fn new(mode: BindMode) -> Self {
        Self {
            mode,
            regions: RefCell::new(BTreeMap::new()),
            pending: RefCell::new(IndexMap::new()),
            flushing: Cell::new(false),
        }
    }

    pub fn mode(&self) -> BindMode {
        self.mode
    }

    pub fn change(
        &self,
        doc: &mut Document,
        surface: &dyn FormSurface,
        binding: &FieldBinding,
    ) -> Result<Dirty, BindingError> {
        match self.mode {
            BindMode::Immediate => match surface.read(binding) {
                Some(raw) => apply(doc, binding, &raw),
                None => Ok(Dirty::none()),
            },
            BindMode::Batched => {
                let mut pending = self.pending.borrow_mut();
                pending.shift_remove(&binding.path);
                pending.insert(binding.path.clone(), binding.clone());
                debug!(path = %binding.path, "edit staged");
                Ok(Dirty::none())
            }
        }
    }

    pub fn flush(&self, doc: &mut Document, surface: &dyn FormSurface, scope: FlushScope) -> FlushOutcome {
        self.flush_with(doc, surface, scope, |_, _, _| {})
    }

    /// Commits staged edits in `scope`, then hands the dirty set to
    /// `on_commit`. A flush started from inside `on_commit` is skipped.
    pub fn flush_with<F>(
        &self,
        doc: &mut Document,
        surface: &dyn FormSurface,
        scope: FlushScope,
        mut on_commit: F,
    ) -> FlushOutcome
    where
        F: FnMut(&BindingEngine, &mut Document, &Dirty),
    {
        let Some(_guard) = self.enter() else {
            debug!(?scope, "flush already running, skipped");
            return FlushOutcome::Skipped;
        };

        let staged = self.take_pending(scope);
        if staged.is_empty() {
            return FlushOutcome::Applied(FlushReport::default());
        }

        // Renames re-key channels, so plain writes addressed by the old key go first.
        let (renames, plain): (Vec<_>, Vec<_>) = staged
            .into_iter()
            .partition(|b| b.role == FieldRole::EntityId);

        let mut report = FlushReport::default();
        for binding in plain.iter().chain(renames.iter()) {
            let Some(raw) = surface.read(binding) else {
                continue;
            };
            match apply(doc, binding, &raw) {
                Ok(dirty) => {
                    report.applied += 1;
                    report.dirty.merge(dirty);
                }
                Err(err) => {
                    warn!(path = %binding.path, error = %err, "edit rejected");
                    report.rejected.push((binding.path.to_string(), err));
                }
            }
        }
        debug!(
            ?scope,
            applied = report.applied,
            rejected = report.rejected.len(),
            "flush committed"
        );

        if !report.dirty.is_empty() {
            on_commit(self, doc, &report.dirty);
        }
        FlushOutcome::Applied(report)
    }

    pub fn attach(
        &self,
        doc: &mut Document,
        surface: &dyn FormSurface,
        region: Section,
        bindings: Vec<FieldBinding>,
    ) -> FlushOutcome {
        let outcome = self.flush(doc, surface, FlushScope::Region(region));
        self.regions.borrow_mut().insert(region, bindings);
        outcome
    }

    /// Replaces a region's binding table without flushing. Used while a
    /// flush is already committing that region.
    pub fn rebind(&self, region: Section, bindings: Vec<FieldBinding>) {
        self.regions.borrow_mut().insert(region, bindings);
    }

    pub fn binding(&self, path: &FieldPath) -> Option<FieldBinding> {
        let region = Section::from_path_root(path.root());
        self.regions
            .borrow()
            .get(&region)
            .and_then(|bindings| bindings.iter().find(|b| b.path == *path).cloned())
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    pub fn pending_paths(&self) -> Vec<FieldPath> {
        self.pending.borrow().keys().cloned().collect()
    }

    pub fn clear_pending(&self) {
        self.pending.borrow_mut().clear();
    }

    pub fn is_flushing(&self) -> bool {
        self.flushing.get()
    }

    fn enter(&self) -> Option<FlushGuard<'_>> {
        if self.flushing.replace(true) {
            None
        } else {
            Some(FlushGuard(&self.flushing))
        }
    }

    fn take_pending(&self, scope: FlushScope) -> Vec<FieldBinding> {
        let mut pending = self.pending.borrow_mut();
        let mut taken = Vec::new();
        pending.retain(|_, binding| {
            if scope.covers(binding.section()) {
                taken.push(binding.clone());
                false
            } else {
                true
            }
        });
        taken
    }
}

/// Applies one raw value to the document through `binding`.
///
/// On error the document is left exactly as it was.
pub fn apply(doc: &mut Document, binding: &FieldBinding, raw: &RawValue) -> Result<Dirty, BindingError> {
    let mut dirty = match binding.role {
        FieldRole::EntityId => {
            let slot = EntitySlot::from_id_path(&binding.path)
                .ok_or_else(|| BindingError::NotAnIdField(binding.path.to_string()))?;
            doc.rename(&slot, raw.text().trim())?
        }
        FieldRole::Plain => {
            write_field(doc, binding, raw)?;
            let mut dirty = Dirty::none();
            if binding.updates_title {
                dirty.mark(binding.section());
            }
            dirty
        }
    };
    if let Some(section) = binding.rerender {
        dirty.merge(Dirty::cascade(section));
    }
    Ok(dirty)
}

fn write_field(doc: &mut Document, binding: &FieldBinding, raw: &RawValue) -> Result<(), BindingError> {
    let coerced = binding.coerce(raw)?;
    let mut value = doc
        .to_value()
        .map_err(|e| BindingError::Encode(e.to_string()))?;
    write(&mut value, binding, coerced.clone())?;
    let written = Document::from_value(value).map_err(|e| BindingError::Schema {
        path: binding.path.to_string(),
        message: e.to_string(),
    })?;

    // Unknown keys decode into `extra` maps; only typed fields count as written.
    let modeled = written
        .without_extras()
        .to_value()
        .map_err(|e| BindingError::Encode(e.to_string()))?;
    if !holds(path::lookup(&modeled, &binding.path), coerced.as_ref()) {
        return Err(BindingError::Schema {
            path: binding.path.to_string(),
            message: "no such field".to_string(),
        });
    }

    *doc = written;
    debug!(path = %binding.path, "field written");
    Ok(())
}

fn holds(found: Option<&Value>, expected: Option<&Value>) -> bool {
    match (found, expected) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a.as_f64() == b.as_f64(),
        (Some(found), Some(expected)) => found == expected,
        (None, Some(blank)) | (Some(blank), None) => is_blank(blank),
        (None, None) => true,
    }
}

fn is_blank(value: &Value) -> bool {
    matches!(value, Value::Bool(false)) || is_empty(value)
}

fn write(root: &mut Value, binding: &FieldBinding, coerced: Option<Value>) -> Result<(), PathError> {
    if let Some(container) = &binding.ensure {
        path::ensure(root, container)?;
    }
    let slot = path::resolve(root, &binding.path)?;
    match coerced {
        Some(value) => slot.set(value),
        None => {
            slot.remove();
            Ok(())
        }
    }
}
