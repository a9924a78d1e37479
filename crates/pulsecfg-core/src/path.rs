use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("empty segment in path '{0}'")]
    EmptySegment(String),
    #[error("'{segment}' in '{path}' descends into a scalar value")]
    NotAContainer { path: String, segment: String },
    #[error("'{segment}' in '{path}' is not an array index")]
    NotAnIndex { path: String, segment: String },
    #[error("index {index} in '{path}' is out of range (len {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            segments: vec![root.into()],
        }
    }

    pub fn parse(input: &str) -> Result<Self, PathError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = Vec::new();
        for part in input.split('.') {
            if part.is_empty() {
                return Err(PathError::EmptySegment(input.to_string()));
            }
            segments.push(part.to_string());
        }
        Ok(Self { segments })
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(name.into());
        self
    }

    pub fn at(mut self, index: usize) -> Self {
        self.segments.push(index.to_string());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    pub fn last(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

pub struct Slot<'a> {
    pub parent: &'a mut Value,
    pub key: &'a str,
}

impl<'a> Slot<'a> {
    pub fn get(&self) -> Option<&Value> {
        match &*self.parent {
            Value::Object(map) => map.get(self.key),
            Value::Array(items) => self.key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    pub fn set(self, value: Value) -> Result<(), PathError> {
        match self.parent {
            Value::Object(map) => {
                map.insert(self.key.to_string(), value);
                Ok(())
            }
            Value::Array(items) => {
                let index = parse_index(self.key, self.key)?;
                let len = items.len();
                let slot = items.get_mut(index).ok_or_else(|| PathError::IndexOutOfRange {
                    path: self.key.to_string(),
                    index,
                    len,
                })?;
                *slot = value;
                Ok(())
            }
            _ => Err(PathError::NotAContainer {
                path: self.key.to_string(),
                segment: self.key.to_string(),
            }),
        }
    }

    /// Deletes the key. Array elements are never removed through a slot.
    pub fn remove(self) -> Option<Value> {
        match self.parent {
            Value::Object(map) => map.shift_remove(self.key),
            _ => None,
        }
    }
}

pub fn resolve<'a>(root: &'a mut Value, path: &'a FieldPath) -> Result<Slot<'a>, PathError> {
    let (last, init) = path
        .segments
        .split_last()
        .ok_or(PathError::Empty)?;

    let mut current = root;
    for segment in init {
        current = descend(current, segment, path)?;
    }
    vivify(current);

    if matches!(*current, Value::Object(_) | Value::Array(_)) {
        Ok(Slot {
            parent: current,
            key: last.as_str(),
        })
    } else {
        Err(PathError::NotAContainer {
            path: path.to_string(),
            segment: last.clone(),
        })
    }
}

pub fn ensure(root: &mut Value, path: &FieldPath) -> Result<(), PathError> {
    let mut current = root;
    for segment in &path.segments {
        current = descend(current, segment, path)?;
    }
    vivify(current);
    Ok(())
}

/// Read-only lookup; never creates anything.
pub fn lookup<'v>(root: &'v Value, path: &FieldPath) -> Option<&'v Value> {
    let mut current = root;
    for segment in &path.segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn vivify(value: &mut Value) {
    if value.is_null() {
        *value = Value::Object(Map::new());
    }
}

fn descend<'v>(current: &'v mut Value, segment: &str, path: &FieldPath) -> Result<&'v mut Value, PathError> {
    vivify(current);
    match current {
        Value::Object(map) => Ok(map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(items) => {
            let index = parse_index(segment, &path.to_string())?;
            let len = items.len();
            items.get_mut(index).ok_or_else(|| PathError::IndexOutOfRange {
                path: path.to_string(),
                index,
                len,
            })
        }
        _ => Err(PathError::NotAContainer {
            path: path.to_string(),
            segment: segment.to_string(),
        }),
    }
}

fn parse_index(segment: &str, path: &str) -> Result<usize, PathError> {
    segment.parse::<usize>().map_err(|_| PathError::NotAnIndex {
        path: path.to_string(),
        segment: segment.to_string(),
    })
}
