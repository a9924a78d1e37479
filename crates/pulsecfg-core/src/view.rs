use serde::Serialize;

use crate::binding::{FieldBinding, RawValue};
use crate::document::{EntityKind, EntitySlot, Protocol, TagField};
use crate::section::Section;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewNode {
    Section {
        section: Section,
        title: String,
        count: Option<usize>,
        add: Option<Action>,
        children: Vec<ViewNode>,
    },
    Card(Card),
    Grid(Vec<ViewNode>),
    Field(InputField),
    Tags(TagPicker),
    ProtocolPicker {
        monitor: usize,
        current: Option<Protocol>,
    },
    Collapsible {
        title: String,
        children: Vec<ViewNode>,
    },
    Heading(String),
    Divider,
    Empty {
        title: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: String,
    pub badge: String,
    pub remove: Action,
    pub children: Vec<ViewNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputField {
    pub label: String,
    pub widget: Widget,
    pub value: RawValue,
    pub binding: FieldBinding,
    pub hint: Option<String>,
    pub placeholder: Option<String>,
    pub required: bool,
    pub full_width: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    Text,
    Password,
    Number { min: Option<i64>, max: Option<i64> },
    Checkbox,
    Select(Vec<Choice>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagPicker {
    pub label: String,
    pub field: TagField,
    pub index: usize,
    pub selected: Vec<String>,
    pub candidates: Vec<String>,
    pub full_width: bool,
}

impl TagPicker {
    pub fn add_action(&self, value: impl Into<String>) -> Action {
        Action::AddTag {
            field: self.field,
            index: self.index,
            value: value.into(),
        }
    }

    pub fn remove_action(&self, value: impl Into<String>) -> Action {
        Action::RemoveTag {
            field: self.field,
            index: self.index,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Add(EntityKind),
    Remove(EntitySlot),
    AddTag {
        field: TagField,
        index: usize,
        value: String,
    },
    RemoveTag {
        field: TagField,
        index: usize,
        value: String,
    },
    SetProtocol {
        monitor: usize,
        protocol: Option<Protocol>,
    },
}

impl InputField {
    fn new(label: impl Into<String>, widget: Widget, binding: FieldBinding, value: RawValue) -> Self {
        Self {
            label: label.into(),
            widget,
            value,
            binding,
            hint: None,
            placeholder: None,
            required: false,
            full_width: false,
        }
    }

    pub fn text(label: impl Into<String>, binding: FieldBinding, value: &str) -> Self {
        Self::new(label, Widget::Text, binding, RawValue::Text(value.to_string()))
    }

    pub fn password(label: impl Into<String>, binding: FieldBinding, value: &str) -> Self {
        Self::new(label, Widget::Password, binding, RawValue::Text(value.to_string()))
    }

    pub fn number<N: ToString>(label: impl Into<String>, binding: FieldBinding, value: Option<N>) -> Self {
        let text = value.map(|n| n.to_string()).unwrap_or_default();
        Self::new(
            label,
            Widget::Number { min: None, max: None },
            binding.number(),
            RawValue::Text(text),
        )
    }

    pub fn checkbox(label: impl Into<String>, binding: FieldBinding, checked: bool) -> Self {
        Self::new(label, Widget::Checkbox, binding.boolean(), RawValue::Checked(checked))
    }

    pub fn select(label: impl Into<String>, binding: FieldBinding, choices: Vec<Choice>) -> Self {
        let value = choices
            .iter()
            .find(|c| c.selected)
            .map(|c| c.value.clone())
            .unwrap_or_default();
        Self::new(label, Widget::Select(choices), binding, RawValue::Text(value))
    }

    pub fn min(mut self, min: i64) -> Self {
        if let Widget::Number { min: slot, .. } = &mut self.widget {
            *slot = Some(min);
        }
        self
    }

    pub fn max(mut self, max: i64) -> Self {
        if let Widget::Number { max: slot, .. } = &mut self.widget {
            *slot = Some(max);
        }
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn full_width(mut self) -> Self {
        self.full_width = true;
        self
    }
}

impl From<InputField> for ViewNode {
    fn from(field: InputField) -> Self {
        ViewNode::Field(field)
    }
}

impl From<TagPicker> for ViewNode {
    fn from(picker: TagPicker) -> Self {
        ViewNode::Tags(picker)
    }
}

impl ViewNode {
    pub fn children(&self) -> &[ViewNode] {
        match self {
            ViewNode::Section { children, .. } | ViewNode::Collapsible { children, .. } => children,
            ViewNode::Card(card) => &card.children,
            ViewNode::Grid(children) => children,
            _ => &[],
        }
    }

    pub fn fields(&self) -> Vec<&InputField> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a InputField>) {
        if let ViewNode::Field(field) = self {
            out.push(field);
        }
        for child in self.children() {
            child.collect_fields(out);
        }
    }

    pub fn bindings(&self) -> Vec<FieldBinding> {
        self.fields().into_iter().map(|f| f.binding.clone()).collect()
    }

    pub fn tag_pickers(&self) -> Vec<&TagPicker> {
        let mut out = Vec::new();
        self.collect_tags(&mut out);
        out
    }

    fn collect_tags<'a>(&'a self, out: &mut Vec<&'a TagPicker>) {
        if let ViewNode::Tags(picker) = self {
            out.push(picker);
        }
        for child in self.children() {
            child.collect_tags(out);
        }
    }

    pub fn cards(&self) -> Vec<&Card> {
        self.children()
            .iter()
            .filter_map(|node| match node {
                ViewNode::Card(card) => Some(card),
                _ => None,
            })
            .collect()
    }

    pub fn field(&self, path: &str) -> Option<&InputField> {
        self.fields()
            .into_iter()
            .find(|f| f.binding.path.to_string() == path)
    }
}
