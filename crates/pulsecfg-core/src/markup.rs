use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

use crate::binding::{FieldRole, RawValue, ValueKind};
use crate::document::EntitySlot;
use crate::render::protocol_choices;
use crate::view::{Action, Card, Choice, InputField, TagPicker, ViewNode, Widget};

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("markup template failed: {0}")]
    Template(#[from] tera::Error),
}

const ATTRS: &str = r#"{{ a.name }}{% if a.value %}="{{ a.value }}"{% endif %}"#;

const SECTION: &str = r#"<section data-section="{{ section }}"><header><h2>{{ title }}</h2>{% if count is defined %}<span class="badge">{{ count }}</span>{% endif %}{% if add is defined %}<button{% for a in add %} @ATTRS@{% endfor %}>Add</button>{% endif %}</header>{{ children | safe }}</section>"#;

const CARD: &str = r#"<div class="config-card"><div class="config-card-header"><div class="config-card-title"><h3>{{ title }}</h3><span class="badge mono">{{ badge }}</span></div><button class="btn-icon danger"{% for a in remove %} @ATTRS@{% endfor %} title="Delete">&times;</button></div>{{ children | safe }}</div>"#;

const GRID: &str = r#"<div class="form-grid">{{ children | safe }}</div>"#;

const FIELD: &str = r#"<div class="{{ class }}">{% if widget == "checkbox" %}<label class="form-check"><input type="checkbox"{% if checked %} checked{% endif %}{% for a in bind %} @ATTRS@{% endfor %} /><span class="form-check-label">{{ label }}</span></label>{% else %}<label class="form-label">{{ label }}{% if required %} <span class="required">*</span>{% endif %}</label>{% if widget == "select" %}<select class="form-select"{% for a in bind %} @ATTRS@{% endfor %}>{% for c in choices %}<option value="{{ c.value }}"{% if c.selected %} selected{% endif %}>{{ c.label }}</option>{% endfor %}</select>{% else %}<input class="form-input" type="{{ input_type }}" value="{{ value }}"{% if min is defined %} min="{{ min }}"{% endif %}{% if max is defined %} max="{{ max }}"{% endif %}{% if placeholder is defined %} placeholder="{{ placeholder }}"{% endif %}{% for a in bind %} @ATTRS@{% endfor %} />{% endif %}{% endif %}{% if hint is defined %}<span class="form-hint">{{ hint }}</span>{% endif %}</div>"#;

const TAGS: &str = r#"<div class="{{ class }}"><label class="form-label">{{ label }}</label><div class="tags-display">{% for tag in tags %}<span class="tag">{{ tag.value }}<button class="tag-remove"{% for a in tag.remove %} @ATTRS@{% endfor %}>&times;</button></span>{% endfor %}<input class="tags-input" type="text" placeholder="Type and press Enter"{% for a in input %} @ATTRS@{% endfor %}{% if candidates %} list="{{ list_id }}"{% endif %} />{% if candidates %}<datalist id="{{ list_id }}">{% for c in candidates %}<option value="{{ c.value }}"{% for a in c.add %} @ATTRS@{% endfor %}></option>{% endfor %}</datalist>{% endif %}</div></div>"#;

const PROTOCOL: &str = r#"<div class="form-group"><label class="form-label">Protocol</label><select class="form-select" data-action="set-pulse-protocol" data-idx="{{ monitor }}">{% for c in choices %}<option value="{{ c.value }}"{% if c.selected %} selected{% endif %}>{{ c.label }}</option>{% endfor %}</select></div>"#;

const COLLAPSIBLE: &str = r#"<button class="collapsible-trigger" type="button">{{ title }}</button><div class="collapsible-content">{{ children | safe }}</div>"#;

const HEADING: &str = r#"<div class="form-section-title">{{ text }}</div>"#;

const DIVIDER: &str = r#"<hr class="form-divider"/>"#;

const EMPTY: &str = r#"<div class="empty-state"><h3>{{ title }}</h3><p>{{ message }}</p></div>"#;

const NO_CHOICES: &[Choice] = &[];

/// Renders view-model trees to HTML through autoescaped templates.
pub struct Markup {
    tera: Tera,
}

#[derive(Serialize)]
struct Attr {
    name: &'static str,
    value: String,
}

fn attr(name: &'static str, value: impl ToString) -> Attr {
    Attr {
        name,
        value: value.to_string(),
    }
}

fn flag(name: &'static str) -> Attr {
    Attr {
        name,
        value: String::new(),
    }
}

#[derive(Serialize)]
struct FieldContext<'a> {
    class: &'static str,
    label: &'a str,
    required: bool,
    widget: &'static str,
    input_type: &'static str,
    value: String,
    checked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    placeholder: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'a str>,
    bind: Vec<Attr>,
    choices: &'a [Choice],
}

#[derive(Serialize)]
struct TagContext<'a> {
    class: &'static str,
    label: &'a str,
    list_id: String,
    tags: Vec<SelectedTag<'a>>,
    input: Vec<Attr>,
    candidates: Vec<Candidate<'a>>,
}

#[derive(Serialize)]
struct SelectedTag<'a> {
    value: &'a str,
    remove: Vec<Attr>,
}

#[derive(Serialize)]
struct Candidate<'a> {
    value: &'a str,
    add: Vec<Attr>,
}

impl Markup {
    pub fn new() -> Result<Self, MarkupError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);
        let templates = [
            ("section.html", SECTION),
            ("card.html", CARD),
            ("grid.html", GRID),
            ("field.html", FIELD),
            ("tags.html", TAGS),
            ("protocol.html", PROTOCOL),
            ("collapsible.html", COLLAPSIBLE),
            ("heading.html", HEADING),
            ("divider.html", DIVIDER),
            ("empty.html", EMPTY),
        ];
        tera.add_raw_templates(
            templates
                .iter()
                .map(|(name, source)| (*name, source.replace("@ATTRS@", ATTRS))),
        )?;
        Ok(Self { tera })
    }

    pub fn render(&self, node: &ViewNode) -> Result<String, MarkupError> {
        let mut ctx = Context::new();
        let template = match node {
            ViewNode::Section {
                section,
                title,
                count,
                add,
                children,
            } => {
                ctx.insert("section", section.key());
                ctx.insert("title", title);
                if let Some(count) = count {
                    ctx.insert("count", count);
                }
                if let Some(action) = add {
                    ctx.insert("add", &action_attrs(action));
                }
                ctx.insert("children", &self.render_all(children)?);
                "section.html"
            }
            ViewNode::Card(card) => return self.render_card(card),
            ViewNode::Grid(children) => {
                ctx.insert("children", &self.render_all(children)?);
                "grid.html"
            }
            ViewNode::Field(field) => {
                ctx = Context::from_serialize(field_context(field))?;
                "field.html"
            }
            ViewNode::Tags(picker) => {
                ctx = Context::from_serialize(tag_context(picker))?;
                "tags.html"
            }
            ViewNode::ProtocolPicker { monitor, current } => {
                ctx.insert("monitor", monitor);
                ctx.insert("choices", &protocol_choices(*current));
                "protocol.html"
            }
            ViewNode::Collapsible { title, children } => {
                ctx.insert("title", title);
                ctx.insert("children", &self.render_all(children)?);
                "collapsible.html"
            }
            ViewNode::Heading(text) => {
                ctx.insert("text", text);
                "heading.html"
            }
            ViewNode::Divider => "divider.html",
            ViewNode::Empty { title, message } => {
                ctx.insert("title", title);
                ctx.insert("message", message);
                "empty.html"
            }
        };
        Ok(self.tera.render(template, &ctx)?)
    }

    fn render_all(&self, nodes: &[ViewNode]) -> Result<String, MarkupError> {
        nodes.iter().map(|node| self.render(node)).collect()
    }

    fn render_card(&self, card: &Card) -> Result<String, MarkupError> {
        let mut ctx = Context::new();
        ctx.insert("title", &card.title);
        ctx.insert("badge", &card.badge);
        ctx.insert("remove", &action_attrs(&card.remove));
        ctx.insert("children", &self.render_all(&card.children)?);
        Ok(self.tera.render("card.html", &ctx)?)
    }
}

pub fn to_html(node: &ViewNode) -> Result<String, MarkupError> {
    Markup::new()?.render(node)
}

fn group_class(full_width: bool) -> &'static str {
    if full_width {
        "form-group full-width"
    } else {
        "form-group"
    }
}

fn field_context(field: &InputField) -> FieldContext<'_> {
    let (widget, input_type, min, max, choices) = match &field.widget {
        Widget::Checkbox => ("checkbox", "", None, None, NO_CHOICES),
        Widget::Select(choices) => ("select", "", None, None, choices.as_slice()),
        Widget::Number { min, max } => ("input", "number", *min, *max, NO_CHOICES),
        Widget::Password => ("input", "password", None, None, NO_CHOICES),
        Widget::Text => ("input", "text", None, None, NO_CHOICES),
    };
    FieldContext {
        class: group_class(field.full_width),
        label: &field.label,
        required: field.required,
        widget,
        input_type,
        value: field.value.text().into_owned(),
        checked: matches!(field.value, RawValue::Checked(true)),
        min,
        max,
        placeholder: field.placeholder.as_deref(),
        hint: field.hint.as_deref(),
        bind: bind_attrs(field),
        choices,
    }
}

fn bind_attrs(field: &InputField) -> Vec<Attr> {
    let binding = &field.binding;
    let mut attrs = vec![attr("data-bind", &binding.path)];
    match binding.kind {
        ValueKind::Number => attrs.push(attr("data-type", "number")),
        ValueKind::Boolean => attrs.push(attr("data-type", "boolean")),
        ValueKind::List => attrs.push(attr("data-type", "csv")),
        ValueKind::Text => {}
    }
    if let Some(ensure) = &binding.ensure {
        attrs.push(attr("data-ensure", ensure));
    }
    if binding.empty_as_absent {
        attrs.push(flag("data-empty-undefined"));
    }
    if binding.role == FieldRole::EntityId {
        attrs.push(attr("data-role", "entity-id"));
    }
    if binding.updates_title {
        attrs.push(flag("data-update-title"));
    }
    if let Some(section) = binding.rerender {
        attrs.push(attr("data-rerender", section.key()));
    }
    attrs
}

fn tag_context(picker: &TagPicker) -> TagContext<'_> {
    let section = picker.field.section().key();
    TagContext {
        class: group_class(picker.full_width),
        label: &picker.label,
        list_id: format!("tags-{section}-{}-{}", picker.field.key(), picker.index),
        tags: picker
            .selected
            .iter()
            .map(|value| SelectedTag {
                value,
                remove: action_attrs(&picker.remove_action(value.as_str())),
            })
            .collect(),
        input: vec![
            attr("data-action", "tag-keydown"),
            attr("data-section", section),
            attr("data-field", picker.field.key()),
            attr("data-prop", picker.field.prop()),
            attr("data-idx", picker.index),
        ],
        candidates: picker
            .candidates
            .iter()
            .map(|value| Candidate {
                value,
                add: action_attrs(&picker.add_action(value.as_str())),
            })
            .collect(),
    }
}

fn action_attrs(action: &Action) -> Vec<Attr> {
    match action {
        Action::Add(kind) => vec![
            attr("data-action", "add"),
            attr("data-kind", kind.label()),
            attr("data-section", kind.section().key()),
        ],
        Action::Remove(slot) => {
            let target = match slot {
                EntitySlot::Channel(key) => attr("data-key", key),
                EntitySlot::Monitor(i)
                | EntitySlot::Group(i)
                | EntitySlot::StatusPage(i)
                | EntitySlot::RemoteAgent(i) => attr("data-idx", i),
            };
            vec![
                attr("data-action", "remove"),
                attr("data-kind", slot.kind().label()),
                target,
            ]
        }
        Action::AddTag { field, index, value } | Action::RemoveTag { field, index, value } => {
            let name = if matches!(action, Action::AddTag { .. }) {
                "add-tag"
            } else {
                "remove-tag"
            };
            vec![
                attr("data-action", name),
                attr("data-section", field.section().key()),
                attr("data-field", field.key()),
                attr("data-prop", field.prop()),
                attr("data-idx", index),
                attr("data-value", value),
            ]
        }
        Action::SetProtocol { monitor, protocol } => vec![
            attr("data-action", "set-pulse-protocol"),
            attr("data-idx", monitor),
            attr("data-value", protocol.map(|p| p.key()).unwrap_or_default()),
        ],
    }
}
