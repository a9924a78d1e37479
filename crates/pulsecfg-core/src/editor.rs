use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::binding::{BindingEngine, BindingError, FlushOutcome, FlushReport, FlushScope, FormState, RawValue};
use crate::codec::{self, CodecError};
use crate::config::EditorConfig;
use crate::document::{Counts, DanglingRef, Document, IntegrityError};
use crate::graph::{ReferenceGraph, Scope};
use crate::ids::{IdSource, RandomIds};
use crate::notice::Notices;
use crate::path::FieldPath;
use crate::render;
use crate::sample;
use crate::section::{Dirty, Section};
use crate::view::{Action, ViewNode};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error("no input is bound to {0}")]
    Unbound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub contents: String,
}

pub struct Editor<I: IdSource = RandomIds> {
    config: EditorConfig,
    doc: Document,
    engine: BindingEngine,
    surface: FormState,
    ids: I,
    tab: Section,
    views: BTreeMap<Section, ViewNode>,
    notices: Notices,
}

impl Editor<RandomIds> {
    pub fn new(config: EditorConfig) -> Self {
        let ids = RandomIds::new(config.token_length);
        Self::with_ids(config, ids)
    }
}

impl<I: IdSource> Editor<I> {
    pub fn with_ids(config: EditorConfig, ids: I) -> Self {
        let mut editor = Self {
            engine: BindingEngine::new(config.bind_mode),
            notices: Notices::new(config.notice_ttl, config.notice_capacity),
            config,
            doc: Document::default(),
            surface: FormState::new(),
            ids,
            tab: Section::General,
            views: BTreeMap::new(),
        };
        editor.render_all();
        editor
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn tab(&self) -> Section {
        self.tab
    }

    pub fn view(&self, section: Section) -> Option<&ViewNode> {
        self.views.get(&section)
    }

    pub fn current_view(&self) -> Option<&ViewNode> {
        self.views.get(&self.tab)
    }

    pub fn surface(&self) -> &FormState {
        &self.surface
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    pub fn prune_notices(&mut self, now: DateTime<Utc>) {
        self.notices.prune(now);
    }

    pub fn badges(&self) -> Counts {
        self.doc.counts()
    }

    pub fn has_pending(&self) -> bool {
        self.engine.has_pending()
    }

    pub fn input(&mut self, path: &FieldPath, raw: RawValue) -> Result<Dirty, EditorError> {
        let binding = self
            .engine
            .binding(path)
            .ok_or_else(|| EditorError::Unbound(path.to_string()))?;
        self.surface.set(path, raw);
        let dirty = match self.engine.change(&mut self.doc, &self.surface, &binding) {
            Ok(dirty) => dirty,
            Err(err) => {
                warn!(%path, error = %err, "edit rejected");
                self.notices.push_error(format!("{path}: {err}"));
                return Err(err.into());
            }
        };
        self.refresh(dirty.clone());
        Ok(dirty)
    }

    pub fn select_tab(&mut self, section: Section) {
        if section == self.tab {
            return;
        }
        let leaving = self.tab;
        let mut dirty = self.flush_scope(FlushScope::Region(leaving));
        dirty.mark(section);
        self.tab = section;
        self.refresh(dirty);
        debug!(from = %leaving, to = %section, "tab selected");
    }

    pub fn flush(&mut self) -> Dirty {
        let dirty = self.flush_scope(FlushScope::All);
        self.refresh(dirty.clone());
        dirty
    }

    pub fn dispatch(&mut self, action: Action) -> Result<Dirty, EditorError> {
        self.flush();
        let dirty = match action {
            Action::Add(kind) => self.doc.add(kind, &mut self.ids).1,
            Action::Remove(slot) => self.doc.remove(&slot)?,
            Action::AddTag { field, index, value } => self.doc.add_tag(field, index, &value)?,
            Action::RemoveTag { field, index, value } => self.doc.remove_tag(field, index, &value)?,
            Action::SetProtocol { monitor, protocol } => self.doc.set_protocol(monitor, protocol)?,
        };
        self.refresh(dirty.clone());
        Ok(dirty)
    }

    pub fn import(&mut self, text: &str) -> Result<(), EditorError> {
        match codec::import(text) {
            Ok(doc) => {
                self.replace(doc);
                self.notices.push_info("Configuration imported successfully!");
                Ok(())
            }
            Err(err) => {
                self.notices.push_error(format!("Failed to parse TOML: {err}"));
                Err(err.into())
            }
        }
    }

    pub fn export(&mut self) -> Result<Export, EditorError> {
        self.flush();
        let contents = codec::export(&self.doc)?;
        let file_name = self.config.export_file_name.clone();
        self.notices
            .push_info(format!("Configuration exported as {file_name}"));
        Ok(Export { file_name, contents })
    }

    pub fn load_example(&mut self) -> Result<(), EditorError> {
        let doc = sample::sample()?;
        self.replace(doc);
        self.notices.push_info("Example configuration loaded!");
        Ok(())
    }

    pub fn reset(&mut self, confirmation: Confirmation) -> bool {
        if confirmation != Confirmation::Confirmed {
            return false;
        }
        self.replace(Document::default());
        self.notices.push_info("Configuration reset");
        true
    }

    pub fn graph(&mut self, scope: Scope<'_>) -> ReferenceGraph {
        self.flush();
        ReferenceGraph::build(&self.doc).select(scope)
    }

    pub fn dangling_references(&self) -> Vec<DanglingRef> {
        self.doc.dangling_references()
    }

    fn replace(&mut self, doc: Document) {
        self.engine.clear_pending();
        self.doc = doc;
        self.render_all();
        let counts = self.doc.counts();
        info!(
            monitors = counts.monitors,
            groups = counts.groups,
            status_pages = counts.status_pages,
            channels = counts.channels,
            remote_agents = counts.remote_agents,
            "document replaced"
        );
    }

    fn render_all(&mut self) {
        self.surface.clear();
        for section in Section::ALL {
            let view = render::section(&self.doc, section);
            self.engine
                .attach(&mut self.doc, &self.surface, section, view.bindings());
            self.surface.populate(&view);
            self.views.insert(section, view);
        }
    }

    fn flush_scope(&mut self, scope: FlushScope) -> Dirty {
        match self.engine.flush(&mut self.doc, &self.surface, scope) {
            FlushOutcome::Applied(report) => {
                self.report(&report);
                report.dirty
            }
            FlushOutcome::Skipped => Dirty::none(),
        }
    }

    fn report(&mut self, report: &FlushReport) {
        for (path, err) in &report.rejected {
            self.notices.push_error(format!("{path}: {err}"));
        }
    }

    /// Re-renders `dirty` in order. Staged edits of a region are committed
    /// before its inputs are rebuilt, and whatever those commits dirty is
    /// re-rendered as well.
    fn refresh(&mut self, dirty: Dirty) {
        let mut all = dirty;
        let mut queue: Vec<Section> = all.iter().collect();
        let mut next = 0;
        while next < queue.len() {
            let section = queue[next];
            next += 1;
            for more in self.flush_scope(FlushScope::Region(section)).iter() {
                if !all.contains(more) {
                    all.mark(more);
                    queue.push(more);
                }
            }
        }

        for section in queue {
            let view = render::section(&self.doc, section);
            self.engine.rebind(section, view.bindings());
            self.surface.clear_region(section);
            self.surface.populate(&view);
            self.views.insert(section, view);
        }
    }
}
