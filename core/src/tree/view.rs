use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::auto_refresh::{AutoRefresh, AutoRefreshToggled};
use super::node::{HistoryNode, RepositoryListNode, RepositoryNode, TreeItem, TreeNode};
use crate::config::{keys, ConfigChange, ConfigStore, ViewMode, DEFAULT_DEBOUNCE_MS};
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::event::{Channel, Subscription, Subscriptions};
use crate::provider::{CommandContext, Editor, RepositoryProvider};

pub const VIEW_CONTEXT: &str = "gitglance:view";

const NO_REPOSITORIES: &str = "No repositories found";
const NO_HISTORY: &str = "Open a file tracked by git to see its history";

/// Concrete view a root is built for.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ViewKind {
    Repositories,
    History,
}

impl ViewKind {
    pub fn as_mode(self) -> ViewMode {
        match self {
            ViewKind::Repositories => ViewMode::Repositories,
            ViewKind::History => ViewMode::History,
        }
    }

    fn context_value(self) -> &'static str {
        match self {
            ViewKind::Repositories => "repositories",
            ViewKind::History => "history",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    Initialized,
    ViewChanged,
    ActiveEditorChanged,
    VisibleEditorsChanged,
    RepositoriesChanged,
    RepositoryChanged,
    AutoRefreshToggled,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewChanged {
    pub kind: ViewKind,
}

/// The host should re-query the tree from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootChanged {
    pub reason: RefreshReason,
}

/// The host should re-query a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeChanged {
    pub node: TreeNode,
    pub expand: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshNodeArgs {
    pub expand: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ViewEvents {
    pub view_changed: Channel<ViewChanged>,
    pub root_changed: Channel<RootChanged>,
    pub node_changed: Channel<NodeChanged>,
    pub auto_refresh_toggled: Channel<AutoRefreshToggled>,
}

/// Collaborators handed to the view for the lifetime of the UI session.
#[derive(Clone)]
pub struct ViewContext {
    pub config: Rc<dyn ConfigStore>,
    pub state: Rc<dyn ConfigStore>,
    pub repositories: Rc<dyn RepositoryProvider>,
    pub command_context: Rc<dyn CommandContext>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRefresh {
    reason: RefreshReason,
    reset: bool,
}

/// State reachable from event callbacks. Callbacks hold it weakly.
#[derive(Debug, Default)]
struct Shared {
    kind: Cell<Option<ViewKind>>,
    pending: Cell<Option<PendingRefresh>>,
    events: ViewEvents,
}

impl Shared {
    /// Fill the single pending-refresh slot. A request arriving while one is
    /// pending merges into it; nothing is queued behind it.
    fn request_refresh(&self, reason: RefreshReason, reset: bool) {
        let reset = reset || self.pending.get().is_some_and(|p| p.reset);
        self.pending.set(Some(PendingRefresh { reason, reset }));
        self.events.root_changed.publish(&RootChanged { reason });
    }
}

/// The single live root node and the subscriptions it owns.
#[derive(Debug)]
pub struct Root {
    id: u64,
    node: TreeNode,
    subscriptions: Subscriptions,
    disposed: bool,
}

impl Root {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn node(&self) -> &TreeNode {
        &self.node
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.subscriptions.dispose_all();
        tracing::debug!(root = self.id, "disposed tree root");
    }
}

/// Owns the tree's root node and swaps it in response to editor, config and
/// repository events.
///
/// Rebuild requests go through a single pending slot that the next
/// `get_children(None)` drains. Editor focus and visible-editor changes are
/// debounced and applied from `tick`.
pub struct TreeView {
    ctx: ViewContext,
    shared: Rc<Shared>,
    root: Option<Root>,
    next_root_id: u64,
    active_editor: Option<Editor>,
    focus: Debouncer<Option<Editor>>,
    visible: Debouncer<Vec<Editor>>,
    auto_refresh: AutoRefresh,
    _toggle_subscription: Subscription,
}

impl TreeView {
    pub fn new(ctx: ViewContext) -> Self {
        let shared = Rc::new(Shared::default());

        let weak = Rc::downgrade(&shared);
        let on_repositories_changed: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(shared) = weak.upgrade() {
                if shared.kind.get() == Some(ViewKind::Repositories) {
                    shared.request_refresh(RefreshReason::RepositoriesChanged, true);
                }
            }
        });

        let weak = Rc::downgrade(&shared);
        let toggle_subscription = shared.events.auto_refresh_toggled.subscribe(move |_| {
            if let Some(shared) = weak.upgrade() {
                shared.request_refresh(RefreshReason::AutoRefreshToggled, true);
            }
        });

        let auto_refresh = AutoRefresh::new(
            Rc::clone(&ctx.state),
            Rc::clone(&ctx.repositories),
            Rc::clone(&ctx.command_context),
            shared.events.auto_refresh_toggled.clone(),
            on_repositories_changed,
        );

        let window = Duration::from_millis(DEFAULT_DEBOUNCE_MS);
        Self {
            ctx,
            shared,
            root: None,
            next_root_id: 1,
            active_editor: None,
            focus: Debouncer::new(window),
            visible: Debouncer::new(window),
            auto_refresh,
            _toggle_subscription: toggle_subscription,
        }
    }

    /// Read the persisted mode, build the first root and apply auto-refresh.
    pub fn init(&mut self) -> Result<()> {
        let config = self.ctx.config.config()?;
        self.set_debounce_window(Duration::from_millis(config.views.debounce_ms));

        let kind = self.resolve_mode(config.views.mode)?;
        self.apply_kind(kind);
        self.rebuild_root(kind)?;
        self.auto_refresh.set(config.views.auto_refresh, None)?;

        tracing::info!(view = kind.context_value(), "tree view initialized");
        self.shared
            .events
            .root_changed
            .publish(&RootChanged { reason: RefreshReason::Initialized });
        Ok(())
    }

    /// Release the root, the auto-refresh subscription and pending events.
    pub fn dispose(&mut self) {
        self.clear_root();
        self.auto_refresh.release();
        self.focus.cancel();
        self.visible.cancel();
        self.shared.pending.set(None);
        self.shared.kind.set(None);
    }

    pub fn events(&self) -> &ViewEvents {
        &self.shared.events
    }

    pub fn kind(&self) -> Option<ViewKind> {
        self.shared.kind.get()
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref().map(Root::node)
    }

    pub fn root_id(&self) -> Option<u64> {
        self.root.as_ref().map(Root::id)
    }

    pub fn has_pending_refresh(&self) -> bool {
        self.shared.pending.get().is_some()
    }

    pub fn is_auto_refresh_active(&self) -> bool {
        self.auto_refresh.is_active()
    }

    pub fn get_children(&mut self, node: Option<&TreeNode>) -> Result<Vec<TreeNode>> {
        if let Some(node) = node {
            return node.children(self.ctx.repositories.as_ref());
        }

        let reset = self.shared.pending.take().is_some_and(|p| p.reset);

        let Some(kind) = self.kind() else {
            return Ok(Vec::new());
        };
        if reset || self.root.is_none() {
            self.rebuild_root(kind)?;
        }

        match self.root.as_ref().map(Root::node) {
            None => Ok(vec![TreeNode::message(match kind {
                ViewKind::Repositories => NO_REPOSITORIES,
                ViewKind::History => NO_HISTORY,
            })]),
            Some(list) if matches!(list, TreeNode::RepositoryList(_)) => {
                list.children(self.ctx.repositories.as_ref())
            }
            Some(node) => Ok(vec![node.clone()]),
        }
    }

    pub fn get_tree_item(&self, node: &TreeNode) -> TreeItem {
        node.tree_item()
    }

    /// Install `root` right away, or schedule a rebuild for the next
    /// `get_children(None)` when none is given.
    pub fn refresh(&mut self, reason: RefreshReason, root: Option<TreeNode>) {
        match root {
            Some(node) => {
                self.install_root(node);
                self.shared.events.root_changed.publish(&RootChanged { reason });
            }
            None => self.shared.request_refresh(reason, true),
        }
    }

    pub fn refresh_node(&mut self, node: &TreeNode, args: RefreshNodeArgs) {
        if self.root() == Some(node) {
            self.shared.request_refresh(RefreshReason::Command, true);
            return;
        }
        self.shared.events.node_changed.publish(&NodeChanged {
            node: node.clone(),
            expand: args.expand,
        });
    }

    /// Switch to `mode`. Switching to the current view does nothing and
    /// returns false.
    pub fn set_view(&mut self, mode: ViewMode) -> Result<bool> {
        let kind = self.resolve_mode(mode)?;
        if self.kind() == Some(kind) {
            return Ok(false);
        }

        self.clear_root();
        self.ctx.state.set(keys::LAST_VIEW_MODE, &kind.as_mode())?;
        self.apply_kind(kind);
        self.rebuild_root(kind)?;
        self.shared.pending.set(None);

        tracing::info!(view = kind.context_value(), "switched tree view");
        self.shared.events.view_changed.publish(&ViewChanged { kind });
        self.shared
            .events
            .root_changed
            .publish(&RootChanged { reason: RefreshReason::ViewChanged });
        Ok(true)
    }

    pub fn set_auto_refresh(&mut self, enabled: bool, workspace_enabled: Option<bool>) -> Result<()> {
        self.auto_refresh.set(enabled, workspace_enabled)?;
        Ok(())
    }

    pub fn on_active_editor_changed(&mut self, editor: Option<Editor>, now: Duration) {
        self.focus.push(editor, now);
    }

    pub fn on_visible_editors_changed(&mut self, editors: Vec<Editor>, now: Duration) {
        self.visible.push(editors, now);
    }

    /// Apply debounced editor events whose quiescence window has elapsed.
    pub fn tick(&mut self, now: Duration) -> Result<()> {
        if let Some(editor) = self.focus.take_if_due(now) {
            self.handle_active_editor(editor)?;
        }
        if let Some(editors) = self.visible.take_if_due(now) {
            self.handle_visible_editors(editors)?;
        }
        Ok(())
    }

    /// Apply pending editor events immediately.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(editor) = self.focus.flush() {
            self.handle_active_editor(editor)?;
        }
        if let Some(editors) = self.visible.flush() {
            self.handle_visible_editors(editors)?;
        }
        Ok(())
    }

    /// When the host should call `tick` next.
    pub fn next_timeout(&self, now: Duration) -> Option<Duration> {
        match (self.focus.next_timeout(now), self.visible.next_timeout(now)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn on_config_changed(&mut self, change: &ConfigChange) -> Result<()> {
        if change.affects(keys::DEBOUNCE_MS) {
            let ms = self
                .ctx
                .config
                .get::<u64>(keys::DEBOUNCE_MS)?
                .unwrap_or(DEFAULT_DEBOUNCE_MS);
            self.set_debounce_window(Duration::from_millis(ms));
        }
        if change.affects(keys::VIEW_MODE) {
            let mode = self.ctx.config.get_or_default::<ViewMode>(keys::VIEW_MODE)?;
            self.set_view(mode)?;
        }
        if change.affects(keys::AUTO_REFRESH) {
            let enabled = self.ctx.config.get::<bool>(keys::AUTO_REFRESH)?.unwrap_or(true);
            self.set_auto_refresh(enabled, None)?;
        }
        Ok(())
    }

    fn set_debounce_window(&mut self, window: Duration) {
        self.focus.set_window(window);
        self.visible.set_window(window);
    }

    fn resolve_mode(&self, mode: ViewMode) -> Result<ViewKind> {
        let mode = match mode {
            ViewMode::Auto => self
                .ctx
                .state
                .get::<ViewMode>(keys::LAST_VIEW_MODE)?
                .unwrap_or(ViewMode::Repositories),
            concrete => concrete,
        };
        Ok(match mode {
            ViewMode::History => ViewKind::History,
            ViewMode::Repositories | ViewMode::Auto => ViewKind::Repositories,
        })
    }

    fn apply_kind(&mut self, kind: ViewKind) {
        self.shared.kind.set(Some(kind));
        self.ctx
            .command_context
            .set_context(VIEW_CONTEXT, Value::from(kind.context_value()));
    }

    fn handle_active_editor(&mut self, editor: Option<Editor>) -> Result<()> {
        // Focus moving to an untracked pane keeps the last tracked document.
        let repositories = &self.ctx.repositories;
        let Some(editor) = editor.filter(|e| repositories.is_trackable(&e.uri)) else {
            return Ok(());
        };
        if self.kind() != Some(ViewKind::History) {
            self.active_editor = Some(editor);
            return Ok(());
        }

        let Some(target) = self.history_target(&editor)? else {
            return Ok(());
        };
        self.active_editor = Some(editor);
        let candidate = TreeNode::History(target);
        if self.root.is_some() && self.root().and_then(TreeNode::location_key) == candidate.location_key() {
            return Ok(());
        }

        self.install_root(candidate);
        self.shared.events.root_changed.publish(&RootChanged {
            reason: RefreshReason::ActiveEditorChanged,
        });
        Ok(())
    }

    fn handle_visible_editors(&mut self, editors: Vec<Editor>) -> Result<()> {
        if self.kind() != Some(ViewKind::History) {
            return Ok(());
        }
        let repositories = &self.ctx.repositories;
        if editors.iter().any(|e| repositories.is_trackable(&e.uri)) {
            return Ok(());
        }

        tracing::info!("no trackable editors visible, clearing file history");
        self.active_editor = None;
        self.clear_root();
        self.shared.events.root_changed.publish(&RootChanged {
            reason: RefreshReason::VisibleEditorsChanged,
        });
        Ok(())
    }

    fn history_target(&self, editor: &Editor) -> Result<Option<HistoryNode>> {
        if !self.ctx.repositories.is_trackable(&editor.uri) {
            return Ok(None);
        }
        let Some(repository) = self.ctx.repositories.repository(&editor.uri)? else {
            return Ok(None);
        };
        let Some(path) = repository.relative_path(&editor.uri).map(str::to_string) else {
            return Ok(None);
        };
        Ok(Some(HistoryNode { repository, path }))
    }

    fn build_root(&self, kind: ViewKind) -> Result<Option<TreeNode>> {
        match kind {
            ViewKind::Repositories => {
                let mut repositories = self.ctx.repositories.repositories()?;
                match repositories.len() {
                    0 => {
                        tracing::info!("no repositories found");
                        Ok(None)
                    }
                    1 => Ok(repositories.pop().map(|repository| {
                        TreeNode::Repository(RepositoryNode {
                            repository,
                            sole: true,
                        })
                    })),
                    _ => Ok(Some(TreeNode::RepositoryList(RepositoryListNode { repositories }))),
                }
            }
            ViewKind::History => {
                let target = match &self.active_editor {
                    Some(editor) => self.history_target(editor)?,
                    None => None,
                };
                if target.is_none() {
                    tracing::info!("no active trackable editor for file history");
                }
                Ok(target.map(TreeNode::History))
            }
        }
    }

    /// Replace the root with a freshly built one. A file history stays in
    /// place when there is no trackable editor to rebuild it from.
    fn rebuild_root(&mut self, kind: ViewKind) -> Result<()> {
        match self.build_root(kind)? {
            Some(node) => self.install_root(node),
            None if kind == ViewKind::History && self.root.is_some() => {
                tracing::debug!("keeping file history root");
            }
            None => self.clear_root(),
        }
        Ok(())
    }

    /// Dispose the current root, then install `node` with fresh
    /// subscriptions to the repositories it shows.
    fn install_root(&mut self, node: TreeNode) {
        self.clear_root();

        let mut subscriptions = Subscriptions::new();
        let watched: Vec<String> = node.repository_paths().into_iter().map(str::to_string).collect();
        if !watched.is_empty() {
            let weak: Weak<Shared> = Rc::downgrade(&self.shared);
            subscriptions.push(self.ctx.repositories.on_did_change_repository().subscribe(move |change| {
                if !watched.iter().any(|path| *path == change.path) {
                    return;
                }
                if let Some(shared) = weak.upgrade() {
                    shared.request_refresh(RefreshReason::RepositoryChanged, false);
                }
            }));
        }

        let id = self.next_root_id;
        self.next_root_id += 1;
        tracing::debug!(root = id, "installed tree root");
        self.root = Some(Root {
            id,
            node,
            subscriptions,
            disposed: false,
        });
    }

    fn clear_root(&mut self) {
        if let Some(mut root) = self.root.take() {
            root.dispose();
        }
    }
}

impl Drop for TreeView {
    fn drop(&mut self) {
        self.dispose();
    }
}
