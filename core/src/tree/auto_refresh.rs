use std::rc::Rc;

use serde_json::Value;

use crate::config::{keys, ConfigStore};
use crate::error::Result;
use crate::event::{Channel, Subscription};
use crate::provider::{CommandContext, RepositoryProvider};

pub const AUTO_REFRESH_CONTEXT: &str = "gitglance:views:autoRefresh";

/// Published when the workspace auto-refresh flag is explicitly flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoRefreshToggled {
    pub enabled: bool,
}

/// Keeps at most one subscription to the "repositories changed" event,
/// live only while auto-refresh is enabled both globally and for the
/// workspace.
pub struct AutoRefresh {
    state: Rc<dyn ConfigStore>,
    repositories: Rc<dyn RepositoryProvider>,
    command_context: Rc<dyn CommandContext>,
    on_changed: Rc<dyn Fn()>,
    toggled: Channel<AutoRefreshToggled>,
    subscription: Option<Subscription>,
    enabled: bool,
    workspace_enabled: bool,
}

impl AutoRefresh {
    pub fn new(
        state: Rc<dyn ConfigStore>,
        repositories: Rc<dyn RepositoryProvider>,
        command_context: Rc<dyn CommandContext>,
        toggled: Channel<AutoRefreshToggled>,
        on_changed: Rc<dyn Fn()>,
    ) -> Self {
        Self {
            state,
            repositories,
            command_context,
            on_changed,
            toggled,
            subscription: None,
            enabled: false,
            workspace_enabled: true,
        }
    }

    /// Returns true when `workspace_enabled` was given and differs from the
    /// persisted flag; only then is `AutoRefreshToggled` published.
    ///
    /// A store failure leaves the controller untouched.
    pub fn set(&mut self, enabled: bool, workspace_enabled: Option<bool>) -> Result<bool> {
        let persisted = self
            .state
            .get::<bool>(keys::WORKSPACE_AUTO_REFRESH)?
            .unwrap_or(true);

        let mut toggled = false;
        let workspace = if enabled {
            match workspace_enabled {
                Some(value) => {
                    self.state.set(keys::WORKSPACE_AUTO_REFRESH, &value)?;
                    toggled = value != persisted;
                    value
                }
                None => persisted,
            }
        } else {
            persisted
        };

        self.release();
        if enabled && workspace {
            let on_changed = Rc::clone(&self.on_changed);
            self.subscription = Some(
                self.repositories
                    .on_did_change_repositories()
                    .subscribe(move |_| on_changed()),
            );
        }

        self.enabled = enabled;
        self.workspace_enabled = workspace;
        self.command_context
            .set_context(AUTO_REFRESH_CONTEXT, Value::Bool(self.is_active()));

        if toggled {
            tracing::info!(enabled = workspace, "workspace auto-refresh toggled");
            self.toggled.publish(&AutoRefreshToggled { enabled: workspace });
        }
        Ok(toggled)
    }

    pub fn is_active(&self) -> bool {
        self.enabled && self.workspace_enabled
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn release(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.dispose();
        }
    }
}
