//! Fake collaborators for tree view tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::config::{ConfigChange, ConfigStore, JsonStore};
use crate::error::{Error, Result};
use crate::event::Channel;
use crate::provider::{
    CommandContext, CommitSummary, Repository, RepositoriesChanged, RepositoryChanged, RepositoryProvider,
};

use super::view::{TreeView, ViewContext};

pub fn commit(sha: &str, subject: &str) -> CommitSummary {
    CommitSummary {
        sha: sha.to_string(),
        author_name: "Alice".to_string(),
        author_date: 1_700_000_000,
        subject: subject.to_string(),
    }
}

pub struct FakeRepositories {
    pub repositories: RefCell<Vec<Repository>>,
    pub histories: RefCell<HashMap<(String, Option<String>), Vec<CommitSummary>>>,
    pub fail: Cell<bool>,
    pub repositories_calls: Cell<usize>,
    pub repositories_changed: Channel<RepositoriesChanged>,
    pub repository_changed: Channel<RepositoryChanged>,
}

impl FakeRepositories {
    pub fn new(paths: &[&str]) -> Self {
        Self {
            repositories: RefCell::new(paths.iter().map(|p| Repository::new(*p)).collect()),
            histories: RefCell::new(HashMap::new()),
            fail: Cell::new(false),
            repositories_calls: Cell::new(0),
            repositories_changed: Channel::new(),
            repository_changed: Channel::new(),
        }
    }

    pub fn set_history(&self, repo: &str, path: Option<&str>, commits: Vec<CommitSummary>) {
        self.histories
            .borrow_mut()
            .insert((repo.to_string(), path.map(str::to_string)), commits);
    }

    pub fn set_repositories(&self, paths: &[&str]) {
        *self.repositories.borrow_mut() = paths.iter().map(|p| Repository::new(*p)).collect();
    }

    fn check(&self) -> Result<()> {
        if self.fail.get() {
            Err(Error::Provider("git exited with status 128".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RepositoryProvider for FakeRepositories {
    fn repositories(&self) -> Result<Vec<Repository>> {
        self.check()?;
        self.repositories_calls.set(self.repositories_calls.get() + 1);
        Ok(self.repositories.borrow().clone())
    }

    fn repository(&self, uri: &str) -> Result<Option<Repository>> {
        self.check()?;
        Ok(self
            .repositories
            .borrow()
            .iter()
            .find(|r| r.relative_path(uri).is_some())
            .cloned())
    }

    fn is_trackable(&self, uri: &str) -> bool {
        self.repositories
            .borrow()
            .iter()
            .any(|r| r.relative_path(uri).is_some())
    }

    fn history(&self, repo: &Repository, path: Option<&str>) -> Result<Vec<CommitSummary>> {
        self.check()?;
        Ok(self
            .histories
            .borrow()
            .get(&(repo.path.clone(), path.map(str::to_string)))
            .cloned()
            .unwrap_or_default())
    }

    fn on_did_change_repositories(&self) -> &Channel<RepositoriesChanged> {
        &self.repositories_changed
    }

    fn on_did_change_repository(&self) -> &Channel<RepositoryChanged> {
        &self.repository_changed
    }
}

/// `JsonStore` that returns errors while `fail` is set.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: JsonStore,
    pub fail: Cell<bool>,
}

impl FlakyStore {
    fn check(&self, path: &str) -> Result<()> {
        if self.fail.get() {
            Err(Error::Config {
                path: path.to_string(),
                message: "storage unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl ConfigStore for FlakyStore {
    fn value(&self, path: &str) -> Result<Option<Value>> {
        self.check(path)?;
        self.inner.value(path)
    }

    fn update(&self, path: &str, value: Value) -> Result<()> {
        self.check(path)?;
        self.inner.update(path, value)
    }

    fn on_did_change(&self) -> &Channel<ConfigChange> {
        self.inner.on_did_change()
    }
}

#[derive(Default)]
pub struct RecordingContext {
    pub values: RefCell<HashMap<String, Value>>,
}

impl RecordingContext {
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }
}

impl CommandContext for RecordingContext {
    fn set_context(&self, key: &str, value: Value) {
        self.values.borrow_mut().insert(key.to_string(), value);
    }
}

pub struct Harness {
    pub view: TreeView,
    pub repos: Rc<FakeRepositories>,
    pub config: Rc<JsonStore>,
    pub state: Rc<JsonStore>,
    pub context: Rc<RecordingContext>,
}

impl Harness {
    pub fn new(paths: &[&str], config: &str) -> Self {
        let repos = Rc::new(FakeRepositories::new(paths));
        let config = Rc::new(JsonStore::from_json(config).expect("test config"));
        let state = Rc::new(JsonStore::new());
        let context = Rc::new(RecordingContext::default());

        let view = TreeView::new(ViewContext {
            config: Rc::clone(&config) as Rc<dyn ConfigStore>,
            state: Rc::clone(&state) as Rc<dyn ConfigStore>,
            repositories: Rc::clone(&repos) as Rc<dyn RepositoryProvider>,
            command_context: Rc::clone(&context) as Rc<dyn CommandContext>,
        });

        Self {
            view,
            repos,
            config,
            state,
            context,
        }
    }

    pub fn started(paths: &[&str], config: &str) -> Self {
        let mut harness = Self::new(paths, config);
        harness.view.init().expect("init");
        harness
    }
}
