use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::Once;

use flowtag::error::CliError;
use flowtag::git::{CommitRange, CommitSummary, Revision, TagRepository};
use flowtag::input::Prompter;

#[allow(dead_code)]
static INIT: Once = Once::new();

#[allow(dead_code)]
pub fn setup_test_env() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"))
            .is_test(true)
            .init();
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTag {
    pub name: String,
    pub message: String,
    pub target: Revision,
}

#[derive(Default)]
struct FakeState {
    head: Option<Revision>,
    branch: String,
    refs: HashMap<String, Revision>,
    // oldest first; doubles as history order
    tags: Vec<(String, Revision)>,
    created: Vec<CreatedTag>,
    pushes: Vec<(String, String)>,
    fetches: Vec<String>,
    reject_push: bool,
}

/// In-memory tag repository. Tags created later are newer in history.
#[allow(dead_code)]
pub struct FakeRepository {
    state: RefCell<FakeState>,
}

#[allow(dead_code)]
impl FakeRepository {
    pub fn new(head: &str) -> Self {
        FakeRepository {
            state: RefCell::new(FakeState {
                head: Some(Revision::new(head)),
                branch: "master".to_string(),
                ..Default::default()
            }),
        }
    }

    pub fn with_tag(self, name: &str, revision: &str) -> Self {
        self.state
            .borrow_mut()
            .tags
            .push((name.to_string(), Revision::new(revision)));
        self
    }

    pub fn with_ref(self, name: &str, revision: &str) -> Self {
        self.state
            .borrow_mut()
            .refs
            .insert(name.to_string(), Revision::new(revision));
        self
    }

    pub fn rejecting_pushes(self) -> Self {
        self.state.borrow_mut().reject_push = true;
        self
    }

    pub fn set_head(&self, revision: &str) {
        self.state.borrow_mut().head = Some(Revision::new(revision));
    }

    pub fn created(&self) -> Vec<CreatedTag> {
        self.state.borrow().created.clone()
    }

    pub fn pushes(&self) -> Vec<(String, String)> {
        self.state.borrow().pushes.clone()
    }

    pub fn fetches(&self) -> Vec<String> {
        self.state.borrow().fetches.clone()
    }
}

impl TagRepository for FakeRepository {
    fn find_latest_tag(&self, pattern: &str) -> Result<Option<String>, CliError> {
        let pattern = glob::Pattern::new(pattern).map_err(|e| CliError::Generic(e.to_string()))?;
        Ok(self
            .state
            .borrow()
            .tags
            .iter()
            .rev()
            .find(|(name, _)| pattern.matches(name))
            .map(|(name, _)| name.clone()))
    }

    fn list_tags(&self, pattern: &str) -> Result<Vec<String>, CliError> {
        let pattern = glob::Pattern::new(pattern).map_err(|e| CliError::Generic(e.to_string()))?;
        Ok(self
            .state
            .borrow()
            .tags
            .iter()
            .filter(|(name, _)| pattern.matches(name))
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn resolve(&self, refname: &str) -> Result<Revision, CliError> {
        let state = self.state.borrow();
        if refname == "HEAD" {
            return state
                .head
                .clone()
                .ok_or_else(|| CliError::UnknownRef(refname.to_string()));
        }
        if refname == state.branch {
            if let Some(head) = &state.head {
                return Ok(head.clone());
            }
        }
        state
            .tags
            .iter()
            .find(|(name, _)| name == refname)
            .map(|(_, revision)| revision.clone())
            .or_else(|| state.refs.get(refname).cloned())
            .ok_or_else(|| CliError::UnknownRef(refname.to_string()))
    }

    fn create_tag(&self, name: &str, message: &str, target: &Revision) -> Result<(), CliError> {
        let mut state = self.state.borrow_mut();
        if state.tags.iter().any(|(existing, _)| existing == name) {
            return Err(CliError::TagAlreadyExists(name.to_string()));
        }
        state.tags.push((name.to_string(), target.clone()));
        state.created.push(CreatedTag {
            name: name.to_string(),
            message: message.to_string(),
            target: target.clone(),
        });
        Ok(())
    }

    fn push_tags(&self, remote: &str, branch: &str) -> Result<(), CliError> {
        let mut state = self.state.borrow_mut();
        if state.reject_push {
            return Err(CliError::PushRejected {
                remote: remote.to_string(),
                reason: "rejected by fake".to_string(),
            });
        }
        state.pushes.push((remote.to_string(), branch.to_string()));
        Ok(())
    }

    fn fetch(&self, remote: &str) -> Result<(), CliError> {
        self.state.borrow_mut().fetches.push(remote.to_string());
        Ok(())
    }

    fn remote_url(&self, _remote: &str) -> Result<Option<String>, CliError> {
        Ok(None)
    }

    fn current_branch(&self) -> Result<String, CliError> {
        Ok(self.state.borrow().branch.clone())
    }

    fn commits_between(&self, _range: &CommitRange) -> Result<Vec<CommitSummary>, CliError> {
        Ok(Vec::new())
    }
}

/// Prompter answering from a script. Unscripted confirmations take their default.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<bool>>,
    descriptions: RefCell<VecDeque<String>>,
    asked: RefCell<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(self, answer: bool) -> Self {
        self.answers.borrow_mut().push_back(answer);
        self
    }

    pub fn describing(self, description: &str) -> Self {
        self.descriptions
            .borrow_mut()
            .push_back(description.to_string());
        self
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str, default: bool) -> Result<bool, CliError> {
        self.asked.borrow_mut().push(message.to_string());
        Ok(self.answers.borrow_mut().pop_front().unwrap_or(default))
    }

    fn describe_release(&self, message: &str) -> Result<String, CliError> {
        self.asked.borrow_mut().push(message.to_string());
        self.descriptions
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| CliError::InputError("no description scripted".to_string()))
    }
}
