mod change_image;

pub use self::change_image::ChangeImageAction;

use crate::{Str, resource::Gvk, resource::Resource};

/// A hook invoked by the restore host for every item it restores.
///
/// The host drives the callback: it deserializes the item, consults
/// `applies_to`, and hands matching items to `execute` one at a time.
pub trait RestoreItemAction {
    /// The name this action registers under with the host.
    fn name(&self) -> &'static str;

    fn applies_to(&self) -> ResourceSelector;

    fn execute(&mut self, input: ExecuteInput) -> anyhow::Result<ExecuteOutput>;

    /// Progress of a long-running operation started by `execute`. Actions
    /// that finish their work inside `execute` report completed.
    fn progress(&mut self, _operation_id: &str) -> anyhow::Result<OperationProgress> {
        Ok(OperationProgress::completed())
    }

    fn cancel(&mut self, _operation_id: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Which resources an action should be invoked for, by lowercase plural
/// resource name. A zero-valued selector matches all resources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceSelector {
    pub included_resources: Vec<Str>,
    pub excluded_resources: Vec<Str>,
}

impl ResourceSelector {
    pub fn selects(&self, gvk: &Gvk) -> bool {
        let resource = plural(&gvk.kind);
        if self.excluded_resources.iter().any(|r| *r == resource) {
            return false;
        }

        self.included_resources.is_empty()
            || self.included_resources.iter().any(|r| *r == resource)
    }
}

fn plural(kind: &str) -> Str {
    let mut resource = Str::new(kind.to_lowercase());
    resource.push('s');
    resource
}

#[derive(Debug, Clone)]
pub struct ExecuteInput {
    pub item: Resource,
}

#[derive(Debug, Clone)]
pub struct ExecuteOutput {
    pub item: Resource,
}

impl ExecuteOutput {
    pub fn new(item: Resource) -> Self {
        ExecuteOutput { item }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationProgress {
    pub completed: bool,
}

impl OperationProgress {
    pub fn completed() -> Self {
        OperationProgress { completed: true }
    }
}
