use std::io::Write;

use anyhow::Context;
use serde::Deserialize;

use crate::{
    action::{ChangeImageAction, ExecuteInput, RestoreItemAction},
    resource::Resource,
};

pub mod action;
pub mod fieldspec;
pub mod image;
pub mod resource;

pub(crate) mod serde_ex;

pub type Str = compact_str::CompactString;

/// Runs the restore-time image rewrite over a multi-document manifest
/// stream, writing the resulting stream to `out`.
///
/// Documents outside the action's selector pass through untouched. This is
/// the same path the host drives one item at a time, applied to a whole
/// stream for the CLI harness and tests.
pub fn restore_manifests(input: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let mut action = ChangeImageAction;
    let selector = action.applies_to();

    let mut first = true;
    for doc in serde_yaml::Deserializer::from_str(input) {
        let resource = Resource::deserialize(doc).context("parsing manifest document")?;

        let resource = if selector.selects(resource.gvk()) {
            let id = resource.id().clone();
            action
                .execute(ExecuteInput { item: resource })
                .with_context(|| format!("applying restore action to `{id}`"))?
                .item
        } else {
            resource
        };

        if !first {
            writeln!(out, "---")?;
        }
        first = false;

        serde_yaml::to_writer(&mut *out, &resource)?;
    }

    Ok(())
}
