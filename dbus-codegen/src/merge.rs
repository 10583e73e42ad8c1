use crate::{Error, Interface, MergePolicy, Options, Result};

/// Combines the interfaces of several documents, resolving interfaces with the same name
/// according to `options.merge`. Interfaces keep the order in which their name was first seen.
pub fn merge<I>(documents: I, options: &Options) -> Result<Vec<Interface>>
where
    I: IntoIterator<Item = Vec<Interface>>,
{
    let mut merged: Vec<Interface> = vec![];

    for interface in documents.into_iter().flatten() {
        let existing = merged.iter().position(|x| x.name == interface.name);
        match (existing, options.merge) {
            (None, _) => merged.push(interface),
            (Some(_), MergePolicy::Reject) => {
                return Err(Error::DuplicateInterface(interface.name));
            }
            (Some(_), MergePolicy::KeepFirst) => {
                tracing::debug!(interface = %interface.name, "ignoring duplicate interface");
            }
            (Some(index), MergePolicy::KeepLast) => {
                tracing::debug!(interface = %interface.name, "replacing duplicate interface");
                merged[index] = interface;
            }
        }
    }

    Ok(merged)
}
