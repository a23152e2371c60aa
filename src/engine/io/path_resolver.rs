use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::constants::{RESOURCE_EXTENSION, TEMP_EXTENSION};

/// Maps collection and resource names onto paths under the root directory.
///
/// Nothing here touches the filesystem, names are not validated either. That
/// is left to the store so it can refuse bad input before any I/O happens.
#[derive(Clone, Debug)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl AsRef<Path>) -> PathResolver {
        PathResolver {
            root: Self::clean(root.as_ref()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_dir(&self, collection: &str) -> PathBuf {
        self.root.join(collection)
    }

    pub fn resource_path(&self, collection: &str, resource: &str) -> PathBuf {
        self.collection_dir(collection)
            .join(Self::resource_file_name(resource))
    }

    /// Sibling of the resource file that writes land in before being renamed into place
    pub fn temp_path(&self, collection: &str, resource: &str) -> PathBuf {
        let mut file_name = Self::resource_file_name(resource);
        file_name.push(".");
        file_name.push(TEMP_EXTENSION);
        self.collection_dir(collection).join(file_name)
    }

    /// True for names produced by `temp_path`
    pub fn is_temp_file(file_name: &str) -> bool {
        let suffix = format!(".{0}.{1}", RESOURCE_EXTENSION, TEMP_EXTENSION);
        file_name.len() > suffix.len() && file_name.ends_with(&suffix)
    }

    fn resource_file_name(resource: &str) -> OsString {
        OsString::from(format!("{0}.{1}", resource, RESOURCE_EXTENSION))
    }

    /// Purely lexical cleanup of the root, the path does not have to exist yet.
    fn clean(raw: &Path) -> PathBuf {
        let mut parts: Vec<Component> = vec![];
        for c in raw.components() {
            match c {
                Component::CurDir => {}
                Component::ParentDir => match parts.last().copied() {
                    Some(Component::Normal(_)) => {
                        parts.pop();
                    }
                    //Can't go above the root
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                    _ => parts.push(c),
                },
                _ => parts.push(c),
            }
        }

        let cleaned: PathBuf = parts.iter().collect();
        if cleaned.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            cleaned
        }
    }
}
