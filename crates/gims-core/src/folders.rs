//! Folder hierarchy flattening.
//!
//! GIMS returns folders as a flat list with parent references. Paths are
//! derived: a root folder is `/name`, a nested folder is `parent/name`.

use std::collections::{HashMap, HashSet};

use crate::error::{GimsError, Result};
use crate::model::Folder;

/// Map every folder id to its full path.
///
/// A parent id that is not in the list contributes an empty prefix, so the
/// child renders as `/name`. A parent id of `0` means "no parent".
pub fn build_folder_paths(folders: &[Folder]) -> Result<HashMap<i64, String>> {
    let by_id: HashMap<i64, &Folder> = folders.iter().map(|f| (f.id, f)).collect();
    let mut paths = HashMap::with_capacity(folders.len());
    let mut visiting = HashSet::new();

    for folder in folders {
        resolve(folder.id, &by_id, &mut paths, &mut visiting)?;
    }
    Ok(paths)
}

fn resolve(
    id: i64,
    by_id: &HashMap<i64, &Folder>,
    paths: &mut HashMap<i64, String>,
    visiting: &mut HashSet<i64>,
) -> Result<String> {
    if let Some(path) = paths.get(&id) {
        return Ok(path.clone());
    }
    let Some(folder) = by_id.get(&id) else {
        return Ok(String::new());
    };
    if !visiting.insert(id) {
        return Err(GimsError::FolderCycle { folder_id: id });
    }

    let path = match folder.parent_folder_id {
        Some(parent) if parent != 0 => {
            let parent_path = resolve(parent, by_id, paths, visiting)?;
            format!("{parent_path}/{}", folder.name)
        }
        _ => format!("/{}", folder.name),
    };

    visiting.remove(&id);
    paths.insert(id, path.clone());
    Ok(path)
}

/// Path for an optional folder reference; unfiled components live at `/`.
pub fn path_of(paths: &HashMap<i64, String>, folder_id: Option<i64>) -> String {
    folder_id
        .and_then(|id| paths.get(&id).cloned())
        .unwrap_or_else(|| "/".to_string())
}

/// First folder with exactly this name.
pub fn find_by_name<'a>(folders: &'a [Folder], name: &str) -> Option<&'a Folder> {
    folders.iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: i64, name: &str, parent: Option<i64>) -> Folder {
        Folder {
            id,
            name: name.to_string(),
            parent_folder_id: parent,
        }
    }

    #[test]
    fn nested_paths_concatenate_ancestors() {
        let folders = vec![
            folder(3, "SNMP_Rules_v1.2", Some(1)),
            folder(1, "default", None),
            folder(4, "deep", Some(3)),
        ];
        let paths = build_folder_paths(&folders).unwrap();
        assert_eq!(paths[&1], "/default");
        assert_eq!(paths[&3], "/default/SNMP_Rules_v1.2");
        assert_eq!(paths[&4], "/default/SNMP_Rules_v1.2/deep");
    }

    #[test]
    fn unknown_parent_gives_empty_prefix() {
        let paths = build_folder_paths(&[folder(2, "orphan", Some(99))]).unwrap();
        assert_eq!(paths[&2], "/orphan");
    }

    #[test]
    fn zero_parent_is_root() {
        let paths = build_folder_paths(&[folder(2, "top", Some(0))]).unwrap();
        assert_eq!(paths[&2], "/top");
    }

    #[test]
    fn cycle_is_reported() {
        let folders = vec![folder(1, "a", Some(2)), folder(2, "b", Some(1))];
        let err = build_folder_paths(&folders).unwrap_err();
        assert!(matches!(err, GimsError::FolderCycle { .. }));
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let err = build_folder_paths(&[folder(5, "loop", Some(5))]).unwrap_err();
        assert!(matches!(err, GimsError::FolderCycle { folder_id: 5 }));
    }

    #[test]
    fn unfiled_components_live_at_root() {
        let paths = build_folder_paths(&[folder(1, "default", None)]).unwrap();
        assert_eq!(path_of(&paths, None), "/");
        assert_eq!(path_of(&paths, Some(42)), "/");
        assert_eq!(path_of(&paths, Some(1)), "/default");
    }
}
