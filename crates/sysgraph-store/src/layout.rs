// SPDX-License-Identifier: Apache-2.0
//! The on-disk record layout: `graph.pb`, `rdb.pb`, `a/<id>.pb`, and the
//! optional `a/<id>_raw_events.pbdelim` sidecar.
//!
//! Binary form (bincode over the canonical record types) is authoritative;
//! JSON counterparts are optional auxiliary output, written only when asked
//! for, and must never be consulted by id-listing code.

use sysgraph_model::{Action, ResourceDb, SysGraphHeader};

use crate::error::StoreError;
use crate::fs::Filesystem;

fn join(subdir: &str, name: &str) -> String {
    if subdir.is_empty() {
        name.to_string()
    } else {
        format!("{subdir}/{name}")
    }
}

fn bincode_err(path: &str, source: bincode::Error) -> StoreError {
    StoreError::Bincode {
        path: path.into(),
        source,
    }
}

/// Write the full graph (header, resource DB, every action) under `subdir`
/// (empty for the root of a flat graph).
pub fn write_graph(
    fsys: &dyn Filesystem,
    subdir: &str,
    header: &SysGraphHeader,
    rdb: &ResourceDb,
    actions: &[Action],
    write_json_aux: bool,
) -> Result<(), StoreError> {
    fsys.mkdir_all(&join(subdir, "a"))?;

    let rdb_path = join(subdir, "rdb.pb");
    let rdb_bytes = bincode::serialize(rdb).map_err(|e| bincode_err(&rdb_path, e))?;
    fsys.write_file(&rdb_path, &rdb_bytes)?;

    let header_path = join(subdir, "graph.pb");
    let header_bytes = bincode::serialize(header).map_err(|e| bincode_err(&header_path, e))?;
    fsys.write_file(&header_path, &header_bytes)?;

    for action in actions {
        let action_path = join(subdir, &format!("a/{}.pb", action.id));
        let bytes = bincode::serialize(action).map_err(|e| bincode_err(&action_path, e))?;
        fsys.write_file(&action_path, &bytes)?;
    }

    if write_json_aux {
        let header_json = join(subdir, "graph.jsonl");
        fsys.write_file(
            &header_json,
            &serde_json::to_vec(header).map_err(|source| StoreError::Json {
                path: header_json.clone().into(),
                source,
            })?,
        )?;
        let rdb_json = join(subdir, "rdb.jsonl");
        fsys.write_file(
            &rdb_json,
            &serde_json::to_vec(rdb).map_err(|source| StoreError::Json {
                path: rdb_json.clone().into(),
                source,
            })?,
        )?;
    }

    Ok(())
}

/// Read the header at `subdir` (empty for the graph root).
pub fn read_header(fsys: &dyn Filesystem, subdir: &str) -> Result<SysGraphHeader, StoreError> {
    let path = join(subdir, "graph.pb");
    let bytes = fsys.read_file(&path)?;
    bincode::deserialize(&bytes).map_err(|e| bincode_err(&path, e))
}

/// Read the resource DB at `subdir`.
pub fn read_rdb(fsys: &dyn Filesystem, subdir: &str) -> Result<ResourceDb, StoreError> {
    let path = join(subdir, "rdb.pb");
    let bytes = fsys.read_file(&path)?;
    bincode::deserialize(&bytes).map_err(|e| bincode_err(&path, e))
}

/// Read one action record by its local (within-`subdir`) id.
pub fn read_action(fsys: &dyn Filesystem, subdir: &str, local_id: i64) -> Result<Action, StoreError> {
    let path = join(subdir, &format!("a/{local_id}.pb"));
    if !fsys.exists(&path)? {
        return Err(StoreError::ActionNotFound(local_id));
    }
    let bytes = fsys.read_file(&path)?;
    bincode::deserialize(&bytes).map_err(|e| bincode_err(&path, e))
}

/// Count action records present at `subdir` — files named `<id>.pb` under
/// `<subdir>/a`, excluding `_raw_events` sidecars.
pub fn count_actions(fsys: &dyn Filesystem, subdir: &str) -> Result<usize, StoreError> {
    let names = fsys.list_dir(&join(subdir, "a"))?;
    Ok(names
        .iter()
        .filter(|n| n.ends_with(".pb") && !n.contains("_raw_events"))
        .count())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fs::DirFilesystem;
    use sysgraph_model::Action;

    #[test]
    fn write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let fsys = DirFilesystem::new(dir.path());
        let header = SysGraphHeader::new("g1");
        let rdb = ResourceDb::new();
        let actions = vec![Action::new(1, "g1"), Action::new(2, "g1")];
        write_graph(&fsys, "", &header, &rdb, &actions, false).unwrap();

        let back_header = read_header(&fsys, "").unwrap();
        assert_eq!(back_header.id, "g1");
        let back_action = read_action(&fsys, "", 1).unwrap();
        assert_eq!(back_action.id, 1);
        assert_eq!(count_actions(&fsys, "").unwrap(), 2);
    }

    #[test]
    fn missing_action_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fsys = DirFilesystem::new(dir.path());
        let err = read_action(&fsys, "", 5).unwrap_err();
        assert!(matches!(err, StoreError::ActionNotFound(5)));
    }
}
