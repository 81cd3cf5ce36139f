use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use plugins::VariableKey;
use serde::{Deserialize, Serialize};

const SAVE_FILE_VERSION: u32 = 1;

/// The harness's whole save blob: the host-side counters plus one JSON value
/// per stateful plugin, keyed by the plugin's save key.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SaveFile {
    pub(crate) save_version: u32,
    pub(crate) variables: HashMap<u32, i32>,
    pub(crate) plugins: serde_json::Map<String, serde_json::Value>,
}

impl SaveFile {
    pub(crate) fn new(
        variables: &HashMap<VariableKey, i32>,
        plugins: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            save_version: SAVE_FILE_VERSION,
            variables: variables.iter().map(|(key, value)| (key.0, *value)).collect(),
            plugins,
        }
    }

    pub(crate) fn variables(&self) -> HashMap<VariableKey, i32> {
        self.variables
            .iter()
            .map(|(key, value)| (VariableKey(*key), *value))
            .collect()
    }
}

pub(crate) fn write_save(path: &Path, save: &SaveFile) -> Result<(), String> {
    let json = serde_json::to_string_pretty(save)
        .map_err(|error| format!("encode save json: {error}"))?;
    write_text_atomic(path, &json)
        .map_err(|error| format!("write save '{}': {error}", path.display()))
}

pub(crate) fn read_save(path: &Path) -> Result<SaveFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("read save '{}': {error}", path.display()))?;
    let save: SaveFile =
        serde_json::from_str(&raw).map_err(|error| format!("parse save json: {error}"))?;
    if save.save_version != SAVE_FILE_VERSION {
        return Err(format!(
            "save version mismatch: expected {SAVE_FILE_VERSION}, got {}",
            save.save_version
        ));
    }
    Ok(save)
}

fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, text)?;
    replace_file(&tmp_path, path)
}

fn replace_file(tmp_path: &Path, final_path: &Path) -> io::Result<()> {
    match fs::remove_file(final_path) {
        Ok(_) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            let _ = fs::remove_file(tmp_path);
            return Err(error);
        }
    }

    if let Err(error) = fs::rename(tmp_path, final_path) {
        let _ = fs::remove_file(tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("sandbox.save");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_file_roundtrips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("saves").join("slot1.json");

        let mut variables = HashMap::new();
        variables.insert(VariableKey(7), 3);
        let mut plugins = serde_json::Map::new();
        plugins.insert("journal".to_string(), json!({ "save_version": 1 }));

        write_save(&path, &SaveFile::new(&variables, plugins.clone())).expect("write");
        let restored = read_save(&path).expect("read");
        assert_eq!(restored.variables(), variables);
        assert_eq!(restored.plugins, plugins);
    }

    #[test]
    fn overwriting_replaces_the_previous_save() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("slot1.json");
        let empty = HashMap::new();

        write_save(&path, &SaveFile::new(&empty, serde_json::Map::new())).expect("first");
        let mut plugins = serde_json::Map::new();
        plugins.insert("journal".to_string(), json!({}));
        write_save(&path, &SaveFile::new(&empty, plugins)).expect("second");

        let restored = read_save(&path).expect("read");
        assert!(restored.plugins.contains_key("journal"));
    }

    #[test]
    fn unreadable_save_reports_the_path() {
        let error = read_save(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(error.contains("not/here.json"));
    }
}
