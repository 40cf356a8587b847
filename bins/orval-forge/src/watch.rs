//! Watch mode: regenerate when the config file or a local input changes

use crate::commands::generate::generate_once;
use anyhow::{anyhow, Result};
use forge_cli::{print_error, Status};
use forge_generator::{ForgeConfig, GeneratorOptions, LoadedConfig, Orchestrator};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;
use tracing::{debug, warn};

/// Quiet period that folds editor save bursts into one regeneration
const DEBOUNCE: Duration = Duration::from_millis(300);

/// Regenerate, then block until a watched file changes; repeat until interrupted
pub fn run(config_path: &Path, cwd: &Path, options: &GeneratorOptions) -> Result<()> {
    loop {
        let config = regenerate(config_path, cwd, options);
        let files = watched_files(config_path, cwd, config.as_ref());

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx)?;
        for dir in watched_dirs(&files, cwd) {
            debug!(dir = %dir.display(), "Watching directory");
            watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        }

        Status::info("Watching for changes (Ctrl+C to stop)");
        let changed = wait_for_change(&rx, &files)?;
        Status::info(&format!("{} changed, regenerating", changed.display()));
    }
}

/// One watch cycle; errors are printed and the loop keeps going
fn regenerate(config_path: &Path, cwd: &Path, options: &GeneratorOptions) -> Option<ForgeConfig> {
    let loaded = match LoadedConfig::load(Some(config_path), cwd) {
        Ok(loaded) => loaded,
        Err(e) => {
            print_error(&e);
            return None;
        }
    };

    let orchestrator = Orchestrator::new(loaded.config.clone(), options.clone());
    if let Err(e) = generate_once(&orchestrator) {
        match e.downcast_ref::<forge_core::Error>() {
            Some(coded) => print_error(coded),
            None => Status::error(&format!("{e:#}")),
        }
    }
    Some(loaded.config)
}

/// Config file plus every local string input of `config`
fn watched_files(config_path: &Path, cwd: &Path, config: Option<&ForgeConfig>) -> Vec<PathBuf> {
    let mut files = vec![config_path.to_path_buf()];

    let inputs = config
        .and_then(|c| c.orval.as_ref())
        .into_iter()
        .flat_map(|entries| entries.values())
        .filter_map(|entry| entry.input_str())
        .filter(|input| !input.contains("://") && !input.trim().is_empty());

    for input in inputs {
        let path = Path::new(input);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };
        if !files.contains(&path) {
            files.push(path);
        }
    }
    files
}

fn watched_dirs(files: &[PathBuf], cwd: &Path) -> BTreeSet<PathBuf> {
    files
        .iter()
        .map(|file| match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && parent.is_dir() => {
                parent.to_path_buf()
            }
            _ => cwd.to_path_buf(),
        })
        .collect()
}

fn wait_for_change(rx: &Receiver<notify::Result<Event>>, files: &[PathBuf]) -> Result<PathBuf> {
    let changed = loop {
        match rx.recv() {
            Ok(Ok(event)) => {
                if let Some(path) = relevant_path(&event, files) {
                    break path;
                }
            }
            Ok(Err(e)) => warn!(error = %e, "Watch error"),
            Err(_) => return Err(anyhow!("File watcher stopped unexpectedly")),
        }
    };

    while rx.recv_timeout(DEBOUNCE).is_ok() {}
    Ok(changed)
}

/// Watched file touched by `event`, ignoring read-only access
fn relevant_path(event: &Event, files: &[PathBuf]) -> Option<PathBuf> {
    if matches!(event.kind, EventKind::Access(_)) {
        return None;
    }

    event
        .paths
        .iter()
        .find(|path| files.iter().any(|file| same_file(file, path)))
        .cloned()
}

/// Event paths may be canonicalized, so a file name match is enough
fn same_file(watched: &Path, changed: &Path) -> bool {
    watched == changed
        || watched
            .file_name()
            .is_some_and(|name| Some(name) == changed.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    fn config(json: &str) -> ForgeConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_watched_files_skip_urls() {
        let config = config(
            r#"{
                "orval": {
                    "local": { "input": "./specs/openapi.yaml", "output": { "target": "a.ts" } },
                    "remote": { "input": "https://example.com/openapi.json", "output": { "target": "b.ts" } },
                    "inline": { "input": { "target": "./other.yaml" }, "output": { "target": "c.ts" } }
                }
            }"#,
        );

        let files = watched_files(
            Path::new("/work/orval-forge.config.json"),
            Path::new("/work"),
            Some(&config),
        );

        assert_eq!(
            files,
            vec![
                PathBuf::from("/work/orval-forge.config.json"),
                PathBuf::from("/work/./specs/openapi.yaml"),
            ]
        );
    }

    #[test]
    fn test_watched_files_without_config() {
        let files = watched_files(Path::new("/work/forge.json"), Path::new("/work"), None);
        assert_eq!(files, vec![PathBuf::from("/work/forge.json")]);
    }

    #[test]
    fn test_watched_dirs_fall_back_to_cwd() {
        let dir = tempfile::TempDir::new().unwrap();
        let files = vec![
            dir.path().join("orval-forge.config.json"),
            dir.path().join("openapi.yaml"),
            PathBuf::from("/definitely/not/here/spec.yaml"),
        ];

        let dirs = watched_dirs(&files, Path::new("/cwd"));

        assert_eq!(
            dirs,
            BTreeSet::from([dir.path().to_path_buf(), PathBuf::from("/cwd")])
        );
    }

    #[test]
    fn test_relevant_path() {
        let files = vec![PathBuf::from("/work/orval-forge.config.json")];

        let modify = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/work/orval-forge.config.json"));
        assert_eq!(
            relevant_path(&modify, &files),
            Some(PathBuf::from("/work/orval-forge.config.json"))
        );

        let access = Event::new(EventKind::Access(AccessKind::Any))
            .add_path(PathBuf::from("/work/orval-forge.config.json"));
        assert_eq!(relevant_path(&access, &files), None);

        let unrelated = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/work/notes.md"));
        assert_eq!(relevant_path(&unrelated, &files), None);
    }
}
