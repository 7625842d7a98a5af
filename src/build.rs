use std::{
    fs,
    path::{Path, PathBuf},
    sync::mpsc,
    time::Duration,
};

use anyhow::{Context, Result};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use tracing::{error, info, warn};

use crate::{entity::Folio, error::FolioError, FolioEngine, FOLIO_FILE};

/// Build the site once.
pub fn build<P: AsRef<Path>>(source: P, dest: P) -> Result<()> {
    watch_build(source, dest, false)
}

/// Build the site, then rebuild on every change below the source root if `watch`.
pub fn watch_build<P: AsRef<Path>>(source: P, dest: P, watch: bool) -> Result<()> {
    // Use folio.toml to find root path
    let (source, folio) = locate_root_folio_folder(fs::canonicalize(source)?)?
        .with_context(|| format!("Failed to find the root {FOLIO_FILE} file"))?;

    let mut engine = FolioEngine::new(source, dest, folio)?;
    engine.build(false)?;

    if watch {
        // Our own output must not trigger another build.
        let dest = fs::canonicalize(&engine.dest)?;
        info!("Watching `{}`...", engine.source.display());

        let (tx, rx) = mpsc::channel();
        let mut debouncer = new_debouncer(Duration::from_millis(500), None, tx)?;
        debouncer
            .watcher()
            .watch(&engine.source, RecursiveMode::Recursive)?;

        for result in rx {
            match result {
                Ok(events) => {
                    if events.iter().all(|event| event.path.starts_with(&dest)) {
                        continue;
                    }
                    if let Err(err) = engine.build(true) {
                        error!("Build error: {err:?}");
                    }
                }
                Err(errors) => warn!("Watch error: {errors:?}"),
            }
        }
    }
    Ok(())
}

// Locate folder contains the root `folio.toml`, and return path info and Folio instance.
fn locate_root_folio_folder(path: PathBuf) -> Result<Option<(PathBuf, Folio)>> {
    if path.join(FOLIO_FILE).is_file() {
        match Folio::parse_from_toml(&path) {
            Ok(folio) => return Ok(Some((path, folio))),
            Err(err) => match err.downcast::<FolioError>() {
                // Found a folio.toml, but it isn't a root folio.toml
                Ok(FolioError::NotRootTomlFile) => {}
                Ok(inner_err) => return Err(inner_err.into()),
                Err(err) => return Err(err),
            },
        }
    }

    match path.parent() {
        Some(parent_path) => locate_root_folio_folder(parent_path.to_path_buf()),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_root_folder_from_sub_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let nested = root.join("content").join("posts");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            root.join(FOLIO_FILE),
            "[site]\nwebsite = \"https://example.com\"\ntitle = \"Root\"",
        )
        .unwrap();
        // A non-root folio.toml on the way up is skipped.
        fs::write(nested.join(FOLIO_FILE), "title = \"nested\"").unwrap();

        let (found, folio) = locate_root_folio_folder(nested).unwrap().unwrap();
        assert_eq!(found, root);
        assert_eq!(folio.site.title, "Root");
    }
}
