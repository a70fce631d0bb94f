//! Archive extraction and relocation of the minified build.
//!
//! The upstream archive nests everything under a version-named directory
//! (`ace-builds-<version>/`). Only its minified build is kept: it is copied
//! to `<target>/acemin`, after which the version directory is removed.

use crate::install::tree::{copy_tree, remove_tree, Removal};
use crate::install::{InstallError, InstallEvent, InstallRequest};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, info};
use zip::ZipArchive;

/// Minified build directories, in order of preference.
const PAYLOAD_DIRS: [&str; 2] = ["src-min-noconflict", "src-min"];

/// Where the interesting parts of an archive live, as archive-relative names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Layout {
    root: Option<String>,
    payload: Option<String>,
}

impl Layout {
    fn detect<'a>(names: impl Iterator<Item = &'a str> + Clone) -> Self {
        let mut roots = names.clone().filter_map(|name| {
            let name = name.trim_start_matches('/');
            name.split_once('/').map(|(first, _)| first)
        });
        let root = roots.next().and_then(|first| {
            if !roots.all(|other| other == first) {
                return None;
            }
            let prefix = format!("{}/", first);
            names
                .clone()
                .all(|name| {
                    let name = name.trim_start_matches('/').trim_end_matches('/');
                    name == first || name.starts_with(&prefix)
                })
                .then(|| first.to_string())
        });

        let payload = PAYLOAD_DIRS.iter().find_map(|dir| {
            let candidate = match &root {
                Some(root) => format!("{}/{}", root, dir),
                None => dir.to_string(),
            };
            let prefix = format!("{}/", candidate);
            names
                .clone()
                .any(|name| name.trim_start_matches('/').starts_with(&prefix))
                .then_some(candidate)
        });

        Self { root, payload }
    }

    /// Whether `name` falls under one of `excludes`.
    ///
    /// Each exclusion is compared against the full entry name, the name below
    /// the version root, and the name below the minified build directory.
    fn is_excluded(&self, excludes: &BTreeSet<String>, name: &str) -> bool {
        if excludes.is_empty() {
            return false;
        }

        let name = name.trim_start_matches('/').trim_end_matches('/');
        let mut forms = vec![name];
        for base in [&self.root, &self.payload].into_iter().flatten() {
            let rest = name
                .strip_prefix(base.as_str())
                .and_then(|rest| rest.strip_prefix('/'));
            if let Some(rest) = rest {
                forms.push(rest);
            }
        }

        forms.iter().any(|form| {
            excludes.iter().any(|exclude| {
                *form == exclude.as_str() || form.starts_with(&format!("{}/", exclude))
            })
        })
    }
}

/// Unpack `archive` into the target directory, move the minified build to
/// `acemin/`, and delete the archive.
pub(crate) fn run(request: &InstallRequest, archive: TempPath) -> Result<(), InstallError> {
    let notify = |event: InstallEvent| {
        if let Some(notifier) = &request.notifier {
            notifier.emit(event);
        }
    };
    let archive_path = archive.to_path_buf();
    let target = request.target_path.as_path();

    let corrupt = |reason: String| InstallError::CorruptArchive {
        path: archive_path.clone(),
        reason,
        fix: "Download the archive again; it may have been truncated".to_string(),
    };

    let file = fs::File::open(&archive_path).map_err(|e| corrupt(e.to_string()))?;
    let mut zip = ZipArchive::new(file).map_err(|e| corrupt(e.to_string()))?;
    let entries = zip.len();

    notify(InstallEvent::ExtractStarted {
        destination: target.to_path_buf(),
    });
    notify(InstallEvent::ExtractSizeKnown { entries });
    info!(
        archive = %archive_path.display(),
        target = %target.display(),
        entries,
        "extracting archive"
    );

    let names: Vec<String> = zip.file_names().map(str::to_string).collect();
    let layout = Layout::detect(names.iter().map(String::as_str));
    debug!(?layout, entries, "archive layout");

    fs::create_dir_all(target).map_err(|e| {
        InstallError::copy(archive_path.clone(), target.to_path_buf(), e.to_string())
    })?;

    let mut written = 0;
    for index in 0..entries {
        let mut entry = zip.by_index(index).map_err(|e| corrupt(e.to_string()))?;
        let name = entry.name().replace('\\', "/");
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| corrupt(format!("entry \"{}\" escapes the destination", name)))?;

        if !layout.is_excluded(&request.exclude_paths, &name) {
            let destination = target.join(&relative);
            let copy_failed = |to: &Path, e: io::Error| {
                InstallError::copy(PathBuf::from(&name), to.to_path_buf(), e.to_string())
            };
            if entry.is_dir() {
                fs::create_dir_all(&destination).map_err(|e| copy_failed(&destination, e))?;
            } else {
                if let Some(parent) = destination.parent() {
                    fs::create_dir_all(parent).map_err(|e| copy_failed(parent, e))?;
                }
                let mut out =
                    fs::File::create(&destination).map_err(|e| copy_failed(&destination, e))?;
                io::copy(&mut entry, &mut out).map_err(|e| match e.kind() {
                    io::ErrorKind::InvalidData => corrupt(format!("entry \"{}\": {}", name, e)),
                    _ => copy_failed(&destination, e),
                })?;
            }
            written += 1;
        }

        notify(InstallEvent::ExtractProgress { extracted: index + 1 });
    }
    drop(zip);
    debug!(written, skipped = entries - written, "entries extracted");

    relocate(request, &layout)?;

    notify(InstallEvent::ExtractComplete);
    notify(InstallEvent::ArchiveClearing {
        path: archive_path.clone(),
    });

    archive.close().map_err(|e| InstallError::ArchiveCleanupFailed {
        path: archive_path.clone(),
        reason: e.to_string(),
        fix: format!("Delete \"{}\" manually", archive_path.display()),
    })?;

    Ok(())
}

fn relocate(request: &InstallRequest, layout: &Layout) -> Result<(), InstallError> {
    let target = request.target_path.as_path();
    let install_dir = request.install_dir();

    let Some(payload) = &layout.payload else {
        let expected = match &layout.root {
            Some(root) => target.join(root).join(PAYLOAD_DIRS[0]),
            None => target.join(PAYLOAD_DIRS[0]),
        };
        return Err(InstallError::copy(
            expected,
            install_dir,
            "the archive contains no minified build",
        ));
    };

    let copied = copy_tree(&target.join(payload), &install_dir)?;
    debug!(copied, from = %payload, "minified build relocated");

    let scaffolding = match &layout.root {
        Some(root) => target.join(root),
        None => target.join(payload),
    };
    remove_scaffolding(&scaffolding, &install_dir)
}

fn remove_scaffolding(scaffolding: &Path, install_dir: &Path) -> Result<(), InstallError> {
    if scaffolding == install_dir {
        return Ok(());
    }
    remove_tree("extract", scaffolding, Removal::Everything).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::{EventKind, Notifier, DEFAULT_ARCHIVE_URL, DEFAULT_CONNECT_TIMEOUT};
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, Option<&str>)]) -> TempPath {
        let mut writer = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, contents) in entries {
            match contents {
                Some(contents) => {
                    writer.start_file(*name, options).unwrap();
                    writer.write_all(contents.as_bytes()).unwrap();
                }
                None => writer.add_directory(*name, options).unwrap(),
            }
        }
        let bytes = writer.finish().unwrap().into_inner();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file.into_temp_path()
    }

    fn release(version: &str) -> TempPath {
        let root = format!("ace-builds-{}", version);
        let names = [
            format!("{}/", root),
            format!("{}/README.md", root),
            format!("{}/docs/", root),
            format!("{}/docs/index.html", root),
            format!("{}/src/ace.js", root),
            format!("{}/src-min-noconflict/", root),
            format!("{}/src-min-noconflict/ace.js", root),
            format!("{}/src-min-noconflict/mode-php.js", root),
            format!("{}/src-min-noconflict/snippets/php.js", root),
        ];
        let entries: Vec<(&str, Option<&str>)> = names
            .iter()
            .map(|name| {
                if name.ends_with('/') {
                    (name.as_str(), None)
                } else {
                    (name.as_str(), Some("// ace"))
                }
            })
            .collect();
        build_zip(&entries)
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<InstallEvent>>,
    }

    impl Notifier for Recorder {
        fn emit(&self, event: InstallEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn request(
        target: &Path,
        excludes: &[&str],
        notifier: Option<Arc<Recorder>>,
    ) -> InstallRequest {
        InstallRequest {
            target_path: target.to_path_buf(),
            version: "1.3.3".to_string(),
            clear_policy: None,
            exclude_paths: excludes.iter().map(|e| e.to_string()).collect(),
            notifier: notifier.map(|n| n as Arc<dyn Notifier>),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            proxy: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    #[test]
    fn test_layout_detection() {
        let names = [
            "ace-builds-1.3.3/",
            "ace-builds-1.3.3/src-min/ace.js",
            "ace-builds-1.3.3/src-min-noconflict/ace.js",
        ];
        let layout = Layout::detect(names.iter().copied());
        assert_eq!(layout.root.as_deref(), Some("ace-builds-1.3.3"));
        assert_eq!(
            layout.payload.as_deref(),
            Some("ace-builds-1.3.3/src-min-noconflict")
        );

        let flat = Layout::detect(["src-min/ace.js", "README.md"].iter().copied());
        assert_eq!(flat.root, None);
        assert_eq!(flat.payload.as_deref(), Some("src-min"));
    }

    #[test]
    fn test_exclusion_forms() {
        let layout = Layout {
            root: Some("ace-builds-1.3.3".to_string()),
            payload: Some("ace-builds-1.3.3/src-min-noconflict".to_string()),
        };
        let excludes: BTreeSet<String> =
            ["docs", "snippets"].iter().map(|s| s.to_string()).collect();

        assert!(layout.is_excluded(&excludes, "docs/a.html"));
        assert!(layout.is_excluded(&excludes, "ace-builds-1.3.3/docs/"));
        assert!(layout.is_excluded(&excludes, "ace-builds-1.3.3/docs/index.html"));
        assert!(layout.is_excluded(
            &excludes,
            "ace-builds-1.3.3/src-min-noconflict/snippets/php.js"
        ));
        assert!(!layout.is_excluded(&excludes, "ace-builds-1.3.3/docsearch.js"));
        assert!(!layout.is_excluded(&excludes, "ace-builds-1.3.3/src-min-noconflict/ace.js"));
        assert!(!layout.is_excluded(&BTreeSet::new(), "docs/a.html"));
    }

    #[test]
    fn test_extract_relocates_payload() {
        let dir = tempfile::tempdir().unwrap();
        let archive = release("1.3.3");
        let archive_path = archive.to_path_buf();

        run(&request(dir.path(), &[], None), archive).unwrap();

        assert!(dir.path().join("acemin/ace.js").is_file());
        assert!(dir.path().join("acemin/snippets/php.js").is_file());
        assert!(!dir.path().join("ace-builds-1.3.3").exists());
        assert!(!archive_path.exists());
    }

    #[test]
    fn test_extract_honors_excludes() {
        let dir = tempfile::tempdir().unwrap();

        run(&request(dir.path(), &["snippets"], None), release("1.3.3")).unwrap();

        assert!(dir.path().join("acemin/mode-php.js").is_file());
        assert!(!dir.path().join("acemin/snippets").exists());
    }

    #[test]
    fn test_extract_keep_overrides_in_place() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("acemin")).unwrap();
        fs::write(dir.path().join("acemin/ace.js"), "old").unwrap();
        fs::write(dir.path().join("acemin/custom.js"), "mine").unwrap();

        run(&request(dir.path(), &[], None), release("1.3.3")).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("acemin/ace.js")).unwrap(), "// ace");
        assert_eq!(fs::read_to_string(dir.path().join("acemin/custom.js")).unwrap(), "mine");
    }

    #[test]
    fn test_extract_event_order() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder::default());

        run(&request(dir.path(), &[], Some(recorder.clone())), release("1.3.3")).unwrap();

        let events = recorder.events.lock().unwrap();
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.first(), Some(&EventKind::ExtractStarted));
        assert_eq!(kinds.get(1), Some(&EventKind::ExtractSizeKnown));
        assert_eq!(
            &kinds[kinds.len() - 2..],
            &[EventKind::ExtractComplete, EventKind::ArchiveClearing]
        );
        let progress = kinds.iter().filter(|k| **k == EventKind::ExtractProgress).count();
        assert_eq!(progress, 9);
        assert_eq!(events[1], InstallEvent::ExtractSizeKnown { entries: 9 });
    }

    #[test]
    fn test_corrupt_archive() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not a zip file").unwrap();

        let recorder = Arc::new(Recorder::default());

        let req = request(dir.path(), &[], Some(recorder.clone()));

        let err = run(&req, file.into_temp_path()).unwrap_err();

        assert!(matches!(err, InstallError::CorruptArchive { .. }));
        assert!(!dir.path().join("acemin").exists());
        assert!(recorder.events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_payload_is_copy_failure() {
        let dir = tempfile::tempdir().unwrap();
        let archive = build_zip(&[
            ("ace-builds-1.3.3/", None),
            ("ace-builds-1.3.3/src/ace.js", Some("// full")),
        ]);

        let err = run(&request(dir.path(), &[], None), archive).unwrap_err();

        match err {
            InstallError::CopyFailed { from, .. } => {
                assert!(from.ends_with("ace-builds-1.3.3/src-min-noconflict"));
            }
            other => panic!("expected CopyFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_unwritable_install_dir_is_copy_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("acemin"), "not a directory").unwrap();

        let err = run(&request(dir.path(), &[], None), release("1.3.3")).unwrap_err();

        match err {
            InstallError::CopyFailed { from, to, .. } => {
                assert!(from.ends_with("ace-builds-1.3.3/src-min-noconflict"));
                assert_eq!(to, dir.path().join("acemin"));
            }
            other => panic!("expected CopyFailed, got {:?}", other),
        }
    }

    /// Deletes the temporary archive as soon as it is announced for removal.
    struct ArchiveSnatcher;

    impl Notifier for ArchiveSnatcher {
        fn emit(&self, event: InstallEvent) {
            if let InstallEvent::ArchiveClearing { path } = event {
                fs::remove_file(path).unwrap();
            }
        }
    }

    #[test]
    fn test_archive_cleanup_failure() {
        let dir = tempfile::tempdir().unwrap();
        let archive = release("1.3.3");
        let archive_path = archive.to_path_buf();
        let mut req = request(dir.path(), &[], None);
        req.notifier = Some(Arc::new(ArchiveSnatcher));

        let err = run(&req, archive).unwrap_err();

        match &err {
            InstallError::ArchiveCleanupFailed { path, .. } => assert_eq!(*path, archive_path),
            other => panic!("expected ArchiveCleanupFailed, got {:?}", other),
        }
        assert_eq!(err.phase(), "extract");
        assert!(dir.path().join("acemin/ace.js").is_file());
    }
}
