//! Phase 3: Writing to Disk
//!
//! This is the final phase of a concat run. It realizes each rendered target
//! on the host filesystem and reports what changed.
//!
//! ## Process
//!
//! 1.  **Compare**: The rendered content is compared with the file on disk.
//!     Identical content is left alone, so rerunning with unchanged inputs
//!     reports no change.
//!
//! 2.  **Validate**: When a `validate_cmd` is set, the new content is staged in
//!     a temporary file next to the destination and the command is run with
//!     `%` replaced by that file's path. A non-zero exit aborts the target.
//!
//! 3.  **Write**: The previous file is copied to its backup path if a backup
//!     suffix is set, then the new content is written to a temporary file and
//!     renamed over the destination.
//!
//! 4.  **Set Metadata**: On Unix-like systems, mode, owner and group are
//!     applied when they differ from the declared values.
//!
//! 5.  **Notify**: Commands listed in `notify` run after a target changed.
//!
//! In noop mode steps 2 to 5 are skipped and the report describes what would
//! have happened.

use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};
use similar::TextDiff;

use super::{Change, Failure, RenderedTarget, TargetReport, WriteOptions};
use crate::defaults::VALIDATE_PLACEHOLDER;
use crate::error::{Error, Result};
use crate::target::{FileAttributes, Target};

/// Permission bits for newly created files without a declared mode
const DEFAULT_FILE_MODE: u32 = 0o644;

/// Execute Phase 3: realize rendered targets on disk
///
/// Each target is realized independently. A failure is recorded and the
/// remaining targets are still written.
pub fn execute(
    rendered: &[RenderedTarget<'_>],
    options: &WriteOptions,
) -> (Vec<TargetReport>, Vec<Failure>) {
    let mut reports = Vec::new();
    let mut failures = Vec::new();

    for item in rendered {
        let target = item.target;
        let label = format!("Concat_file[{}]", target.title());

        match realize(target, item.content.as_deref(), options) {
            Ok(report) => {
                if report.change.is_change() && !options.noop {
                    for command in target.notify() {
                        if let Err(e) = run_notify(command, &report.path) {
                            failures.push(Failure::new(label.clone(), &e));
                        }
                    }
                }
                reports.push(report);
            }
            Err(e) => failures.push(Failure::new(label, &e)),
        }
    }

    (reports, failures)
}

/// Bring one target's file in line with its rendered content.
///
/// `content` is `None` when the target ensures the file is absent.
pub fn realize(
    target: &Target,
    content: Option<&[u8]>,
    options: &WriteOptions,
) -> Result<TargetReport> {
    let destination = options.destination(target.path());
    let (change, diff) = match content {
        None => (remove(&destination, options.noop)?, None),
        Some(content) => write(&destination, content, target.attributes(), options.noop)?,
    };

    if change.is_change() {
        info!(
            "{}{}: {}",
            if options.noop { "(noop) " } else { "" },
            destination.display(),
            change
        );
    } else {
        debug!("{}: unchanged", destination.display());
    }

    Ok(TargetReport {
        title: target.title().to_string(),
        path: destination,
        change,
        diff,
    })
}

fn remove(destination: &Path, noop: bool) -> Result<Change> {
    let metadata = match fs::symlink_metadata(destination) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Change::Unchanged),
        Err(e) => return Err(filesystem_error("inspect", destination, e)),
    };
    if metadata.is_dir() {
        return Err(Error::Filesystem {
            message: format!(
                "Refusing to remove directory '{}' for an absent target",
                destination.display()
            ),
        });
    }
    if !noop {
        fs::remove_file(destination).map_err(|e| filesystem_error("remove", destination, e))?;
    }
    Ok(Change::Removed)
}

fn write(
    destination: &Path,
    content: &[u8],
    attributes: &FileAttributes,
    noop: bool,
) -> Result<(Change, Option<String>)> {
    let existing = match fs::read(destination) {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(filesystem_error("read", destination, e)),
    };

    let content_change = match &existing {
        None => Some(Change::Created),
        Some(old) if old.as_slice() != content => {
            if attributes.replace {
                Some(Change::Updated)
            } else {
                debug!(
                    "{} differs but replace is disabled, leaving content alone",
                    destination.display()
                );
                None
            }
        }
        Some(_) => None,
    };

    let diff = match (&existing, content_change) {
        (Some(old), Some(Change::Updated)) if attributes.show_diff => {
            let diff = unified_diff(destination, old, content);
            info!("Content of {} changed:\n{}", destination.display(), diff);
            Some(diff)
        }
        _ => None,
    };

    let desired = desired_metadata(destination, attributes)?;
    let current = current_metadata(destination)?;

    let metadata_drift = current
        .as_ref()
        .is_some_and(|current| desired.differs_from(current));

    let change = match content_change {
        Some(change) => change,
        None if metadata_drift => Change::Metadata,
        None => Change::Unchanged,
    };

    if noop || !change.is_change() {
        return Ok((change, diff));
    }

    if content_change.is_some() {
        let parent = parent_dir(destination)?;
        fs::create_dir_all(parent).map_err(|e| filesystem_error("create directory", parent, e))?;

        if let Some(command) = &attributes.validate_cmd {
            validate(destination, content, command)?;
        }

        if let (Some(suffix), Some(_)) = (attributes.backup_suffix(), &existing) {
            let backup = backup_path(destination, suffix);
            fs::copy(destination, &backup).map_err(|e| filesystem_error("back up", destination, e))?;
            debug!("Backed up {} to {}", destination.display(), backup.display());
        }

        let mode = desired
            .mode
            .or(current.as_ref().and_then(|c| c.mode))
            .unwrap_or(DEFAULT_FILE_MODE);
        write_atomic(destination, content, mode)?;
    }

    // Ownership of a replaced file carries over unless declared otherwise.
    let target_metadata = FileMetadata {
        uid: desired.uid.or(current.as_ref().and_then(|c| c.uid)),
        gid: desired.gid.or(current.as_ref().and_then(|c| c.gid)),
        mode: desired.mode,
    };
    apply_metadata(destination, &target_metadata)?;

    Ok((change, diff))
}

fn parent_dir(path: &Path) -> Result<&Path> {
    path.parent().ok_or_else(|| Error::Filesystem {
        message: format!("'{}' has no parent directory", path.display()),
    })
}

fn backup_path(destination: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Write `content` to a temporary file beside `destination` and rename it
/// into place.
fn write_atomic(destination: &Path, content: &[u8], mode: u32) -> Result<()> {
    let parent = parent_dir(destination)?;
    let mut staged = tempfile::Builder::new()
        .prefix(".concat")
        .tempfile_in(parent)
        .map_err(|e| filesystem_error("stage", destination, e))?;

    staged
        .write_all(content)
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|e| filesystem_error("write", destination, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staged
            .as_file()
            .set_permissions(fs::Permissions::from_mode(mode))
            .map_err(|e| filesystem_error("set permissions on", destination, e))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    staged.persist(destination).map_err(|e| Error::Filesystem {
        message: format!(
            "Failed to rename staged file over '{}': {}",
            destination.display(),
            e.error
        ),
    })?;
    Ok(())
}

/// Run `validate_cmd` against the new content staged beside `destination`.
fn validate(destination: &Path, content: &[u8], command: &str) -> Result<()> {
    let parent = parent_dir(destination)?;
    let mut staged = tempfile::Builder::new()
        .prefix(".concat-validate")
        .tempfile_in(parent)
        .map_err(|e| filesystem_error("stage", destination, e))?;
    staged
        .write_all(content)
        .and_then(|_| staged.flush())
        .map_err(|e| filesystem_error("stage", destination, e))?;

    let expanded = command.replace(VALIDATE_PLACEHOLDER, &staged.path().to_string_lossy());
    debug!("Validating {} with `{}`", destination.display(), expanded);

    let output = Command::new("sh")
        .arg("-c")
        .arg(&expanded)
        .output()
        .map_err(|e| Error::ValidateCmd {
            path: destination.display().to_string(),
            command: command.to_string(),
            message: e.to_string(),
        })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(Error::ValidateCmd {
        path: destination.display().to_string(),
        command: command.to_string(),
        message: match stderr.trim() {
            "" => output.status.to_string(),
            message => message.to_string(),
        },
    })
}

fn run_notify(command: &str, path: &Path) -> Result<()> {
    debug!("Notifying `{}` for {}", command, path.display());
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .env("CONCAT_PATH", path)
        .status()
        .map_err(|e| Error::Notify {
            command: command.to_string(),
            message: e.to_string(),
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::Notify {
            command: command.to_string(),
            message: status.to_string(),
        })
    }
}

fn unified_diff(path: &Path, old: &[u8], new: &[u8]) -> String {
    let old = String::from_utf8_lossy(old);
    let new = String::from_utf8_lossy(new);
    let label = path.display().to_string();
    TextDiff::from_lines(old.as_ref(), new.as_ref())
        .unified_diff()
        .context_radius(3)
        .header(&label, &label)
        .to_string()
}

fn filesystem_error(action: &str, path: &Path, e: std::io::Error) -> Error {
    Error::Filesystem {
        message: format!("Failed to {} '{}': {}", action, path.display(), e),
    }
}

/// Owner, group and permission bits of a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FileMetadata {
    uid: Option<u32>,
    gid: Option<u32>,
    mode: Option<u32>,
}

impl FileMetadata {
    /// Whether any declared field differs from `current`.
    fn differs_from(&self, current: &FileMetadata) -> bool {
        let drift = |want: Option<u32>, have: Option<u32>| want.is_some() && want != have;
        drift(self.uid, current.uid) || drift(self.gid, current.gid) || drift(self.mode, current.mode)
    }
}

fn desired_metadata(destination: &Path, attributes: &FileAttributes) -> Result<FileMetadata> {
    let lookup = |value: &Option<String>, kind: &str, resolve: fn(&str) -> Option<u32>| {
        value
            .as_deref()
            .map(|name| {
                resolve(name).ok_or_else(|| Error::Attribute {
                    path: destination.display().to_string(),
                    message: format!("Could not resolve {} '{}': no such {}", kind, name, kind),
                })
            })
            .transpose()
    };
    Ok(FileMetadata {
        uid: lookup(&attributes.owner, "owner", user_id)?,
        gid: lookup(&attributes.group, "group", group_id)?,
        mode: attributes.mode,
    })
}

/// A numeric uid, or the uid of a user known to the system's name service.
fn user_id(name: &str) -> Option<u32> {
    name.parse().ok().or_else(|| lookup_user(name))
}

/// A numeric gid, or the gid of a group known to the system's name service.
fn group_id(name: &str) -> Option<u32> {
    name.parse().ok().or_else(|| lookup_group(name))
}

#[cfg(unix)]
fn lookup_user(name: &str) -> Option<u32> {
    uzers::get_user_by_name(name).map(|user| user.uid())
}

#[cfg(unix)]
fn lookup_group(name: &str) -> Option<u32> {
    uzers::get_group_by_name(name).map(|group| group.gid())
}

#[cfg(not(unix))]
fn lookup_user(_name: &str) -> Option<u32> {
    None
}

#[cfg(not(unix))]
fn lookup_group(_name: &str) -> Option<u32> {
    None
}

#[cfg(unix)]
fn current_metadata(path: &Path) -> Result<Option<FileMetadata>> {
    use std::os::unix::fs::MetadataExt;
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(FileMetadata {
            uid: Some(metadata.uid()),
            gid: Some(metadata.gid()),
            mode: Some(metadata.mode() & 0o7777),
        })),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(filesystem_error("inspect", path, e)),
    }
}

#[cfg(not(unix))]
fn current_metadata(path: &Path) -> Result<Option<FileMetadata>> {
    Ok(path.exists().then(FileMetadata::default))
}

#[cfg(unix)]
fn apply_metadata(path: &Path, wanted: &FileMetadata) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let Some(current) = current_metadata(path)? else {
        return Ok(());
    };
    let attribute_error = |e: std::io::Error| Error::Attribute {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let uid = wanted.uid.filter(|uid| Some(*uid) != current.uid);
    let gid = wanted.gid.filter(|gid| Some(*gid) != current.gid);
    if uid.is_some() || gid.is_some() {
        std::os::unix::fs::chown(path, uid, gid).map_err(attribute_error)?;
    }
    if let Some(mode) = wanted.mode.filter(|mode| Some(*mode) != current.mode) {
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(attribute_error)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_metadata(path: &Path, _wanted: &FileMetadata) -> Result<()> {
    debug!("File metadata is not applied on this platform ({})", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Ensure;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn options(root: &TempDir) -> WriteOptions {
        WriteOptions {
            root: Some(root.path().to_path_buf()),
            noop: false,
        }
    }

    fn target() -> Target {
        Target::at("/etc/motd").unwrap()
    }

    fn with_attributes(attributes: FileAttributes) -> Target {
        target().with_attributes(attributes).unwrap()
    }

    #[test]
    fn test_phase3_creates_then_is_idempotent() {
        let root = TempDir::new().unwrap();
        let options = options(&root);

        let report = realize(&target(), Some(b"hello\n"), &options).unwrap();
        assert_eq!(report.change, Change::Created);
        assert_eq!(report.path, root.path().join("etc/motd"));
        assert_eq!(fs::read(&report.path).unwrap(), b"hello\n");

        let mode = fs::metadata(&report.path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);

        let again = realize(&target(), Some(b"hello\n"), &options).unwrap();
        assert_eq!(again.change, Change::Unchanged);
    }

    #[test]
    fn test_phase3_update_produces_diff() {
        let root = TempDir::new().unwrap();
        let options = options(&root);
        realize(&target(), Some(b"one\ntwo\n"), &options).unwrap();

        let report = realize(&target(), Some(b"one\nthree\n"), &options).unwrap();
        assert_eq!(report.change, Change::Updated);
        let diff = report.diff.unwrap();
        assert!(diff.contains("-two"));
        assert!(diff.contains("+three"));
        assert_eq!(fs::read(&report.path).unwrap(), b"one\nthree\n");
    }

    #[test]
    fn test_phase3_show_diff_disabled() {
        let root = TempDir::new().unwrap();
        let options = options(&root);
        let quiet = with_attributes(FileAttributes {
            show_diff: false,
            ..Default::default()
        });
        realize(&quiet, Some(b"a"), &options).unwrap();
        let report = realize(&quiet, Some(b"b"), &options).unwrap();
        assert_eq!(report.change, Change::Updated);
        assert!(report.diff.is_none());
    }

    #[test]
    fn test_phase3_replace_false_keeps_content() {
        let root = TempDir::new().unwrap();
        let options = options(&root);
        let keep = with_attributes(FileAttributes {
            replace: false,
            ..Default::default()
        });

        let first = realize(&keep, Some(b"original"), &options).unwrap();
        assert_eq!(first.change, Change::Created);

        let second = realize(&keep, Some(b"new"), &options).unwrap();
        assert_eq!(second.change, Change::Unchanged);
        assert_eq!(fs::read(&second.path).unwrap(), b"original");
    }

    #[test]
    fn test_phase3_noop_touches_nothing() {
        let root = TempDir::new().unwrap();
        let noop = WriteOptions {
            root: Some(root.path().to_path_buf()),
            noop: true,
        };

        let report = realize(&target(), Some(b"x"), &noop).unwrap();
        assert_eq!(report.change, Change::Created);
        assert!(!report.path.exists());
    }

    #[test]
    fn test_phase3_absent_removes_file() {
        let root = TempDir::new().unwrap();
        let options = options(&root);
        realize(&target(), Some(b"x"), &options).unwrap();

        let absent = target().with_ensure(Ensure::Absent);
        let report = realize(&absent, None, &options).unwrap();
        assert_eq!(report.change, Change::Removed);
        assert!(!report.path.exists());

        let again = realize(&absent, None, &options).unwrap();
        assert_eq!(again.change, Change::Unchanged);
    }

    #[test]
    fn test_phase3_mode_applied_and_drift_detected() {
        let root = TempDir::new().unwrap();
        let options = options(&root);
        let restricted = with_attributes(FileAttributes {
            mode: Some(0o600),
            ..Default::default()
        });

        let report = realize(&restricted, Some(b"secret"), &options).unwrap();
        let mode = fs::metadata(&report.path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);

        fs::set_permissions(&report.path, fs::Permissions::from_mode(0o644)).unwrap();
        let report = realize(&restricted, Some(b"secret"), &options).unwrap();
        assert_eq!(report.change, Change::Metadata);
        let mode = fs::metadata(&report.path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_phase3_update_preserves_existing_mode() {
        let root = TempDir::new().unwrap();
        let options = options(&root);
        let report = realize(&target(), Some(b"a"), &options).unwrap();
        fs::set_permissions(&report.path, fs::Permissions::from_mode(0o640)).unwrap();

        realize(&target(), Some(b"b"), &options).unwrap();
        let mode = fs::metadata(&report.path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn test_phase3_numeric_owner_matching_current_is_unchanged() {
        use std::os::unix::fs::MetadataExt;

        let root = TempDir::new().unwrap();
        let options = options(&root);
        let report = realize(&target(), Some(b"a"), &options).unwrap();
        let uid = fs::metadata(&report.path).unwrap().uid();

        let owned = with_attributes(FileAttributes {
            owner: Some(uid.to_string()),
            ..Default::default()
        });
        let report = realize(&owned, Some(b"a"), &options).unwrap();
        assert_eq!(report.change, Change::Unchanged);
    }

    #[test]
    fn test_phase3_backup_copies_previous_content() {
        let root = TempDir::new().unwrap();
        let options = options(&root);
        let backed_up = with_attributes(FileAttributes {
            backup: Some(".bak".to_string()),
            ..Default::default()
        });

        realize(&backed_up, Some(b"old"), &options).unwrap();
        assert!(!root.path().join("etc/motd.bak").exists());

        realize(&backed_up, Some(b"new"), &options).unwrap();
        assert_eq!(fs::read(root.path().join("etc/motd.bak")).unwrap(), b"old");
    }

    #[test]
    fn test_phase3_validate_cmd() {
        let root = TempDir::new().unwrap();
        let options = options(&root);
        let checked = with_attributes(FileAttributes {
            validate_cmd: Some("grep -qx ok %".to_string()),
            ..Default::default()
        });

        let report = realize(&checked, Some(b"ok\n"), &options).unwrap();
        assert_eq!(report.change, Change::Created);

        let err = realize(&checked, Some(b"broken\n"), &options).unwrap_err();
        assert!(matches!(err, Error::ValidateCmd { .. }));
        assert_eq!(fs::read(&report.path).unwrap(), b"ok\n");
    }

    #[test]
    fn test_execute_runs_notify_only_on_change() {
        let root = TempDir::new().unwrap();
        let marker = root.path().join("notified");
        let options = options(&root);

        let notifying =
            target().with_notify(vec![format!("echo $CONCAT_PATH >> {}", marker.display())]);
        let rendered = vec![RenderedTarget {
            target: &notifying,
            content: Some(b"x".to_vec()),
            fragments: 1,
        }];

        let (reports, failures) = execute(&rendered, &options);
        assert!(failures.is_empty());
        assert_eq!(reports[0].change, Change::Created);
        let notified = fs::read_to_string(&marker).unwrap();
        assert!(notified.contains("etc/motd"));

        fs::remove_file(&marker).unwrap();
        let (reports, _) = execute(&rendered, &options);
        assert_eq!(reports[0].change, Change::Unchanged);
        assert!(!marker.exists());
    }

    #[test]
    fn test_execute_reports_failed_notify() {
        let root = TempDir::new().unwrap();
        let failing = target().with_notify(vec!["exit 3".to_string()]);
        let rendered = vec![RenderedTarget {
            target: &failing,
            content: Some(b"x".to_vec()),
            fragments: 1,
        }];

        let (reports, failures) = execute(&rendered, &options(&root));
        assert_eq!(reports.len(), 1);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("exit 3"));
    }

    #[test]
    fn test_owner_and_group_ids() {
        assert_eq!(user_id("1000"), Some(1000));
        assert_eq!(group_id("0"), Some(0));
        assert_eq!(user_id("root"), Some(0));
        assert_eq!(group_id("root"), Some(0));
        assert_eq!(user_id("no-such-user-for-concat"), None);
    }

    #[test]
    fn test_unknown_owner_fails_the_target() {
        let root = TempDir::new().unwrap();
        let owned = with_attributes(FileAttributes {
            owner: Some("no-such-user-for-concat".to_string()),
            ..Default::default()
        });

        let err = realize(&owned, Some(b"x"), &options(&root)).unwrap_err();
        assert!(err.to_string().contains("Could not resolve owner 'no-such-user-for-concat'"));
        assert!(!root.path().join("etc/motd").exists());
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/etc/motd"), ".orig"),
            PathBuf::from("/etc/motd.orig")
        );
    }
}
