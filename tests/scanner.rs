use std::path::PathBuf;

use chill::fs::mock::MockFileSystem;
use chill::fs::RealFileSystem;
use chill::watch::scan_source_dirs;
use chill_test_utils::TempTree;

#[test]
fn collects_dirs_with_source_files_and_skips_vcs_dirs() {
    let tree = TempTree::new();
    tree.write("a.go", "package main");
    tree.write("sub/b.go", "package sub");
    tree.write("vendor/.git/c.go", "package git");

    let dirs = scan_source_dirs(&RealFileSystem, tree.root(), &["go"]);

    assert_eq!(dirs, vec![tree.root().to_path_buf(), tree.path("sub")]);
}

#[test]
fn directory_with_only_subdirectories_is_not_added() {
    let tree = TempTree::new();
    tree.write("sub/b.txt", "notes");
    tree.write("sub/deeper/c.go", "package deeper");

    let dirs = scan_source_dirs(&RealFileSystem, tree.root(), &["go"]);

    assert_eq!(dirs, vec![tree.path("sub/deeper")]);
}

#[test]
fn extension_may_be_given_with_leading_dot() {
    let tree = TempTree::new();
    tree.write("lib.rs", "");

    let dirs = scan_source_dirs(&RealFileSystem, tree.root(), &[".rs"]);

    assert_eq!(dirs, vec![tree.root().to_path_buf()]);
}

#[test]
fn missing_root_yields_nothing() {
    let tree = TempTree::new();
    let dirs = scan_source_dirs(&RealFileSystem, &tree.path("gone"), &["go"]);
    assert!(dirs.is_empty());
}

#[test]
fn many_source_files_in_one_dir_are_reported_once() {
    let fs = MockFileSystem::new();
    for name in ["a.go", "b.go", "c.go", "README.md"] {
        fs.add_file(format!("/root/{name}"));
    }

    let dirs = scan_source_dirs(&fs, &PathBuf::from("/root"), &["go"]);

    assert_eq!(dirs, vec![PathBuf::from("/root")]);
}

#[test]
fn unreadable_directory_is_skipped_silently() {
    let fs = MockFileSystem::new();
    fs.add_file("/root/main.go");
    fs.add_unreadable_dir("/root/locked");
    fs.add_file("/root/ok/lib.go");

    let dirs = scan_source_dirs(&fs, &PathBuf::from("/root"), &["go"]);

    assert_eq!(dirs, vec![PathBuf::from("/root"), PathBuf::from("/root/ok")]);
}

#[test]
fn vcs_root_is_still_scanned_when_given_explicitly() {
    let fs = MockFileSystem::new();
    fs.add_file("/repo/.git/hook.go");
    fs.add_file("/repo/.git/nested/x.go");

    let dirs = scan_source_dirs(&fs, &PathBuf::from("/repo/.git"), &["go"]);

    assert_eq!(
        dirs,
        vec![PathBuf::from("/repo/.git"), PathBuf::from("/repo/.git/nested")]
    );
}

#[test]
fn every_vcs_name_is_excluded() {
    let fs = MockFileSystem::new();
    fs.add_file("/root/main.go");
    for vcs in [".git", ".hg", ".svn", ".bzr"] {
        fs.add_file(format!("/root/{vcs}/meta.go"));
    }

    let dirs = scan_source_dirs(&fs, &PathBuf::from("/root"), &["go"]);

    assert_eq!(dirs, vec![PathBuf::from("/root")]);
}

#[test]
fn removed_source_file_no_longer_qualifies_its_dir() {
    let fs = MockFileSystem::new();
    fs.add_file("/root/main.go");
    fs.add_file("/root/pkg/util.go");
    fs.remove("/root/pkg/util.go");

    let dirs = scan_source_dirs(&fs, &PathBuf::from("/root"), &["go"]);

    assert_eq!(dirs, vec![PathBuf::from("/root")]);
}
