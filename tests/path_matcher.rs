use std::error::Error;
use std::path::PathBuf;

use proptest::prelude::*;

use chill::watch::{matches, PathMatcher};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn matches_on_filename_only() -> TestResult {
    let matcher = PathMatcher::new(["*.go"])?;

    assert!(matcher.matches("/work/project/main.go"));
    assert!(matcher.matches("main.go"));
    assert!(!matcher.matches("/work/project.go/readme.md"));
    assert!(!matcher.matches("/work/project/main.go.bak"));
    Ok(())
}

#[test]
fn directory_components_never_match() -> TestResult {
    let matcher = PathMatcher::new(["src/*.rs"])?;
    assert!(!matcher.matches("/work/src/lib.rs"));
    Ok(())
}

#[test]
fn supports_question_mark_and_bracket_classes() -> TestResult {
    let matcher = PathMatcher::new(["file?.txt", "[ab]*.rs"])?;

    assert!(matcher.matches("/x/file1.txt"));
    assert!(!matcher.matches("/x/file10.txt"));
    assert!(matcher.matches("/x/alpha.rs"));
    assert!(matcher.matches("/x/beta.rs"));
    assert!(!matcher.matches("/x/gamma.rs"));
    Ok(())
}

#[test]
fn matching_is_case_sensitive() -> TestResult {
    let matcher = PathMatcher::new(["*.go"])?;
    assert!(!matcher.matches("/x/MAIN.GO"));
    Ok(())
}

#[test]
fn empty_pattern_list_matches_nothing() -> TestResult {
    let matcher = PathMatcher::new(Vec::<String>::new())?;
    assert!(!matcher.matches("/x/main.go"));
    assert!(!matches("/x/main.go", &[] as &[&str]));
    Ok(())
}

#[test]
fn duplicate_patterns_are_harmless() -> TestResult {
    let matcher = PathMatcher::new(["*.go", "*.go", "main.*"])?;
    assert!(matcher.matches("/x/main.go"));
    assert_eq!(matcher.patterns().len(), 3);
    Ok(())
}

#[test]
fn invalid_pattern_is_rejected() {
    assert!(PathMatcher::new(["[unclosed"]).is_err());
    assert!(!matches("/x/[unclosed", &["[unclosed"]));
}

#[test]
fn path_without_filename_never_matches() -> TestResult {
    let matcher = PathMatcher::new(["*"])?;
    assert!(!matcher.matches("/"));
    assert!(!matcher.matches("/x/.."));
    Ok(())
}

proptest! {
    #[test]
    fn filename_matches_iff_extension_matches(
        dirs in proptest::collection::vec("[a-z]{1,6}", 0..4),
        stem in "[a-z]{1,8}",
        ext in "[a-z]{1,3}",
        wanted in "[a-z]{1,3}",
    ) {
        let mut path = PathBuf::from("/");
        for d in &dirs {
            path.push(d);
        }
        path.push(format!("{stem}.{ext}"));

        let pattern = format!("*.{wanted}");
        let matcher = PathMatcher::new([pattern.as_str()]).unwrap();

        prop_assert_eq!(matcher.matches(&path), ext == wanted);
        prop_assert_eq!(matches(&path, &[pattern.as_str()]), ext == wanted);
    }

    #[test]
    fn directory_named_like_the_pattern_does_not_matter(
        dir in "[a-z]{1,6}",
        stem in "[a-z]{1,8}",
    ) {
        let matcher = PathMatcher::new(["*.go"]).unwrap();
        let path = PathBuf::from(format!("/{dir}.go/{stem}.txt"));
        prop_assert!(!matcher.matches(&path));
    }
}
