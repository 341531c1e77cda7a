use super::*;

// -- Splitting and normalisation --

#[test]
fn split_drops_empty_components() {
    assert_eq!(split("\\A\\B"), vec!["A", "B"]);
    assert_eq!(split("A\\\\B\\"), vec!["A", "B"]);
    assert_eq!(split(""), Vec::<&str>::new());
    assert_eq!(split("\\"), Vec::<&str>::new());
}

#[test]
fn split_accepts_forward_slashes() {
    assert_eq!(split("/a/b"), vec!["a", "b"]);
    assert_eq!(split("a/b\\c"), vec!["a", "b", "c"]);
}

#[test]
fn is_root_on_empty_and_separator_forms() {
    assert!(is_root(""));
    assert!(is_root("\\"));
    assert!(is_root("\\\\"));
    assert!(!is_root("\\A"));
}

#[test]
fn normalize_resolves_dot_components() {
    assert_eq!(normalize("\\A\\.\\B"), "\\A\\B");
    assert_eq!(normalize("\\A\\B\\..\\C"), "\\A\\C");
    assert_eq!(normalize("A\\B"), "\\A\\B");
}

#[test]
fn normalize_clamps_excess_parent_components_at_root() {
    assert_eq!(normalize("\\..\\..\\A"), "\\A");
    assert_eq!(normalize("..\\.."), "\\");
}

// -- Combining --

#[test]
fn combine_relative_target() {
    assert_eq!(combine("\\DIR", "FILE.TXT"), "\\DIR\\FILE.TXT");
    assert_eq!(combine("\\", "FILE.TXT"), "\\FILE.TXT");
}

#[test]
fn combine_absolute_target_replaces_base() {
    assert_eq!(combine("\\DIR\\SUB", "\\OTHER"), "\\OTHER");
    assert_eq!(combine("\\DIR\\SUB", "/etc/hosts"), "\\etc\\hosts");
}

#[test]
fn combine_resolves_parent_components() {
    assert_eq!(combine("\\A\\B", "..\\C"), "\\A\\C");
    assert_eq!(combine("\\A", ".\\B"), "\\A\\B");
}

#[test]
fn parent_and_file_name() {
    assert_eq!(parent("\\A\\B\\C"), "\\A\\B");
    assert_eq!(parent("\\A"), "\\");
    assert_eq!(file_name("\\A\\B.TXT"), "B.TXT");
    assert_eq!(file_name("\\"), "");
}

// -- Search names --

#[test]
fn search_name_lowercases() {
    assert_eq!(search_name("README.TXT"), "readme.txt");
}

#[test]
fn search_name_appends_dot_when_missing() {
    assert_eq!(search_name("MAKEFILE"), "makefile.");
    assert_eq!(search_name("a.b"), "a.b");
}

// -- Wildcard matching --

#[test]
fn star_dot_star_matches_everything() {
    let p = WildcardPattern::new("*.*");
    assert!(p.matches_name("README.TXT"));
    assert!(p.matches_name("MAKEFILE"));
    assert!(p.matches_name("a.b.c"));
}

#[test]
fn bare_star_matches_only_extensionless_names() {
    let p = WildcardPattern::new("*");
    assert!(p.matches_name("MAKEFILE"));
    assert!(!p.matches_name("README.TXT"));
}

#[test]
fn star_spans_dots() {
    let p = WildcardPattern::new("R*.TXT");
    assert!(p.matches_name("README.TXT"));
    assert!(p.matches_name("R.1.TXT"));
    assert!(!p.matches_name("XREADME.TXT"));
}

#[test]
fn question_mark_matches_one_non_dot_character() {
    let p = WildcardPattern::new("FILE?.TXT");
    assert!(p.matches_name("FILE1.TXT"));
    assert!(!p.matches_name("FILE.TXT"));
    assert!(!p.matches_name("FILE12.TXT"));

    let dotted = WildcardPattern::new("A?B.TXT");
    assert!(!dotted.matches_name("A.B.TXT"));
}

#[test]
fn matching_is_case_insensitive() {
    let p = WildcardPattern::new("readme.*");
    assert!(p.matches_name("README.TXT"));
    assert!(p.matches_name("ReadMe.md"));
}

#[test]
fn anchored_at_both_ends() {
    let p = WildcardPattern::new("AB.TXT");
    assert!(p.matches_name("AB.TXT"));
    assert!(!p.matches_name("AB.TXT2"));
    assert!(!p.matches_name("XAB.TXT"));
}
