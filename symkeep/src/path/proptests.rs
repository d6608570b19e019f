//! Property-based tests for path grammar handling.

use super::flavor::{classify, classify_native, PathFlavor};
use super::host::{HostContext, PathPreference};
use super::parts::normalize;
use super::rebase::{rebase, RebaseDirection};
use super::resolver::{to_local, to_portable};
use proptest::prelude::*;

// POSIX names may hold backslashes and colons.
fn segment_strategy() -> impl Strategy<Value = String> {
    r"[a-z0-9_:\\-]{1,12}"
}

fn segments_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(segment_strategy(), 1..6)
}

fn windows_segment_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,12}"
}

fn windows_segments_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(windows_segment_strategy(), 1..6)
}

// Segments sprinkled with `.` and `..` to exercise normalization.
fn noisy_segments_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            4 => segment_strategy(),
            1 => Just(".".to_string()),
            1 => Just("..".to_string()),
            1 => Just(String::new()),
        ],
        1..10,
    )
}

fn posix_path_strategy() -> impl Strategy<Value = String> {
    (segment_strategy(), noisy_segments_strategy())
        .prop_map(|(first, rest)| format!("/{first}/{}", rest.join("/")))
}

fn drive_path_strategy() -> impl Strategy<Value = String> {
    (prop::char::range('A', 'Y'), windows_segments_strategy())
        .prop_map(|(drive, parts)| format!(r"{drive}:\{}", parts.join("\\")))
}

fn unc_path_strategy() -> impl Strategy<Value = String> {
    windows_segments_strategy().prop_map(|parts| format!(r"\\server\share\{}", parts.join("\\")))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    // normalize(normalize(p)) == normalize(p)
    #[test]
    fn normalization_idempotent(path in posix_path_strategy()) {
        let once = normalize(&path, PathFlavor::Posix).unwrap();
        let twice = normalize(&once, PathFlavor::Posix).unwrap();
        prop_assert_eq!(once, twice);
    }

    // Absolute normalized paths never keep `.` or `..` segments
    #[test]
    fn absolute_paths_lose_dot_segments(path in posix_path_strategy()) {
        let normalized = normalize(&path, PathFlavor::Posix).unwrap();
        prop_assert!(normalized.split('/').all(|s| s != "." && s != ".."));
    }

    // Same-host identity for POSIX paths
    #[test]
    fn posix_round_trip_on_same_host(path in posix_path_strategy()) {
        let host = HostContext::posix();
        let flavor = classify_native(&path, &host);
        prop_assert_eq!(flavor, PathFlavor::Posix);
        let portable = to_portable(&path, flavor, &host).unwrap();
        let local = to_local(&portable, flavor, &host, None).unwrap();
        prop_assert_eq!(local, normalize(&path, flavor).unwrap());
    }

    // Live POSIX link text keeps backslashes and colons inside names
    #[test]
    fn native_posix_text_keeps_names(parts in segments_strategy()) {
        let host = HostContext::posix();
        let path = format!("/{}", parts.join("/"));
        prop_assert_eq!(classify_native(&path, &host), PathFlavor::Posix);
        prop_assert_eq!(normalize(&path, PathFlavor::Posix).unwrap(), path);
    }

    // Same-host identity for drive paths on Windows
    #[test]
    fn drive_round_trip_on_same_host(path in drive_path_strategy()) {
        let host = HostContext::windows();
        let flavor = classify(&path, &host);
        prop_assert_eq!(flavor, PathFlavor::WindowsLocal);
        let portable = to_portable(&path, flavor, &host).unwrap();
        let local = to_local(&portable, flavor, &host, None).unwrap();
        prop_assert_eq!(local, normalize(&path, flavor).unwrap());
    }

    // Same-host identity for mapped drives and UNC paths
    #[test]
    fn network_round_trip_on_same_host(tail in windows_segments_strategy()) {
        let host = HostContext::windows()
            .with_drive('Z', r"\\server\share")
            .unwrap()
            .with_preference(PathPreference::Original);

        let mapped = format!(r"Z:\{}", tail.join("\\"));
        let flavor = classify(&mapped, &host);
        prop_assert_eq!(flavor, PathFlavor::WindowsMappedDrive);
        let portable = to_portable(&mapped, flavor, &host).unwrap();
        prop_assert!(portable.starts_with("//server/share/"));
        prop_assert_eq!(to_local(&portable, flavor, &host, None).unwrap(), mapped);

        let unc = format!(r"\\server\share\{}", tail.join("\\"));
        let flavor = classify(&unc, &host);
        let portable = to_portable(&unc, flavor, &host).unwrap();
        prop_assert_eq!(to_local(&portable, flavor, &host, None).unwrap(), unc);
    }

    // Resolved local targets classify back into the host's grammar
    #[test]
    fn resolved_unc_classifies_on_host(path in unc_path_strategy()) {
        let host = HostContext::windows()
            .with_drive('Z', r"\\server\share")
            .unwrap()
            .with_preference(PathPreference::Drive);
        let local = to_local(&path, PathFlavor::WindowsUnc, &host, None).unwrap();
        prop_assert_eq!(classify(&local, &host), PathFlavor::WindowsMappedDrive);
    }

    // rebase to relative and back restores the original absolute path
    #[test]
    fn rebase_round_trip(base in segments_strategy(), rest in segments_strategy()) {
        let base_path = format!("/{}", base.join("/"));
        let full = format!("{base_path}/{}", rest.join("/"));
        let rel = rebase(&full, PathFlavor::Posix, Some(&base_path), RebaseDirection::ToRelative)
            .unwrap();
        prop_assert_eq!(&rel, &rest.join("/"));
        let abs = rebase(&rel, PathFlavor::Posix, Some(&base_path), RebaseDirection::ToAbsolute)
            .unwrap();
        prop_assert_eq!(abs, full);
    }

    // Relative results never escape more levels than the base has
    #[test]
    fn rebase_parent_count_bounded(base in segments_strategy(), other in segments_strategy()) {
        let base_path = format!("/b/{}", base.join("/"));
        let target = format!("/t/{}", other.join("/"));
        let rel = rebase(&target, PathFlavor::Posix, Some(&base_path), RebaseDirection::ToRelative)
            .unwrap();
        let ups = rel.split('/').filter(|s| *s == "..").count();
        prop_assert_eq!(ups, base.len() + 1);
    }
}
