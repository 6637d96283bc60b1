/// Folder names used by the packaged metadata tree, one per supported build
/// target. The `macos` folder keeps its historical `OSX` name so existing
/// packaged content stays addressable.
const PLATFORM_FOLDERS: &[(&str, &str)] = &[
    ("android", "Android"),
    ("ios", "iOS"),
    ("windows", "Windows"),
    ("macos", "OSX"),
    ("osx", "OSX"),
    ("webgl", "WebGL"),
];

/// Maps a build-target identifier to its platform artifact folder.
///
/// Total over any input: unrecognized identifiers yield `None`, never a
/// default folder and never a panic.
pub fn resolve_platform_folder(build_target: &str) -> Option<&'static str> {
    let build_target = build_target.trim();
    PLATFORM_FOLDERS
        .iter()
        .find(|(identifier, _)| identifier.eq_ignore_ascii_case(build_target))
        .map(|(_, folder)| *folder)
}

#[cfg(test)]
mod tests {
    use super::resolve_platform_folder;

    #[test]
    fn resolves_known_targets_case_insensitively() {
        assert_eq!(resolve_platform_folder("android"), Some("Android"));
        assert_eq!(resolve_platform_folder("iOS"), Some("iOS"));
        assert_eq!(resolve_platform_folder("WINDOWS"), Some("Windows"));
        assert_eq!(resolve_platform_folder("macos"), Some("OSX"));
        assert_eq!(resolve_platform_folder("osx"), Some("OSX"));
        assert_eq!(resolve_platform_folder("webgl"), Some("WebGL"));
    }

    #[test]
    fn unknown_targets_resolve_to_none() {
        assert_eq!(resolve_platform_folder("linux"), None);
        assert_eq!(resolve_platform_folder(""), None);
        assert_eq!(resolve_platform_folder("  "), None);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(resolve_platform_folder(" android "), Some("Android"));
    }
}
