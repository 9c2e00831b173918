use std::path::{Component, Path, PathBuf};

/// Lexically resolve `.` and `..` without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    let mut result = PathBuf::new();
    for component in parts {
        result.push(component.as_os_str());
    }
    result
}

/// Path to `target` expressed relative to the directory `base`.
///
/// Both paths are normalized first and should share the same anchor (both absolute, or both relative
/// to the same directory). Symlinks along either path are not resolved, so the result is only correct
/// when read from `base` as spelled.
pub fn relative_to(target: &Path, base: &Path) -> PathBuf {
    let target = normalize(target);
    let base = normalize(base);

    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = target_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base_parts.len() {
        result.push("..");
    }
    for component in &target_parts[common..] {
        result.push(component.as_os_str());
    }

    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}

/// Path components as UTF-8 (lossy) segments, skipping root and prefix.
pub fn segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a/b/..")), PathBuf::from("../a"));
    }

    #[test]
    fn test_relative_to_same_dir() {
        assert_eq!(
            relative_to(Path::new("/r/cam/d/clip.mkv"), Path::new("/r/cam/d")),
            PathBuf::from("clip.mkv")
        );
    }

    #[test]
    fn test_relative_to_by_camera_bucket() {
        let src = Path::new(
            "/data/camera-lobby/20140428/19/20140428_191525_8085_ABC/20140428_19/20140428_191525_D751_ABC.mkv",
        );
        let base = Path::new("/data/camera-lobby/20140428");
        assert_eq!(
            relative_to(src, base),
            PathBuf::from("19/20140428_191525_8085_ABC/20140428_19/20140428_191525_D751_ABC.mkv")
        );
    }

    #[test]
    fn test_relative_to_sibling_tree() {
        let src = Path::new("/data/camera-lobby/20140428/19/cap/20140428_19/clip.mkv");
        let base = Path::new("/data/camera-ALL-bydate/20140428");
        assert_eq!(
            relative_to(src, base),
            PathBuf::from("../../camera-lobby/20140428/19/cap/20140428_19/clip.mkv")
        );
    }

    #[test]
    fn test_relative_to_identical() {
        assert_eq!(relative_to(Path::new("/a/b"), Path::new("/a/b")), PathBuf::from("."));
    }

    #[test]
    fn test_segments_skip_root() {
        assert_eq!(segments(Path::new("/a/b/c")), vec!["a", "b", "c"]);
    }
}
