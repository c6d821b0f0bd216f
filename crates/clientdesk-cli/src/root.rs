use clientdesk_core::paths::CLIENTDESK_DIR;
use std::path::{Path, PathBuf};

/// Resolve the clientdesk root directory.
///
/// Priority:
/// 1. `--root` flag / `CLIENTDESK_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.clientdesk/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_from(&cwd, explicit)
}

fn resolve_from(cwd: &Path, explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    find_upward(cwd, CLIENTDESK_DIR)
        .or_else(|| find_upward(cwd, ".git"))
        .unwrap_or_else(|| cwd.to_path_buf())
}

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_from(Path::new("/elsewhere"), Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_clientdesk_dir_above_cwd() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".clientdesk")).unwrap();
        let subdir = dir.path().join("site/assets");
        std::fs::create_dir_all(&subdir).unwrap();
        assert_eq!(resolve_from(&subdir, None), dir.path());
    }

    #[test]
    fn clientdesk_dir_beats_git_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let project = dir.path().join("studio");
        std::fs::create_dir_all(project.join(".clientdesk")).unwrap();
        assert_eq!(resolve_from(&project, None), project);
    }

    #[test]
    fn falls_back_to_git_then_cwd() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("plain");
        std::fs::create_dir_all(&plain).unwrap();
        // The temp dir may itself live under a git checkout, so only assert
        // the .git case when it is ours.
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        assert_eq!(resolve_from(&plain, None), dir.path());
    }
}
