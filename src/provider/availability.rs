use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// True when `binary` is an executable path, or a bare name found on `PATH`.
pub fn is_binary_available(binary: &str) -> bool {
    is_binary_available_in(binary, std::env::var_os("PATH").as_deref())
}

pub fn is_binary_available_in(binary: &str, path_var: Option<&std::ffi::OsStr>) -> bool {
    if binary.trim().is_empty() {
        return false;
    }
    let explicit = Path::new(binary);
    if explicit.components().count() > 1 || explicit.is_absolute() {
        return is_executable_file(explicit);
    }

    let Some(path) = path_var else {
        return false;
    };
    std::env::split_paths(path).any(|dir| {
        let candidate = dir.join(binary);
        if is_executable_file(&candidate) {
            return true;
        }
        #[cfg(windows)]
        {
            if is_executable_file(&dir.join(format!("{binary}.exe"))) {
                return true;
            }
        }
        false
    })
}

fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
