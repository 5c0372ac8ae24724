use std::path::{Path, PathBuf};

use crate::error::DispatchError;

/// Build the statement that loads `path` into the interpreter:
/// `import * as {base} from "{base}"` plus a newline, where `{base}` is the
/// file name without directory or extension.
///
/// The base name doubles as the module specifier, so the interpreter must be
/// able to resolve it on its own (typically by running from that directory).
pub fn import_statement(path: &Path) -> Result<String, DispatchError> {
    let base = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| DispatchError::InvalidFileName(path.to_path_buf()))?;
    Ok(format!("import * as {base} from \"{base}\"\n"))
}

/// Resolve `path` against the working directory. The file need not exist.
pub(crate) fn absolute_path(path: &Path) -> Result<PathBuf, DispatchError> {
    std::path::absolute(path).map_err(|source| DispatchError::Resolve {
        path: path.to_path_buf(),
        source,
    })
}
