use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde_json::Value;
use tracing::{info, warn};

use crate::model::fs::FSError;

pub const CONFIG_FILE_NAME: &str = ".objectftp.json";

/// Backend-specific transfer parameters, e.g. `{"ContentType": "text/plain"}`.
pub type ObjectParams = BTreeMap<String, Value>;

/// Keeps only the parameters named in `recognized`.
///
/// Unknown names are dropped, or rejected with `InvalidObjectParameter`
/// (forwarding nothing) when `strict` is set.
pub fn filter_params(
    params: &ObjectParams,
    recognized: &[&str],
    strict: bool,
) -> Result<ObjectParams, FSError> {
    let mut filtered = ObjectParams::new();
    for (name, value) in params {
        if recognized.contains(&name.as_str()) {
            filtered.insert(name.clone(), value.clone());
        } else if strict {
            return Err(FSError::InvalidObjectParameter { name: name.clone() });
        }
    }

    Ok(filtered)
}

/// Reads one parameter file; a missing file yields `None`.
pub fn read_params_file(path: &Path) -> Result<Option<ObjectParams>, FSError> {
    let contents = match fs::read_to_string(path) {
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(FSError::local_io(path, err)),
        Ok(c) => c,
    };

    let value: Value =
        serde_json::from_str(&contents).map_err(|err| FSError::InvalidObjectParameter {
            name: format!("{}: {}", path.display(), err),
        })?;

    match value {
        Value::Object(map) => Ok(Some(map.into_iter().collect())),
        _ => Err(FSError::InvalidObjectParameter {
            name: format!("{}: expected a JSON object", path.display()),
        }),
    }
}

/// Merges the home-directory file, the current-directory file and the
/// command-line overrides, later sources winning.
pub fn load_default_params(
    cwd: &Path,
    home: Option<&Path>,
    overrides: ObjectParams,
) -> Result<ObjectParams, FSError> {
    let mut files: Vec<PathBuf> = Vec::new();
    if let Some(home) = home {
        files.push(home.join(CONFIG_FILE_NAME));
    }
    let local = cwd.join(CONFIG_FILE_NAME);
    if !files.contains(&local) {
        files.push(local);
    }

    let mut params = ObjectParams::new();
    for file in files {
        if let Some(loaded) = read_params_file(&file)? {
            info!(file=%file.display(), count=loaded.len(), "loaded default parameters");
            params.extend(loaded);
        }
    }

    params.extend(overrides);

    Ok(params)
}

/// Parses a `KEY=VALUE` command-line override. JSON values are kept as
/// JSON, anything else becomes a string.
pub fn parse_param_override(arg: &str) -> Result<(String, Value), FSError> {
    let (name, raw) = match arg.split_once('=') {
        Some((name, raw)) if !name.is_empty() => (name, raw),
        _ => {
            warn!(param = arg, "malformed parameter override");
            return Err(FSError::InvalidObjectParameter {
                name: arg.to_string(),
            });
        }
    };

    let value = match serde_json::from_str::<Value>(raw) {
        Ok(v @ Value::Object(_)) => v,
        _ => Value::String(raw.to_string()),
    };

    Ok((name.to_string(), value))
}
