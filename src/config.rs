//! Group partitions as an explicit input artifact.
//!
//! Which segments regularize together is a configuration concern, not
//! something the engine infers: a JSON file carries an ordered list of index
//! sets, e.g. `{"groups": [[0, 1, 2], [7, 8, 9, 10]]}`.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Error;

#[derive(Debug, Deserialize)]
pub struct GroupsConfig {
    pub groups: Vec<Vec<usize>>,
}

/// Loads a group partition from a JSON file.
pub fn load_groups(path: &Path) -> Result<Vec<Vec<usize>>, Error> {
    let data = fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    let config: GroupsConfig = serde_json::from_str(&data).map_err(|e| Error::Config {
        message: format!("failed to parse {}: {e}", path.display()),
    })?;
    Ok(config.groups)
}
