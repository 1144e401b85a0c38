use std::{fs, path::Path};

use data_error::Result;

pub const DEVICE_ID_FILE: &str = ".device-id";

fn generate<P: AsRef<Path>>(device_id_path: P) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    fs::write(device_id_path, &id)?;
    Ok(id)
}

/// Read the id of this device from `root`, generating one on first use.
///
/// The id ends up in file names and must be treated as confidential if
/// the folder is synced to other machines.
pub fn load<P: AsRef<Path>>(root: P) -> Result<String> {
    let device_id_path = root.as_ref().join(DEVICE_ID_FILE);

    if device_id_path.exists() {
        Ok(fs::read_to_string(&device_id_path)?
            .trim()
            .to_owned())
    } else {
        generate(&device_id_path)
    }
}
