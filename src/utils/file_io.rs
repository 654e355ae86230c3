use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use crate::error::{ReflectionError, Result};

pub fn read_file_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ReflectionError::FileNotFound(path.to_path_buf()));
    }
    let mut file = File::open(path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(data)
}

pub fn write_file_bytes<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    Ok(())
}

pub fn create_dir_all<P: AsRef<Path>>(path: P) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

pub fn read_network<P: AsRef<Path>>(path: P) -> Result<crate::NetworkDescription> {
    let data = read_file_bytes(path)?;
    crate::network_from_bytes(&data)
}
