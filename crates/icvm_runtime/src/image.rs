//! Program images in `MessagePack` format.
//!
//! An image is a built [`Program`] plus the parameter declarations a host
//! supplied for it, so `icvm run prog.icb` needs no `--params` flags.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use icvm_foundation::{Error, ErrorKind, Result};
use icvm_language::Program;
use serde::{Deserialize, Serialize};

/// Image format version written by this crate.
pub const IMAGE_VERSION: u32 = 1;

/// A serializable program with its function signatures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramImage {
    /// Format version; images with a different version are rejected.
    pub version: u32,
    /// The built program.
    pub program: Program,
    /// Formal parameters per function name, in declaration order.
    pub params: Vec<(String, Vec<String>)>,
}

impl ProgramImage {
    /// Wraps a program with no parameter declarations.
    #[must_use]
    pub const fn new(program: Program) -> Self {
        Self {
            version: IMAGE_VERSION,
            program,
            params: Vec::new(),
        }
    }

    /// Records parameter declarations.
    #[must_use]
    pub fn with_params(mut self, params: Vec<(String, Vec<String>)>) -> Self {
        self.params = params;
        self
    }
}

/// Serializes an image to bytes.
///
/// Uses named serialization to preserve struct field names.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(image: &ProgramImage) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(image).map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}

/// Deserializes an image from bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not an image, the version differs, or
/// the program fails [`Program::validate`].
pub fn from_bytes(bytes: &[u8]) -> Result<ProgramImage> {
    let image: ProgramImage = rmp_serde::from_slice(bytes)
        .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))?;
    if image.version != IMAGE_VERSION {
        return Err(Error::new(ErrorKind::Serialization(format!(
            "unsupported image version {} (expected {IMAGE_VERSION})",
            image.version
        ))));
    }
    check_program(&image.program)?;
    Ok(image)
}

/// Rejects a program whose targets or label table do not line up.
pub(crate) fn check_program(program: &Program) -> Result<()> {
    program
        .validate()
        .map_err(|e| Error::new(ErrorKind::Serialization(format!("invalid program image: {e}"))))
}

/// Saves an image to a file, replacing any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be written or serialization fails.
pub fn save_to_file<P: AsRef<Path>>(image: &ProgramImage, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(image)?;
    let file = File::create(path)
        .map_err(|e| Error::io(format!("failed to create file '{}': {e}", path.display())))?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .and_then(|()| writer.flush())
        .map_err(|e| Error::io(format!("failed to write file '{}': {e}", path.display())))
}

/// Loads an image from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid image.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<ProgramImage> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::io(format!("failed to open file '{}': {e}", path.display())))?;

    let mut bytes = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(format!("failed to read file '{}': {e}", path.display())))?;

    from_bytes(&bytes)
}
