//! # File I/O
//!
//! Reading and writing atomic structures from disk. Two formats are supported:
//! plain XYZ for molecules ([`xyz`]) and VASP POSCAR for crystals ([`poscar`]).
//! [`read_structure`] and [`write_structure`] dispatch on the file name.

pub mod poscar;
pub mod xyz;

use crate::core::models::structure::{Structure, StructureError};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("parsed structure is invalid: {source}")]
    Structure {
        #[from]
        source: StructureError,
    },

    #[error("cannot determine the format of `{0}`; expected an .xyz, .poscar or .vasp file, or a POSCAR/CONTCAR file name")]
    UnknownFormat(String),
}

impl ParseError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Xyz,
    Poscar,
}

fn detect_format(path: &Path) -> Result<Format, ParseError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if name.starts_with("POSCAR") || name.starts_with("CONTCAR") {
        return Ok(Format::Poscar);
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("xyz") => Ok(Format::Xyz),
        Some("poscar") | Some("vasp") => Ok(Format::Poscar),
        _ => Err(ParseError::UnknownFormat(path.display().to_string())),
    }
}

/// Reads a structure from `path`, inferring the format from the file name.
pub fn read_structure(path: &Path) -> Result<Structure, ParseError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    match format {
        Format::Xyz => xyz::parse_xyz(&content),
        Format::Poscar => poscar::parse_poscar(&content),
    }
}

/// Writes a structure to `path`, inferring the format from the file name.
///
/// Non-periodic structures can only be written as XYZ; periodic structures as POSCAR.
pub fn write_structure(structure: &Structure, path: &Path) -> Result<(), ParseError> {
    let format = detect_format(path)?;
    let content = match format {
        Format::Xyz => xyz::format_xyz(structure),
        Format::Poscar => {
            if !structure.is_periodic() {
                return Err(ParseError::syntax(
                    0,
                    "cannot write a non-periodic structure as POSCAR",
                ));
            }
            poscar::format_poscar(structure)
        }
    };
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::structure::{Lattice, Site};

    #[test]
    fn round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();

        let molecule = Structure::molecule(vec![
            Site::new("O", [0.0, 0.0, 0.0]),
            Site::new("H", [0.757, 0.586, 0.0]),
            Site::new("H", [-0.757, 0.586, 0.0]),
        ])
        .unwrap();
        let xyz_path = dir.path().join("water.xyz");
        write_structure(&molecule, &xyz_path).unwrap();
        let reread = read_structure(&xyz_path).unwrap();
        assert_eq!(reread.num_sites(), 3);
        assert!(!reread.is_periodic());

        let crystal = Structure::crystal(
            Lattice::cubic(3.6),
            vec![Site::new("Cu", [0.0, 0.0, 0.0])],
        )
        .unwrap();
        let poscar_path = dir.path().join("POSCAR");
        write_structure(&crystal, &poscar_path).unwrap();
        let reread = read_structure(&poscar_path).unwrap();
        assert!(reread.is_periodic());
        assert!((reread.volume().unwrap() - crystal.volume().unwrap()).abs() < 1e-6);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = read_structure(Path::new("structure.cube")).unwrap_err();
        assert!(matches!(err, ParseError::UnknownFormat(_)));
    }
}
