//! Plain XYZ reader and writer for non-periodic structures.

use super::ParseError;
use crate::core::models::structure::{Site, Structure};
use std::fmt::Write;

/// Parses a plain XYZ file: an atom count, a comment line, then one
/// `symbol x y z` line per atom (coordinates in Ångstrom).
pub fn parse_xyz(content: &str) -> Result<Structure, ParseError> {
    let mut lines = content.lines().enumerate();

    let (_, count_line) = lines
        .next()
        .ok_or_else(|| ParseError::syntax(1, "empty file"))?;
    let count: usize = count_line
        .trim()
        .parse()
        .map_err(|_| ParseError::syntax(1, format!("invalid atom count `{}`", count_line.trim())))?;

    // Comment line, ignored.
    lines.next();

    let mut sites = Vec::with_capacity(count);
    for (index, line) in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let symbol = fields
            .next()
            .ok_or_else(|| ParseError::syntax(index + 1, "missing element symbol"))?;
        let mut coordinate = |axis: &str| -> Result<f64, ParseError> {
            fields
                .next()
                .ok_or_else(|| ParseError::syntax(index + 1, format!("missing {axis} coordinate")))?
                .parse()
                .map_err(|_| ParseError::syntax(index + 1, format!("invalid {axis} coordinate")))
        };
        let (x, y, z) = (coordinate("x")?, coordinate("y")?, coordinate("z")?);
        sites.push(Site::new(symbol, [x, y, z]));
    }

    if sites.len() != count {
        return Err(ParseError::syntax(
            1,
            format!("expected {count} atoms, found {}", sites.len()),
        ));
    }

    Ok(Structure::molecule(sites)?)
}

/// Formats a structure as plain XYZ. Any lattice is dropped.
pub fn format_xyz(structure: &Structure) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", structure.num_sites());
    let _ = writeln!(out, "{}", structure.formula());
    for site in structure.sites() {
        let p = &site.position;
        let _ = writeln!(out, "{} {:18.12} {:18.12} {:18.12}", site.symbol, p.x, p.y, p.z);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_molecule() {
        let content = "3\nwater\nO 0.0 0.0 0.0\nH 0.757 0.586 0.0\nH -0.757 0.586 0.0\n";
        let structure = parse_xyz(content).unwrap();
        assert_eq!(structure.num_sites(), 3);
        assert_eq!(structure.sites()[0].symbol, "O");
        assert!((structure.sites()[1].position.x - 0.757).abs() < 1e-12);
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let content = "4\ncomment\nO 0.0 0.0 0.0\n";
        assert!(matches!(
            parse_xyz(content),
            Err(ParseError::Syntax { .. })
        ));
    }

    #[test]
    fn invalid_coordinate_reports_its_line() {
        let content = "1\ncomment\nO 0.0 oops 0.0\n";
        match parse_xyz(content) {
            Err(ParseError::Syntax { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }
}
