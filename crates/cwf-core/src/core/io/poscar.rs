//! VASP POSCAR reader and writer for periodic structures.
//!
//! ```text
//! Comment line
//! 1.0                    # universal scaling factor
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+)
//! n1 n2 ...              # atoms per element
//! Selective dynamics     # optional, ignored
//! Direct | Cartesian
//! x1 y1 z1
//! ...
//! ```

use super::ParseError;
use crate::core::models::structure::{Lattice, Site, Structure};
use nalgebra::Vector3;
use std::fmt::Write;

pub fn parse_poscar(content: &str) -> Result<Structure, ParseError> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 8 {
        return Err(ParseError::syntax(lines.len(), "file too short for POSCAR"));
    }

    let scale: f64 = lines[1]
        .trim()
        .parse()
        .map_err(|_| ParseError::syntax(2, "invalid scaling factor"))?;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ParseError::syntax(2, "scaling factor must be positive"));
    }

    let mut vectors = [[0.0; 3]; 3];
    for i in 0..3 {
        let fields: Vec<f64> = lines[2 + i]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if fields.len() < 3 {
            return Err(ParseError::syntax(3 + i, "invalid lattice vector"));
        }
        vectors[i] = [fields[0] * scale, fields[1] * scale, fields[2] * scale];
    }
    let lattice = Lattice::from_vectors(vectors);

    let symbols: Vec<&str> = lines[5].split_whitespace().collect();
    if symbols.is_empty() || symbols[0].parse::<u64>().is_ok() {
        // VASP 4 files carry no symbol line; the common interface needs species.
        return Err(ParseError::syntax(
            6,
            "missing element symbol line (VASP 4 format is not supported)",
        ));
    }
    let counts: Vec<usize> = lines[6]
        .split_whitespace()
        .map(|s| {
            s.parse()
                .map_err(|_| ParseError::syntax(7, format!("invalid atom count `{s}`")))
        })
        .collect::<Result<_, _>>()?;
    if counts.len() != symbols.len() {
        return Err(ParseError::syntax(7, "atom counts do not match symbols"));
    }

    let mut cursor = 7;
    if lines
        .get(cursor)
        .is_some_and(|l| l.trim_start().starts_with(['S', 's']))
    {
        cursor += 1; // Selective dynamics
    }
    let direct = match lines
        .get(cursor)
        .and_then(|l| l.trim_start().chars().next())
    {
        Some('D') | Some('d') => true,
        Some('C') | Some('c') | Some('K') | Some('k') => false,
        _ => {
            return Err(ParseError::syntax(
                cursor + 1,
                "expected `Direct` or `Cartesian`",
            ));
        }
    };
    cursor += 1;

    let total: usize = counts.iter().sum();
    let mut sites = Vec::with_capacity(total);
    let mut coordinate_lines = lines[cursor..].iter().enumerate();
    for (symbol, count) in symbols.iter().zip(&counts) {
        for _ in 0..*count {
            let (offset, line) = loop {
                match coordinate_lines.next() {
                    Some((offset, line)) if !line.trim().is_empty() => break (offset, line),
                    Some(_) => continue,
                    None => {
                        return Err(ParseError::syntax(
                            lines.len(),
                            format!("expected {total} coordinate lines"),
                        ));
                    }
                }
            };
            let fields: Vec<f64> = line
                .split_whitespace()
                .take(3)
                .filter_map(|s| s.parse().ok())
                .collect();
            if fields.len() < 3 {
                return Err(ParseError::syntax(cursor + offset + 1, "invalid coordinate"));
            }
            let position = if direct {
                let fractional = Vector3::from([fields[0], fields[1], fields[2]]);
                lattice.matrix().transpose() * fractional
            } else {
                Vector3::from([fields[0] * scale, fields[1] * scale, fields[2] * scale])
            };
            sites.push(Site::new(*symbol, [position.x, position.y, position.z]));
        }
    }

    Ok(Structure::crystal(lattice, sites)?)
}

/// Formats a periodic structure as a Cartesian POSCAR.
pub fn format_poscar(structure: &Structure) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", structure.formula());
    let _ = writeln!(out, "1.0");
    if let Some(lattice) = structure.lattice() {
        for i in 0..3 {
            let v = lattice.vector(i);
            let _ = writeln!(out, "  {:18.12} {:18.12} {:18.12}", v.x, v.y, v.z);
        }
    }

    // Group consecutive runs of the same symbol, preserving site order.
    let mut groups: Vec<(String, usize)> = Vec::new();
    for site in structure.sites() {
        match groups.last_mut() {
            Some((symbol, count)) if *symbol == site.symbol => *count += 1,
            _ => groups.push((site.symbol.clone(), 1)),
        }
    }
    let symbols: Vec<&str> = groups.iter().map(|(s, _)| s.as_str()).collect();
    let counts: Vec<String> = groups.iter().map(|(_, c)| c.to_string()).collect();
    let _ = writeln!(out, "{}", symbols.join(" "));
    let _ = writeln!(out, "{}", counts.join(" "));
    let _ = writeln!(out, "Cartesian");
    for site in structure.sites() {
        let p = &site.position;
        let _ = writeln!(out, "  {:18.12} {:18.12} {:18.12}", p.x, p.y, p.z);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SILICON: &str = "\
Si2
1.0
  0.000000 2.715000 2.715000
  2.715000 0.000000 2.715000
  2.715000 2.715000 0.000000
Si
2
Direct
  0.00 0.00 0.00
  0.25 0.25 0.25
";

    #[test]
    fn parses_direct_coordinates() {
        let structure = parse_poscar(SILICON).unwrap();
        assert_eq!(structure.num_sites(), 2);
        let second = &structure.sites()[1].position;
        // 0.25 * (a + b + c) with each vector summing to (5.43, 5.43, 5.43) / 2.
        assert_relative_eq!(second.x, 1.3575, epsilon = 1e-9);
        assert_relative_eq!(second.y, 1.3575, epsilon = 1e-9);
        assert_relative_eq!(second.z, 1.3575, epsilon = 1e-9);
    }

    #[test]
    fn round_trips_through_cartesian_output() {
        let structure = parse_poscar(SILICON).unwrap();
        let reread = parse_poscar(&format_poscar(&structure)).unwrap();
        assert_relative_eq!(
            reread.volume().unwrap(),
            structure.volume().unwrap(),
            epsilon = 1e-9
        );
        for (a, b) in structure.sites().iter().zip(reread.sites()) {
            assert_relative_eq!(a.position.coords, b.position.coords, epsilon = 1e-9);
        }
    }

    #[test]
    fn scaling_factor_applies_to_lattice_and_cartesian_coordinates() {
        let content = "\
Cu
2.0
  1.8 0.0 0.0
  0.0 1.8 0.0
  0.0 0.0 1.8
Cu
1
Cartesian
  0.0 0.0 0.0
";
        let structure = parse_poscar(content).unwrap();
        assert_relative_eq!(structure.volume().unwrap(), 3.6_f64.powi(3), epsilon = 1e-9);
    }

    #[test]
    fn vasp4_files_are_rejected() {
        let content = "\
comment
1.0
  1.0 0.0 0.0
  0.0 1.0 0.0
  0.0 0.0 1.0
1
Direct
  0.0 0.0 0.0
";
        assert!(matches!(
            parse_poscar(content),
            Err(ParseError::Syntax { line: 6, .. })
        ));
    }
}
