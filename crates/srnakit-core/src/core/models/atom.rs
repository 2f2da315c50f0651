use super::ids::ResidueId;
use nalgebra::Point3;

/// Represents a single atom record from a structure file.
///
/// Carries everything the conversion pipeline and the PDB writer need:
/// identity within the source file (serial, name), the alternate-location
/// bookkeeping used by occupancy-based selection, and the display fields
/// (B-factor, element) that survive into the output.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Atom serial number from the source file.
    pub serial: u32,
    /// The atom name (e.g., "CA", "N", "O5'").
    pub name: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// Element symbol when the source file provides one.
    pub element: Option<String>,
    /// Alternate location indicator; `None` for the blank/default location.
    pub altloc: Option<char>,
    /// Fractional occupancy of this location. Missing values default to 1.0.
    pub occupancy: f64,
    /// Isotropic B-factor (or pLDDT in prediction outputs).
    pub b_factor: f64,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Whether the source record was HETATM rather than ATOM.
    pub is_hetero: bool,
}

impl Atom {
    /// Creates a new `Atom` with default values for the optional fields.
    ///
    /// The atom starts with full occupancy, no altloc, no element, and a
    /// zero B-factor; parsers overwrite whichever fields the file provides.
    pub fn new(serial: u32, name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            serial,
            name: name.to_string(),
            residue_id,
            element: None,
            altloc: None,
            occupancy: 1.0,
            b_factor: 0.0,
            position,
            is_hetero: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::ResidueId;
    use nalgebra::Point3;

    #[test]
    fn new_atom_has_expected_default_fields() {
        let residue_id = ResidueId::default();
        let atom = Atom::new(7, "CA", residue_id, Point3::new(1.0, 2.0, 3.0));

        assert_eq!(atom.serial, 7);
        assert_eq!(atom.name, "CA");
        assert_eq!(atom.residue_id, residue_id);
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.element, None);
        assert_eq!(atom.altloc, None);
        assert_eq!(atom.occupancy, 1.0);
        assert_eq!(atom.b_factor, 0.0);
        assert!(!atom.is_hetero);
    }

    #[test]
    fn atom_equality_and_clone_works() {
        let residue_id = ResidueId::default();
        let mut atom1 = Atom::new(1, "N", residue_id, Point3::new(0.0, 0.0, 0.0));
        atom1.altloc = Some('B');
        atom1.occupancy = 0.4;
        let atom2 = atom1.clone();
        assert_eq!(atom1, atom2);
    }
}
