use super::system::MolecularSystem;

/// One coordinate model within a structure file.
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// Model number from the source file (`pdbx_PDB_model_num` / `MODEL`).
    pub number: i32,
    /// The atoms, residues and chains of this model.
    pub system: MolecularSystem,
}

/// A parsed structure file: an identifier plus one or more coordinate models.
///
/// Crystal structures usually carry a single model; NMR ensembles and
/// diffusion-sampler outputs carry several. The identifier comes from the
/// mmCIF `data_` block (or the file stem, truncated to ten characters, when
/// the block is absent).
#[derive(Debug, Clone, Default)]
pub struct Structure {
    pub id: String,
    pub models: Vec<Model>,
}

impl Structure {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            models: Vec::new(),
        }
    }

    /// Returns the model with the given number, if present.
    pub fn model(&self, number: i32) -> Option<&Model> {
        self.models.iter().find(|m| m.number == number)
    }

    /// Total atom count across all models.
    pub fn atom_count(&self) -> usize {
        self.models.iter().map(|m| m.system.atom_count()).sum()
    }

    /// Returns `true` when no model holds any atoms.
    pub fn is_empty(&self) -> bool {
        self.models.iter().all(|m| m.system.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_lookup_by_number() {
        let mut structure = Structure::new("1abc");
        structure.models.push(Model {
            number: 1,
            system: MolecularSystem::new(),
        });
        structure.models.push(Model {
            number: 2,
            system: MolecularSystem::new(),
        });

        assert!(structure.model(1).is_some());
        assert!(structure.model(2).is_some());
        assert!(structure.model(3).is_none());
        assert!(structure.is_empty());
        assert_eq!(structure.atom_count(), 0);
    }
}
