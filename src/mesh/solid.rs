use super::Mesh;

slotmap::new_key_type! {
    /// Identifier of a live solid in a layer stack.
    pub struct SolidId;
}

/// A closed mesh together with its provisional or final layer label.
#[derive(Debug, Clone, PartialEq)]
pub struct Solid {
    pub label: String,
    pub mesh: Mesh,
    /// Sort key for labelling: the highest vertex elevation.
    pub elevation: f64,
}

impl Solid {
    #[must_use]
    pub fn new(label: impl Into<String>, mesh: Mesh) -> Self {
        let elevation = mesh.max_z();
        Self {
            label: label.into(),
            mesh,
            elevation,
        }
    }

    /// Returns the same solid under a different label.
    #[must_use]
    pub fn relabeled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}
