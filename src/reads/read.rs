/// Sequenced read; lowercase bases mark low-quality calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    pub id: String,
    pub bases: String,
}

impl Read {
    pub fn new(id: impl Into<String>, bases: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bases: bases.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}
