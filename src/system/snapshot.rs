use super::process::ProcessSample;

/// One enumeration pass over the process registry. Order carries no meaning.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub processes: Vec<ProcessSample>,
    /// Entries that looked like processes but could not be read.
    pub skipped: usize,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessSample> {
        self.processes.iter()
    }
}

impl From<Vec<ProcessSample>> for Snapshot {
    fn from(processes: Vec<ProcessSample>) -> Self {
        Snapshot {
            processes,
            skipped: 0,
        }
    }
}
