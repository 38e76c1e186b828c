use crate::model::Experiment;

/// Experiment list plus the current selection and its loaded detail.
#[derive(Debug, Default)]
pub struct Catalog {
    experiments: Vec<Experiment>,
    selected_id: Option<String>,
    detail: Option<Experiment>,
    // Bumped on every selection; a detail load only commits with the latest value.
    detail_generation: u64,
}

impl Catalog {
    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected_id.as_deref()?;
        self.experiments.iter().position(|e| e.id == id)
    }

    /// Last loaded detail. Lags the selection while a load is in flight or after one failed.
    pub fn detail(&self) -> Option<&Experiment> {
        self.detail.as_ref()
    }

    /// Loaded detail, only when it belongs to the current selection.
    pub fn selected_detail(&self) -> Option<&Experiment> {
        self.detail
            .as_ref()
            .filter(|e| self.selected_id.as_deref() == Some(e.id.as_str()))
    }

    /// Replace the list wholesale. Returns the first row's id when nothing is selected yet,
    /// so the caller can select it.
    pub fn replace_experiments(&mut self, rows: Vec<Experiment>) -> Option<String> {
        self.experiments = rows;
        if self.selected_id.is_some() {
            return None;
        }
        self.experiments.first().map(|e| e.id.clone())
    }

    /// Select `id` and return the generation its detail load must carry.
    pub fn select(&mut self, id: String) -> u64 {
        self.detail_generation += 1;
        self.selected_id = Some(id);
        self.detail_generation
    }

    /// Whether a detail load for `(id, generation)` still matches the selection.
    pub fn is_current(&self, id: &str, generation: u64) -> bool {
        generation == self.detail_generation && self.selected_id.as_deref() == Some(id)
    }

    pub fn commit_detail(&mut self, id: &str, generation: u64, experiment: Experiment) -> bool {
        if !self.is_current(id, generation) {
            return false;
        }
        self.detail = Some(experiment);
        true
    }

    /// Id of the row `offset` positions away from the selection, clamped to the list.
    pub fn neighbor_id(&self, offset: isize) -> Option<String> {
        if self.experiments.is_empty() {
            return None;
        }
        let last = self.experiments.len() - 1;
        let next = match self.selected_index() {
            Some(idx) => idx.saturating_add_signed(offset).min(last),
            None => 0,
        };
        if Some(next) == self.selected_index() {
            return None;
        }
        self.experiments.get(next).map(|e| e.id.clone())
    }
}
