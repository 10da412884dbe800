use crate::models::FilterSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterCategory {
    Source,
    Experience,
    SustainabilityExperience,
    Competencies,
    Sectors,
}

impl FilterCategory {
    pub const ALL: [FilterCategory; 5] = [
        Self::Source,
        Self::Experience,
        Self::SustainabilityExperience,
        Self::Competencies,
        Self::Sectors,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "source" | "sources" => Some(Self::Source),
            "experience" => Some(Self::Experience),
            "sustainability" | "sustainability-experience" => {
                Some(Self::SustainabilityExperience)
            }
            "competency" | "competencies" => Some(Self::Competencies),
            "sector" | "sectors" => Some(Self::Sectors),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Source => "Source",
            Self::Experience => "Experience",
            Self::SustainabilityExperience => "Sustainability Experience",
            Self::Competencies => "Competencies",
            Self::Sectors => "Sectors",
        }
    }
}

impl FilterSet {
    pub fn list(&self, category: FilterCategory) -> &Vec<String> {
        match category {
            FilterCategory::Source => &self.source,
            FilterCategory::Experience => &self.experience,
            FilterCategory::SustainabilityExperience => &self.sustainability_experience,
            FilterCategory::Competencies => &self.competencies,
            FilterCategory::Sectors => &self.sectors,
        }
    }

    pub fn list_mut(&mut self, category: FilterCategory) -> &mut Vec<String> {
        match category {
            FilterCategory::Source => &mut self.source,
            FilterCategory::Experience => &mut self.experience,
            FilterCategory::SustainabilityExperience => &mut self.sustainability_experience,
            FilterCategory::Competencies => &mut self.competencies,
            FilterCategory::Sectors => &mut self.sectors,
        }
    }

    pub fn len(&self) -> usize {
        FilterCategory::ALL
            .iter()
            .map(|c| self.list(*c).len())
            .sum()
    }
}

/// Checkbox state of the filter panel.
///
/// Ticking a box only changes `selected`. Searches send `applied`, which is
/// replaced wholesale by [`FilterState::apply`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    selected: FilterSet,
    applied: FilterSet,
    panel_open: bool,
}

impl FilterState {
    pub fn selected(&self) -> &FilterSet {
        &self.selected
    }

    pub fn applied(&self) -> &FilterSet {
        &self.applied
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn set_panel_open(&mut self, open: bool) {
        self.panel_open = open;
    }

    /// Checks or unchecks one value. Checking keeps first-checked order and
    /// never duplicates.
    pub fn set_checked(&mut self, category: FilterCategory, value: &str, checked: bool) {
        let list = self.selected.list_mut(category);
        let present = list.iter().any(|v| v == value);
        if checked && !present {
            list.push(value.to_string());
        } else if !checked && present {
            list.retain(|v| v != value);
        }
    }

    pub fn is_checked(&self, category: FilterCategory, value: &str) -> bool {
        self.selected.list(category).iter().any(|v| v == value)
    }

    /// Commits the current checkboxes; returns the new applied set.
    pub fn apply(&mut self) -> &FilterSet {
        self.applied = self.selected.clone();
        &self.applied
    }

    pub fn clear(&mut self) {
        self.selected = FilterSet::default();
        self.applied = FilterSet::default();
    }

    /// True when checkboxes differ from what the last search used.
    pub fn has_pending_changes(&self) -> bool {
        self.selected != self.applied
    }
}
