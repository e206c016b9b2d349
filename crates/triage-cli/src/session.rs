//! Presentation state: which page is showing and the last assessed department.
//!
//! Kept apart from the request pipeline, which holds no state at all.

use triage_core::Department;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Dashboard,
    FacilityFinder,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    page: Page,
    last: Option<Department>,
}

impl Session {
    pub fn page(&self) -> Page {
        self.page
    }

    /// Remember the department shown on the dashboard.
    pub fn record(&mut self, department: Department) {
        self.last = Some(department);
    }

    pub fn open_finder(&mut self) {
        self.page = Page::FacilityFinder;
    }

    pub fn back(&mut self) {
        self.page = Page::Dashboard;
    }

    /// Department the finder lists facilities for.
    pub fn finder_department(&self) -> Department {
        self.last.unwrap_or(Department::GeneralMedicine)
    }
}
