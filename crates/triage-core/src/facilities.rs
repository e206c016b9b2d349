//! Static directory of nearby treatment centres, consulted for display only.

use serde::Serialize;

use crate::triage::Department;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Facility {
    pub name: &'static str,
    pub distance: &'static str,
    pub address: &'static str,
}

const CARDIOLOGY: &[Facility] = &[
    Facility {
        name: "City Heart Institute",
        distance: "1.2 miles",
        address: "101 Cardiac Way",
    },
    Facility {
        name: "St. Jude's Vascular Center",
        distance: "3.5 miles",
        address: "44 Heart St.",
    },
];

const NEUROLOGY: &[Facility] = &[
    Facility {
        name: "Neuro-Link Specialty Hospital",
        distance: "0.8 miles",
        address: "22 Brain Ave.",
    },
    Facility {
        name: "Cerebral Health Clinic",
        distance: "4.1 miles",
        address: "900 Grey Matter Dr.",
    },
];

const EMERGENCY: &[Facility] = &[
    Facility {
        name: "General Trauma Center",
        distance: "0.5 miles",
        address: "1 Emergency Rd. (24/7)",
    },
    Facility {
        name: "Metro Urgent Care",
        distance: "2.2 miles",
        address: "55 Rapid Response Ln.",
    },
];

const GENERAL_MEDICINE: &[Facility] = &[
    Facility {
        name: "Community Health Plaza",
        distance: "1.1 miles",
        address: "77 Wellness Blvd.",
    },
    Facility {
        name: "Primary Care Partners",
        distance: "2.9 miles",
        address: "31 Family Row",
    },
];

/// Facilities serving a department, nearest first.
pub fn facilities_for(department: Department) -> &'static [Facility] {
    match department {
        Department::GeneralMedicine => GENERAL_MEDICINE,
        Department::Cardiology => CARDIOLOGY,
        Department::Neurology => NEUROLOGY,
        Department::Emergency => EMERGENCY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_department_has_facilities() {
        for d in Department::ALL {
            assert!(!facilities_for(d).is_empty(), "{d} has no facilities");
        }
    }

    #[test]
    fn cardiology_listing_order() {
        let names: Vec<_> = facilities_for(Department::Cardiology)
            .iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(
            names,
            ["City Heart Institute", "St. Jude's Vascular Center"]
        );
    }

    #[test]
    fn emergency_nearest_first() {
        assert_eq!(
            facilities_for(Department::Emergency)[0].name,
            "General Trauma Center"
        );
    }
}
