//! Keyword-based assignment of the responsible municipal department.

/// Ordered keyword table. Keywords can overlap, so iteration order is part
/// of the contract: the first matching keyword wins.
const DEPARTMENT_ROUTES: &[(&str, &str)] = &[
    ("pothole", "Roads Department"),
    ("damaged road", "Roads Department"),
    ("garbage", "Sanitation Department"),
    ("open drain", "Drainage Department"),
    ("water logging", "Drainage Department"),
    ("broken streetlight", "Electrical Department"),
];

const DEFAULT_DEPARTMENT: &str = "General Municipal Services";

/// Map an issue label to its responsible department by substring match
/// against the lowercased label.
pub fn assign_department(label: &str) -> &'static str {
    let label = label.to_lowercase();
    for (keyword, department) in DEPARTMENT_ROUTES {
        if label.contains(keyword) {
            return department;
        }
    }
    DEFAULT_DEPARTMENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_labels_route() {
        assert_eq!(assign_department("pothole"), "Roads Department");
        assert_eq!(assign_department("garbage pile"), "Sanitation Department");
        assert_eq!(assign_department("open drain"), "Drainage Department");
        assert_eq!(assign_department("water logging"), "Drainage Department");
    }

    #[test]
    fn substring_and_case_insensitive() {
        assert_eq!(
            assign_department("Broken Streetlight near park"),
            "Electrical Department"
        );
        assert_eq!(assign_department("POTHOLE ON ROAD"), "Roads Department");
    }

    #[test]
    fn unknown_labels_get_general_services() {
        assert_eq!(assign_department("unknown debris"), "General Municipal Services");
        assert_eq!(assign_department(""), "General Municipal Services");
    }
}
