//! Required-field checks for corpus entities

use crate::models::{Exercise, Theorem};
use validator::Validate;

/// An exercise is usable when it has an id, a category, a problem and a solution
pub fn validate_exercise(exercise: &Exercise) -> bool {
    exercise.validate().is_ok()
}

/// A theorem is usable when it has an id, a name and a statement
pub fn validate_theorem(theorem: &Theorem) -> bool {
    theorem.validate().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise() -> Exercise {
        Exercise {
            id: "LIM-001".into(),
            category: "Limiti".into(),
            subtype: String::new(),
            keywords: vec![],
            problem_text: "lim x->0 sin(x)/x".into(),
            worked_solution: "1".into(),
        }
    }

    #[test]
    fn test_complete_exercise_is_valid() {
        assert!(validate_exercise(&exercise()));
    }

    #[test]
    fn test_blank_required_field_rejected() {
        let blanked: [fn(&mut Exercise); 4] = [
            |e| e.id = "  ".into(),
            |e| e.category = "".into(),
            |e| e.problem_text = "\n\t".into(),
            |e| e.worked_solution = " ".into(),
        ];
        for blank in blanked {
            let mut e = exercise();
            blank(&mut e);
            assert!(!validate_exercise(&e));
        }
    }

    #[test]
    fn test_subtype_and_keywords_optional() {
        let mut e = exercise();
        e.subtype = " ".into();
        assert!(validate_exercise(&e));
    }

    #[test]
    fn test_theorem_validation() {
        let mut theorem = Theorem {
            id: "TH-1".into(),
            name: "Teorema di Lagrange".into(),
            statement: "Esiste c in (a,b)...".into(),
            ..Theorem::default()
        };
        assert!(validate_theorem(&theorem));
        theorem.statement = "   ".into();
        assert!(!validate_theorem(&theorem));
    }

    #[test]
    fn test_blank_fields_reported_by_name() {
        let mut e = exercise();
        e.id = " ".into();
        e.worked_solution = String::new();
        let errors = e.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("id"));
        assert!(fields.contains_key("worked_solution"));
        assert!(!fields.contains_key("category"));
    }
}
