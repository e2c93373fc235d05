// Picks "the current term" out of a term list.

use crate::error::{Result, WhapiError};
use crate::model::Term;

/// Return the first term that is an academic offering (`OfferingType == 1`)
/// and flagged current (`CurrentInd == 1`), scanning in list order.
pub fn select_current(terms: &[Term]) -> Result<&Term> {
    terms
        .iter()
        .find(|t| t.is_current())
        .ok_or(WhapiError::NoCurrentTerm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Id;

    fn term(id: u64, offering_type: i64, current_indicator: i64) -> Term {
        Term {
            current_indicator,
            description: format!("term {}", id),
            duration_id: Id::from(id),
            offering_type,
        }
    }

    #[test]
    fn picks_current_academic_term() {
        let terms = vec![term(1, 1, 0), term(2, 1, 1), term(3, 0, 1)];
        let current = select_current(&terms).unwrap();
        assert_eq!(current.duration_id, Id::from(2));
    }

    #[test]
    fn first_match_wins() {
        let terms = vec![term(7, 1, 1), term(8, 1, 1)];
        assert_eq!(select_current(&terms).unwrap().duration_id, Id::from(7));
        assert_eq!(select_current(&terms).unwrap().duration_id, Id::from(7));
    }

    #[test]
    fn no_match_is_an_error() {
        assert!(matches!(select_current(&[]), Err(WhapiError::NoCurrentTerm)));
        assert!(matches!(
            select_current(&[term(1, 2, 1)]),
            Err(WhapiError::NoCurrentTerm)
        ));
        // The last term must not be handed back as a fallback.
        assert!(matches!(
            select_current(&[term(1, 1, 0), term(2, 0, 0)]),
            Err(WhapiError::NoCurrentTerm)
        ));
    }
}
