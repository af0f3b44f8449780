#[cfg(test)]
mod tests {
    use crate::dimension::{Dimension, Divider};
    use crate::ellipsoid::EllipsoidGate;
    use crate::events::EventTable;
    use crate::polygon::PolygonGate;
    use crate::quadrant::{Quadrant, QuadrantGate};
    use crate::rectangle::RectangleGate;
    use crate::traits::*;

    fn table() -> EventTable {
        EventTable::from_columns([
            ("x", vec![1.0, 5.0, 9.0, f64::NAN]),
            ("y", vec![1.0, 5.0, 9.0, 5.0]),
        ])
        .unwrap()
    }

    fn predicates() -> Vec<Box<dyn EventPredicate>> {
        vec![
            Box::new(
                RectangleGate::new(vec![
                    Dimension::new("x").with_range(Some(2.0), Some(8.0)).unwrap(),
                ])
                .unwrap(),
            ),
            Box::new(
                PolygonGate::new(
                    vec![Dimension::new("x"), Dimension::new("y")],
                    vec![(2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0)],
                )
                .unwrap(),
            ),
            Box::new(
                EllipsoidGate::new(
                    vec![Dimension::new("x"), Dimension::new("y")],
                    vec![5.0, 5.0],
                    vec![vec![4.0, 0.0], vec![0.0, 4.0]],
                    1.0,
                )
                .unwrap(),
            ),
        ]
    }

    #[test]
    fn test_predicates_share_one_interface() {
        for predicate in predicates() {
            assert_eq!(
                predicate.apply(&table()).unwrap(),
                vec![false, true, false, false]
            );
        }
    }

    #[test]
    fn test_membership_length_matches_events() {
        let empty = EventTable::from_columns([("x", Vec::new()), ("y", Vec::new())]).unwrap();
        for predicate in predicates() {
            assert!(predicate.apply(&empty).unwrap().is_empty());
        }
    }

    #[test]
    fn test_column_ids_in_declared_order() {
        let polygon = PolygonGate::new(
            vec![Dimension::new("SSC-A"), Dimension::new("FSC-A")],
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)],
        )
        .unwrap();
        assert_eq!(polygon.column_ids(), vec!["SSC-A", "FSC-A"]);

        let ratio = RectangleGate::new(vec![Dimension::ratio("FL2Rat1")]).unwrap();
        assert_eq!(ratio.column_ids(), vec!["FL2Rat1"]);
    }

    #[test]
    fn test_quadrant_inverted_ranges() {
        let gate = QuadrantGate::new(
            vec![Divider::new("D", "x", vec![5.0]).unwrap()],
            vec![
                Quadrant::new("empty", vec!["D"], vec![(Some(6.0), Some(4.0))]).unwrap(),
                Quadrant::new("fine", vec!["D"], vec![(Some(4.0), Some(6.0))]).unwrap(),
            ],
        )
        .unwrap();

        assert_eq!(gate.inverted_ranges(), vec![("x", 6.0, 4.0)]);
        assert_eq!(gate.ranges().len(), 2);
    }
}
