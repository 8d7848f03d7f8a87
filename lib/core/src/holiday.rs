//! Field registry of the holiday package case base

use crate::attribute::{Adaptation, Adjustment, FieldSpec};
use crate::metric::{MatchTable, Metric, Scale};
use crate::taxonomy::{Taxonomy, TaxonomyNode};
use crate::value::ValueKind;
use std::sync::Arc;

pub const PRICE_RANGE: (f64, f64) = (279.0, 7161.0);
pub const PERSONS_RANGE: (f64, f64) = (1.0, 12.0);
pub const DURATION_RANGE: (f64, f64) = (3.0, 21.0);
/// Latitudinal distances between regions, Sweden to Egypt at the top
pub const REGION_RANGE: (f64, f64) = (0.001972, 33.307608);
pub const STAR_SCALE: f64 = 4.0;

/// Related holiday types share a parent node
pub fn holiday_types() -> Taxonomy {
    Taxonomy::new(TaxonomyNode::branch("Holiday", 0.0, vec![
        TaxonomyNode::branch("Outdoor", 0.5, vec![
            TaxonomyNode::leaf("Active", 1.0),
            TaxonomyNode::leaf("Skiing", 1.0),
            TaxonomyNode::leaf("Wandering", 1.0),
        ]),
        TaxonomyNode::branch("Relaxation", 0.5, vec![
            TaxonomyNode::leaf("Bathing", 1.0),
            TaxonomyNode::leaf("Recreation", 1.0),
        ]),
        TaxonomyNode::branch("Learning", 0.6, vec![
            TaxonomyNode::leaf("Education", 1.0),
            TaxonomyNode::leaf("Language", 1.0),
        ]),
        TaxonomyNode::leaf("City", 1.0),
    ]))
}

/// Rows are the queried mode, columns the offered one
pub fn transport_modes() -> MatchTable {
    MatchTable::new()
        .with_row("Car", &[("Car", 1.0), ("Coach", 0.8), ("Plane", 0.4), ("Train", 0.5)])
        .with_row("Coach", &[("Car", 0.8), ("Coach", 1.0), ("Plane", 0.4), ("Train", 0.7)])
        .with_row("Train", &[("Car", 0.4), ("Coach", 0.8), ("Plane", 0.4), ("Train", 1.0)])
        .with_row("Plane", &[("Car", 0.0), ("Coach", 0.0), ("Plane", 1.0), ("Train", 0.0)])
}

fn range((lo, hi): (f64, f64)) -> Scale {
    Scale::Range { lo, hi }
}

/// Every field of a holiday package
pub fn fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("JourneyCode", ValueKind::Integer, Metric::Constant)
            .with_help("Internal code of a journey. Not used for matching.\n\nPossible values: positive integers.")
            .excluded_from_matching(),
        FieldSpec::new("HolidayType", ValueKind::Keyword, Metric::Tree(Arc::new(holiday_types())))
            .with_help(
                "Kind of holiday. Related kinds (skiing and wandering, say) share a \
                 parent in the holiday type tree and score that parent's value.\n\n\
                 Possible values: Active, Bathing, City, Education, Language, \
                 Recreation, Skiing, Wandering.",
            ),
        FieldSpec::new("Price", ValueKind::Number, Metric::LessIsPerfect(range(PRICE_RANGE)))
            .with_help(
                "Price of the holiday. Any offer cheaper than the query is a perfect \
                 match, dearer ones lose score linearly.\n\n\
                 Adjusted by the combined ratio when a case is adapted.\n\n\
                 Possible values: non-negative numbers.",
            )
            .with_adjustment(Adjustment::Linear),
        FieldSpec::new("NumberOfPersons", ValueKind::Integer, Metric::Linear(range(PERSONS_RANGE)))
            .with_help(
                "Number of travellers. Linear in the difference.\n\n\
                 Adapted to the queried value.\n\n\
                 Possible values: positive integers.",
            )
            .with_adaptation(Adaptation::Ratio),
        FieldSpec::new("Region", ValueKind::Place, Metric::Latitude(range(REGION_RANGE)))
            .with_help(
                "Holiday region, looked up in the gazetteer. Similarity is linear in \
                 the latitudinal distance between the two regions.\n\n\
                 Possible values: any known place name (the resolved name is shown \
                 in parentheses).",
            ),
        FieldSpec::new("Transportation", ValueKind::Keyword, Metric::Table(Arc::new(transport_modes())))
            .with_help(
                "Means of transport, matched through a fixed table.\n\n\
                 Possible values: Car, Coach, Train, Plane.",
            ),
        FieldSpec::new("Duration", ValueKind::Integer, Metric::Linear(range(DURATION_RANGE)))
            .with_help(
                "Length of the holiday in days. Linear in the difference.\n\n\
                 Adapted to the queried value.\n\n\
                 Possible values: positive integers.",
            )
            .with_adaptation(Adaptation::Ratio),
        FieldSpec::new("Season", ValueKind::Month, Metric::Season)
            .with_help(
                "Month of the holiday. Adjacent months and months of the same season \
                 match by half.\n\n\
                 Possible values: January to December.",
            ),
        FieldSpec::new("Accommodation", ValueKind::Stars, Metric::Linear(Scale::Fixed { width: STAR_SCALE }))
            .with_help(
                "Hotel rating in stars, a holiday flat counting as zero. Linear in \
                 the number of stars.\n\n\
                 Possible values: 0-5, 'Holiday flat', or One to Five [stars].",
            ),
        FieldSpec::new("Hotel", ValueKind::Text, Metric::Exact)
            .with_help("Name of the hotel. Only the exact name matches.\n\nPossible values: any text."),
    ]
}
