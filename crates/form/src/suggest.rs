//! Offline keyword suggestions keyed on words in the business name.

use crate::state::KeywordGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Industry {
    CannabisRetail,
    Plumbing,
    Irrigation,
    FoodService,
    Automotive,
    General,
}

/// Checked in order; the first industry with a matching fragment wins.
const INDUSTRY_MARKERS: &[(Industry, &[&str])] = &[
    (
        Industry::CannabisRetail,
        &["dispensary", "cannabis", "marijuana", "weed", "thc", "cbd", "420"],
    ),
    (
        Industry::Plumbing,
        &["plumb", "rooter", "drain", "sewer", "water heater", "pipe"],
    ),
    (
        Industry::Irrigation,
        &["irrigation", "sprinkler", "lawn", "landscap", "turf"],
    ),
    (
        Industry::FoodService,
        &[
            "restaurant", "cafe", "café", "pizza", "grill", "bakery", "diner", "kitchen", "bistro",
            "taco", "burger", "catering", "coffee",
        ],
    ),
    (
        Industry::Automotive,
        &[
            "auto", "car ", "cars", "tire", "motor", "mechanic", "collision", "garage", "transmission",
            "muffler",
        ],
    ),
];

pub fn classify(business_name: &str) -> Industry {
    let name = business_name.to_lowercase();
    INDUSTRY_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|marker| name.contains(marker)))
        .map(|(industry, _)| *industry)
        .unwrap_or(Industry::General)
}

/// Canned keyword groups for `industry`, templated with the location.
pub fn suggested_groups(industry: Industry, city: &str, state: &str) -> Vec<KeywordGroup> {
    let city = city.trim();
    let state = state.trim();
    let templates: &[(&str, &[&str])] = match industry {
        Industry::CannabisRetail => &[
            (
                "core",
                &[
                    "cannabis dispensary {city}",
                    "dispensary near me {city} {state}",
                    "recreational dispensary {city}",
                ],
            ),
            (
                "secondary",
                &[
                    "weed delivery {city}",
                    "thc edibles {city}",
                    "cbd store {city} {state}",
                ],
            ),
            ("deals", &["dispensary deals {city}", "cannabis specials {city}"]),
        ],
        Industry::Plumbing => &[
            (
                "core",
                &["plumber {city} {state}", "plumbing company {city}", "plumbing repair {city}"],
            ),
            (
                "secondary",
                &["drain cleaning {city}", "water heater repair {city}", "sewer line repair {city}"],
            ),
            ("emergency", &["emergency plumber {city}", "24 hour plumber {city}"]),
        ],
        Industry::Irrigation => &[
            (
                "core",
                &[
                    "sprinkler repair {city}",
                    "irrigation company {city} {state}",
                    "sprinkler installation {city}",
                ],
            ),
            (
                "secondary",
                &["drip irrigation {city}", "sprinkler blowout {city}", "lawn irrigation {city}"],
            ),
            ("emergency", &["sprinkler leak repair {city}"]),
        ],
        Industry::FoodService => &[
            (
                "core",
                &["restaurants in {city}", "best food {city} {state}", "places to eat {city}"],
            ),
            (
                "secondary",
                &["takeout {city}", "food delivery {city}", "catering {city}"],
            ),
        ],
        Industry::Automotive => &[
            (
                "core",
                &["auto repair {city}", "mechanic {city} {state}", "car repair near me {city}"],
            ),
            (
                "secondary",
                &["oil change {city}", "brake repair {city}", "tire shop {city}"],
            ),
            ("emergency", &["towing {city}", "roadside assistance {city}"]),
        ],
        Industry::General => &[
            ("core", &["{business} {city}", "{business} near me {city} {state}"]),
            ("secondary", &["best local business {city}", "{city} {state} services"]),
        ],
    };
    templates
        .iter()
        .map(|(name, keywords)| {
            KeywordGroup::new(
                *name,
                keywords
                    .iter()
                    .map(|template| fill(template, industry_label(industry), city, state)),
            )
        })
        .collect()
}

fn industry_label(industry: Industry) -> &'static str {
    match industry {
        Industry::CannabisRetail => "cannabis dispensary",
        Industry::Plumbing => "plumber",
        Industry::Irrigation => "irrigation",
        Industry::FoodService => "restaurant",
        Industry::Automotive => "auto repair",
        Industry::General => "local business",
    }
}

fn fill(template: &str, business: &str, city: &str, state: &str) -> String {
    template
        .replace("{business}", business)
        .replace("{city}", city)
        .replace("{state}", state)
}
