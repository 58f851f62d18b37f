//! Static lookup tables behind the advisory decode.
//!
//! Order matters in [`WMI_TABLE`]: rows are matched by prefix containment and
//! the first hit wins, so longer or more specific prefixes come first.

use super::decoder::VehicleCategory;

pub struct WmiEntry {
    pub prefix: &'static str,
    pub manufacturer: &'static str,
    pub category: VehicleCategory,
}

const fn wmi(prefix: &'static str, manufacturer: &'static str, category: VehicleCategory) -> WmiEntry {
    WmiEntry {
        prefix,
        manufacturer,
        category,
    }
}

pub const WMI_TABLE: &[WmiEntry] = &[
    wmi("5YJ", "Tesla", VehicleCategory::Ev),
    wmi("7SA", "Tesla", VehicleCategory::Ev),
    wmi("7G2", "Tesla", VehicleCategory::Ev),
    wmi("LRW", "Tesla", VehicleCategory::Ev),
    wmi("XP7", "Tesla", VehicleCategory::Ev),
    wmi("SFZ", "Tesla", VehicleCategory::Ev),
    wmi("LGX", "BYD", VehicleCategory::Ev),
    wmi("LC0", "BYD", VehicleCategory::Ev),
    wmi("LJ1", "NIO", VehicleCategory::Ev),
    wmi("LNB", "XPeng", VehicleCategory::Ev),
    wmi("LW4", "Li Auto", VehicleCategory::Rev),
    wmi("LVR", "Changan", VehicleCategory::Rev),
    wmi("5UX", "BMW", VehicleCategory::Icev),
    wmi("WBY", "BMW", VehicleCategory::Ev),
    wmi("WBA", "BMW", VehicleCategory::Icev),
    wmi("WP0", "Porsche", VehicleCategory::Icev),
    wmi("W1K", "Mercedes-Benz", VehicleCategory::Icev),
    wmi("WDD", "Mercedes-Benz", VehicleCategory::Icev),
    wmi("WAU", "Audi", VehicleCategory::Icev),
    wmi("WVW", "Volkswagen", VehicleCategory::Icev),
    wmi("YV1", "Volvo", VehicleCategory::Icev),
    wmi("KMH", "Hyundai", VehicleCategory::Icev),
    wmi("KNA", "Kia", VehicleCategory::Icev),
    wmi("1FA", "Ford", VehicleCategory::Icev),
    wmi("1FT", "Ford", VehicleCategory::Icev),
    wmi("1G1", "Chevrolet", VehicleCategory::Icev),
    wmi("1HG", "Honda", VehicleCategory::Icev),
    wmi("JHM", "Honda", VehicleCategory::Icev),
    wmi("JN", "Nissan", VehicleCategory::Icev),
    wmi("JT", "Toyota", VehicleCategory::Icev),
];

/// Model-year cycle codes. Characters past `R` (2024) and the unused
/// characters fall back to the current calendar year.
pub const YEAR_CODES: &[(char, i32)] = &[
    ('1', 2001),
    ('2', 2002),
    ('3', 2003),
    ('4', 2004),
    ('5', 2005),
    ('6', 2006),
    ('7', 2007),
    ('8', 2008),
    ('9', 2009),
    ('A', 2010),
    ('B', 2011),
    ('C', 2012),
    ('D', 2013),
    ('E', 2014),
    ('F', 2015),
    ('G', 2016),
    ('H', 2017),
    ('J', 2018),
    ('K', 2019),
    ('L', 2020),
    ('M', 2021),
    ('N', 2022),
    ('P', 2023),
    ('R', 2024),
];

pub const DEFAULT_BASE_PRICE: u32 = 30_000;

pub const BASE_PRICES: &[(&str, u32)] = &[
    ("Tesla", 45_000),
    ("BYD", 32_000),
    ("NIO", 52_000),
    ("XPeng", 38_000),
    ("Li Auto", 48_000),
    ("Changan", 26_000),
    ("BMW", 55_000),
    ("Porsche", 95_000),
    ("Mercedes-Benz", 58_000),
    ("Audi", 50_000),
    ("Volkswagen", 32_000),
    ("Volvo", 47_000),
    ("Hyundai", 28_000),
    ("Kia", 27_000),
    ("Ford", 35_000),
    ("Chevrolet", 33_000),
    ("Honda", 29_000),
    ("Nissan", 28_000),
    ("Toyota", 31_000),
];
