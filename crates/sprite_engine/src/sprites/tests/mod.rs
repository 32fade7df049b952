//! Scenario tests spanning tile sheets, sprites, groups and the catalog

mod group_scenarios;
