use std::collections::HashMap;

use once_cell::sync::Lazy;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Sunday first, matching GitHub's commit-activity `days` arrays.
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub const DEFAULT_LANGUAGE_COLOR: &str = "#8b8b8b";

static LANGUAGE_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("JavaScript", "#f1e05a"),
        ("TypeScript", "#3178c6"),
        ("Python", "#3572A5"),
        ("Java", "#b07219"),
        ("C++", "#f34b7d"),
        ("C", "#555555"),
        ("C#", "#178600"),
        ("Go", "#00ADD8"),
        ("Rust", "#dea584"),
        ("Ruby", "#701516"),
        ("PHP", "#4F5D95"),
        ("Swift", "#F05138"),
        ("Kotlin", "#A97BFF"),
        ("Scala", "#c22d40"),
        ("Shell", "#89e051"),
        ("HTML", "#e34c26"),
        ("CSS", "#563d7c"),
        ("Vue", "#41b883"),
        ("Dart", "#00B4AB"),
        ("Elixir", "#6e4a7e"),
    ])
});

pub fn language_color(language: &str) -> &'static str {
    LANGUAGE_COLORS
        .get(language)
        .copied()
        .unwrap_or(DEFAULT_LANGUAGE_COLOR)
}
