use std::fmt;

/// A named point the daily job fetches weather for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct City {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    pub const fn new(name: &'static str, latitude: f64, longitude: f64) -> Self {
        Self { name, latitude, longitude }
    }

    /// Identifier of this city's task within the daily job.
    pub fn task_id(&self) -> String {
        format!("fetch_weather_{}", self.name)
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub const CITIES: &[City] = &[
    City::new("Kyiv", 50.4501, 30.5234),
    City::new("Kharkiv", 49.9935, 36.2304),
    City::new("Odesa", 46.4825, 30.7233),
    City::new("Lviv", 49.8397, 24.0297),
    City::new("Zhmerynka", 49.0391, 28.1086),
];

/// Case-insensitive lookup in [`CITIES`].
pub fn find_city(name: &str) -> Option<&'static City> {
    let name = name.trim();
    CITIES.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}
