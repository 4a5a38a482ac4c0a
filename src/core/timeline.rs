use crate::core::year_format::{data_token, display_label};
use crate::domain::model::TimelineYear;
use crate::utils::error::Result;
use crate::utils::validation::validate_strictly_increasing;

/// Years published by the historical-basemaps dataset.
pub const DEFAULT_YEARS: &[TimelineYear] = &[
    -123000, -10000, -8000, -5000, -4000, -3000, -2000, -1500, -1000, -700, -500, -400, -323,
    -300, -200, -100, -1, 100, 200, 300, 400, 500, 600, 700, 800, 900, 1000, 1100, 1200, 1279,
    1300, 1400, 1492, 1500, 1530, 1600, 1650, 1700, 1715, 1783, 1800, 1815, 1880, 1900, 1914,
    1920, 1930, 1938, 1945, 1960, 1994, 2000, 2010,
];

/// Ordered, fixed set of years behind the scrubber plus the current position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    years: Vec<TimelineYear>,
    index: usize,
}

impl Timeline {
    pub fn new(years: Vec<TimelineYear>) -> Result<Self> {
        validate_strictly_increasing("timeline.years", &years)?;
        Ok(Self { years, index: 0 })
    }

    pub fn with_index(years: Vec<TimelineYear>, index: i64) -> Result<Self> {
        let mut timeline = Self::new(years)?;
        timeline.set_index(index);
        Ok(timeline)
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn years(&self) -> &[TimelineYear] {
        &self.years
    }

    /// Clamps into `[0, len - 1]` and returns the resulting index.
    pub fn set_index(&mut self, index: i64) -> usize {
        let last = self.years.len() as i64 - 1;
        self.index = index.clamp(0, last) as usize;
        self.index
    }

    pub fn step(&mut self, delta: i64) -> usize {
        self.set_index(self.index as i64 + delta)
    }

    pub fn year_at(&self, index: usize) -> Option<TimelineYear> {
        self.years.get(index).copied()
    }

    pub fn current_year(&self) -> TimelineYear {
        self.years[self.index]
    }

    pub fn index_of(&self, year: TimelineYear) -> Option<usize> {
        self.years.binary_search(&year).ok()
    }

    /// `(index, display label, data token)` for every year.
    pub fn entries(&self) -> impl Iterator<Item = (usize, String, String)> + '_ {
        self.years
            .iter()
            .enumerate()
            .map(|(i, &year)| (i, display_label(year), data_token(year)))
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            years: DEFAULT_YEARS.to_vec(),
            index: 0,
        }
    }
}
