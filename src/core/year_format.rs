use crate::domain::model::TimelineYear;

/// How a BC year is spelled. Only applied to negative years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BcFormat {
    /// `bc2000`, the dataset file token.
    DataToken,
    /// `2000 BC`, the timeline label.
    Display,
}

impl BcFormat {
    pub fn apply(self, magnitude: u32) -> String {
        match self {
            BcFormat::DataToken => format!("bc{}", magnitude),
            BcFormat::Display => format!("{} BC", magnitude),
        }
    }
}

pub fn convert_year_string(formatter: BcFormat, year: TimelineYear) -> String {
    if year < 0 {
        formatter.apply(year.unsigned_abs())
    } else {
        year.to_string()
    }
}

pub fn data_token(year: TimelineYear) -> String {
    convert_year_string(BcFormat::DataToken, year)
}

pub fn display_label(year: TimelineYear) -> String {
    convert_year_string(BcFormat::Display, year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bc_years() {
        assert_eq!(data_token(-2000), "bc2000");
        assert_eq!(display_label(-2000), "2000 BC");
        assert_eq!(data_token(-1), "bc1");
        assert_eq!(display_label(-123000), "123000 BC");
    }

    #[test]
    fn test_ad_years_pass_through() {
        for year in [0, 1, 400, 1492, 2010] {
            assert_eq!(data_token(year), year.to_string());
            assert_eq!(display_label(year), year.to_string());
        }
    }

    #[test]
    fn test_min_year_does_not_overflow() {
        assert_eq!(data_token(i32::MIN), "bc2147483648");
    }
}
