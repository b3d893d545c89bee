use chrono::NaiveDate;

/// Inclusive date window used to filter plans and leave entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub from: NaiveDate,
    pub until: NaiveDate,
}

impl Period {
    /// A whole month when `month` is given, otherwise the whole year.
    pub fn from_year_month(year: i32, month: Option<u32>) -> Result<Self, String> {
        match month {
            Some(month) => {
                let from = NaiveDate::from_ymd_opt(year, month, 1)
                    .ok_or_else(|| format!("Invalid month: {}", month))?;
                let next = if month == 12 {
                    NaiveDate::from_ymd_opt(year + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(year, month + 1, 1)
                }
                .ok_or_else(|| format!("Invalid year: {}", year))?;
                let until = next
                    .pred_opt()
                    .ok_or_else(|| format!("Invalid year: {}", year))?;
                Ok(Self { from, until })
            }
            None => {
                let from = NaiveDate::from_ymd_opt(year, 1, 1)
                    .ok_or_else(|| format!("Invalid year: {}", year))?;
                let until = NaiveDate::from_ymd_opt(year, 12, 31)
                    .ok_or_else(|| format!("Invalid year: {}", year))?;
                Ok(Self { from, until })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_whole_year() {
        let period = Period::from_year_month(2024, None).unwrap();
        assert_eq!(period.from, date(2024, 1, 1));
        assert_eq!(period.until, date(2024, 12, 31));
    }

    #[test]
    fn test_leap_february() {
        let period = Period::from_year_month(2024, Some(2)).unwrap();
        assert_eq!(period.from, date(2024, 2, 1));
        assert_eq!(period.until, date(2024, 2, 29));
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let period = Period::from_year_month(2023, Some(12)).unwrap();
        assert_eq!(period.until, date(2023, 12, 31));
    }

    #[test]
    fn test_invalid_month() {
        assert!(Period::from_year_month(2024, Some(0)).is_err());
        assert!(Period::from_year_month(2024, Some(13)).is_err());
    }
}
