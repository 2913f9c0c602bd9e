//! Series, periods and formatted document numbers.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::SequenceError;

/// A numbering series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Series {
    /// Journal vouchers.
    Journal,
    /// Sales invoices.
    Invoice,
    /// Purchase bills.
    Bill,
    /// Customer receipts.
    Receipt,
    /// Vendor payment vouchers.
    PaymentVoucher,
}

impl Series {
    /// All series, in prefix order.
    pub const ALL: [Self; 5] = [
        Self::Bill,
        Self::Invoice,
        Self::Journal,
        Self::PaymentVoucher,
        Self::Receipt,
    ];

    /// Prefix printed at the start of every number in the series.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Journal => "JV",
            Self::Invoice => "INV",
            Self::Bill => "BILL",
            Self::Receipt => "RCT",
            Self::PaymentVoucher => "PV",
        }
    }

    /// Looks up a series by its prefix.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.prefix() == prefix)
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// A calendar month, printed as `YYYYMM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Creates a period; `month` must be 1 through 12 and `year` four digits.
    pub fn new(year: i32, month: u32) -> Result<Self, SequenceError> {
        if !(1..=12).contains(&month) || !(1000..=9999).contains(&year) {
            return Err(SequenceError::InvalidPeriod(format!("{year:04}{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// The period containing `date`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::InvalidPeriod` if the year is not four digits.
    pub fn from_date(date: NaiveDate) -> Result<Self, SequenceError> {
        Self::new(date.year(), date.month())
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Calendar month, 1-based.
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SequenceError::InvalidPeriod(s.to_string());
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year = s[..4].parse().map_err(|_| invalid())?;
        let month = s[4..].parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

/// A formatted document number such as `INV-202401-0001`.
///
/// The counter is zero-padded to four digits and widens naturally past 9999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentNumber {
    /// Series the number belongs to.
    pub series: Series,
    /// Month the number was allocated in.
    pub period: Period,
    /// Position within the series and month, starting at 1.
    pub sequence: u32,
}

impl DocumentNumber {
    /// Creates a document number.
    #[must_use]
    pub const fn new(series: Series, period: Period, sequence: u32) -> Self {
        Self {
            series,
            period,
            sequence,
        }
    }

    /// Prefix shared by every number of `series` in `period`, e.g. `JV-202401-`.
    #[must_use]
    pub fn prefix_for(series: Series, period: Period) -> String {
        format!("{}-{period}-", series.prefix())
    }

    /// Parses a number previously produced by `Display`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::InvalidNumber` if the text does not match
    /// `{PREFIX}-{YYYYMM}-{digits}`.
    pub fn parse(s: &str) -> Result<Self, SequenceError> {
        let invalid = || SequenceError::InvalidNumber(s.to_string());
        let mut parts = s.splitn(3, '-');
        let (Some(prefix), Some(period), Some(counter)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let series = Series::from_prefix(prefix).ok_or_else(invalid)?;
        let period = period.parse::<Period>().map_err(|_| invalid())?;
        if counter.len() < 4 || !counter.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let sequence = counter.parse::<u32>().map_err(|_| invalid())?;
        if sequence == 0 {
            return Err(invalid());
        }

        Ok(Self::new(series, period, sequence))
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:04}",
            self.series.prefix(),
            self.period,
            self.sequence
        )
    }
}
