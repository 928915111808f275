use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::Sid;

/// Cash dividend. Only the ex-date and amount are known to the sources in
/// this workspace; the other dates stay unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendRow {
    pub sid: Sid,
    pub ex_date: NaiveDate,
    pub amount: f64,
    pub record_date: Option<NaiveDate>,
    pub declared_date: Option<NaiveDate>,
    pub pay_date: Option<NaiveDate>,
}

impl DividendRow {
    pub fn on_ex_date(sid: Sid, ex_date: NaiveDate, amount: f64) -> Self {
        Self {
            sid,
            ex_date,
            amount,
            record_date: None,
            declared_date: None,
            pay_date: None,
        }
    }
}

/// Share split. No source populates these; the table is always written empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRow {
    pub sid: Sid,
    pub ratio: f64,
    pub effective_date: NaiveDate,
}
