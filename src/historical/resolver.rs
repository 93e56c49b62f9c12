//! Field resolution across heterogeneous filing schemas
//!
//! As-reported statements name the same quantity differently from one filer
//! to the next (`revenues`, `revenuefromcontractwithcustomerexcludingassessedtax`, ...).
//! Each logical field carries an ordered list of aliases; the first alias with
//! a case-insensitive match among the available columns wins.

use crate::error::{ModelError, Result};
use log::debug;

pub const REVENUE_ALIASES: &[&str] = &[
    "revenue",
    "totalrevenue",
    "revenuefromcontractwithcustomerexcludingassessedtax",
    "revenues",
];

pub const NET_INCOME_ALIASES: &[&str] = &[
    "netincome",
    "netincomeloss",
    "netincomeavailabletoparent",
    "netprofit",
    "netearnings",
];

pub const CASH_ALIASES: &[&str] = &[
    "cashandcashequivalentsatcarryingvalue",
    "cashandcashequivalents",
    "cash",
];

pub const PPE_ALIASES: &[&str] = &["propertyplantandequipmentnet", "propertyplantandequipment"];

pub const DEBT_ALIASES: &[&str] = &[
    "longtermdebtnoncurrent",
    "longtermdebtcurrent",
    "totaldebt",
    "debt",
    "longtermdebt",
    "shorttermdebt",
];

pub const EQUITY_ALIASES: &[&str] = &["stockholdersequity", "totalstockholdersequity", "totalequity"];

/// Resolve the first candidate present among `columns`, or `None`
///
/// Returns the column's own spelling. When two columns differ only by case,
/// the earlier one in `columns` is returned.
pub fn resolve_optional<S: AsRef<str>>(columns: &[S], candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|candidate| {
        columns
            .iter()
            .map(AsRef::as_ref)
            .find(|column| column.eq_ignore_ascii_case(candidate))
            .map(str::to_string)
    })
}

/// Resolve the first candidate present among `columns`
///
/// Fails with [`ModelError::UnresolvedField`] when no candidate matches.
pub fn resolve<S: AsRef<str>>(columns: &[S], candidates: &[&str]) -> Result<String> {
    match resolve_optional(columns, candidates) {
        Some(field) => {
            debug!("Resolved {:?} -> {}", candidates.first(), field);
            Ok(field)
        }
        None => Err(ModelError::UnresolvedField {
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            available: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }),
    }
}
