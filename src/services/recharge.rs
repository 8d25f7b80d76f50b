use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Purchasable packages: (label, units)
const PACKAGES: &[(&str, u32)] = &[
    ("10次,100元", 10),
    ("100次,9990元", 100),
    ("1000次,99900元", 1000),
];

const CARD_NUMBER_PATTERN: &str = r"^[0-9]+$";
const CVV_PATTERN: &str = r"^[0-9]{3}$";
const TWO_DIGIT_PATTERN: &str = r"^[0-9]{2}$";

const MAX_EXPIRY_YEAR: u32 = 24;

/// Mock payment form submitted by the recharge page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RechargeForm {
    pub card_number: String,
    pub month: String,
    pub year: String,
    pub cvv: String,
    pub package: String,
}

/// Validates recharge forms and resolves the package to a unit amount.
/// No payment is taken.
pub struct RechargeDesk {
    card_number: Option<Regex>,
    cvv: Option<Regex>,
    two_digits: Option<Regex>,
}

impl RechargeDesk {
    pub fn new() -> Self {
        Self {
            card_number: Regex::new(CARD_NUMBER_PATTERN).ok(),
            cvv: Regex::new(CVV_PATTERN).ok(),
            two_digits: Regex::new(TWO_DIGIT_PATTERN).ok(),
        }
    }

    pub fn packages(&self) -> Vec<(&'static str, u32)> {
        PACKAGES.to_vec()
    }

    /// Check every field and return the number of units to credit
    pub fn validate(&self, form: &RechargeForm) -> Result<u32, AppError> {
        let card = form.card_number.replace([' ', '-'], "");
        if !pattern_matches(&self.card_number, &card) {
            return Err(invalid("card number must be digits"));
        }

        let month = self.two_digit_value(&form.month).unwrap_or(0);
        if !(1..=12).contains(&month) {
            return Err(invalid("month must be 01-12"));
        }

        match self.two_digit_value(&form.year) {
            Some(year) if year <= MAX_EXPIRY_YEAR => {}
            _ => return Err(invalid("year must be 00-24")),
        }

        if !pattern_matches(&self.cvv, &form.cvv) {
            return Err(invalid("CVV must be exactly 3 digits"));
        }

        PACKAGES
            .iter()
            .find(|(label, _)| *label == form.package)
            .map(|(_, units)| *units)
            .ok_or_else(|| invalid("unknown package"))
    }

    fn two_digit_value(&self, value: &str) -> Option<u32> {
        if pattern_matches(&self.two_digits, value) {
            value.parse().ok()
        } else {
            None
        }
    }
}

impl Default for RechargeDesk {
    fn default() -> Self {
        Self::new()
    }
}

fn pattern_matches(pattern: &Option<Regex>, value: &str) -> bool {
    pattern.as_ref().map(|re| re.is_match(value)).unwrap_or(false)
}

fn invalid(reason: &str) -> AppError {
    AppError::Validation(format!(
        "Please fill in all required fields ({})",
        reason
    ))
}
