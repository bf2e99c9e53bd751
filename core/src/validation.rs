//! Customer-record checks applied before a registration request is built.
//!
//! # Design
//! Pure functions over [`CustomerProfile`]: nothing here touches the network
//! or mutates its input. `validate_customer` fails fast — the first missing
//! field in [`REQUIRED_CUSTOMER_FIELDS`] order is the one reported, and shape
//! checks only run once every required field is present.

use crate::error::SoftixError;
use crate::types::CustomerProfile;

/// Fields the vendor requires on every new-customer record, in the order
/// they are checked.
pub const REQUIRED_CUSTOMER_FIELDS: [&str; 15] = [
    "salutation",
    "firstname",
    "lastname",
    "nationality",
    "email",
    "dateofbirth",
    "internationalcode",
    "areacode",
    "phonenumber",
    "addressline1",
    "addressline2",
    "addressline3",
    "city",
    "countrycode",
    "state",
];

/// Check a customer record against the vendor's required-field and
/// field-shape rules.
///
/// Every field in [`REQUIRED_CUSTOMER_FIELDS`] must be present, and
/// `countrycode` and `nationality` must be exactly two characters
/// (ISO 3166-1 alpha-2). A record that passes is safe to normalize and
/// transmit.
pub fn validate_customer(customer: &CustomerProfile) -> Result<(), SoftixError> {
    for field in REQUIRED_CUSTOMER_FIELDS {
        if customer.get(field).is_none() {
            return Err(SoftixError::MissingRequiredCustomerField { field });
        }
    }
    for field in ["countrycode", "nationality"] {
        let value = customer.get(field).unwrap_or_default();
        if value.chars().count() != 2 {
            return Err(SoftixError::InvalidCustomerField { field });
        }
    }
    Ok(())
}

/// Return a copy of `customer` with the named fields' values uppercased.
///
/// Fields absent from the record are left untouched; the input itself is
/// never mutated.
pub fn uppercase_fields(customer: &CustomerProfile, fields: &[&str]) -> CustomerProfile {
    let mut normalized = customer.clone();
    for field in fields {
        if let Some(value) = customer.get(field) {
            normalized.set(*field, value.to_uppercase());
        }
    }
    normalized
}
