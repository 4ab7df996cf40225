//! Request payloads and the checks that run before any entity is built.

use serde::{Deserialize, Serialize};
use sv_lodge_storage::models::UserRole;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", joined_messages(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

fn joined_messages(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|field| field.message)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Default)]
struct Checks(Vec<FieldError>);

impl Checks {
    fn required(&mut self, field: &'static str, value: &str, message: &'static str) {
        if value.trim().is_empty() {
            self.0.push(FieldError { field, message });
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { fields: self.0 })
        }
    }
}

/// Twelve digits, nothing else.
#[must_use]
pub fn is_valid_aadhaar(value: &str) -> bool {
    value.len() == 12 && value.bytes().all(|byte| byte.is_ascii_digit())
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CheckInForm {
    #[serde(default)]
    pub guest_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub aadhaar: String,
    #[serde(default)]
    pub address: String,
}

/// Guest identity that passed the check-in checks, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestDetails {
    pub guest_name: String,
    pub phone: String,
    pub aadhaar: String,
    pub address: String,
}

impl CheckInForm {
    pub fn validate(self) -> Result<GuestDetails, ValidationError> {
        let mut checks = Checks::default();
        checks.required("guestName", &self.guest_name, "guest name is required");
        checks.required("phone", &self.phone, "phone number is required");
        checks.required("address", &self.address, "home address is required");
        let aadhaar = self.aadhaar.trim();
        if aadhaar.is_empty() {
            checks.0.push(FieldError {
                field: "aadhaar",
                message: "Aadhaar number is required",
            });
        } else if !is_valid_aadhaar(aadhaar) {
            checks.0.push(FieldError {
                field: "aadhaar",
                message: "Please enter 12 digit Aadhaar number",
            });
        }
        checks.finish()?;
        Ok(GuestDetails {
            guest_name: self.guest_name.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            aadhaar: aadhaar.to_owned(),
            address: self.address.trim().to_owned(),
        })
    }
}

const fn default_role() -> UserRole {
    UserRole::Receptionist
}

#[derive(Deserialize, Debug)]
pub struct LoginForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub name: String,
    pub phone: String,
    pub role: UserRole,
}

impl LoginForm {
    pub fn validate(self) -> Result<Operator, ValidationError> {
        if self.name.trim().is_empty() || self.phone.trim().is_empty() {
            return Err(ValidationError {
                fields: vec![FieldError {
                    field: if self.name.trim().is_empty() { "name" } else { "phone" },
                    message: "Please fill in all details",
                }],
            });
        }
        Ok(Operator {
            name: self.name.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            role: self.role,
        })
    }
}

/// The collected amount as typed, a number or the raw input string.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    pub fn validate(&self) -> Result<f64, ValidationError> {
        let amount = match self {
            Self::Number(amount) => Some(*amount),
            Self::Text(text) => text.trim().parse::<f64>().ok(),
        };
        amount
            .filter(|amount| amount.is_finite() && *amount >= 0.0)
            .ok_or_else(|| ValidationError {
                fields: vec![FieldError {
                    field: "paidAmount",
                    message: "Enter a valid collection amount",
                }],
            })
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuoteForm {
    pub paid_amount: AmountInput,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmForm {
    pub paid_amount: AmountInput,
    #[serde(default)]
    pub acknowledge_low_payment: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> CheckInForm {
        CheckInForm {
            guest_name: " Ravi Kumar ".to_owned(),
            phone: "9876543210".to_owned(),
            aadhaar: "123412341234".to_owned(),
            address: "Tirupati".to_owned(),
        }
    }

    #[test]
    fn valid_check_in_is_trimmed() {
        let guest = form().validate().unwrap();
        assert_eq!(guest.guest_name, "Ravi Kumar");
    }

    #[test]
    fn aadhaar_must_be_twelve_digits() {
        assert!(is_valid_aadhaar("123412341234"));
        assert!(!is_valid_aadhaar("12341234123"));
        assert!(!is_valid_aadhaar("1234-1234-12"));
        assert!(!is_valid_aadhaar("１２３４１２３４１２３４"));
        let error = CheckInForm {
            aadhaar: "1234".to_owned(),
            ..form()
        }
        .validate()
        .unwrap_err();
        assert_eq!(error.fields[0].field, "aadhaar");
    }

    #[test]
    fn reports_every_missing_field() {
        let error = CheckInForm::default().validate().unwrap_err();
        let fields: Vec<_> = error.fields.iter().map(|field| field.field).collect();
        assert_eq!(fields, ["guestName", "phone", "address", "aadhaar"]);
        assert!(error.to_string().contains("; "));
    }

    #[test]
    fn login_needs_name_and_phone() {
        let form = LoginForm {
            name: "Lakshmi".to_owned(),
            phone: "  ".to_owned(),
            role: UserRole::Admin,
        };
        assert_eq!(form.validate().unwrap_err().fields[0].field, "phone");
        let form: LoginForm =
            serde_json::from_str(r#"{"name": "Lakshmi", "phone": "9000000001"}"#).unwrap();
        assert_eq!(form.validate().unwrap().role, UserRole::Receptionist);
    }

    #[test]
    fn amount_accepts_numbers_and_strings() {
        assert_eq!(AmountInput::Number(80.0).validate().unwrap(), 80.0);
        assert_eq!(AmountInput::Text(" 120.5 ".to_owned()).validate().unwrap(), 120.5);
        assert_eq!(AmountInput::Number(0.0).validate().unwrap(), 0.0);
    }

    #[test]
    fn amount_rejects_negative_and_garbage() {
        assert!(AmountInput::Number(-1.0).validate().is_err());
        assert!(AmountInput::Text(String::new()).validate().is_err());
        assert!(AmountInput::Text("lots".to_owned()).validate().is_err());
        assert!(AmountInput::Text("NaN".to_owned()).validate().is_err());
    }

    #[test]
    fn confirm_form_defaults_to_unacknowledged() {
        let form: ConfirmForm = serde_json::from_str(r#"{"paidAmount": "80"}"#).unwrap();
        assert!(!form.acknowledge_low_payment);
        assert_eq!(form.paid_amount, AmountInput::Text("80".to_owned()));
    }
}
