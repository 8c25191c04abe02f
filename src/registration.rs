//! Four-step sign-up form: field validation per step and the request body.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Personal = 0,
    Password = 1,
    Address = 2,
    Promo = 3,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Personal, Step::Password, Step::Address, Step::Promo];

    pub fn label(self) -> &'static str {
        match self {
            Step::Personal => "Personal",
            Step::Password => "Password",
            Step::Address => "Address",
            Step::Promo => "Promo",
        }
    }

    fn next(self) -> Option<Step> {
        Step::ALL.get(self as usize + 1).copied()
    }

    fn prev(self) -> Option<Step> {
        (self as usize).checked_sub(1).map(|i| Step::ALL[i])
    }
}

/// Field name -> message, for the fields that failed on the current step.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub password: String,
    pub confirm_password: String,
    pub street_address1: String,
    pub street_address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub promo_code: String,
    step: Option<Step>,
}

fn password_is_strong(pw: &str) -> bool {
    pw.len() >= 8
        && pw.chars().all(|c| c.is_ascii_alphanumeric())
        && pw.chars().any(|c| c.is_ascii_alphabetic())
        && pw.chars().any(|c| c.is_ascii_digit())
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step.unwrap_or(Step::Personal)
    }

    pub fn validate_step(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        match self.step() {
            Step::Personal => {
                if self.first_name.trim().is_empty() {
                    errors.insert("firstName", "First name is required");
                }
                if self.last_name.trim().is_empty() {
                    errors.insert("lastName", "Last name is required");
                }
                if self.email.trim().is_empty() {
                    errors.insert("email", "Email is required");
                } else if !EMAIL_RE.is_match(&self.email) {
                    errors.insert("email", "Enter a valid email");
                }
                if self.phone_number.trim().is_empty() {
                    errors.insert("phoneNumber", "Phone number is required");
                }
            }
            Step::Password => {
                let pw = self.password.trim();
                if pw.is_empty() {
                    errors.insert("password", "Password is required");
                } else if !password_is_strong(pw) {
                    errors.insert(
                        "password",
                        "Password must be at least 8 characters with letters & numbers",
                    );
                }
                if self.confirm_password.trim().is_empty() {
                    errors.insert("confirmPassword", "Confirm password is required");
                } else if self.password != self.confirm_password {
                    errors.insert("confirmPassword", "Passwords do not match");
                }
            }
            Step::Address => {
                if self.street_address1.trim().is_empty() {
                    errors.insert("streetAddress1", "Address is required");
                }
            }
            Step::Promo => {}
        }
        errors
    }

    /// Moves forward when the current step is valid; otherwise returns its errors.
    pub fn next_step(&mut self) -> Result<Step, FieldErrors> {
        let errors = self.validate_step();
        if !errors.is_empty() {
            return Err(errors);
        }
        if let Some(next) = self.step().next() {
            self.step = Some(next);
        }
        Ok(self.step())
    }

    pub fn prev_step(&mut self) -> Step {
        if let Some(prev) = self.step().prev() {
            self.step = Some(prev);
        }
        self.step()
    }

    /// Validates every step and builds the body for `/api/v1/Auth/register`.
    pub fn to_request(&self) -> Result<RegistrationRequest, FieldErrors> {
        let mut all = FieldErrors::new();
        for step in Step::ALL {
            let probe = RegistrationForm {
                step: Some(step),
                ..self.clone()
            };
            all.extend(probe.validate_step());
        }
        if !all.is_empty() {
            return Err(all);
        }
        Ok(RegistrationRequest {
            subscription_type: 0,
            email: self.email.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            password: self.password.trim().to_string(),
            confirm_password: self.confirm_password.trim().to_string(),
            street_address1: self.street_address1.trim().to_string(),
            street_address2: self.street_address2.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zip_code: self.zip.trim().to_string(),
            promo_code: self.promo_code.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub subscription_type: u8,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub password: String,
    pub confirm_password: String,
    pub street_address1: String,
    pub street_address2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub promo_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RegistrationForm {
        RegistrationForm {
            email: " reader@example.com ".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            phone_number: "+971500000000".into(),
            password: "abcd1234".into(),
            confirm_password: "abcd1234".into(),
            street_address1: "1 Library Rd".into(),
            city: "Dubai".into(),
            ..Default::default()
        }
    }

    #[test]
    fn personal_step_requires_fields() {
        let form = RegistrationForm::new();
        let errors = form.validate_step();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors["email"], "Email is required");
    }

    #[test]
    fn invalid_email() {
        let mut form = filled();
        form.email = "reader@example".into();
        assert_eq!(form.validate_step()["email"], "Enter a valid email");
    }

    #[test]
    fn password_rules() {
        assert!(password_is_strong("abcd1234"));
        assert!(!password_is_strong("abcdefgh"));
        assert!(!password_is_strong("12345678"));
        assert!(!password_is_strong("abc123"));
        assert!(!password_is_strong("abcd 1234"));
        assert!(!password_is_strong("abcd123!"));
    }

    #[test]
    fn cannot_advance_past_invalid_step() {
        let mut form = filled();
        form.confirm_password = "abcd12345".into();
        assert_eq!(form.next_step(), Ok(Step::Password));
        let errors = form.next_step().unwrap_err();
        assert_eq!(errors["confirmPassword"], "Passwords do not match");
        assert_eq!(form.step(), Step::Password);
    }

    #[test]
    fn walks_all_steps_and_back() {
        let mut form = filled();
        assert_eq!(form.next_step(), Ok(Step::Password));
        assert_eq!(form.next_step(), Ok(Step::Address));
        assert_eq!(form.next_step(), Ok(Step::Promo));
        assert_eq!(form.next_step(), Ok(Step::Promo));
        assert_eq!(form.prev_step(), Step::Address);
        form.prev_step();
        form.prev_step();
        assert_eq!(form.prev_step(), Step::Personal);
    }

    #[test]
    fn request_body_is_trimmed_camel_case() {
        let req = filled().to_request().unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["email"], "reader@example.com");
        assert_eq!(json["subscriptionType"], 0);
        assert_eq!(json["zipCode"], "");
        assert_eq!(json["streetAddress1"], "1 Library Rd");
    }

    #[test]
    fn request_reports_errors_from_every_step() {
        let mut form = filled();
        form.street_address1.clear();
        form.password = "short".into();
        let errors = form.to_request().unwrap_err();
        assert!(errors.contains_key("streetAddress1"));
        assert!(errors.contains_key("password"));
    }
}
