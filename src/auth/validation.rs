//! Sign-in and sign-up form validation
//!
//! Field rules and the gating that keeps the sign-up button inert until the
//! id has been checked for uniqueness and the email has been certified.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::api::dto::{
    CheckCertificationRequest, EmailCertificationRequest, IdCheckRequest, SignInRequest,
    SignUpRequest,
};

/// Shortest accepted password
pub const PASSWORD_MIN_LEN: usize = 8;

/// Longest accepted password
pub const PASSWORD_MAX_LEN: usize = 13;

fn password_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9]{8,13}$").expect("password pattern compiles"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9]*@([-.]?[a-zA-Z0-9])*\.[a-zA-Z]{2,4}$")
            .expect("email pattern compiles")
    })
}

/// 8 to 13 ASCII letters and digits, with at least one of each.
pub fn password_is_valid(password: &str) -> bool {
    password_regex().is_match(password)
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

pub fn email_is_valid(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Form fields a validation message can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Password,
    PasswordCheck,
    Email,
    Certification,
}

/// Why the sign-up form cannot be submitted yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignUpBlocker {
    #[error("Fill in every field.")]
    Incomplete,

    #[error("Duplicate check is required.")]
    IdNotChecked,

    #[error("Use 8 to 13 characters mixing letters and digits.")]
    InvalidPassword,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("Email verification is required.")]
    NotCertified,
}

impl SignUpBlocker {
    /// Field the message belongs under; `None` means an alert-style notice
    pub fn field(&self) -> Option<Field> {
        match self {
            SignUpBlocker::InvalidPassword => Some(Field::Password),
            SignUpBlocker::PasswordMismatch => Some(Field::PasswordCheck),
            SignUpBlocker::Incomplete
            | SignUpBlocker::IdNotChecked
            | SignUpBlocker::NotCertified => None,
        }
    }
}

/// Rejection raised before a verification mail is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MailBlocker {
    #[error("Enter your ID and email first.")]
    Incomplete,

    #[error("Not a valid email address.")]
    InvalidEmail,
}

/// Sign-up form state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    id: String,
    password: String,
    password_check: String,
    email: String,
    certification: String,
    id_checked: bool,
    certified: bool,
}

impl SignUpForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Changing the id invalidates a previous duplicate check
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
        self.id_checked = false;
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn set_password_check(&mut self, password_check: impl Into<String>) {
        self.password_check = password_check.into();
    }

    /// Changing the email invalidates a previous certification
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.certified = false;
    }

    pub fn set_certification(&mut self, certification: impl Into<String>) {
        self.certification = certification.into();
        self.certified = false;
    }

    pub fn mark_id_checked(&mut self) {
        self.id_checked = true;
    }

    pub fn mark_certified(&mut self) {
        self.certified = true;
    }

    pub fn id_checked(&self) -> bool {
        self.id_checked
    }

    pub fn certified(&self) -> bool {
        self.certified
    }

    /// Every field has a value (drives the active button style)
    pub fn is_complete(&self) -> bool {
        [
            &self.id,
            &self.password,
            &self.password_check,
            &self.email,
            &self.certification,
        ]
        .iter()
        .all(|value| !value.is_empty())
    }

    pub fn id_check_request(&self) -> Option<IdCheckRequest> {
        if self.id.is_empty() {
            return None;
        }
        Some(IdCheckRequest {
            id: self.id.clone(),
        })
    }

    pub fn mail_request(&self) -> Result<EmailCertificationRequest, MailBlocker> {
        if self.id.is_empty() || self.email.is_empty() {
            return Err(MailBlocker::Incomplete);
        }
        if !email_is_valid(&self.email) {
            return Err(MailBlocker::InvalidEmail);
        }
        Ok(EmailCertificationRequest {
            id: self.id.clone(),
            email: self.email.clone(),
        })
    }

    pub fn certification_request(&self) -> Option<CheckCertificationRequest> {
        if self.id.is_empty() || self.email.is_empty() || self.certification.is_empty() {
            return None;
        }
        Some(CheckCertificationRequest {
            id: self.id.clone(),
            email: self.email.clone(),
            certification: self.certification.clone(),
        })
    }

    /// Build the sign-up request, or report the first thing in the way
    pub fn submit(&self) -> Result<SignUpRequest, SignUpBlocker> {
        if !self.is_complete() {
            return Err(SignUpBlocker::Incomplete);
        }
        if !self.id_checked {
            return Err(SignUpBlocker::IdNotChecked);
        }
        if !password_is_valid(&self.password) {
            return Err(SignUpBlocker::InvalidPassword);
        }
        if self.password != self.password_check {
            return Err(SignUpBlocker::PasswordMismatch);
        }
        if !self.certified {
            return Err(SignUpBlocker::NotCertified);
        }

        Ok(SignUpRequest {
            id: self.id.clone(),
            password: self.password.clone(),
            email: self.email.clone(),
            certification: self.certification.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Enter both your ID and password.")]
pub struct MissingCredentials;

/// Sign-in form state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInForm {
    pub id: String,
    pub password: String,
}

impl SignInForm {
    pub fn new(id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            password: password.into(),
        }
    }

    pub fn submit(&self) -> Result<SignInRequest, MissingCredentials> {
        if self.id.is_empty() || self.password.is_empty() {
            return Err(MissingCredentials);
        }
        Ok(SignInRequest {
            id: self.id.clone(),
            password: self.password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> SignUpForm {
        let mut form = SignUpForm::new();
        form.set_id("coupong1");
        form.set_password("abcd1234");
        form.set_password_check("abcd1234");
        form.set_email("user@example.com");
        form.set_certification("4821");
        form
    }

    #[test]
    fn test_password_pattern() {
        assert!(password_is_valid("abcd1234"));
        assert!(password_is_valid("A1b2C3d4E5f6G"));

        assert!(!password_is_valid("abc1234"), "7 chars is too short");
        assert!(!password_is_valid("abcdefg123456x"), "14 chars is too long");
        assert!(!password_is_valid("abcdefgh"), "letters only");
        assert!(!password_is_valid("12345678"), "digits only");
        assert!(!password_is_valid("abcd 1234"));
        assert!(!password_is_valid("abcd!1234"));
        assert!(!password_is_valid("비밀번호1234"));
    }

    #[test]
    fn test_email_pattern() {
        assert!(email_is_valid("user@example.com"));
        assert!(email_is_valid("user1@mail.co.kr"));
        assert!(email_is_valid("a@my-host.io"));

        assert!(!email_is_valid("user.name@example.com"));
        assert!(!email_is_valid("user@example"));
        assert!(!email_is_valid("user@example.c"));
        assert!(!email_is_valid("userexample.com"));
    }

    #[test]
    fn test_sign_up_requires_id_check_and_certification() {
        let mut form = filled_form();
        assert!(form.is_complete());
        assert_eq!(form.submit(), Err(SignUpBlocker::IdNotChecked));

        form.mark_id_checked();
        assert_eq!(form.submit(), Err(SignUpBlocker::NotCertified));

        form.mark_certified();
        let request = form.submit().unwrap();
        assert_eq!(request.id, "coupong1");
        assert_eq!(request.certification, "4821");
    }

    #[test]
    fn test_editing_resets_checks() {
        let mut form = filled_form();
        form.mark_id_checked();
        form.mark_certified();

        form.set_id("coupong2");
        assert!(!form.id_checked());
        assert!(form.certified());

        form.mark_id_checked();
        form.set_email("other@example.com");
        assert!(!form.certified());
        assert_eq!(form.submit(), Err(SignUpBlocker::NotCertified));
    }

    #[test]
    fn test_sign_up_blocker_order() {
        let mut form = filled_form();
        form.set_certification("");
        assert_eq!(form.submit(), Err(SignUpBlocker::Incomplete));

        let mut form = filled_form();
        form.mark_id_checked();
        form.set_password("short1");
        form.set_password_check("short1");
        let blocker = form.submit().unwrap_err();
        assert_eq!(blocker, SignUpBlocker::InvalidPassword);
        assert_eq!(blocker.field(), Some(Field::Password));

        let mut form = filled_form();
        form.mark_id_checked();
        form.mark_certified();
        form.set_password_check("abcd12345");
        assert_eq!(form.submit(), Err(SignUpBlocker::PasswordMismatch));
    }

    #[test]
    fn test_mail_request() {
        let mut form = SignUpForm::new();
        form.set_email("user@example.com");
        assert_eq!(form.mail_request(), Err(MailBlocker::Incomplete));

        form.set_id("coupong1");
        form.set_email("not-an-email");
        assert_eq!(form.mail_request(), Err(MailBlocker::InvalidEmail));
        assert_eq!(
            MailBlocker::InvalidEmail.to_string(),
            "Not a valid email address."
        );

        form.set_email("user@example.com");
        let request = form.mail_request().unwrap();
        assert_eq!(request.email, "user@example.com");
    }

    #[test]
    fn test_sign_in_requires_both_fields() {
        assert_eq!(SignInForm::new("user", "").submit(), Err(MissingCredentials));
        assert_eq!(SignInForm::new("", "pw").submit(), Err(MissingCredentials));

        let request = SignInForm::new("user", "pw").submit().unwrap();
        assert_eq!(request.id, "user");
    }
}
