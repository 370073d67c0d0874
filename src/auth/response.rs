//! Server response codes and the feedback shown for them

use serde::{Deserialize, Serialize};

/// `code` field of the auth/mail envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseCode {
    Success,
    ValidationFail,
    DuplicateId,
    SignInFail,
    CertificationFail,
    MailFail,
    DatabaseError,
    /// Any code this client does not know about, kept verbatim
    Other(String),
}

impl From<String> for ResponseCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "SUCCESS" => ResponseCode::Success,
            "VALIDATION_FAIL" => ResponseCode::ValidationFail,
            "DUPLICATE_ID" => ResponseCode::DuplicateId,
            "SIGN_IN_FAIL" => ResponseCode::SignInFail,
            "CERTIFICATION_FAIL" => ResponseCode::CertificationFail,
            "MAIL_FAIL" => ResponseCode::MailFail,
            "DATABASE_ERROR" => ResponseCode::DatabaseError,
            _ => ResponseCode::Other(code),
        }
    }
}

impl From<ResponseCode> for String {
    fn from(code: ResponseCode) -> Self {
        code.as_str().to_string()
    }
}

impl ResponseCode {
    pub fn as_str(&self) -> &str {
        match self {
            ResponseCode::Success => "SUCCESS",
            ResponseCode::ValidationFail => "VALIDATION_FAIL",
            ResponseCode::DuplicateId => "DUPLICATE_ID",
            ResponseCode::SignInFail => "SIGN_IN_FAIL",
            ResponseCode::CertificationFail => "CERTIFICATION_FAIL",
            ResponseCode::MailFail => "MAIL_FAIL",
            ResponseCode::DatabaseError => "DATABASE_ERROR",
            ResponseCode::Other(code) => code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseCode::Success)
    }
}

/// Which form action a response answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    IdCheck,
    SendMail,
    CheckCertification,
    SignUp,
    SignIn,
}

/// Message for the form plus whether it marks the step as passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feedback {
    pub ok: bool,
    pub message: &'static str,
}

impl AuthStep {
    pub fn feedback(self, code: &ResponseCode) -> Feedback {
        let ok = code.is_success();
        let message = match (self, code) {
            (AuthStep::IdCheck, ResponseCode::Success) => "This ID is available.",
            (AuthStep::SendMail, ResponseCode::Success) => "Verification email sent.",
            (AuthStep::CheckCertification, ResponseCode::Success) => "Email verified.",
            (AuthStep::SignUp, ResponseCode::Success) => "Welcome aboard! Please sign in.",
            (AuthStep::SignIn, ResponseCode::Success) => "Signed in.",
            (AuthStep::SignIn, ResponseCode::ValidationFail) => "Enter your ID and password.",
            (AuthStep::SignIn, ResponseCode::SignInFail) => "Sign-in details do not match.",
            (_, ResponseCode::ValidationFail) => "Check the values you entered.",
            (_, ResponseCode::DuplicateId) => "This ID is already in use.",
            (_, ResponseCode::MailFail) => "Failed to send the verification email.",
            (_, ResponseCode::CertificationFail) => "The verification number is incorrect.",
            (_, ResponseCode::DatabaseError) => "A database error occurred.",
            _ => "Something went wrong. Please try again.",
        };
        Feedback { ok, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip_keeps_unknown() {
        let code: ResponseCode = serde_json::from_str(r#""NO_PERMISSION""#).unwrap();
        assert_eq!(code, ResponseCode::Other("NO_PERMISSION".to_string()));
        assert_eq!(serde_json::to_string(&code).unwrap(), r#""NO_PERMISSION""#);

        let code: ResponseCode = serde_json::from_str(r#""DUPLICATE_ID""#).unwrap();
        assert_eq!(code, ResponseCode::DuplicateId);
    }

    #[test]
    fn test_feedback() {
        let feedback = AuthStep::IdCheck.feedback(&ResponseCode::DuplicateId);
        assert!(!feedback.ok);
        assert_eq!(feedback.message, "This ID is already in use.");

        let feedback = AuthStep::SignIn.feedback(&ResponseCode::SignInFail);
        assert_eq!(feedback.message, "Sign-in details do not match.");

        let feedback = AuthStep::CheckCertification.feedback(&ResponseCode::Success);
        assert!(feedback.ok);
    }
}
